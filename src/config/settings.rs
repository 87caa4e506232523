//! Command line arguments and run settings for sapcheck

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Exit status for a clean setup
pub const EXIT_OK: u8 = 0;
/// Exit status when only warnings were found
pub const EXIT_WARN: u8 = 1;
/// Exit status for failures and fatal errors
pub const EXIT_FAIL: u8 = 2;
/// Exit status for invalid invocations
pub const EXIT_USAGE: u8 = 3;

/// sapcheck - verify the sapconf / saptune tuning setup of a SLES host
#[derive(Parser, Debug, Clone)]
#[command(name = "sapcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check the sapconf and saptune setup of SUSE Linux Enterprise Server")]
#[command(long_about = r#"
sapcheck inspects installed packages, systemd units, tuned profiles and
package files of a SLES for SAP host and reports how well the sapconf or
saptune setup matches what the installed version expects.

Exit status:
  0  setup is correct
  1  warnings were found
  2  errors were found, the tool is not installed or the host is unsupported
  3  invalid invocation

Examples:
  sapcheck overview                     # Show the collected host state
  sapcheck sapconf                      # Check the sapconf setup
  sapcheck --format json saptune        # Machine readable saptune check
  sapcheck --root /mnt/sysroot sapconf  # Check a mounted system tree
"#)]
pub struct CliArgs {
    /// Filesystem root of the system to inspect
    #[arg(long, env = "SAPCHECK_ROOT", default_value = "/", value_name = "DIR")]
    pub root: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Show packages, units and profiles without checking them
    #[command(name = "overview")]
    Overview,

    /// Check the sapconf setup
    #[command(name = "sapconf")]
    Sapconf,

    /// Check the saptune setup
    #[command(name = "saptune")]
    Saptune,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Settings derived from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Filesystem prefix for every probed path
    pub root: PathBuf,
    /// Report format
    pub format: OutputFormat,
    /// Whether text output is colored
    pub color: bool,
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_filter: &'static str,
}

impl CheckConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            root: args.root.clone(),
            format: args.format,
            color: !args.no_color && args.format == OutputFormat::Text,
            log_filter: log_filter(args.verbose),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            format: OutputFormat::Text,
            color: true,
            log_filter: log_filter(0),
        }
    }
}

/// Tracing filter for a `-v` count
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parse_subcommand_and_options() {
        let args =
            CliArgs::try_parse_from(["sapcheck", "--root", "/mnt", "--format", "json", "-vv", "saptune"])
                .unwrap();
        assert_eq!(args.command, Commands::Saptune);
        assert_eq!(args.root, PathBuf::from("/mnt"));

        let config = CheckConfig::from_cli(&args);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.color);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["sapcheck", "sapconf"]).unwrap();
        let config = CheckConfig::from_cli(&args);
        assert_eq!(args.command, Commands::Sapconf);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.log_filter, "warn");
        assert!(config.color);
    }

    #[test]
    fn test_missing_or_unknown_subcommand_is_usage_error() {
        let err = CliArgs::try_parse_from(["sapcheck"]).unwrap_err();
        assert_ne!(err.kind(), ErrorKind::DisplayHelp);

        let err = CliArgs::try_parse_from(["sapcheck", "tuned"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_help_is_not_a_usage_error() {
        let err = CliArgs::try_parse_from(["sapcheck", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = CliArgs::try_parse_from(["sapcheck", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "info");
        assert_eq!(log_filter(5), "trace");
    }
}

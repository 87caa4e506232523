//! Findings, severities and remediation hints

use crate::config::{EXIT_FAIL, EXIT_OK, EXIT_WARN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Confirmation that something is set up as expected
    Ok,
    /// Informational, never counted
    Note,
    /// Works, but should be adjusted
    Warn,
    /// Broken
    Fail,
}

impl Severity {
    /// Label used in reports
    pub fn label(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Note => "NOTE",
            Severity::Warn => "WARN",
            Severity::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Remediation hint, keyed by what went wrong
///
/// Every WARN or FAIL carries exactly one of these. The rendered text names
/// the command or action that fixes the problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum Hint {
    /// Start a unit
    StartService(String),
    /// Stop a unit
    StopService(String),
    /// Enable a unit
    EnableService(String),
    /// Disable a unit
    DisableService(String),
    /// Install or upgrade a package
    InstallPackage(String),
    /// Reinstall a package whose version cannot be read
    Reinstall(String),
    /// A mandatory file is missing
    CheckInstallation(String),
    /// A file left behind by an update or package operation
    RemoveLeftover(PathBuf),
    /// Activate a tuned profile through the owning service
    ApplyTunedProfile { profile: String, service: String },
    /// Use the tool that replaces this checker for the installed version
    UseSuccessorTool(String),
    /// The installed version is newer than this checker knows
    UpgradeChecker,
    /// Documentation describing a migration between major versions
    MigrationGuide(String),
    /// Replace an obsolete saptune solution
    ReviseSolution(String),
    /// Align `SAPTUNE_VERSION` with the installed package
    SetConfiguredVersion(String),
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hint::StartService(unit) => write!(f, "systemctl start {}", unit),
            Hint::StopService(unit) => write!(f, "systemctl stop {}", unit),
            Hint::EnableService(unit) => write!(f, "systemctl enable {}", unit),
            Hint::DisableService(unit) => write!(f, "systemctl disable {}", unit),
            Hint::InstallPackage(package) => write!(f, "zypper install {}", package),
            Hint::Reinstall(package) => write!(f, "zypper install --force {}", package),
            Hint::CheckInstallation(package) => {
                write!(f, "rpm -V {} # and reinstall the package if files are missing", package)
            }
            Hint::RemoveLeftover(path) => {
                write!(f, "Merge or remove {} and check its content", path.display())
            }
            Hint::ApplyTunedProfile { profile, service } => write!(
                f,
                "systemctl restart {} # or: tuned-adm profile {}",
                service, profile
            ),
            Hint::UseSuccessorTool(command) => write!(f, "Run '{}' instead", command),
            Hint::UpgradeChecker => f.write_str("Update sapcheck to a release that knows this version"),
            Hint::MigrationGuide(page) => write!(f, "Read {} and finish the migration", page),
            Hint::ReviseSolution(solution) => write!(
                f,
                "saptune solution revert {} # then apply a current solution",
                solution
            ),
            Hint::SetConfiguredVersion(major) => write!(
                f,
                "Set SAPTUNE_VERSION=\"{}\" in /etc/sysconfig/saptune",
                major
            ),
        }
    }
}

/// One reported deviation or confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Severity
    pub severity: Severity,
    /// What the finding is about (unit, file, package, ...)
    pub subject: String,
    /// Human readable message
    pub message: String,
    /// Remediation, present iff severity is WARN or FAIL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<Hint>,
}

impl Finding {
    /// Confirmation
    pub fn ok(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Ok,
            subject: subject.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Informational note
    pub fn note(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            subject: subject.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Warning with remediation
    pub fn warn(subject: impl Into<String>, message: impl Into<String>, hint: Hint) -> Self {
        Self {
            severity: Severity::Warn,
            subject: subject.into(),
            message: message.into(),
            hint: Some(hint),
        }
    }

    /// Failure with remediation
    pub fn fail(subject: impl Into<String>, message: impl Into<String>, hint: Hint) -> Self {
        Self {
            severity: Severity::Fail,
            subject: subject.into(),
            message: message.into(),
            hint: Some(hint),
        }
    }

    /// Whether this finding counts towards the warning or failure totals
    pub fn is_counted(&self) -> bool {
        matches!(self.severity, Severity::Warn | Severity::Fail)
    }
}

/// Final status of one subsystem evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Everything is fine
    Ok,
    /// Works, with warnings
    Warn,
    /// At least one failure
    Fail,
    /// The tool is not installed
    NotInstalled,
}

impl Status {
    /// Process exit code for this status
    ///
    /// A tool that is not installed cannot be verified and maps to the
    /// failure code.
    pub fn exit_code(self) -> u8 {
        match self {
            Status::Ok => EXIT_OK,
            Status::Warn => EXIT_WARN,
            Status::Fail | Status::NotInstalled => EXIT_FAIL,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::Warn => "warn",
            Status::Fail => "fail",
            Status::NotInstalled => "not installed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_only_on_counted_findings() {
        assert!(Finding::ok("tuned.service", "is active").hint.is_none());
        assert!(Finding::note("/etc/tuned/sapconf", "exists").hint.is_none());
        let warn = Finding::warn("x", "y", Hint::UpgradeChecker);
        assert!(warn.hint.is_some() && warn.is_counted());
    }

    #[test]
    fn test_hint_names_command() {
        assert_eq!(
            Hint::StopService("sapconf.service".into()).to_string(),
            "systemctl stop sapconf.service"
        );
        assert_eq!(
            Hint::SetConfiguredVersion("3".into()).to_string(),
            "Set SAPTUNE_VERSION=\"3\" in /etc/sysconfig/saptune"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Status::Ok.exit_code(), 0);
        assert_eq!(Status::Warn.exit_code(), 1);
        assert_eq!(Status::Fail.exit_code(), 2);
        assert_eq!(Status::NotInstalled.exit_code(), 2);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");
    }
}

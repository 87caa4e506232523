//! Host fact collection
//!
//! Reads /etc/os-release, queries rpm and systemd, parses the sysconfig
//! files and stats every path the file sets could ask about. All file
//! access goes through a root prefix so a copied or mounted system tree
//! can be checked as well.

use super::facts::{
    FactSnapshot, OsRelease, ServiceState, SAPCONF, SAPCONF_SERVICE, SAPTUNE, SAPTUNE_SERVICE,
    TUNED, TUNED_SERVICE,
};
use crate::check::fileset::{content_probes, probe_paths, SUPPORTED_OS_MAJORS};
use crate::error::{CheckError, IoResultExt, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Host release file
pub const OS_RELEASE: &str = "/etc/os-release";
/// saptune settings
pub const SAPTUNE_SYSCONFIG: &str = "/etc/sysconfig/saptune";
/// Profile tuned currently applies
pub const TUNED_ACTIVE_PROFILE: &str = "/etc/tuned/active_profile";

const SUPPORTED_IDS: [&str; 2] = ["sles", "sles_sap"];
const PACKAGES: [&str; 3] = [SAPCONF, SAPTUNE, TUNED];
const UNITS: [&str; 3] = [SAPCONF_SERVICE, SAPTUNE_SERVICE, TUNED_SERVICE];

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status 0
    pub success: bool,
    /// Standard output
    pub stdout: String,
}

/// Runs the external tools the collector needs
pub trait CommandRunner {
    /// Run `program` with `args` and capture its output
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runs commands on the local host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommands;

impl CommandRunner for SystemCommands {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        tracing::debug!("Running: {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| CheckError::Command {
                command: format!("{} {}", program, args.join(" ")),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Collects a [`FactSnapshot`] from a host
pub struct HostCollector<R = SystemCommands> {
    root: PathBuf,
    runner: R,
}

impl HostCollector<SystemCommands> {
    /// Collector for the filesystem below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_runner(root, SystemCommands)
    }
}

impl<R: CommandRunner> HostCollector<R> {
    /// Collector using a custom command runner
    pub fn with_runner(root: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    /// Map an absolute host path below the root prefix
    pub fn host_path(&self, path: &Path) -> PathBuf {
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }

    /// Collect every fact the checks consume
    ///
    /// The host check runs first; nothing else is probed on an
    /// unsupported host.
    pub fn collect(&self) -> Result<FactSnapshot> {
        let os_release = self.os_release()?;
        tracing::info!("Collecting facts on {}", os_release);
        let major = os_release.major;

        let mut builder = FactSnapshot::builder(os_release);

        for package in PACKAGES {
            let version = self.package_version(package)?;
            tracing::debug!("Package {}: {:?}", package, version);
            builder = builder.package(package, version.as_deref());
        }

        for unit in UNITS {
            builder = match self.service_states(unit) {
                Ok((active, enabled)) => {
                    tracing::debug!("Unit {}: {} / {}", unit, active, enabled);
                    builder.service(unit, active, enabled)
                }
                // only the checks that read this unit give up on it
                Err(CheckError::UnknownServiceState { property, value, .. }) => {
                    tracing::warn!("Unit {}: unknown {} '{}'", unit, property, value);
                    builder.unknown_unit_state(unit, &property, &value)
                }
                Err(e) => return Err(e),
            };
        }

        let tuned_profile = self
            .read_optional(Path::new(TUNED_ACTIVE_PROFILE))?
            .map(|text| text.trim().to_string())
            .filter(|profile| !profile.is_empty());
        builder = builder.profile(TUNED, tuned_profile.as_deref());

        let sysconfig = self
            .read_optional(Path::new(SAPTUNE_SYSCONFIG))?
            .map(|text| parse_sysconfig(&text))
            .unwrap_or_default();
        builder = builder
            .profile(SAPTUNE, sysconfig.get("TUNE_FOR_SOLUTIONS").map(String::as_str))
            .configured_version(sysconfig.get("SAPTUNE_VERSION").map(String::as_str));

        for path in probe_paths(major)? {
            if fs::symlink_metadata(self.host_path(&path)).is_ok() {
                tracing::debug!("Found {}", path.display());
                builder = builder.file(path);
            }
        }

        for probe in content_probes(major)? {
            if let Some(text) = self.read_optional(Path::new(probe))? {
                builder = builder.file_content(probe, text);
            }
        }

        Ok(builder.build())
    }

    /// Read and validate the host release
    pub fn os_release(&self) -> Result<OsRelease> {
        let path = Path::new(OS_RELEASE);
        let text = self.read_optional(path)?.ok_or_else(|| {
            CheckError::UnsupportedHost(format!("{} not found", self.host_path(path).display()))
        })?;
        let release = parse_os_release(path, &text)?;
        check_host(&release)?;
        Ok(release)
    }

    /// Installed version of a package, `None` when rpm does not know it
    pub fn package_version(&self, package: &str) -> Result<Option<String>> {
        let output = self
            .runner
            .run("rpm", &["-q", "--qf", "%{VERSION}\\n", package])?;
        if !output.success {
            return Ok(None);
        }
        // several installed instances print one line each
        let version = output.stdout.lines().map(str::trim).find(|l| !l.is_empty());
        if let Some(extra) = output.stdout.lines().filter(|l| !l.trim().is_empty()).nth(1) {
            tracing::warn!("Several {} packages installed, ignoring {}", package, extra.trim());
        }
        Ok(version.map(str::to_string))
    }

    /// Active and enablement state of a unit
    pub fn service_states(&self, unit: &str) -> Result<(ServiceState, ServiceState)> {
        let output = self.runner.run(
            "systemctl",
            &["show", "-p", "LoadState,ActiveState,UnitFileState", unit],
        )?;
        if !output.success {
            return Err(CheckError::Command {
                command: format!("systemctl show {}", unit),
                message: "non-zero exit status".to_string(),
            });
        }
        parse_unit_show(unit, &output.stdout)
    }

    fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        let full = self.host_path(path);
        match fs::read_to_string(&full) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_path(full),
        }
    }
}

/// Parse `/etc/os-release` into an [`OsRelease`]
pub fn parse_os_release(path: &Path, text: &str) -> Result<OsRelease> {
    let values = parse_sysconfig(text);

    let id = values
        .get("ID")
        .cloned()
        .ok_or_else(|| CheckError::parse(path, "missing ID"))?;
    let version_id = values
        .get("VERSION_ID")
        .ok_or_else(|| CheckError::parse(path, "missing VERSION_ID"))?;

    let mut parts = version_id.split('.');
    let major = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| CheckError::parse(path, format!("invalid VERSION_ID '{}'", version_id)))?;
    let minor = match parts.next() {
        Some(p) => p
            .parse()
            .map_err(|_| CheckError::parse(path, format!("invalid VERSION_ID '{}'", version_id)))?,
        None => 0,
    };

    Ok(OsRelease { id, major, minor })
}

/// Reject hosts the file sets do not cover
pub fn check_host(release: &OsRelease) -> Result<()> {
    if !SUPPORTED_IDS.contains(&release.id.as_str()) {
        return Err(CheckError::UnsupportedHost(format!(
            "'{}' is not SUSE Linux Enterprise Server",
            release.id
        )));
    }
    if !SUPPORTED_OS_MAJORS.contains(&release.major) {
        return Err(CheckError::UnsupportedHost(format!(
            "release {} is not supported",
            release.major
        )));
    }
    Ok(())
}

/// Parse `KEY="value"` lines, skipping comments and blank lines
pub fn parse_sysconfig(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Map the output of `systemctl show -p LoadState,ActiveState,UnitFileState`
pub fn parse_unit_show(unit: &str, text: &str) -> Result<(ServiceState, ServiceState)> {
    let props = parse_sysconfig(text);
    let prop = |name: &str| props.get(name).map(String::as_str).unwrap_or("");

    if prop("LoadState") == "not-found" {
        return Ok((ServiceState::Missing, ServiceState::Missing));
    }

    let active = match prop("ActiveState") {
        "active" | "reloading" | "activating" => ServiceState::Active,
        "inactive" | "failed" | "deactivating" => ServiceState::Inactive,
        other => return Err(CheckError::unknown_state(unit, "ActiveState", other)),
    };

    let enabled = match prop("UnitFileState") {
        "enabled" | "enabled-runtime" | "static" | "alias" | "indirect" => ServiceState::Enabled,
        "disabled" | "masked" | "masked-runtime" => ServiceState::Disabled,
        "" => ServiceState::Missing,
        other => return Err(CheckError::unknown_state(unit, "UnitFileState", other)),
    };

    Ok((active, enabled))
}

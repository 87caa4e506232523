//! Immutable snapshot of the host facts the checks consume
//!
//! The snapshot is assembled once, either by the host collector or by a
//! [`FactSnapshotBuilder`] in tests, and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Package name of sapconf
pub const SAPCONF: &str = "sapconf";
/// Package name of saptune
pub const SAPTUNE: &str = "saptune";
/// Package name of tuned
pub const TUNED: &str = "tuned";

/// systemd unit of sapconf
pub const SAPCONF_SERVICE: &str = "sapconf.service";
/// systemd unit of saptune
pub const SAPTUNE_SERVICE: &str = "saptune.service";
/// systemd unit of tuned
pub const TUNED_SERVICE: &str = "tuned.service";

/// Operating system release of the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRelease {
    /// `ID` from /etc/os-release
    pub id: String,
    /// Major release (12, 15, ...)
    pub major: u32,
    /// Service pack
    pub minor: u32,
}

impl OsRelease {
    /// Create a release with the SLES id
    pub fn sles(major: u32, minor: u32) -> Self {
        Self {
            id: "sles".to_string(),
            major,
            minor,
        }
    }
}

impl fmt::Display for OsRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minor == 0 {
            write!(f, "{} {}", self.id, self.major)
        } else {
            write!(f, "{} {} SP{}", self.id, self.major, self.minor)
        }
    }
}

/// State of a systemd unit property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Unit is running
    Active,
    /// Unit is not running
    Inactive,
    /// Unit is started at boot
    Enabled,
    /// Unit is not started at boot
    Disabled,
    /// Unit does not exist
    Missing,
}

impl ServiceState {
    /// Whether the unit is running
    pub fn is_active(self) -> bool {
        self == ServiceState::Active
    }

    /// Whether the unit is started at boot
    pub fn is_enabled(self) -> bool {
        self == ServiceState::Enabled
    }

    /// Lowercase name as systemd prints it
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Active => "active",
            ServiceState::Inactive => "inactive",
            ServiceState::Enabled => "enabled",
            ServiceState::Disabled => "disabled",
            ServiceState::Missing => "missing",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit property value systemd reported that has no [`ServiceState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownUnitState {
    /// systemd property, e.g. `UnitFileState`
    pub property: String,
    /// Value as reported
    pub value: String,
}

impl fmt::Display for UnknownUnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.property, self.value)
    }
}

/// Filesystem facts: which probed paths exist and the text of probed files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    present: BTreeSet<PathBuf>,
    contents: BTreeMap<PathBuf, String>,
}

impl FileFacts {
    /// Whether the path was found on the host
    pub fn exists(&self, path: &Path) -> bool {
        self.present.contains(path)
    }

    /// Text of a probed file, if it was read
    pub fn content(&self, path: &Path) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }
}

/// Complete, immutable set of facts for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSnapshot {
    os_release: OsRelease,
    packages: BTreeMap<String, Option<String>>,
    service_active: BTreeMap<String, ServiceState>,
    service_enabled: BTreeMap<String, ServiceState>,
    unknown_units: BTreeMap<String, UnknownUnitState>,
    profiles: BTreeMap<String, Option<String>>,
    configured_version: Option<String>,
    files: FileFacts,
}

impl FactSnapshot {
    /// Start building a snapshot for the given release
    pub fn builder(os_release: OsRelease) -> FactSnapshotBuilder {
        FactSnapshotBuilder {
            snapshot: FactSnapshot {
                os_release,
                packages: BTreeMap::new(),
                service_active: BTreeMap::new(),
                service_enabled: BTreeMap::new(),
                unknown_units: BTreeMap::new(),
                profiles: BTreeMap::new(),
                configured_version: None,
                files: FileFacts::default(),
            },
        }
    }

    /// Operating system release
    pub fn os_release(&self) -> &OsRelease {
        &self.os_release
    }

    /// Installed version of a package, `None` if not installed
    pub fn package_version(&self, package: &str) -> Option<&str> {
        self.packages
            .get(package)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    /// Whether a package is installed
    pub fn is_installed(&self, package: &str) -> bool {
        self.package_version(package).is_some()
    }

    /// Active state of a unit; unknown units read as missing
    pub fn service_active(&self, unit: &str) -> ServiceState {
        self.service_active
            .get(unit)
            .copied()
            .unwrap_or(ServiceState::Missing)
    }

    /// Enablement of a unit; unknown units read as missing
    pub fn service_enabled(&self, unit: &str) -> ServiceState {
        self.service_enabled
            .get(unit)
            .copied()
            .unwrap_or(ServiceState::Missing)
    }

    /// Unit whose state could not be mapped, if any
    pub fn unknown_unit_state(&self, unit: &str) -> Option<&UnknownUnitState> {
        self.unknown_units.get(unit)
    }

    /// All units with unmapped states, in unit order
    pub fn unknown_unit_states(&self) -> impl Iterator<Item = (&str, &UnknownUnitState)> {
        self.unknown_units
            .iter()
            .map(|(unit, state)| (unit.as_str(), state))
    }

    /// Profile or solution configured for a tool
    pub fn profile(&self, tool: &str) -> Option<&str> {
        self.profiles
            .get(tool)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    /// `SAPTUNE_VERSION` from the saptune sysconfig file
    pub fn configured_version(&self) -> Option<&str> {
        self.configured_version.as_deref()
    }

    /// Filesystem facts
    pub fn files(&self) -> &FileFacts {
        &self.files
    }

    /// Known package names and versions, in name order
    pub fn packages(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.packages
            .iter()
            .map(|(name, version)| (name.as_str(), version.as_deref()))
    }
}

/// Builder for [`FactSnapshot`]
#[derive(Debug, Clone)]
pub struct FactSnapshotBuilder {
    snapshot: FactSnapshot,
}

impl FactSnapshotBuilder {
    /// Record a package version (`None` when not installed)
    pub fn package(mut self, name: &str, version: Option<&str>) -> Self {
        self.snapshot
            .packages
            .insert(name.to_string(), version.map(str::to_string));
        self
    }

    /// Record both states of a unit
    pub fn service(mut self, unit: &str, active: ServiceState, enabled: ServiceState) -> Self {
        self.snapshot.service_active.insert(unit.to_string(), active);
        self.snapshot.service_enabled.insert(unit.to_string(), enabled);
        self
    }

    /// Record a unit whose state systemd reported in a form not mapped
    pub fn unknown_unit_state(mut self, unit: &str, property: &str, value: &str) -> Self {
        self.snapshot.unknown_units.insert(
            unit.to_string(),
            UnknownUnitState {
                property: property.to_string(),
                value: value.to_string(),
            },
        );
        self
    }

    /// Record the profile or solution configured for a tool
    pub fn profile(mut self, tool: &str, value: Option<&str>) -> Self {
        self.snapshot
            .profiles
            .insert(tool.to_string(), value.map(str::to_string));
        self
    }

    /// Record `SAPTUNE_VERSION`
    pub fn configured_version(mut self, version: Option<&str>) -> Self {
        self.snapshot.configured_version = version.map(str::to_string);
        self
    }

    /// Record that a path exists
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot.files.present.insert(path.into());
        self
    }

    /// Record that several paths exist
    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.snapshot
            .files
            .present
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Record that a path exists with the given text
    pub fn file_content(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        self.snapshot.files.present.insert(path.clone());
        self.snapshot.files.contents.insert(path, content.into());
        self
    }

    /// Finish the snapshot
    pub fn build(self) -> FactSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_units_read_as_missing() {
        let facts = FactSnapshot::builder(OsRelease::sles(15, 4)).build();
        assert_eq!(facts.service_active(TUNED_SERVICE), ServiceState::Missing);
        assert_eq!(facts.service_enabled(TUNED_SERVICE), ServiceState::Missing);
    }

    #[test]
    fn test_empty_version_is_not_installed() {
        let facts = FactSnapshot::builder(OsRelease::sles(15, 4))
            .package(SAPCONF, Some(" "))
            .package(SAPTUNE, Some("3.0.2"))
            .build();
        assert!(!facts.is_installed(SAPCONF));
        assert_eq!(facts.package_version(SAPTUNE), Some("3.0.2"));
    }

    #[test]
    fn test_file_content_marks_presence() {
        let facts = FactSnapshot::builder(OsRelease::sles(12, 5))
            .file_content("/etc/sysconfig/saptune", "SAPTUNE_VERSION=\"2\"\n")
            .build();
        let path = Path::new("/etc/sysconfig/saptune");
        assert!(facts.files().exists(path));
        assert!(facts.files().content(path).unwrap().contains("SAPTUNE_VERSION"));
    }

    #[test]
    fn test_os_release_display() {
        assert_eq!(OsRelease::sles(15, 4).to_string(), "sles 15 SP4");
        assert_eq!(OsRelease::sles(12, 0).to_string(), "sles 12");
    }
}

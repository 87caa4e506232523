//! Version parsing and tier classification
//!
//! Versions are compared as numeric `(major, minor, patch)` triples. Each
//! tool owns an ordered table of half-open version ranges mapping to a
//! capability tier; the tier selects which rules and which file set apply.

use super::fileset::FileSetTag;
use super::finding::{Finding, Hint};
use crate::error::{CheckError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric package version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch level
    pub patch: u32,
}

impl Version {
    /// Create a version from its components
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse `MAJOR[.MINOR[.PATCH]]`, ignoring a `-release` or `+build` suffix
    pub fn parse(raw: &str) -> Option<Self> {
        let core = raw.trim().split(['-', '+']).next()?;
        if core.is_empty() {
            return None;
        }

        let mut parts = [0u32; 3];
        let mut count = 0;
        for component in core.split('.') {
            if count == parts.len() {
                return None;
            }
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parts[count] = component.parse().ok()?;
            count += 1;
        }

        Some(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Version::parse(s).ok_or_else(|| format!("Invalid version: {}", s))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Half-open version range `[from, until)` mapped to a tier
#[derive(Debug, Clone, Copy)]
pub struct TierRange<T> {
    /// Lowest version of the range
    pub from: Version,
    /// First version no longer in the range; `None` is unbounded
    pub until: Option<Version>,
    /// Tier selected by the range
    pub tier: T,
}

impl<T: Copy> TierRange<T> {
    /// Whether the version lies within the range
    pub fn contains(&self, version: Version) -> bool {
        version >= self.from && self.until.map_or(true, |until| version < until)
    }
}

/// Capability tier of a tool version
pub trait Tier: Copy + fmt::Debug + 'static {
    /// Ordered range table for this tool
    fn table() -> &'static [TierRange<Self>];

    /// Terminal finding for tiers that stop the evaluation
    fn terminal(self, tool: &str, version: Version) -> Option<Finding>;

    /// Short label for reports
    fn label(self) -> &'static str;

    /// File set the tier installs, if the tier is evaluated at all
    fn file_set(self) -> Option<FileSetTag>;
}

/// sapconf capability tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SapconfTier {
    /// Older than 4.1.12
    Unsupported,
    /// 4.1.12 up to 5: tuned applies the settings
    Tuned,
    /// 5.x: sapconf applies the settings itself
    Standalone,
    /// Newer than this checker knows
    Newer,
}

const SAPCONF_TIERS: &[TierRange<SapconfTier>] = &[
    TierRange {
        from: Version::new(0, 0, 0),
        until: Some(Version::new(4, 1, 12)),
        tier: SapconfTier::Unsupported,
    },
    TierRange {
        from: Version::new(4, 1, 12),
        until: Some(Version::new(5, 0, 0)),
        tier: SapconfTier::Tuned,
    },
    TierRange {
        from: Version::new(5, 0, 0),
        until: Some(Version::new(6, 0, 0)),
        tier: SapconfTier::Standalone,
    },
    TierRange {
        from: Version::new(6, 0, 0),
        until: None,
        tier: SapconfTier::Newer,
    },
];

impl Tier for SapconfTier {
    fn table() -> &'static [TierRange<Self>] {
        SAPCONF_TIERS
    }

    fn terminal(self, tool: &str, version: Version) -> Option<Finding> {
        match self {
            SapconfTier::Unsupported => Some(Finding::fail(
                tool,
                format!("{} version {} is too old and not supported", tool, version),
                Hint::InstallPackage(tool.to_string()),
            )),
            SapconfTier::Newer => Some(Finding::fail(
                tool,
                format!("{} version {} is not supported by this checker", tool, version),
                Hint::UpgradeChecker,
            )),
            SapconfTier::Tuned | SapconfTier::Standalone => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SapconfTier::Unsupported => "unsupported",
            SapconfTier::Tuned => "tuned-based",
            SapconfTier::Standalone => "standalone",
            SapconfTier::Newer => "newer than supported",
        }
    }

    fn file_set(self) -> Option<FileSetTag> {
        match self {
            SapconfTier::Tuned => Some(FileSetTag::SapconfTuned),
            SapconfTier::Standalone => Some(FileSetTag::SapconfStandalone),
            SapconfTier::Unsupported | SapconfTier::Newer => None,
        }
    }
}

/// saptune capability tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaptuneTier {
    /// saptune version 1
    Unsupported,
    /// saptune version 2: tuned applies the settings
    Tuned,
    /// saptune 3.0: saptune applies the settings itself
    Standalone,
    /// saptune 3.1 and later carry their own `saptune check`
    Superseded,
}

const SAPTUNE_TIERS: &[TierRange<SaptuneTier>] = &[
    TierRange {
        from: Version::new(0, 0, 0),
        until: Some(Version::new(2, 0, 0)),
        tier: SaptuneTier::Unsupported,
    },
    TierRange {
        from: Version::new(2, 0, 0),
        until: Some(Version::new(3, 0, 0)),
        tier: SaptuneTier::Tuned,
    },
    TierRange {
        from: Version::new(3, 0, 0),
        until: Some(Version::new(3, 1, 0)),
        tier: SaptuneTier::Standalone,
    },
    TierRange {
        from: Version::new(3, 1, 0),
        until: None,
        tier: SaptuneTier::Superseded,
    },
];

impl Tier for SaptuneTier {
    fn table() -> &'static [TierRange<Self>] {
        SAPTUNE_TIERS
    }

    fn terminal(self, tool: &str, version: Version) -> Option<Finding> {
        match self {
            SaptuneTier::Unsupported => Some(Finding::fail(
                tool,
                format!("{} version {} (v1) is not supported anymore", tool, version),
                Hint::MigrationGuide("man 7 saptune-migrate".to_string()),
            )),
            SaptuneTier::Superseded => Some(Finding::fail(
                tool,
                format!(
                    "{} version {} ships its own check, this checker does not apply",
                    tool, version
                ),
                Hint::UseSuccessorTool("saptune check".to_string()),
            )),
            SaptuneTier::Tuned | SaptuneTier::Standalone => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SaptuneTier::Unsupported => "unsupported",
            SaptuneTier::Tuned => "tuned-based",
            SaptuneTier::Standalone => "standalone",
            SaptuneTier::Superseded => "superseded",
        }
    }

    fn file_set(self) -> Option<FileSetTag> {
        match self {
            SaptuneTier::Tuned => Some(FileSetTag::SaptuneTuned),
            SaptuneTier::Standalone => Some(FileSetTag::SaptuneStandalone),
            SaptuneTier::Unsupported | SaptuneTier::Superseded => None,
        }
    }
}

/// Outcome of classifying a raw version string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<T> {
    /// Package is not installed; no findings, evaluation stops
    NotInstalled,
    /// Version maps to a tier the rules can evaluate
    Tier { tier: T, version: Version },
    /// Evaluation stops with exactly this finding
    Terminal(Finding),
}

/// Look up the tier of a parsed version in the tool's table
pub fn tier_of<T: Tier>(tool: &str, version: Version) -> Result<T> {
    T::table()
        .iter()
        .find(|range| range.contains(version))
        .map(|range| range.tier)
        .ok_or_else(|| CheckError::NoVersionTier {
            tool: tool.to_string(),
            version: version.to_string(),
        })
}

/// Classify a raw version string of `tool`
pub fn classify<T: Tier>(tool: &str, raw: Option<&str>) -> Result<Classification<T>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Classification::NotInstalled),
        Some(raw) => raw,
    };

    let version = match Version::parse(raw) {
        Some(version) => version,
        None => {
            tracing::debug!("Cannot parse {} version '{}'", tool, raw);
            return Ok(Classification::Terminal(Finding::fail(
                tool,
                format!("unknown {} version '{}'", tool, raw),
                Hint::Reinstall(tool.to_string()),
            )));
        }
    };

    let tier: T = tier_of(tool, version)?;
    tracing::debug!("{} {} classified as {:?}", tool, version, tier);

    Ok(match tier.terminal(tool, version) {
        Some(finding) => Classification::Terminal(finding),
        None => Classification::Tier { tier, version },
    })
}

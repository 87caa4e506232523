//! File sets per OS release and tool generation
//!
//! A file set lists the files a tool generation must ship, the files that
//! belong to another generation and should be gone, and directories where
//! administrators keep customized copies.

use crate::error::{CheckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Suffixes rpm uses for configuration files it did not overwrite
pub const LEFTOVER_SUFFIXES: [&str; 2] = [".rpmsave", ".rpmnew"];

/// OS major releases the file-set table covers
pub const SUPPORTED_OS_MAJORS: [u32; 2] = [12, 15];

/// Which tool generation a file set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSetTag {
    /// sapconf 4, settings applied by tuned
    SapconfTuned,
    /// sapconf 5, settings applied by sapconf
    SapconfStandalone,
    /// saptune 2, settings applied by tuned
    SaptuneTuned,
    /// saptune 3.0, settings applied by saptune
    SaptuneStandalone,
}

impl FileSetTag {
    /// All tags
    pub const ALL: [FileSetTag; 4] = [
        FileSetTag::SapconfTuned,
        FileSetTag::SapconfStandalone,
        FileSetTag::SaptuneTuned,
        FileSetTag::SaptuneStandalone,
    ];

    /// Package owning the files
    pub fn package(self) -> &'static str {
        match self {
            FileSetTag::SapconfTuned | FileSetTag::SapconfStandalone => "sapconf",
            FileSetTag::SaptuneTuned | FileSetTag::SaptuneStandalone => "saptune",
        }
    }
}

impl fmt::Display for FileSetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileSetTag::SapconfTuned => "sapconf (tuned-based)",
            FileSetTag::SapconfStandalone => "sapconf (standalone)",
            FileSetTag::SaptuneTuned => "saptune (tuned-based)",
            FileSetTag::SaptuneStandalone => "saptune (standalone)",
        };
        f.write_str(s)
    }
}

/// A file whose content reveals an unfinished migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationProbe {
    /// File to read
    pub path: &'static str,
    /// Literal text left by the migration helper
    pub marker: &'static str,
    /// Documentation describing the migration
    pub guide: &'static str,
}

/// Files that must, must not, or may exist for one tool generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSetSpec {
    /// Files shipped by the package
    pub mandatory: &'static [&'static str],
    /// Files of another generation
    pub invalid: &'static [&'static str],
    /// Directories holding administrator customizations
    pub customized_dirs: &'static [&'static str],
    /// Optional content probe for an unfinished migration
    pub migration_probe: Option<MigrationProbe>,
}

const SAPCONF_TUNED_12: FileSetSpec = FileSetSpec {
    mandatory: &[
        "/etc/sysconfig/sapconf",
        "/usr/lib/tuned/sapconf/tuned.conf",
        "/usr/lib/tuned/sapconf/script.sh",
    ],
    invalid: &[
        "/usr/lib/sapconf/sapconf",
        "/usr/lib/tuned/sap-hana/tuned.conf",
        "/usr/lib/tuned/sap-netweaver/tuned.conf",
    ],
    customized_dirs: &[
        "/etc/tuned/sapconf",
        "/etc/tuned/sap-hana",
        "/etc/tuned/sap-netweaver",
    ],
    migration_probe: None,
};

const SAPCONF_TUNED_15: FileSetSpec = FileSetSpec {
    mandatory: &[
        "/etc/sysconfig/sapconf",
        "/usr/lib/tuned/sapconf/tuned.conf",
        "/usr/lib/tuned/sapconf/script.sh",
    ],
    invalid: &["/usr/lib/sapconf/sapconf"],
    customized_dirs: &["/etc/tuned/sapconf"],
    migration_probe: None,
};

const SAPCONF_STANDALONE_12: FileSetSpec = FileSetSpec {
    mandatory: &["/etc/sysconfig/sapconf", "/usr/lib/sapconf/sapconf"],
    invalid: &[
        "/usr/lib/tuned/sapconf/tuned.conf",
        "/usr/lib/tuned/sapconf/script.sh",
        "/usr/lib/tuned/sap-hana/tuned.conf",
        "/usr/lib/tuned/sap-netweaver/tuned.conf",
    ],
    customized_dirs: &[
        "/etc/tuned/sapconf",
        "/etc/tuned/sap-hana",
        "/etc/tuned/sap-netweaver",
    ],
    migration_probe: None,
};

const SAPCONF_STANDALONE_15: FileSetSpec = FileSetSpec {
    mandatory: &["/etc/sysconfig/sapconf", "/usr/lib/sapconf/sapconf"],
    invalid: &[
        "/usr/lib/tuned/sapconf/tuned.conf",
        "/usr/lib/tuned/sapconf/script.sh",
    ],
    customized_dirs: &["/etc/tuned/sapconf"],
    migration_probe: None,
};

const SAPTUNE_TUNED_12: FileSetSpec = FileSetSpec {
    mandatory: &[
        "/etc/sysconfig/saptune",
        "/usr/lib/tuned/saptune/tuned.conf",
        "/usr/lib/tuned/saptune/script.sh",
    ],
    invalid: &[
        "/etc/sysconfig/saptune-note-1275776",
        "/etc/sysconfig/saptune-note-1557506",
        "/etc/sysconfig/saptune-note-SUSE-GUIDE-01",
        "/etc/sysconfig/saptune-note-SUSE-GUIDE-02",
    ],
    customized_dirs: &["/etc/tuned/saptune", "/etc/saptune/override"],
    migration_probe: Some(MigrationProbe {
        path: "/etc/sysconfig/saptune",
        marker: "SAPTUNE_VERSION=\"1\"",
        guide: "man 7 saptune-migrate",
    }),
};

const SAPTUNE_TUNED_15: FileSetSpec = FileSetSpec {
    mandatory: &[
        "/etc/sysconfig/saptune",
        "/usr/lib/tuned/saptune/tuned.conf",
        "/usr/lib/tuned/saptune/script.sh",
    ],
    invalid: &[
        "/etc/sysconfig/saptune-note-1275776",
        "/etc/sysconfig/saptune-note-1557506",
    ],
    customized_dirs: &["/etc/tuned/saptune", "/etc/saptune/override"],
    migration_probe: None,
};

const SAPTUNE_STANDALONE_12: FileSetSpec = FileSetSpec {
    mandatory: &[
        "/etc/sysconfig/saptune",
        "/usr/lib/systemd/system/saptune.service",
        "/usr/share/saptune/notes",
    ],
    invalid: &[
        "/usr/lib/tuned/saptune/tuned.conf",
        "/usr/lib/tuned/saptune/script.sh",
        "/etc/sysconfig/saptune-note-1275776",
        "/etc/sysconfig/saptune-note-1557506",
    ],
    customized_dirs: &["/etc/tuned/saptune", "/etc/saptune/override", "/etc/saptune/extra"],
    migration_probe: None,
};

const SAPTUNE_STANDALONE_15: FileSetSpec = FileSetSpec {
    mandatory: &[
        "/etc/sysconfig/saptune",
        "/usr/lib/systemd/system/saptune.service",
        "/usr/share/saptune/notes",
    ],
    invalid: &[
        "/usr/lib/tuned/saptune/tuned.conf",
        "/usr/lib/tuned/saptune/script.sh",
    ],
    customized_dirs: &["/etc/tuned/saptune", "/etc/saptune/override", "/etc/saptune/extra"],
    migration_probe: None,
};

/// Resolve the file set for an OS major release and tool generation
///
/// A missing entry means the table itself is incomplete, so it is an
/// engine-fatal error rather than an empty set.
pub fn resolve(os_major: u32, tag: FileSetTag) -> Result<&'static FileSetSpec> {
    let spec = match (os_major, tag) {
        (12, FileSetTag::SapconfTuned) => &SAPCONF_TUNED_12,
        (15, FileSetTag::SapconfTuned) => &SAPCONF_TUNED_15,
        (12, FileSetTag::SapconfStandalone) => &SAPCONF_STANDALONE_12,
        (15, FileSetTag::SapconfStandalone) => &SAPCONF_STANDALONE_15,
        (12, FileSetTag::SaptuneTuned) => &SAPTUNE_TUNED_12,
        (15, FileSetTag::SaptuneTuned) => &SAPTUNE_TUNED_15,
        (12, FileSetTag::SaptuneStandalone) => &SAPTUNE_STANDALONE_12,
        (15, FileSetTag::SaptuneStandalone) => &SAPTUNE_STANDALONE_15,
        _ => {
            return Err(CheckError::UnmappedFileSet {
                os_major,
                tag: tag.to_string(),
            })
        }
    };
    Ok(spec)
}

/// Path of a leftover copy of `path` with the given suffix
pub fn leftover_path(path: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", path, suffix))
}

/// Every path any file set of this release names, including leftover
/// variants and migration probes
pub fn probe_paths(os_major: u32) -> Result<BTreeSet<PathBuf>> {
    let mut paths = BTreeSet::new();

    for tag in FileSetTag::ALL {
        let spec = resolve(os_major, tag)?;
        for path in spec.mandatory.iter().chain(spec.invalid) {
            paths.insert(PathBuf::from(path));
            for suffix in LEFTOVER_SUFFIXES {
                paths.insert(leftover_path(path, suffix));
            }
        }
        paths.extend(spec.customized_dirs.iter().map(PathBuf::from));
        if let Some(probe) = spec.migration_probe {
            paths.insert(PathBuf::from(probe.path));
        }
    }

    Ok(paths)
}

/// Files whose text the collector must read
pub fn content_probes(os_major: u32) -> Result<Vec<&'static str>> {
    let mut probes = Vec::new();
    for tag in FileSetTag::ALL {
        if let Some(probe) = resolve(os_major, tag)?.migration_probe {
            if !probes.contains(&probe.path) {
                probes.push(probe.path);
            }
        }
    }
    Ok(probes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_domain_is_total() {
        for os_major in SUPPORTED_OS_MAJORS {
            for tag in FileSetTag::ALL {
                let spec = resolve(os_major, tag).unwrap();
                assert!(!spec.mandatory.is_empty(), "{} {}", os_major, tag);
            }
        }
    }

    #[test]
    fn test_unmapped_release_is_fatal() {
        let err = resolve(16, FileSetTag::SaptuneStandalone).unwrap_err();
        assert!(matches!(err, CheckError::UnmappedFileSet { os_major: 16, .. }));
        assert!(err.is_rule_table_error());
    }

    #[test]
    fn test_mandatory_and_invalid_are_disjoint() {
        for os_major in SUPPORTED_OS_MAJORS {
            for tag in FileSetTag::ALL {
                let spec = resolve(os_major, tag).unwrap();
                for path in spec.mandatory {
                    assert!(!spec.invalid.contains(path), "{} in both lists", path);
                }
            }
        }
    }

    #[test]
    fn test_only_sle12_saptune_tuned_probes_migration() {
        let probing: Vec<_> = SUPPORTED_OS_MAJORS
            .iter()
            .flat_map(|&os| FileSetTag::ALL.iter().map(move |&tag| (os, tag)))
            .filter(|&(os, tag)| resolve(os, tag).unwrap().migration_probe.is_some())
            .collect();
        assert_eq!(probing, vec![(12, FileSetTag::SaptuneTuned)]);
    }

    #[test]
    fn test_probe_paths_include_leftovers() {
        let paths = probe_paths(15).unwrap();
        assert!(paths.contains(&PathBuf::from("/etc/sysconfig/sapconf")));
        assert!(paths.contains(&PathBuf::from("/etc/sysconfig/sapconf.rpmnew")));
        assert!(paths.contains(&PathBuf::from("/etc/sysconfig/sapconf.rpmsave")));
        assert!(paths.contains(&PathBuf::from("/etc/tuned/sapconf")));
        assert_eq!(content_probes(12).unwrap(), vec!["/etc/sysconfig/saptune"]);
        assert!(content_probes(15).unwrap().is_empty());
    }
}

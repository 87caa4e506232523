//! File-set audit against the filesystem facts

use super::fileset::{leftover_path, FileSetSpec, LEFTOVER_SUFFIXES};
use super::finding::{Finding, Hint};
use crate::system::FileFacts;
use std::path::{Path, PathBuf};

/// Checks one resolved file set against the host's files
pub struct FileAuditor<'a> {
    spec: &'a FileSetSpec,
    package: &'a str,
}

impl<'a> FileAuditor<'a> {
    /// Create an auditor for the file set of `package`
    pub fn new(spec: &'a FileSetSpec, package: &'a str) -> Self {
        Self { spec, package }
    }

    /// Audit the files and return the findings in remediation order
    pub fn audit(&self, files: &FileFacts) -> Vec<Finding> {
        let mut findings = Vec::new();

        for path in self.spec.mandatory {
            if files.exists(Path::new(path)) {
                findings.push(Finding::ok(*path, "exists"));
            } else {
                findings.push(Finding::fail(
                    *path,
                    "is missing, but mandatory - check the installation",
                    Hint::CheckInstallation(self.package.to_string()),
                ));
            }
            self.leftovers(path, files, &mut findings);
        }

        for path in self.spec.invalid {
            if files.exists(Path::new(path)) {
                findings.push(Finding::warn(
                    *path,
                    "is not used by this version, possible leftover from an update",
                    Hint::RemoveLeftover(PathBuf::from(*path)),
                ));
            }
            self.leftovers(path, files, &mut findings);
        }

        for dir in self.spec.customized_dirs {
            if files.exists(Path::new(dir)) {
                findings.push(Finding::note(
                    *dir,
                    "exists, customizations found - check that they are still valid",
                ));
            }
        }

        if let Some(probe) = self.spec.migration_probe {
            let marked = files
                .content(Path::new(probe.path))
                .map_or(false, |content| content.contains(probe.marker));
            if marked {
                findings.push(Finding::warn(
                    probe.path,
                    format!("contains '{}', the migration has not been finished", probe.marker),
                    Hint::MigrationGuide(probe.guide.to_string()),
                ));
            }
        }

        findings
    }

    fn leftovers(&self, path: &str, files: &FileFacts, findings: &mut Vec<Finding>) {
        for suffix in LEFTOVER_SUFFIXES {
            let leftover = leftover_path(path, suffix);
            if files.exists(&leftover) {
                findings.push(Finding::warn(
                    leftover.display().to_string(),
                    "is a leftover from a package update",
                    Hint::RemoveLeftover(leftover),
                ));
            }
        }
    }
}

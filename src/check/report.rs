//! Finding aggregation and report rendering

use super::finding::{Finding, Severity, Status};
use console::{style, Style};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Accumulates findings of one subsystem evaluation in emission order
#[derive(Debug, Clone, Default)]
pub struct Report {
    findings: Vec<Finding>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finding
    pub fn push(&mut self, finding: Finding) {
        tracing::debug!(
            "{} {}: {}",
            finding.severity,
            finding.subject,
            finding.message
        );
        self.findings.push(finding);
    }

    /// Append several findings
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.push(finding);
        }
    }

    /// Findings collected so far
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Number of warnings
    pub fn warn_count(&self) -> usize {
        self.count(Severity::Warn)
    }

    /// Number of failures
    pub fn fail_count(&self) -> usize {
        self.count(Severity::Fail)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Status derived from the counts
    pub fn status(&self) -> Status {
        if self.fail_count() > 0 {
            Status::Fail
        } else if self.warn_count() > 0 {
            Status::Warn
        } else {
            Status::Ok
        }
    }

    /// Consume the report into an evaluation result
    pub fn finish(self, tool: &str, version: Option<String>, tier: Option<&str>) -> Evaluation {
        let status = self.status();
        Evaluation {
            tool: tool.to_string(),
            version,
            tier: tier.map(str::to_string),
            warnings: self.warn_count(),
            failures: self.fail_count(),
            findings: self.findings,
            status,
        }
    }
}

/// Result of evaluating one subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Tool that was checked
    pub tool: String,
    /// Installed version, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Tier the version was classified into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Findings in emission order
    pub findings: Vec<Finding>,
    /// Number of warnings
    pub warnings: usize,
    /// Number of failures
    pub failures: usize,
    /// Final status
    pub status: Status,
}

impl Evaluation {
    /// Evaluation of a tool that is not installed
    pub fn not_installed(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            version: None,
            tier: None,
            findings: Vec::new(),
            warnings: 0,
            failures: 0,
            status: Status::NotInstalled,
        }
    }

    /// Trailing summary: counts (when non-zero) and one closing sentence
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.warnings > 0 {
            lines.push(format!("{} warning(s) have been found.", self.warnings));
        }
        if self.failures > 0 {
            lines.push(format!("{} error(s) have been found.", self.failures));
        }
        lines.push(match self.status {
            Status::Ok => format!("The {} setup is correct.", self.tool),
            Status::Warn => format!(
                "The {} setup works almost correctly, but warnings should be checked.",
                self.tool
            ),
            Status::Fail => format!("The {} setup is DEFECT!", self.tool),
            Status::NotInstalled => format!("{} is not installed.", self.tool),
        });
        lines
    }

    /// Write the evaluation as text
    pub fn write_text<W: Write>(&self, out: &mut W, color: bool) -> io::Result<()> {
        match (&self.version, &self.tier) {
            (Some(version), Some(tier)) => {
                writeln!(out, "=== {} {} ({}) ===\n", self.tool, version, tier)?
            }
            (Some(version), None) => writeln!(out, "=== {} {} ===\n", self.tool, version)?,
            _ => writeln!(out, "=== {} ===\n", self.tool)?,
        }

        for finding in &self.findings {
            // pad before styling, escape codes would count as width
            let label = format!("{:<6}", format!("[{}]", finding.severity.label()));
            let label = if color {
                severity_style(finding.severity).apply_to(label).to_string()
            } else {
                label
            };
            writeln!(out, "{} {}: {}", label, finding.subject, finding.message)?;
            if let Some(hint) = &finding.hint {
                writeln!(out, "       -> {}", hint)?;
            }
        }

        if !self.findings.is_empty() {
            writeln!(out)?;
        }
        for line in self.summary_lines() {
            if color && self.status == Status::Fail {
                writeln!(out, "{}", style(line).bold())?;
            } else {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }

    /// Print the evaluation to stdout
    pub fn print(&self, color: bool) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_text(&mut out, color)
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Ok => Style::new().green(),
        Severity::Note => Style::new().cyan(),
        Severity::Warn => Style::new().yellow(),
        Severity::Fail => Style::new().red().bold(),
    }
}

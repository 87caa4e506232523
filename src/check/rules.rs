//! Rule building blocks shared by the sapconf and saptune engines
//!
//! An engine is an ordered table of named rules. Each rule looks at the
//! snapshot and the classified tier, appends findings, and may halt the
//! chain.

use super::audit::FileAuditor;
use super::fileset;
use super::finding::{Finding, Hint};
use super::report::{Evaluation, Report};
use super::version::{classify, Classification, Tier, Version};
use crate::error::{CheckError, Result};
use crate::system::FactSnapshot;

/// Whether the rule chain continues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next rule
    Continue,
    /// Stop evaluating this subsystem
    Halt,
}

/// Inputs every rule sees
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a, T> {
    /// Host facts
    pub facts: &'a FactSnapshot,
    /// Tier of the installed tool version
    pub tier: T,
    /// Installed tool version
    pub version: Version,
}

/// A single rule of an engine
pub type RuleFn<T> = fn(&RuleContext<'_, T>, &mut Report) -> Result<Flow>;

/// Named, ordered rule
pub struct Rule<T> {
    /// Name used in logs
    pub name: &'static str,
    /// Rule body
    pub check: RuleFn<T>,
}

/// Run a rule table in order until a rule halts
pub fn run_rules<T: Copy>(
    rules: &[Rule<T>],
    ctx: &RuleContext<'_, T>,
    report: &mut Report,
) -> Result<()> {
    for rule in rules {
        tracing::debug!("Running rule '{}'", rule.name);
        if (rule.check)(ctx, report)? == Flow::Halt {
            tracing::debug!("Rule '{}' halted the evaluation", rule.name);
            break;
        }
    }
    Ok(())
}

/// Classify the tool version, then run the rule table for its tier
///
/// A missing package yields no findings at all; terminal tiers yield
/// exactly one failure and skip every other rule.
pub fn evaluate_tool<T: Tier>(
    tool: &'static str,
    facts: &FactSnapshot,
    rules: &[Rule<T>],
) -> Result<Evaluation> {
    let raw = facts.package_version(tool);
    let mut report = Report::new();

    match classify::<T>(tool, raw)? {
        Classification::NotInstalled => {
            tracing::info!("{} is not installed", tool);
            Ok(Evaluation::not_installed(tool))
        }
        Classification::Terminal(finding) => {
            report.push(finding);
            Ok(report.finish(tool, raw.map(str::to_string), None))
        }
        Classification::Tier { tier, version } => {
            if let Some((unit, state)) = facts.unknown_unit_states().next() {
                return Err(CheckError::unknown_state(unit, &state.property, &state.value));
            }
            tracing::info!("Checking {} {} ({})", tool, version, tier.label());
            let ctx = RuleContext {
                facts,
                tier,
                version,
            };
            run_rules(rules, &ctx, &mut report)?;
            Ok(report.finish(tool, Some(version.to_string()), Some(tier.label())))
        }
    }
}

/// Audit the file set belonging to the tier on this OS release
pub fn audit_files<T: Tier>(ctx: &RuleContext<'_, T>, report: &mut Report) -> Result<Flow> {
    if let Some(tag) = ctx.tier.file_set() {
        let spec = fileset::resolve(ctx.facts.os_release().major, tag)?;
        report.extend(FileAuditor::new(spec, tag.package()).audit(ctx.facts.files()));
    }
    Ok(Flow::Continue)
}

/// A subsystem checker
pub trait TuningCheck {
    /// Tool being checked
    fn name(&self) -> &'static str;

    /// Evaluate the snapshot
    fn evaluate(&self, facts: &FactSnapshot) -> Result<Evaluation>;
}

/// What a unit property should look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Want {
    /// Running
    Active,
    /// Not running (missing counts)
    Inactive,
    /// Started at boot
    Enabled,
    /// Not started at boot (missing counts)
    Disabled,
}

/// One row of a service expectation table
#[derive(Debug, Clone, Copy)]
pub struct ServiceExpectation {
    /// Unit name
    pub unit: &'static str,
    /// Expected state
    pub want: Want,
    /// Whether a mismatch fails (otherwise warns)
    pub fatal: bool,
}

impl ServiceExpectation {
    /// Mismatch fails
    pub const fn must(unit: &'static str, want: Want) -> Self {
        Self {
            unit,
            want,
            fatal: true,
        }
    }

    /// Evaluate the row against the snapshot
    pub fn evaluate(&self, facts: &FactSnapshot) -> Finding {
        let (state, met, hint) = match self.want {
            Want::Active => {
                let state = facts.service_active(self.unit);
                (state, state.is_active(), Hint::StartService(self.unit.into()))
            }
            Want::Inactive => {
                let state = facts.service_active(self.unit);
                (state, !state.is_active(), Hint::StopService(self.unit.into()))
            }
            Want::Enabled => {
                let state = facts.service_enabled(self.unit);
                (state, state.is_enabled(), Hint::EnableService(self.unit.into()))
            }
            Want::Disabled => {
                let state = facts.service_enabled(self.unit);
                (state, !state.is_enabled(), Hint::DisableService(self.unit.into()))
            }
        };

        if met {
            Finding::ok(self.unit, format!("is {}", state))
        } else {
            let message = format!("is {}, but should be {}", state, want_label(self.want));
            if self.fatal {
                Finding::fail(self.unit, message, hint)
            } else {
                Finding::warn(self.unit, message, hint)
            }
        }
    }
}

fn want_label(want: Want) -> &'static str {
    match want {
        Want::Active => "active",
        Want::Inactive => "inactive",
        Want::Enabled => "enabled",
        Want::Disabled => "disabled",
    }
}

/// Evaluate a whole expectation table in order
pub fn expect_services(table: &[ServiceExpectation], facts: &FactSnapshot, report: &mut Report) {
    for row in table {
        report.push(row.evaluate(facts));
    }
}

/// The competing tool's unit must be stopped and disabled
pub fn exclusivity(unit: &'static str, facts: &FactSnapshot, report: &mut Report) {
    expect_services(
        &[
            ServiceExpectation::must(unit, Want::Inactive),
            ServiceExpectation::must(unit, Want::Disabled),
        ],
        facts,
        report,
    );
}

/// tuned must follow the primary service when the primary delegates to it
///
/// The primary service starts tuned itself, so tuned being disabled is
/// fine. tuned missing while the primary runs is broken; tuned running or
/// enabled without the primary is only a warning.
pub fn coordinator_follows(
    primary: &'static str,
    coordinator: &'static str,
    facts: &FactSnapshot,
    report: &mut Report,
) {
    let primary_active = facts.service_active(primary).is_active();
    let coordinator_active = facts.service_active(coordinator);

    match (primary_active, coordinator_active.is_active()) {
        (true, false) => report.push(Finding::fail(
            coordinator,
            format!("is {}, but {} is active", coordinator_active, primary),
            Hint::StartService(primary.into()),
        )),
        (false, true) => report.push(Finding::warn(
            coordinator,
            format!("is active, but {} is not", primary),
            Hint::StopService(coordinator.into()),
        )),
        _ => report.push(Finding::ok(
            coordinator,
            format!("is {} like {}", coordinator_active, primary),
        )),
    }

    let primary_enabled = facts.service_enabled(primary).is_enabled();
    let coordinator_enabled = facts.service_enabled(coordinator);
    if coordinator_enabled.is_enabled() && !primary_enabled {
        report.push(Finding::warn(
            coordinator,
            format!("is enabled, but {} is not", primary),
            Hint::DisableService(coordinator.into()),
        ));
    } else {
        report.push(Finding::ok(
            coordinator,
            format!("is {} (started by {})", coordinator_enabled, primary),
        ));
    }
}

/// tuned must be stopped and disabled when the primary applies the settings
pub fn coordinator_absent(coordinator: &'static str, facts: &FactSnapshot, report: &mut Report) {
    exclusivity(coordinator, facts, report);
}

/// A required companion package
pub fn require_package(package: &str, facts: &FactSnapshot, report: &mut Report) -> bool {
    match facts.package_version(package) {
        Some(version) => {
            report.push(Finding::ok(package, format!("version {} is installed", version)));
            true
        }
        None => {
            report.push(Finding::fail(
                package,
                "is not installed, but required",
                Hint::InstallPackage(package.into()),
            ));
            false
        }
    }
}

/// Closed vocabulary of acceptable profile or solution values
#[derive(Debug, Clone, Copy)]
pub struct ProfileVocabulary {
    /// What the value describes, e.g. "tuned profile"
    pub kind: &'static str,
    /// The one current value
    pub expected: &'static str,
    /// Values that still work but are deprecated
    pub deprecated: &'static [&'static str],
    /// Substrings marking an obsolete value
    pub obsolete_markers: &'static [&'static str],
    /// Service that applies the expected value
    pub service: &'static str,
}

impl ProfileVocabulary {
    /// Classify a configured value
    pub fn evaluate(&self, value: Option<&str>) -> Finding {
        let hint = || Hint::ApplyTunedProfile {
            profile: self.expected.to_string(),
            service: self.service.to_string(),
        };

        let value = match value.map(str::trim) {
            None | Some("") => {
                return Finding::fail(self.kind, "is not set", hint());
            }
            Some(value) => value,
        };

        if let Some(marker) = self.obsolete_markers.iter().find(|m| value.contains(**m)) {
            return Finding::warn(
                self.kind,
                format!("'{}' contains the obsolete '{}'", value, marker),
                hint(),
            );
        }

        if value == self.expected {
            Finding::ok(self.kind, format!("is '{}'", value))
        } else if self.deprecated.contains(&value) {
            Finding::warn(
                self.kind,
                format!(
                    "'{}' is deprecated, '{}' should be used instead",
                    value, self.expected
                ),
                hint(),
            )
        } else {
            Finding::fail(
                self.kind,
                format!("is '{}', but should be '{}'", value, self.expected),
                hint(),
            )
        }
    }
}

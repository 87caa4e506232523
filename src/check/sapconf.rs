//! sapconf checks
//!
//! sapconf 4 delegates the settings to tuned with the `sapconf` profile;
//! sapconf 5 applies them itself and tuned must stay out of the way.

use super::finding::Finding;
use super::report::{Evaluation, Report};
use super::rules::{
    audit_files, coordinator_absent, coordinator_follows, evaluate_tool, exclusivity,
    expect_services, require_package, Flow, ProfileVocabulary, Rule, RuleContext,
    ServiceExpectation, TuningCheck, Want,
};
use super::version::SapconfTier;
use crate::error::Result;
use crate::system::{FactSnapshot, SAPCONF, SAPCONF_SERVICE, SAPTUNE_SERVICE, TUNED, TUNED_SERVICE};

/// Profiles sapconf 4 accepts
const TUNED_PROFILE: ProfileVocabulary = ProfileVocabulary {
    kind: "tuned profile",
    expected: "sapconf",
    deprecated: &["sap-hana", "sap-netweaver", "sap-ase", "sap-bobj"],
    obsolete_markers: &[],
    service: SAPCONF_SERVICE,
};

const SAPCONF_UNIT: [ServiceExpectation; 2] = [
    ServiceExpectation::must(SAPCONF_SERVICE, Want::Enabled),
    ServiceExpectation::must(SAPCONF_SERVICE, Want::Active),
];

const RULES: &[Rule<SapconfTier>] = &[
    Rule {
        name: "saptune stopped",
        check: saptune_stopped,
    },
    Rule {
        name: "sapconf service",
        check: sapconf_service,
    },
    Rule {
        name: "tuned",
        check: tuned,
    },
    Rule {
        name: "file set",
        check: file_set,
    },
];

/// Checker for sapconf
#[derive(Debug, Clone, Copy, Default)]
pub struct SapconfCheck;

impl TuningCheck for SapconfCheck {
    fn name(&self) -> &'static str {
        SAPCONF
    }

    fn evaluate(&self, facts: &FactSnapshot) -> Result<Evaluation> {
        evaluate_tool(SAPCONF, facts, RULES)
    }
}

fn saptune_stopped(ctx: &RuleContext<'_, SapconfTier>, report: &mut Report) -> Result<Flow> {
    exclusivity(SAPTUNE_SERVICE, ctx.facts, report);
    Ok(Flow::Continue)
}

fn sapconf_service(ctx: &RuleContext<'_, SapconfTier>, report: &mut Report) -> Result<Flow> {
    expect_services(&SAPCONF_UNIT, ctx.facts, report);
    Ok(Flow::Continue)
}

fn tuned(ctx: &RuleContext<'_, SapconfTier>, report: &mut Report) -> Result<Flow> {
    match ctx.tier {
        SapconfTier::Tuned => {
            if require_package(TUNED, ctx.facts, report) {
                coordinator_follows(SAPCONF_SERVICE, TUNED_SERVICE, ctx.facts, report);
                report.push(TUNED_PROFILE.evaluate(ctx.facts.profile(TUNED)));
            }
        }
        SapconfTier::Standalone => {
            coordinator_absent(TUNED_SERVICE, ctx.facts, report);
            if let Some(profile) = ctx.facts.profile(TUNED) {
                report.push(Finding::note(
                    "tuned profile",
                    format!("'{}' is set, but not used by sapconf {}", profile, ctx.version),
                ));
            }
        }
        SapconfTier::Unsupported | SapconfTier::Newer => {}
    }
    Ok(Flow::Continue)
}

fn file_set(ctx: &RuleContext<'_, SapconfTier>, report: &mut Report) -> Result<Flow> {
    audit_files(ctx, report)
}

//! saptune checks
//!
//! saptune 2 drives tuned with the `saptune` profile, saptune 3.0 applies
//! its notes directly. Both keep `SAPTUNE_VERSION` in the sysconfig file
//! and a selected solution.

use super::fileset::{self, FileSetTag};
use super::finding::{Finding, Hint};
use super::report::{Evaluation, Report};
use super::rules::{
    audit_files, coordinator_absent, evaluate_tool, exclusivity, expect_services,
    require_package, Flow, ProfileVocabulary, Rule, RuleContext, ServiceExpectation, TuningCheck,
    Want,
};
use super::version::{SaptuneTier, Version};
use crate::error::Result;
use crate::system::{FactSnapshot, SAPCONF_SERVICE, SAPTUNE, SAPTUNE_SERVICE, TUNED, TUNED_SERVICE};
use std::path::Path;

const MIGRATION_GUIDE: &str = "man 7 saptune-migrate";

/// Solutions removed from current saptune releases
pub const OBSOLETE_SOLUTIONS: [&str; 3] = ["BOBJ", "SAP-ASE", "MAXDB"];

const TUNED_PROFILE: ProfileVocabulary = ProfileVocabulary {
    kind: "tuned profile",
    expected: "saptune",
    deprecated: &[],
    obsolete_markers: &[],
    service: SAPTUNE_SERVICE,
};

const SAPTUNE_UNIT: [ServiceExpectation; 2] = [
    ServiceExpectation::must(SAPTUNE_SERVICE, Want::Enabled),
    ServiceExpectation::must(SAPTUNE_SERVICE, Want::Active),
];

const RULES: &[Rule<SaptuneTier>] = &[
    Rule {
        name: "sapconf stopped",
        check: sapconf_stopped,
    },
    Rule {
        name: "saptune service",
        check: saptune_service,
    },
    Rule {
        name: "tuned",
        check: tuned,
    },
    Rule {
        name: "configured version",
        check: configured_version,
    },
    Rule {
        name: "solution",
        check: solution,
    },
    Rule {
        name: "file set",
        check: file_set,
    },
];

/// Checker for saptune
#[derive(Debug, Clone, Copy, Default)]
pub struct SaptuneCheck;

impl TuningCheck for SaptuneCheck {
    fn name(&self) -> &'static str {
        SAPTUNE
    }

    fn evaluate(&self, facts: &FactSnapshot) -> Result<Evaluation> {
        evaluate_tool(SAPTUNE, facts, RULES)
    }
}

fn sapconf_stopped(ctx: &RuleContext<'_, SaptuneTier>, report: &mut Report) -> Result<Flow> {
    exclusivity(SAPCONF_SERVICE, ctx.facts, report);
    Ok(Flow::Continue)
}

fn saptune_service(ctx: &RuleContext<'_, SaptuneTier>, report: &mut Report) -> Result<Flow> {
    expect_services(&SAPTUNE_UNIT, ctx.facts, report);
    Ok(Flow::Continue)
}

fn tuned(ctx: &RuleContext<'_, SaptuneTier>, report: &mut Report) -> Result<Flow> {
    match ctx.tier {
        SaptuneTier::Tuned => {
            // tuned's boot state belongs to saptune.service
            if require_package(TUNED, ctx.facts, report) {
                report.push(ServiceExpectation::must(TUNED_SERVICE, Want::Active).evaluate(ctx.facts));
                report.push(TUNED_PROFILE.evaluate(ctx.facts.profile(TUNED)));
            }
        }
        SaptuneTier::Standalone => coordinator_absent(TUNED_SERVICE, ctx.facts, report),
        SaptuneTier::Unsupported | SaptuneTier::Superseded => {}
    }
    Ok(Flow::Continue)
}

fn configured_version(ctx: &RuleContext<'_, SaptuneTier>, report: &mut Report) -> Result<Flow> {
    const SUBJECT: &str = "SAPTUNE_VERSION";
    let expected = ctx.version.major.to_string();

    let finding = match ctx.facts.configured_version().map(str::trim) {
        None | Some("") => Finding::note(SUBJECT, "is not set in /etc/sysconfig/saptune"),
        Some(raw) => match Version::parse(raw) {
            Some(configured) if configured.major == ctx.version.major => {
                Finding::ok(SUBJECT, format!("is '{}'", raw))
            }
            // saptune 2 still configured for version 1 is an unfinished migration
            Some(configured) if configured.major == 1 && ctx.tier == SaptuneTier::Tuned => {
                if migration_reported(ctx)? {
                    Finding::note(SUBJECT, format!("is '{}', see the migration check below", raw))
                } else {
                    Finding::warn(
                        SUBJECT,
                        format!(
                            "is '{}', the migration to saptune {} has not been finished",
                            raw, ctx.version.major
                        ),
                        Hint::MigrationGuide(MIGRATION_GUIDE.to_string()),
                    )
                }
            }
            _ => Finding::fail(
                SUBJECT,
                format!("is '{}', but saptune {} is installed", raw, ctx.version),
                Hint::SetConfiguredVersion(expected),
            ),
        },
    };
    report.push(finding);
    Ok(Flow::Continue)
}

/// Whether the file audit reports the migration marker on this host
fn migration_reported(ctx: &RuleContext<'_, SaptuneTier>) -> Result<bool> {
    let spec = fileset::resolve(ctx.facts.os_release().major, FileSetTag::SaptuneTuned)?;
    Ok(spec.migration_probe.map_or(false, |probe| {
        ctx.facts
            .files()
            .content(Path::new(probe.path))
            .map_or(false, |content| content.contains(probe.marker))
    }))
}

fn solution(ctx: &RuleContext<'_, SaptuneTier>, report: &mut Report) -> Result<Flow> {
    const SUBJECT: &str = "saptune solution";

    let finding = match ctx.facts.profile(SAPTUNE) {
        None => Finding::note(SUBJECT, "no solution is selected"),
        Some(selected) => match OBSOLETE_SOLUTIONS.iter().find(|s| selected.contains(**s)) {
            Some(obsolete) => Finding::warn(
                SUBJECT,
                format!("'{}' contains the obsolete solution '{}'", selected, obsolete),
                Hint::ReviseSolution((*obsolete).to_string()),
            ),
            None => Finding::ok(SUBJECT, format!("is '{}'", selected)),
        },
    };
    report.push(finding);
    Ok(Flow::Continue)
}

fn file_set(ctx: &RuleContext<'_, SaptuneTier>, report: &mut Report) -> Result<Flow> {
    audit_files(ctx, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::fileset::resolve;
    use crate::check::{Severity, Status};
    use crate::system::collect::{parse_sysconfig, SAPTUNE_SYSCONFIG};
    use crate::system::{FactSnapshotBuilder, OsRelease, ServiceState, SAPCONF};
    use proptest::prelude::*;
    use ServiceState::*;

    fn base(version: &str, tag: FileSetTag) -> FactSnapshotBuilder {
        let spec = resolve(15, tag).unwrap();
        FactSnapshot::builder(OsRelease::sles(15, 4))
            .package(SAPTUNE, Some(version))
            .files(spec.mandatory.iter().copied())
    }

    fn healthy_standalone() -> FactSnapshotBuilder {
        base("3.0.2", FileSetTag::SaptuneStandalone)
            .service(SAPTUNE_SERVICE, Active, Enabled)
            .configured_version(Some("3"))
            .profile(SAPTUNE, Some("HANA"))
    }

    #[test]
    fn test_saptune_two_with_stopped_tuned() {
        let facts = base("2.0.3", FileSetTag::SaptuneTuned)
            .package(SAPCONF, None)
            .package(TUNED, Some("2.10.0"))
            .service(SAPTUNE_SERVICE, Active, Enabled)
            .service(TUNED_SERVICE, Inactive, Disabled)
            .build();

        let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
        assert_eq!(evaluation.status, Status::Fail);
        assert_eq!(evaluation.failures, 2);

        let failed: Vec<_> = evaluation
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Fail)
            .collect();
        assert_eq!(failed[0].subject, TUNED_SERVICE);
        assert_eq!(failed[0].hint, Some(Hint::StartService(TUNED_SERVICE.into())));
        assert_eq!(failed[1].subject, "tuned profile");
        assert_eq!(failed[1].message, "is not set");

        let notes = evaluation
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Note)
            .count();
        assert_eq!(notes, 2);
    }

    #[test]
    fn test_standalone_setup_is_ok() {
        let evaluation = SaptuneCheck.evaluate(&healthy_standalone().build()).unwrap();
        assert_eq!(evaluation.status, Status::Ok);
        assert_eq!(evaluation.tier.as_deref(), Some("standalone"));
    }

    #[test]
    fn test_configured_version_mismatch_fails() {
        let facts = healthy_standalone().configured_version(Some("2")).build();
        let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
        assert_eq!(evaluation.failures, 1);
        let failure = evaluation
            .findings
            .iter()
            .find(|f| f.severity == Severity::Fail)
            .unwrap();
        assert_eq!(failure.hint, Some(Hint::SetConfiguredVersion("3".into())));

        let garbage = healthy_standalone().configured_version(Some("x")).build();
        assert_eq!(SaptuneCheck.evaluate(&garbage).unwrap().failures, 1);
    }

    #[test]
    fn test_obsolete_solution_warns() {
        let facts = healthy_standalone().profile(SAPTUNE, Some("BOBJ")).build();
        let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
        assert_eq!(evaluation.status, Status::Warn);
        let warning = evaluation
            .findings
            .iter()
            .find(|f| f.severity == Severity::Warn)
            .unwrap();
        assert_eq!(warning.hint, Some(Hint::ReviseSolution("BOBJ".into())));
    }

    #[test]
    fn test_standalone_rejects_tuned() {
        let facts = healthy_standalone()
            .package(TUNED, Some("2.10.0"))
            .service(TUNED_SERVICE, Active, Disabled)
            .build();
        let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
        assert_eq!(evaluation.failures, 1);
        assert_eq!(
            evaluation
                .findings
                .iter()
                .find(|f| f.severity == Severity::Fail)
                .unwrap()
                .hint,
            Some(Hint::StopService(TUNED_SERVICE.into()))
        );
    }

    #[test]
    fn test_version_one_stops_with_migration_hint() {
        let facts = base("1.1.7", FileSetTag::SaptuneTuned)
            .service(SAPCONF_SERVICE, Active, Enabled)
            .build();
        let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
        assert_eq!(evaluation.findings.len(), 1);
        assert_eq!(
            evaluation.findings[0].hint,
            Some(Hint::MigrationGuide("man 7 saptune-migrate".into()))
        );
    }

    fn sles12_saptune_two(sysconfig: &str) -> FactSnapshot {
        let spec = resolve(12, FileSetTag::SaptuneTuned).unwrap();
        let values = parse_sysconfig(sysconfig);
        FactSnapshot::builder(OsRelease::sles(12, 5))
            .package(SAPTUNE, Some("2.0.3"))
            .package(TUNED, Some("2.8.0"))
            .service(SAPTUNE_SERVICE, Active, Enabled)
            .service(TUNED_SERVICE, Active, Disabled)
            .profile(TUNED, Some("saptune"))
            .profile(SAPTUNE, values.get("TUNE_FOR_SOLUTIONS").map(String::as_str))
            .configured_version(values.get("SAPTUNE_VERSION").map(String::as_str))
            .files(spec.mandatory.iter().copied())
            .file_content(SAPTUNE_SYSCONFIG, sysconfig)
            .build()
    }

    #[test]
    fn test_sles12_unfinished_migration_warns() {
        let facts = sles12_saptune_two("SAPTUNE_VERSION=\"1\"\nTUNE_FOR_SOLUTIONS=\"HANA\"\n");
        let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
        assert_eq!(evaluation.status, Status::Warn);
        assert_eq!(evaluation.failures, 0);
        assert_eq!(evaluation.warnings, 1);

        let warning = evaluation
            .findings
            .iter()
            .find(|f| f.severity == Severity::Warn)
            .unwrap();
        assert_eq!(warning.subject, SAPTUNE_SYSCONFIG);
        assert_eq!(warning.hint, Some(Hint::MigrationGuide(MIGRATION_GUIDE.into())));

        let migrated = sles12_saptune_two("SAPTUNE_VERSION=\"2\"\nTUNE_FOR_SOLUTIONS=\"HANA\"\n");
        assert_eq!(SaptuneCheck.evaluate(&migrated).unwrap().status, Status::Ok);
    }

    #[test]
    fn test_version_one_setting_on_sle15_warns_once() {
        let facts = base("2.0.3", FileSetTag::SaptuneTuned)
            .package(TUNED, Some("2.10.0"))
            .service(SAPTUNE_SERVICE, Active, Enabled)
            .service(TUNED_SERVICE, Active, Disabled)
            .profile(TUNED, Some("saptune"))
            .profile(SAPTUNE, Some("HANA"))
            .configured_version(Some("1"))
            .build();
        let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
        assert_eq!(evaluation.status, Status::Warn);
        assert_eq!(evaluation.warnings, 1);
        let warning = evaluation
            .findings
            .iter()
            .find(|f| f.severity == Severity::Warn)
            .unwrap();
        assert_eq!(warning.subject, "SAPTUNE_VERSION");
        assert_eq!(warning.hint, Some(Hint::MigrationGuide(MIGRATION_GUIDE.into())));

        let standalone = healthy_standalone().configured_version(Some("1")).build();
        assert_eq!(SaptuneCheck.evaluate(&standalone).unwrap().failures, 1);
    }

    fn state() -> impl Strategy<Value = ServiceState> {
        prop_oneof![Just(Active), Just(Inactive), Just(Missing)]
    }

    fn boot_state() -> impl Strategy<Value = ServiceState> {
        prop_oneof![Just(Enabled), Just(Disabled), Just(Missing)]
    }

    proptest! {
        #[test]
        fn prop_running_sapconf_always_fails(
            saptune_active in state(),
            saptune_enabled in boot_state(),
            sapconf_enabled in boot_state(),
            minor in 0u32..50,
        ) {
            let version = format!("2.{}.1", minor);
            let facts = base(&version, FileSetTag::SaptuneTuned)
                .service(SAPCONF_SERVICE, Active, sapconf_enabled)
                .service(SAPTUNE_SERVICE, saptune_active, saptune_enabled)
                .build();
            let evaluation = SaptuneCheck.evaluate(&facts).unwrap();
            prop_assert_eq!(evaluation.status, Status::Fail);
            let stop_hint = Some(Hint::StopService(SAPCONF_SERVICE.into()));
            let asks_to_stop = evaluation
                .findings
                .iter()
                .any(|f| f.severity == Severity::Fail && f.hint == stop_hint);
            prop_assert!(asks_to_stop, "no failure asks to stop {}", SAPCONF_SERVICE);
        }
    }
}

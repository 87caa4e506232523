//! Overview of the tuning related host state
//!
//! No rules run here; this just shows what the collector saw.

use super::facts::{
    FactSnapshot, OsRelease, ServiceState, UnknownUnitState, SAPCONF_SERVICE, SAPTUNE, SAPTUNE_SERVICE, TUNED,
    TUNED_SERVICE,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use sysinfo::System;

/// Identity of the running host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    /// Host name
    pub hostname: String,
    /// Running kernel
    pub kernel: Option<String>,
}

impl HostIdentity {
    /// Detect the identity of the local host
    pub fn detect() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            hostname,
            kernel: System::kernel_version(),
        }
    }
}

/// State of one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOverview {
    /// Unit name
    pub unit: String,
    /// Active state
    pub active: ServiceState,
    /// Enablement
    pub enabled: ServiceState,
    /// State systemd reported that could not be mapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown: Option<UnknownUnitState>,
}

/// Everything the overview subcommand prints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// Host identity
    pub host: HostIdentity,
    /// OS release
    pub os_release: OsRelease,
    /// Package versions, `None` when not installed
    pub packages: BTreeMap<String, Option<String>>,
    /// Units relevant to the tuning tools
    pub services: Vec<UnitOverview>,
    /// Profile tuned applies
    pub tuned_profile: Option<String>,
    /// Solution saptune applies
    pub saptune_solution: Option<String>,
    /// `SAPTUNE_VERSION` from the saptune sysconfig file
    pub configured_version: Option<String>,
}

impl Overview {
    /// Build the overview from collected facts
    pub fn new(host: HostIdentity, facts: &FactSnapshot) -> Self {
        let services = [SAPCONF_SERVICE, SAPTUNE_SERVICE, TUNED_SERVICE]
            .into_iter()
            .map(|unit| UnitOverview {
                unit: unit.to_string(),
                active: facts.service_active(unit),
                enabled: facts.service_enabled(unit),
                unknown: facts.unknown_unit_state(unit).cloned(),
            })
            .collect();

        Self {
            host,
            os_release: facts.os_release().clone(),
            packages: facts
                .packages()
                .map(|(name, version)| (name.to_string(), version.map(str::to_string)))
                .collect(),
            services,
            tuned_profile: facts.profile(TUNED).map(str::to_string),
            saptune_solution: facts.profile(SAPTUNE).map(str::to_string),
            configured_version: facts.configured_version().map(str::to_string),
        }
    }

    /// Write the overview as text
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "=== Host Overview ===\n")?;
        writeln!(out, "Host: {}", self.host.hostname)?;
        writeln!(out, "OS: {}", self.os_release)?;
        if let Some(kernel) = &self.host.kernel {
            writeln!(out, "Kernel: {}", kernel)?;
        }

        writeln!(out, "\nPackages:")?;
        for (name, version) in &self.packages {
            writeln!(
                out,
                "  {}: {}",
                name,
                version.as_deref().unwrap_or("not installed")
            )?;
        }

        writeln!(out, "\nServices:")?;
        for service in &self.services {
            match &service.unknown {
                Some(unknown) => writeln!(out, "  {}: unknown ({})", service.unit, unknown)?,
                None => writeln!(
                    out,
                    "  {}: {} / {}",
                    service.unit, service.active, service.enabled
                )?,
            }
        }

        writeln!(out, "\nConfiguration:")?;
        writeln!(out, "  tuned profile: {}", or_unset(&self.tuned_profile))?;
        writeln!(out, "  saptune solution: {}", or_unset(&self.saptune_solution))?;
        writeln!(out, "  SAPTUNE_VERSION: {}", or_unset(&self.configured_version))?;
        Ok(())
    }

    /// Print the overview to stdout
    pub fn print_summary(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_text(&mut out)
    }
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("not set")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::SAPCONF;

    fn sample() -> Overview {
        let facts = FactSnapshot::builder(OsRelease::sles(15, 4))
            .package(SAPCONF, None)
            .package(SAPTUNE, Some("3.0.2"))
            .service(SAPTUNE_SERVICE, ServiceState::Active, ServiceState::Enabled)
            .profile(SAPTUNE, Some("HANA"))
            .configured_version(Some("3"))
            .build();
        let host = HostIdentity {
            hostname: "hana01".to_string(),
            kernel: Some("5.14.21".to_string()),
        };
        Overview::new(host, &facts)
    }

    #[test]
    fn test_text_overview() {
        let mut buf = Vec::new();
        sample().write_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Host: hana01"));
        assert!(text.contains("OS: sles 15 SP4"));
        assert!(text.contains("  sapconf: not installed"));
        assert!(text.contains("  saptune: 3.0.2"));
        assert!(text.contains("  saptune.service: active / enabled"));
        assert!(text.contains("  tuned.service: missing / missing"));
        assert!(text.contains("  tuned profile: not set"));
        assert!(text.contains("  saptune solution: HANA"));
    }

    #[test]
    fn test_unknown_unit_state_is_shown() {
        let facts = FactSnapshot::builder(OsRelease::sles(15, 4))
            .package(TUNED, Some("2.10.0"))
            .unknown_unit_state(TUNED_SERVICE, "UnitFileState", "generated")
            .build();
        let host = HostIdentity {
            hostname: "hana02".to_string(),
            kernel: None,
        };
        let overview = Overview::new(host, &facts);

        let mut buf = Vec::new();
        overview.write_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("  tuned.service: unknown (UnitFileState=generated)"));

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["services"][2]["unknown"]["value"], "generated");
        assert!(json["services"][0].get("unknown").is_none());
    }

    #[test]
    fn test_json_overview() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["host"]["hostname"], "hana01");
        assert_eq!(json["packages"]["saptune"], "3.0.2");
        assert!(json["packages"]["sapconf"].is_null());
        assert_eq!(json["services"][1]["active"], "active");
        assert_eq!(json["configured_version"], "3");
    }
}

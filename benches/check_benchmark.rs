//! Performance benchmarks for sapcheck
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sapcheck::check::fileset::{resolve, FileSetTag};
use sapcheck::check::{SapconfCheck, SaptuneCheck, TuningCheck};
use sapcheck::system::collect::{parse_sysconfig, parse_unit_show, CommandOutput, CommandRunner};
use sapcheck::system::{
    FactSnapshot, HostCollector, OsRelease, ServiceState, SAPCONF, SAPCONF_SERVICE, SAPTUNE,
    SAPTUNE_SERVICE, TUNED, TUNED_SERVICE,
};
use std::fs;
use tempfile::TempDir;

/// Reports every package as missing and every unit as not found
struct EmptyHost;

impl CommandRunner for EmptyHost {
    fn run(&self, program: &str, _args: &[&str]) -> sapcheck::Result<CommandOutput> {
        let stdout = match program {
            "systemctl" => "LoadState=not-found\nActiveState=inactive\nUnitFileState=\n",
            _ => "",
        };
        Ok(CommandOutput {
            success: program == "systemctl",
            stdout: stdout.to_string(),
        })
    }
}

fn sapconf_facts() -> FactSnapshot {
    let spec = resolve(15, FileSetTag::SapconfTuned).unwrap();
    FactSnapshot::builder(OsRelease::sles(15, 4))
        .package(SAPCONF, Some("4.1.12"))
        .package(TUNED, Some("2.10.0"))
        .service(SAPCONF_SERVICE, ServiceState::Active, ServiceState::Enabled)
        .service(TUNED_SERVICE, ServiceState::Active, ServiceState::Disabled)
        .profile(TUNED, Some("sapconf"))
        .files(spec.mandatory.iter().copied())
        .file("/etc/sysconfig/sapconf.rpmsave")
        .build()
}

fn saptune_facts() -> FactSnapshot {
    let spec = resolve(12, FileSetTag::SaptuneTuned).unwrap();
    FactSnapshot::builder(OsRelease::sles(12, 5))
        .package(SAPTUNE, Some("2.0.3"))
        .package(TUNED, Some("2.8.0"))
        .service(SAPTUNE_SERVICE, ServiceState::Active, ServiceState::Enabled)
        .service(TUNED_SERVICE, ServiceState::Inactive, ServiceState::Disabled)
        .files(spec.mandatory.iter().copied())
        .file_content("/etc/sysconfig/saptune", "SAPTUNE_VERSION=\"1\"\n")
        .build()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let facts = sapconf_facts();
    group.bench_function("sapconf_tuned", |b| {
        b.iter(|| black_box(SapconfCheck.evaluate(black_box(&facts)).unwrap()))
    });

    let facts = saptune_facts();
    group.bench_function("saptune_tuned", |b| {
        b.iter(|| black_box(SaptuneCheck.evaluate(black_box(&facts)).unwrap()))
    });

    group.finish();
}

fn bench_parsing(c: &mut Criterion) {
    let sysconfig = "## Path: SAP/saptune\n# comment\nSAPTUNE_VERSION=\"3\"\nTUNE_FOR_SOLUTIONS=\"HANA\"\nTUNE_FOR_NOTES=\"\"\n";
    c.bench_function("parse_sysconfig", |b| {
        b.iter(|| black_box(parse_sysconfig(black_box(sysconfig))))
    });

    let show = "LoadState=loaded\nActiveState=active\nUnitFileState=enabled\n";
    c.bench_function("parse_unit_show", |b| {
        b.iter(|| black_box(parse_unit_show("tuned.service", black_box(show)).unwrap()))
    });
}

fn bench_collect(c: &mut Criterion) {
    let root = TempDir::new().unwrap();
    let etc = root.path().join("etc/sysconfig");
    fs::create_dir_all(&etc).unwrap();
    fs::write(
        root.path().join("etc/os-release"),
        "ID=\"sles\"\nVERSION_ID=\"15.4\"\n",
    )
    .unwrap();
    fs::write(etc.join("sapconf"), "").unwrap();

    let collector = HostCollector::with_runner(root.path(), EmptyHost);
    c.bench_function("collect_prefixed_root", |b| {
        b.iter(|| black_box(collector.collect().unwrap()))
    });
}

criterion_group!(benches, bench_evaluate, bench_parsing, bench_collect);
criterion_main!(benches);

//! Validator behaviour against packages built by `create_wacz` and then
//! tampered with.

mod common;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use common::{example_capture, rewrite_zip, write_zip};
use wacz_core::{
    CheckKind, CheckStatus, CreateOptions, DATAPACKAGE_PATH, FormatVersion, HashAlgorithm,
    INDEX_CDX_PATH, ValidateOptions, create_wacz, validate_wacz,
};

fn build_package(dir: &Path, algorithm: HashAlgorithm) -> PathBuf {
    let input = example_capture().write(dir, "example.warc.gz");
    let output = dir.join("example.wacz");
    let options = CreateOptions::builder()
        .input(&input)
        .output(&output)
        .detect_pages(true)
        .hash_algorithm(algorithm)
        .build();
    create_wacz(&options).unwrap();
    output
}

fn statuses(report: &wacz_core::ValidationReport) -> Vec<(CheckKind, CheckStatus)> {
    report.checks.iter().map(|check| (check.kind, check.status)).collect()
}

#[test]
fn created_package_passes_every_check() {
    for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Md5] {
        let dir = TempDir::new().unwrap();
        let package = build_package(dir.path(), algorithm);

        let report = validate_wacz(&package, ValidateOptions::default()).unwrap();
        assert!(report.is_valid(), "{:?}", report.findings().collect::<Vec<_>>());
        assert_eq!(report.version, FormatVersion::Current("1.1.1".to_string()));
        assert_eq!(report.hash_algorithm, Some(algorithm));
        assert!(report.checks.iter().all(|check| check.status == CheckStatus::Passed));
        assert_eq!(report.checks.len(), 5);
    }
}

#[test]
fn missing_manifest_stops_after_required_contents() {
    let dir = TempDir::new().unwrap();
    let package = build_package(dir.path(), HashAlgorithm::Sha256);
    let stripped = dir.path().join("stripped.wacz");
    rewrite_zip(&package, &stripped, |name, data| {
        (name != DATAPACKAGE_PATH).then_some(data)
    });

    let report = validate_wacz(&stripped, ValidateOptions::default()).unwrap();
    assert!(!report.is_valid());
    assert_eq!(
        statuses(&report),
        vec![
            (CheckKind::RequiredContents, CheckStatus::Failed),
            (CheckKind::Schema, CheckStatus::Skipped),
            (CheckKind::FilePaths, CheckStatus::Skipped),
            (CheckKind::FileHashes, CheckStatus::Skipped),
            (CheckKind::IndexRebuild, CheckStatus::Skipped),
        ]
    );
    let findings = &report.check(CheckKind::RequiredContents).unwrap().findings;
    assert_eq!(findings[0].path.as_deref(), Some(DATAPACKAGE_PATH));
}

#[test]
fn tampered_warc_reports_its_path() {
    let dir = TempDir::new().unwrap();
    let package = build_package(dir.path(), HashAlgorithm::Sha256);
    let tampered = dir.path().join("tampered.wacz");
    rewrite_zip(&package, &tampered, |name, mut data| {
        if name == "archive/example.warc.gz" {
            data.extend_from_slice(b"trailing garbage");
        }
        Some(data)
    });

    let report = validate_wacz(&tampered, ValidateOptions::default()).unwrap();
    assert!(!report.is_valid());
    let hashes = report.check(CheckKind::FileHashes).unwrap();
    assert_eq!(hashes.status, CheckStatus::Failed);
    let paths: Vec<_> = hashes.findings.iter().filter_map(|f| f.path.as_deref()).collect();
    assert_eq!(paths, vec!["archive/example.warc.gz"]);
    assert!(report.check(CheckKind::FilePaths).unwrap().passed());
}

#[test]
fn unlisted_member_fails_file_paths() {
    let dir = TempDir::new().unwrap();
    let package = build_package(dir.path(), HashAlgorithm::Sha256);
    let mut members = common::read_members(&package);
    members.insert(0, ("logs/extra.log".to_string(), b"not listed".to_vec()));
    let extended = dir.path().join("extended.wacz");
    write_zip(&extended, &members);

    let report = validate_wacz(&extended, ValidateOptions::default()).unwrap();
    assert!(!report.is_valid());
    let paths = report.check(CheckKind::FilePaths).unwrap();
    assert_eq!(paths.findings.len(), 1);
    assert_eq!(paths.findings[0].path.as_deref(), Some("logs/extra.log"));
    assert_eq!(report.check(CheckKind::FileHashes).unwrap().status, CheckStatus::Skipped);
}

#[test]
fn schema_failure_names_the_field() {
    let dir = TempDir::new().unwrap();
    let package = build_package(dir.path(), HashAlgorithm::Sha256);
    let broken = dir.path().join("broken.wacz");
    rewrite_zip(&package, &broken, |name, data| {
        if name != DATAPACKAGE_PATH {
            return Some(data);
        }
        let mut manifest: serde_json::Value = serde_json::from_slice(&data).unwrap();
        manifest["resources"][0]["path"] = serde_json::Value::String(String::new());
        Some(serde_json::to_vec(&manifest).unwrap())
    });

    let report = validate_wacz(&broken, ValidateOptions::default()).unwrap();
    assert!(!report.is_valid());
    let schema = report.check(CheckKind::Schema).unwrap();
    assert_eq!(schema.status, CheckStatus::Failed);
    assert!(schema
        .findings
        .iter()
        .any(|f| f.path.as_deref() == Some("resources[0].path")));
}

#[test]
fn legacy_package_is_valid_without_checks() {
    let dir = TempDir::new().unwrap();
    let legacy = dir.path().join("legacy.wacz");
    write_zip(
        &legacy,
        &[
            ("webarchive.yaml".to_string(), b"title: Old collection\n".to_vec()),
            ("archive/data.warc".to_string(), b"WARC/1.0\r\n".to_vec()),
        ],
    );

    let report = validate_wacz(&legacy, ValidateOptions::default()).unwrap();
    assert!(report.is_valid());
    assert_eq!(report.version, FormatVersion::Legacy);
    assert!(report.checks.is_empty());
}

#[test]
fn index_rebuild_is_advisory_and_skippable() {
    let dir = TempDir::new().unwrap();
    let package = build_package(dir.path(), HashAlgorithm::Sha256);

    let skipped = validate_wacz(&package, ValidateOptions { check_index: false }).unwrap();
    assert!(skipped.is_valid());
    assert!(skipped.check(CheckKind::IndexRebuild).is_none());

    // Replace the index with a different one and re-list its digest, so only
    // the rebuild comparison can notice.
    let swapped = dir.path().join("swapped.wacz");
    let fake_index = wacz_core::write_zipnum(&["com,example)/ 20200101000000 {}".to_string()], 10)
        .unwrap()
        .cdx_gz;
    let fake_digest = wacz_core::hash(HashAlgorithm::Sha256, &fake_index);
    let fake_len = fake_index.len();
    rewrite_zip(&package, &swapped, |name, data| match name {
        INDEX_CDX_PATH => Some(fake_index.clone()),
        DATAPACKAGE_PATH => {
            let mut manifest: serde_json::Value = serde_json::from_slice(&data).unwrap();
            for resource in manifest["resources"].as_array_mut().unwrap() {
                if resource["path"] == INDEX_CDX_PATH {
                    resource["stats"]["hash"] = fake_digest.clone().into();
                    resource["stats"]["bytes"] = fake_len.into();
                }
            }
            Some(serde_json::to_vec(&manifest).unwrap())
        }
        _ => Some(data),
    });

    let report = validate_wacz(&swapped, ValidateOptions::default()).unwrap();
    let rebuild = report.check(CheckKind::IndexRebuild).unwrap();
    assert_eq!(rebuild.status, CheckStatus::Failed);
    assert!(report.is_valid());
}

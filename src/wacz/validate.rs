//! Validation of an existing WACZ package.
//!
//! The package is read into memory once. Checks run fail-fast in a fixed
//! order (required contents, manifest schema, file paths, file hashes); the
//! index rebuild comparison runs last and is advisory only.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use validator::{Validate, ValidationErrors, ValidationErrorsKind};
use zip::ZipArchive;

use crate::constants::{
    ARCHIVE_DIR, DATAPACKAGE_DIGEST_PATH, DATAPACKAGE_PATH, INDEX_CDX_PATH, INDEXES_DIR,
    LEGACY_DESCRIPTOR_PATH, PAGES_DIR,
};
use crate::error::Result;
use crate::hash::{HashAlgorithm, parse_digest};
use crate::index::index_warcs;
use crate::types::{
    CheckKind, FormatVersion, Manifest, RecordFilter, ValidateOptions, ValidationCheck,
    ValidationFinding, ValidationReport,
};

/// One validator session over an in-memory package.
#[derive(Debug)]
pub struct Validation {
    members: BTreeMap<String, Vec<u8>>,
    version: FormatVersion,
    manifest: Option<std::result::Result<Manifest, String>>,
}

impl Validation {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs_err::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Read every file member of the zip container and detect its version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut members = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
            file.read_to_end(&mut data)?;
            members.insert(name, data);
        }
        let mut validation = Self {
            members,
            version: FormatVersion::Unknown,
            manifest: None,
        };
        validation.detect_version();
        Ok(validation)
    }

    #[must_use]
    pub fn version(&self) -> &FormatVersion {
        &self.version
    }

    /// Parsed manifest, when `datapackage.json` was present and well-formed.
    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref().and_then(|parsed| parsed.as_ref().ok())
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// `datapackage.json` decides between current and invalid; `webarchive.yaml` means legacy.
    pub fn detect_version(&mut self) -> &FormatVersion {
        self.version = if let Some(raw) = self.members.get(DATAPACKAGE_PATH) {
            let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_slice(raw);
            self.manifest = Some(
                parsed
                    .as_ref()
                    .map_err(ToString::to_string)
                    .and_then(|value| {
                        serde_json::from_value(value.clone()).map_err(|err| err.to_string())
                    }),
            );
            match parsed
                .ok()
                .as_ref()
                .and_then(|value| value.get("wacz_version"))
                .and_then(serde_json::Value::as_str)
            {
                Some(version) => FormatVersion::Current(version.to_string()),
                None => FormatVersion::Invalid,
            }
        } else if self.members.contains_key(LEGACY_DESCRIPTOR_PATH) {
            FormatVersion::Legacy
        } else {
            FormatVersion::Invalid
        };
        tracing::info!(target = "wacz::validate", version = %self.version, "version detected");
        &self.version
    }

    /// Digest algorithm of the first listed resource.
    #[must_use]
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        let first = self.manifest()?.resources.first()?;
        first
            .hash_algorithm()
            .or_else(|| match first.stats.hash.len() {
                32 => Some(HashAlgorithm::Md5),
                64 => Some(HashAlgorithm::Sha256),
                _ => None,
            })
    }

    pub fn check_required_contents(&self) -> ValidationCheck {
        let mut findings = Vec::new();
        if !self.members.contains_key(DATAPACKAGE_PATH) {
            findings.push(ValidationFinding::at(DATAPACKAGE_PATH, "missing"));
        }
        for dir in [ARCHIVE_DIR, INDEXES_DIR, PAGES_DIR] {
            if !self.members.keys().any(|name| name.starts_with(dir)) {
                findings.push(ValidationFinding::at(dir, "no files in directory"));
            }
        }
        ValidationCheck::from_findings(CheckKind::RequiredContents, findings)
    }

    pub fn check_schema(&self) -> ValidationCheck {
        let findings = match &self.manifest {
            None => vec![ValidationFinding::at(DATAPACKAGE_PATH, "missing")],
            Some(Err(err)) => vec![ValidationFinding::at(DATAPACKAGE_PATH, err.clone())],
            Some(Ok(manifest)) => match manifest.validate() {
                Ok(()) => Vec::new(),
                Err(errors) => {
                    let mut findings = Vec::new();
                    flatten_errors("", &errors, &mut findings);
                    findings.sort_by(|a, b| a.path.cmp(&b.path));
                    findings
                }
            },
        };
        ValidationCheck::from_findings(CheckKind::Schema, findings)
    }

    /// Every member (except the manifest) is listed, and every listed path exists.
    pub fn check_file_paths(&self) -> ValidationCheck {
        let Some(manifest) = self.manifest() else {
            return ValidationCheck::from_findings(
                CheckKind::FilePaths,
                vec![ValidationFinding::at(DATAPACKAGE_PATH, "manifest unavailable")],
            );
        };
        let mut findings = Vec::new();
        for name in self.content_members() {
            if manifest.resource(name).is_none() {
                findings.push(ValidationFinding::at(name, "not listed in datapackage"));
            }
        }
        for resource in &manifest.resources {
            if !self.members.contains_key(&resource.path) {
                findings.push(ValidationFinding::at(
                    resource.path.as_str(),
                    "listed in datapackage but missing from archive",
                ));
            }
        }
        ValidationCheck::from_findings(CheckKind::FilePaths, findings)
    }

    /// Rehash every member with the algorithm of the first resource entry.
    pub fn check_file_hashes(&self) -> ValidationCheck {
        let (Some(manifest), Some(algorithm)) = (self.manifest(), self.hash_algorithm()) else {
            return ValidationCheck::from_findings(
                CheckKind::FileHashes,
                vec![ValidationFinding::at(DATAPACKAGE_PATH, "no usable hash algorithm")],
            );
        };
        let mut findings = Vec::new();
        for name in self.content_members() {
            let Some(resource) = manifest.resource(name) else {
                findings.push(ValidationFinding::at(name, "no hash listed in datapackage"));
                continue;
            };
            let actual = algorithm.hex_digest(&self.members[name]);
            if expected_hex(&resource.stats.hash) != Some(actual.as_str()) {
                findings.push(ValidationFinding::at(
                    name,
                    format!("{algorithm} hash does not match the datapackage"),
                ));
            }
        }
        ValidationCheck::from_findings(CheckKind::FileHashes, findings)
    }

    /// Re-index the bundled WARCs and compare with the listed `index.cdx.gz` digest.
    pub fn check_index(&self) -> ValidationCheck {
        let Some(listed) = self.manifest().and_then(|m| m.resource(INDEX_CDX_PATH)) else {
            return ValidationCheck::skipped(CheckKind::IndexRebuild);
        };
        let Some(algorithm) = listed.hash_algorithm().or_else(|| self.hash_algorithm()) else {
            return ValidationCheck::skipped(CheckKind::IndexRebuild);
        };
        let inputs = self.members.iter().filter_map(|(name, data)| {
            name.strip_prefix(ARCHIVE_DIR)
                .map(|file| (file, data.as_slice()))
        });
        let findings = match index_warcs(inputs, RecordFilter::All).and_then(|out| out.zipnum()) {
            Ok(rebuilt) => {
                let actual = algorithm.hex_digest(&rebuilt.cdx_gz);
                if expected_hex(&listed.stats.hash) == Some(actual.as_str()) {
                    Vec::new()
                } else {
                    vec![ValidationFinding::at(
                        INDEX_CDX_PATH,
                        "rebuilt index differs from the packaged index",
                    )]
                }
            }
            Err(err) => vec![ValidationFinding::at(
                INDEX_CDX_PATH,
                format!("index rebuild failed: {err}"),
            )],
        };
        ValidationCheck::from_findings(CheckKind::IndexRebuild, findings)
    }

    /// Run every check in order, stopping at the first failure.
    #[must_use]
    pub fn run(&self, options: ValidateOptions) -> ValidationReport {
        if self.version == FormatVersion::Legacy {
            return ValidationReport::new(self.version.clone(), None, Vec::new());
        }
        let required: [(CheckKind, fn(&Self) -> ValidationCheck); 4] = [
            (CheckKind::RequiredContents, Self::check_required_contents),
            (CheckKind::Schema, Self::check_schema),
            (CheckKind::FilePaths, Self::check_file_paths),
            (CheckKind::FileHashes, Self::check_file_hashes),
        ];
        let mut checks = Vec::new();
        let mut failed = false;
        for (kind, check) in required {
            if failed {
                checks.push(ValidationCheck::skipped(kind));
                continue;
            }
            let result = check(self);
            for finding in &result.findings {
                tracing::warn!(target = "wacz::validate", check = kind.label(), %finding);
            }
            failed = !result.passed();
            checks.push(result);
        }
        if options.check_index {
            if failed {
                checks.push(ValidationCheck::skipped(CheckKind::IndexRebuild));
            } else {
                let result = self.check_index();
                for finding in &result.findings {
                    tracing::warn!(target = "wacz::validate", check = "index rebuild", %finding, "advisory");
                }
                checks.push(result);
            }
        }
        ValidationReport::new(self.version.clone(), self.hash_algorithm(), checks)
    }

    /// Members that must appear in the manifest.
    fn content_members(&self) -> impl Iterator<Item = &str> {
        self.members
            .keys()
            .map(String::as_str)
            .filter(|name| *name != DATAPACKAGE_PATH && *name != DATAPACKAGE_DIGEST_PATH)
    }
}

/// Validate the package at `path`.
pub fn validate_wacz(path: &Path, options: ValidateOptions) -> Result<ValidationReport> {
    let validation = Validation::open(path)?;
    let report = validation.run(options);
    tracing::info!(
        target = "wacz::validate",
        path = %path.display(),
        valid = report.is_valid(),
        "validation finished"
    );
    Ok(report)
}

/// Hex part of a listed digest, prefixed or bare.
fn expected_hex(digest: &str) -> Option<&str> {
    match parse_digest(digest) {
        Ok(Some((_, hex_part))) => Some(hex_part),
        Ok(None) => Some(digest),
        Err(_) => None,
    }
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<ValidationFinding>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| format!("invalid {}", error.code), ToString::to_string);
                    out.push(ValidationFinding::at(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

//! Outcome of validating a packaged archive.

use std::fmt;

use serde::Serialize;

use crate::hash::HashAlgorithm;

/// Format revision detected for an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "version", rename_all = "snake_case")]
pub enum FormatVersion {
    Unknown,
    /// Pre-datapackage layout with `webarchive.yaml`; accepted without checks.
    Legacy,
    Current(String),
    Invalid,
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Legacy => f.write_str(crate::constants::LEGACY_FORMAT_VERSION),
            Self::Current(version) => f.write_str(version),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    RequiredContents,
    Schema,
    FilePaths,
    FileHashes,
    /// Advisory: never decides overall validity.
    IndexRebuild,
}

impl CheckKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::RequiredContents => "required contents",
            Self::Schema => "datapackage schema",
            Self::FilePaths => "file paths",
            Self::FileHashes => "file hashes",
            Self::IndexRebuild => "index rebuild",
        }
    }

    #[must_use]
    pub fn is_advisory(self) -> bool {
        matches!(self, Self::IndexRebuild)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    /// Not run because an earlier required check failed.
    Skipped,
}

/// One specific problem, tied to a member path or manifest field when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

impl ValidationFinding {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{path}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationCheck {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub findings: Vec<ValidationFinding>,
}

impl ValidationCheck {
    #[must_use]
    pub fn from_findings(kind: CheckKind, findings: Vec<ValidationFinding>) -> Self {
        let status = if findings.is_empty() {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };
        Self {
            kind,
            status,
            findings,
        }
    }

    #[must_use]
    pub fn skipped(kind: CheckKind) -> Self {
        Self {
            kind,
            status: CheckStatus::Skipped,
            findings: Vec::new(),
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

/// Full result of one validator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub version: FormatVersion,
    pub hash_algorithm: Option<HashAlgorithm>,
    pub checks: Vec<ValidationCheck>,
    pub status: ValidationStatus,
}

impl ValidationReport {
    /// Derive the overall status from the non-advisory checks.
    #[must_use]
    pub fn new(
        version: FormatVersion,
        hash_algorithm: Option<HashAlgorithm>,
        checks: Vec<ValidationCheck>,
    ) -> Self {
        let version_ok = matches!(version, FormatVersion::Legacy | FormatVersion::Current(_));
        let checks_ok = checks
            .iter()
            .filter(|check| !check.kind.is_advisory())
            .all(|check| check.status == CheckStatus::Passed);
        let status = if version_ok && checks_ok {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid
        };
        Self {
            version,
            hash_algorithm,
            checks,
            status,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    #[must_use]
    pub fn check(&self, kind: CheckKind) -> Option<&ValidationCheck> {
        self.checks.iter().find(|check| check.kind == kind)
    }

    /// Every finding across all checks, labelled with its check.
    pub fn findings(&self) -> impl Iterator<Item = (CheckKind, &ValidationFinding)> {
        self.checks
            .iter()
            .flat_map(|check| check.findings.iter().map(move |f| (check.kind, f)))
    }
}

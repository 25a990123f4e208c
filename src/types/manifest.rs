//! `datapackage.json` descriptor and the shape rules it must satisfy.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::constants::DATAPACKAGE_PROFILE;
use crate::hash::{HashAlgorithm, parse_digest};

/// Size and digest of one archive member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ResourceStats {
    /// `algorithm:hexdigest`
    #[validate(custom(function = "validate_digest"))]
    pub hash: String,
    pub bytes: u64,
}

/// Manifest entry describing one archive member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ResourceDescriptor {
    #[serde(default)]
    pub name: String,
    #[validate(custom(function = "validate_member_path"))]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_hashing"))]
    pub hashing: Option<String>,
    #[validate(nested)]
    pub stats: ResourceStats,
}

impl ResourceDescriptor {
    /// Algorithm that produced `stats.hash`: the digest prefix wins over `hashing`.
    #[must_use]
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        match parse_digest(&self.stats.hash) {
            Ok(Some((algorithm, _))) => Some(algorithm),
            _ => self.hashing.as_deref().and_then(|name| name.parse().ok()),
        }
    }
}

/// The archive's self-describing manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Manifest {
    #[validate(custom(function = "validate_profile"))]
    pub profile: String,
    #[validate(length(min = 1, message = "resources must not be empty"), nested)]
    pub resources: Vec<ResourceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wacz_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "mainPageURL", default, skip_serializing_if = "Option::is_none")]
    pub main_page_url: Option<String>,
    #[serde(rename = "mainPageDate", default, skip_serializing_if = "Option::is_none")]
    pub main_page_date: Option<String>,
}

impl Manifest {
    /// Resource listed under `path`, if any.
    #[must_use]
    pub fn resource(&self, path: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|resource| resource.path == path)
    }
}

fn validate_profile(profile: &str) -> Result<(), ValidationError> {
    if profile == DATAPACKAGE_PROFILE {
        Ok(())
    } else {
        Err(ValidationError::new("profile"))
    }
}

fn validate_member_path(path: &str) -> Result<(), ValidationError> {
    let escapes = path.split('/').any(|segment| segment == "..");
    if path.is_empty() || path.starts_with('/') || path.contains('\\') || escapes {
        return Err(ValidationError::new("path"));
    }
    Ok(())
}

fn validate_hashing(name: &str) -> Result<(), ValidationError> {
    name.parse::<HashAlgorithm>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("hashing"))
}

fn validate_digest(digest: &str) -> Result<(), ValidationError> {
    parse_digest(digest)
        .map(|_| ())
        .map_err(|_| ValidationError::new("hash"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    fn resource(path: &str) -> ResourceDescriptor {
        ResourceDescriptor {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            hashing: Some("sha256".to_string()),
            stats: ResourceStats {
                hash: hash(HashAlgorithm::Sha256, b"bytes"),
                bytes: 5,
            },
        }
    }

    fn manifest(resources: Vec<ResourceDescriptor>) -> Manifest {
        Manifest {
            profile: DATAPACKAGE_PROFILE.to_string(),
            resources,
            wacz_version: Some("1.1.1".to_string()),
            software: None,
            created: None,
            title: None,
            description: None,
            main_page_url: None,
            main_page_date: None,
        }
    }

    #[test]
    fn well_formed_manifest_passes() {
        assert!(manifest(vec![resource("pages/pages.jsonl")]).validate().is_ok());
    }

    #[test]
    fn shape_violations_are_reported() {
        assert!(manifest(Vec::new()).validate().is_err());

        let mut bad_profile = manifest(vec![resource("pages/pages.jsonl")]);
        bad_profile.profile = "tabular-data-package".to_string();
        assert!(bad_profile.validate().is_err());

        let mut escaping = resource("../etc/passwd");
        assert!(manifest(vec![escaping.clone()]).validate().is_err());

        escaping.path = "archive/data.warc".to_string();
        escaping.stats.hash = "sha256:1234".to_string();
        assert!(manifest(vec![escaping]).validate().is_err());
    }

    #[test]
    fn serialized_keys_follow_datapackage_names() {
        let mut value = manifest(vec![resource("archive/data.warc")]);
        value.main_page_url = Some("http://www.example.com/".to_string());
        let json = serde_json::to_value(&value).expect("json");
        assert_eq!(json["mainPageURL"], "http://www.example.com/");
        assert_eq!(json["resources"][0]["hashing"], "sha256");
        assert!(json["resources"][0]["stats"]["hash"]
            .as_str()
            .is_some_and(|digest| digest.starts_with("sha256:")));

        let legacy: Manifest = serde_json::from_str(
            r#"{"profile":"data-package","resources":[],"desc":"older key"}"#,
        )
        .expect("parse");
        assert_eq!(legacy.description.as_deref(), Some("older key"));
        assert!(legacy.wacz_version.is_none());
    }
}

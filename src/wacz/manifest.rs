//! Assembles `datapackage.json` from finalized archive members.

use crate::constants::{DATAPACKAGE_PROFILE, WACZ_FORMAT_VERSION};
use crate::hash::{HashAlgorithm, hash};
use crate::timestamp::now_iso;
use crate::types::{Manifest, ResourceDescriptor, ResourceStats};

/// Collects one resource per member. [`ManifestBuilder::finish`] consumes the
/// builder, so nothing can be added once the manifest exists.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    algorithm: HashAlgorithm,
    resources: Vec<ResourceDescriptor>,
    software: String,
    created: Option<String>,
    title: Option<String>,
    description: Option<String>,
    main_page_url: Option<String>,
    main_page_date: Option<String>,
}

impl ManifestBuilder {
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            resources: Vec::new(),
            software: format!("wacz-core {}", crate::WACZ_CORE_VERSION),
            created: None,
            title: None,
            description: None,
            main_page_url: None,
            main_page_date: None,
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash `bytes` as the final content of member `path`.
    pub fn add_member(&mut self, path: &str, bytes: &[u8]) -> &ResourceDescriptor {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.resources.push(ResourceDescriptor {
            name,
            path: path.to_string(),
            hashing: Some(self.algorithm.label().to_string()),
            stats: ResourceStats {
                hash: hash(self.algorithm, bytes),
                bytes: bytes.len() as u64,
            },
        });
        &self.resources[self.resources.len() - 1]
    }

    #[must_use]
    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Main page URL and its ISO-8601 date.
    #[must_use]
    pub fn main_page(mut self, url: impl Into<String>, date: Option<String>) -> Self {
        self.main_page_url = Some(url.into());
        self.main_page_date = date;
        self
    }

    /// Pin `created` instead of stamping the current time.
    #[must_use]
    pub fn created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> Manifest {
        Manifest {
            profile: DATAPACKAGE_PROFILE.to_string(),
            resources: self.resources,
            wacz_version: Some(WACZ_FORMAT_VERSION.to_string()),
            software: Some(self.software),
            created: Some(self.created.unwrap_or_else(now_iso)),
            title: self.title,
            description: self.description,
            main_page_url: self.main_page_url,
            main_page_date: self.main_page_date,
        }
    }
}

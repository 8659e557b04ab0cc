use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Code field value that switches the code fallback onto the ucode property.
pub const GEOMETRY_CODE: &str = "geometry_code";

/// Property names read from each feature of a level's feature collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    pub concept_uuid: String,
    pub name: String,
    pub ucode: String,
    /// Ordered list of parent ucodes, coarsest first.
    pub parents: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            concept_uuid: "c".into(),
            name: "n".into(),
            ucode: "u".into(),
            parents: "p".into(),
        }
    }
}

/// Settings shared by every fetch run and the HTTP source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Prefix joined to level URLs that are not already absolute.
    pub domain: String,
    /// Which identifier the dashboard keys geometries by.
    pub code_field: String,
    pub properties: PropertyNames,
    /// Buffered progress messages per fetch run.
    pub channel_capacity: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            code_field: GEOMETRY_CODE.into(),
            properties: PropertyNames::default(),
            channel_capacity: 16,
            user_agent: concat!("geolevels/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 60,
        }
    }
}

impl PipelineConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into(), ..Self::default() }
    }

    pub fn with_code_field(mut self, code_field: impl Into<String>) -> Self {
        self.code_field = code_field.into();
        self
    }

    /// Property consulted when a feature has no concept uuid.
    pub fn fallback_code_property(&self) -> &str {
        if self.code_field == GEOMETRY_CODE {
            &self.properties.ucode
        } else {
            &self.code_field
        }
    }

    /// Reads a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Location and version tag of one persisted series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub key: String,
    pub version: String,
    pub dir: PathBuf,
}

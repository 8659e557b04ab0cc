use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Administrative level rank: 0 is the country, larger numbers are finer subdivisions.
pub type Level = u32;

/// All units of one level, keyed by their resolved code.
pub type UnitMap = BTreeMap<String, GeographicUnit>;

/// Per-level unit maps, keyed by administrative level.
pub type LevelMap = BTreeMap<Level, UnitMap>;

/// Compact reference to a unit, used for parent and member chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRef {
    pub name: String,
    pub ucode: String,
    pub code: String,
}

/// A single normalized feature at one administrative level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicUnit {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ucode: String,
    #[serde(default)]
    pub concept_uuid: String,
    /// Opaque GeoJSON geometry, passed through untouched.
    #[serde(default)]
    pub geometry: Value,
    /// Ancestors ordered from the coarsest level down to the immediate parent.
    #[serde(default)]
    pub parents: Vec<UnitRef>,
    /// `parents` followed by the unit itself.
    #[serde(default)]
    pub members: Vec<UnitRef>,
}

impl GeographicUnit {
    /// The reference other units use to point at this one.
    pub fn to_ref(&self) -> UnitRef {
        UnitRef {
            name: self.name.clone(),
            ucode: self.ucode.clone(),
            code: self.code.clone(),
        }
    }

    /// True if `code` is this unit or one of its recorded ancestors.
    pub fn has_member(&self, code: &str) -> bool {
        self.members.iter().any(|member| member.code == code)
    }
}

/// Flattened, colored view of a unit for legends and lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitListEntry {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Identifier of the dataset run that added the entry, echoed as received.
    pub reference_layer_uuid: Value,
}

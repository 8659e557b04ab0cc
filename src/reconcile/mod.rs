//! Unit-list reconciler.
//!
//! Folds freshly fetched units into the flat, colored list used by legends.
//! Entries already in the list are carried through as they are; only units
//! whose ucode and concept uuid are both unknown get a new entry.

mod color;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{
    unit::{GeographicUnit, UnitListEntry, UnitMap},
    worker::{decode_message, spawn_oneshot},
};

pub use color::{palette_color, random_color, Rgb};

/// Inbound message for the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    /// Dataset that owns `geometries_data`, copied onto new entries.
    pub identifier: Value,
    pub geometries_data: UnitMap,
    #[serde(default)]
    pub unit_list: Vec<UnitListEntry>,
    /// Color for new entries instead of a random one.
    #[serde(default)]
    pub color: Option<String>,
    /// When set, recolors every output entry by position.
    #[serde(default)]
    pub colors: Option<Vec<String>>,
}

fn new_entry(unit: &GeographicUnit, identifier: &Value, color: Option<&str>) -> UnitListEntry {
    UnitListEntry {
        id: unit.concept_uuid.clone(),
        name: format!("{} ({})", unit.name, unit.ucode),
        color: color.map(str::to_string).unwrap_or_else(random_color),
        reference_layer_uuid: identifier.clone(),
    }
}

/// Existing entries first (untouched), then one entry per unseen unit in map order.
/// A palette, if given, overrides the color of every entry including existing ones.
pub fn reconcile(request: ReconcileRequest) -> Vec<UnitListEntry> {
    let ReconcileRequest { identifier, geometries_data, unit_list, color, colors } = request;

    // Empty ids never match: units without a concept uuid each get an entry.
    let mut known: HashSet<String> = unit_list.iter()
        .filter(|entry| !entry.id.is_empty())
        .map(|entry| entry.id.clone())
        .collect();
    let mut list = unit_list;

    for unit in geometries_data.values() {
        let listed = |id: &str| !id.is_empty() && known.contains(id);
        if listed(&unit.ucode) || listed(&unit.concept_uuid) { continue }
        let entry = new_entry(unit, &identifier, color.as_deref());
        if !entry.id.is_empty() {
            known.insert(entry.id.clone());
        }
        list.push(entry);
    }

    if let Some(palette) = colors.as_deref() {
        for (index, entry) in list.iter_mut().enumerate() {
            if let Some(color) = palette_color(palette, index) {
                entry.color = color.to_string();
            }
        }
    }

    list
}

/// Runs [`reconcile`] off the async threads; answers exactly once.
pub fn spawn_reconcile(request: ReconcileRequest) -> oneshot::Receiver<Vec<UnitListEntry>> {
    spawn_oneshot("reconcile", move || reconcile(request))
}

/// JSON entry point of the reconciler worker.
pub fn spawn_reconcile_json(raw: &str) -> Option<oneshot::Receiver<Vec<UnitListEntry>>> {
    decode_message::<ReconcileRequest>("reconcile", raw).map(spawn_reconcile)
}

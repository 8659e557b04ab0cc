use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

use crate::{
    unit::LevelMap,
    worker::{decode_message, spawn_oneshot},
};

/// Inbound message for the level merger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Dataset ids in merge order; later ids win on collisions.
    pub reference_layers: Vec<String>,
    pub dataset_geometries: BTreeMap<String, LevelMap>,
}

/// Consolidates every requested dataset into one level map.
/// Datasets without geometries are skipped. When the same code appears at the
/// same level in two datasets, the later dataset's unit is kept.
pub fn merge_levels(request: &MergeRequest) -> LevelMap {
    let mut merged = LevelMap::new();
    for dataset in &request.reference_layers {
        let Some(levels) = request.dataset_geometries.get(dataset) else {
            debug!(dataset = %dataset, "no geometries for dataset");
            continue;
        };
        for (level, units) in levels {
            let target = merged.entry(*level).or_default();
            for (code, unit) in units {
                target.insert(code.clone(), unit.clone());
            }
        }
    }
    merged
}

/// Runs [`merge_levels`] off the async threads; answers exactly once.
pub fn spawn_merge(request: MergeRequest) -> oneshot::Receiver<LevelMap> {
    spawn_oneshot("merge", move || merge_levels(&request))
}

/// JSON entry point of the merger worker.
pub fn spawn_merge_json(raw: &str) -> Option<oneshot::Receiver<LevelMap>> {
    decode_message::<MergeRequest>("merge", raw).map(spawn_merge)
}

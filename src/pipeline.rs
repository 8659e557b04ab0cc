use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    config::PipelineConfig,
    fetch::{FetchMessage, FetchRequest, FetchWorker, LevelDescriptor},
    merge::{spawn_merge, MergeRequest},
    reconcile::{spawn_reconcile, ReconcileRequest},
    source::FeatureSource,
    state::{DashboardState, DatasetAction, GeometryAction, UnitListAction},
    unit::UnitMap,
};

/// Levels to fetch for one reference dataset.
#[derive(Debug, Clone)]
pub struct DatasetRequest {
    pub dataset: String,
    pub centroids: Vec<LevelDescriptor>,
}

/// Runs the fetch, merge and reconcile workers for a set of datasets and folds
/// their output into dashboard state.
pub struct Pipeline {
    fetcher: FetchWorker,
    config: Arc<PipelineConfig>,
    palette: Option<Vec<String>>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn FeatureSource>, config: PipelineConfig) -> Self {
        let config = Arc::new(config);
        Self { fetcher: FetchWorker::new(source, config.clone()), config, palette: None }
    }

    pub fn with_palette(mut self, colors: Vec<String>) -> Self {
        self.palette = Some(colors);
        self
    }

    /// One fetch run per dataset, all in flight at once. Merging waits for
    /// every run to finish; dataset order sets merge precedence.
    pub async fn load(&self, state: DashboardState, datasets: Vec<DatasetRequest>) -> Result<DashboardState> {
        let mut state = state;
        let layers: Vec<String> = datasets.iter().map(|d| d.dataset.clone()).collect();
        state.datasets = state.datasets.reduce(DatasetAction::SetReferenceLayers(layers.clone()));

        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));
        for dataset in datasets {
            let mut run = self.fetcher.post(FetchRequest {
                domain: self.config.domain.clone(),
                centroids: dataset.centroids,
                identifier: dataset.dataset.into(),
            });
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(message) = run.recv().await {
                    if tx.send(message).await.is_err() { break }
                }
            });
        }
        drop(tx);

        while let Some(message) = rx.recv().await {
            match message {
                FetchMessage::Progress { identifier, data } => {
                    let Some(dataset) = identifier.as_str() else { continue };
                    debug!(dataset, levels = data.len(), "progress");
                    state.datasets = state.datasets.reduce(DatasetAction::Add { dataset: dataset.to_string(), data });
                }
                FetchMessage::Done => {}
            }
        }

        let merged = spawn_merge(MergeRequest {
            reference_layers: layers.clone(),
            dataset_geometries: state.datasets.by_dataset.clone(),
        }).await.context("merge worker stopped")?;
        state.geometries = state.geometries.reduce(GeometryAction::Replace(merged));

        let mut entries = state.units.entries.clone();
        for dataset in &layers {
            let Some(levels) = state.datasets.by_dataset.get(dataset) else { continue };
            let geometries_data: UnitMap = levels.values()
                .flat_map(|units| units.iter().map(|(code, unit)| (code.clone(), unit.clone())))
                .collect();
            entries = spawn_reconcile(ReconcileRequest {
                identifier: dataset.as_str().into(),
                geometries_data,
                unit_list: entries,
                color: None,
                colors: self.palette.clone(),
            }).await.context("reconcile worker stopped")?;
        }
        state.units = state.units.reduce(UnitListAction::Replace(entries));

        info!(
            datasets = layers.len(),
            levels = state.geometries.levels.len(),
            units = state.units.entries.len(),
            "pipeline load complete"
        );
        Ok(state)
    }
}

use std::sync::Arc;

use anyhow::{bail, Result};
use geolevels::{
    fetch::{FetchMessage, FetchRequest, FetchWorker, LevelDescriptor},
    source::HttpSource,
    LevelMap, PipelineConfig,
};
use tracing::info;

use crate::cli::{Cli, FetchArgs};

pub async fn run(cli: &Cli, args: &FetchArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(domain) = &args.domain {
        config.domain = domain.clone();
    }

    let source = Arc::new(HttpSource::new(&config)?);
    let request = FetchRequest {
        domain: config.domain.clone(),
        centroids: args.levels.iter()
            .map(|(level, url)| LevelDescriptor { level: *level, url: url.clone() })
            .collect(),
        identifier: args.identifier.clone().into(),
    };
    let worker = FetchWorker::new(source, Arc::new(config));

    let mut rx = worker.post(request);
    let mut latest = LevelMap::new();
    let mut done = false;
    while let Some(message) = rx.recv().await {
        match message {
            FetchMessage::Progress { data, .. } => {
                if cli.verbose > 0 {
                    eprintln!("[fetch] {} levels, {} units", data.len(), data.values().map(|u| u.len()).sum::<usize>());
                }
                latest = data;
            }
            FetchMessage::Done => done = true,
        }
    }
    if !done {
        bail!("fetch run for {} ended without completing", args.identifier);
    }

    info!(identifier = %args.identifier, levels = latest.len(), "writing level map");
    super::write_json(args.output.as_deref(), &latest)
}

use anyhow::{Context, Result};
use geolevels::{spawn_merge, LevelMap, MergeRequest};

use crate::cli::{Cli, MergeArgs};

pub async fn run(cli: &Cli, args: &MergeArgs) -> Result<()> {
    let mut request = MergeRequest::default();
    for (index, path) in args.inputs.iter().enumerate() {
        // Position-tagged so the same file listed twice keeps both slots.
        let dataset = format!("{index}:{}", path.display());
        let levels: LevelMap = super::read_json(path)?;
        if cli.verbose > 0 {
            eprintln!("[merge] {} -> {} levels", path.display(), levels.len());
        }
        request.reference_layers.push(dataset.clone());
        request.dataset_geometries.insert(dataset, levels);
    }

    let merged = spawn_merge(request).await.context("merge worker stopped")?;
    super::write_json(args.output.as_deref(), &merged)
}

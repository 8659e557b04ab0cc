use anyhow::Result;
use geolevels::{
    cache::{SeriesRow, VersionedCache},
    CacheConfig,
};

use crate::cli::{CacheCommand, CacheTarget, Cli};

fn open(target: &CacheTarget) -> VersionedCache<geolevels::cache::DiskStorage> {
    VersionedCache::from_config(&CacheConfig {
        key: target.key.clone(),
        version: target.version.clone(),
        dir: target.dir.clone(),
    })
}

pub fn run(cli: &Cli, command: &CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Show(target) => {
            let cache = open(target);
            match cache.get() {
                Some(rows) => super::write_json(None, &rows)?,
                None => {
                    if cli.verbose > 0 {
                        eprintln!("[cache] {} has no rows for version {}", target.key, target.version);
                    }
                }
            }
        }
        CacheCommand::Append { target, rows } => {
            let rows: Vec<SeriesRow> = super::read_json(rows)?;
            let stored = open(target).append_data(rows)?;
            println!("{} rows stored in {}", stored, target.key);
        }
        CacheCommand::Replace { target, rows } => {
            let rows: Vec<SeriesRow> = super::read_json(rows)?;
            let count = rows.len();
            open(target).replace_data(rows)?;
            println!("{} rows stored in {}", count, target.key);
        }
        CacheCommand::Clear(target) => {
            open(target).clear()?;
            println!("Cleared {}", target.key);
        }
    }
    Ok(())
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Geometry level pipeline CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "geolevels", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and normalize the levels of one dataset
    Fetch(FetchArgs),

    /// Merge per-dataset level maps, later files winning
    Merge(MergeArgs),

    /// Inspect or update a versioned series cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Level to fetch as LEVEL=URL, in processing order (repeatable)
    #[arg(short, long = "level", value_parser = parse_level, required = true)]
    pub levels: Vec<(u32, String)>,

    /// Prefix for relative level URLs
    #[arg(long)]
    pub domain: Option<String>,

    /// Dataset identifier echoed in progress output
    #[arg(long, default_value = "dataset")]
    pub identifier: String,

    /// Pipeline config (JSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output level map (JSON); stdout if omitted
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Level map files (JSON), lowest precedence first
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Output level map (JSON); stdout if omitted
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CacheTarget {
    /// Cache directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Cache key
    #[arg(long)]
    pub key: String,

    /// Expected version tag
    #[arg(long)]
    pub version: String,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the cached rows (nothing on a version mismatch)
    Show(CacheTarget),

    /// Merge rows from a JSON array file into the cache
    Append {
        #[command(flatten)]
        target: CacheTarget,
        #[arg(value_hint = ValueHint::FilePath)]
        rows: PathBuf,
    },

    /// Overwrite the cache with rows from a JSON array file
    Replace {
        #[command(flatten)]
        target: CacheTarget,
        #[arg(value_hint = ValueHint::FilePath)]
        rows: PathBuf,
    },

    /// Remove the cache entries
    Clear(CacheTarget),
}

fn parse_level(s: &str) -> Result<(u32, String), String> {
    let (level, url) = s.split_once('=')
        .ok_or_else(|| format!("expected LEVEL=URL, got {s:?}"))?;
    let level = level.trim().parse()
        .map_err(|_| format!("invalid level {level:?}"))?;
    Ok((level, url.trim().to_string()))
}

#![doc = "Hierarchical geometry aggregation pipeline with a versioned local cache"]
pub mod cache;
mod config;
mod error;
pub mod fetch;
mod merge;
mod pipeline;
pub mod reconcile;
pub mod source;
mod state;
mod unit;
mod worker;

#[doc(inline)]
pub use config::{CacheConfig, PipelineConfig, PropertyNames, GEOMETRY_CODE};

#[doc(inline)]
pub use error::{CacheError, FetchError};

#[doc(inline)]
pub use merge::{merge_levels, spawn_merge, spawn_merge_json, MergeRequest};

#[doc(inline)]
pub use pipeline::{DatasetRequest, Pipeline};

#[doc(inline)]
pub use state::{
    DashboardState, DatasetAction, DatasetGeometries, Geometries, GeometryAction, UnitList,
    UnitListAction,
};

#[doc(inline)]
pub use unit::{GeographicUnit, Level, LevelMap, UnitListEntry, UnitMap, UnitRef};

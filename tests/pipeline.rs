use geolevels::{
    fetch::LevelDescriptor,
    source::MemSource,
    DashboardState, DatasetAction, DatasetRequest, Pipeline, PipelineConfig, UnitListAction,
    UnitListEntry,
};
use serde_json::json;

fn source() -> MemSource {
    MemSource::new()
        .with_json("http://x/a/l0", &json!({
            "features": [
                { "properties": { "c": "X", "n": "Somalia (A)", "u": "SOM_V1" } },
                { "properties": { "c": "Y", "n": "Kenya", "u": "KEN_V1" } },
            ],
        }))
        .with_json("http://x/b/l0", &json!({
            "features": [
                { "properties": { "c": "X", "n": "Somalia (B)", "u": "SOM_V2" } },
            ],
        }))
        .with_json("http://x/b/l1", &json!({
            "features": [
                { "properties": { "c": "Z", "n": "Banadir", "u": "SOM_0001_V2", "p": ["SOM_V2"] } },
            ],
        }))
}

fn datasets() -> Vec<DatasetRequest> {
    vec![
        DatasetRequest {
            dataset: "A".into(),
            centroids: vec![LevelDescriptor { level: 0, url: "/a/l0".into() }],
        },
        DatasetRequest {
            dataset: "B".into(),
            centroids: vec![
                LevelDescriptor { level: 0, url: "/b/l0".into() },
                LevelDescriptor { level: 1, url: "/b/l1".into() },
            ],
        },
    ]
}

#[tokio::test]
async fn load_merges_datasets_in_order() {
    let pipeline = Pipeline::new(source().into_shared(), PipelineConfig::new("http://x"));
    let state = pipeline.load(DashboardState::default(), datasets()).await.unwrap();

    assert_eq!(state.datasets.by_dataset.len(), 2);
    assert_eq!(state.geometries.levels[&0]["X"].name, "Somalia (B)");
    assert_eq!(state.geometries.levels[&0]["Y"].name, "Kenya");
    assert_eq!(state.geometries.levels[&1]["Z"].parents[0].code, "X");

    let ids: Vec<_> = state.units.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["X", "Y", "Z"]);
    assert_eq!(state.units.entries[0].reference_layer_uuid, "A");
    assert_eq!(state.units.entries[2].reference_layer_uuid, "B");
}

#[tokio::test]
async fn reload_keeps_existing_list_entries() {
    let pipeline = Pipeline::new(source().into_shared(), PipelineConfig::new("http://x"));
    let existing = UnitListEntry {
        id: "SOM_V1".into(),
        name: "Somalia".into(),
        color: "#111111".into(),
        reference_layer_uuid: "A".into(),
    };
    let mut state = DashboardState::default();
    state.units = state.units.reduce(UnitListAction::Replace(vec![existing.clone()]));

    let state = pipeline.load(state, datasets()).await.unwrap();
    assert_eq!(state.units.entries[0], existing);
    assert!(state.units.entries.iter().all(|e| e.id != "X" || e.reference_layer_uuid == "B"));
}

#[tokio::test]
async fn palette_colors_every_entry() {
    let pipeline = Pipeline::new(source().into_shared(), PipelineConfig::new("http://x"))
        .with_palette(vec!["#000000".into(), "#FFFFFF".into()]);
    let state = pipeline.load(DashboardState::default(), datasets()).await.unwrap();
    let colors: Vec<_> = state.units.entries.iter().map(|e| e.color.as_str()).collect();
    assert_eq!(colors, ["#000000", "#FFFFFF", "#000000"]);
}

#[tokio::test]
async fn switching_datasets_drops_stale_geometries() {
    let pipeline = Pipeline::new(source().into_shared(), PipelineConfig::new("http://x"));
    let state = pipeline.load(DashboardState::default(), datasets()).await.unwrap();

    let state = pipeline.load(state, datasets().split_off(1)).await.unwrap();
    assert_eq!(state.datasets.by_dataset.keys().collect::<Vec<_>>(), ["B"]);
    assert!(!state.geometries.levels[&0].contains_key("Y"));

    let cleared = state.datasets.reduce(DatasetAction::DeleteAll);
    assert!(cleared.by_dataset.is_empty());
}

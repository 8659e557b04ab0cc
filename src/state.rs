//! Reducers holding pipeline output for the lifetime of a dashboard view.
//!
//! Every reducer is a pure transition `state + action -> state`.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::unit::{GeographicUnit, Level, LevelMap, UnitListEntry};

/// Per-dataset geometries as they stream in from fetch runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetGeometries {
    /// Datasets whose progress is accepted.
    pub active: BTreeSet<String>,
    pub by_dataset: BTreeMap<String, LevelMap>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetAction {
    /// Switch to a new set of datasets; geometries of the others are dropped.
    SetReferenceLayers(Vec<String>),
    /// Progress from a fetch run tagged with `dataset`.
    Add { dataset: String, data: LevelMap },
    DeleteAll,
}

impl DatasetGeometries {
    /// Levels already held for a dataset are never overwritten; progress from
    /// inactive datasets is ignored as stale.
    pub fn reduce(mut self, action: DatasetAction) -> Self {
        match action {
            DatasetAction::SetReferenceLayers(layers) => {
                self.active = layers.into_iter().collect();
                let active = &self.active;
                self.by_dataset.retain(|dataset, _| active.contains(dataset));
            }
            DatasetAction::Add { dataset, data } => {
                if !self.active.contains(&dataset) {
                    debug!(dataset = %dataset, "ignoring progress from inactive dataset");
                    return self;
                }
                let levels = self.by_dataset.entry(dataset).or_default();
                for (level, units) in data {
                    levels.entry(level).or_insert(units);
                }
            }
            DatasetAction::DeleteAll => {
                self.by_dataset.clear();
            }
        }
        self
    }
}

/// Geometries consolidated across all active datasets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometries {
    pub levels: LevelMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryAction {
    Replace(LevelMap),
    DeleteAll,
}

impl Geometries {
    pub fn reduce(mut self, action: GeometryAction) -> Self {
        match action {
            GeometryAction::Replace(levels) => self.levels = levels,
            GeometryAction::DeleteAll => self.levels.clear(),
        }
        self
    }

    /// Units at `level`, in code order.
    pub fn units_at(&self, level: Level) -> impl Iterator<Item = &GeographicUnit> {
        self.levels.get(&level).into_iter().flat_map(|units| units.values())
    }

    /// Every unit whose member chain contains `code`: the unit itself and
    /// all descendants seen so far.
    pub fn members_of<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a GeographicUnit> + 'a {
        self.levels.values()
            .flat_map(|units| units.values())
            .filter(move |unit| unit.has_member(code))
    }
}

/// Flat, colored unit list for legends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitList {
    pub entries: Vec<UnitListEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitListAction {
    Replace(Vec<UnitListEntry>),
    DeleteAll,
}

impl UnitList {
    pub fn reduce(mut self, action: UnitListAction) -> Self {
        match action {
            UnitListAction::Replace(entries) => self.entries = entries,
            UnitListAction::DeleteAll => self.entries.clear(),
        }
        self
    }
}

/// All reducer state owned by one dashboard view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub datasets: DatasetGeometries,
    pub geometries: Geometries,
    pub units: UnitList,
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::unit::UnitRef;

    fn unit(code: &str, name: &str, parents: &[&str]) -> GeographicUnit {
        let parents: Vec<UnitRef> = parents.iter()
            .map(|p| UnitRef { name: p.to_string(), ucode: p.to_string(), code: p.to_string() })
            .collect();
        let mut members = parents.clone();
        members.push(UnitRef { name: name.into(), ucode: code.into(), code: code.into() });
        GeographicUnit {
            code: code.into(),
            name: name.into(),
            ucode: code.into(),
            concept_uuid: code.into(),
            geometry: Value::Null,
            parents,
            members,
        }
    }

    fn levels(entries: &[(Level, &str, &str)]) -> LevelMap {
        let mut map = LevelMap::new();
        for (level, code, name) in entries {
            map.entry(*level).or_default().insert(code.to_string(), unit(code, name, &[]));
        }
        map
    }

    #[test]
    fn first_writer_wins_per_level() {
        let state = DatasetGeometries::default()
            .reduce(DatasetAction::SetReferenceLayers(vec!["d1".into()]))
            .reduce(DatasetAction::Add { dataset: "d1".into(), data: levels(&[(0, "X", "first")]) })
            .reduce(DatasetAction::Add {
                dataset: "d1".into(),
                data: levels(&[(0, "X", "second"), (1, "Y", "child")]),
            });
        let d1 = &state.by_dataset["d1"];
        assert_eq!(d1[&0]["X"].name, "first");
        assert_eq!(d1[&1]["Y"].name, "child");
    }

    #[test]
    fn inactive_dataset_progress_is_ignored() {
        let state = DatasetGeometries::default()
            .reduce(DatasetAction::SetReferenceLayers(vec!["d1".into()]))
            .reduce(DatasetAction::Add { dataset: "old".into(), data: levels(&[(0, "X", "stale")]) });
        assert!(state.by_dataset.is_empty());
    }

    #[test]
    fn switching_datasets_drops_others() {
        let state = DatasetGeometries::default()
            .reduce(DatasetAction::SetReferenceLayers(vec!["d1".into(), "d2".into()]))
            .reduce(DatasetAction::Add { dataset: "d1".into(), data: levels(&[(0, "X", "a")]) })
            .reduce(DatasetAction::Add { dataset: "d2".into(), data: levels(&[(0, "Y", "b")]) })
            .reduce(DatasetAction::SetReferenceLayers(vec!["d2".into()]));
        assert_eq!(state.by_dataset.keys().collect::<Vec<_>>(), ["d2"]);

        let cleared = state.reduce(DatasetAction::DeleteAll);
        assert!(cleared.by_dataset.is_empty());
        assert!(cleared.active.contains("d2"));
    }

    #[test]
    fn geometries_replace_and_query() {
        let mut map = LevelMap::new();
        map.entry(0).or_default().insert("SOM".into(), unit("SOM", "Somalia", &[]));
        map.entry(1).or_default().insert("BAN".into(), unit("BAN", "Banadir", &["SOM"]));
        map.entry(1).or_default().insert("KEN1".into(), unit("KEN1", "Nairobi", &["KEN"]));

        let state = Geometries::default().reduce(GeometryAction::Replace(map));
        assert_eq!(state.units_at(1).count(), 2);
        assert_eq!(state.units_at(7).count(), 0);

        let codes: Vec<_> = state.members_of("SOM").map(|u| u.code.as_str()).collect();
        assert_eq!(codes, ["SOM", "BAN"]);

        assert!(state.reduce(GeometryAction::DeleteAll).levels.is_empty());
    }

    #[test]
    fn unit_list_replace_and_clear() {
        let entry = UnitListEntry {
            id: "u1".into(),
            name: "Old".into(),
            color: "#111111".into(),
            reference_layer_uuid: "d1".into(),
        };
        let list = UnitList::default().reduce(UnitListAction::Replace(vec![entry.clone()]));
        assert_eq!(list.entries, vec![entry]);
        assert!(list.reduce(UnitListAction::DeleteAll).entries.is_empty());
    }
}

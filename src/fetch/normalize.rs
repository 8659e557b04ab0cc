use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    config::PipelineConfig,
    unit::{GeographicUnit, Level, LevelMap, UnitRef},
};

/// GeoJSON-like body returned for one level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Value,
}

impl Feature {
    /// Non-empty string (or number) property.
    fn text(&self, key: &str) -> Option<String> {
        match self.properties.as_ref()?.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn text_list(&self, key: &str) -> Vec<String> {
        match self.properties.as_ref().and_then(|props| props.get(key)) {
            Some(Value::Array(items)) => items.iter()
                .filter_map(|item| item.as_str())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Accumulates normalized levels for one fetch run.
/// The ucode lookup only knows units from levels already added, so parents
/// resolve only when coarser levels come first.
pub struct Normalizer<'a> {
    config: &'a PipelineConfig,
    lookup: HashMap<String, UnitRef>,
    levels: LevelMap,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config, lookup: HashMap::new(), levels: LevelMap::new() }
    }

    /// Everything normalized so far in this run.
    pub fn levels(&self) -> &LevelMap { &self.levels }

    /// Concept uuid if present, otherwise the configured fallback property.
    pub fn resolve_code(&self, feature: &Feature) -> Option<String> {
        feature.text(&self.config.properties.concept_uuid)
            .or_else(|| feature.text(self.config.fallback_code_property()))
    }

    /// Maps declared parent ucodes through the lookup, dropping unknown ones.
    pub fn resolve_parents(&self, feature: &Feature) -> Vec<UnitRef> {
        feature.text_list(&self.config.properties.parents).iter()
            .filter_map(|ucode| self.lookup.get(ucode).cloned())
            .collect()
    }

    /// Builds the unit for `feature`, or `None` when it has no usable code.
    pub fn normalize(&self, feature: &Feature) -> Option<GeographicUnit> {
        let props = &self.config.properties;
        let code = self.resolve_code(feature)?;
        let parents = self.resolve_parents(feature);

        let mut unit = GeographicUnit {
            code,
            name: feature.text(&props.name).unwrap_or_default(),
            ucode: feature.text(&props.ucode).unwrap_or_default(),
            concept_uuid: feature.text(&props.concept_uuid).unwrap_or_default(),
            geometry: feature.geometry.clone(),
            members: parents.clone(),
            parents,
        };
        unit.members.push(unit.to_ref());
        Some(unit)
    }

    /// Normalizes a whole level and returns how many units it produced.
    pub fn add_level(&mut self, level: Level, collection: &FeatureCollection) -> usize {
        let mut added = 0;
        for feature in &collection.features {
            let Some(unit) = self.normalize(feature) else { continue };
            if !unit.ucode.is_empty() {
                self.lookup.insert(unit.ucode.clone(), unit.to_ref());
            }
            self.levels.entry(level).or_default().insert(unit.code.clone(), unit);
            added += 1;
        }
        added
    }
}

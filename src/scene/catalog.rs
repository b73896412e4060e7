use std::path::Path;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::CatalogError;
use crate::fixture::types::Color;

const BUILTIN_CATALOG: &str = include_str!("../../data/scenes.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    // full opacity, rgb only
    Solid,
    // rendered with a pulsing opacity, selecting one blocks the panel for a while
    Dim,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub name: String,
    pub kind: SceneKind,
    pub channel_values: Vec<u8>,
    pub style_hint: String,
}

impl Scene {
    /// Color of a preset swatch; a preset without a white value has white = 0.
    pub fn color(&self) -> Color {
        let value = |index: usize| self.channel_values.get(index).copied().unwrap_or(0);
        Color::rgbw(value(0), value(1), value(2), value(3))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    value: Vec<u8>,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    solid: Vec<CatalogEntry>,
    #[serde(default)]
    dim: Vec<CatalogEntry>,
    #[serde(default)]
    color: Vec<CatalogEntry>,
}

/// Read-only scene and preset data.
#[derive(Debug, Clone)]
pub struct SceneCatalog {
    scenes: IndexMap<String, Scene>,
    presets: IndexMap<String, Scene>,
}

fn into_scene(entry: CatalogEntry, kind: SceneKind) -> Result<Scene, CatalogError> {
    let count = entry.value.len();
    if !(3..=4).contains(&count) {
        return Err(CatalogError::ChannelCount { name: entry.name, count });
    }

    Ok(Scene {
        name: entry.name,
        kind,
        channel_values: entry.value,
        style_hint: entry.text,
    })
}

impl SceneCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::parse(BUILTIN_CATALOG)
    }

    pub async fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            None => Self::builtin(),
            Some(path) => {
                let content = tokio::fs::read_to_string(path).await?;
                Self::parse(&content)
            },
        }
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;

        // a later entry with the same name replaces an earlier one
        let mut scenes = IndexMap::new();
        for (entries, kind) in [(file.solid, SceneKind::Solid), (file.dim, SceneKind::Dim)] {
            for entry in entries {
                let scene = into_scene(entry, kind)?;
                scenes.insert(scene.name.clone(), scene);
            }
        }

        let mut presets = IndexMap::new();
        for entry in file.color {
            let preset = into_scene(entry, SceneKind::Solid)?;
            presets.insert(preset.name.clone(), preset);
        }

        Ok(SceneCatalog { scenes, presets })
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn preset(&self, name: &str) -> Option<&Scene> {
        self.presets.get(name)
    }

    pub fn presets(&self) -> impl Iterator<Item = &Scene> {
        self.presets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = SceneCatalog::builtin().unwrap();

        let warm = catalog.scene("Warm White").unwrap();
        assert_eq!(warm.kind, SceneKind::Solid);
        assert_eq!(warm.channel_values.len(), 3);

        assert_eq!(catalog.scene("Dim Red").unwrap().kind, SceneKind::Dim);
        assert_eq!(catalog.preset("White").unwrap().color(), Color::rgbw(0, 0, 0, 255));
        assert!(catalog.scene("White").is_none());
    }

    #[test]
    fn test_three_value_preset_has_no_white() {
        let catalog = SceneCatalog::parse(r#"{"color": [{"name": "Teal", "value": [0, 128, 128]}]}"#).unwrap();

        assert_eq!(catalog.preset("Teal").unwrap().color(), Color::rgbw(0, 128, 128, 0));
        assert_eq!(catalog.scenes().count(), 0);
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        let result = SceneCatalog::parse(r#"{"solid": [{"name": "Broken", "value": [1, 2]}]}"#);

        match result {
            Err(CatalogError::ChannelCount { name, count }) => {
                assert_eq!(name, "Broken");
                assert_eq!(count, 2);
            },
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let result = SceneCatalog::parse(r#"{"dim": [{"name": "Hot", "value": [300, 0, 0]}]}"#);
        assert!(matches!(result, Err(CatalogError::JsonError { .. })));
    }
}

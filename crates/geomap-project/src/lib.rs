use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use geomap_core::{
    CircleDescriptor, LatLng, LineDescriptor, MarkerDescriptor, PointRendering, PolygonDescriptor,
    RouteDescriptor,
};
use geomap_render::{HeatOptions, MapViewConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "geomap_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
    pub center: LatLng,
    pub zoom: f64,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            center: LatLng::new(0.0, 0.0),
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7020".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Named tile source for the map backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLayer {
    pub name: String,
    pub url_template: String,
    #[serde(default)]
    pub subdomains: Vec<String>,
    #[serde(default)]
    pub attribution: String,
}

impl BaseLayer {
    fn google(name: &str, url_template: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
            subdomains: ["mt0", "mt1", "mt2", "mt3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            attribution: String::new(),
        }
    }
}

pub fn default_base_layers() -> Vec<BaseLayer> {
    vec![
        BaseLayer::google(
            "Traffic",
            "https://{s}.google.com/vt/lyrs=m@221097413,traffic&x={x}&y={y}&z={z}&hl=en",
        ),
        BaseLayer::google(
            "Hybrid",
            "http://{s}.google.com/vt/lyrs=s,h&x={x}&y={y}&z={z}&hl=en",
        ),
        BaseLayer::google(
            "Streets",
            "http://{s}.google.com/vt/lyrs=m&x={x}&y={y}&z={z}&hl=en",
        ),
    ]
}

/// Entities drawn once when the map starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialScene {
    pub markers: Vec<MarkerDescriptor>,
    pub circles: Vec<CircleDescriptor>,
    pub polygons: Vec<PolygonDescriptor>,
    pub routes: Vec<RouteDescriptor>,
    pub lines: Vec<LineDescriptor>,
}

impl InitialScene {
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
            && self.circles.is_empty()
            && self.polygons.is_empty()
            && self.routes.is_empty()
            && self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub name: String,
    pub initial_view: InitialView,
    pub marker_fit_zoom: f64,
    pub layer_fit_zoom: f64,
    pub backend: BackendSettings,
    pub base_layers: Vec<BaseLayer>,
    pub default_base_layer: String,
    pub point_rendering: PointRendering,
    pub heat: HeatOptions,
    pub sequencing_guard: bool,
    pub scene: InitialScene,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            name: "Map".to_string(),
            initial_view: InitialView::default(),
            marker_fit_zoom: 8.0,
            layer_fit_zoom: 6.0,
            backend: BackendSettings::default(),
            base_layers: default_base_layers(),
            default_base_layer: "Streets".to_string(),
            point_rendering: PointRendering::default(),
            heat: HeatOptions::default(),
            sequencing_guard: true,
            scene: InitialScene::default(),
        }
    }
}

impl MapSettings {
    pub fn view_config(&self) -> MapViewConfig {
        MapViewConfig {
            entity_zoom: self.marker_fit_zoom,
            layer_zoom: self.layer_fit_zoom,
            point_rendering: self.point_rendering,
            sequencing_guard: self.sequencing_guard,
            heat: self.heat.clone(),
        }
    }

    pub fn base_layer(&self, name: &str) -> Option<&BaseLayer> {
        self.base_layers.iter().find(|layer| layer.name == name)
    }

    /// The configured default backdrop, falling back to the first one.
    pub fn selected_base_layer(&self) -> Option<&BaseLayer> {
        self.base_layer(&self.default_base_layer)
            .or_else(|| self.base_layers.first())
    }

    /// Make `name` the default backdrop. Base layers are mutually exclusive,
    /// so this replaces the previous selection.
    pub fn select_base_layer(&mut self, name: &str) -> Result<&BaseLayer> {
        let index = self
            .base_layers
            .iter()
            .position(|layer| layer.name == name)
            .ok_or_else(|| anyhow!("Unknown base layer: {}", name))?;
        self.default_base_layer = name.to_string();
        Ok(&self.base_layers[index])
    }
}

pub struct Project {
    pub settings: MapSettings,
    pub path: PathBuf,
}

impl Project {
    pub fn load(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: MapSettings = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        Ok(Self { settings, path })
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.settings)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        Ok(())
    }

    pub fn new(name: String, path: PathBuf) -> Self {
        Self {
            settings: MapSettings {
                name,
                ..MapSettings::default()
            },
            path,
        }
    }

    /// Loads the settings file if it exists, otherwise starts from defaults
    /// without writing anything.
    pub fn open(path: PathBuf) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let name = path
                .parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
                .unwrap_or("Map")
                .to_string();
            Ok(Self::new(name, path))
        }
    }
}

/// Per-user settings location, e.g. `~/.config/geomap/geomap_settings.json`.
pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "geomap").map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_lifecycle() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);

        let mut project = Project::new("City".to_string(), path.clone());
        project.settings.point_rendering = PointRendering::Heat;
        project.settings.sequencing_guard = false;
        project.settings.scene.lines.push(LineDescriptor::new("a", "b"));
        project.save()?;

        let loaded = Project::load(path)?;
        assert_eq!(loaded.settings.name, "City");
        assert_eq!(loaded.settings.point_rendering, PointRendering::Heat);
        assert!(!loaded.settings.sequencing_guard);
        assert_eq!(loaded.settings, project.settings);
        Ok(())
    }

    #[test]
    fn test_missing_fields_take_defaults() -> Result<()> {
        let settings: MapSettings = serde_json::from_str(
            r#"{"name": "Sparse", "backend": {"base_url": "http://maps.local:9000"}}"#,
        )?;
        assert_eq!(settings.name, "Sparse");
        assert_eq!(settings.backend.base_url, "http://maps.local:9000");
        assert_eq!(settings.backend.timeout_secs, 30);
        assert_eq!(settings.marker_fit_zoom, 8.0);
        assert_eq!(settings.layer_fit_zoom, 6.0);
        assert!(settings.sequencing_guard);
        assert_eq!(settings.base_layers.len(), 3);
        assert!(settings.scene.is_empty());

        let config = settings.view_config();
        assert_eq!(config.entity_zoom, 8.0);
        assert_eq!(config.point_rendering, PointRendering::Markers);
        Ok(())
    }

    #[test]
    fn test_open_without_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let project = Project::open(path.clone())?;
        assert_eq!(project.settings.initial_view.zoom, 1.0);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_load_reports_bad_json() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "{ not json")?;
        let err = Project::load(path).err().ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.to_string().contains("Invalid settings file"));
        Ok(())
    }

    #[test]
    fn test_base_layer_selection() -> Result<()> {
        let mut settings = MapSettings::default();
        assert_eq!(
            settings.selected_base_layer().map(|l| l.name.as_str()),
            Some("Streets")
        );
        settings.select_base_layer("Hybrid")?;
        assert_eq!(settings.default_base_layer, "Hybrid");
        assert_eq!(
            settings.base_layer("Traffic").map(|l| l.subdomains.len()),
            Some(4)
        );
        assert!(settings.select_base_layer("Satellite").is_err());
        assert_eq!(settings.default_base_layer, "Hybrid");
        Ok(())
    }
}

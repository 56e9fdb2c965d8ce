use crate::{DataSource, SourceError, validate_features};
use async_trait::async_trait;
use geomap_core::{GeoFeature, LayerFeature, LayerInfo, ProjectInfo};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// In-process backend for demos and tests. Layers listed in `failing`
/// answer with a 500.
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    projects: Vec<ProjectInfo>,
    layers: HashMap<String, Vec<LayerInfo>>,
    data: HashMap<String, Vec<GeoFeature>>,
    failing: Mutex<HashSet<String>>,
    fetches: Mutex<Vec<String>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: ProjectInfo, layers: Vec<LayerInfo>) -> Self {
        self.layers.insert(project.id.clone(), layers);
        self.projects.push(project);
        self
    }

    pub fn with_layer_data(mut self, layer_id: impl Into<String>, features: Vec<GeoFeature>) -> Self {
        self.data.insert(layer_id.into(), features);
        self
    }

    pub fn set_failing(&self, layer_id: &str, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(layer_id.to_string());
        } else {
            set.remove(layer_id);
        }
    }

    /// Layer ids fetched so far, in call order.
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn list_projects(&self) -> Result<Vec<ProjectInfo>, SourceError> {
        Ok(self.projects.clone())
    }

    async fn list_layers(&self, project_id: &str) -> Result<Vec<LayerInfo>, SourceError> {
        self.layers
            .get(project_id)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                status: 404,
                url: format!("memory:///layers/{}", project_id),
            })
    }

    async fn fetch_layer_data(&self, layer_id: &str) -> Result<Vec<LayerFeature>, SourceError> {
        self.fetches.lock().push(layer_id.to_string());
        let url = format!("memory:///layer/data/{}", layer_id);
        if self.failing.lock().contains(layer_id) {
            return Err(SourceError::Status { status: 500, url });
        }
        let features = self
            .data
            .get(layer_id)
            .cloned()
            .ok_or(SourceError::Status { status: 404, url })?;
        Ok(validate_features(layer_id, features))
    }
}

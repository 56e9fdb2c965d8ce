//! Data Source collaborator: projects, their layers and per-layer geodata.
//!
//! Payloads are validated here, at the boundary, so nothing downstream ever
//! sees an untyped feature.

mod error;
pub mod http;
pub mod memory;

pub use error::SourceError;
pub use http::HttpDataSource;
pub use memory::MemoryDataSource;

use async_trait::async_trait;
use geomap_core::{GeoFeature, LayerFeature, LayerInfo, LayerPayload, ProjectInfo};

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectInfo>, SourceError>;

    async fn list_layers(&self, project_id: &str) -> Result<Vec<LayerInfo>, SourceError>;

    /// Validated features for one layer. Every call goes to the backend.
    async fn fetch_layer_data(&self, layer_id: &str) -> Result<Vec<LayerFeature>, SourceError>;
}

/// Convert raw features, dropping the ones with unusable geometry.
pub fn validate_features(layer_id: &str, features: Vec<GeoFeature>) -> Vec<LayerFeature> {
    let total = features.len();
    let valid: Vec<LayerFeature> = features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| match feature.into_layer_feature() {
            Ok(feature) => Some(feature),
            Err(err) => {
                tracing::warn!("Layer {}: dropping feature {}: {}", layer_id, index, err);
                None
            }
        })
        .collect();
    if valid.len() < total {
        tracing::info!(
            "Layer {}: kept {} of {} features",
            layer_id,
            valid.len(),
            total
        );
    }
    valid
}

/// Parse a layer data body (feature array or `FeatureCollection`).
pub fn parse_layer_payload(
    layer_id: &str,
    url: &str,
    body: &str,
) -> Result<Vec<LayerFeature>, SourceError> {
    let payload: LayerPayload =
        serde_json::from_str(body).map_err(|source| SourceError::InvalidPayload {
            url: url.to_string(),
            source,
        })?;
    Ok(validate_features(layer_id, payload.into_features()))
}

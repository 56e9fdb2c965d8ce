use crate::{DataSource, SourceError, parse_layer_payload};
use async_trait::async_trait;
use geomap_core::{LayerFeature, LayerInfo, ProjectInfo};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:7020";

/// REST backend exposing `/projects`, `/layers/{projectId}` and
/// `/layer/data/{layerId}`.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    http: Client,
    base: Url,
}

impl HttpDataSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let mut base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SourceError::Transport {
                url: base.to_string(),
                source,
            })?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL. Each segment is
    /// percent-encoded, so ids cannot climb out of their endpoint.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, SourceError> {
        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| SourceError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|source| SourceError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, SourceError> {
        let url = self.endpoint(segments)?;
        let body = self.get_text(url.clone()).await?;
        serde_json::from_str(&body).map_err(|source| SourceError::InvalidPayload {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn list_projects(&self) -> Result<Vec<ProjectInfo>, SourceError> {
        self.get_json(&["projects"]).await
    }

    async fn list_layers(&self, project_id: &str) -> Result<Vec<LayerInfo>, SourceError> {
        self.get_json(&["layers", project_id]).await
    }

    async fn fetch_layer_data(&self, layer_id: &str) -> Result<Vec<LayerFeature>, SourceError> {
        let url = self.endpoint(&["layer", "data", layer_id])?;
        let body = self.get_text(url.clone()).await?;
        parse_layer_payload(layer_id, url.as_str(), &body)
    }
}

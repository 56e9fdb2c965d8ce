use geomap_render::RenderError;
use geomap_source::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Data fetch failed: {0}")]
    Source(#[from] SourceError),
    #[error("No project selected. Call select_project first.")]
    NoProjectSelected,
    #[error("Layer {0} is not part of the selected project")]
    UnknownLayer(String),
}

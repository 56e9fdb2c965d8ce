use thiserror::Error;

/// Rejection of a descriptor or feature before it reaches the map.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("Entity id must not be empty")]
    EmptyId,
    #[error("Coordinate out of range: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("GeoJSON position needs at least 2 components, found {0}")]
    MalformedPosition(usize),
    #[error("{kind} needs at least {required} vertices, found {found}")]
    TooFewVertices {
        kind: &'static str,
        required: usize,
        found: usize,
    },
    #[error("Feature has no geometry")]
    MissingGeometry,
    #[error("Unsupported geometry type")]
    UnsupportedGeometry,
    #[error("Circle radius must be positive, got {0}")]
    InvalidRadius(f64),
}

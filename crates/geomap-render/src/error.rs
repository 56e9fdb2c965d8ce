use geomap_core::{DescriptorError, EntityId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Entity {0} is already on the map")]
    DuplicateId(EntityId),
    #[error("Entity {0} is not on the map")]
    NotFound(EntityId),
    #[error("Cannot compute a focal point for an empty batch")]
    EmptyBatch,
    #[error("Invalid descriptor for entity {id}: {source}")]
    InvalidDescriptor {
        id: EntityId,
        #[source]
        source: DescriptorError,
    },
}

pub mod canvas;
mod error;
pub mod factory;
pub mod layer_group;
pub mod map_view;
pub mod primitive;
pub mod registry;
pub mod relations;
pub mod style;
pub mod view_fit;
pub mod visibility;

pub use canvas::{
    CanvasEvent, MapCanvas, PlacedPrimitive, PrimitiveHandle, RecordingCanvas, ViewTransition,
    Viewport, ViewportRequest,
};
pub use error::RenderError;
pub use factory::{GeoPrimitiveFactory, property_table};
pub use layer_group::{LayerGroupManager, RefreshTicket, ReplaceOutcome};
pub use map_view::{MapView, MapViewConfig};
pub use primitive::Primitive;
pub use registry::{EntityRegistry, ViewEntity, VisualState};
pub use relations::RelationshipResolver;
pub use style::{HeatOptions, PathStyle};
pub use view_fit::{Bounds, FitStrategy, ViewFitController, focal_point};
pub use visibility::{FilterSummary, apply_visible};

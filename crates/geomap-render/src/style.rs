//! Map Style Defaults
//!
//! Path styles, icon sizes and heat options for every primitive the factory
//! builds. Colors are CSS color strings because feature properties carry them
//! verbatim.

use geomap_core::{CircleStyle, EntityId, IconSize};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

pub const EDGE_COLOR: &str = "#3388ff";
pub const DEFAULT_FILL_COLOR: &str = "blue";
pub const POLYGON_OUTLINE_COLOR: &str = "white";
pub const DEFAULT_PIN_ICON_URL: &str = "https://freesvg.org/img/ts-map-pin.png";
pub const LABEL_EXTRA_CLASS: &str = "transparent-marker-tooltip";

/// Icon size for entity markers that specify an icon without a size.
pub const ENTITY_ICON_SIZE: IconSize = IconSize {
    width: 30,
    height: 30,
};

/// Icon size for markers built from bulk point features.
pub const FEATURE_ICON_SIZE: IconSize = IconSize {
    width: 25,
    height: 25,
};

/// Circle marker radius in pixels.
pub const CIRCLE_MARKER_RADIUS: f64 = 4.0;

/// Pixel offset of a marker's permanent label below the pin.
pub const LABEL_OFFSET: (i32, i32) = (0, 15);

/// Property values are cut to this many characters in popup tables.
pub const POPUP_VALUE_MAX_CHARS: usize = 15;

pub const VISIBLE_OPACITY: f32 = 1.0;
pub const DIMMED_OPACITY: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// Stroke and fill options shared by vector primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub stroke: bool,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill: bool,
    pub fill_color: Option<String>,
    pub fill_opacity: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// Class attached to the rendered element, used to address it as a DOM
    /// neighbour of an entity.
    pub class_name: Option<String>,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke: true,
            color: EDGE_COLOR.to_string(),
            weight: 3.0,
            opacity: 1.0,
            fill: false,
            fill_color: None,
            fill_opacity: 0.2,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            class_name: None,
        }
    }
}

impl PathStyle {
    /// Line between two entities, tagged with the source entity's edge class.
    pub fn edge(source: &EntityId) -> Self {
        Self {
            line_cap: LineCap::Square,
            line_join: LineJoin::Bevel,
            class_name: Some(source.edge_class()),
            ..Self::default()
        }
    }

    /// Polygon from a bulk layer; fill color comes from feature properties.
    pub fn feature_polygon(fill_color: Option<&str>) -> Self {
        Self {
            color: POLYGON_OUTLINE_COLOR.to_string(),
            weight: 1.0,
            opacity: 1.0,
            fill: true,
            fill_color: Some(fill_color.unwrap_or(DEFAULT_FILL_COLOR).to_string()),
            fill_opacity: 0.8,
            ..Self::default()
        }
    }

    pub fn feature_circle_marker(color: Option<&str>) -> Self {
        let color = color.unwrap_or(EDGE_COLOR).to_string();
        Self {
            stroke: false,
            color: color.clone(),
            weight: 1.0,
            opacity: 1.0,
            fill: true,
            fill_color: Some(color),
            fill_opacity: 1.0,
            ..Self::default()
        }
    }

    pub fn entity_circle(style: &CircleStyle) -> Self {
        Self {
            color: style.color.clone(),
            fill: true,
            fill_color: Some(style.fill_color.clone()),
            fill_opacity: style.fill_opacity,
            ..Self::default()
        }
    }

    pub fn entity_polygon() -> Self {
        Self {
            fill: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatOptions {
    pub radius: f64,
    pub blur: f64,
    pub max_zoom: u8,
    /// Stops from 0.0 to 1.0 with their CSS color.
    pub gradient: Vec<(f64, String)>,
}

impl Default for HeatOptions {
    fn default() -> Self {
        Self {
            radius: 15.0,
            blur: 20.0,
            max_zoom: 10,
            gradient: vec![
                (0.4, "blue".to_string()),
                (0.6, "green".to_string()),
                (0.8, "yellow".to_string()),
                (1.0, "red".to_string()),
            ],
        }
    }
}

pub fn opacity_for(dimmed: bool) -> f32 {
    if dimmed { DIMMED_OPACITY } else { VISIBLE_OPACITY }
}

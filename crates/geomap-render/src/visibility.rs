//! Visibility/Filter Engine
//!
//! Dims registered entities that fall outside a visible set. Dimming is
//! binary and never changes registry membership.

use crate::canvas::MapCanvas;
use crate::registry::EntityRegistry;
use crate::style::opacity_for;
use geomap_core::EntityId;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub visible: usize,
    pub dimmed: usize,
}

/// Dim every registered entity whose id is not in `visible_ids`, along with
/// the edges drawn from it and its label. Ids that are not registered are
/// ignored.
pub fn apply_visible<C: MapCanvas + ?Sized>(
    registry: &mut EntityRegistry,
    canvas: &mut C,
    visible_ids: &HashSet<EntityId>,
) -> FilterSummary {
    let mut summary = FilterSummary::default();
    for entity in registry.iter_mut() {
        let dimmed = !visible_ids.contains(&entity.id);
        let opacity = opacity_for(dimmed);
        entity.visual_state.dimmed = dimmed;

        canvas.set_opacity(entity.handle(), opacity);
        canvas.set_class_opacity(&entity.id.edge_class(), opacity);
        canvas.set_class_opacity(&entity.id.label_class(), opacity);

        if dimmed {
            summary.dimmed += 1;
        } else {
            summary.visible += 1;
        }
    }
    tracing::debug!(
        "Applied filter: {} visible, {} dimmed",
        summary.visible,
        summary.dimmed
    );
    summary
}

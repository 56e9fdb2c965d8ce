//! Relationship Resolver
//!
//! Edges are resolved by looking their endpoints up in the registry at draw
//! time. They are best-effort: a missing endpoint means nothing is drawn.

use crate::canvas::{MapCanvas, PrimitiveHandle};
use crate::factory::GeoPrimitiveFactory;
use crate::registry::EntityRegistry;
use crate::style::opacity_for;
use geomap_core::LineDescriptor;

#[derive(Debug, Clone, PartialEq)]
struct DrawnEdge {
    line: LineDescriptor,
    handle: PrimitiveHandle,
}

/// Tracks drawn edges only so a full clear can detach them.
#[derive(Debug, Default)]
pub struct RelationshipResolver {
    drawn: Vec<DrawnEdge>,
}

impl RelationshipResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_edge<C: MapCanvas + ?Sized>(
        &mut self,
        registry: &EntityRegistry,
        canvas: &mut C,
        factory: &GeoPrimitiveFactory,
        line: &LineDescriptor,
    ) -> Option<PrimitiveHandle> {
        let (Some(source), Some(target)) =
            (registry.get(&line.source_id), registry.get(&line.target_id))
        else {
            tracing::debug!(
                "Skipping edge {} -> {}: endpoint not registered",
                line.source_id,
                line.target_id
            );
            return None;
        };

        let primitive = factory.edge(&source.id, source.anchor(), target.anchor());
        let handle = canvas.add_primitive(primitive);
        if source.visual_state.dimmed {
            canvas.set_opacity(handle, opacity_for(true));
        }
        self.drawn.push(DrawnEdge {
            line: line.clone(),
            handle,
        });
        Some(handle)
    }

    /// Redraw an edge against the endpoints' current positions. An edge
    /// previously drawn for the same pair is left in place.
    pub fn update_edge<C: MapCanvas + ?Sized>(
        &mut self,
        registry: &EntityRegistry,
        canvas: &mut C,
        factory: &GeoPrimitiveFactory,
        line: &LineDescriptor,
    ) -> Option<PrimitiveHandle> {
        self.draw_edge(registry, canvas, factory, line)
    }

    /// Returns the number of edges actually drawn.
    pub fn draw_edges<C: MapCanvas + ?Sized>(
        &mut self,
        registry: &EntityRegistry,
        canvas: &mut C,
        factory: &GeoPrimitiveFactory,
        lines: &[LineDescriptor],
    ) -> usize {
        let mut drawn = 0;
        for line in lines {
            if self.draw_edge(registry, canvas, factory, line).is_some() {
                drawn += 1;
            }
        }
        drawn
    }

    pub fn edge_count(&self) -> usize {
        self.drawn.len()
    }

    /// Number of drawn edges between this exact source/target pair.
    pub fn edges_between(&self, line: &LineDescriptor) -> usize {
        self.drawn.iter().filter(|edge| edge.line == *line).count()
    }

    pub fn clear<C: MapCanvas + ?Sized>(&mut self, canvas: &mut C) -> usize {
        let count = self.drawn.len();
        for edge in self.drawn.drain(..) {
            canvas.remove_primitive(edge.handle);
        }
        count
    }
}

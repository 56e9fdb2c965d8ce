//! Layer Group Manager
//!
//! Bulk containers of primitives keyed by [`LayerCategory`]. Members are not
//! individually addressable; a group is only ever cleared or replaced as a
//! whole. Each group also carries the sequence counters used to discard
//! responses that resolve after a newer refresh or a clear.

use crate::canvas::{MapCanvas, PrimitiveHandle};
use crate::primitive::Primitive;
use geomap_core::{LatLng, LayerCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Issued when a refresh of a group starts; presented again when its data
/// arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTicket {
    pub category: LayerCategory,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplaceOutcome {
    Applied { placed: usize, removed: usize },
    /// The ticket was superseded; the group was left untouched.
    Stale { sequence: u64, floor: u64 },
}

impl ReplaceOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ReplaceOutcome::Applied { .. })
    }
}

#[derive(Debug)]
struct LayerGroup {
    handles: Vec<PrimitiveHandle>,
    points: Vec<LatLng>,
    /// Highest sequence handed out by `begin_refresh`.
    issued: u64,
    /// Tickets at or below this sequence are stale.
    floor: u64,
}

impl LayerGroup {
    fn new() -> Self {
        Self {
            handles: Vec::new(),
            points: Vec::new(),
            issued: 0,
            floor: 0,
        }
    }
}

#[derive(Debug)]
pub struct LayerGroupManager {
    groups: BTreeMap<LayerCategory, LayerGroup>,
    sequencing_guard: bool,
}

impl Default for LayerGroupManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LayerGroupManager {
    /// One group per category, created up front and kept for the manager's
    /// lifetime.
    pub fn new(sequencing_guard: bool) -> Self {
        Self {
            groups: LayerCategory::ALL
                .iter()
                .map(|category| (*category, LayerGroup::new()))
                .collect(),
            sequencing_guard,
        }
    }

    pub fn sequencing_guard(&self) -> bool {
        self.sequencing_guard
    }

    fn group_mut(&mut self, category: LayerCategory) -> &mut LayerGroup {
        self.groups.entry(category).or_insert_with(LayerGroup::new)
    }

    pub fn begin_refresh(&mut self, category: LayerCategory) -> RefreshTicket {
        let group = self.group_mut(category);
        group.issued += 1;
        RefreshTicket {
            category,
            sequence: group.issued,
        }
    }

    /// Clear and repopulate a group. Supersedes any refresh still in flight.
    pub fn replace<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        category: LayerCategory,
        primitives: Vec<Primitive>,
    ) -> usize {
        let group = self.group_mut(category);
        group.floor = group.issued;
        Self::swap_contents(canvas, category, group, primitives).0
    }

    /// Apply the data a refresh ticket was waiting for. With the sequencing
    /// guard on, a ticket issued before the group's last clear or last
    /// applied refresh is discarded.
    pub fn replace_with_ticket<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        ticket: RefreshTicket,
        primitives: Vec<Primitive>,
    ) -> ReplaceOutcome {
        let guard = self.sequencing_guard;
        let group = self.group_mut(ticket.category);
        if guard && ticket.sequence <= group.floor {
            tracing::info!(
                "Discarding stale {} response #{} (floor #{})",
                ticket.category,
                ticket.sequence,
                group.floor
            );
            return ReplaceOutcome::Stale {
                sequence: ticket.sequence,
                floor: group.floor,
            };
        }
        group.floor = group.floor.max(ticket.sequence);
        let (placed, removed) = Self::swap_contents(canvas, ticket.category, group, primitives);
        ReplaceOutcome::Applied { placed, removed }
    }

    fn swap_contents<C: MapCanvas + ?Sized>(
        canvas: &mut C,
        category: LayerCategory,
        group: &mut LayerGroup,
        primitives: Vec<Primitive>,
    ) -> (usize, usize) {
        let removed = group.handles.len();
        for handle in group.handles.drain(..) {
            canvas.remove_primitive(handle);
        }
        group.points = primitives.iter().flat_map(Primitive::points).collect();
        group.handles = primitives
            .into_iter()
            .map(|primitive| canvas.add_primitive(primitive))
            .collect();
        tracing::debug!(
            "Replaced {} group: {} removed, {} placed",
            category,
            removed,
            group.handles.len()
        );
        (group.handles.len(), removed)
    }

    /// Empty one group. Any refresh issued before the clear becomes stale.
    pub fn clear<C: MapCanvas + ?Sized>(&mut self, canvas: &mut C, category: LayerCategory) -> usize {
        let group = self.group_mut(category);
        group.floor = group.issued;
        group.points.clear();
        let removed = group.handles.len();
        for handle in group.handles.drain(..) {
            canvas.remove_primitive(handle);
        }
        tracing::debug!("Cleared {} group ({} primitives)", category, removed);
        removed
    }

    pub fn clear_all<C: MapCanvas + ?Sized>(&mut self, canvas: &mut C) -> usize {
        let mut removed = 0;
        for category in LayerCategory::ALL {
            removed += self.clear(canvas, category);
        }
        removed
    }

    pub fn len(&self, category: LayerCategory) -> usize {
        self.groups.get(&category).map_or(0, |g| g.handles.len())
    }

    pub fn is_empty(&self, category: LayerCategory) -> bool {
        self.len(category) == 0
    }

    pub fn handles(&self, category: LayerCategory) -> &[PrimitiveHandle] {
        self.groups
            .get(&category)
            .map(|g| g.handles.as_slice())
            .unwrap_or(&[])
    }

    /// Coordinates currently drawn by a group, for view fitting.
    pub fn points(&self, category: LayerCategory) -> &[LatLng] {
        self.groups
            .get(&category)
            .map(|g| g.points.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_len(&self) -> usize {
        self.groups.values().map(|g| g.handles.len()).sum()
    }
}

use crate::RenderError;
use crate::canvas::{MapCanvas, PrimitiveHandle};
use crate::factory::GeoPrimitiveFactory;
use crate::style::opacity_for;
use crate::view_fit::Bounds;
use geomap_core::{EntityDescriptor, EntityId, EntityKind, LatLng};
use std::collections::{HashMap, HashSet};

/// Rendering state independent of registry membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisualState {
    /// Drawn at zero opacity by the visibility filter.
    pub dimmed: bool,
}

impl VisualState {
    pub fn is_visible(&self) -> bool {
        !self.dimmed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub coordinates: Vec<LatLng>,
    pub visual_state: VisualState,
    handle: PrimitiveHandle,
}

impl ViewEntity {
    pub(crate) fn handle(&self) -> PrimitiveHandle {
        self.handle
    }

    /// The coordinate edges attach to: the position of a point entity, the
    /// bounding-box centre of an areal one.
    pub fn anchor(&self) -> LatLng {
        if self.kind.is_areal() {
            if let Some(bounds) = Bounds::from_points(&self.coordinates) {
                return bounds.center();
            }
        }
        self.coordinates[0]
    }
}

/// Authoritative id → rendered entity mapping.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, ViewEntity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_descriptor(&self, descriptor: &EntityDescriptor) -> Result<(), RenderError> {
        descriptor
            .validate()
            .map_err(|source| RenderError::InvalidDescriptor {
                id: descriptor.id().clone(),
                source,
            })?;
        if self.entities.contains_key(descriptor.id()) {
            return Err(RenderError::DuplicateId(descriptor.id().clone()));
        }
        Ok(())
    }

    fn place<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        factory: &GeoPrimitiveFactory,
        descriptor: &EntityDescriptor,
        visual_state: VisualState,
    ) -> &ViewEntity {
        let handle = canvas.add_primitive(factory.entity(descriptor));
        if visual_state.dimmed {
            canvas.set_opacity(handle, opacity_for(true));
            canvas.set_class_opacity(&descriptor.id().label_class(), opacity_for(true));
        }
        let entity = ViewEntity {
            id: descriptor.id().clone(),
            kind: descriptor.kind(),
            coordinates: descriptor.points().to_vec(),
            visual_state,
            handle,
        };
        tracing::debug!("Placed {:?} {} as {}", entity.kind, entity.id, handle);
        self.entities
            .entry(entity.id.clone())
            .insert_entry(entity)
            .into_mut()
    }

    /// Register and draw one entity. Fails without side effects when the id
    /// is already registered.
    pub fn add<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        factory: &GeoPrimitiveFactory,
        descriptor: &EntityDescriptor,
    ) -> Result<&ViewEntity, RenderError> {
        self.check_descriptor(descriptor)?;
        Ok(self.place(canvas, factory, descriptor, VisualState::default()))
    }

    /// Register a batch. The whole batch is checked first, including ids
    /// repeated inside it; nothing is drawn unless every entry is accepted.
    pub fn add_batch<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        factory: &GeoPrimitiveFactory,
        descriptors: &[EntityDescriptor],
    ) -> Result<usize, RenderError> {
        let mut seen = HashSet::with_capacity(descriptors.len());
        for descriptor in descriptors {
            self.check_descriptor(descriptor)?;
            if !seen.insert(descriptor.id()) {
                return Err(RenderError::DuplicateId(descriptor.id().clone()));
            }
        }
        for descriptor in descriptors {
            self.place(canvas, factory, descriptor, VisualState::default());
        }
        Ok(descriptors.len())
    }

    /// Geometry update: detach the old primitive and draw a fresh one. The
    /// dimmed flag carries over.
    pub fn replace<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        factory: &GeoPrimitiveFactory,
        descriptor: &EntityDescriptor,
    ) -> Result<&ViewEntity, RenderError> {
        descriptor
            .validate()
            .map_err(|source| RenderError::InvalidDescriptor {
                id: descriptor.id().clone(),
                source,
            })?;
        let previous = self.detach(canvas, descriptor.id())?;
        Ok(self.place(canvas, factory, descriptor, previous.visual_state))
    }

    pub fn remove<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        id: &EntityId,
    ) -> Result<(), RenderError> {
        self.detach(canvas, id)?;
        tracing::debug!("Removed entity {}", id);
        Ok(())
    }

    fn detach<C: MapCanvas + ?Sized>(
        &mut self,
        canvas: &mut C,
        id: &EntityId,
    ) -> Result<ViewEntity, RenderError> {
        let entity = self
            .entities
            .remove(id)
            .ok_or_else(|| RenderError::NotFound(id.clone()))?;
        if !canvas.remove_primitive(entity.handle) {
            tracing::debug!("Primitive {} for {} was already detached", entity.handle, id);
        }
        Ok(entity)
    }

    pub fn has(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&ViewEntity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewEntity> {
        self.entities.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ViewEntity> {
        self.entities.values_mut()
    }

    /// Detach everything and halt any in-flight viewport animation so the
    /// map does not keep flying toward a removed target.
    pub fn clear_all<C: MapCanvas + ?Sized>(&mut self, canvas: &mut C) -> usize {
        let count = self.entities.len();
        for (_, entity) in self.entities.drain() {
            canvas.remove_primitive(entity.handle);
        }
        canvas.stop_animation();
        tracing::debug!("Cleared {} entities", count);
        count
    }
}

use crate::world::{
    component::replica::Replica,
    entity::{ComponentAddress, EntityId},
    registry::{EntityHandle, EntityRegistry},
};

/// Looks up an entity by stable identifier. Id 0 and unknown ids both yield
/// `None`: arrival order across entities is not guaranteed, so a miss is
/// normal operation, not an error. Callers re-resolve on every access
/// rather than caching the result.
pub fn resolve_entity(registry: &EntityRegistry, id: EntityId) -> Option<EntityHandle> {
    if id == 0 {
        return None;
    }
    registry.get(id)
}

/// Looks up a component by (entity id, component index). Resolves the owner
/// first, then bounds-checks the index; either miss yields `None`.
pub fn resolve_component(
    registry: &EntityRegistry,
    address: &ComponentAddress,
) -> Option<ComponentHandle> {
    if address.is_none() {
        return None;
    }
    let entity = resolve_entity(registry, address.entity_id)?;
    {
        let Ok(inner) = entity.as_ref().read() else {
            panic!("entity lock poisoned");
        };
        if inner.component(address.component_index).is_none() {
            return None;
        }
    }
    Some(ComponentHandle {
        entity,
        index: address.component_index,
    })
}

/// A resolved component reference: the owning entity's handle plus the
/// component index, valid at resolution time.
#[derive(Clone)]
pub struct ComponentHandle {
    entity: EntityHandle,
    index: u8,
}

impl ComponentHandle {
    pub(crate) fn new(entity: EntityHandle, index: u8) -> Self {
        Self { entity, index }
    }

    pub fn entity(&self) -> &EntityHandle {
        &self.entity
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Runs `f` against the referenced Replica under the entity's read
    /// lock. Returns `None` if the component slot has meanwhile vanished.
    pub fn with_replica<R>(&self, f: impl FnOnce(&Replica) -> R) -> Option<R> {
        let Ok(inner) = self.entity.as_ref().read() else {
            panic!("entity lock poisoned");
        };
        inner.component(self.index).map(f)
    }
}

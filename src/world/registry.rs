use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use thiserror::Error;

use crate::world::entity::{Entity, EntityId};

/// Shared handle to a live entity. Reference resolution hands these out;
/// callers take the read or write lock as needed.
pub type EntityHandle = Arc<RwLock<Entity>>;

/// Errors that can occur while mutating the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Entities must be assigned a nonzero id before spawning
    #[error("Cannot spawn an entity with id 0; 0 means unassigned")]
    ZeroEntityId,

    /// Id already maps to a live entity
    #[error("Entity id {id} is already live in the registry; ids are never reused while live")]
    DuplicateEntityId { id: EntityId },
}

/// Session-owned map from entity id to live entity. Mutated on spawn and
/// despawn, read by reference resolution; cleared on disconnect. Passed
/// explicitly wherever resolution happens, so isolated sessions (and tests)
/// can run side by side.
pub struct EntityRegistry {
    entities: HashMap<EntityId, EntityHandle>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }

    pub fn spawn(&mut self, entity: Entity) -> Result<EntityHandle, RegistryError> {
        let id = entity.id();
        if id == 0 {
            return Err(RegistryError::ZeroEntityId);
        }
        if self.entities.contains_key(&id) {
            return Err(RegistryError::DuplicateEntityId { id });
        }
        let handle: EntityHandle = Arc::new(RwLock::new(entity));
        self.entities.insert(id, handle.clone());
        Ok(handle)
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<EntityHandle> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<EntityHandle> {
        self.entities.get(&id).cloned()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Session teardown: drops every live entity.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

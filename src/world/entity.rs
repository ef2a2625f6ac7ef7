use std::{collections::HashSet, fmt, sync::Arc, time::Instant};

use thiserror::Error;

use crate::world::{
    component::{layout::ReplicaLayout, replica::Replica},
    config::SyncConfig,
};

/// Errors that can occur while mutating an entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Component indices are one wire byte, so 256 components is the cap
    #[error("Entity {id} already carries 256 components; component indices are a single byte on the wire")]
    TooManyComponents { id: EntityId },
}

/// Stable identifier of a networked entity. `0` means unassigned / not yet
/// spawned; a live entity in a registry always has a nonzero id.
pub type EntityId = u32;

/// Key identifying an observing remote peer on an entity.
pub type ObserverKey = u64;

/// Stable identifier of one component on one entity, substituted for a
/// direct reference across the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentAddress {
    pub entity_id: EntityId,
    pub component_index: u8,
}

impl ComponentAddress {
    pub const NONE: ComponentAddress = ComponentAddress {
        entity_id: 0,
        component_index: 0,
    };

    pub fn new(entity_id: EntityId, component_index: u8) -> Self {
        Self {
            entity_id,
            component_index,
        }
    }

    pub fn is_none(&self) -> bool {
        self.entity_id == 0
    }
}

/// A uniquely identified, networked object: an ordered sequence of Replica
/// component slots plus observer bookkeeping. The authority flag decides
/// which accessor path its components' reference fields take.
pub struct Entity {
    id: EntityId,
    authority: bool,
    components: Vec<Replica>,
    observers: HashSet<ObserverKey>,
}

impl Entity {
    pub fn new(id: EntityId, authority: bool) -> Self {
        Self {
            id,
            authority,
            components: Vec::new(),
            observers: HashSet::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_authority(&self) -> bool {
        self.authority
    }

    /// Attaches a new component built from `layout`, inheriting this
    /// entity's authority side. Components get their index in attachment
    /// order; two components of the same layout get distinct indices.
    /// Indices are one wire byte, so at most 256 components fit.
    pub fn attach(
        &mut self,
        layout: &Arc<ReplicaLayout>,
        config: &SyncConfig,
    ) -> Result<u8, EntityError> {
        if self.components.len() > usize::from(u8::MAX) {
            return Err(EntityError::TooManyComponents { id: self.id });
        }
        let replica = if self.authority {
            Replica::new_authoritative(layout, config)
        } else {
            Replica::new_remote(layout, config)
        };
        let index = self.components.len() as u8;
        self.components.push(replica);
        Ok(index)
    }

    pub fn component(&self, index: u8) -> Option<&Replica> {
        self.components.get(usize::from(index))
    }

    pub fn component_mut(&mut self, index: u8) -> Option<&mut Replica> {
        self.components.get_mut(usize::from(index))
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    // Observers

    pub fn add_observer(&mut self, key: ObserverKey) -> bool {
        self.observers.insert(key)
    }

    pub fn remove_observer(&mut self, key: ObserverKey) -> bool {
        self.observers.remove(&key)
    }

    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    /// Whether the component at `index` should emit a delta this tick:
    /// interval-gated dirty state plus at least one observer. Value and
    /// reference fields follow the same gate uniformly.
    pub fn delta_eligible(&self, index: u8, now: Instant) -> bool {
        if !self.has_observers() {
            return false;
        }
        self.component(index)
            .is_some_and(|replica| replica.is_dirty(now))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("authority", &self.authority)
            .field("components", &self.components.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Hands out nonzero entity ids on the authority side. Ids are never
/// recycled; the id space wraps past `u32::MAX` only in theory.
pub struct EntityIdGenerator {
    next_id: EntityId,
}

impl EntityIdGenerator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn generate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        if self.next_id == 0 {
            self.next_id = 1;
        }
        id
    }
}

impl Default for EntityIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

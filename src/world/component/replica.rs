use std::{collections::HashMap, sync::Arc, time::Instant};

use log::warn;

use crate::world::{
    component::{
        dirty::{DirtyMask, DirtyTracker},
        error::ReplicaError,
        hooks::HookGuard,
        layout::{FieldCategory, FieldDef, ReplicaLayout},
        value::{FieldValue, SyncValue},
    },
    config::SyncConfig,
    entity::{ComponentAddress, EntityId},
    registry::{EntityHandle, EntityRegistry},
    resolver::{self, ComponentHandle},
};

/// One synchronized component instance: field storage for a shared layout,
/// a dirty-bit tracker, and the hook reentrancy guard.
///
/// Authoritative replicas originate writes and serialize; remote replicas
/// apply incoming payloads. Both sides run every write through change
/// detection, dirty marking and hook dispatch, the difference being how
/// reference-category getters resolve (see `entity`/`component`).
pub struct Replica {
    layout: Arc<ReplicaLayout>,
    authority: bool,
    values: Vec<FieldValue>,
    // authoritative side only: the live handles assigned to reference
    // fields, returned by getters without a registry lookup
    direct_refs: HashMap<u8, DirectRef>,
    dirty: DirtyTracker,
    guard: HookGuard,
}

enum DirectRef {
    Entity(EntityHandle),
    Component(EntityHandle, u8),
}

impl Replica {
    /// Writer-side constructor. All fields start zero-valued.
    pub fn new_authoritative(layout: &Arc<ReplicaLayout>, config: &SyncConfig) -> Self {
        Self::new(layout, config, true)
    }

    /// Receiver-side constructor. All fields start zero-valued until the
    /// first full snapshot arrives.
    pub fn new_remote(layout: &Arc<ReplicaLayout>, config: &SyncConfig) -> Self {
        Self::new(layout, config, false)
    }

    fn new(layout: &Arc<ReplicaLayout>, config: &SyncConfig, authority: bool) -> Self {
        let values = layout
            .fields()
            .map(|def| match def.category() {
                FieldCategory::Value(kind) => FieldValue::Value(SyncValue::zeroed(kind)),
                FieldCategory::EntityRef => FieldValue::Entity(0),
                FieldCategory::ComponentRef => FieldValue::Component(ComponentAddress::NONE),
            })
            .collect();
        Self {
            layout: layout.clone(),
            authority,
            values,
            direct_refs: HashMap::new(),
            dirty: DirtyTracker::new(config, Instant::now()),
            guard: HookGuard::new(),
        }
    }

    pub fn layout(&self) -> &Arc<ReplicaLayout> {
        &self.layout
    }

    pub fn is_authority(&self) -> bool {
        self.authority
    }

    pub fn slot_of(&self, name: &str) -> Result<u8, ReplicaError> {
        self.layout
            .slot_of(name)
            .ok_or_else(|| ReplicaError::UnknownField {
                type_name: self.layout.type_name().to_string(),
                field: name.to_string(),
            })
    }

    // Dirty state

    pub fn dirty_mask(&self) -> DirtyMask {
        self.dirty.mask()
    }

    /// Interval-gated dirty check (see `DirtyTracker::is_dirty`).
    pub fn is_dirty(&self, now: Instant) -> bool {
        self.dirty.is_dirty(now)
    }

    /// Unconditional dirty check, ignoring the sync interval.
    pub fn has_changes(&self) -> bool {
        self.dirty.has_changes()
    }

    /// Clears only the given bits, typically the mask a delta just wrote.
    pub fn clear_dirty_bits(&mut self, synced: DirtyMask, now: Instant) {
        self.dirty.clear(synced, now);
    }

    /// Zeroes the whole mask regardless of elapsed time.
    pub fn clear_all_dirty_bits(&mut self, now: Instant) {
        self.dirty.clear_all(now);
    }

    // Value-category accessors

    pub fn value(&self, slot: u8) -> Result<&SyncValue, ReplicaError> {
        let def = self.def(slot)?;
        match &self.values[usize::from(slot)] {
            FieldValue::Value(value) => Ok(value),
            _ => Err(ReplicaError::CategoryMismatch {
                field: def.name().to_string(),
                declared: def.category().name(),
                requested: "Value",
            }),
        }
    }

    /// Sets a Value-category field. Returns Ok(true) iff a real change was
    /// applied; a write of an equal value is a complete no-op (no dirty
    /// bit, no hook).
    pub fn set_value(&mut self, slot: u8, value: SyncValue) -> Result<bool, ReplicaError> {
        let def = self.def(slot)?;
        let FieldCategory::Value(kind) = def.category() else {
            return Err(ReplicaError::CategoryMismatch {
                field: def.name().to_string(),
                declared: def.category().name(),
                requested: "Value",
            });
        };
        if value.kind() != kind {
            return Err(ReplicaError::KindMismatch {
                field: def.name().to_string(),
                expected: kind.name(),
                found: value.kind().name(),
            });
        }
        Ok(self.store_and_notify(slot, FieldValue::Value(value)))
    }

    // EntityRef accessors

    /// The cached stable identifier (0 = none). Authoritative for
    /// resolution; the resolved handle is always re-derived from it.
    pub fn entity_id(&self, slot: u8) -> Result<EntityId, ReplicaError> {
        let def = self.def(slot)?;
        match &self.values[usize::from(slot)] {
            FieldValue::Entity(id) => Ok(*id),
            _ => Err(ReplicaError::CategoryMismatch {
                field: def.name().to_string(),
                declared: def.category().name(),
                requested: "EntityRef",
            }),
        }
    }

    /// Reads the referenced entity. On the authority the handle stored by
    /// `set_entity` comes back verbatim, with no registry lookup: the
    /// assigner holds the live instance, registered or not. On the remote
    /// side this is a live lookup from the cached identifier, never
    /// memoized: the referent may enter the registry after the field was
    /// set, and a later read will then find it (silently `None` until
    /// then, out-of-order arrival being normal).
    pub fn entity(
        &self,
        slot: u8,
        registry: &EntityRegistry,
    ) -> Result<Option<EntityHandle>, ReplicaError> {
        let id = self.entity_id(slot)?;
        if self.authority {
            if let Some(DirectRef::Entity(handle)) = self.direct_refs.get(&slot) {
                return Ok(Some(handle.clone()));
            }
            if id == 0 {
                return Ok(None);
            }
            // id learned without a handle (set_entity_id): fall back to
            // the registry, warning on a miss the authority should not see
            let found = registry.get(id);
            if found.is_none() {
                warn!(
                    "{}: field '{}' references entity {} which is missing from the registry on the authority side",
                    self.layout.type_name(),
                    self.field_name(slot),
                    id
                );
            }
            return Ok(found);
        }
        if id == 0 {
            return Ok(None);
        }
        Ok(resolver::resolve_entity(registry, id))
    }

    /// Assigns an EntityRef field from a live entity handle (or clears it
    /// with `None`). An entity whose id is still 0 is tolerated with a
    /// warning: comparison and wire storage proceed using identifier 0,
    /// which is indistinguishable from an absent reference until the spawn
    /// lands, though the authority keeps the handle for its own reads.
    pub fn set_entity(
        &mut self,
        slot: u8,
        target: Option<&EntityHandle>,
    ) -> Result<bool, ReplicaError> {
        self.ensure_category(slot, FieldCategory::EntityRef)?;
        let new_id = match target {
            Some(handle) => {
                let Ok(entity) = handle.as_ref().read() else {
                    panic!("entity lock poisoned");
                };
                if entity.id() == 0 {
                    warn!(
                        "{}: field '{}' assigned an entity with a zero identifier; it may not be spawned yet",
                        self.layout.type_name(),
                        self.field_name(slot)
                    );
                }
                entity.id()
            }
            None => 0,
        };
        if self.authority {
            // stored before the write lands so a hook reading the field
            // back already sees the new handle
            match target {
                Some(handle) => {
                    self.direct_refs
                        .insert(slot, DirectRef::Entity(handle.clone()));
                }
                None => {
                    self.direct_refs.remove(&slot);
                }
            }
        }
        Ok(self.store_and_notify(slot, FieldValue::Entity(new_id)))
    }

    /// Identifier-level assignment, used by the codec and by callers that
    /// learned the id before the entity itself arrived. Drops any handle a
    /// prior `set_entity` stored: an id alone carries no live reference.
    pub fn set_entity_id(&mut self, slot: u8, id: EntityId) -> Result<bool, ReplicaError> {
        self.ensure_category(slot, FieldCategory::EntityRef)?;
        self.direct_refs.remove(&slot);
        Ok(self.store_and_notify(slot, FieldValue::Entity(id)))
    }

    // ComponentRef accessors

    pub fn component_address(&self, slot: u8) -> Result<ComponentAddress, ReplicaError> {
        let def = self.def(slot)?;
        match &self.values[usize::from(slot)] {
            FieldValue::Component(address) => Ok(*address),
            _ => Err(ReplicaError::CategoryMismatch {
                field: def.name().to_string(),
                declared: def.category().name(),
                requested: "ComponentRef",
            }),
        }
    }

    /// Reads the referenced component. Same split as `entity`: the
    /// authority gets back the owner handle `set_component` stored, with
    /// no registry lookup; the remote side re-resolves the cached
    /// (entity id, component index) pair on every read.
    pub fn component(
        &self,
        slot: u8,
        registry: &EntityRegistry,
    ) -> Result<Option<ComponentHandle>, ReplicaError> {
        let address = self.component_address(slot)?;
        if self.authority {
            if let Some(DirectRef::Component(owner, index)) = self.direct_refs.get(&slot) {
                return Ok(Some(ComponentHandle::new(owner.clone(), *index)));
            }
            if address.is_none() {
                return Ok(None);
            }
            let found = resolver::resolve_component(registry, &address);
            if found.is_none() {
                warn!(
                    "{}: field '{}' references component {} of entity {} which is missing from the registry on the authority side",
                    self.layout.type_name(),
                    self.field_name(slot),
                    address.component_index,
                    address.entity_id
                );
            }
            return Ok(found);
        }
        if address.is_none() {
            return Ok(None);
        }
        Ok(resolver::resolve_component(registry, &address))
    }

    /// Assigns a ComponentRef field from a live owner handle and component
    /// index (or clears it with `None`). Zero-identifier owners are
    /// tolerated with a warning, like `set_entity`.
    pub fn set_component(
        &mut self,
        slot: u8,
        target: Option<(&EntityHandle, u8)>,
    ) -> Result<bool, ReplicaError> {
        self.ensure_category(slot, FieldCategory::ComponentRef)?;
        let address = match target {
            Some((handle, index)) => {
                let Ok(entity) = handle.as_ref().read() else {
                    panic!("entity lock poisoned");
                };
                if entity.id() == 0 {
                    warn!(
                        "{}: field '{}' assigned a component of an entity with a zero identifier; it may not be spawned yet",
                        self.layout.type_name(),
                        self.field_name(slot)
                    );
                }
                ComponentAddress::new(entity.id(), index)
            }
            None => ComponentAddress::NONE,
        };
        if self.authority {
            match target {
                Some((handle, index)) => {
                    self.direct_refs
                        .insert(slot, DirectRef::Component(handle.clone(), index));
                }
                None => {
                    self.direct_refs.remove(&slot);
                }
            }
        }
        let normalized = if address.is_none() {
            ComponentAddress::NONE
        } else {
            address
        };
        Ok(self.store_and_notify(slot, FieldValue::Component(normalized)))
    }

    /// Address-level assignment, used by the codec and by callers that
    /// learned the address before the owner itself arrived. Drops any
    /// handle a prior `set_component` stored.
    pub fn set_component_address(
        &mut self,
        slot: u8,
        address: ComponentAddress,
    ) -> Result<bool, ReplicaError> {
        self.ensure_category(slot, FieldCategory::ComponentRef)?;
        self.direct_refs.remove(&slot);
        // a zero owner id is one single "none" state, whatever the index
        let normalized = if address.is_none() {
            ComponentAddress::NONE
        } else {
            address
        };
        Ok(self.store_and_notify(slot, FieldValue::Component(normalized)))
    }

    // Shared write path

    /// Change-detect, store, mark dirty, dispatch hook. Every write lands
    /// here, whether it came from a local setter or the wire.
    pub(crate) fn store_and_notify(&mut self, slot: u8, new: FieldValue) -> bool {
        let index = usize::from(slot);
        if Self::field_eq(&self.values[index], &new) {
            return false;
        }
        let old = std::mem::replace(&mut self.values[index], new.clone());
        self.dirty.mark(slot);
        self.notify(slot, old, new);
        true
    }

    fn notify(&mut self, slot: u8, old: FieldValue, new: FieldValue) {
        let Some(hook) = self.layout.field(slot).and_then(|def| def.hook().cloned()) else {
            return;
        };
        let guard = self.guard.clone();
        // skipped entirely while the guard bit is held (combined host
        // writing back to the same field from inside the hook)
        let Some(_held) = guard.try_hold(slot) else {
            return;
        };
        hook(self, &old, &new);
    }

    fn field_eq(current: &FieldValue, new: &FieldValue) -> bool {
        match (current, new) {
            (FieldValue::Value(a), FieldValue::Value(b)) => a.sync_eq(b),
            (a, b) => a == b,
        }
    }

    pub(crate) fn raw_field(&self, slot: u8) -> &FieldValue {
        &self.values[usize::from(slot)]
    }

    fn def(&self, slot: u8) -> Result<&FieldDef, ReplicaError> {
        self.layout
            .field(slot)
            .ok_or_else(|| ReplicaError::UnknownSlot {
                type_name: self.layout.type_name().to_string(),
                slot,
            })
    }

    fn ensure_category(&self, slot: u8, expected: FieldCategory) -> Result<(), ReplicaError> {
        let def = self.def(slot)?;
        if def.category() != expected {
            return Err(ReplicaError::CategoryMismatch {
                field: def.name().to_string(),
                declared: def.category().name(),
                requested: expected.name(),
            });
        }
        Ok(())
    }

    fn field_name(&self, slot: u8) -> &str {
        self.layout
            .field(slot)
            .map(|def| def.name())
            .unwrap_or("<unknown>")
    }
}

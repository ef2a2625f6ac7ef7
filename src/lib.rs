//! # replica-sync
//! Field synchronization and change-propagation engine: per-field dirty
//! tracking with a bounded bitmask, change detection with reference-id
//! equality, full-snapshot and incremental-delta serialization, hook
//! dispatch with reentrancy guarding, and registry-based deferred
//! resolution of entity references by stable identifier.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod serde;
mod world;

pub use serde::{ByteReader, ByteWriter, SerdeErr};
pub use world::{
    component::{
        dirty::{DirtyMask, DirtyTracker, MAX_SYNC_FIELDS},
        error::{LayoutError, ReplicaError},
        hooks::{ChangeHook, HeldGuard, HookGuard},
        layout::{FieldCategory, FieldDef, FieldShape, LayoutBuilder, ReplicaLayout},
        replica::Replica,
        value::{FieldValue, SyncValue, ValueKind},
    },
    config::SyncConfig,
    entity::{ComponentAddress, Entity, EntityError, EntityId, EntityIdGenerator, ObserverKey},
    registry::{EntityHandle, EntityRegistry, RegistryError},
    resolver::{resolve_component, resolve_entity, ComponentHandle},
};

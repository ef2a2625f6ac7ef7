//! Deferred reference resolution: reads re-resolve from the cached
//! identifier on every access, so referents can arrive after the field
//! was set and disappear again on despawn.

use std::sync::{Arc, RwLock};

use replica_sync::{
    resolve_component, resolve_entity, ComponentAddress, Entity, EntityHandle, EntityIdGenerator,
    EntityRegistry, FieldCategory, LayoutBuilder, RegistryError, Replica, ReplicaLayout,
    SyncConfig, ValueKind,
};

fn follower_layout() -> Arc<ReplicaLayout> {
    Arc::new(
        LayoutBuilder::new("Follower")
            .field("leader", FieldCategory::EntityRef)
            .field("leader_gun", FieldCategory::ComponentRef)
            .build()
            .unwrap(),
    )
}

fn gun_layout() -> Arc<ReplicaLayout> {
    Arc::new(
        LayoutBuilder::new("Gun")
            .field("ammo", FieldCategory::Value(ValueKind::U16))
            .build()
            .unwrap(),
    )
}

#[test]
fn entity_reference_resolves_after_late_spawn() {
    let mut registry = EntityRegistry::new();
    let mut replica = Replica::new_remote(&follower_layout(), &SyncConfig::immediate());

    // identifier arrives before the entity it names
    replica.set_entity_id(0, 21).unwrap();
    assert!(replica.entity(0, &registry).unwrap().is_none());

    registry.spawn(Entity::new(21, false)).unwrap();

    // no re-set needed; the next read finds it
    let resolved = replica.entity(0, &registry).unwrap().expect("resolved");
    assert_eq!(resolved.read().unwrap().id(), 21);
}

#[test]
fn despawn_makes_the_reference_absent_again() {
    let mut registry = EntityRegistry::new();
    let mut replica = Replica::new_remote(&follower_layout(), &SyncConfig::immediate());
    registry.spawn(Entity::new(21, false)).unwrap();
    replica.set_entity_id(0, 21).unwrap();
    assert!(replica.entity(0, &registry).unwrap().is_some());

    registry.despawn(21);
    assert!(replica.entity(0, &registry).unwrap().is_none());
    // the cached identifier survives the miss
    assert_eq!(replica.entity_id(0).unwrap(), 21);
}

#[test]
fn component_reference_resolves_owner_then_index() {
    let mut registry = EntityRegistry::new();
    let gun_layout = gun_layout();
    let mut replica = Replica::new_remote(&follower_layout(), &SyncConfig::immediate());
    replica
        .set_component_address(1, ComponentAddress::new(33, 0))
        .unwrap();

    // owner missing
    assert!(replica.component(1, &registry).unwrap().is_none());

    // owner present but component slot not yet attached
    let handle = registry.spawn(Entity::new(33, false)).unwrap();
    assert!(replica.component(1, &registry).unwrap().is_none());

    handle
        .write()
        .unwrap()
        .attach(&gun_layout, &SyncConfig::immediate())
        .unwrap();
    let resolved = replica.component(1, &registry).unwrap().expect("resolved");
    assert_eq!(resolved.index(), 0);
    let ammo = resolved
        .with_replica(|gun| gun.value(0).unwrap().clone())
        .unwrap();
    assert_eq!(ammo, replica_sync::SyncValue::U16(0));
}

#[test]
fn out_of_range_component_index_is_absent_not_an_error() {
    let mut registry = EntityRegistry::new();
    registry.spawn(Entity::new(2, false)).unwrap();
    assert!(resolve_component(&registry, &ComponentAddress::new(2, 5)).is_none());
}

#[test]
fn zero_identifier_never_resolves() {
    let registry = EntityRegistry::new();
    assert!(resolve_entity(&registry, 0).is_none());
    assert!(resolve_component(&registry, &ComponentAddress::NONE).is_none());
}

#[test]
fn authority_reads_its_assigned_referent_directly() {
    let mut registry = EntityRegistry::new();
    let mut generator = EntityIdGenerator::new();

    let target_id = generator.generate();
    let target = registry.spawn(Entity::new(target_id, true)).unwrap();

    let mut replica = Replica::new_authoritative(&follower_layout(), &SyncConfig::immediate());
    replica.set_entity(0, Some(&target)).unwrap();

    let resolved = replica.entity(0, &registry).unwrap().expect("live");
    assert_eq!(resolved.read().unwrap().id(), target_id);
}

#[test]
fn authority_returns_the_stored_handle_without_registry_lookup() {
    let registry = EntityRegistry::new();
    let mut replica = Replica::new_authoritative(&follower_layout(), &SyncConfig::immediate());

    // the target is live on the authority but never spawned into the
    // registry; the stored handle comes back verbatim anyway
    let target: EntityHandle = Arc::new(RwLock::new(Entity::new(5, true)));
    replica.set_entity(0, Some(&target)).unwrap();

    let resolved = replica.entity(0, &registry).unwrap().expect("stored");
    assert!(Arc::ptr_eq(&resolved, &target));

    // clearing the field drops the handle again
    replica.set_entity(0, None).unwrap();
    assert!(replica.entity(0, &registry).unwrap().is_none());
}

#[test]
fn authority_component_reference_skips_the_registry() {
    let registry = EntityRegistry::new();
    let mut replica = Replica::new_authoritative(&follower_layout(), &SyncConfig::immediate());

    let owner: EntityHandle = Arc::new(RwLock::new(Entity::new(6, true)));
    let index = owner
        .write()
        .unwrap()
        .attach(&gun_layout(), &SyncConfig::immediate())
        .unwrap();
    replica.set_component(1, Some((&owner, index))).unwrap();

    let resolved = replica.component(1, &registry).unwrap().expect("stored");
    assert!(Arc::ptr_eq(resolved.entity(), &owner));
    assert_eq!(resolved.index(), index);
}

#[test]
fn authority_keeps_its_reference_through_a_despawn() {
    let mut registry = EntityRegistry::new();
    let target = registry.spawn(Entity::new(17, true)).unwrap();

    let mut replica = Replica::new_authoritative(&follower_layout(), &SyncConfig::immediate());
    replica.set_entity(0, Some(&target)).unwrap();

    // the remote side would lose the referent here; the authority holds
    // the handle itself and keeps reading it
    registry.despawn(17);
    let resolved = replica.entity(0, &registry).unwrap().expect("still held");
    assert!(Arc::ptr_eq(&resolved, &target));
}

#[test]
fn identifier_level_assignment_drops_a_stored_handle() {
    let registry = EntityRegistry::new();
    let mut replica = Replica::new_authoritative(&follower_layout(), &SyncConfig::immediate());

    let target: EntityHandle = Arc::new(RwLock::new(Entity::new(5, true)));
    replica.set_entity(0, Some(&target)).unwrap();

    // an id alone carries no live reference, so the getter falls back to
    // the registry (and misses, since nothing was spawned)
    replica.set_entity_id(0, 8).unwrap();
    assert!(replica.entity(0, &registry).unwrap().is_none());
}

#[test]
fn registry_refuses_zero_and_duplicate_ids() {
    let mut registry = EntityRegistry::new();
    assert_eq!(
        registry.spawn(Entity::new(0, true)).unwrap_err(),
        RegistryError::ZeroEntityId
    );

    registry.spawn(Entity::new(5, true)).unwrap();
    assert_eq!(
        registry.spawn(Entity::new(5, true)).unwrap_err(),
        RegistryError::DuplicateEntityId { id: 5 }
    );

    registry.despawn(5);
    // a despawned id may be assigned again; liveness is what is guarded
    assert!(registry.spawn(Entity::new(5, true)).is_ok());
}

#[test]
fn clear_drops_every_live_entity() {
    let mut registry = EntityRegistry::new();
    registry.spawn(Entity::new(1, true)).unwrap();
    registry.spawn(Entity::new(2, true)).unwrap();
    assert_eq!(registry.len(), 2);

    registry.clear();
    assert!(registry.is_empty());
    assert!(resolve_entity(&registry, 1).is_none());
}

#[test]
fn id_generator_skips_zero() {
    let mut generator = EntityIdGenerator::new();
    let first = generator.generate();
    let second = generator.generate();
    assert_ne!(first, 0);
    assert_ne!(second, 0);
    assert_ne!(first, second);
}

//! Dirty-bit tracking: marking on real change, interval gating, selective
//! and unconditional clearing, and delta-emission eligibility.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use replica_sync::{
    DirtyMask, Entity, EntityError, FieldCategory, LayoutBuilder, Replica, ReplicaLayout,
    SyncConfig, SyncValue, ValueKind,
};

fn player_layout() -> Arc<ReplicaLayout> {
    Arc::new(
        LayoutBuilder::new("Player")
            .field("health", FieldCategory::Value(ValueKind::U32))
            .field("name", FieldCategory::Value(ValueKind::String))
            .field("target", FieldCategory::EntityRef)
            .build()
            .expect("layout should build"),
    )
}

#[test]
fn fresh_replica_is_not_dirty() {
    let replica = Replica::new_authoritative(&player_layout(), &SyncConfig::immediate());
    assert!(!replica.has_changes());
    assert!(!replica.is_dirty(Instant::now()));
}

#[test]
fn real_change_sets_exactly_one_bit() {
    let mut replica = Replica::new_authoritative(&player_layout(), &SyncConfig::immediate());
    replica.set_value(0, SyncValue::U32(50)).unwrap();

    let mask = replica.dirty_mask();
    assert!(mask.bit(0));
    assert!(!mask.bit(1));
    assert!(!mask.bit(2));
    assert!(replica.is_dirty(Instant::now()));
}

#[test]
fn sync_interval_gates_is_dirty() {
    let config = SyncConfig {
        sync_interval: Duration::from_secs(1),
    };
    let mut replica = Replica::new_authoritative(&player_layout(), &config);
    let start = Instant::now();
    replica.set_value(0, SyncValue::U32(1)).unwrap();

    // changed, but the interval has not elapsed
    assert!(replica.has_changes());
    assert!(!replica.is_dirty(start));
    // the unconditional check ignores the gate; the gated one opens later
    assert!(replica.is_dirty(start + Duration::from_secs(1)));
}

#[test]
fn clear_all_works_regardless_of_elapsed_time() {
    let config = SyncConfig {
        sync_interval: Duration::from_secs(60),
    };
    let mut replica = Replica::new_authoritative(&player_layout(), &config);
    replica.set_value(0, SyncValue::U32(1)).unwrap();
    assert!(replica.has_changes());

    replica.clear_all_dirty_bits(Instant::now());
    assert!(!replica.has_changes());
    assert!(!replica.is_dirty(Instant::now() + Duration::from_secs(120)));
}

#[test]
fn clear_only_touches_given_bits() {
    let mut replica = Replica::new_authoritative(&player_layout(), &SyncConfig::immediate());
    replica.set_value(0, SyncValue::U32(1)).unwrap();
    replica
        .set_value(1, SyncValue::String("iris".to_string()))
        .unwrap();

    let mut synced = DirtyMask::new();
    synced.set_bit(0);
    replica.clear_dirty_bits(synced, Instant::now());

    assert!(!replica.dirty_mask().bit(0));
    assert!(replica.dirty_mask().bit(1));
    assert!(replica.has_changes());
}

#[test]
fn delta_eligibility_requires_an_observer() {
    let layout = player_layout();
    let mut entity = Entity::new(7, true);
    let index = entity.attach(&layout, &SyncConfig::immediate()).unwrap();
    entity
        .component_mut(index)
        .unwrap()
        .set_value(0, SyncValue::U32(10))
        .unwrap();

    let now = Instant::now();
    assert!(!entity.delta_eligible(index, now));

    entity.add_observer(42);
    assert!(entity.delta_eligible(index, now));

    entity.remove_observer(42);
    assert!(!entity.delta_eligible(index, now));
}

#[test]
fn component_indices_are_bounded_to_one_wire_byte() {
    let layout = player_layout();
    let mut entity = Entity::new(3, true);
    for expected in 0..=255u16 {
        let index = entity.attach(&layout, &SyncConfig::immediate()).unwrap();
        assert_eq!(u16::from(index), expected);
    }
    // a 257th component would wrap the one-byte index and collide
    assert_eq!(
        entity.attach(&layout, &SyncConfig::immediate()).unwrap_err(),
        EntityError::TooManyComponents { id: 3 }
    );
    assert_eq!(entity.component_count(), 256);
}

#[test]
fn derived_layout_continues_slot_numbering() {
    let base = LayoutBuilder::new("Unit")
        .field("position", FieldCategory::Value(ValueKind::F32))
        .field("rotation", FieldCategory::Value(ValueKind::F32))
        .build()
        .unwrap();
    let derived = Arc::new(
        LayoutBuilder::extending("Soldier", &base)
            .field("ammo", FieldCategory::Value(ValueKind::U16))
            .build()
            .unwrap(),
    );

    assert_eq!(derived.slot_of("position"), Some(0));
    assert_eq!(derived.slot_of("ammo"), Some(2));

    let mut replica = Replica::new_authoritative(&derived, &SyncConfig::immediate());
    replica.set_value(2, SyncValue::U16(30)).unwrap();
    assert!(replica.dirty_mask().bit(2));
    assert!(!replica.dirty_mask().bit(0));
}

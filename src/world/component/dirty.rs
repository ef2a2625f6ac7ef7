use std::time::Instant;

use crate::world::config::SyncConfig;

/// Maximum number of synchronized fields per Component. The dirty mask is a
/// single u64, one bit per field slot.
pub const MAX_SYNC_FIELDS: u8 = 64;

/// Bounded per-Component bitmask: bit N set means field slot N changed since
/// the last clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyMask {
    bits: u64,
}

impl DirtyMask {
    pub fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    pub fn to_bits(self) -> u64 {
        self.bits
    }

    pub fn set_bit(&mut self, slot: u8) {
        self.bits |= 1u64 << slot;
    }

    pub fn bit(&self, slot: u8) -> bool {
        self.bits & (1u64 << slot) != 0
    }

    pub fn or(&mut self, other: DirtyMask) {
        self.bits |= other.bits;
    }

    /// Clears only the bits set in `other`.
    pub fn clear_bits(&mut self, other: DirtyMask) {
        self.bits &= !other.bits;
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }

    pub fn is_clear(&self) -> bool {
        self.bits == 0
    }
}

/// Couples a Component's dirty mask with its sync-interval gate. The tick
/// loop supplies `now`; this is an elapsed-time check, not a scheduler.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    mask: DirtyMask,
    last_sync: Instant,
    config: SyncConfig,
}

impl DirtyTracker {
    pub fn new(config: &SyncConfig, now: Instant) -> Self {
        Self {
            mask: DirtyMask::new(),
            last_sync: now,
            config: config.clone(),
        }
    }

    pub fn mask(&self) -> DirtyMask {
        self.mask
    }

    pub fn mark(&mut self, slot: u8) {
        self.mask.set_bit(slot);
    }

    /// Interval-gated dirty check: true iff anything changed AND the sync
    /// interval has elapsed since the last flush.
    pub fn is_dirty(&self, now: Instant) -> bool {
        !self.mask.is_clear() && now.duration_since(self.last_sync) >= self.config.sync_interval
    }

    /// Unconditional check, ignoring the interval gate.
    pub fn has_changes(&self) -> bool {
        !self.mask.is_clear()
    }

    /// Clears only the given bits (the ones just serialized) and restarts
    /// the interval.
    pub fn clear(&mut self, synced: DirtyMask, now: Instant) {
        self.mask.clear_bits(synced);
        self.last_sync = now;
    }

    /// Zeroes the whole mask regardless of elapsed time.
    pub fn clear_all(&mut self, now: Instant) {
        self.mask.clear();
        self.last_sync = now;
    }
}

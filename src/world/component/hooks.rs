use std::sync::{Arc, RwLock};

use crate::world::component::{replica::Replica, value::FieldValue};

/// A bound change-notification callback. Receives the owning Replica plus
/// the snapshotted (old, new) field values, in that order.
pub type ChangeHook = Arc<dyn Fn(&mut Replica, &FieldValue, &FieldValue) + Send + Sync>;

/// Per-Component reentrancy guard, one bit per dirty-bit slot. Holding a
/// bit while a hook runs suppresses nested dispatch for the same slot,
/// which matters when one process is both authority and observer.
#[derive(Clone)]
pub struct HookGuard {
    bits: Arc<RwLock<u64>>,
}

impl HookGuard {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(RwLock::new(0)),
        }
    }

    pub fn is_held(&self, slot: u8) -> bool {
        let Ok(bits) = self.bits.as_ref().read() else {
            panic!("hook guard lock poisoned");
        };
        *bits & (1u64 << slot) != 0
    }

    /// Acquires the guard bit for `slot`, or returns `None` if it is
    /// already held (reentrant dispatch). The bit is released when the
    /// returned scope drops, on every exit path.
    pub fn try_hold(&self, slot: u8) -> Option<HeldGuard> {
        let Ok(mut bits) = self.bits.as_ref().write() else {
            panic!("hook guard lock poisoned");
        };
        let bit = 1u64 << slot;
        if *bits & bit != 0 {
            return None;
        }
        *bits |= bit;
        Some(HeldGuard {
            bits: self.bits.clone(),
            bit,
        })
    }
}

impl Default for HookGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped acquisition of one guard bit. Dropping clears the bit, so a
/// panicking hook can never leave the guard permanently set.
pub struct HeldGuard {
    bits: Arc<RwLock<u64>>,
    bit: u64,
}

impl Drop for HeldGuard {
    fn drop(&mut self) {
        // Clear even through a poisoned lock: drop may run during a panic
        // unwind out of the hook itself.
        let mut bits = match self.bits.as_ref().write() {
            Ok(bits) => bits,
            Err(poisoned) => poisoned.into_inner(),
        };
        *bits &= !self.bit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_and_release() {
        let guard = HookGuard::new();
        assert!(!guard.is_held(7));
        {
            let held = guard.try_hold(7);
            assert!(held.is_some());
            assert!(guard.is_held(7));
            // other slots are unaffected
            assert!(guard.try_hold(8).is_some());
        }
        assert!(!guard.is_held(7));
    }

    #[test]
    fn second_hold_is_refused() {
        let guard = HookGuard::new();
        let _held = guard.try_hold(0).unwrap();
        assert!(guard.try_hold(0).is_none());
    }
}

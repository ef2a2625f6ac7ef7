use std::time::Duration;

/// Per-component sync tuning. The interval gates how often a dirty
/// component is eligible for delta emission; the tick loop supplies the
/// clock and decides when to ask.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Minimum time between delta flushes of one component.
    pub sync_interval: Duration,
}

impl SyncConfig {
    /// No throttling: a dirty component is always eligible.
    pub fn immediate() -> Self {
        Self {
            sync_interval: Duration::ZERO,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_millis(100),
        }
    }
}

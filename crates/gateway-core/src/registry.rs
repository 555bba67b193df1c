//! The rollapp registry seam.
//!
//! The registry is the external collaborator that knows which channels lead
//! to tracked rollapps and which heights their light-client mechanism has
//! declared final. The gateway only queries it; finality advancement is
//! driven from the registry side by calling into the finalization applier.

use std::collections::{BTreeMap, BTreeSet};

/// A tracked rollapp, as resolved from a channel end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollappInfo {
    pub rollapp_id: String,
    /// Designated owner/creator of the rollapp.
    pub owner: String,
}

/// Registry of tracked rollapps and their finalized heights.
pub trait RollappRegistry {
    /// Resolve the rollapp behind a channel end, if the channel leads to a
    /// tracked rollapp.
    fn rollapp_for_channel(&self, port: &str, channel: &str) -> Option<RollappInfo>;

    /// Whether `height` has been irreversibly finalized for the rollapp.
    fn is_height_finalized(&self, rollapp_id: &str, height: u64) -> bool;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// In-memory registry for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    /// (port, channel) -> rollapp info.
    channels: BTreeMap<(String, String), RollappInfo>,
    /// rollapp_id -> latest finalized height.
    finalized_heights: BTreeMap<String, u64>,
    /// Rollapps known to the registry even before any height finalizes.
    rollapps: BTreeSet<String>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rollapp behind a channel end.
    pub fn track_rollapp(&mut self, port: &str, channel: &str, rollapp_id: &str, owner: &str) {
        self.channels.insert(
            (port.to_string(), channel.to_string()),
            RollappInfo {
                rollapp_id: rollapp_id.to_string(),
                owner: owner.to_string(),
            },
        );
        self.rollapps.insert(rollapp_id.to_string());
    }

    /// Record that the rollapp finalized up to `height`.
    pub fn advance_finalized_height(&mut self, rollapp_id: &str, height: u64) {
        let entry = self
            .finalized_heights
            .entry(rollapp_id.to_string())
            .or_insert(0);
        if height > *entry {
            *entry = height;
        }
    }

    /// Latest finalized height, if any state update has finalized.
    pub fn latest_finalized_height(&self, rollapp_id: &str) -> Option<u64> {
        self.finalized_heights.get(rollapp_id).copied()
    }
}

impl RollappRegistry for InMemoryRegistry {
    fn rollapp_for_channel(&self, port: &str, channel: &str) -> Option<RollappInfo> {
        self.channels
            .get(&(port.to_string(), channel.to_string()))
            .cloned()
    }

    fn is_height_finalized(&self, rollapp_id: &str, height: u64) -> bool {
        self.finalized_heights
            .get(rollapp_id)
            .is_some_and(|latest| *latest >= height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_resolution() {
        let mut registry = InMemoryRegistry::new();
        registry.track_rollapp("transfer", "channel-7", "rollapp_1", "dym1owner");

        let info = registry
            .rollapp_for_channel("transfer", "channel-7")
            .expect("tracked channel");
        assert_eq!(info.rollapp_id, "rollapp_1");
        assert!(registry.rollapp_for_channel("transfer", "channel-8").is_none());
    }

    #[test]
    fn test_finalized_height_is_monotonic() {
        let mut registry = InMemoryRegistry::new();
        registry.track_rollapp("transfer", "channel-7", "rollapp_1", "dym1owner");

        assert!(!registry.is_height_finalized("rollapp_1", 1));
        registry.advance_finalized_height("rollapp_1", 10);
        registry.advance_finalized_height("rollapp_1", 5); // no-op
        assert!(registry.is_height_finalized("rollapp_1", 10));
        assert!(!registry.is_height_finalized("rollapp_1", 11));
        assert_eq!(registry.latest_finalized_height("rollapp_1"), Some(10));
    }
}

//! The epoch pruner: bounded deletion of finalized records on an external
//! epoch clock.
//!
//! The pruner reacts only to ticks carrying its configured epoch
//! identifier. A single pass deletes at most `delete_packets_epoch_limit`
//! finalized records, oldest proof height first, so the per-tick cost stays
//! predictable against an unbounded backlog. Pending and reverted records
//! are never pruned.

use tracing::{debug, info};

use gateway_types::packet::PacketStatus;

use crate::errors::GatewayError;
use crate::params::GatewayParams;
use crate::store::PacketStore;

/// Deletes finalized records on matching epoch ticks.
#[derive(Debug, Clone)]
pub struct EpochPruner {
    params: GatewayParams,
}

impl EpochPruner {
    /// Create a pruner with the given parameters.
    pub fn new(params: GatewayParams) -> Self {
        Self { params }
    }

    /// Handle an epoch tick.
    ///
    /// Returns the number of records deleted. A tick with a non-matching
    /// identifier deletes nothing. The first deletion error aborts the
    /// remainder of the pass; deletions already performed stand.
    pub fn after_epoch_end(
        &self,
        store: &mut PacketStore,
        epoch_identifier: &str,
        epoch_number: u64,
    ) -> Result<usize, GatewayError> {
        if epoch_identifier != self.params.epoch_identifier {
            debug!(
                epoch_identifier,
                expected = %self.params.epoch_identifier,
                "ignoring epoch tick"
            );
            return Ok(0);
        }

        let limit = self.params.delete_packets_epoch_limit as usize;
        let mut batch = store.list_by_status_global(PacketStatus::Finalized);
        batch.truncate(limit);

        let mut deleted = 0usize;
        for record in &batch {
            store.remove(&record.key())?;
            deleted += 1;
        }

        info!(
            epoch_identifier,
            epoch_number, deleted, "pruned finalized packets"
        );
        Ok(deleted)
    }
}

//! The finalization applier: moves pending records to their terminal
//! status when a rollapp advances its finalized height (or rolls back).
//!
//! Each record is an independent unit of work. A failure applying one
//! record's deferred effect is reported in that record's outcome and leaves
//! it `Pending` for retry on the next finality notification; sibling
//! records are unaffected. Calling the applier again for the same height is
//! a no-op for records that already reached a terminal status.

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use gateway_types::packet::{EventType, PacketKey, PacketRecord, PacketStatus};

use crate::executor::try_commit;
use crate::metrics::GatewayMetrics;
use crate::module::TransferModule;
use crate::store::PacketStore;

/// Applies the deferred effect of a finalized packet.
///
/// The hook runs before the status transition: a hook failure leaves the
/// record `Pending` with no index churn, so retry is idempotent by
/// construction.
pub trait FinalizeHook {
    fn on_packet_finalized(&mut self, record: &PacketRecord) -> Result<()>;
}

/// Per-record result of a finalization or revert pass.
#[derive(Debug, Clone)]
pub struct FinalizationOutcome {
    pub key: PacketKey,
    pub old_status: PacketStatus,
    /// Status after the pass. Equals `old_status` when the hook failed.
    pub new_status: PacketStatus,
    /// Hook or store failure, if any.
    pub error: Option<String>,
}

impl FinalizationOutcome {
    /// Whether this record reached the intended terminal status.
    pub fn transitioned(&self) -> bool {
        self.error.is_none() && self.new_status != self.old_status
    }
}

/// Finalize every pending record of `rollapp_id` whose proof height is at
/// or below `finalized_height`.
pub fn finalize_pending<H: FinalizeHook>(
    store: &mut PacketStore,
    hook: &mut H,
    rollapp_id: &str,
    finalized_height: u64,
    metrics: &GatewayMetrics,
) -> Vec<FinalizationOutcome> {
    let candidates: Vec<PacketRecord> = store
        .list_by_status(rollapp_id, PacketStatus::Pending)
        .into_iter()
        .filter(|r| r.proof_height <= finalized_height)
        .collect();

    debug!(
        rollapp_id,
        finalized_height,
        candidates = candidates.len(),
        "finalizing pending packets"
    );

    let mut outcomes = Vec::with_capacity(candidates.len());
    for record in candidates {
        let key = record.key();
        let outcome = match hook.on_packet_finalized(&record) {
            Ok(()) => match store.update_status(&key, PacketStatus::Finalized) {
                Ok(transition) => FinalizationOutcome {
                    key,
                    old_status: transition.old_status,
                    new_status: transition.new_status,
                    error: None,
                },
                Err(e) => FinalizationOutcome {
                    key,
                    old_status: record.status,
                    new_status: record.status,
                    error: Some(e.to_string()),
                },
            },
            Err(e) => {
                warn!(key = %key, err = %e, "finalize hook failed; packet stays pending");
                metrics.record_finalize_failure();
                FinalizationOutcome {
                    key,
                    old_status: record.status,
                    new_status: record.status,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let finalized = outcomes.iter().filter(|o| o.transitioned()).count();
    metrics.record_finalized(finalized as u64);
    outcomes
}

/// Revert every pending record of `rollapp_id`.
///
/// Invoked when a rollapp state update is rolled back; a reverted packet
/// has no deferred effect to apply, so no hook runs.
pub fn revert_pending(
    store: &mut PacketStore,
    rollapp_id: &str,
    metrics: &GatewayMetrics,
) -> Vec<FinalizationOutcome> {
    let candidates = store.list_by_status(rollapp_id, PacketStatus::Pending);
    debug!(rollapp_id, candidates = candidates.len(), "reverting pending packets");

    let mut outcomes = Vec::with_capacity(candidates.len());
    for record in candidates {
        let key = record.key();
        let outcome = match store.update_status(&key, PacketStatus::Reverted) {
            Ok(transition) => FinalizationOutcome {
                key,
                old_status: transition.old_status,
                new_status: transition.new_status,
                error: None,
            },
            Err(e) => FinalizationOutcome {
                key,
                old_status: record.status,
                new_status: record.status,
                error: Some(e.to_string()),
            },
        };
        outcomes.push(outcome);
    }

    let reverted = outcomes.iter().filter(|o| o.transitioned()).count();
    metrics.record_reverted(reverted as u64);
    outcomes
}

// ============================================================================
// Hook Implementations
// ============================================================================

/// Hook that applies no deferred effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFinalizeHook;

impl FinalizeHook for NoopFinalizeHook {
    fn on_packet_finalized(&mut self, _record: &PacketRecord) -> Result<()> {
        Ok(())
    }
}

/// Hook that re-invokes the wrapped transfer module, committing its effects
/// this time.
///
/// This is the reference consumer for finalized records: the same handler
/// that was try-executed at interception runs again against the module's
/// committed state, promoted on success and discarded on failure.
pub struct ReplayFinalizeHook<'a, M: TransferModule> {
    module: &'a mut M,
}

impl<'a, M: TransferModule> ReplayFinalizeHook<'a, M> {
    pub fn new(module: &'a mut M) -> Self {
        Self { module }
    }
}

impl<M: TransferModule> FinalizeHook for ReplayFinalizeHook<'_, M> {
    fn on_packet_finalized(&mut self, record: &PacketRecord) -> Result<()> {
        try_commit(self.module, |module| match record.event_type {
            EventType::OnRecv => {
                let ack = module.on_recv(&record.envelope, &record.relayer)?;
                if !ack.success() {
                    return Err(anyhow!("wrapped handler rejected finalized packet"));
                }
                Ok(())
            }
            EventType::OnAck => {
                let ack = record
                    .acknowledgement
                    .as_deref()
                    .ok_or_else(|| anyhow!("ack record without acknowledgement bytes"))?;
                module.on_ack(&record.envelope, ack, &record.relayer)
            }
            EventType::OnTimeout => module.on_timeout(&record.envelope, &record.relayer),
        })
    }
}

/// Hook that records finalized keys, with scripted per-key failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingFinalizeHook {
    /// Keys for which the hook succeeded.
    pub finalized: Vec<PacketKey>,
    /// Keys the hook should fail for.
    pub fail_keys: Vec<PacketKey>,
}

impl RecordingFinalizeHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FinalizeHook for RecordingFinalizeHook {
    fn on_packet_finalized(&mut self, record: &PacketRecord) -> Result<()> {
        let key = record.key();
        if self.fail_keys.contains(&key) {
            return Err(anyhow!("scripted hook failure for {}", key));
        }
        self.finalized.push(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::packet::PacketEnvelope;
    use gateway_types::transfer::TransferPayload;

    fn record(sequence: u64, proof_height: u64) -> PacketRecord {
        PacketRecord {
            rollapp_id: "rollapp_1".to_string(),
            envelope: PacketEnvelope {
                source_port: "transfer".to_string(),
                source_channel: "channel-0".to_string(),
                dest_port: "transfer".to_string(),
                dest_channel: "channel-7".to_string(),
                sequence,
                data: TransferPayload {
                    denom: "adym".to_string(),
                    amount: "100".to_string(),
                    sender: "dym1sender".to_string(),
                    receiver: "dym1receiver".to_string(),
                    memo: None,
                }
                .to_bytes()
                .expect("encode payload"),
            },
            acknowledgement: None,
            status: PacketStatus::Pending,
            relayer: "relayer-a".to_string(),
            proof_height,
            event_type: EventType::OnRecv,
        }
    }

    #[test]
    fn test_finalize_respects_proof_height() {
        let mut store = PacketStore::new();
        for i in 1..=4 {
            store.insert(record(i, i * 10)).expect("insert");
        }
        let metrics = GatewayMetrics::new();
        let mut hook = NoopFinalizeHook;

        let outcomes = finalize_pending(&mut store, &mut hook, "rollapp_1", 20, &metrics);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.transitioned()));
        assert_eq!(
            store.list_by_status("rollapp_1", PacketStatus::Finalized).len(),
            2
        );
        assert_eq!(
            store.list_by_status("rollapp_1", PacketStatus::Pending).len(),
            2
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut store = PacketStore::new();
        store.insert(record(1, 10)).expect("insert");
        let metrics = GatewayMetrics::new();
        let mut hook = NoopFinalizeHook;

        finalize_pending(&mut store, &mut hook, "rollapp_1", 10, &metrics);
        let second = finalize_pending(&mut store, &mut hook, "rollapp_1", 10, &metrics);
        assert!(second.is_empty());
        assert_eq!(
            store.list_by_status("rollapp_1", PacketStatus::Finalized).len(),
            1
        );
        assert_eq!(metrics.snapshot().packets_finalized, 1);
    }

    #[test]
    fn test_hook_failure_leaves_record_pending() {
        let mut store = PacketStore::new();
        let failing = record(1, 10);
        let failing_key = failing.key();
        store.insert(failing).expect("insert");
        store.insert(record(2, 10)).expect("insert");

        let metrics = GatewayMetrics::new();
        let mut hook = RecordingFinalizeHook {
            finalized: Vec::new(),
            fail_keys: vec![failing_key.clone()],
        };

        let outcomes = finalize_pending(&mut store, &mut hook, "rollapp_1", 10, &metrics);
        assert_eq!(outcomes.len(), 2);
        let failed = outcomes.iter().find(|o| o.key == failing_key).expect("outcome");
        assert!(!failed.transitioned());
        assert_eq!(failed.new_status, PacketStatus::Pending);

        // The sibling finalized; the failing record is retried next pass.
        assert_eq!(
            store.list_by_status("rollapp_1", PacketStatus::Pending).len(),
            1
        );
        let retry = finalize_pending(
            &mut store,
            &mut RecordingFinalizeHook::new(),
            "rollapp_1",
            10,
            &metrics,
        );
        assert_eq!(retry.len(), 1);
        assert!(retry[0].transitioned());
    }

    #[test]
    fn test_revert_moves_all_pending() {
        let mut store = PacketStore::new();
        store.insert(record(1, 10)).expect("insert");
        store.insert(record(2, 20)).expect("insert");
        let metrics = GatewayMetrics::new();

        let outcomes = revert_pending(&mut store, "rollapp_1", &metrics);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.transitioned()));
        assert_eq!(store.pending_index_len(), 0);
        assert_eq!(
            store.list_by_status("rollapp_1", PacketStatus::Reverted).len(),
            2
        );
        assert_eq!(metrics.snapshot().packets_reverted, 2);
    }

    #[test]
    fn test_replay_hook_commits_module_effects() {
        use crate::module::MockTransferModule;

        let mut store = PacketStore::new();
        store.insert(record(1, 10)).expect("insert");
        let metrics = GatewayMetrics::new();
        let mut module = MockTransferModule::new();

        {
            let mut hook = ReplayFinalizeHook::new(&mut module);
            let outcomes = finalize_pending(&mut store, &mut hook, "rollapp_1", 10, &metrics);
            assert!(outcomes[0].transitioned());
        }
        // This time the effect is committed, not discarded.
        assert_eq!(module.balance("dym1receiver"), 100);
    }
}

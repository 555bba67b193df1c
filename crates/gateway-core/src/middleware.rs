//! The finalization middleware: intercepts the three packet lifecycle
//! callbacks of the wrapped transfer module and defers each packet's
//! visible effect behind rollapp finality.
//!
//! Per callback the middleware:
//! 1. resolves the packet's transfer payload and target rollapp, failing
//!    fast with a structured error if either cannot be resolved;
//! 2. bypasses entirely when the target is not a tracked rollapp or the
//!    proof height is already finalized (fast path, zero extra state);
//! 3. otherwise try-executes the wrapped handler against discardable state
//!    and, only on success, persists a pending [`PacketRecord`] and hands
//!    the transfer to the settlement-order collaborator.
//!
//! Record creation and order creation are deliberately decoupled: a failing
//! order handler leaves the record in place and surfaces the failure to the
//! caller.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use gateway_types::encoding::short_hex;
use gateway_types::packet::{EventType, PacketEnvelope, PacketKey, PacketRecord, PacketStatus};
use gateway_types::transfer::{Acknowledgement, TransferPayload};

use crate::applier::{self, FinalizationOutcome, ReplayFinalizeHook};
use crate::errors::GatewayError;
use crate::executor::try_execute;
use crate::metrics::GatewayMetrics;
use crate::module::TransferModule;
use crate::orders::OrderHandler;
use crate::params::GatewayParams;
use crate::pruner::EpochPruner;
use crate::registry::{RollappInfo, RollappRegistry};
use crate::state::{self, StateMetadata};
use crate::store::PacketStore;

/// Transfer metadata resolved from an envelope, plus finalization info.
#[derive(Debug, Clone)]
struct ValidatedTransfer {
    /// The tracked rollapp behind the packet's channel end, if any.
    rollapp: Option<RollappInfo>,
    payload: TransferPayload,
    /// Whether the proof height is already finalized for that rollapp.
    finalized: bool,
}

impl ValidatedTransfer {
    /// Fast path: not a rollapp packet, or its height already finalized.
    fn bypass(&self) -> bool {
        self.rollapp.is_none() || self.finalized
    }
}

/// The protocol interceptor. Owns the packet store and the three
/// collaborator seams; all dependencies are explicit constructor
/// parameters.
pub struct FinalizationMiddleware<M, R, O>
where
    M: TransferModule,
    R: RollappRegistry,
    O: OrderHandler,
{
    module: M,
    registry: R,
    orders: O,
    store: PacketStore,
    params: GatewayParams,
    metrics: GatewayMetrics,
}

impl<M, R, O> FinalizationMiddleware<M, R, O>
where
    M: TransferModule,
    R: RollappRegistry,
    O: OrderHandler,
{
    /// Create a middleware wrapping `module`, with validated params.
    pub fn new(module: M, registry: R, orders: O, params: GatewayParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            module,
            registry,
            orders,
            store: PacketStore::new(),
            params,
            metrics: GatewayMetrics::new(),
        })
    }

    // ========================================================================
    // Packet Callbacks
    // ========================================================================

    /// Handle an inbound packet.
    ///
    /// Returns `Ok(None)` when the packet was deferred behind finality (no
    /// synchronous acknowledgement goes back to the transport), or
    /// `Ok(Some(ack))` when an acknowledgement should be relayed now:
    /// either the fast-path result of the wrapped handler or an error
    /// acknowledgement. `Err` is an internal handler failure.
    pub fn on_recv_packet(
        &mut self,
        packet: &PacketEnvelope,
        relayer: &str,
        proof_height: u64,
    ) -> Result<Option<Acknowledgement>> {
        debug!(
            source_port = %packet.source_port,
            dest_port = %packet.dest_port,
            sequence = packet.sequence,
            proof_height,
            payload = %short_hex(&packet.data, 16),
            method = "on_recv_packet",
            "intercepted packet"
        );

        let transfer = match self.validated_transfer(packet, EventType::OnRecv, proof_height) {
            Ok(transfer) => transfer,
            Err(e) => {
                warn!(err = %e, method = "on_recv_packet", "rejecting packet");
                return Ok(Some(Acknowledgement::error(e.to_string())));
            }
        };

        if transfer.bypass() {
            self.metrics.record_bypassed();
            let ack = self.module.on_recv(packet, relayer)?;
            return Ok(Some(ack));
        }

        // Run the wrapped handler against discardable state and only keep
        // the packet if it succeeds. Its effects are re-derived at
        // finalization; nothing is committed here.
        let ack = try_execute(&mut self.module, |m| m.on_recv(packet, relayer))?;
        if !ack.success() {
            self.metrics.record_rejected();
            return Ok(Some(ack));
        }

        let rollapp_id = transfer.rollapp.as_ref().map(|r| r.rollapp_id.clone());
        let record = self.save_packet(
            packet,
            rollapp_id.unwrap_or_default(),
            relayer,
            EventType::OnRecv,
            None,
            proof_height,
        )?;

        // A pending receive entitles the receiver to a settlement claim.
        if let Err(e) = self.orders.create_order(&record, &transfer.payload) {
            self.metrics.record_order_failure();
            let err = GatewayError::OrderCreation {
                key: record.key(),
                reason: e.to_string(),
            };
            warn!(err = %err, "order creation failed; record stands");
            return Ok(Some(Acknowledgement::error(err.to_string())));
        }

        self.metrics.record_deferred();
        Ok(None)
    }

    /// Handle an acknowledgement for a packet this chain sent.
    pub fn on_ack_packet(
        &mut self,
        packet: &PacketEnvelope,
        ack_bytes: &[u8],
        relayer: &str,
        proof_height: u64,
    ) -> Result<()> {
        debug!(
            source_port = %packet.source_port,
            dest_port = %packet.dest_port,
            sequence = packet.sequence,
            proof_height,
            method = "on_ack_packet",
            "intercepted acknowledgement"
        );

        let acknowledgement = Acknowledgement::from_bytes(ack_bytes).map_err(|e| {
            GatewayError::MalformedAcknowledgement {
                reason: e.to_string(),
            }
        })?;
        let transfer = self.validated_transfer(packet, EventType::OnAck, proof_height)?;

        if transfer.bypass() {
            self.metrics.record_bypassed();
            return self.module.on_ack(packet, ack_bytes, relayer);
        }

        try_execute(&mut self.module, |m| m.on_ack(packet, ack_bytes, relayer))?;

        let rollapp_id = transfer.rollapp.as_ref().map(|r| r.rollapp_id.clone());
        let record = self.save_packet(
            packet,
            rollapp_id.unwrap_or_default(),
            relayer,
            EventType::OnAck,
            Some(ack_bytes.to_vec()),
            proof_height,
        )?;

        // Only an error acknowledgement is an adverse outcome for the
        // original sender; a success ack needs no settlement claim.
        if !acknowledgement.success() {
            if let Err(e) = self.orders.create_order(&record, &transfer.payload) {
                self.metrics.record_order_failure();
                let err = GatewayError::OrderCreation {
                    key: record.key(),
                    reason: e.to_string(),
                };
                warn!(err = %err, "order creation failed; record stands");
                return Err(err.into());
            }
        }

        self.metrics.record_deferred();
        Ok(())
    }

    /// Handle a timeout for a packet this chain sent.
    pub fn on_timeout_packet(
        &mut self,
        packet: &PacketEnvelope,
        relayer: &str,
        proof_height: u64,
    ) -> Result<()> {
        debug!(
            source_port = %packet.source_port,
            dest_port = %packet.dest_port,
            sequence = packet.sequence,
            proof_height,
            method = "on_timeout_packet",
            "intercepted timeout"
        );

        let transfer = self.validated_transfer(packet, EventType::OnTimeout, proof_height)?;

        if transfer.bypass() {
            self.metrics.record_bypassed();
            return self.module.on_timeout(packet, relayer);
        }

        try_execute(&mut self.module, |m| m.on_timeout(packet, relayer))?;

        let rollapp_id = transfer.rollapp.as_ref().map(|r| r.rollapp_id.clone());
        let record = self.save_packet(
            packet,
            rollapp_id.unwrap_or_default(),
            relayer,
            EventType::OnTimeout,
            None,
            proof_height,
        )?;

        // Timeout is inherently an adverse outcome; always create an order.
        if let Err(e) = self.orders.create_order(&record, &transfer.payload) {
            self.metrics.record_order_failure();
            let err = GatewayError::OrderCreation {
                key: record.key(),
                reason: e.to_string(),
            };
            warn!(err = %err, "order creation failed; record stands");
            return Err(err.into());
        }

        self.metrics.record_deferred();
        Ok(())
    }

    // ========================================================================
    // Finality and Epoch Entry Points
    // ========================================================================

    /// Called by the registry collaborator when `rollapp_id` finalizes up
    /// to `finalized_height`. Re-invokes the wrapped module per record,
    /// committing effects this time.
    pub fn finalize_rollapp(
        &mut self,
        rollapp_id: &str,
        finalized_height: u64,
    ) -> Vec<FinalizationOutcome> {
        let mut hook = ReplayFinalizeHook::new(&mut self.module);
        applier::finalize_pending(
            &mut self.store,
            &mut hook,
            rollapp_id,
            finalized_height,
            &self.metrics,
        )
    }

    /// Called when a rollapp state update is rolled back: every pending
    /// record of the rollapp becomes reverted.
    pub fn revert_rollapp(&mut self, rollapp_id: &str) -> Vec<FinalizationOutcome> {
        applier::revert_pending(&mut self.store, rollapp_id, &self.metrics)
    }

    /// Handle an external epoch tick; prunes finalized records when the
    /// identifier matches the configured one.
    pub fn handle_epoch_end(&mut self, epoch_identifier: &str, epoch_number: u64) -> Result<usize> {
        let pruner = EpochPruner::new(self.params.clone());
        let deleted = pruner.after_epoch_end(&mut self.store, epoch_identifier, epoch_number)?;
        self.metrics.record_pruned(deleted as u64);
        Ok(deleted)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Keys of pending packets indexed under the given party address.
    pub fn pending_packets_by_address(&self, address: &str) -> Vec<PacketKey> {
        self.store.list_pending_by_address(address)
    }

    /// Records of one rollapp in the given status, ascending by proof
    /// height then sequence.
    pub fn packets_by_rollapp_status(
        &self,
        rollapp_id: &str,
        status: PacketStatus,
    ) -> Vec<PacketRecord> {
        self.store.list_by_status(rollapp_id, status)
    }

    // ========================================================================
    // State Persistence
    // ========================================================================

    /// Save the store and params to a state file. Collaborators are
    /// runtime-only and not persisted.
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<()> {
        let persistent = state::export_state(&self.store, &self.params, StateMetadata::now())?;
        persistent.save(path)
    }

    /// Load store and params from a state file, replacing current contents.
    pub fn load_state(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let persistent = state::PersistentGatewayState::load(path)?;
        let (store, params) = persistent.restore()?;
        params.validate()?;
        self.store = store;
        self.params = params;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The packet record store.
    pub fn store(&self) -> &PacketStore {
        &self.store
    }

    /// The wrapped transfer module.
    pub fn module(&self) -> &M {
        &self.module
    }

    /// Mutable access to the wrapped transfer module (test setup).
    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    /// The rollapp registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Mutable access to the registry (finality advancement in tests).
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// The settlement-order collaborator.
    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Mutable access to the order collaborator (test setup).
    pub fn orders_mut(&mut self) -> &mut O {
        &mut self.orders
    }

    /// Current parameters.
    pub fn params(&self) -> &GatewayParams {
        &self.params
    }

    /// Operation metrics.
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// The channel end identifying the rollapp: the destination for
    /// inbound packets, the source for packets this chain sent.
    fn rollapp_channel_end<'p>(
        packet: &'p PacketEnvelope,
        event_type: EventType,
    ) -> (&'p str, &'p str) {
        match event_type {
            EventType::OnRecv => (&packet.dest_port, &packet.dest_channel),
            EventType::OnAck | EventType::OnTimeout => {
                (&packet.source_port, &packet.source_channel)
            }
        }
    }

    fn validated_transfer(
        &self,
        packet: &PacketEnvelope,
        event_type: EventType,
        proof_height: u64,
    ) -> Result<ValidatedTransfer, GatewayError> {
        let payload = TransferPayload::from_bytes(&packet.data).map_err(|e| {
            GatewayError::MalformedTransferData {
                reason: e.to_string(),
            }
        })?;

        let (port, channel) = Self::rollapp_channel_end(packet, event_type);
        let rollapp = self.registry.rollapp_for_channel(port, channel);
        let finalized = rollapp
            .as_ref()
            .is_some_and(|r| self.registry.is_height_finalized(&r.rollapp_id, proof_height));

        Ok(ValidatedTransfer {
            rollapp,
            payload,
            finalized,
        })
    }

    /// Persist a pending record and its address-index entry.
    fn save_packet(
        &mut self,
        packet: &PacketEnvelope,
        rollapp_id: String,
        relayer: &str,
        event_type: EventType,
        acknowledgement: Option<Vec<u8>>,
        proof_height: u64,
    ) -> Result<PacketRecord> {
        let record = PacketRecord {
            rollapp_id,
            envelope: packet.clone(),
            acknowledgement,
            status: PacketStatus::Pending,
            relayer: relayer.to_string(),
            proof_height,
            event_type,
        };
        self.store.insert(record.clone())?;
        debug!(key = %record.key(), proof_height, "saved pending packet");
        Ok(record)
    }
}

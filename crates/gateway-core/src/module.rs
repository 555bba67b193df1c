//! The wrapped transfer module seam.
//!
//! [`TransferModule`] is the downstream protocol application the gateway
//! wraps: it owns its own state and exposes the three packet lifecycle
//! callbacks. It must also implement [`SpeculativeState`] so the gateway
//! can try-execute callbacks without committing their effects.
//!
//! [`MockTransferModule`] is an in-memory reference implementation with a
//! toy balance table, used by the test suites and available to embedders.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

use gateway_types::packet::PacketEnvelope;
use gateway_types::transfer::{Acknowledgement, TransferPayload};

use crate::executor::SpeculativeState;

/// The wrapped protocol application.
pub trait TransferModule: SpeculativeState {
    /// Handle an inbound packet. Returns the acknowledgement to relay; an
    /// error acknowledgement signals application-level rejection. `Err` is
    /// an internal handler failure and propagates verbatim.
    fn on_recv(&mut self, packet: &PacketEnvelope, relayer: &str) -> Result<Acknowledgement>;

    /// Handle an acknowledgement for a packet this chain sent.
    fn on_ack(&mut self, packet: &PacketEnvelope, ack: &[u8], relayer: &str) -> Result<()>;

    /// Handle a timeout for a packet this chain sent.
    fn on_timeout(&mut self, packet: &PacketEnvelope, relayer: &str) -> Result<()>;
}

// ============================================================================
// Mock Implementation
// ============================================================================

/// In-memory transfer module with a toy balance table.
///
/// Receive credits the receiver; error-acks and timeouts refund the sender.
/// Failure knobs let tests script rejections and internal errors. Call
/// counters are diagnostic and deliberately survive checkpoint restore, so
/// tests can assert a callback ran even though its effects were discarded.
#[derive(Debug, Default)]
pub struct MockTransferModule {
    /// address -> balance.
    balances: BTreeMap<String, u64>,
    /// When set, `on_recv` returns an error acknowledgement.
    pub reject_recv: bool,
    /// When set, `on_ack` returns an internal error.
    pub fail_ack: bool,
    /// When set, `on_timeout` returns an internal error.
    pub fail_timeout: bool,
    /// Number of `on_recv` invocations (survives restore).
    pub recv_calls: usize,
    /// Number of `on_ack` invocations (survives restore).
    pub ack_calls: usize,
    /// Number of `on_timeout` invocations (survives restore).
    pub timeout_calls: usize,
}

impl MockTransferModule {
    /// Create an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of an address.
    pub fn balance(&self, address: &str) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Seed a balance (test setup).
    pub fn set_balance(&mut self, address: &str, amount: u64) {
        self.balances.insert(address.to_string(), amount);
    }

    fn parse_amount(payload: &TransferPayload) -> Result<u64> {
        payload
            .amount
            .parse::<u64>()
            .map_err(|e| anyhow!("Invalid transfer amount '{}': {}", payload.amount, e))
    }

    fn credit(&mut self, address: &str, amount: u64) {
        *self.balances.entry(address.to_string()).or_insert(0) += amount;
    }
}

impl SpeculativeState for MockTransferModule {
    type Checkpoint = BTreeMap<String, u64>;

    fn checkpoint(&self) -> Self::Checkpoint {
        self.balances.clone()
    }

    fn restore(&mut self, checkpoint: Self::Checkpoint) {
        self.balances = checkpoint;
    }
}

impl TransferModule for MockTransferModule {
    fn on_recv(&mut self, packet: &PacketEnvelope, _relayer: &str) -> Result<Acknowledgement> {
        self.recv_calls += 1;
        if self.reject_recv {
            return Ok(Acknowledgement::error("transfer rejected"));
        }
        let payload = TransferPayload::from_bytes(&packet.data)?;
        let amount = match Self::parse_amount(&payload) {
            Ok(amount) => amount,
            Err(e) => return Ok(Acknowledgement::error(e.to_string())),
        };
        self.credit(&payload.receiver, amount);
        Ok(Acknowledgement::result(vec![1]))
    }

    fn on_ack(&mut self, packet: &PacketEnvelope, ack: &[u8], _relayer: &str) -> Result<()> {
        self.ack_calls += 1;
        if self.fail_ack {
            return Err(anyhow!("mock ack handler failure"));
        }
        let acknowledgement = Acknowledgement::from_bytes(ack)?;
        if !acknowledgement.success() {
            // The counterparty rejected the transfer; refund the sender.
            let payload = TransferPayload::from_bytes(&packet.data)?;
            let amount = Self::parse_amount(&payload)?;
            self.credit(&payload.sender, amount);
        }
        Ok(())
    }

    fn on_timeout(&mut self, packet: &PacketEnvelope, _relayer: &str) -> Result<()> {
        self.timeout_calls += 1;
        if self.fail_timeout {
            return Err(anyhow!("mock timeout handler failure"));
        }
        let payload = TransferPayload::from_bytes(&packet.data)?;
        let amount = Self::parse_amount(&payload)?;
        self.credit(&payload.sender, amount);
        Ok(())
    }
}

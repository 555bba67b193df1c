//! The settlement-order collaborator seam.
//!
//! Whenever a deferred packet represents an adverse outcome for a party
//! (pending receive, error acknowledgement, timeout), the gateway hands the
//! record and its parsed transfer payload to an [`OrderHandler`], which is
//! responsible for creating a tradable claim entitling the affected party
//! to eventual settlement. The handler is a black box to the gateway.

use anyhow::{anyhow, Result};

use gateway_types::packet::{PacketKey, PacketRecord};
use gateway_types::transfer::TransferPayload;

/// Creates settlement claims for deferred packets.
pub trait OrderHandler {
    /// Create an order for the given record. Best-effort: a failure here
    /// does not undo the record (see the middleware contract).
    fn create_order(&mut self, record: &PacketRecord, transfer: &TransferPayload) -> Result<()>;
}

/// Handler that accepts every order and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOrderHandler;

impl OrderHandler for NoopOrderHandler {
    fn create_order(&mut self, _record: &PacketRecord, _transfer: &TransferPayload) -> Result<()> {
        Ok(())
    }
}

/// Handler that records every order, with an optional scripted failure.
///
/// Used by the test suites to assert exactly-once order creation.
#[derive(Debug, Clone, Default)]
pub struct RecordingOrderHandler {
    /// Orders created so far: (record key, payload).
    pub orders: Vec<(PacketKey, TransferPayload)>,
    /// When set, every `create_order` call fails with this message.
    pub fail_with: Option<String>,
}

impl RecordingOrderHandler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders created.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl OrderHandler for RecordingOrderHandler {
    fn create_order(&mut self, record: &PacketRecord, transfer: &TransferPayload) -> Result<()> {
        if let Some(ref message) = self.fail_with {
            return Err(anyhow!("{}", message));
        }
        self.orders.push((record.key(), transfer.clone()));
        Ok(())
    }
}

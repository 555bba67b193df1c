//! Structured gateway error types.
//!
//! One variant per failure class, with enough context fields for
//! programmatic handling. Validation failures from the wrapped transfer
//! module are not wrapped here; they propagate verbatim as the module's own
//! errors.

use gateway_types::packet::{PacketKey, PacketStatus};

/// Structured error types for gateway operations.
#[derive(Debug, Clone)]
pub enum GatewayError {
    /// Packet payload bytes are not valid fungible token packet data.
    MalformedTransferData {
        /// Parse failure detail.
        reason: String,
    },

    /// Acknowledgement bytes are not a valid result/error acknowledgement.
    MalformedAcknowledgement {
        /// Parse failure detail.
        reason: String,
    },

    /// A record with the same natural key already exists.
    DuplicateRecord { key: PacketKey },

    /// No record exists under the given key.
    RecordNotFound { key: PacketKey },

    /// The requested status change violates the one-way state machine.
    InvalidTransition {
        key: PacketKey,
        from: PacketStatus,
        to: PacketStatus,
    },

    /// The settlement-order collaborator failed after the record was
    /// persisted. The record stands; order creation is best-effort.
    OrderCreation { key: PacketKey, reason: String },
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::MalformedTransferData { reason } => {
                write!(f, "malformed transfer packet data: {}", reason)
            }
            GatewayError::MalformedAcknowledgement { reason } => {
                write!(f, "malformed acknowledgement: {}", reason)
            }
            GatewayError::DuplicateRecord { key } => {
                write!(f, "packet record already exists: {}", key)
            }
            GatewayError::RecordNotFound { key } => {
                write!(f, "packet record not found: {}", key)
            }
            GatewayError::InvalidTransition { key, from, to } => {
                write!(f, "invalid status transition {} -> {} for {}", from, to, key)
            }
            GatewayError::OrderCreation { key, reason } => {
                write!(f, "order creation failed for {}: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

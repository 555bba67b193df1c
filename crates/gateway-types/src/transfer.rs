//! ICS-20-style wire types: the fungible-token transfer payload and the
//! result/error acknowledgement.
//!
//! The gateway treats packet data as opaque except for these typed fields;
//! both forms are JSON documents on the wire.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Transfer Payload
// ============================================================================

/// Fungible token packet data parsed from the packet payload.
///
/// Only `sender`, `receiver`, and the amount/denom pair are meaningful to
/// the gateway: the party addresses drive the pending-packet index and the
/// settlement-order collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub denom: String,
    /// Decimal string, as transmitted on the wire.
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl TransferPayload {
    /// Parse a payload from raw packet bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| anyhow!("Invalid fungible token packet data: {}", e))
    }

    /// Serialize the payload to wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| anyhow!("Serialize transfer payload: {}", e))
    }
}

// ============================================================================
// Acknowledgement
// ============================================================================

/// Transport acknowledgement: either an application result or an
/// application-level error.
///
/// Serialized as `{"result": "<base64>"}` or `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Acknowledgement {
    Result(#[serde(with = "crate::encoding::b64")] Vec<u8>),
    Error(String),
}

impl Acknowledgement {
    /// A success acknowledgement carrying the given result bytes.
    pub fn result(bytes: Vec<u8>) -> Self {
        Acknowledgement::Result(bytes)
    }

    /// An error acknowledgement with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Acknowledgement::Error(message.into())
    }

    /// Whether this acknowledgement signals application success.
    pub fn success(&self) -> bool {
        matches!(self, Acknowledgement::Result(_))
    }

    /// Parse an acknowledgement from wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| anyhow!("Invalid acknowledgement: {}", e))
    }

    /// Serialize the acknowledgement to wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| anyhow!("Serialize acknowledgement: {}", e))
    }
}

//! Core packet types: envelope, natural key, record, and the record
//! status state machine.
//!
//! A [`PacketRecord`] is the central entity of the gateway: a transfer
//! packet whose visible effect has been deferred until the target rollapp
//! finalizes the height at which the packet's inclusion proof was verified.

use serde::{Deserialize, Serialize};

// ============================================================================
// Event Type
// ============================================================================

/// The transport lifecycle callback that produced a record.
///
/// This is a closed set; dispatch on it is always exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Inbound packet delivery.
    OnRecv,
    /// Acknowledgement for a packet we sent.
    OnAck,
    /// Timeout for a packet we sent.
    OnTimeout,
}

impl EventType {
    /// Stable string form used in serialized state and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OnRecv => "on_recv",
            EventType::OnAck => "on_ack",
            EventType::OnTimeout => "on_timeout",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Packet Status
// ============================================================================

/// Record lifecycle status.
///
/// Transitions are monotonic and one-way: `Pending` may move to either
/// terminal state, and no record leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PacketStatus {
    /// Awaiting rollapp finality.
    Pending,
    /// The rollapp finalized the proof height; the deferred effect applies.
    Finalized,
    /// The rollapp state containing this packet was rolled back.
    Reverted,
}

impl PacketStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PacketStatus::Finalized | PacketStatus::Reverted)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: PacketStatus) -> bool {
        match self {
            PacketStatus::Pending => next.is_terminal(),
            PacketStatus::Finalized | PacketStatus::Reverted => false,
        }
    }

    /// Stable string form used in serialized state and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketStatus::Pending => "pending",
            PacketStatus::Finalized => "finalized",
            PacketStatus::Reverted => "reverted",
        }
    }
}

impl std::fmt::Display for PacketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Envelope and Natural Key
// ============================================================================

/// Transport envelope delivered by the protocol layer.
///
/// The payload is opaque to the gateway except for the typed transfer
/// fields parsed out of it for indexing (see
/// [`TransferPayload`](crate::transfer::TransferPayload)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketEnvelope {
    pub source_port: String,
    pub source_channel: String,
    pub dest_port: String,
    pub dest_channel: String,
    /// Per-channel sequence number, unique per route by transport contract.
    pub sequence: u64,
    /// Opaque packet payload bytes.
    pub data: Vec<u8>,
}

/// Natural key of a packet record.
///
/// At most one record exists per `(route, sequence, event type)`. The
/// derived ordering is lexicographic over the fields below; it is stable
/// but carries no height semantics (height-ordered listings are provided
/// by the store).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PacketKey {
    pub source_port: String,
    pub source_channel: String,
    pub dest_port: String,
    pub dest_channel: String,
    pub sequence: u64,
    pub event_type: EventType,
}

impl std::fmt::Display for PacketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}/{}",
            self.source_port,
            self.source_channel,
            self.dest_port,
            self.dest_channel,
            self.sequence,
            self.event_type
        )
    }
}

// ============================================================================
// Packet Record
// ============================================================================

/// A packet deferred behind rollapp finality.
///
/// Created only by the finalization middleware after the wrapped handler
/// succeeds speculatively; its status is mutated only by the finalization
/// applier; it is deleted only by the epoch pruner once terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Identifier of the rollapp this packet targets.
    pub rollapp_id: String,
    /// Transport envelope as delivered.
    pub envelope: PacketEnvelope,
    /// Acknowledgement bytes, present only for `OnAck` records.
    pub acknowledgement: Option<Vec<u8>>,
    /// Lifecycle status.
    pub status: PacketStatus,
    /// Relayer identity that delivered the packet.
    pub relayer: String,
    /// Chain height at which the packet's inclusion proof was verified.
    /// The record may not leave `Pending` before this height is finalized.
    pub proof_height: u64,
    /// Which lifecycle callback produced this record.
    pub event_type: EventType,
}

impl PacketRecord {
    /// Derive the natural key of this record.
    pub fn key(&self) -> PacketKey {
        PacketKey {
            source_port: self.envelope.source_port.clone(),
            source_channel: self.envelope.source_channel.clone(),
            dest_port: self.envelope.dest_port.clone(),
            dest_channel: self.envelope.dest_channel.clone(),
            sequence: self.envelope.sequence,
            event_type: self.event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(sequence: u64) -> PacketEnvelope {
        PacketEnvelope {
            source_port: "transfer".to_string(),
            source_channel: "channel-0".to_string(),
            dest_port: "transfer".to_string(),
            dest_channel: "channel-7".to_string(),
            sequence,
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_status_transitions_one_way() {
        assert!(PacketStatus::Pending.can_transition_to(PacketStatus::Finalized));
        assert!(PacketStatus::Pending.can_transition_to(PacketStatus::Reverted));
        assert!(!PacketStatus::Pending.can_transition_to(PacketStatus::Pending));
        assert!(!PacketStatus::Finalized.can_transition_to(PacketStatus::Reverted));
        assert!(!PacketStatus::Finalized.can_transition_to(PacketStatus::Pending));
        assert!(!PacketStatus::Reverted.can_transition_to(PacketStatus::Finalized));
    }

    #[test]
    fn test_key_distinguishes_event_type() {
        let record = PacketRecord {
            rollapp_id: "rollapp_1".to_string(),
            envelope: envelope(4),
            acknowledgement: None,
            status: PacketStatus::Pending,
            relayer: "relayer-a".to_string(),
            proof_height: 10,
            event_type: EventType::OnRecv,
        };
        let mut as_timeout = record.clone();
        as_timeout.event_type = EventType::OnTimeout;
        assert_ne!(record.key(), as_timeout.key());
        assert_eq!(record.key(), record.clone().key());
    }

    #[test]
    fn test_key_display_is_route_scoped() {
        let record = PacketRecord {
            rollapp_id: "rollapp_1".to_string(),
            envelope: envelope(9),
            acknowledgement: None,
            status: PacketStatus::Pending,
            relayer: "relayer-a".to_string(),
            proof_height: 10,
            event_type: EventType::OnAck,
        };
        assert_eq!(
            record.key().to_string(),
            "transfer/channel-0/transfer/channel-7/9/on_ack"
        );
    }
}

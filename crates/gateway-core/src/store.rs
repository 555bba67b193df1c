//! The packet record store: primary keyed storage plus two secondary views.
//!
//! The primary map is keyed by the natural packet key. The store maintains
//! a pending-by-address index in lockstep with the primary map: every
//! `Pending` record has exactly one index entry (under the receiver for
//! recv packets, the sender for ack/timeout packets), and the entry is
//! removed in the same call that takes the record out of `Pending`.
//!
//! Execution is single-threaded per the gateway's transactional model, so
//! `&mut self` methods are the atomic unit: a caller can never observe the
//! record and its index entries out of sync.

use std::collections::{BTreeMap, BTreeSet};

use gateway_types::packet::{EventType, PacketKey, PacketRecord, PacketStatus};
use gateway_types::transfer::TransferPayload;

use crate::errors::GatewayError;

/// Result of a status change, reported for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub key: PacketKey,
    pub old_status: PacketStatus,
    pub new_status: PacketStatus,
}

/// Keyed storage for packet records with a pending-by-address index.
#[derive(Debug, Clone, Default)]
pub struct PacketStore {
    /// Primary store: natural key -> record.
    records: BTreeMap<PacketKey, PacketRecord>,
    /// Pending index: (party address, natural key). Entries exist only for
    /// records currently in `Pending`.
    pending_by_address: BTreeSet<(String, PacketKey)>,
}

impl PacketStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The party a pending record is indexed under: the receiver for recv
    /// packets, the sender for ack/timeout packets (those packets originate
    /// from this chain, so the affected party is the original sender).
    fn party_address(record: &PacketRecord) -> Result<String, GatewayError> {
        let payload = TransferPayload::from_bytes(&record.envelope.data).map_err(|e| {
            GatewayError::MalformedTransferData {
                reason: e.to_string(),
            }
        })?;
        Ok(match record.event_type {
            EventType::OnRecv => payload.receiver,
            EventType::OnAck | EventType::OnTimeout => payload.sender,
        })
    }

    /// Insert a new record.
    ///
    /// Fails with [`GatewayError::DuplicateRecord`] if the natural key is
    /// taken. A `Pending` record gets its address-index entry in the same
    /// call.
    pub fn insert(&mut self, record: PacketRecord) -> Result<(), GatewayError> {
        let key = record.key();
        if self.records.contains_key(&key) {
            return Err(GatewayError::DuplicateRecord { key });
        }
        if record.status == PacketStatus::Pending {
            let party = Self::party_address(&record)?;
            self.pending_by_address.insert((party, key.clone()));
        }
        self.records.insert(key, record);
        Ok(())
    }

    /// Look up a record by its natural key.
    pub fn get(&self, key: &PacketKey) -> Option<&PacketRecord> {
        self.records.get(key)
    }

    /// Remove a record, dropping any address-index entry with it.
    pub fn remove(&mut self, key: &PacketKey) -> Result<PacketRecord, GatewayError> {
        let record = self
            .records
            .remove(key)
            .ok_or_else(|| GatewayError::RecordNotFound { key: key.clone() })?;
        if record.status == PacketStatus::Pending {
            let party = Self::party_address(&record)?;
            self.pending_by_address.remove(&(party, key.clone()));
        }
        Ok(record)
    }

    /// Transition a record to a new status.
    ///
    /// Enforces the one-way state machine; leaving `Pending` removes the
    /// address-index entry in the same call.
    pub fn update_status(
        &mut self,
        key: &PacketKey,
        new_status: PacketStatus,
    ) -> Result<StatusTransition, GatewayError> {
        let record = self
            .records
            .get(key)
            .ok_or_else(|| GatewayError::RecordNotFound { key: key.clone() })?;
        let old_status = record.status;
        if !old_status.can_transition_to(new_status) {
            return Err(GatewayError::InvalidTransition {
                key: key.clone(),
                from: old_status,
                to: new_status,
            });
        }
        if old_status == PacketStatus::Pending {
            let party = Self::party_address(record)?;
            self.pending_by_address.remove(&(party, key.clone()));
        }
        // Checked above: the key is present.
        if let Some(record) = self.records.get_mut(key) {
            record.status = new_status;
        }
        Ok(StatusTransition {
            key: key.clone(),
            old_status,
            new_status,
        })
    }

    /// List records for one rollapp in the given status.
    ///
    /// Deterministic order: ascending proof height, then sequence. This is
    /// the iteration order for finalization batches and pruning.
    pub fn list_by_status(&self, rollapp_id: &str, status: PacketStatus) -> Vec<PacketRecord> {
        let mut out: Vec<PacketRecord> = self
            .records
            .values()
            .filter(|r| r.rollapp_id == rollapp_id && r.status == status)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.proof_height, r.envelope.sequence));
        out
    }

    /// List records in the given status across all rollapps, ascending by
    /// proof height then sequence.
    pub fn list_by_status_global(&self, status: PacketStatus) -> Vec<PacketRecord> {
        let mut out: Vec<PacketRecord> = self
            .records
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.proof_height, r.envelope.sequence));
        out
    }

    /// Keys of pending records indexed under the given party address.
    pub fn list_pending_by_address(&self, address: &str) -> Vec<PacketKey> {
        self.pending_by_address
            .iter()
            .filter(|(party, _)| party == address)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate all records in key order (used by persistence).
    pub fn records(&self) -> impl Iterator<Item = &PacketRecord> {
        self.records.values()
    }

    /// Number of pending-index entries (test/diagnostic aid).
    pub fn pending_index_len(&self) -> usize {
        self.pending_by_address.len()
    }
}

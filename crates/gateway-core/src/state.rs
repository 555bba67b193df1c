//! Persistent gateway state for save/load.
//!
//! The state file is a versioned JSON document. Records are carried as
//! bcs bytes (base64 in the document) with a few summary fields alongside
//! for human inspection; collaborators are runtime-only and never
//! persisted.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use gateway_types::encoding::{decode_b64, encode_b64};
use gateway_types::packet::PacketRecord;

use crate::params::GatewayParams;
use crate::store::PacketStore;

/// Serializable version of a packet record for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedPacketRecord {
    /// Rollapp identifier (summary field).
    pub rollapp_id: String,
    /// Status string (summary field).
    pub status: String,
    /// Event type string (summary field).
    pub event_type: String,
    /// Packet sequence (summary field).
    pub sequence: u64,
    /// Proof height (summary field).
    pub proof_height: u64,
    /// Full record, bcs-serialized and base64 encoded.
    pub record_b64: String,
}

impl SerializedPacketRecord {
    /// Serialize a record.
    pub fn from_record(record: &PacketRecord) -> Result<Self> {
        let bytes = bcs::to_bytes(record).map_err(|e| anyhow!("Serialize record: {}", e))?;
        Ok(Self {
            rollapp_id: record.rollapp_id.clone(),
            status: record.status.as_str().to_string(),
            event_type: record.event_type.as_str().to_string(),
            sequence: record.envelope.sequence,
            proof_height: record.proof_height,
            record_b64: encode_b64(&bytes),
        })
    }

    /// Deserialize back into a record. The bcs bytes are authoritative;
    /// summary fields are ignored.
    pub fn to_record(&self) -> Result<PacketRecord> {
        let bytes = decode_b64(&self.record_b64, "record bytes")?;
        bcs::from_bytes(&bytes).map_err(|e| anyhow!("Deserialize record: {}", e))
    }
}

/// Metadata for state files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateMetadata {
    /// Human-readable description of this state file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When this state was created (ISO 8601 timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// When this state was last modified (ISO 8601 timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// Tags for categorization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl StateMetadata {
    /// Metadata stamped with the current time.
    pub fn now() -> Self {
        let ts = chrono::Utc::now().to_rfc3339();
        Self {
            description: None,
            created_at: Some(ts.clone()),
            modified_at: Some(ts),
            tags: Vec::new(),
        }
    }
}

/// Persistent gateway state that can be saved to/loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentGatewayState {
    /// Version of the state format (for forward compatibility).
    pub version: u32,
    /// State file metadata.
    #[serde(default)]
    pub metadata: Option<StateMetadata>,
    /// Gateway parameters.
    pub params: GatewayParams,
    /// All packet records, in key order.
    pub records: Vec<SerializedPacketRecord>,
}

impl PersistentGatewayState {
    /// Current state format version.
    /// v1: Initial version (records, params, metadata)
    pub const CURRENT_VERSION: u32 = 1;

    /// Save to a file as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow!("Read state file {}: {}", path.as_ref().display(), e)
        })?;
        let state: Self = serde_json::from_str(&json)?;
        if state.version > Self::CURRENT_VERSION {
            return Err(anyhow!(
                "State file version {} is newer than supported version {}",
                state.version,
                Self::CURRENT_VERSION
            ));
        }
        Ok(state)
    }

    /// Rebuild the store and params from this state.
    pub fn restore(&self) -> Result<(PacketStore, GatewayParams)> {
        let mut store = PacketStore::new();
        for serialized in &self.records {
            let record = serialized.to_record()?;
            store.insert(record)?;
        }
        Ok((store, self.params.clone()))
    }
}

/// Capture the current store and params into a persistable state.
pub fn export_state(
    store: &PacketStore,
    params: &GatewayParams,
    metadata: StateMetadata,
) -> Result<PersistentGatewayState> {
    let records = store
        .records()
        .map(SerializedPacketRecord::from_record)
        .collect::<Result<Vec<_>>>()?;
    Ok(PersistentGatewayState {
        version: PersistentGatewayState::CURRENT_VERSION,
        metadata: Some(metadata),
        params: params.clone(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::packet::{EventType, PacketEnvelope, PacketStatus};
    use gateway_types::transfer::TransferPayload;

    fn record(sequence: u64) -> PacketRecord {
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
            proof_height: 10,
            event_type: EventType::OnRecv,
        }
    }

    #[test]
    fn test_record_serialization_round_trip() -> Result<()> {
        let original = record(1);
        let serialized = SerializedPacketRecord::from_record(&original)?;
        assert_eq!(serialized.status, "pending");
        assert_eq!(serialized.event_type, "on_recv");
        assert_eq!(serialized.to_record()?, original);
        Ok(())
    }

    #[test]
    fn test_state_file_round_trip() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("gateway-state.json");

        let mut store = PacketStore::new();
        store.insert(record(1)).expect("insert");
        store.insert(record(2)).expect("insert");
        let params = GatewayParams::new("minute", 50, 10);

        export_state(&store, &params, StateMetadata::now())?.save(&path)?;

        let loaded = PersistentGatewayState::load(&path)?;
        assert_eq!(loaded.version, PersistentGatewayState::CURRENT_VERSION);
        let (restored, restored_params) = loaded.restore()?;
        assert_eq!(restored_params, params);
        assert_eq!(restored.len(), 2);
        // The pending index is rebuilt, not persisted separately.
        assert_eq!(restored.list_pending_by_address("dym1receiver").len(), 2);
        Ok(())
    }

    #[test]
    fn test_load_rejects_newer_version() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("future-state.json");

        let mut state = export_state(
            &PacketStore::new(),
            &GatewayParams::default(),
            StateMetadata::default(),
        )?;
        state.version = PersistentGatewayState::CURRENT_VERSION + 1;
        state.save(&path)?;

        assert!(PersistentGatewayState::load(&path).is_err());
        Ok(())
    }
}

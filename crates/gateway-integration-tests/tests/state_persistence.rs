//! State save/load round trips through the facade crate.

use anyhow::Result;

use rollapp_gateway::core::middleware::FinalizationMiddleware;
use rollapp_gateway::core::module::MockTransferModule;
use rollapp_gateway::core::orders::NoopOrderHandler;
use rollapp_gateway::core::params::GatewayParams;
use rollapp_gateway::core::registry::InMemoryRegistry;
use rollapp_gateway::types::packet::{PacketEnvelope, PacketStatus};
use rollapp_gateway::types::transfer::TransferPayload;

const ROLLAPP: &str = "rollapp_1";

fn gateway(params: GatewayParams) -> FinalizationMiddleware<MockTransferModule, InMemoryRegistry, NoopOrderHandler>
{
    let mut registry = InMemoryRegistry::new();
    registry.track_rollapp("transfer", "channel-7", ROLLAPP, "dym1owner");
    FinalizationMiddleware::new(
        MockTransferModule::new(),
        registry,
        NoopOrderHandler,
        params,
    )
    .expect("construct gateway")
}

fn inbound(sequence: u64) -> PacketEnvelope {
    PacketEnvelope {
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
            memo: Some("pending transfer".to_string()),
        }
        .to_bytes()
        .expect("encode payload"),
    }
}

#[test]
fn test_state_round_trip_preserves_records_and_params() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("gateway-state.json");

    // Build up state: two pending, one finalized.
    {
        let mut gw = gateway(GatewayParams::new("minute", 42, 10));
        for i in 1..=3u64 {
            gw.on_recv_packet(&inbound(i), "relayer-a", i * 10)?;
        }
        gw.registry_mut().advance_finalized_height(ROLLAPP, 10);
        gw.finalize_rollapp(ROLLAPP, 10);
        gw.save_state(&path)?;
    }

    // Load into a fresh gateway; collaborators are runtime-only.
    let mut gw = gateway(GatewayParams::default());
    gw.load_state(&path)?;

    assert_eq!(gw.params().epoch_identifier, "minute");
    assert_eq!(gw.params().delete_packets_epoch_limit, 42);
    assert_eq!(
        gw.packets_by_rollapp_status(ROLLAPP, PacketStatus::Pending).len(),
        2
    );
    assert_eq!(
        gw.packets_by_rollapp_status(ROLLAPP, PacketStatus::Finalized).len(),
        1
    );
    // The pending address index is rebuilt on load.
    assert_eq!(gw.pending_packets_by_address("dym1receiver").len(), 2);

    // The loaded store keeps working: prune the finalized record.
    assert_eq!(gw.handle_epoch_end("minute", 1)?, 1);
    assert_eq!(gw.store().len(), 2);
    Ok(())
}

#[test]
fn test_state_file_is_inspectable_json() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("gateway-state.json");

    let mut gw = gateway(GatewayParams::default());
    gw.on_recv_packet(&inbound(1), "relayer-a", 10)?;
    gw.save_state(&path)?;

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["records"][0]["rollapp_id"], ROLLAPP);
    assert_eq!(doc["records"][0]["status"], "pending");
    assert_eq!(doc["records"][0]["event_type"], "on_recv");
    assert!(doc["metadata"]["created_at"].is_string());
    Ok(())
}

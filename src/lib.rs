//! Rollapp Gateway
//!
//! Packet-finalization gateway for optimistically-finalized rollapps: every
//! inbound, acknowledgement, and timeout transfer packet addressed to a
//! tracked rollapp is intercepted and its visible effect deferred until the
//! rollapp's state is irreversibly finalized.
//!
//! This crate is a facade over the workspace members:
//!
//! - `gateway-types`: packet envelope, record, natural key, transfer
//!   payload, and acknowledgement wire types
//! - `gateway-core`: the finalization middleware, packet record store,
//!   speculative executor, finalization applier, and epoch pruner

pub use gateway_core as core;
pub use gateway_types as types;

// Re-export the primary entry points at crate root
pub use gateway_core::{
    FinalizationMiddleware, GatewayError, GatewayMetrics, GatewayParams, OrderHandler,
    PacketStore, RollappRegistry, TransferModule,
};
pub use gateway_types::{
    Acknowledgement, EventType, PacketEnvelope, PacketKey, PacketRecord, PacketStatus,
    TransferPayload,
};

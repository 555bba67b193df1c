//! Shared types for the rollapp-gateway workspace.
//!
//! This crate provides foundational types used across the workspace,
//! breaking circular dependency chains.
//!
//! ## Packet Types
//!
//! The [`packet`] module contains the core packet types:
//! - [`PacketEnvelope`](packet::PacketEnvelope) - Transport envelope (route, sequence, payload)
//! - [`PacketKey`](packet::PacketKey) - Natural key identifying a packet record
//! - [`PacketRecord`](packet::PacketRecord) - A packet deferred behind rollapp finality
//!
//! ## Transfer Types
//!
//! The [`transfer`] module contains the ICS-20-style wire types:
//! - [`TransferPayload`](transfer::TransferPayload) - Fungible token packet data (JSON)
//! - [`Acknowledgement`](transfer::Acknowledgement) - Result/error acknowledgement (JSON)

pub mod encoding;
pub mod packet;
pub mod transfer;

// Re-export commonly used types at crate root
pub use packet::{EventType, PacketEnvelope, PacketKey, PacketRecord, PacketStatus};
pub use transfer::{Acknowledgement, TransferPayload};

//! Rollapp Gateway Core
//!
//! Packet-finalization engine sitting between a cross-chain transfer
//! protocol and its application logic. Every inbound, acknowledgement, and
//! timeout packet addressed to an optimistically-finalized rollapp is
//! intercepted and its visible effect deferred until the rollapp's state is
//! irreversibly finalized.
//!
//! # Core Modules
//!
//! - [`middleware`]: the protocol interceptor orchestrating everything
//! - [`store`]: durable packet record store with status and address views
//! - [`executor`]: speculative execution against discardable state
//! - [`applier`]: pending -> finalized/reverted transitions
//! - [`pruner`]: bounded deletion of finalized records on epoch ticks
//!
//! # Example
//!
//! ```ignore
//! use gateway_core::middleware::FinalizationMiddleware;
//! use gateway_core::module::MockTransferModule;
//! use gateway_core::orders::NoopOrderHandler;
//! use gateway_core::params::GatewayParams;
//! use gateway_core::registry::InMemoryRegistry;
//!
//! let mut registry = InMemoryRegistry::new();
//! registry.track_rollapp("transfer", "channel-7", "rollapp_1", "dym1owner");
//!
//! let mut gateway = FinalizationMiddleware::new(
//!     MockTransferModule::new(),
//!     registry,
//!     NoopOrderHandler,
//!     GatewayParams::default(),
//! )?;
//!
//! // Deliver packets, advance finality, handle epoch ticks...
//! ```

pub mod applier;
pub mod errors;
pub mod executor;
pub mod metrics;
pub mod middleware;
pub mod module;
pub mod orders;
pub mod params;
pub mod pruner;
pub mod registry;
pub mod state;
pub mod store;

// Re-export main types at crate root for convenience
pub use applier::{
    FinalizationOutcome, FinalizeHook, NoopFinalizeHook, RecordingFinalizeHook, ReplayFinalizeHook,
};
pub use errors::GatewayError;
pub use executor::{try_commit, try_execute, SpeculativeState};
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use middleware::FinalizationMiddleware;
pub use module::{MockTransferModule, TransferModule};
pub use orders::{NoopOrderHandler, OrderHandler, RecordingOrderHandler};
pub use params::GatewayParams;
pub use pruner::EpochPruner;
pub use registry::{InMemoryRegistry, RollappInfo, RollappRegistry};
pub use state::{PersistentGatewayState, StateMetadata};
pub use store::{PacketStore, StatusTransition};

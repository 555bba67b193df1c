//! Gateway configuration parameters.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Basis points in a whole.
const BPS_DENOMINATOR: u64 = 10_000;

/// Persisted gateway parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayParams {
    /// The epoch identifier the pruner reacts to. Ticks carrying any other
    /// identifier are ignored.
    pub epoch_identifier: String,
    /// Maximum number of finalized records deleted per pruning pass. Bounds
    /// the cost of a single pass against an unbounded backlog.
    pub delete_packets_epoch_limit: u64,
    /// Bridging fee in basis points. Carried for the surrounding transfer
    /// logic; not consumed by this crate.
    pub bridging_fee_bps: u64,
}

impl Default for GatewayParams {
    fn default() -> Self {
        Self {
            epoch_identifier: "hour".to_string(),
            delete_packets_epoch_limit: 1_000_000,
            bridging_fee_bps: 10,
        }
    }
}

impl GatewayParams {
    /// Construct params with explicit values.
    pub fn new(
        epoch_identifier: impl Into<String>,
        delete_packets_epoch_limit: u64,
        bridging_fee_bps: u64,
    ) -> Self {
        Self {
            epoch_identifier: epoch_identifier.into(),
            delete_packets_epoch_limit,
            bridging_fee_bps,
        }
    }

    /// Validate parameter invariants.
    pub fn validate(&self) -> Result<()> {
        if self.epoch_identifier.trim().is_empty() {
            return Err(anyhow!("epoch identifier must not be empty"));
        }
        if self.delete_packets_epoch_limit == 0 {
            return Err(anyhow!("delete packets epoch limit must be positive"));
        }
        if self.bridging_fee_bps >= BPS_DENOMINATOR {
            return Err(anyhow!(
                "bridging fee must be below {} bps, got {}",
                BPS_DENOMINATOR,
                self.bridging_fee_bps
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        GatewayParams::default().validate().expect("valid defaults");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(GatewayParams::new("", 10, 10).validate().is_err());
        assert!(GatewayParams::new("hour", 0, 10).validate().is_err());
        assert!(GatewayParams::new("hour", 10, 10_000).validate().is_err());
        assert!(GatewayParams::new("minute", 3, 25).validate().is_ok());
    }
}

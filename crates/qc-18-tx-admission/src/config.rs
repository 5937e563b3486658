//! Configuration for the Transaction Admission Subsystem

use serde::{Deserialize, Serialize};

/// Name of the module account receiving fees.
pub const FEE_COLLECTOR_NAME: &str = "fee_collector";

/// Admission tunables that are not capabilities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Module account fees are paid to
    pub fee_collector: String,
    /// Extension option type URLs accepted when no custom checker is supplied
    #[serde(default)]
    pub accepted_extension_options: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            fee_collector: FEE_COLLECTOR_NAME.to_string(),
            accepted_extension_options: Vec::new(),
        }
    }
}

impl AdmissionConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self::default()
    }
}

/// Ceiling on the gas a simulation may request.
///
/// Its presence is required to build a pipeline. With no explicit limit the
/// consensus max block gas is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationGasCeiling {
    /// Explicit limit in gas units
    pub simulation_gas_limit: Option<u64>,
}

impl SimulationGasCeiling {
    pub fn new(simulation_gas_limit: Option<u64>) -> Self {
        Self {
            simulation_gas_limit,
        }
    }
}

//! # Admission Context
//!
//! Mutable per-invocation state threaded through every stage.
//!
//! The caller supplies a stub carrying block height, block time, chain id,
//! execution mode and node-local minimum gas prices. `SetUpContext` resets the
//! rest, so a context can be reused across invocations without leaking state.

use crate::domain::gas::GasMeter;
use shared_types::{Address, DecCoin, PacketId, PublicKey};

/// How intensely the invocation checks the transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecMode {
    /// Full check at broadcast / proposal time.
    Check,
    /// Lightweight re-check of a transaction already in the mempool.
    ReCheck,
    /// Execution inside a finalized block.
    Deliver,
}

/// Signer metadata cached by `SetPubKey` for the signature stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerMeta {
    pub address: Address,
    pub account_number: u64,
    /// Sequence stored on the account when the signer was resolved.
    pub sequence: u64,
    pub pub_key: PublicKey,
    /// Key is a simulation placeholder, not a real key.
    pub simulated: bool,
}

/// Per-invocation admission state.
#[derive(Clone, Debug)]
pub struct Context {
    pub block_height: u64,
    /// Unix seconds.
    pub block_time: u64,
    pub chain_id: String,
    pub exec_mode: ExecMode,
    /// Dry-run flag, set by `SetUpContext`.
    pub simulate: bool,
    /// Node-local fee floor, applied in `Check` and `ReCheck` mode.
    pub min_gas_prices: Vec<DecCoin>,
    /// Encoded transaction, charged by `ConsumeGasForTxSize`.
    pub tx_bytes: Vec<u8>,
    /// Consensus max block gas, the fallback simulation ceiling.
    pub max_block_gas: Option<u64>,
    pub gas_meter: GasMeter,
    /// Fee-per-gas priority computed by `DeductFee`.
    pub priority: i64,
    /// Index of the transaction within its block, set by `CountTx`.
    pub tx_counter: Option<u32>,
    pub signers: Vec<SignerMeta>,
    /// Packets found already processed by `RedundantRelay`.
    pub redundant_relay: Option<Vec<PacketId>>,
}

impl Context {
    pub fn new(chain_id: impl Into<String>, block_height: u64, block_time: u64) -> Self {
        Self {
            block_height,
            block_time,
            chain_id: chain_id.into(),
            exec_mode: ExecMode::Deliver,
            simulate: false,
            min_gas_prices: Vec::new(),
            tx_bytes: Vec::new(),
            max_block_gas: None,
            gas_meter: GasMeter::infinite(),
            priority: 0,
            tx_counter: None,
            signers: Vec::new(),
            redundant_relay: None,
        }
    }

    pub fn with_exec_mode(mut self, exec_mode: ExecMode) -> Self {
        self.exec_mode = exec_mode;
        self
    }

    pub fn with_min_gas_prices(mut self, min_gas_prices: Vec<DecCoin>) -> Self {
        self.min_gas_prices = min_gas_prices;
        self
    }

    pub fn with_tx_bytes(mut self, tx_bytes: Vec<u8>) -> Self {
        self.tx_bytes = tx_bytes;
        self
    }

    pub fn with_max_block_gas(mut self, max_block_gas: u64) -> Self {
        self.max_block_gas = Some(max_block_gas);
        self
    }

    /// Returns true for `Check` and `ReCheck`.
    pub fn is_check_tx(&self) -> bool {
        matches!(self.exec_mode, ExecMode::Check | ExecMode::ReCheck)
    }

    pub fn is_recheck_tx(&self) -> bool {
        self.exec_mode == ExecMode::ReCheck
    }

    /// Returns true at genesis height.
    pub fn is_genesis(&self) -> bool {
        self.block_height == 0
    }

    /// Cached metadata for `address`.
    pub fn signer(&self, address: &Address) -> Option<&SignerMeta> {
        self.signers.iter().find(|s| &s.address == address)
    }

    /// Clears everything a previous invocation may have written.
    pub(crate) fn reset(&mut self, simulate: bool, gas_meter: GasMeter) {
        self.simulate = simulate;
        self.gas_meter = gas_meter;
        self.priority = 0;
        self.tx_counter = None;
        self.signers.clear();
        self.redundant_relay = None;
    }
}

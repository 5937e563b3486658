//! Pipeline construction.
//!
//! [`PipelineOptions`] carries every capability and tunable explicitly.
//! Building checks the required capability set in one pass and either
//! returns a fully wired [`AnteHandler`] or reports everything missing.

use super::handler::AnteHandler;
use crate::config::{AdmissionConfig, SimulationGasCeiling};
use crate::domain::errors::{BuildError, Capability};
use crate::domain::fees::TxFeeChecker;
use crate::domain::ordering::{StageId, CANONICAL_ORDER};
use crate::domain::signing::SignatureGasConsumer;
use crate::ports::outbound::{
    AccountLedger, FeeGrantRegistry, FeeLedger, RelayRegistry, SignModeHandler, TxCountStore,
};
use crate::stages::deduct_fee::DeductFeeStage;
use crate::stages::ext_options::{accept_type_urls, ExtensionOptionChecker, ExtensionOptionsStage};
use crate::stages::increment_sequence::IncrementSequenceStage;
use crate::stages::memo::ValidateMemoStage;
use crate::stages::redundant_relay::RedundantRelayStage;
use crate::stages::set_pubkey::SetPubKeyStage;
use crate::stages::setup::SetUpContextStage;
use crate::stages::sig_count::ValidateSigCountStage;
use crate::stages::sig_gas::SigGasConsumeStage;
use crate::stages::sig_verify::SigVerificationStage;
use crate::stages::simulation_gas::LimitSimulationGasStage;
use crate::stages::timeout::TxTimeoutHeightStage;
use crate::stages::tx_count::CountTxStage;
use crate::stages::tx_size::ConsumeTxSizeGasStage;
use crate::stages::validate_basic::ValidateBasicStage;
use crate::stages::Stage;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Capabilities and tunables for one pipeline.
///
/// Required: account ledger, fee ledger, sign-mode handler, simulation gas
/// ceiling, tx-count store. Everything else is optional.
#[derive(Clone, Default)]
pub struct PipelineOptions {
    pub account_ledger: Option<Arc<dyn AccountLedger>>,
    pub fee_ledger: Option<Arc<dyn FeeLedger>>,
    pub sign_mode_handler: Option<Arc<dyn SignModeHandler>>,
    pub simulation_gas_ceiling: Option<SimulationGasCeiling>,
    pub tx_count_store: Option<Arc<dyn TxCountStore>>,
    pub fee_grants: Option<Arc<dyn FeeGrantRegistry>>,
    pub relay_registry: Option<Arc<dyn RelayRegistry>>,
    /// Replaces the minimum-gas-price floor
    pub tx_fee_checker: Option<TxFeeChecker>,
    /// Replaces the config's accepted type URL list
    pub extension_option_checker: Option<ExtensionOptionChecker>,
    /// Replaces the per-scheme signature gas table
    pub sig_gas_consumer: Option<SignatureGasConsumer>,
    pub config: AdmissionConfig,
}

impl std::fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("missing", &self.missing_capabilities())
            .field("fee_grants", &self.fee_grants.is_some())
            .field("relay_registry", &self.relay_registry.is_some())
            .field("custom_fee_checker", &self.tx_fee_checker.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account_ledger(mut self, ledger: Arc<dyn AccountLedger>) -> Self {
        self.account_ledger = Some(ledger);
        self
    }

    pub fn with_fee_ledger(mut self, ledger: Arc<dyn FeeLedger>) -> Self {
        self.fee_ledger = Some(ledger);
        self
    }

    pub fn with_sign_mode_handler(mut self, handler: Arc<dyn SignModeHandler>) -> Self {
        self.sign_mode_handler = Some(handler);
        self
    }

    pub fn with_simulation_gas_ceiling(mut self, ceiling: SimulationGasCeiling) -> Self {
        self.simulation_gas_ceiling = Some(ceiling);
        self
    }

    pub fn with_tx_count_store(mut self, store: Arc<dyn TxCountStore>) -> Self {
        self.tx_count_store = Some(store);
        self
    }

    pub fn with_fee_grants(mut self, registry: Arc<dyn FeeGrantRegistry>) -> Self {
        self.fee_grants = Some(registry);
        self
    }

    pub fn with_relay_registry(mut self, registry: Arc<dyn RelayRegistry>) -> Self {
        self.relay_registry = Some(registry);
        self
    }

    pub fn with_tx_fee_checker(mut self, checker: TxFeeChecker) -> Self {
        self.tx_fee_checker = Some(checker);
        self
    }

    pub fn with_extension_option_checker(mut self, checker: ExtensionOptionChecker) -> Self {
        self.extension_option_checker = Some(checker);
        self
    }

    pub fn with_sig_gas_consumer(mut self, consumer: SignatureGasConsumer) -> Self {
        self.sig_gas_consumer = Some(consumer);
        self
    }

    pub fn with_config(mut self, config: AdmissionConfig) -> Self {
        self.config = config;
        self
    }

    /// Every required capability that is not set, in declaration order.
    pub fn missing_capabilities(&self) -> Vec<Capability> {
        let required = [
            (Capability::AccountLedger, self.account_ledger.is_some()),
            (Capability::FeeLedger, self.fee_ledger.is_some()),
            (Capability::SignModeHandler, self.sign_mode_handler.is_some()),
            (
                Capability::SimulationGasCeiling,
                self.simulation_gas_ceiling.is_some(),
            ),
            (Capability::TxCountStore, self.tx_count_store.is_some()),
        ];
        required
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(capability, _)| capability)
            .collect()
    }

    /// Build the canonical fifteen-stage handler.
    pub fn build(self) -> Result<AnteHandler, BuildError> {
        self.build_with_order(&CANONICAL_ORDER)
    }

    /// Build a handler running `order` instead of the canonical order.
    ///
    /// `order` must be non-empty, free of duplicates and start with
    /// `SetUpContext`, since every other stage relies on a fresh context.
    pub fn build_with_order(self, order: &[StageId]) -> Result<AnteHandler, BuildError> {
        let missing = self.missing_capabilities();
        if !missing.is_empty() {
            return Err(BuildError::MissingCapabilities(missing));
        }
        validate_order(order)?;

        let caps = Capabilities::take(self)?;
        let stages = order
            .iter()
            .map(|id| caps.stage(*id))
            .collect::<Vec<Box<dyn Stage>>>();

        debug!(stages = stages.len(), "[qc-18] Admission pipeline built");
        Ok(AnteHandler::new(stages))
    }
}

fn validate_order(order: &[StageId]) -> Result<(), BuildError> {
    match order.first() {
        None => {
            return Err(BuildError::InvalidStageOrder(
                "stage order is empty".into(),
            ))
        }
        Some(StageId::SetUpContext) => {}
        Some(first) => {
            return Err(BuildError::InvalidStageOrder(format!(
                "first stage must be {}, got {first}",
                StageId::SetUpContext
            )))
        }
    }

    let mut seen = HashSet::with_capacity(order.len());
    for id in order {
        if !seen.insert(*id) {
            return Err(BuildError::InvalidStageOrder(format!(
                "stage {id} appears more than once"
            )));
        }
    }
    Ok(())
}

/// Options after the presence check, with required fields unwrapped.
struct Capabilities {
    accounts: Arc<dyn AccountLedger>,
    bank: Arc<dyn FeeLedger>,
    sign_mode: Arc<dyn SignModeHandler>,
    ceiling: SimulationGasCeiling,
    tx_count: Arc<dyn TxCountStore>,
    fee_grants: Option<Arc<dyn FeeGrantRegistry>>,
    relay: Option<Arc<dyn RelayRegistry>>,
    fee_checker: Option<TxFeeChecker>,
    ext_checker: ExtensionOptionChecker,
    sig_gas_consumer: Option<SignatureGasConsumer>,
    fee_collector: String,
}

impl Capabilities {
    fn take(options: PipelineOptions) -> Result<Self, BuildError> {
        let missing = |capability| BuildError::MissingCapabilities(vec![capability]);
        let ext_checker = match options.extension_option_checker {
            Some(checker) => checker,
            None => accept_type_urls(options.config.accepted_extension_options),
        };

        Ok(Self {
            accounts: options
                .account_ledger
                .ok_or_else(|| missing(Capability::AccountLedger))?,
            bank: options
                .fee_ledger
                .ok_or_else(|| missing(Capability::FeeLedger))?,
            sign_mode: options
                .sign_mode_handler
                .ok_or_else(|| missing(Capability::SignModeHandler))?,
            ceiling: options
                .simulation_gas_ceiling
                .ok_or_else(|| missing(Capability::SimulationGasCeiling))?,
            tx_count: options
                .tx_count_store
                .ok_or_else(|| missing(Capability::TxCountStore))?,
            fee_grants: options.fee_grants,
            relay: options.relay_registry,
            fee_checker: options.tx_fee_checker,
            ext_checker,
            sig_gas_consumer: options.sig_gas_consumer,
            fee_collector: options.config.fee_collector,
        })
    }

    fn stage(&self, id: StageId) -> Box<dyn Stage> {
        match id {
            StageId::SetUpContext => Box::new(SetUpContextStage),
            StageId::LimitSimulationGas => Box::new(LimitSimulationGasStage::new(self.ceiling)),
            StageId::CountTx => Box::new(CountTxStage::new(self.tx_count.clone())),
            StageId::ExtensionOptions => {
                Box::new(ExtensionOptionsStage::new(self.ext_checker.clone()))
            }
            StageId::ValidateBasic => Box::new(ValidateBasicStage),
            StageId::TxTimeoutHeight => Box::new(TxTimeoutHeightStage),
            StageId::ValidateMemo => Box::new(ValidateMemoStage::new(self.accounts.clone())),
            StageId::ConsumeGasForTxSize => {
                Box::new(ConsumeTxSizeGasStage::new(self.accounts.clone()))
            }
            StageId::DeductFee => Box::new(DeductFeeStage::new(
                self.accounts.clone(),
                self.bank.clone(),
                self.fee_grants.clone(),
                self.fee_checker.clone(),
                self.fee_collector.clone(),
            )),
            StageId::SetPubKey => Box::new(SetPubKeyStage::new(self.accounts.clone())),
            StageId::ValidateSigCount => {
                Box::new(ValidateSigCountStage::new(self.accounts.clone()))
            }
            StageId::SigGasConsume => Box::new(SigGasConsumeStage::new(
                self.accounts.clone(),
                self.sig_gas_consumer.clone(),
            )),
            StageId::SigVerification => Box::new(SigVerificationStage::new(
                self.accounts.clone(),
                self.sign_mode.clone(),
            )),
            StageId::IncrementSequence => {
                Box::new(IncrementSequenceStage::new(self.accounts.clone()))
            }
            StageId::RedundantRelay => Box::new(RedundantRelayStage::new(self.relay.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_helpers::TestChain;

    #[test]
    fn test_empty_options_report_every_missing_capability() {
        let err = PipelineOptions::new().build().unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingCapabilities(vec![
                Capability::AccountLedger,
                Capability::FeeLedger,
                Capability::SignModeHandler,
                Capability::SimulationGasCeiling,
                Capability::TxCountStore,
            ])
        );
    }

    #[test]
    fn test_partial_options_report_only_missing() {
        let chain = TestChain::new();
        let mut options = chain.options();
        options.fee_ledger = None;
        options.tx_count_store = None;

        let err = options.build().unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingCapabilities(vec![Capability::FeeLedger, Capability::TxCountStore])
        );
        assert_eq!(
            err.to_string(),
            "Missing required capabilities: fee ledger, tx count store"
        );
    }

    #[test]
    fn test_optional_capabilities_not_required() {
        let chain = TestChain::new();
        let mut options = chain.options();
        options.fee_grants = None;
        options.relay_registry = None;
        assert!(options.missing_capabilities().is_empty());
        assert!(options.build().is_ok());
    }

    #[test]
    fn test_build_uses_canonical_order() {
        let handler = TestChain::new().options().build().unwrap();
        assert_eq!(handler.stage_order(), CANONICAL_ORDER.to_vec());
    }

    #[test]
    fn test_custom_order_validation() {
        let chain = TestChain::new();

        assert!(matches!(
            chain.options().build_with_order(&[]),
            Err(BuildError::InvalidStageOrder(_))
        ));
        assert!(matches!(
            chain
                .options()
                .build_with_order(&[StageId::ValidateBasic, StageId::SetUpContext]),
            Err(BuildError::InvalidStageOrder(_))
        ));
        assert!(matches!(
            chain.options().build_with_order(&[
                StageId::SetUpContext,
                StageId::DeductFee,
                StageId::DeductFee
            ]),
            Err(BuildError::InvalidStageOrder(_))
        ));

        let handler = chain
            .options()
            .build_with_order(&[StageId::SetUpContext, StageId::ValidateBasic])
            .unwrap();
        assert_eq!(
            handler.stage_order(),
            vec![StageId::SetUpContext, StageId::ValidateBasic]
        );
    }

    #[test]
    fn test_missing_capabilities_checked_before_order() {
        let err = PipelineOptions::new().build_with_order(&[]).unwrap_err();
        assert!(matches!(err, BuildError::MissingCapabilities(_)));
    }
}

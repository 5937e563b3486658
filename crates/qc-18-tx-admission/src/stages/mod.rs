//! # Admission Stages
//!
//! One module per stage. A stage is stateless apart from the capabilities it
//! wraps: it reads and writes the invocation's [`Context`] and either lets the
//! chain continue, halts it with an outcome, or rejects the transaction.
//!
//! | # | Stage | Capabilities |
//! |---|-------|--------------|
//! | 1 | `SetUpContext` | none |
//! | 2 | `LimitSimulationGas` | simulation gas ceiling |
//! | 3 | `CountTx` | tx-count store |
//! | 4 | `ExtensionOptions` | extension-option checker |
//! | 5 | `ValidateBasic` | none |
//! | 6 | `TxTimeoutHeight` | none |
//! | 7 | `ValidateMemo` | account ledger |
//! | 8 | `ConsumeGasForTxSize` | account ledger |
//! | 9 | `DeductFee` | account ledger, fee ledger, fee grants, fee checker |
//! | 10 | `SetPubKey` | account ledger |
//! | 11 | `ValidateSigCount` | account ledger |
//! | 12 | `SigGasConsume` | account ledger, signature gas consumer |
//! | 13 | `SigVerification` | account ledger, sign-mode handler |
//! | 14 | `IncrementSequence` | account ledger |
//! | 15 | `RedundantRelay` | relay registry |

pub mod deduct_fee;
pub mod ext_options;
pub mod increment_sequence;
pub mod memo;
pub mod redundant_relay;
pub mod set_pubkey;
pub mod setup;
pub mod sig_count;
pub mod sig_gas;
pub mod sig_verify;
pub mod simulation_gas;
pub mod timeout;
pub mod tx_count;
pub mod tx_size;
pub mod validate_basic;

use crate::domain::context::{Context, SignerMeta};
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::domain::signing::{SignatureData, SIMULATION_PUBKEY};
use crate::ports::outbound::AccountLedger;
use shared_types::{Address, PacketId, SignMode, Transaction};

/// Outcome of a successful invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Every stage passed; the transaction may execute.
    Accepted,
    /// Every packet in the transaction was already relayed. Not a failure,
    /// but nothing downstream should execute.
    RedundantRelay { packets: Vec<PacketId> },
}

impl Admission {
    pub fn is_redundant_relay(&self) -> bool {
        matches!(self, Self::RedundantRelay { .. })
    }
}

/// What the chain does after a stage passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop here and report `Admission` as the invocation's outcome.
    Halt(Admission),
}

/// A single admission check.
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError>;
}

/// Resolve signer `index` without touching the context or ledger state.
///
/// The key comes from the transaction if provided, else from the account.
/// In simulation a missing key resolves to the placeholder key.
pub(crate) fn resolve_signer(
    accounts: &dyn AccountLedger,
    tx: &Transaction,
    index: usize,
    address: Address,
    simulate: bool,
) -> Result<SignerMeta, AdmissionError> {
    let account = accounts
        .account(&address)?
        .ok_or_else(|| AdmissionError::UnknownSigner {
            address,
            reason: "account does not exist".into(),
        })?;

    let provided = tx
        .auth_info
        .signer_infos
        .get(index)
        .and_then(|info| info.public_key.clone());

    let (pub_key, simulated) = match (account.pub_key, provided) {
        (Some(stored), _) => (stored, false),
        (None, Some(provided)) => (provided, false),
        (None, None) if simulate => (SIMULATION_PUBKEY, true),
        (None, None) => {
            return Err(AdmissionError::UnknownSigner {
                address,
                reason: "public key neither stored nor provided".into(),
            })
        }
    };

    Ok(SignerMeta {
        address,
        account_number: account.account_number,
        sequence: account.sequence,
        pub_key,
        simulated,
    })
}

/// Cached signer metadata, resolving it when an earlier stage did not.
pub(crate) fn signer_meta(
    ctx: &Context,
    accounts: &dyn AccountLedger,
    tx: &Transaction,
    index: usize,
    address: Address,
    simulate: bool,
) -> Result<SignerMeta, AdmissionError> {
    match ctx.signer(&address) {
        Some(meta) => Ok(meta.clone()),
        None => resolve_signer(accounts, tx, index, address, simulate),
    }
}

/// Decode signer `index`'s signature. Undecodable data is tolerated in
/// simulation, where signatures are usually empty placeholders.
pub(crate) fn signature_data(
    tx: &Transaction,
    index: usize,
    address: Address,
    simulate: bool,
) -> Result<SignatureData, AdmissionError> {
    let raw = tx.signatures.get(index).map(Vec::as_slice).unwrap_or(&[]);
    let placeholder = || SignatureData::Single {
        mode: SignMode::Direct,
        signature: raw.to_vec(),
    };

    let Some(info) = tx.auth_info.signer_infos.get(index) else {
        if simulate {
            return Ok(placeholder());
        }
        return Err(AdmissionError::StructuralInvalid(format!(
            "missing signer info for signer {index}"
        )));
    };

    match SignatureData::decode(&info.mode_info, raw) {
        Ok(data) => Ok(data),
        Err(_) if simulate => Ok(placeholder()),
        Err(e) => Err(AdmissionError::InvalidSignature {
            signer: address,
            reason: e.to_string(),
        }),
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers {
    //! Transaction and chain fixtures shared by stage and pipeline tests.

    use crate::adapters::memory::{
        InMemoryAccountLedger, InMemoryBank, InMemoryFeeGrants, InMemoryRelayRegistry,
        InMemoryTxCounter,
    };
    use crate::adapters::sign_mode::DefaultSignModeHandler;
    use crate::config::{AdmissionConfig, SimulationGasCeiling};
    use crate::domain::context::{Context, ExecMode};
    use crate::domain::signing::test_helpers::Secp256k1Signer;
    use crate::pipeline::builder::PipelineOptions;
    use crate::ports::outbound::{AccountLedger, SignModeHandler, SignerData};
    use shared_types::{
        Address, AuthInfo, Coins, Fee, ModeInfo, Msg, MsgSend, PublicKey, SignMode, SignerInfo,
        Transaction, TxBody,
    };
    use std::sync::Arc;

    pub const CHAIN_ID: &str = "qc-testnet-1";
    pub const DENOM: &str = "stake";

    /// In-memory capability set with one funded account.
    pub struct TestChain {
        pub accounts: Arc<InMemoryAccountLedger>,
        pub bank: Arc<InMemoryBank>,
        pub fee_grants: Arc<InMemoryFeeGrants>,
        pub relay: Arc<InMemoryRelayRegistry>,
        pub tx_counter: Arc<InMemoryTxCounter>,
        pub sign_mode: Arc<DefaultSignModeHandler>,
        pub config: AdmissionConfig,
    }

    impl TestChain {
        pub fn new() -> Self {
            let config = AdmissionConfig::for_testing();
            let accounts = Arc::new(InMemoryAccountLedger::new());
            accounts.create_module_account(&config.fee_collector);
            Self {
                accounts,
                bank: Arc::new(InMemoryBank::new()),
                fee_grants: Arc::new(InMemoryFeeGrants::new()),
                relay: Arc::new(InMemoryRelayRegistry::new()),
                tx_counter: Arc::new(InMemoryTxCounter::new()),
                sign_mode: Arc::new(DefaultSignModeHandler::new()),
                config,
            }
        }

        /// Options with every capability wired to this chain.
        pub fn options(&self) -> PipelineOptions {
            PipelineOptions::new()
                .with_account_ledger(self.accounts.clone())
                .with_fee_ledger(self.bank.clone())
                .with_sign_mode_handler(self.sign_mode.clone())
                .with_simulation_gas_ceiling(SimulationGasCeiling::new(Some(3_000_000)))
                .with_tx_count_store(self.tx_counter.clone())
                .with_fee_grants(self.fee_grants.clone())
                .with_relay_registry(self.relay.clone())
                .with_config(self.config.clone())
        }

        /// Create an account for `signer` with `sequence` and a balance.
        pub fn fund(&self, signer: &Secp256k1Signer, sequence: u64, balance: u128) -> Address {
            let address = signer.public_key.address();
            self.accounts.create_account(address);
            self.accounts.set_sequence(&address, sequence);
            if balance > 0 {
                self.bank.set_balance(address, DENOM, balance);
            }
            address
        }
    }

    impl Default for TestChain {
        fn default() -> Self {
            Self::new()
        }
    }

    pub fn check_ctx(height: u64) -> Context {
        Context::new(CHAIN_ID, height, 1_700_000_000).with_exec_mode(ExecMode::Check)
    }

    pub fn deliver_ctx(height: u64) -> Context {
        Context::new(CHAIN_ID, height, 1_700_000_000).with_exec_mode(ExecMode::Deliver)
    }

    pub fn send_msg(from: Address, amount: u128) -> Msg {
        Msg::Send(MsgSend {
            from_address: from,
            to_address: [0xEE; 20],
            amount: Coins::single(DENOM, amount).unwrap_or_else(|_| Coins::empty()),
        })
    }

    /// An unsigned single-signer transaction carrying the signer's key.
    pub fn unsigned_tx(
        msgs: Vec<Msg>,
        pub_key: &PublicKey,
        sequence: u64,
        fee: u128,
        gas: u64,
    ) -> Transaction {
        Transaction {
            body: TxBody {
                messages: msgs,
                ..Default::default()
            },
            auth_info: AuthInfo {
                signer_infos: vec![SignerInfo {
                    public_key: Some(pub_key.clone()),
                    mode_info: ModeInfo::Single {
                        mode: SignMode::Direct,
                    },
                    sequence,
                }],
                fee: Fee {
                    amount: if fee == 0 {
                        Coins::empty()
                    } else {
                        Coins::single(DENOM, fee).unwrap_or_else(|_| Coins::empty())
                    },
                    gas_limit: gas,
                    payer: None,
                    granter: None,
                },
            },
            signatures: vec![Vec::new()],
        }
    }

    /// Fill in signature `index` the way the default sign-mode handler
    /// reconstructs it.
    pub fn sign_tx(
        chain: &TestChain,
        tx: &mut Transaction,
        index: usize,
        signer: &Secp256k1Signer,
    ) {
        let address = signer.public_key.address();
        let account = chain
            .accounts
            .account(&address)
            .ok()
            .flatten()
            .map(|a| a.account_number)
            .unwrap_or(0);
        let data = SignerData {
            address,
            chain_id: CHAIN_ID.into(),
            account_number: account,
            sequence: tx.auth_info.signer_infos[index].sequence,
            pub_key: signer.public_key.clone(),
        };
        let bytes = chain
            .sign_mode
            .get_sign_bytes(SignMode::Direct, &data, tx)
            .unwrap_or_default();
        tx.signatures[index] = signer.sign(&bytes);
    }

    /// A signed, funded single-signer bank send.
    pub fn signed_send(
        chain: &TestChain,
        signer: &Secp256k1Signer,
        sequence: u64,
        fee: u128,
        gas: u64,
    ) -> Transaction {
        let address = signer.public_key.address();
        let mut tx = unsigned_tx(
            vec![send_msg(address, 10)],
            &signer.public_key,
            sequence,
            fee,
            gas,
        );
        sign_tx(chain, &mut tx, 0, signer);
        tx
    }
}

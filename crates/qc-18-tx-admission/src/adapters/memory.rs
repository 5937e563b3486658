//! In-memory capability providers.
//!
//! Used by tests, benchmarks and single-process tooling. Each provider guards
//! its state with `parking_lot` locks; multi-key mutations (fee transfer,
//! grant consumption) happen under one write lock so they are all-or-nothing.

use crate::domain::params::{Account, AuthParams};
use crate::ports::outbound::{
    AccountLedger, FeeGrantError, FeeGrantRegistry, FeeLedger, FeeLedgerError, LedgerError,
    RelayRegistry, TxCountStore,
};
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, Coin, Coins, Msg, PacketId, PublicKey, RelayAction};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Deterministic address of a named module account.
pub fn module_address(name: &str) -> Address {
    use sha2::{Digest, Sha256};

    let digest = Sha256::digest(format!("module/{name}").as_bytes());
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[..20]);
    address
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Account ledger backed by a hash map.
pub struct InMemoryAccountLedger {
    accounts: RwLock<HashMap<Address, Account>>,
    params: RwLock<AuthParams>,
    next_account_number: Mutex<u64>,
}

impl InMemoryAccountLedger {
    pub fn new() -> Self {
        Self::with_params(AuthParams::default())
    }

    pub fn with_params(params: AuthParams) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            params: RwLock::new(params),
            next_account_number: Mutex::new(0),
        }
    }

    pub fn set_params(&self, params: AuthParams) {
        *self.params.write() = params;
    }

    /// Create an account with the next account number; returns the existing
    /// account if there is one.
    pub fn create_account(&self, address: Address) -> Account {
        let mut accounts = self.accounts.write();
        if let Some(existing) = accounts.get(&address) {
            return existing.clone();
        }
        let mut next = self.next_account_number.lock();
        let account = Account::new(address, *next);
        *next += 1;
        accounts.insert(address, account.clone());
        debug!(
            address = %hex::encode(address),
            account_number = account.account_number,
            "[qc-18] Account created"
        );
        account
    }

    /// Create the named module account.
    pub fn create_module_account(&self, name: &str) -> Address {
        let address = module_address(name);
        self.create_account(address);
        address
    }

    /// Insert or replace an account verbatim.
    pub fn insert(&self, account: Account) {
        self.accounts.write().insert(account.address, account);
    }

    pub fn set_sequence(&self, address: &Address, sequence: u64) {
        if let Some(account) = self.accounts.write().get_mut(address) {
            account.sequence = sequence;
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

impl Default for InMemoryAccountLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountLedger for InMemoryAccountLedger {
    fn params(&self) -> AuthParams {
        self.params.read().clone()
    }

    fn account(&self, address: &Address) -> Result<Option<Account>, LedgerError> {
        Ok(self.accounts.read().get(address).cloned())
    }

    fn module_address(&self, name: &str) -> Address {
        module_address(name)
    }

    fn set_pub_key(&self, address: &Address, pub_key: PublicKey) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(address)
            .ok_or(LedgerError::AccountNotFound(*address))?;
        account.pub_key = Some(pub_key);
        Ok(())
    }

    fn increment_sequence(&self, address: &Address) -> Result<u64, LedgerError> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(address)
            .ok_or(LedgerError::AccountNotFound(*address))?;
        account.sequence = account
            .sequence
            .checked_add(1)
            .ok_or_else(|| LedgerError::Store("sequence overflow".into()))?;
        Ok(account.sequence)
    }
}

// =============================================================================
// BALANCES
// =============================================================================

/// Fee ledger backed by a `(address, denom) -> amount` map.
pub struct InMemoryBank {
    balances: RwLock<HashMap<(Address, String), u128>>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_balance(&self, address: Address, denom: &str, amount: u128) {
        self.balances
            .write()
            .insert((address, denom.to_string()), amount);
    }

    pub fn balance(&self, address: &Address, denom: &str) -> u128 {
        self.balances
            .read()
            .get(&(*address, denom.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeLedger for InMemoryBank {
    fn spendable(&self, address: &Address, denom: &str) -> Result<u128, LedgerError> {
        Ok(self.balance(address, denom))
    }

    fn deduct_fee(
        &self,
        payer: &Address,
        collector: &Address,
        fee: &Coins,
    ) -> Result<(), FeeLedgerError> {
        let mut balances = self.balances.write();

        // check every denom before moving anything
        for coin in fee {
            let available = balances
                .get(&(*payer, coin.denom.clone()))
                .copied()
                .unwrap_or(0);
            if available < coin.amount {
                return Err(FeeLedgerError::InsufficientFunds {
                    denom: coin.denom.clone(),
                    required: coin.amount,
                    available,
                });
            }
            let collected = balances
                .get(&(*collector, coin.denom.clone()))
                .copied()
                .unwrap_or(0);
            if collected.checked_add(coin.amount).is_none() {
                return Err(FeeLedgerError::Store("collector balance overflow".into()));
            }
        }

        for coin in fee {
            if let Some(balance) = balances.get_mut(&(*payer, coin.denom.clone())) {
                *balance -= coin.amount;
            }
            *balances
                .entry((*collector, coin.denom.clone()))
                .or_insert(0) += coin.amount;
        }
        Ok(())
    }
}

// =============================================================================
// FEE GRANTS
// =============================================================================

/// Basic allowance: an optional total spend limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicAllowance {
    /// `None` means unlimited.
    pub spend_limit: Option<Coins>,
}

impl BasicAllowance {
    fn check(&self, fee: &Coins) -> Result<(), FeeGrantError> {
        let Some(limit) = &self.spend_limit else {
            return Ok(());
        };
        for coin in fee {
            let left = limit.amount_of(&coin.denom);
            if left < coin.amount {
                return Err(FeeGrantError::AllowanceExceeded(format!(
                    "{} left, {} requested",
                    Coin::new(coin.denom.clone(), left),
                    coin
                )));
            }
        }
        Ok(())
    }

    /// Subtract `fee` from the limit. Returns true when the allowance is spent.
    fn spend(&mut self, fee: &Coins) -> Result<bool, FeeGrantError> {
        let Some(limit) = &self.spend_limit else {
            return Ok(false);
        };
        let remaining: Vec<Coin> = limit
            .iter()
            .map(|c| Coin::new(c.denom.clone(), c.amount.saturating_sub(fee.amount_of(&c.denom))))
            .filter(|c| !c.is_zero())
            .collect();
        let remaining =
            Coins::new(remaining).map_err(|e| FeeGrantError::Store(e.to_string()))?;
        let spent = remaining.is_empty();
        self.spend_limit = Some(remaining);
        Ok(spent)
    }
}

/// Fee-grant registry keyed by `(granter, grantee)`.
pub struct InMemoryFeeGrants {
    grants: RwLock<HashMap<(Address, Address), BasicAllowance>>,
}

impl InMemoryFeeGrants {
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
        }
    }

    /// Grant up to `spend_limit` in fees.
    pub fn grant(&self, granter: Address, grantee: Address, spend_limit: Coins) {
        self.grants.write().insert(
            (granter, grantee),
            BasicAllowance {
                spend_limit: Some(spend_limit),
            },
        );
    }

    pub fn grant_unlimited(&self, granter: Address, grantee: Address) {
        self.grants
            .write()
            .insert((granter, grantee), BasicAllowance { spend_limit: None });
    }

    pub fn revoke(&self, granter: &Address, grantee: &Address) {
        self.grants.write().remove(&(*granter, *grantee));
    }

    /// Remaining spend limit, `None` when no limited grant exists.
    pub fn remaining(&self, granter: &Address, grantee: &Address) -> Option<Coins> {
        self.grants
            .read()
            .get(&(*granter, *grantee))
            .and_then(|allowance| allowance.spend_limit.clone())
    }
}

impl Default for InMemoryFeeGrants {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeGrantRegistry for InMemoryFeeGrants {
    fn check_allowance(
        &self,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        _msgs: &[Msg],
    ) -> Result<(), FeeGrantError> {
        self.grants
            .read()
            .get(&(*granter, *grantee))
            .ok_or(FeeGrantError::NoAllowance)?
            .check(fee)
    }

    fn use_granted_fees(
        &self,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        _msgs: &[Msg],
    ) -> Result<(), FeeGrantError> {
        let mut grants = self.grants.write();
        let key = (*granter, *grantee);
        let allowance = grants.get_mut(&key).ok_or(FeeGrantError::NoAllowance)?;
        allowance.check(fee)?;
        if allowance.spend(fee)? {
            grants.remove(&key);
        }
        Ok(())
    }
}

// =============================================================================
// RELAY
// =============================================================================

/// Relay registry remembering processed `(action, packet)` pairs.
pub struct InMemoryRelayRegistry {
    processed: RwLock<HashSet<(RelayAction, PacketId)>>,
}

impl InMemoryRelayRegistry {
    pub fn new() -> Self {
        Self {
            processed: RwLock::new(HashSet::new()),
        }
    }

    pub fn mark_processed(&self, action: RelayAction, packet: PacketId) {
        self.processed.write().insert((action, packet));
    }
}

impl Default for InMemoryRelayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayRegistry for InMemoryRelayRegistry {
    fn is_processed(&self, action: RelayAction, packet: &PacketId) -> Result<bool, LedgerError> {
        Ok(self.processed.read().contains(&(action, packet.clone())))
    }
}

// =============================================================================
// TX COUNTER
// =============================================================================

#[derive(Default)]
struct CounterState {
    height: u64,
    count: u32,
    per_type: HashMap<&'static str, u64>,
}

/// Per-block transaction counter with per-message-type tallies.
pub struct InMemoryTxCounter {
    state: Mutex<CounterState>,
}

impl InMemoryTxCounter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CounterState::default()),
        }
    }

    /// Messages of `type_url` counted in the current block.
    pub fn type_count(&self, type_url: &str) -> u64 {
        self.state.lock().per_type.get(type_url).copied().unwrap_or(0)
    }

    /// Transactions counted in the current block.
    pub fn count(&self) -> u32 {
        self.state.lock().count
    }
}

impl Default for InMemoryTxCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TxCountStore for InMemoryTxCounter {
    fn increment(&self, height: u64, msg_type_urls: &[&'static str]) -> Result<u32, LedgerError> {
        let mut state = self.state.lock();
        if state.height != height {
            *state = CounterState {
                height,
                ..CounterState::default()
            };
        }
        let index = state.count;
        state.count = index
            .checked_add(1)
            .ok_or_else(|| LedgerError::Store("tx counter overflow".into()))?;
        for type_url in msg_type_urls {
            *state.per_type.entry(*type_url).or_insert(0) += 1;
        }
        Ok(index)
    }
}

//! Mock oracle for testing without network calls.

use super::{Oracle, OracleError, OracleResult};
use crate::domain::amount::pow10;
use crate::domain::{Address, StrategyBalances};
use alloy_primitives::U256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Readable state of one mocked contract. A `None` field reverts when read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockContract {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub asset: Option<Address>,
    pub price_per_share: Option<U256>,
    pub total_assets: Option<U256>,
    pub total_supply: Option<U256>,
    pub performance_fee: Option<u16>,
    /// Reference units per one whole native unit, scaled by the contract's decimals.
    pub reference_rate: Option<U256>,
    pub balances: Option<StrategyBalances>,
}

impl MockContract {
    /// A contract exposing ERC-4626 style metadata.
    pub fn token(name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            name: Some(name.to_string()),
            symbol: Some(symbol.to_string()),
            decimals: Some(decimals),
            ..Default::default()
        }
    }

    pub fn with_asset(mut self, asset: Address) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn with_price_per_share(mut self, pps: U256) -> Self {
        self.price_per_share = Some(pps);
        self
    }

    pub fn with_total_assets(mut self, total_assets: U256) -> Self {
        self.total_assets = Some(total_assets);
        self
    }

    pub fn with_total_supply(mut self, total_supply: U256) -> Self {
        self.total_supply = Some(total_supply);
        self
    }

    pub fn with_performance_fee(mut self, bps: u16) -> Self {
        self.performance_fee = Some(bps);
        self
    }

    pub fn with_reference_rate(mut self, rate: U256) -> Self {
        self.reference_rate = Some(rate);
        self
    }

    pub fn with_balances(mut self, balances: StrategyBalances) -> Self {
        self.balances = Some(balances);
        self
    }
}

/// In-memory oracle. Unknown contracts revert on every read.
///
/// State can be changed between events through `&self` so a shared
/// `Arc<MockOracle>` can model prices moving mid-scenario.
#[derive(Debug, Default)]
pub struct MockOracle {
    contracts: RwLock<HashMap<Address, MockContract>>,
}

impl MockOracle {
    /// Create a new mock oracle with no contracts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contract to the mock oracle.
    pub fn with_contract(self, address: Address, contract: MockContract) -> Self {
        self.set_contract(address, contract);
        self
    }

    pub fn set_contract(&self, address: Address, contract: MockContract) {
        self.write().insert(address, contract);
    }

    /// Update one contract in place, creating an empty one if missing.
    pub fn update<F: FnOnce(&mut MockContract)>(&self, address: Address, f: F) {
        let mut contracts = self.write();
        f(contracts.entry(address).or_default());
    }

    pub fn set_price_per_share(&self, address: Address, pps: Option<U256>) {
        self.update(address, |c| c.price_per_share = pps);
    }

    pub fn set_total_assets(&self, address: Address, total_assets: Option<U256>) {
        self.update(address, |c| c.total_assets = total_assets);
    }

    pub fn set_reference_rate(&self, address: Address, rate: Option<U256>) {
        self.update(address, |c| c.reference_rate = rate);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Address, MockContract>> {
        self.contracts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read<T>(
        &self,
        contract: Address,
        field: &str,
        get: impl FnOnce(&MockContract) -> Option<T>,
    ) -> OracleResult<T> {
        let contracts = self
            .contracts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        contracts
            .get(&contract)
            .and_then(get)
            .ok_or_else(|| OracleError::Reverted(format!("{} not available on {}", field, contract)))
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn name(&self, contract: Address) -> OracleResult<String> {
        self.read(contract, "name", |c| c.name.clone())
    }

    async fn symbol(&self, contract: Address) -> OracleResult<String> {
        self.read(contract, "symbol", |c| c.symbol.clone())
    }

    async fn decimals(&self, contract: Address) -> OracleResult<u8> {
        self.read(contract, "decimals", |c| c.decimals)
    }

    async fn asset(&self, contract: Address) -> OracleResult<Address> {
        self.read(contract, "asset", |c| c.asset)
    }

    async fn price_per_share(&self, contract: Address) -> OracleResult<U256> {
        self.read(contract, "pricePerShare", |c| c.price_per_share)
    }

    async fn total_assets(&self, contract: Address) -> OracleResult<U256> {
        self.read(contract, "totalAssets", |c| c.total_assets)
    }

    async fn total_supply(&self, contract: Address) -> OracleResult<U256> {
        self.read(contract, "totalSupply", |c| c.total_supply)
    }

    async fn performance_fee(&self, strategy: Address) -> OracleResult<u16> {
        self.read(strategy, "performanceFee", |c| c.performance_fee)
    }

    async fn convert_native_to_reference(
        &self,
        strategy: Address,
        amount: U256,
    ) -> OracleResult<U256> {
        let (rate, decimals) = self.read(strategy, "convertAssetToBorrowToken", |c| {
            c.reference_rate.map(|rate| (rate, c.decimals.unwrap_or(18)))
        })?;
        let one_unit = pow10(decimals)
            .ok_or_else(|| OracleError::Decode(format!("decimals {} out of range", decimals)))?;
        amount
            .checked_mul(rate)
            .map(|scaled| scaled / one_unit)
            .ok_or_else(|| OracleError::Reverted("conversion overflow".to_string()))
    }

    async fn strategy_balances(&self, strategy: Address) -> OracleResult<StrategyBalances> {
        self.read(strategy, "getRealAssetBalance", |c| c.balances)
    }
}

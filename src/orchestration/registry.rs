//! Get-or-create for vault and strategy records.

use super::LedgerContext;
use crate::domain::{Address, Strategy, Vault};
use crate::oracle::{STRATEGY_DEFAULTS, VAULT_DEFAULTS};

impl LedgerContext {
    /// Load a vault, creating it from on-chain metadata on first reference.
    ///
    /// Failed metadata reads fall back to [`VAULT_DEFAULTS`]; only storage
    /// failures are returned.
    pub async fn get_or_create_vault(&self, address: Address) -> Result<Vault, sqlx::Error> {
        if let Some(vault) = self.repo.get_vault(&address).await? {
            return Ok(vault);
        }

        let oracle = self.oracle.as_ref();
        let (name, symbol, decimals, asset, pps) = futures::join!(
            oracle.name(address),
            oracle.symbol(address),
            oracle.decimals(address),
            oracle.asset(address),
            oracle.price_per_share(address)
        );

        let d = &VAULT_DEFAULTS;
        let mut vault = Vault::new(
            address,
            d.name(name, address),
            d.symbol(symbol, address),
            d.asset(asset, address),
            d.decimals(decimals, address),
        );
        vault.price_per_share = d.price_per_share(pps, address);

        self.repo.register_vault(&vault).await?;
        Ok(vault)
    }

    /// Load a strategy, creating it unassigned and active on first reference.
    pub async fn get_or_create_strategy(&self, address: Address) -> Result<Strategy, sqlx::Error> {
        if let Some(strategy) = self.repo.get_strategy(&address).await? {
            return Ok(strategy);
        }

        let oracle = self.oracle.as_ref();
        let (name, symbol, decimals, asset, pps, fee) = futures::join!(
            oracle.name(address),
            oracle.symbol(address),
            oracle.decimals(address),
            oracle.asset(address),
            oracle.price_per_share(address),
            oracle.performance_fee(address)
        );

        let d = &STRATEGY_DEFAULTS;
        let mut strategy = Strategy::new(
            address,
            d.name(name, address),
            d.symbol(symbol, address),
            d.asset(asset, address),
            d.decimals(decimals, address),
        );
        strategy.price_per_share = d.price_per_share(pps, address);
        strategy.performance_fee_bps = d.performance_fee_bps(fee, address);

        self.repo.register_strategy(&strategy).await?;
        Ok(strategy)
    }
}

//! JSON-RPC oracle backed by `eth_call`.

use super::{Oracle, OracleError, OracleResult};
use crate::domain::{Address, StrategyBalances};
use alloy_primitives::{B256, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

sol! {
    /// ERC-4626 vault surface the ledger reads.
    interface IVaultV3 {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function asset() external view returns (address);
        function pricePerShare() external view returns (uint256);
        function totalAssets() external view returns (uint256);
        function totalSupply() external view returns (uint256);
    }

    /// Leveraged strategy extensions.
    interface IStrategy {
        function performanceFee() external view returns (uint16);
        function convertAssetToBorrowToken(uint256 amount) external view returns (uint256);
        function getRealAssetBalance() external view returns (uint256, uint256, uint256);
    }

    /// Pre-ERC-20-metadata tokens that return fixed-size names.
    interface ILegacyMetadata {
        function name() external view returns (bytes32);
        function symbol() external view returns (bytes32);
    }
}

/// Oracle that reads vault and strategy contracts through an Ethereum node.
#[derive(Debug, Clone)]
pub struct RpcOracle {
    client: Client,
    rpc_url: String,
}

impl RpcOracle {
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
        }
    }

    /// Run a view call and decode its return values.
    async fn read<C: SolCall>(&self, to: Address, call: C) -> OracleResult<C::Return> {
        let data = self.eth_call(to, C::SIGNATURE, call.abi_encode()).await?;
        decode_returns::<C>(&data)
    }

    /// Raw `eth_call`, retried on transient transport failures.
    async fn eth_call(&self, to: Address, method: &str, calldata: Vec<u8>) -> OracleResult<Vec<u8>> {
        debug!(contract = %to, method, "eth_call");

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                {"to": to.to_string(), "data": format!("0x{}", hex::encode(calldata))},
                "latest"
            ]
        });

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let response = retry(backoff, || async {
            let response = self
                .client
                .post(&self.rpc_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(OracleError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(OracleError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(OracleError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(OracleError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(OracleError::Decode(e.to_string())))
        })
        .await?;

        parse_rpc_result(&response)
    }

    /// `string` metadata, falling back to the `bytes32` layout of older tokens.
    async fn read_text<C, L>(&self, to: Address, call: C) -> OracleResult<String>
    where
        C: SolCall,
        L: SolCall,
        C::Return: Into<String>,
        L::Return: Into<B256>,
    {
        let data = self.eth_call(to, C::SIGNATURE, call.abi_encode()).await?;
        decode_text::<C, L>(&data)
    }
}

impl From<IVaultV3::nameReturn> for String {
    fn from(r: IVaultV3::nameReturn) -> Self {
        r._0
    }
}

impl From<IVaultV3::symbolReturn> for String {
    fn from(r: IVaultV3::symbolReturn) -> Self {
        r._0
    }
}

impl From<ILegacyMetadata::nameReturn> for B256 {
    fn from(r: ILegacyMetadata::nameReturn) -> Self {
        r._0
    }
}

impl From<ILegacyMetadata::symbolReturn> for B256 {
    fn from(r: ILegacyMetadata::symbolReturn) -> Self {
        r._0
    }
}

#[async_trait]
impl Oracle for RpcOracle {
    async fn name(&self, contract: Address) -> OracleResult<String> {
        self.read_text::<_, ILegacyMetadata::nameCall>(contract, IVaultV3::nameCall {})
            .await
    }

    async fn symbol(&self, contract: Address) -> OracleResult<String> {
        self.read_text::<_, ILegacyMetadata::symbolCall>(contract, IVaultV3::symbolCall {})
            .await
    }

    async fn decimals(&self, contract: Address) -> OracleResult<u8> {
        Ok(self.read(contract, IVaultV3::decimalsCall {}).await?._0)
    }

    async fn asset(&self, contract: Address) -> OracleResult<Address> {
        Ok(self.read(contract, IVaultV3::assetCall {}).await?._0)
    }

    async fn price_per_share(&self, contract: Address) -> OracleResult<U256> {
        Ok(self.read(contract, IVaultV3::pricePerShareCall {}).await?._0)
    }

    async fn total_assets(&self, contract: Address) -> OracleResult<U256> {
        Ok(self.read(contract, IVaultV3::totalAssetsCall {}).await?._0)
    }

    async fn total_supply(&self, contract: Address) -> OracleResult<U256> {
        Ok(self.read(contract, IVaultV3::totalSupplyCall {}).await?._0)
    }

    async fn performance_fee(&self, strategy: Address) -> OracleResult<u16> {
        Ok(self.read(strategy, IStrategy::performanceFeeCall {}).await?._0)
    }

    async fn convert_native_to_reference(
        &self,
        strategy: Address,
        amount: U256,
    ) -> OracleResult<U256> {
        let call = IStrategy::convertAssetToBorrowTokenCall { amount };
        Ok(self.read(strategy, call).await?._0)
    }

    async fn strategy_balances(&self, strategy: Address) -> OracleResult<StrategyBalances> {
        let balances = self
            .read(strategy, IStrategy::getRealAssetBalanceCall {})
            .await?;
        Ok(StrategyBalances {
            total_assets: balances._0,
            total_collateral: balances._1,
            total_debt: balances._2,
        })
    }
}

fn decode_returns<C: SolCall>(data: &[u8]) -> OracleResult<C::Return> {
    C::abi_decode_returns(data, true)
        .map_err(|e| OracleError::Decode(format!("{}: {}", C::SIGNATURE, e)))
}

fn decode_text<C, L>(data: &[u8]) -> OracleResult<String>
where
    C: SolCall,
    L: SolCall,
    C::Return: Into<String>,
    L::Return: Into<B256>,
{
    match decode_returns::<C>(data) {
        Ok(text) => Ok(text.into()),
        Err(e) => match decode_returns::<L>(data) {
            Ok(word) => bytes32_text(word.into()),
            Err(_) => Err(e),
        },
    }
}

/// NUL-padded `bytes32` text.
fn bytes32_text(word: B256) -> OracleResult<String> {
    let end = word.iter().position(|b| *b == 0).unwrap_or(word.len());
    String::from_utf8(word[..end].to_vec()).map_err(|e| OracleError::Decode(e.to_string()))
}

fn parse_rpc_result(response: &serde_json::Value) -> OracleResult<Vec<u8>> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Err(OracleError::Reverted(message.to_string()));
    }

    let result = response
        .get("result")
        .and_then(|r| r.as_str())
        .ok_or_else(|| OracleError::Decode("missing result".to_string()))?;

    let bytes = hex::decode(result.trim_start_matches("0x"))
        .map_err(|e| OracleError::Decode(e.to_string()))?;
    if bytes.is_empty() {
        // Calls to accounts without code succeed with no data.
        return Err(OracleError::Reverted("empty return data".to_string()));
    }
    Ok(bytes)
}

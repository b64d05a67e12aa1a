use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    config::ProviderConfig,
    error::{CheckerError, Result},
    provider::{
        types::{TokenBalancesResult, TokenMetadata},
        BalanceProvider,
    },
};

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Alchemy token API over JSON-RPC.
pub struct AlchemyClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    next_id: AtomicU64,
}

impl AlchemyClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.request_timeout_ms.min(5_000)))
            .build()?;

        Ok(Self {
            http,
            endpoint: Self::endpoint(config),
            next_id: AtomicU64::new(1),
        })
    }

    /// `None` when there is no key and no explicit endpoint to call.
    fn endpoint(config: &ProviderConfig) -> Option<String> {
        let api_key = config.api_key.as_deref().filter(|k| !k.trim().is_empty());

        match (config.base_url.as_deref(), api_key) {
            (Some(base), Some(key)) => Some(format!("{}/{}", base.trim_end_matches('/'), key)),
            (Some(base), None) => Some(base.to_string()),
            (None, Some(key)) => Some(format!(
                "https://{}.g.alchemy.com/v2/{}",
                config.network, key
            )),
            (None, None) => None,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let endpoint = self.endpoint.as_deref().ok_or(CheckerError::MissingApiKey)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        debug!(method, id, "Sending provider request");

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response: RpcResponse<T> = self
            .http
            .post(endpoint)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        unwrap_response(method, response)
    }
}

fn unwrap_response<T>(method: &str, response: RpcResponse<T>) -> Result<T> {
    if let Some(error) = response.error {
        return Err(CheckerError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    response
        .result
        .ok_or_else(|| CheckerError::Provider(format!("{} returned no result", method)))
}

/// Pick the entry for `contract` out of a balances response.
fn select_balance(result: TokenBalancesResult, contract: &str) -> Result<Option<String>> {
    let entry = result
        .token_balances
        .into_iter()
        .find(|entry| entry.contract_address.eq_ignore_ascii_case(contract));

    match entry {
        Some(entry) => match entry.error {
            Some(error) => Err(CheckerError::Provider(error)),
            None => Ok(entry.token_balance),
        },
        None => Ok(None),
    }
}

#[async_trait]
impl BalanceProvider for AlchemyClient {
    async fn get_token_balance(&self, address: &str, contract: &str) -> Result<Option<String>> {
        let result: TokenBalancesResult = self
            .call("alchemy_getTokenBalances", json!([address, [contract]]))
            .await?;

        select_balance(result, contract)
    }

    async fn get_token_metadata(&self, contract: &str) -> Result<TokenMetadata> {
        self.call("alchemy_getTokenMetadata", json!([contract])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_config(api_key: Option<&str>, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.map(str::to_string),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_endpoint_from_network_and_key() {
        let endpoint = AlchemyClient::endpoint(&provider_config(Some("k3y"), None));
        assert_eq!(
            endpoint.as_deref(),
            Some("https://arb-mainnet.g.alchemy.com/v2/k3y")
        );
    }

    #[test]
    fn test_endpoint_with_base_url() {
        let endpoint =
            AlchemyClient::endpoint(&provider_config(Some("k3y"), Some("http://localhost:8545/")));
        assert_eq!(endpoint.as_deref(), Some("http://localhost:8545/k3y"));

        let keyless = AlchemyClient::endpoint(&provider_config(None, Some("http://localhost:8545")));
        assert_eq!(keyless.as_deref(), Some("http://localhost:8545"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert!(AlchemyClient::endpoint(&provider_config(Some("  "), None)).is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_every_call() {
        let client = AlchemyClient::new(&provider_config(None, None)).unwrap();

        let balance = client.get_token_balance("0xabc", "0xdef").await;
        assert!(matches!(balance, Err(CheckerError::MissingApiKey)));

        let metadata = client.get_token_metadata("0xdef").await;
        assert!(matches!(metadata, Err(CheckerError::MissingApiKey)));
    }

    #[test]
    fn test_select_balance_matches_contract_case_insensitively() {
        let result: TokenBalancesResult = serde_json::from_str(
            r#"{
                "address": "0xabc",
                "tokenBalances": [
                    {"contractAddress": "0x8F86F63A4300F2035D203A00A6E4AE89F504BFA3", "tokenBalance": "0x3e8", "error": null}
                ]
            }"#,
        )
        .unwrap();

        let balance = select_balance(result, "0x8f86f63a4300f2035d203a00a6e4ae89f504bfa3").unwrap();
        assert_eq!(balance.as_deref(), Some("0x3e8"));
    }

    #[test]
    fn test_select_balance_without_entry() {
        let result: TokenBalancesResult =
            serde_json::from_str(r#"{"address": "0xabc", "tokenBalances": []}"#).unwrap();
        assert_eq!(select_balance(result, "0xdef").unwrap(), None);
    }

    #[test]
    fn test_select_balance_entry_error() {
        let result: TokenBalancesResult = serde_json::from_str(
            r#"{"address": "0xabc", "tokenBalances": [{"contractAddress": "0xdef", "tokenBalance": null, "error": "execution reverted"}]}"#,
        )
        .unwrap();

        let err = select_balance(result, "0xdef").unwrap_err();
        assert!(err.to_string().contains("execution reverted"));
    }

    #[test]
    fn test_rpc_error_body() {
        let response: RpcResponse<TokenMetadata> = serde_json::from_str(
            r#"{"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "invalid address"}}"#,
        )
        .unwrap();

        match unwrap_response("alchemy_getTokenMetadata", response) {
            Err(CheckerError::Rpc { code, message }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "invalid address");
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_result_with_nulls() {
        let response: RpcResponse<TokenMetadata> = serde_json::from_str(
            r#"{"jsonrpc": "2.0", "id": 2, "result": {"name": "Bera Pack", "symbol": null, "decimals": 0, "logo": null}}"#,
        )
        .unwrap();

        let metadata = unwrap_response("alchemy_getTokenMetadata", response).unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Bera Pack"));
        assert_eq!(metadata.symbol, None);
        assert_eq!(metadata.decimals, Some(0));
    }
}

use serde::{Deserialize, Serialize};

pub const UNKNOWN_TOKEN_NAME: &str = "Unknown Token";
pub const UNKNOWN_TOKEN_SYMBOL: &str = "???";

/// Decimals assumed when the metadata omits them.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Token metadata as reported by the provider. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub logo: Option<String>,
}

/// Metadata with every fallback applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub logo: Option<String>,
    /// False when the lookup failed and defaults stand in.
    pub fetched: bool,
}

impl TokenMetadata {
    /// Fill missing fields from the rule's own naming.
    pub fn resolve(self, fallback_name: &str, fallback_symbol: &str) -> ResolvedMetadata {
        ResolvedMetadata {
            name: non_empty(self.name).unwrap_or_else(|| fallback_name.to_string()),
            symbol: non_empty(self.symbol).unwrap_or_else(|| fallback_symbol.to_string()),
            decimals: self.decimals.unwrap_or(DEFAULT_DECIMALS),
            logo: self.logo,
            fetched: true,
        }
    }
}

impl TokenMetadata {
    /// Raw view of the metadata: missing fields read as unknown, decimals as 0.
    pub fn resolve_unknown(self) -> ResolvedMetadata {
        ResolvedMetadata {
            name: non_empty(self.name).unwrap_or_else(|| UNKNOWN_TOKEN_NAME.to_string()),
            symbol: non_empty(self.symbol).unwrap_or_else(|| UNKNOWN_TOKEN_SYMBOL.to_string()),
            decimals: self.decimals.unwrap_or(0),
            logo: self.logo,
            fetched: true,
        }
    }
}

impl ResolvedMetadata {
    /// Stand-in used when the metadata lookup itself failed.
    pub fn unavailable() -> Self {
        Self {
            name: UNKNOWN_TOKEN_NAME.to_string(),
            symbol: UNKNOWN_TOKEN_SYMBOL.to_string(),
            decimals: 0,
            logo: None,
            fetched: false,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalancesResult {
    pub address: String,
    pub token_balances: Vec<TokenBalanceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceEntry {
    pub contract_address: String,
    pub token_balance: Option<String>,
    pub error: Option<String>,
}

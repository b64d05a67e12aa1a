use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{CheckerError, Result};

/// Environment variable the original web page read the indexer key from.
pub const LEGACY_API_KEY_VAR: &str = "ARBITRUM_SCANNER_API";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_network")]
    pub network: String,
    /// Overrides the endpoint derived from `network`.
    pub base_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EligibilityConfig {
    /// Token counts at or below this are treated as dust.
    #[serde(default = "default_epsilon")]
    pub epsilon: Decimal,
    #[serde(default = "default_rule_timeout_ms")]
    pub rule_timeout_ms: u64,
    #[serde(default)]
    pub concurrent: bool,
}

/// One token collection that counts towards the airdrop.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RuleConfig {
    pub id: String,
    pub contract_address: String,
    pub display_name: String,
    pub unit_usd_value: Decimal,
    #[serde(default = "default_fallback_symbol")]
    pub fallback_symbol: String,
}

fn default_network() -> String {
    "arb-mainnet".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_epsilon() -> Decimal {
    crate::eligibility::default_epsilon()
}

fn default_rule_timeout_ms() -> u64 {
    15_000
}

fn default_fallback_symbol() -> String {
    "BERA".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            network: default_network(),
            base_url: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            rule_timeout_ms: default_rule_timeout_ms(),
            concurrent: false,
        }
    }
}

impl EligibilityConfig {
    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms)
    }
}

impl RuleConfig {
    pub fn new(
        id: impl Into<String>,
        contract_address: impl Into<String>,
        display_name: impl Into<String>,
        unit_usd_value: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            contract_address: contract_address.into(),
            display_name: display_name.into(),
            unit_usd_value,
            fallback_symbol: default_fallback_symbol(),
        }
    }
}

impl Config {
    /// Load from a config file (extension optional) overlaid with `MONI_*` env vars.
    pub fn load(path: &str) -> Result<Self> {
        dotenv::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("MONI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder.build()?.try_deserialize()?)
    }

    /// Parse a TOML document, skipping `MONI_*` overrides.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;

        Self::finish(raw.try_deserialize()?)
    }

    fn finish(mut config: Config) -> Result<Self> {
        if config
            .provider
            .api_key
            .as_deref()
            .map_or(true, |key| key.trim().is_empty())
        {
            config.provider.api_key = std::env::var(LEGACY_API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(CheckerError::Config("no eligibility rules configured".to_string()));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(CheckerError::Config(format!("duplicate rule id: {}", rule.id)));
            }
            if rule.contract_address.trim().is_empty() {
                return Err(CheckerError::Config(format!(
                    "rule {} has an empty contract address",
                    rule.id
                )));
            }
            if rule.unit_usd_value.is_sign_negative() && !rule.unit_usd_value.is_zero() {
                return Err(CheckerError::Config(format!(
                    "rule {} has a negative unit value",
                    rule.id
                )));
            }
        }

        if self.eligibility.epsilon.is_sign_negative() && !self.eligibility.epsilon.is_zero() {
            return Err(CheckerError::Config("epsilon must not be negative".to_string()));
        }

        if self.eligibility.rule_timeout_ms == 0 {
            return Err(CheckerError::Config("rule_timeout_ms must be greater than zero".to_string()));
        }

        if self.provider.request_timeout_ms == 0 {
            return Err(CheckerError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn rule(&self, id: &str) -> Option<&RuleConfig> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [provider]
        network = "arb-mainnet"

        [eligibility]
        epsilon = "0.000001"
        concurrent = true

        [[rules]]
        id = "bera_pack"
        contract_address = "0x8f86f63a4300f2035d203a00a6e4ae89f504bfa3"
        display_name = "Bera Pack"
        unit_usd_value = 470

        [[rules]]
        id = "bera_frens"
        contract_address = "0x1111111111111111111111111111111111111111"
        display_name = "Bera Frens"
        unit_usd_value = "12.5"
        fallback_symbol = "FREN"
    "#;

    #[test]
    fn test_parse_rule_table_in_order() {
        let config = Config::from_toml(SAMPLE).unwrap();

        let ids: Vec<&str> = config.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["bera_pack", "bera_frens"]);
        assert_eq!(config.rules[0].unit_usd_value, Decimal::from(470));
        assert_eq!(config.rules[0].fallback_symbol, "BERA");
        assert_eq!(config.rules[1].unit_usd_value, Decimal::new(125, 1));
        assert_eq!(config.rules[1].fallback_symbol, "FREN");
        assert!(config.eligibility.concurrent);
        assert_eq!(config.eligibility.epsilon, Decimal::new(1, 6));
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_toml(
            r#"
            [[rules]]
            id = "a"
            contract_address = "0xabc"
            display_name = "A"
            unit_usd_value = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.network, "arb-mainnet");
        assert_eq!(config.provider.request_timeout_ms, 10_000);
        assert_eq!(config.eligibility.rule_timeout_ms, 15_000);
        assert!(!config.eligibility.concurrent);
    }

    #[test]
    fn test_rejects_empty_rule_table() {
        let err = Config::from_toml("[provider]\nnetwork = \"arb-mainnet\"\n").unwrap_err();
        assert!(matches!(err, CheckerError::Config(_)));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = Config::from_toml(
            r#"
            [[rules]]
            id = "a"
            contract_address = "0xabc"
            display_name = "A"
            unit_usd_value = 1

            [[rules]]
            id = "a"
            contract_address = "0xdef"
            display_name = "A again"
            unit_usd_value = 2
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate rule id"));
    }

    #[test]
    fn test_rejects_negative_unit_value() {
        let err = Config::from_toml(
            r#"
            [[rules]]
            id = "a"
            contract_address = "0xabc"
            display_name = "A"
            unit_usd_value = -3
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("negative unit value"));
    }

    #[test]
    fn test_rejects_zero_timeouts() {
        let rule = r#"
            [[rules]]
            id = "a"
            contract_address = "0xabc"
            display_name = "A"
            unit_usd_value = 1
        "#;

        let err = Config::from_toml(&format!("[eligibility]\nrule_timeout_ms = 0\n{}", rule)).unwrap_err();
        assert!(err.to_string().contains("rule_timeout_ms"));

        let err = Config::from_toml(&format!("[provider]\nrequest_timeout_ms = 0\n{}", rule)).unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.rules.len(), 2);
        assert!(config.rule("bera_frens").is_some());
        assert!(config.rule("missing").is_none());
    }
}

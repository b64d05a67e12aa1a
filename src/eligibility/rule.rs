use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::RuleConfig,
    eligibility::{
        amount::TokenAmountFormatter,
        hex::HexDecimalConverter,
        verdict::{EligibilityVerdict, IneligibleReason},
    },
    error::{CheckerError, Result},
    provider::{BalanceProvider, ResolvedMetadata},
};

/// Dust threshold used when none is configured.
pub fn default_epsilon() -> Decimal {
    Decimal::new(1, 6)
}

/// Raw view of one contract's holding, without any eligibility policy.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingReport {
    pub rule_id: String,
    pub contract_address: String,
    pub raw_balance: String,
    pub decimal_balance: String,
    pub formatted_balance: String,
    pub metadata: ResolvedMetadata,
}

/// A token collection that qualifies its holders for the airdrop.
pub struct EligibilityRule {
    config: RuleConfig,
    provider: Arc<dyn BalanceProvider>,
    formatter: TokenAmountFormatter,
    epsilon: Decimal,
    timeout: Option<Duration>,
}

impl EligibilityRule {
    pub fn new(config: RuleConfig, provider: Arc<dyn BalanceProvider>) -> Self {
        Self {
            config,
            provider,
            formatter: TokenAmountFormatter::default(),
            epsilon: default_epsilon(),
            timeout: None,
        }
    }

    pub fn with_epsilon(mut self, epsilon: Decimal) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Bound the whole evaluation, provider calls included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Evaluate `address` against this rule.
    ///
    /// Never fails: provider errors and timeouts come back as ineligible
    /// verdicts whose message starts with `Error:`.
    pub async fn evaluate(&self, address: &str) -> EligibilityVerdict {
        let address = address.trim();
        if address.is_empty() {
            debug!("Rule {}: no wallet connected", self.config.id);
            return EligibilityVerdict::no_wallet();
        }

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.check(address)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(CheckerError::Timeout(limit.as_millis() as u64)),
            },
            None => self.check(address).await,
        };

        match outcome {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Rule {} failed for {}: {}", self.config.id, address, e);
                EligibilityVerdict::error(e)
            }
        }
    }

    async fn check(&self, address: &str) -> Result<EligibilityVerdict> {
        let raw = match self
            .provider
            .get_token_balance(address, &self.config.contract_address)
            .await?
        {
            Some(raw) if !HexDecimalConverter::is_zero_literal(&raw) => raw,
            _ => {
                debug!("Rule {}: {} holds nothing", self.config.id, address);
                return Ok(EligibilityVerdict::not_eligible(IneligibleReason::ZeroBalance));
            }
        };

        let amount = match HexDecimalConverter::to_decimal(&raw) {
            Ok(amount) => amount,
            Err(e) => {
                warn!("Rule {}: ignoring balance for {}: {}", self.config.id, address, e);
                return Ok(EligibilityVerdict::not_eligible(IneligibleReason::MalformedHex));
            }
        };

        let metadata = self.metadata().await;
        let formatted = self.formatter.format(amount, metadata.decimals)?;
        let token_count = formatted.token_count()?;

        debug!(
            "Rule {}: {} holds {} {} (raw {})",
            self.config.id,
            address,
            formatted.display(),
            metadata.symbol,
            raw
        );

        if token_count <= self.epsilon {
            return Ok(EligibilityVerdict::not_eligible(IneligibleReason::BelowEpsilon));
        }

        let usd_value = token_count
            .checked_mul(self.config.unit_usd_value)
            .ok_or_else(|| {
                CheckerError::AmountOutOfRange(format!(
                    "{} x {} overflows",
                    token_count, self.config.unit_usd_value
                ))
            })?
            .normalize();

        Ok(EligibilityVerdict::Eligible {
            balance_display: formatted.display().to_string(),
            token_count,
            usd_value,
            token_symbol: metadata.symbol,
            token_name: metadata.name,
        })
    }

    /// Metadata lookups never fail a rule; defaults stand in instead.
    async fn metadata(&self) -> ResolvedMetadata {
        match self.provider.get_token_metadata(&self.config.contract_address).await {
            Ok(metadata) => metadata.resolve(&self.config.display_name, &self.config.fallback_symbol),
            Err(e) => {
                warn!(
                    "Rule {}: metadata unavailable for {}: {}",
                    self.config.id, self.config.contract_address, e
                );
                ResolvedMetadata::unavailable()
            }
        }
    }

    /// Look up the raw holding for `address`, `None` when the provider has no entry.
    ///
    /// Unlike `evaluate`, missing metadata fields show as unknown with 0 decimals,
    /// and a failed lookup leaves the balance as the bare integer.
    pub async fn holding(&self, address: &str) -> Result<Option<HoldingReport>> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        let raw = match self
            .provider
            .get_token_balance(address, &self.config.contract_address)
            .await?
        {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let amount = HexDecimalConverter::to_decimal(&raw)?;
        let metadata = match self.provider.get_token_metadata(&self.config.contract_address).await {
            Ok(metadata) => metadata.resolve_unknown(),
            Err(e) => {
                warn!("Rule {}: metadata unavailable for holding: {}", self.config.id, e);
                ResolvedMetadata::unavailable()
            }
        };
        let formatted_balance = if metadata.fetched {
            self.formatter.format(amount, metadata.decimals)?.display().to_string()
        } else {
            amount.to_string()
        };

        Ok(Some(HoldingReport {
            rule_id: self.config.id.clone(),
            contract_address: self.config.contract_address.clone(),
            raw_balance: raw,
            decimal_balance: amount.to_string(),
            formatted_balance,
            metadata,
        }))
    }
}

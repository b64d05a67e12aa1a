use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::{
    config::Config,
    eligibility::{rule::EligibilityRule, verdict::EligibilityVerdict},
    provider::BalanceProvider,
};

/// Verdict of a single rule within an aggregate run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub display_name: String,
    pub verdict: EligibilityVerdict,
}

/// Combined outcome of every rule for one address
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub address: String,
    pub verdicts: Vec<RuleOutcome>,
    pub total_eligible_count: u64,
    pub total_usd_value: Decimal,
    pub checked_at: DateTime<Utc>,
}

impl AggregateResult {
    /// Totals only ever count eligible verdicts.
    pub fn from_outcomes(address: &str, verdicts: Vec<RuleOutcome>) -> Self {
        let total_eligible_count = verdicts
            .iter()
            .map(|outcome| outcome.verdict.truncated_count())
            .fold(0u64, u64::saturating_add);
        let total_usd_value = verdicts
            .iter()
            .map(|outcome| outcome.verdict.usd_value())
            .fold(Decimal::ZERO, |total, value| total.saturating_add(value));

        Self {
            address: address.to_string(),
            verdicts,
            total_eligible_count,
            total_usd_value,
            checked_at: Utc::now(),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.verdicts.iter().any(|outcome| outcome.verdict.is_eligible())
    }

    pub fn eligible_rules(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|outcome| outcome.verdict.is_eligible())
            .count()
    }

    pub fn verdict(&self, rule_id: &str) -> Option<&EligibilityVerdict> {
        self.verdicts
            .iter()
            .find(|outcome| outcome.rule_id == rule_id)
            .map(|outcome| &outcome.verdict)
    }
}

/// Runs the rule table for an address and totals the results.
pub struct EligibilityAggregator {
    rules: Vec<EligibilityRule>,
    concurrent: bool,
}

impl EligibilityAggregator {
    pub fn new(rules: Vec<EligibilityRule>) -> Self {
        Self {
            rules,
            concurrent: false,
        }
    }

    /// Build the configured rule table on top of `provider`.
    pub fn from_config(config: &Config, provider: Arc<dyn BalanceProvider>) -> Self {
        let rules = config
            .rules
            .iter()
            .cloned()
            .map(|rule| {
                EligibilityRule::new(rule, provider.clone())
                    .with_epsilon(config.eligibility.epsilon)
                    .with_timeout(config.eligibility.rule_timeout())
            })
            .collect();

        Self::new(rules).concurrent(config.eligibility.concurrent)
    }

    /// Evaluate rules side by side instead of one after another.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn rules(&self) -> &[EligibilityRule] {
        &self.rules
    }

    /// One verdict per rule, in table order. A failing rule never stops the rest.
    pub async fn evaluate_all(&self, address: &str) -> AggregateResult {
        let verdicts = if self.concurrent {
            join_all(self.rules.iter().map(|rule| rule.evaluate(address))).await
        } else {
            let mut verdicts = Vec::with_capacity(self.rules.len());
            for rule in &self.rules {
                verdicts.push(rule.evaluate(address).await);
            }
            verdicts
        };

        let outcomes = self
            .rules
            .iter()
            .zip(verdicts)
            .map(|(rule, verdict)| RuleOutcome {
                rule_id: rule.id().to_string(),
                display_name: rule.config().display_name.clone(),
                verdict,
            })
            .collect();

        let result = AggregateResult::from_outcomes(address, outcomes);

        info!(
            "Checked {} rules for {}: {} eligible, {} tokens, ${} total",
            result.verdicts.len(),
            address,
            result.eligible_rules(),
            result.total_eligible_count,
            result.total_usd_value.round_dp(2)
        );

        result
    }
}

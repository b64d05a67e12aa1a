pub mod aggregator;
pub mod amount;
pub mod hex;
pub mod rule;
pub mod verdict;

pub use aggregator::{AggregateResult, EligibilityAggregator, RuleOutcome};
pub use amount::{FormattedAmount, TokenAmountFormatter};
pub use hex::HexDecimalConverter;
pub use rule::{default_epsilon, EligibilityRule, HoldingReport};
pub use verdict::{EligibilityVerdict, IneligibleReason};

pub mod config;
pub mod eligibility;
pub mod error;
pub mod provider;
pub mod session;
pub mod utils;

pub use config::{Config, RuleConfig};
pub use eligibility::{AggregateResult, EligibilityAggregator, EligibilityRule, EligibilityVerdict};
pub use error::{CheckerError, Result};
pub use provider::{AlchemyClient, BalanceProvider};
pub use session::{CheckSession, CheckTicket, SessionState};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

pub const NO_WALLET_MESSAGE: &str = "No wallet connected";
pub const NOT_ELIGIBLE_MESSAGE: &str = "You're not eligible";

/// Why a rule turned an address down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    NoWalletConnected,
    ZeroBalance,
    /// Non-zero on chain but nothing left after rounding.
    BelowEpsilon,
    ProviderError,
    MalformedHex,
}

/// Outcome of one rule for one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EligibilityVerdict {
    Eligible {
        balance_display: String,
        token_count: Decimal,
        usd_value: Decimal,
        token_symbol: String,
        token_name: String,
    },
    Ineligible {
        reason: IneligibleReason,
        message: String,
    },
}

impl EligibilityVerdict {
    pub fn no_wallet() -> Self {
        Self::Ineligible {
            reason: IneligibleReason::NoWalletConnected,
            message: NO_WALLET_MESSAGE.to_string(),
        }
    }

    /// Zero, dust and unreadable balances all read the same to the holder.
    pub fn not_eligible(reason: IneligibleReason) -> Self {
        Self::Ineligible {
            reason,
            message: NOT_ELIGIBLE_MESSAGE.to_string(),
        }
    }

    pub fn error(err: impl std::fmt::Display) -> Self {
        Self::Ineligible {
            reason: IneligibleReason::ProviderError,
            message: format!("Error: {}", err),
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    pub fn reason(&self) -> Option<IneligibleReason> {
        match self {
            Self::Eligible { .. } => None,
            Self::Ineligible { reason, .. } => Some(*reason),
        }
    }

    /// The message shown for ineligible verdicts.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Eligible { .. } => None,
            Self::Ineligible { message, .. } => Some(message),
        }
    }

    pub fn usd_value(&self) -> Decimal {
        match self {
            Self::Eligible { usd_value, .. } => *usd_value,
            Self::Ineligible { .. } => Decimal::ZERO,
        }
    }

    /// Whole tokens held, 0 for ineligible verdicts.
    pub fn truncated_count(&self) -> u64 {
        match self {
            Self::Eligible { token_count, .. } => token_count.trunc().to_u64().unwrap_or(u64::MAX),
            Self::Ineligible { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligible(count: Decimal, usd: Decimal) -> EligibilityVerdict {
        EligibilityVerdict::Eligible {
            balance_display: count.to_string(),
            token_count: count,
            usd_value: usd,
            token_symbol: "BP".to_string(),
            token_name: "Bera Pack".to_string(),
        }
    }

    #[test]
    fn test_truncated_count_floors() {
        assert_eq!(eligible(Decimal::new(1099, 2), Decimal::ZERO).truncated_count(), 10);
        assert_eq!(eligible(Decimal::new(5, 1), Decimal::ZERO).truncated_count(), 0);
        assert_eq!(EligibilityVerdict::no_wallet().truncated_count(), 0);
    }

    #[test]
    fn test_ineligible_views() {
        let verdict = EligibilityVerdict::not_eligible(IneligibleReason::ZeroBalance);
        assert!(!verdict.is_eligible());
        assert_eq!(verdict.message(), Some(NOT_ELIGIBLE_MESSAGE));
        assert_eq!(verdict.usd_value(), Decimal::ZERO);
        assert_eq!(verdict.reason(), Some(IneligibleReason::ZeroBalance));
    }

    #[test]
    fn test_error_message_prefix() {
        let verdict = EligibilityVerdict::error("boom");
        assert_eq!(verdict.message(), Some("Error: boom"));
        assert_eq!(verdict.reason(), Some(IneligibleReason::ProviderError));
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let json = serde_json::to_value(EligibilityVerdict::no_wallet()).unwrap();
        assert_eq!(json["status"], "ineligible");
        assert_eq!(json["reason"], "no_wallet_connected");
        assert_eq!(json["message"], NO_WALLET_MESSAGE);
    }
}

use primitive_types::U256;

use crate::error::{CheckerError, Result};

pub struct HexDecimalConverter;

impl HexDecimalConverter {
    /// Parse a provider balance such as `"0x3e8"` into its integer value.
    ///
    /// The `0x`/`0X` prefix is optional. Anything but hex digits, an empty
    /// digit string, or a value wider than 256 bits is rejected.
    pub fn to_decimal(hex: &str) -> Result<U256> {
        let digits = Self::strip_prefix(hex.trim());

        if digits.is_empty() {
            return Err(CheckerError::MalformedHex(format!("{:?} has no digits", hex)));
        }

        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(CheckerError::MalformedHex(format!(
                "{:?} contains non-hex character {:?}",
                hex, bad
            )));
        }

        U256::from_str_radix(digits, 16)
            .map_err(|_| CheckerError::MalformedHex(format!("{:?} exceeds 256 bits", hex)))
    }

    /// True for the provider's "holds nothing" representation.
    pub fn is_zero_literal(hex: &str) -> bool {
        let digits = Self::strip_prefix(hex.trim());
        !digits.is_empty() && digits.chars().all(|c| c == '0')
    }

    fn strip_prefix(hex: &str) -> &str {
        hex.strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex)
    }
}

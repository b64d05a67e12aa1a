use primitive_types::U256;
use rust_decimal::Decimal;

use crate::error::{CheckerError, Result};
use crate::utils::group_digits;

pub const MIN_FRACTION_DIGITS: u32 = 2;
pub const MAX_FRACTION_DIGITS: u32 = 6;

/// Largest scale a `Decimal` carries.
const DECIMAL_MAX_SCALE: u32 = 28;
const DECIMAL_MANTISSA_BITS: usize = 96;

/// Scales raw token integers by their decimals and renders them for display.
///
/// All scaling is done on 256-bit integers: the raw amount is rounded
/// half-to-even to `max_fraction_digits` places, then printed with at least
/// `min_fraction_digits` places and the integer part grouped in threes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmountFormatter {
    min_fraction_digits: u32,
    max_fraction_digits: u32,
    group_separator: Option<char>,
}

impl Default for TokenAmountFormatter {
    fn default() -> Self {
        Self {
            min_fraction_digits: MIN_FRACTION_DIGITS,
            max_fraction_digits: MAX_FRACTION_DIGITS,
            group_separator: Some(','),
        }
    }
}

/// A rounded token amount together with its display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedAmount {
    display: String,
    /// Amount in units of `10^-scale` tokens.
    scaled: U256,
    scale: u32,
}

impl FormattedAmount {
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_zero(&self) -> bool {
        self.scaled.is_zero()
    }

    /// The rounded amount as a decimal token count.
    ///
    /// Fraction digits are dropped (half to even) only when the whole amount
    /// would not otherwise fit the 96-bit mantissa. Fails once the whole-token
    /// part alone is too wide.
    pub fn token_count(&self) -> Result<Decimal> {
        let ten = U256::from(10u8);
        let mut mantissa = self.scaled;
        let mut scale = self.scale;

        while scale > 0 && (mantissa % ten).is_zero() && !mantissa.is_zero() {
            mantissa /= ten;
            scale -= 1;
        }

        while scale > 0 && mantissa.bits() > DECIMAL_MANTISSA_BITS {
            mantissa = round_half_even(mantissa, ten);
            scale -= 1;
        }

        if mantissa.bits() > DECIMAL_MANTISSA_BITS {
            return Err(CheckerError::AmountOutOfRange(format!(
                "{} tokens does not fit a decimal",
                self.display
            )));
        }

        Decimal::try_from_i128_with_scale(mantissa.low_u128() as i128, scale)
            .map(|count| count.normalize())
            .map_err(|e| CheckerError::AmountOutOfRange(format!("{}: {}", self.display, e)))
    }
}

impl TokenAmountFormatter {
    pub fn new(min_fraction_digits: u32, max_fraction_digits: u32) -> Self {
        let max = max_fraction_digits.min(DECIMAL_MAX_SCALE);
        Self {
            min_fraction_digits: min_fraction_digits.min(max),
            max_fraction_digits: max,
            ..Self::default()
        }
    }

    pub fn without_grouping(mut self) -> Self {
        self.group_separator = None;
        self
    }

    /// Format `raw / 10^decimals`.
    pub fn format(&self, raw: U256, decimals: u8) -> Result<FormattedAmount> {
        let scale = self.max_fraction_digits;
        let scaled = rescale(raw, u32::from(decimals), scale)?;

        let unit = pow10(scale).ok_or_else(|| {
            CheckerError::AmountOutOfRange(format!("10^{} overflows 256 bits", scale))
        })?;
        let (whole, fraction) = scaled.div_mod(unit);

        let mut fraction_digits = format!("{:0>width$}", fraction.to_string(), width = scale as usize);
        while fraction_digits.len() > self.min_fraction_digits as usize && fraction_digits.ends_with('0') {
            fraction_digits.pop();
        }

        let mut display = self.group(&whole.to_string());
        if !fraction_digits.is_empty() {
            display.push('.');
            display.push_str(&fraction_digits);
        }

        Ok(FormattedAmount {
            display,
            scaled,
            scale,
        })
    }

    fn group(&self, digits: &str) -> String {
        match self.group_separator {
            Some(separator) => group_digits(digits, separator),
            None => digits.to_string(),
        }
    }
}

fn pow10(exp: u32) -> Option<U256> {
    U256::from(10u8).checked_pow(U256::from(exp))
}

/// Re-express `raw * 10^-decimals` in units of `10^-places`, rounding half to even.
fn rescale(raw: U256, decimals: u32, places: u32) -> Result<U256> {
    if decimals <= places {
        let factor = pow10(places - decimals).ok_or_else(|| {
            CheckerError::AmountOutOfRange(format!("10^{} overflows 256 bits", places - decimals))
        })?;
        return raw
            .checked_mul(factor)
            .ok_or_else(|| CheckerError::AmountOutOfRange(format!("{} is too large to scale", raw)));
    }

    let divisor = match pow10(decimals - places) {
        Some(divisor) => divisor,
        // 10^78 already exceeds every U256, so the amount rounds to zero.
        None => return Ok(U256::zero()),
    };

    Ok(round_half_even(raw, divisor))
}

/// `value / divisor` rounded half to even. `divisor` is a power of ten.
fn round_half_even(value: U256, divisor: U256) -> U256 {
    let (quotient, remainder) = value.div_mod(divisor);
    let half = divisor / 2;
    let round_up = remainder > half || (remainder == half && quotient.low_u64() & 1 == 1);

    if round_up {
        quotient + U256::one()
    } else {
        quotient
    }
}

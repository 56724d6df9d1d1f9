use rust_decimal::Decimal;
use std::fmt;

/// Exact `raw / 10^decimals` in canonical scientific form.
///
/// `digits` holds the significant digits with leading and trailing zeros
/// stripped, so two amounts are numerically equal iff both fields are equal.
/// Works for any magnitude, including full uint256 token amounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedAmount {
    digits: String,
    exponent: i64,
}

impl NormalizedAmount {
    pub const ZERO: Self = Self {
        digits: String::new(),
        exponent: 0,
    };

    /// `None` when `raw` is not a plain unsigned integer.
    pub fn new(raw: &str, decimals: Option<u8>) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let significant = raw.trim_start_matches('0');
        if significant.is_empty() {
            return Some(Self::ZERO);
        }

        let digits = significant.trim_end_matches('0');
        let trailing_zeros = i64::try_from(significant.len() - digits.len()).ok()?;
        Some(Self {
            digits: digits.to_string(),
            exponent: trailing_zeros - i64::from(decimals.unwrap_or(0)),
        })
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Decimal view for logging; `None` when the value exceeds `Decimal`'s range.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.is_zero() {
            return Some(Decimal::ZERO);
        }
        Decimal::from_scientific(&format!("{}e{}", self.digits, self.exponent))
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for NormalizedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{d}"),
            None => write!(f, "{}e{}", self.digits, self.exponent),
        }
    }
}

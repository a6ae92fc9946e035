//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog and cart amounts arrive from the API as plain JSON numbers in the
//! currency's standard unit (rupees, not paise). They are held as
//! [`Decimal`] so subtotals never pick up floating-point drift.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Amount in minor units (paise, cents), rounded half away from zero.
    ///
    /// Hosted checkout providers expect integer minor units.
    #[must_use]
    pub fn minor_units(&self) -> i64 {
        let scaled = (self.amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        i64::try_from(scaled).unwrap_or(i64::MAX)
    }

    /// Format for display, e.g. `₹2,499` or `$19.99`.
    ///
    /// Whole amounts are shown without decimals. INR uses Indian digit
    /// grouping (`₹1,00,000`); other currencies group by thousands.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let abs = rounded.abs();
        let whole = abs.trunc();
        let fraction = abs - whole;

        let digits = whole.to_string();
        let grouped = match self.currency_code {
            CurrencyCode::INR => group_indian(&digits),
            _ => group_thousands(&digits),
        };

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(self.currency_code.symbol());
        out.push_str(&grouped);
        if !fraction.is_zero() {
            let minor = i64::try_from((fraction * Decimal::ONE_HUNDRED).trunc()).unwrap_or(0);
            out.push_str(&format!(".{minor:02}"));
        }
        out
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol used in display strings.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let bytes: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

/// Indian grouping: last three digits, then pairs (12,34,567).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let head_chars: Vec<char> = head.chars().collect();
    let mut out = String::new();
    for (i, c) in head_chars.iter().enumerate() {
        if i > 0 && (head_chars.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out.push(',');
    out.push_str(tail);
    out
}

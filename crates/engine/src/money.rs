use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EngineError;

/// Baht amount in satang.
///
/// Arithmetic saturates at the `i64` bounds instead of overflowing.
///
/// Every monetary value in the engine (amounts, allowances, salary figures)
/// goes through this type. The remote sheet stores plain decimal numbers;
/// they are converted once, when rows are decoded.
///
/// ```rust
/// use engine::MoneyCents;
///
/// let rent: MoneyCents = "฿9,000".parse().unwrap();
/// assert_eq!(rent, MoneyCents::new(9_000_00));
/// assert_eq!(rent.to_string(), "฿9000.00");
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Converts a decimal amount, rounding to the nearest minor unit.
    ///
    /// Non-finite input yields zero.
    #[must_use]
    pub fn from_decimal(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        Self((value * 100.0).round() as i64)
    }

    /// Returns the amount as a decimal number, as the remote expects it.
    #[must_use]
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies by a fractional factor (hours, multipliers), rounding once.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::from_decimal(self.to_decimal() * factor)
    }

    /// Reads an amount out of an untyped sheet cell.
    ///
    /// Numbers are taken as is, numeric strings are parsed, anything else
    /// (empty cells, text, booleans, nested values) counts as zero so one dirty
    /// row never blocks aggregation of the rest.
    #[must_use]
    pub fn lenient(cell: Option<&Value>) -> Self {
        Self::from_decimal(lenient_number(cell))
    }

    /// Integer percentage of `part` over `self`, rounded half up and clamped
    /// to `0..=100`. A zero (or negative) total is 0%.
    #[must_use]
    pub fn percent_of(self, part: MoneyCents) -> u8 {
        percent(part.0, self.0)
    }
}

/// Reads a number out of an untyped sheet cell, zero when it is not numeric.
pub(crate) fn lenient_number(cell: Option<&Value>) -> f64 {
    let parsed = match cell {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// `round(part / total * 100)` in integer arithmetic, clamped to `0..=100`.
pub(crate) fn percent(part: i64, total: i64) -> u8 {
    if total <= 0 || part <= 0 {
        return 0;
    }
    let rounded = (i128::from(part) * 100 + i128::from(total) / 2) / i128::from(total);
    rounded.clamp(0, 100) as u8
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}฿{units}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(self.0.saturating_neg())
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses an amount typed by the user.
    ///
    /// An optional sign and `฿` prefix are allowed, `,` groups thousands and
    /// `.` starts at most two decimals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = |why: &str| EngineError::InvalidAmount(format!("{why}: '{s}'"));

        let mut text = s.trim();
        let negative = match text.as_bytes().first() {
            Some(b'-') => true,
            Some(b'+') => false,
            _ => {
                text = text.strip_prefix('฿').unwrap_or(text);
                false
            }
        };
        if negative || text.starts_with('+') {
            text = text[1..].trim_start();
            text = text.strip_prefix('฿').unwrap_or(text);
        }

        let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
        let whole: String = whole.chars().filter(|c| *c != ',').collect();
        if whole.is_empty() && fraction.is_empty() {
            return Err(reject("empty amount"));
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(reject("invalid amount"));
        }
        if fraction.len() > 2 {
            return Err(reject("too many decimals"));
        }

        let baht: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| reject("amount too large"))?
        };
        // "5" after the point means 50 satang.
        let satang: i64 = format!("{fraction:0<2}")
            .parse()
            .map_err(|_| reject("invalid amount"))?;
        let magnitude = baht
            .checked_mul(100)
            .and_then(|v| v.checked_add(satang))
            .ok_or_else(|| reject("amount too large"))?;

        Ok(MoneyCents(if negative { -magnitude } else { magnitude }))
    }
}

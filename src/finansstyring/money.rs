// Amounts in minor units (øre) so sums stay exact

use crate::error::{IntranetError, IntranetResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    pub fn from_f64(value: f64) -> Self {
        Money((value * 100.0).round() as i64)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn abs(&self) -> Money {
        Money(self.0.abs())
    }

    /// Accepts "1234.56", "1234,56", "-1.234,56", "1,234.56" and "12"
    pub fn parse(value: &str) -> IntranetResult<Self> {
        let cleaned: String = value.trim().chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(IntranetError::ArgumentNull("amount"));
        }
        let not_an_amount = || IntranetError::illegal("amount", format!("{} is not an amount", value));
        let too_large = || IntranetError::illegal("amount", format!("{} is too large", value));

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        // The last separator is the decimal separator when followed by 1-2 digits
        let decimal_at = digits
            .rfind(['.', ','])
            .filter(|pos| (1..=2).contains(&(digits.len() - pos - 1)));

        let (whole, fraction, decimal) = match decimal_at {
            Some(pos) => (&digits[..pos], &digits[pos + 1..], digits[pos..].chars().next()),
            None => (digits, "", None),
        };

        let whole = strip_grouping(whole, decimal).ok_or_else(not_an_amount)?;
        if whole.is_empty() && fraction.is_empty() {
            return Err(not_an_amount());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(not_an_amount());
        }

        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| too_large())?
        };
        let minor: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| not_an_amount())? * 10,
            _ => fraction.parse::<i64>().map_err(|_| not_an_amount())?,
        };

        let amount = major
            .checked_mul(100)
            .and_then(|v| v.checked_add(minor))
            .ok_or_else(too_large)?;
        Ok(Money(if negative { -amount } else { amount }))
    }
}

/// Removes thousands separators from the integer part. One separator kind
/// only, never the decimal one, and every group after the first has 3 digits.
fn strip_grouping(whole: &str, decimal: Option<char>) -> Option<String> {
    let mut separators = whole.chars().filter(|c| matches!(c, '.' | ','));
    let Some(grouping) = separators.next() else {
        return Some(whole.to_string());
    };
    if Some(grouping) == decimal || separators.any(|c| c != grouping) {
        return None;
    }

    let mut groups = whole.split(grouping);
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    let mut stripped = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        stripped.push_str(group);
    }
    Some(stripped)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

// Serialized as a decimal number, the way the views carry amounts
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Money::from_f64(value))
    }
}

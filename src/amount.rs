use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Money in whole cents (分). Two decimal places are the only precision the game knows.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const CENT: Amount = Amount(1);

    pub const fn from_cents(cents: u64) -> Self {
        Amount(cents)
    }

    pub const fn from_yuan(yuan: u64) -> Self {
        Amount(yuan * 100)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }

    /// Even split of `self` over `shares`, floored to the cent.
    pub fn per_share(self, shares: u32) -> Amount {
        Amount(self.0 / u64::from(shares.max(1)))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount may have at most two decimal places")]
    TooPrecise,
    #[error("amount must be a plain decimal number, got {0:?}")]
    Malformed(String),
    #[error("amount is too large")]
    Overflow,
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(AmountParseError::Malformed(s.to_string()));
        }
        if frac.len() > 2 {
            return Err(AmountParseError::TooPrecise);
        }

        let yuan: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountParseError::Overflow)?
        };
        let mut cents: u64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| AmountParseError::Malformed(s.to_string()))?
        };
        if frac.len() == 1 {
            cents *= 10;
        }

        yuan.checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Amount)
            .ok_or(AmountParseError::Overflow)
    }
}

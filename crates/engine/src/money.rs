//! Fixed-point money.
//!
//! Every amount in the ledger (expense totals, split shares, balances and
//! settlement payments) is a whole number of cents, so sums compare exactly.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, util::parse_scaled_hundredths};

/// A signed amount of money in cents.
///
/// In a balance, a positive amount is owed *to* the member and a negative
/// one is owed *by* the member.
///
/// ```rust
/// use engine::MoneyCents;
///
/// let dinner: MoneyCents = "45.9".parse().unwrap();
/// assert_eq!(dinner.cents(), 4590);
/// assert_eq!((-dinner).to_string(), "-45.90");
/// assert!("1.999".parse::<MoneyCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Sum of `amounts`, or `None` if any partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let magnitude = self.0.unsigned_abs();
        write!(f, "{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Decimal input with up to two fractional digits; `,` is accepted as the
    /// decimal separator and a leading sign is allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled_hundredths(s, true, "amount").map(Self)
    }
}

impl Add for MoneyCents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for MoneyCents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for MoneyCents {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> i64 {
        s.parse::<MoneyCents>().unwrap().cents()
    }

    #[test]
    fn displays_cents_with_sign() {
        let shown: Vec<String> = [0, 7, 90, 100_000, -1, -2599]
            .into_iter()
            .map(|c| MoneyCents::new(c).to_string())
            .collect();
        assert_eq!(
            shown,
            vec!["0.00", "0.07", "0.90", "1000.00", "-0.01", "-25.99"]
        );
    }

    #[test]
    fn parses_user_input() {
        assert_eq!(parse("3"), 300);
        assert_eq!(parse("3.5"), 350);
        assert_eq!(parse("3,05"), 305);
        assert_eq!(parse(" -12.00 "), -1200);
        assert_eq!(parse("+0.99"), 99);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "abc", "1.234", "1.2.3", "--1", "1e3"] {
            assert!(bad.parse::<MoneyCents>().is_err(), "{bad:?} parsed");
        }
    }

    #[test]
    fn checked_sum_stops_on_overflow() {
        assert_eq!(
            MoneyCents::checked_sum([MoneyCents::new(i64::MAX), MoneyCents::new(1)]),
            None
        );
        assert_eq!(
            MoneyCents::checked_sum([MoneyCents::new(250), MoneyCents::new(-400)]),
            Some(MoneyCents::new(-150))
        );
        assert_eq!(MoneyCents::checked_sum([]), Some(MoneyCents::ZERO));
    }
}

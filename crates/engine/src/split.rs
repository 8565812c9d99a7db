//! Split calculator.
//!
//! Turns an expense total and a [`SplitStrategy`] into exact per-participant
//! shares. Every strategy allocates integer cents and the shares always sum to
//! the expense total; leftover cents are handed out deterministically so the
//! same input always yields the same split.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_scaled_hundredths};

/// Basis points in one whole (`100.00%`).
pub const PERCENT_WHOLE: u32 = 10_000;

/// A percentage in basis points: `Percent::new(3333)` is `33.33%`.
///
/// ```rust
/// use engine::Percent;
///
/// assert_eq!("33.33".parse::<Percent>().unwrap().basis_points(), 3333);
/// assert_eq!(Percent::new(10_000).to_string(), "100.00%");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(u32);

impl Percent {
    #[must_use]
    pub const fn new(basis_points: u32) -> Self {
        Self(basis_points)
    }

    #[must_use]
    pub const fn basis_points(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Percent {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
        let value = parse_scaled_hundredths(trimmed, false, "percentage")?;
        u32::try_from(value)
            .map(Percent)
            .map_err(|_| EngineError::Validation(format!("percentage too large: {s}")))
    }
}

/// Strategy tag persisted alongside an expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Equal,
    Exact,
    Percentage,
    Shares,
}

impl SplitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Exact => "exact",
            Self::Percentage => "percentage",
            Self::Shares => "shares",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SplitKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "exact" => Ok(Self::Exact),
            "percentage" => Ok(Self::Percentage),
            "shares" => Ok(Self::Shares),
            other => Err(EngineError::Validation(format!(
                "invalid split strategy: {other}"
            ))),
        }
    }
}

/// Shared capability of every split strategy: allocate `amount` into `n`
/// integer shares, in participant order, summing exactly to `amount`.
pub trait Allocate {
    fn allocate(&self, amount: MoneyCents, n: usize) -> ResultEngine<Vec<MoneyCents>>;
}

/// Even split; the first `amount % n` participants absorb one extra cent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Equal;

/// Caller supplied amounts, one per participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExactAmounts(pub Vec<MoneyCents>);

/// Percentages summing to exactly `100.00%`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Percentages(pub Vec<Percent>);

/// Integer weights; each participant gets `weight / total` of the amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shares(pub Vec<u32>);

impl Allocate for Equal {
    fn allocate(&self, amount: MoneyCents, n: usize) -> ResultEngine<Vec<MoneyCents>> {
        let count = i64::try_from(n)
            .map_err(|_| EngineError::Validation("too many participants".to_string()))?;
        let base = amount.cents() / count;
        let remainder = usize::try_from(amount.cents() % count).unwrap_or(0);
        Ok((0..n)
            .map(|i| MoneyCents::new(if i < remainder { base + 1 } else { base }))
            .collect())
    }
}

impl Allocate for ExactAmounts {
    fn allocate(&self, amount: MoneyCents, n: usize) -> ResultEngine<Vec<MoneyCents>> {
        ensure_param_count(self.0.len(), n, "exact amounts")?;
        if let Some(negative) = self.0.iter().find(|value| value.is_negative()) {
            return Err(EngineError::Validation(format!(
                "exact amounts must be >= 0, got {negative}"
            )));
        }
        let total = MoneyCents::checked_sum(self.0.iter().copied())
            .ok_or_else(|| EngineError::Validation("exact amounts overflow".to_string()))?;
        if total != amount {
            return Err(EngineError::Validation(format!(
                "exact amounts sum to {total}, expected {amount}"
            )));
        }
        Ok(self.0.clone())
    }
}

impl Allocate for Percentages {
    fn allocate(&self, amount: MoneyCents, n: usize) -> ResultEngine<Vec<MoneyCents>> {
        ensure_param_count(self.0.len(), n, "percentages")?;
        let total: u64 = self.0.iter().map(|p| u64::from(p.basis_points())).sum();
        if total != u64::from(PERCENT_WHOLE) {
            return Err(EngineError::Validation(format!(
                "percentages sum to {}, expected 100.00%",
                Percent::new(u32::try_from(total).unwrap_or(u32::MAX))
            )));
        }
        let weights: Vec<u64> = self.0.iter().map(|p| u64::from(p.basis_points())).collect();
        Ok(largest_remainder(amount, &weights, total))
    }
}

impl Allocate for Shares {
    fn allocate(&self, amount: MoneyCents, n: usize) -> ResultEngine<Vec<MoneyCents>> {
        ensure_param_count(self.0.len(), n, "shares")?;
        let weights: Vec<u64> = self.0.iter().map(|w| u64::from(*w)).collect();
        let total: u64 = weights.iter().sum();
        if total == 0 {
            return Err(EngineError::Validation(
                "share weights must not all be zero".to_string(),
            ));
        }
        Ok(largest_remainder(amount, &weights, total))
    }
}

/// A split strategy with its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitStrategy {
    Equal,
    Exact(Vec<MoneyCents>),
    Percentage(Vec<Percent>),
    Shares(Vec<u32>),
}

impl SplitStrategy {
    pub fn kind(&self) -> SplitKind {
        match self {
            Self::Equal => SplitKind::Equal,
            Self::Exact(_) => SplitKind::Exact,
            Self::Percentage(_) => SplitKind::Percentage,
            Self::Shares(_) => SplitKind::Shares,
        }
    }
}

impl Allocate for SplitStrategy {
    fn allocate(&self, amount: MoneyCents, n: usize) -> ResultEngine<Vec<MoneyCents>> {
        match self {
            Self::Equal => Equal.allocate(amount, n),
            Self::Exact(values) => ExactAmounts(values.clone()).allocate(amount, n),
            Self::Percentage(values) => Percentages(values.clone()).allocate(amount, n),
            Self::Shares(values) => Shares(values.clone()).allocate(amount, n),
        }
    }
}

/// One participant's portion of an expense, before it is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitShare {
    pub member_id: Uuid,
    pub amount: MoneyCents,
}

/// Compute per-participant shares of `amount`.
///
/// Shares come back in participant order and sum to `amount` exactly.
///
/// ```rust
/// use engine::{MoneyCents, SplitStrategy, compute_splits};
/// use uuid::Uuid;
///
/// let people = [Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)];
/// let shares = compute_splits(MoneyCents::new(1000), &SplitStrategy::Equal, &people).unwrap();
/// let cents: Vec<i64> = shares.iter().map(|s| s.amount.cents()).collect();
/// assert_eq!(cents, vec![334, 333, 333]);
/// ```
pub fn compute_splits(
    amount: MoneyCents,
    strategy: &SplitStrategy,
    participants: &[Uuid],
) -> ResultEngine<Vec<SplitShare>> {
    if !amount.is_positive() {
        return Err(EngineError::Validation(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    if participants.is_empty() {
        return Err(EngineError::Validation(
            "at least one participant is required".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(participants.len());
    if let Some(duplicate) = participants.iter().find(|id| !seen.insert(**id)) {
        return Err(EngineError::Validation(format!(
            "participant {duplicate} listed more than once"
        )));
    }

    let amounts = strategy.allocate(amount, participants.len())?;
    Ok(participants
        .iter()
        .zip(amounts)
        .map(|(member_id, amount)| SplitShare {
            member_id: *member_id,
            amount,
        })
        .collect())
}

fn ensure_param_count(got: usize, expected: usize, label: &str) -> ResultEngine<()> {
    if got != expected {
        return Err(EngineError::Validation(format!(
            "expected {expected} {label}, got {got}"
        )));
    }
    Ok(())
}

/// Floor each proportional share, then hand the leftover cents to the
/// participants with the largest fractional remainder (earlier participant
/// wins ties).
///
/// `total` must be positive and equal to the sum of `weights`.
fn largest_remainder(amount: MoneyCents, weights: &[u64], total: u64) -> Vec<MoneyCents> {
    let amount = i128::from(amount.cents());
    let total = i128::from(total);

    let mut shares: Vec<i128> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(i128, usize)> = Vec::with_capacity(weights.len());
    for (index, weight) in weights.iter().enumerate() {
        let scaled = amount * i128::from(*weight);
        shares.push(scaled / total);
        remainders.push((scaled % total, index));
    }

    let allocated: i128 = shares.iter().sum();
    let leftover = usize::try_from(amount - allocated).unwrap_or(0);

    remainders.sort_by(|(rem_a, idx_a), (rem_b, idx_b)| rem_b.cmp(rem_a).then(idx_a.cmp(idx_b)));
    for (_, index) in remainders.into_iter().take(leftover) {
        shares[index] += 1;
    }

    // Each share is at most `amount`, which came from an i64.
    shares
        .into_iter()
        .map(|cents| MoneyCents::new(i64::try_from(cents).unwrap_or(i64::MAX)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people(n: u128) -> Vec<Uuid> {
        (1..=n).map(Uuid::from_u128).collect()
    }

    fn cents(shares: &[SplitShare]) -> Vec<i64> {
        shares.iter().map(|s| s.amount.cents()).collect()
    }

    fn pct(values: &[u32]) -> SplitStrategy {
        SplitStrategy::Percentage(values.iter().copied().map(Percent::new).collect())
    }

    #[test]
    fn equal_gives_remainder_to_first_participants() {
        let shares =
            compute_splits(MoneyCents::new(1000), &SplitStrategy::Equal, &people(3)).unwrap();
        assert_eq!(cents(&shares), vec![334, 333, 333]);
        assert_eq!(shares[0].member_id, Uuid::from_u128(1));

        let shares =
            compute_splits(MoneyCents::new(1001), &SplitStrategy::Equal, &people(3)).unwrap();
        assert_eq!(cents(&shares), vec![334, 334, 333]);
    }

    #[test]
    fn equal_amount_smaller_than_participants() {
        let shares = compute_splits(MoneyCents::new(2), &SplitStrategy::Equal, &people(5)).unwrap();
        assert_eq!(cents(&shares), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn exact_requires_matching_sum() {
        let strategy = SplitStrategy::Exact(vec![MoneyCents::new(600), MoneyCents::new(400)]);
        let shares = compute_splits(MoneyCents::new(1000), &strategy, &people(2)).unwrap();
        assert_eq!(cents(&shares), vec![600, 400]);

        let err = compute_splits(MoneyCents::new(999), &strategy, &people(2)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("exact amounts sum to 10.00, expected 9.99".to_string())
        );
    }

    #[test]
    fn exact_rejects_negative_values() {
        let strategy = SplitStrategy::Exact(vec![MoneyCents::new(1100), MoneyCents::new(-100)]);
        assert!(matches!(
            compute_splits(MoneyCents::new(1000), &strategy, &people(2)),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn percentage_scenario_999_cents() {
        let shares = compute_splits(MoneyCents::new(999), &pct(&[3333, 3333, 3334]), &people(3))
            .unwrap();
        assert_eq!(cents(&shares), vec![333, 333, 333]);
    }

    #[test]
    fn percentage_remainder_goes_to_largest_fraction() {
        // 100 * 1/3 style: floors are 33, 33, 33; fractions .33 .33 .34 -> last wins.
        let shares =
            compute_splits(MoneyCents::new(100), &pct(&[3333, 3333, 3334]), &people(3)).unwrap();
        assert_eq!(cents(&shares), vec![33, 33, 34]);
    }

    #[test]
    fn percentage_must_total_one_hundred() {
        let err = compute_splits(MoneyCents::new(100), &pct(&[5000, 4999]), &people(2)).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("percentages sum to 99.99%, expected 100.00%".to_string())
        );
    }

    #[test]
    fn shares_ties_break_by_participant_order() {
        let strategy = SplitStrategy::Shares(vec![1, 1, 1]);
        let shares = compute_splits(MoneyCents::new(100), &strategy, &people(3)).unwrap();
        assert_eq!(cents(&shares), vec![34, 33, 33]);

        let strategy = SplitStrategy::Shares(vec![2, 1, 0]);
        let shares = compute_splits(MoneyCents::new(1000), &strategy, &people(3)).unwrap();
        assert_eq!(cents(&shares), vec![667, 333, 0]);
    }

    #[test]
    fn shares_reject_zero_total() {
        let strategy = SplitStrategy::Shares(vec![0, 0]);
        assert!(matches!(
            compute_splits(MoneyCents::new(100), &strategy, &people(2)),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert!(matches!(
            compute_splits(MoneyCents::new(100), &SplitStrategy::Equal, &[]),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            compute_splits(MoneyCents::ZERO, &SplitStrategy::Equal, &people(2)),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            compute_splits(MoneyCents::new(-5), &SplitStrategy::Equal, &people(2)),
            Err(EngineError::Validation(_))
        ));
        let dup = [Uuid::from_u128(1), Uuid::from_u128(1)];
        assert!(matches!(
            compute_splits(MoneyCents::new(100), &SplitStrategy::Equal, &dup),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            compute_splits(MoneyCents::new(100), &SplitStrategy::Shares(vec![1]), &people(2)),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn every_strategy_preserves_the_total() {
        for n in 1..=7u128 {
            let participants = people(n);
            let len = participants.len();
            for amount in 1..=250i64 {
                let amount = MoneyCents::new(amount * 7 + 3);
                let mut strategies = vec![
                    SplitStrategy::Equal,
                    SplitStrategy::Shares((1..=len as u32).collect()),
                ];
                // Uneven percentages: everything to the last participant but 1% each to others.
                let others = (len as u32 - 1) * 100;
                let mut bps = vec![100; len - 1];
                bps.push(PERCENT_WHOLE - others);
                strategies.push(pct(&bps));

                for strategy in &strategies {
                    let first = compute_splits(amount, strategy, &participants).unwrap();
                    let second = compute_splits(amount, strategy, &participants).unwrap();
                    assert_eq!(first, second);
                    let total: MoneyCents = first.iter().map(|s| s.amount).sum();
                    assert_eq!(total, amount, "{strategy:?} n={n}");
                    assert!(first.iter().all(|s| !s.amount.is_negative()));
                }
            }
        }
    }

    #[test]
    fn percent_parsing() {
        assert_eq!("33.34%".parse::<Percent>().unwrap(), Percent::new(3334));
        assert_eq!("50".parse::<Percent>().unwrap(), Percent::new(5000));
        assert!("-5".parse::<Percent>().is_err());
        assert!("12.345".parse::<Percent>().is_err());
    }

    #[test]
    fn split_kind_round_trips_through_storage_tag() {
        for kind in [
            SplitKind::Equal,
            SplitKind::Exact,
            SplitKind::Percentage,
            SplitKind::Shares,
        ] {
            assert_eq!(SplitKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(SplitKind::try_from("random").is_err());
    }
}

//! Settlement reduction.
//!
//! Turns signed net balances into point-to-point payments that bring every
//! balance to zero. The reducer is greedy: it always pairs the largest
//! creditor with the largest debtor. Each step zeroes at least one side and
//! the last step zeroes both, so `N` members with a non-zero balance need at
//! most `N - 1` transactions. This is not guaranteed to be the minimum count;
//! finding that is a partition-style search and out of scope.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// `from` owes `to` `amount`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementTransaction {
    pub from: Uuid,
    pub to: Uuid,
    pub amount: MoneyCents,
}

impl fmt::Display for SettlementTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.amount)
    }
}

/// Heap key: larger remaining amount first, then earlier input position.
type Candidate = (u64, Reverse<usize>);

/// Reduce net balances to a list of settlement transactions.
///
/// `nets` is in a caller-chosen stable order (member insertion order); that
/// order breaks ties between equal amounts, so identical input always yields
/// identical output.
///
/// # Errors
///
/// [`EngineError::Consistency`] when the balances do not sum to zero, a member
/// is listed twice, or the emitted transactions fail to clear every balance.
///
/// ```rust
/// use engine::{MoneyCents, reduce};
/// use uuid::Uuid;
///
/// let (a, b, c) = (Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3));
/// let plan = reduce(&[
///     (a, MoneyCents::new(600)),
///     (b, MoneyCents::new(-300)),
///     (c, MoneyCents::new(-300)),
/// ])
/// .unwrap();
/// assert_eq!(plan.len(), 2);
/// assert_eq!((plan[0].from, plan[0].to), (b, a));
/// ```
pub fn reduce(nets: &[(Uuid, MoneyCents)]) -> ResultEngine<Vec<SettlementTransaction>> {
    let mut seen = HashSet::with_capacity(nets.len());
    if let Some((duplicate, _)) = nets.iter().find(|(id, _)| !seen.insert(*id)) {
        return Err(EngineError::Consistency(format!(
            "member {duplicate} appears twice in balances"
        )));
    }

    let total = MoneyCents::checked_sum(nets.iter().map(|(_, net)| *net))
        .ok_or_else(|| EngineError::Consistency("balance overflow".to_string()))?;
    if !total.is_zero() {
        tracing::warn!(%total, "refusing to settle unbalanced group");
        return Err(EngineError::Consistency(format!(
            "balances sum to {total}, expected 0.00"
        )));
    }

    let mut creditors: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut debtors: BinaryHeap<Candidate> = BinaryHeap::new();
    for (position, (_, net)) in nets.iter().enumerate() {
        let magnitude = net.cents().unsigned_abs();
        if net.is_positive() {
            creditors.push((magnitude, Reverse(position)));
        } else if net.is_negative() {
            debtors.push((magnitude, Reverse(position)));
        }
    }

    let mut transactions = Vec::with_capacity(nets.len().saturating_sub(1));
    while let (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) =
        (creditors.pop(), debtors.pop())
    {
        let amount = credit.min(debt);
        // Bounded by a creditor balance, so it fits back into i64.
        let cents = i64::try_from(amount)
            .map_err(|_| EngineError::Consistency("settlement overflow".to_string()))?;
        transactions.push(SettlementTransaction {
            from: nets[debtor].0,
            to: nets[creditor].0,
            amount: MoneyCents::new(cents),
        });
        if credit > amount {
            creditors.push((credit - amount, Reverse(creditor)));
        }
        if debt > amount {
            debtors.push((debt - amount, Reverse(debtor)));
        }
    }

    ensure_settled(nets, &transactions)?;
    tracing::debug!(
        members = nets.len(),
        transactions = transactions.len(),
        "settlement reduced"
    );
    Ok(transactions)
}

/// Apply `transactions` to `nets` and require every balance to end at zero.
pub fn ensure_settled(
    nets: &[(Uuid, MoneyCents)],
    transactions: &[SettlementTransaction],
) -> ResultEngine<()> {
    let mut remaining: HashMap<Uuid, MoneyCents> = nets.iter().copied().collect();
    let overflow = || EngineError::Consistency("settlement overflow".to_string());

    for tx in transactions {
        if !tx.amount.is_positive() {
            return Err(EngineError::Consistency(format!(
                "settlement amount must be > 0, got {}",
                tx.amount
            )));
        }
        let debtor = remaining.entry(tx.from).or_default();
        *debtor = debtor.checked_add(tx.amount).ok_or_else(overflow)?;
        let creditor = remaining.entry(tx.to).or_default();
        *creditor = creditor.checked_sub(tx.amount).ok_or_else(overflow)?;
    }

    if let Some((member, left)) = remaining.iter().find(|(_, net)| !net.is_zero()) {
        return Err(EngineError::Consistency(format!(
            "member {member} left with {left} after settlement"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn nets(values: &[i64]) -> Vec<(Uuid, MoneyCents)> {
        values
            .iter()
            .zip(1u128..)
            .map(|(cents, n)| (id(n), MoneyCents::new(*cents)))
            .collect()
    }

    fn tx(from: u128, to: u128, cents: i64) -> SettlementTransaction {
        SettlementTransaction {
            from: id(from),
            to: id(to),
            amount: MoneyCents::new(cents),
        }
    }

    #[test]
    fn single_creditor_two_debtors() {
        let plan = reduce(&nets(&[600, -300, -300])).unwrap();
        assert_eq!(plan, vec![tx(2, 1, 300), tx(3, 1, 300)]);
    }

    #[test]
    fn four_members_need_three_transactions() {
        let input = nets(&[500, 300, -400, -400]);
        let plan = reduce(&input).unwrap();
        assert_eq!(plan, vec![tx(3, 1, 400), tx(4, 2, 300), tx(4, 1, 100)]);
        ensure_settled(&input, &plan).unwrap();
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        let err = reduce(&nets(&[500, -300])).unwrap_err();
        assert_eq!(
            err,
            EngineError::Consistency("balances sum to 2.00, expected 0.00".to_string())
        );
    }

    #[test]
    fn duplicate_member_is_rejected() {
        let input = vec![(id(1), MoneyCents::new(5)), (id(1), MoneyCents::new(-5))];
        assert!(matches!(reduce(&input), Err(EngineError::Consistency(_))));
    }

    #[test]
    fn settled_group_needs_no_transactions() {
        assert!(reduce(&nets(&[0, 0, 0])).unwrap().is_empty());
        assert!(reduce(&[]).unwrap().is_empty());
    }

    #[test]
    fn ties_follow_input_order() {
        let plan = reduce(&nets(&[-100, 100, -100, 100])).unwrap();
        assert_eq!(plan, vec![tx(1, 2, 100), tx(3, 4, 100)]);
    }

    #[test]
    fn extreme_balances_still_settle() {
        let input = nets(&[i64::MIN, i64::MAX, 1]);
        let plan = reduce(&input).unwrap();
        assert_eq!(plan, vec![tx(1, 2, i64::MAX), tx(1, 3, 1)]);
        ensure_settled(&input, &plan).unwrap();
    }

    #[test]
    fn ensure_settled_catches_bad_plans() {
        let input = nets(&[100, -100]);
        assert!(ensure_settled(&input, &[tx(2, 1, 50)]).is_err());
        assert!(ensure_settled(&input, &[tx(2, 1, 100)]).is_ok());
    }

    #[test]
    fn reduction_clears_balances_within_bound() {
        // Deterministic pseudo-random balances.
        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as i64
        };

        for round in 0..500 {
            let n = (round % 9) + 2;
            let mut values: Vec<i64> = (0..n - 1).map(|_| next() % 20_001 - 10_000).collect();
            let sum: i64 = values.iter().sum();
            values.push(-sum);
            if round % 7 == 0 {
                values[0] = 0;
                let sum: i64 = values[..n - 1].iter().sum();
                values[n - 1] = -sum;
            }

            let input = nets(&values);
            let plan = reduce(&input).unwrap();
            ensure_settled(&input, &plan).unwrap();

            let non_zero = values.iter().filter(|v| **v != 0).count();
            assert!(plan.len() <= non_zero.saturating_sub(1), "{values:?} -> {plan:?}");
            assert!(plan.iter().all(|t| t.amount.is_positive() && t.from != t.to));
            assert_eq!(reduce(&input).unwrap(), plan);
        }
    }
}

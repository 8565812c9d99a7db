//! Balance aggregation.
//!
//! Folds a group's expense history (and repayments) into one
//! [`MemberBalance`] per member. The result is a closed system: every cent
//! someone paid is owed by someone, so the nets must add up to zero. A
//! non-zero total means the stored data is corrupt and is reported as
//! [`EngineError::Consistency`], never patched over.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Expense, MoneyCents, Payment, ResultEngine};

/// Per-member tallies.
///
/// `net = paid + repaid - owed - received`: positive means the group owes the
/// member money, negative means the member owes money.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member_id: Uuid,
    /// Total of expenses this member paid for.
    pub paid: MoneyCents,
    /// Total of splits assigned to this member.
    pub owed: MoneyCents,
    /// Repayments sent to other members.
    pub repaid: MoneyCents,
    /// Repayments received from other members.
    pub received: MoneyCents,
}

impl MemberBalance {
    fn zero(member_id: Uuid) -> Self {
        Self {
            member_id,
            ..Default::default()
        }
    }

    /// Net position; `None` on overflow.
    pub fn checked_net(&self) -> Option<MoneyCents> {
        self.paid
            .checked_add(self.repaid)?
            .checked_sub(self.owed)?
            .checked_sub(self.received)
    }

    /// Net position.
    ///
    /// Balances built by [`BalanceAggregator`] were already checked for
    /// overflow.
    pub fn net(&self) -> MoneyCents {
        self.checked_net().unwrap_or_default()
    }
}

/// Balances of a group, in member registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    entries: Vec<MemberBalance>,
    index: HashMap<Uuid, usize>,
}

impl Balances {
    pub fn iter(&self) -> impl Iterator<Item = &MemberBalance> {
        self.entries.iter()
    }

    pub fn get(&self, member_id: &Uuid) -> Option<&MemberBalance> {
        self.index.get(member_id).map(|i| &self.entries[*i])
    }

    /// Net balance for a member; zero for unknown members.
    pub fn net(&self, member_id: &Uuid) -> MoneyCents {
        self.get(member_id)
            .map(MemberBalance::net)
            .unwrap_or_default()
    }

    /// `(member, net)` pairs in registration order, ready for the settlement
    /// reducer.
    pub fn nets(&self) -> Vec<(Uuid, MoneyCents)> {
        self.entries.iter().map(|b| (b.member_id, b.net())).collect()
    }

    pub fn total_net(&self) -> MoneyCents {
        self.entries.iter().map(MemberBalance::net).sum()
    }

    /// Sum of positive nets (what creditors are owed).
    pub fn creditors_total(&self) -> MoneyCents {
        self.entries
            .iter()
            .map(MemberBalance::net)
            .filter(|net| net.is_positive())
            .sum()
    }

    /// Sum of negative nets, as a positive amount (what debtors owe).
    pub fn debtors_total(&self) -> MoneyCents {
        -self
            .entries
            .iter()
            .map(MemberBalance::net)
            .filter(|net| net.is_negative())
            .sum::<MoneyCents>()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Incremental builder behind [`compute_balances`].
///
/// Members are kept in the order they are first seen, so pre-registering them
/// with [`with_members`](Self::with_members) fixes the output order and keeps
/// members with no activity in the result.
#[derive(Debug, Default)]
pub struct BalanceAggregator {
    balances: Balances,
}

impl BalanceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_members<I>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        for member_id in members {
            self.entry(member_id);
        }
        self
    }

    fn entry(&mut self, member_id: Uuid) -> &mut MemberBalance {
        let balances = &mut self.balances;
        let index = match balances.index.get(&member_id) {
            Some(index) => *index,
            None => {
                balances.entries.push(MemberBalance::zero(member_id));
                let index = balances.entries.len() - 1;
                balances.index.insert(member_id, index);
                index
            }
        };
        &mut balances.entries[index]
    }

    pub fn add_expense(&mut self, expense: &Expense) -> ResultEngine<()> {
        expense.ensure_splits_balance()?;

        let payer = self.entry(expense.payer_id);
        payer.paid = payer
            .paid
            .checked_add(expense.amount)
            .ok_or_else(overflow)?;

        for split in &expense.splits {
            let participant = self.entry(split.member_id);
            participant.owed = participant
                .owed
                .checked_add(split.amount)
                .ok_or_else(overflow)?;
        }
        Ok(())
    }

    pub fn add_payment(&mut self, payment: &Payment) -> ResultEngine<()> {
        let from = self.entry(payment.from_id);
        from.repaid = from
            .repaid
            .checked_add(payment.amount)
            .ok_or_else(overflow)?;

        let to = self.entry(payment.to_id);
        to.received = to
            .received
            .checked_add(payment.amount)
            .ok_or_else(overflow)?;
        Ok(())
    }

    /// Finish aggregation, checking the zero-sum invariant.
    pub fn finish(self) -> ResultEngine<Balances> {
        let mut total = MoneyCents::ZERO;
        for balance in &self.balances.entries {
            let net = balance.checked_net().ok_or_else(overflow)?;
            total = total.checked_add(net).ok_or_else(overflow)?;
        }
        if !total.is_zero() {
            tracing::warn!(%total, "balances do not sum to zero");
            return Err(EngineError::Consistency(format!(
                "balances sum to {total}, expected 0.00"
            )));
        }
        tracing::debug!(members = self.balances.len(), "balances aggregated");
        Ok(self.balances)
    }
}

fn overflow() -> EngineError {
    EngineError::Consistency("balance overflow".to_string())
}

/// Compute each member's balance from a set of expenses.
///
/// Every member appearing as a payer or participant is present in the
/// output, in order of first appearance.
pub fn compute_balances(expenses: &[Expense]) -> ResultEngine<Balances> {
    let mut aggregator = BalanceAggregator::new();
    for expense in expenses {
        aggregator.add_expense(expense)?;
    }
    aggregator.finish()
}

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BalanceAggregator, Balances, Payment, ResultEngine, SettlementTransaction, payments, reduce,
};

use super::{Engine, with_tx};

impl Engine {
    /// Net balance of every member of the group, in member order.
    ///
    /// Members without any activity are listed with zero balances.
    pub async fn group_balances(&self, group_id: Uuid) -> ResultEngine<Balances> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.balances_in_tx(&db_tx, group_id).await
        })
    }

    /// Payments that would bring every member of the group to zero.
    pub async fn settlement_plan(
        &self,
        group_id: Uuid,
    ) -> ResultEngine<Vec<SettlementTransaction>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let balances = self.balances_in_tx(&db_tx, group_id).await?;
            reduce(&balances.nets())
        })
    }

    /// Compute the settlement plan and record each transaction as a payment.
    ///
    /// Plan and payments share one transaction, so the group is either fully
    /// settled or left untouched.
    pub async fn settle_group(
        &self,
        group_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Vec<SettlementTransaction>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let balances = self.balances_in_tx(&db_tx, group_id).await?;
            let plan = reduce(&balances.nets())?;

            for tx in &plan {
                let payment = Payment::new(
                    group_id,
                    tx.from,
                    tx.to,
                    tx.amount,
                    occurred_at,
                    Some("settle up".to_string()),
                )?;
                payments::ActiveModel::from(&payment).insert(&db_tx).await?;
            }

            tracing::info!(
                group_id = %group_id,
                transactions = plan.len(),
                "group settled"
            );
            Ok(plan)
        })
    }

    async fn balances_in_tx(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Balances> {
        let members = self.load_members(db, group_id).await?;
        let expenses = self.load_expenses(db, group_id).await?;
        let payments = self.load_payments(db, group_id).await?;

        let mut aggregator =
            BalanceAggregator::new().with_members(members.iter().map(|member| member.id));
        for expense in &expenses {
            aggregator.add_expense(expense)?;
        }
        for payment in &payments {
            aggregator.add_payment(payment)?;
        }
        aggregator.finish()
    }
}

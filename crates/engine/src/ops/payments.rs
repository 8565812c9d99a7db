use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{MoneyCents, Payment, ResultEngine, payments, util::normalize_optional_text};

use super::{Engine, with_tx};

impl Engine {
    /// Record a repayment from one member to another.
    pub async fn record_payment(
        &self,
        group_id: Uuid,
        from_id: Uuid,
        to_id: Uuid,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> ResultEngine<Uuid> {
        let payment = Payment::new(
            group_id,
            from_id,
            to_id,
            amount,
            occurred_at,
            normalize_optional_text(note),
        )?;
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.require_members_in_group(&db_tx, group_id, &[from_id, to_id])
                .await?;

            payments::ActiveModel::from(&payment).insert(&db_tx).await?;
            tracing::info!(
                group_id = %group_id,
                payment_id = %payment.id,
                from = %from_id,
                to = %to_id,
                amount = %amount,
                "payment recorded"
            );
            Ok(payment.id)
        })
    }

    /// Payments of a group, oldest first.
    pub async fn payments(&self, group_id: Uuid) -> ResultEngine<Vec<Payment>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.load_payments(&db_tx, group_id).await
        })
    }

    pub(super) async fn load_payments(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<Payment>> {
        payments::Entity::find()
            .filter(payments::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(payments::Column::OccurredAt)
            .order_by_asc(payments::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }
}

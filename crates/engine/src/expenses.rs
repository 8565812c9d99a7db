//! Expense primitives.
//!
//! An [`Expense`] is money one member paid on behalf of the group. Its
//! [`Split`]s say who owes which portion of it; the split amounts always add
//! up to the expense amount.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine, SplitKind, SplitShare, splits::Split, util::parse_uuid,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub payer_id: Uuid,
    pub amount: MoneyCents,
    pub description: String,
    pub strategy: SplitKind,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub splits: Vec<Split>,
}

impl Expense {
    /// Build an expense and materialize its splits from computed shares.
    pub fn new(
        group_id: Uuid,
        payer_id: Uuid,
        amount: MoneyCents,
        description: String,
        strategy: SplitKind,
        occurred_at: DateTime<Utc>,
        shares: &[SplitShare],
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(format!(
                "amount must be > 0, got {amount}"
            )));
        }
        let id = Uuid::new_v4();
        let splits = shares
            .iter()
            .zip(0i64..)
            .map(|(share, position)| Split::new(id, share.member_id, share.amount, position))
            .collect();
        let expense = Self {
            id,
            group_id,
            payer_id,
            amount,
            description,
            strategy,
            occurred_at,
            created_at: Utc::now(),
            splits,
        };
        expense.ensure_splits_balance()?;
        Ok(expense)
    }

    /// Sum of the split amounts (`None` on overflow).
    pub fn split_total(&self) -> Option<MoneyCents> {
        MoneyCents::checked_sum(self.splits.iter().map(|split| split.amount))
    }

    /// Check the split sum-equality invariant.
    pub fn ensure_splits_balance(&self) -> ResultEngine<()> {
        match self.split_total() {
            Some(total) if total == self.amount => Ok(()),
            Some(total) => Err(EngineError::Consistency(format!(
                "expense {} splits sum to {total}, expected {}",
                self.id, self.amount
            ))),
            None => Err(EngineError::Consistency(format!(
                "expense {} splits overflow",
                self.id
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub payer_id: String,
    pub amount_minor: i64,
    pub description: String,
    pub strategy: String,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(value: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            group_id: ActiveValue::Set(value.group_id.to_string()),
            payer_id: ActiveValue::Set(value.payer_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            description: ActiveValue::Set(value.description.clone()),
            strategy: ActiveValue::Set(value.strategy.as_str().to_string()),
            occurred_at: ActiveValue::Set(value.occurred_at),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<(Model, Vec<Split>)> for Expense {
    type Error = EngineError;

    fn try_from((model, splits): (Model, Vec<Split>)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            payer_id: parse_uuid(&model.payer_id, "member")?,
            amount: MoneyCents::new(model.amount_minor),
            description: model.description,
            strategy: SplitKind::try_from(model.strategy.as_str())?,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
            splits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(id: u128, cents: i64) -> SplitShare {
        SplitShare {
            member_id: Uuid::from_u128(id),
            amount: MoneyCents::new(cents),
        }
    }

    #[test]
    fn new_keeps_participant_order() {
        let expense = Expense::new(
            Uuid::from_u128(100),
            Uuid::from_u128(1),
            MoneyCents::new(900),
            "Dinner".to_string(),
            SplitKind::Equal,
            Utc::now(),
            &[share(1, 300), share(2, 300), share(3, 300)],
        )
        .unwrap();

        assert_eq!(expense.splits.len(), 3);
        assert!(expense.splits.iter().all(|s| s.expense_id == expense.id));
        let positions: Vec<i64> = expense.splits.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(expense.splits[2].member_id, Uuid::from_u128(3));
    }

    #[test]
    fn new_rejects_unbalanced_shares() {
        let err = Expense::new(
            Uuid::from_u128(100),
            Uuid::from_u128(1),
            MoneyCents::new(900),
            "Dinner".to_string(),
            SplitKind::Exact,
            Utc::now(),
            &[share(1, 300), share(2, 300)],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Consistency(_)));
    }
}

use std::collections::HashMap;

use sea_orm::{
    ActiveValue, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Expense, ResultEngine, Split, compute_splits, expenses, splits,
    util::{normalize_required_name, parse_uuid},
};

use super::{Engine, NewExpense, with_tx};

impl Engine {
    /// Record an expense and materialize its splits.
    ///
    /// The split calculator runs before anything touches the database; payer
    /// and participants must belong to the group.
    pub async fn add_expense(&self, group_id: Uuid, input: NewExpense) -> ResultEngine<Uuid> {
        let description = normalize_required_name(&input.description, "expense")?;
        let shares = compute_splits(input.amount, &input.strategy, &input.participants)?;
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.member_in_group(&db_tx, group_id, input.payer_id)
                .await?;
            self.require_members_in_group(&db_tx, group_id, &input.participants)
                .await?;

            let expense = Expense::new(
                group_id,
                input.payer_id,
                input.amount,
                description,
                input.kind(),
                input.occurred_at,
                &shares,
            )?;
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            insert_splits(&db_tx, &expense.splits).await?;

            tracing::info!(
                group_id = %group_id,
                expense_id = %expense.id,
                amount = %expense.amount,
                strategy = %expense.strategy,
                "expense added"
            );
            Ok(expense.id)
        })
    }

    /// Expenses of a group with their splits, oldest first.
    pub async fn expenses(&self, group_id: Uuid) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.load_expenses(&db_tx, group_id).await
        })
    }

    pub async fn expense(&self, group_id: Uuid, expense_id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = self.expense_in_group(&db_tx, group_id, expense_id).await?;

            let splits = splits::Entity::find()
                .filter(splits::Column::ExpenseId.eq(model.id.clone()))
                .order_by_asc(splits::Column::Position)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Split::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            Expense::try_from((model, splits))
        })
    }

    /// Replace an expense's payer, amount, description, date and splits.
    ///
    /// The expense keeps its id; its old splits are deleted and recomputed in
    /// the same transaction.
    pub async fn update_expense(
        &self,
        group_id: Uuid,
        expense_id: Uuid,
        input: NewExpense,
    ) -> ResultEngine<()> {
        let description = normalize_required_name(&input.description, "expense")?;
        let shares = compute_splits(input.amount, &input.strategy, &input.participants)?;
        with_tx!(self, |db_tx| {
            let model = self.expense_in_group(&db_tx, group_id, expense_id).await?;
            self.member_in_group(&db_tx, group_id, input.payer_id)
                .await?;
            self.require_members_in_group(&db_tx, group_id, &input.participants)
                .await?;

            let mut expense = Expense::new(
                group_id,
                input.payer_id,
                input.amount,
                description,
                input.kind(),
                input.occurred_at,
                &shares,
            )?;
            expense.id = expense_id;
            expense.created_at = model.created_at;
            for split in &mut expense.splits {
                split.expense_id = expense_id;
            }

            splits::Entity::delete_many()
                .filter(splits::Column::ExpenseId.eq(expense_id.to_string()))
                .exec(&db_tx)
                .await?;

            let active = expenses::ActiveModel {
                id: ActiveValue::Set(expense_id.to_string()),
                payer_id: ActiveValue::Set(expense.payer_id.to_string()),
                amount_minor: ActiveValue::Set(expense.amount.cents()),
                description: ActiveValue::Set(expense.description.clone()),
                strategy: ActiveValue::Set(expense.strategy.as_str().to_string()),
                occurred_at: ActiveValue::Set(expense.occurred_at),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            insert_splits(&db_tx, &expense.splits).await?;

            tracing::info!(group_id = %group_id, expense_id = %expense_id, "expense updated");
            Ok(())
        })
    }

    /// Delete an expense and its splits. Returns the number of splits removed.
    pub async fn delete_expense(&self, group_id: Uuid, expense_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            self.expense_in_group(&db_tx, group_id, expense_id)
                .await?;

            let removed = splits::Entity::delete_many()
                .filter(splits::Column::ExpenseId.eq(expense_id.to_string()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            expenses::Entity::delete_by_id(expense_id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(
                group_id = %group_id,
                expense_id = %expense_id,
                splits = removed,
                "expense deleted"
            );
            Ok(removed)
        })
    }

    /// Load every expense of a group together with its splits.
    pub(super) async fn load_expenses(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<Expense>> {
        let group_key = group_id.to_string();

        let expense_models = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_key.clone()))
            .order_by_asc(expenses::Column::OccurredAt)
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(db)
            .await?;

        let split_models = splits::Entity::find()
            .join(JoinType::InnerJoin, splits::Relation::Expenses.def())
            .filter(expenses::Column::GroupId.eq(group_key))
            .order_by_asc(splits::Column::ExpenseId)
            .order_by_asc(splits::Column::Position)
            .all(db)
            .await?;

        let mut splits_by_expense: HashMap<Uuid, Vec<Split>> = HashMap::new();
        for model in split_models {
            let split = Split::try_from(model)?;
            splits_by_expense
                .entry(split.expense_id)
                .or_default()
                .push(split);
        }

        expense_models
            .into_iter()
            .map(|model| {
                let id = parse_uuid(&model.id, "expense")?;
                let splits = splits_by_expense.remove(&id).unwrap_or_default();
                Expense::try_from((model, splits))
            })
            .collect()
    }
}

async fn insert_splits(db: &DatabaseTransaction, splits: &[Split]) -> ResultEngine<()> {
    for split in splits {
        splits::ActiveModel::from(split).insert(db).await?;
    }
    Ok(())
}

use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Group, ResultEngine, expenses, groups, members, payments, splits,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a new group. Names are unique, case-insensitively.
    pub async fn new_group(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "group")?;
        with_tx!(self, |db_tx| {
            let exists = groups::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let group = Group::new(name, Utc::now());
            groups::ActiveModel::from(&group).insert(&db_tx).await?;
            tracing::info!(group_id = %group.id, name = %group.name, "group created");
            Ok(group.id)
        })
    }

    /// All groups, oldest first.
    pub async fn groups(&self) -> ResultEngine<Vec<Group>> {
        with_tx!(self, |db_tx| {
            let models = groups::Entity::find()
                .order_by_asc(groups::Column::CreatedAt)
                .order_by_asc(groups::Column::Name)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Group::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn group(&self, group_id: Uuid) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| {
            let model = self.require_group(&db_tx, group_id).await?;
            Group::try_from(model)
        })
    }

    /// Look a group up by name (case-insensitive).
    pub async fn group_by_name(&self, name: &str) -> ResultEngine<Group> {
        let name = normalize_required_name(name, "group")?;
        with_tx!(self, |db_tx| {
            let model = groups::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(name.clone()))?;
            Group::try_from(model)
        })
    }

    /// Delete a group with all its members, expenses, splits and payments.
    pub async fn delete_group(&self, group_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let group_key = group_id.to_string();

            let expense_ids: Vec<String> = expenses::Entity::find()
                .filter(expenses::Column::GroupId.eq(group_key.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();

            if !expense_ids.is_empty() {
                splits::Entity::delete_many()
                    .filter(splits::Column::ExpenseId.is_in(expense_ids))
                    .exec(&db_tx)
                    .await?;
            }
            expenses::Entity::delete_many()
                .filter(expenses::Column::GroupId.eq(group_key.clone()))
                .exec(&db_tx)
                .await?;
            payments::Entity::delete_many()
                .filter(payments::Column::GroupId.eq(group_key.clone()))
                .exec(&db_tx)
                .await?;
            members::Entity::delete_many()
                .filter(members::Column::GroupId.eq(group_key.clone()))
                .exec(&db_tx)
                .await?;
            groups::Entity::delete_by_id(group_key).exec(&db_tx).await?;

            tracing::info!(group_id = %group_id, "group deleted");
            Ok(())
        })
    }
}

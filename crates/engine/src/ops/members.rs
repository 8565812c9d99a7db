use sea_orm::{
    Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Member, ResultEngine, expenses, members, payments, splits,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Add a member to a group. Names are unique inside a group,
    /// case-insensitively.
    pub async fn add_member(&self, group_id: Uuid, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "member")?;
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;

            let exists = members::Entity::find()
                .filter(members::Column::GroupId.eq(group_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let position = members::Entity::find()
                .filter(members::Column::GroupId.eq(group_id.to_string()))
                .order_by_desc(members::Column::Position)
                .one(&db_tx)
                .await?
                .map_or(0, |last| last.position + 1);

            let member = Member::new(group_id, name, position);
            members::ActiveModel::from(&member).insert(&db_tx).await?;
            tracing::info!(group_id = %group_id, member_id = %member.id, "member added");
            Ok(member.id)
        })
    }

    /// Members of a group in insertion order.
    pub async fn members(&self, group_id: Uuid) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.load_members(&db_tx, group_id).await
        })
    }

    pub async fn member(&self, group_id: Uuid, member_id: Uuid) -> ResultEngine<Member> {
        with_tx!(self, |db_tx| {
            let model = self.member_in_group(&db_tx, group_id, member_id).await?;
            Member::try_from(model)
        })
    }

    /// Look a member up by name (case-insensitive) inside a group.
    pub async fn member_by_name(&self, group_id: Uuid, name: &str) -> ResultEngine<Member> {
        let name = normalize_required_name(name, "member")?;
        with_tx!(self, |db_tx| {
            let model = members::Entity::find()
                .filter(members::Column::GroupId.eq(group_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(name.clone()))?;
            Member::try_from(model)
        })
    }

    /// Remove a member from a group.
    ///
    /// A member referenced by an expense, a split or a payment cannot simply
    /// disappear: that would unbalance the group. Such a member is only
    /// removed when `reassign_to` names another member of the group, in which
    /// case every reference moves to that member first. Payments between the
    /// two members become self-payments and are dropped; they never affect
    /// balances.
    pub async fn delete_member(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        reassign_to: Option<Uuid>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.member_in_group(&db_tx, group_id, member_id).await?;
            let member_key = member_id.to_string();

            let paid = expenses::Entity::find()
                .filter(expenses::Column::PayerId.eq(member_key.clone()))
                .count(&db_tx)
                .await?;
            let owed = splits::Entity::find()
                .filter(splits::Column::MemberId.eq(member_key.clone()))
                .count(&db_tx)
                .await?;
            let transfers = payments::Entity::find()
                .filter(
                    Condition::any()
                        .add(payments::Column::FromId.eq(member_key.clone()))
                        .add(payments::Column::ToId.eq(member_key.clone())),
                )
                .count(&db_tx)
                .await?;

            if paid + owed + transfers > 0 {
                let Some(target) = reassign_to else {
                    return Err(EngineError::MemberInUse(format!(
                        "'{}' is referenced by {paid} expense(s), {owed} split(s) and {transfers} payment(s)",
                        model.name
                    )));
                };
                if target == member_id {
                    return Err(EngineError::Validation(
                        "cannot reassign a member to itself".to_string(),
                    ));
                }
                self.member_in_group(&db_tx, group_id, target).await?;
                let target_key = target.to_string();

                payments::Entity::delete_many()
                    .filter(
                        Condition::any()
                            .add(
                                Condition::all()
                                    .add(payments::Column::FromId.eq(member_key.clone()))
                                    .add(payments::Column::ToId.eq(target_key.clone())),
                            )
                            .add(
                                Condition::all()
                                    .add(payments::Column::FromId.eq(target_key.clone()))
                                    .add(payments::Column::ToId.eq(member_key.clone())),
                            ),
                    )
                    .exec(&db_tx)
                    .await?;
                expenses::Entity::update_many()
                    .col_expr(expenses::Column::PayerId, Expr::value(target_key.clone()))
                    .filter(expenses::Column::PayerId.eq(member_key.clone()))
                    .exec(&db_tx)
                    .await?;
                splits::Entity::update_many()
                    .col_expr(splits::Column::MemberId, Expr::value(target_key.clone()))
                    .filter(splits::Column::MemberId.eq(member_key.clone()))
                    .exec(&db_tx)
                    .await?;
                payments::Entity::update_many()
                    .col_expr(payments::Column::FromId, Expr::value(target_key.clone()))
                    .filter(payments::Column::FromId.eq(member_key.clone()))
                    .exec(&db_tx)
                    .await?;
                payments::Entity::update_many()
                    .col_expr(payments::Column::ToId, Expr::value(target_key.clone()))
                    .filter(payments::Column::ToId.eq(member_key.clone()))
                    .exec(&db_tx)
                    .await?;
                tracing::info!(
                    group_id = %group_id,
                    member_id = %member_id,
                    reassigned_to = %target,
                    "member references reassigned"
                );
            }

            members::Entity::delete_by_id(member_key).exec(&db_tx).await?;
            tracing::info!(group_id = %group_id, member_id = %member_id, "member deleted");
            Ok(())
        })
    }

    pub(super) async fn load_members(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<Member>> {
        members::Entity::find()
            .filter(members::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(members::Column::Position)
            .all(db)
            .await?
            .into_iter()
            .map(Member::try_from)
            .collect()
    }
}

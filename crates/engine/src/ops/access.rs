use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, expenses, groups, members};

/// Generates a lookup that loads a row by id, scoped to one group.
///
/// A row of another group is reported exactly like a missing one.
macro_rules! group_scoped_lookup {
    ($fn_name:ident, $module:ident, $what:literal) => {
        pub(super) async fn $fn_name(
            &self,
            db: &DatabaseTransaction,
            group_id: Uuid,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            $module::Entity::find_by_id(id.to_string())
                .filter($module::Column::GroupId.eq(group_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(concat!($what, " not exists").to_string())
                })
        }
    };
}

impl super::Engine {
    group_scoped_lookup!(member_in_group, members, "member");
    group_scoped_lookup!(expense_in_group, expenses, "expense");

    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))
    }

    /// Every id must name a member of the group.
    pub(super) async fn require_members_in_group(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        member_ids: &[Uuid],
    ) -> ResultEngine<()> {
        for member_id in member_ids {
            self.member_in_group(db, group_id, *member_id).await?;
        }
        Ok(())
    }
}

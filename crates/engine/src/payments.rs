//! Repayments between members.
//!
//! A [`Payment`] records `from` handing money to `to` outside of any expense,
//! typically to settle a debt. It raises the payer's net balance and lowers the
//! recipient's by the same amount.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub amount: MoneyCents,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        group_id: Uuid,
        from_id: Uuid,
        to_id: Uuid,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(format!(
                "payment amount must be > 0, got {amount}"
            )));
        }
        if from_id == to_id {
            return Err(EngineError::Validation(
                "payment sender and recipient must differ".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            from_id,
            to_id,
            amount,
            occurred_at,
            note,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub from_id: String,
    pub to_id: String,
    pub amount_minor: i64,
    pub occurred_at: DateTimeUtc,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(value: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            group_id: ActiveValue::Set(value.group_id.to_string()),
            from_id: ActiveValue::Set(value.from_id.to_string()),
            to_id: ActiveValue::Set(value.to_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            occurred_at: ActiveValue::Set(value.occurred_at),
            note: ActiveValue::Set(value.note.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            group_id: parse_uuid(&model.group_id, "group")?,
            from_id: parse_uuid(&model.from_id, "member")?,
            to_id: parse_uuid(&model.to_id, "member")?,
            amount: MoneyCents::new(model.amount_minor),
            occurred_at: model.occurred_at,
            note: model.note,
            created_at: model.created_at,
        })
    }
}

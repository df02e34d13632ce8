//! Event entity for time-boxed voting rounds.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display title (at most 45 characters)
    pub title: String,

    /// Optional longer description
    #[sea_orm(nullable)]
    pub description: Option<String>,

    /// When voting opens (null = not scheduled)
    #[sea_orm(nullable)]
    pub start_time: Option<DateTimeWithTimeZone>,

    /// When voting closes; the event counts as Closed from this exact instant
    #[sea_orm(nullable)]
    pub end_time: Option<DateTimeWithTimeZone>,

    /// Creating user; creators manage their event and never vote in it
    #[sea_orm(indexed)]
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,

    #[sea_orm(has_many = "super::event_option::Entity")]
    Options,

    #[sea_orm(has_many = "super::ballot::Entity")]
    Ballots,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::event_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Options.def()
    }
}

impl Related<super::ballot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ballots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

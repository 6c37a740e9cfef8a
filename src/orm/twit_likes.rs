use sea_orm::entity::prelude::*;

/// Set membership for likes. One row per (twit, user) pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "twit_likes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub twit_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::twits::Entity",
        from = "Column::TwitId",
        to = "super::twits::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Twits,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::twits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Twits.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

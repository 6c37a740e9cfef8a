use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    /// Argon2id PHC string. Plaintext is never persisted.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::twits::Entity")]
    Twits,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::twit_likes::Entity")]
    TwitLikes,
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::twits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Twits.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::twit_likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TwitLikes.def()
    }
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use crate::orm::{comments, sessions, twit_likes, twits, users};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Table definitions live on the entities; foreign keys (with their
        // cascade rules) and the unique username constraint come from there.
        manager
            .create_table(
                schema
                    .create_table_from_entity(users::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(twits::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(comments::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(twit_likes::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(sessions::Entity)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(sessions::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(twit_likes::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(comments::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(twits::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(users::Entity).to_owned())
            .await?;

        Ok(())
    }
}

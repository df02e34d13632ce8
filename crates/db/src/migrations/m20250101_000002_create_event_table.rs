//! Create event table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Event::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Event::Title).string_len(45).not_null())
                    .col(ColumnDef::new(Event::Description).string_len(255))
                    .col(ColumnDef::new(Event::StartTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Event::EndTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(Event::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Event::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_creator")
                            .from(Event::Table, Event::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index on created_by for per-creator listings
        manager
            .create_index(
                Index::create()
                    .name("idx_event_created_by")
                    .table(Event::Table)
                    .col(Event::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // Index on start_time for upcoming-event queries
        manager
            .create_index(
                Index::create()
                    .name("idx_event_start_time")
                    .table(Event::Table)
                    .col(Event::StartTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    Title,
    Description,
    StartTime,
    EndTime,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

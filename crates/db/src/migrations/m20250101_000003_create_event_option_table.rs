//! Create event_option table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventOption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventOption::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventOption::Text).string_len(45).not_null())
                    .col(ColumnDef::new(EventOption::EventId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(EventOption::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(EventOption::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_option_event")
                            .from(EventOption::Table, EventOption::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index on event_id for option listings
        manager
            .create_index(
                Index::create()
                    .name("idx_event_option_event_id")
                    .table(EventOption::Table)
                    .col(EventOption::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventOption::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EventOption {
    Table,
    Id,
    Text,
    EventId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}

//! Create ballot table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ballot::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ballot::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Ballot::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Ballot::OptionId).string_len(32).not_null())
                    .col(ColumnDef::new(Ballot::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Ballot::VotedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Ballot::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ballot_event")
                            .from(Ballot::Table, Ballot::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ballot_option")
                            .from(Ballot::Table, Ballot::OptionId)
                            .to(EventOption::Table, EventOption::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ballot_user")
                            .from(Ballot::Table, Ballot::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One ballot per user per event; concurrent duplicate casts hit this
        // constraint instead of inserting a second row
        manager
            .create_index(
                Index::create()
                    .name("uq_ballot_event_user")
                    .table(Ballot::Table)
                    .col(Ballot::EventId)
                    .col(Ballot::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on option_id for tally counts
        manager
            .create_index(
                Index::create()
                    .name("idx_ballot_option_id")
                    .table(Ballot::Table)
                    .col(Ballot::OptionId)
                    .to_owned(),
            )
            .await?;

        // Index on user_id for voting history
        manager
            .create_index(
                Index::create()
                    .name("idx_ballot_user_id")
                    .table(Ballot::Table)
                    .col(Ballot::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ballot::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Ballot {
    Table,
    Id,
    EventId,
    OptionId,
    UserId,
    VotedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}

#[derive(Iden)]
enum EventOption {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

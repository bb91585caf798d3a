//! Create users table.
//!
//! One row per person, identified by the external account used at signup.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(User::Name).string_len(100).not_null())
                    .col(ColumnDef::new(User::Email).string_len(255))
                    .col(ColumnDef::new(User::AvatarUrl).string_len(500))
                    .col(ColumnDef::new(User::GoogleId).string_len(255))
                    .col(ColumnDef::new(User::LineId).string_len(255))
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // NULLs never collide, so users without a known email or without a
        // given provider account coexist freely.
        for (name, column) in [
            ("idx_users_email", User::Email),
            ("idx_users_google_id", User::GoogleId),
            ("idx_users_line_id", User::LineId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(User::Table)
                        .col(column)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Name,
    Email,
    AvatarUrl,
    GoogleId,
    LineId,
    CreatedAt,
    UpdatedAt,
}

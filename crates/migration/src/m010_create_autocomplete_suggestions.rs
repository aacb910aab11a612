use sea_orm_migration::prelude::*;

use crate::schema::{created_at_column, id_column};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum AutocompleteSuggestions {
    Table,
    Id,
    FieldPath,
    Value,
    UsageCount,
    LastUsedAt,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutocompleteSuggestions::Table)
                    .if_not_exists()
                    .col(id_column(AutocompleteSuggestions::Id))
                    .col(
                        ColumnDef::new(AutocompleteSuggestions::FieldPath)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutocompleteSuggestions::Value)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutocompleteSuggestions::UsageCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(created_at_column(AutocompleteSuggestions::LastUsedAt))
                    .col(created_at_column(AutocompleteSuggestions::CreatedAt))
                    .index(
                        Index::create()
                            .unique()
                            .col(AutocompleteSuggestions::FieldPath)
                            .col(AutocompleteSuggestions::Value),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_autocomplete_field_path")
                    .table(AutocompleteSuggestions::Table)
                    .col(AutocompleteSuggestions::FieldPath)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_autocomplete_field_path_value")
                    .table(AutocompleteSuggestions::Table)
                    .col(AutocompleteSuggestions::FieldPath)
                    .col(AutocompleteSuggestions::Value)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_autocomplete_usage_count")
                    .table(AutocompleteSuggestions::Table)
                    .col((AutocompleteSuggestions::UsageCount, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_autocomplete_last_used_at")
                    .table(AutocompleteSuggestions::Table)
                    .col((AutocompleteSuggestions::LastUsedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }
}

use sea_orm_migration::prelude::*;

use crate::schema::{has_column, table_exists};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum AutocompleteSuggestions {
    Table,
    Entity,
    Field,
    Value,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if !table_exists(db, "autocomplete_suggestions").await? {
            return Ok(());
        }

        for (name, column) in [
            ("entity", AutocompleteSuggestions::Entity),
            ("field", AutocompleteSuggestions::Field),
        ] {
            if has_column(db, "autocomplete_suggestions", name).await? {
                continue;
            }
            manager
                .alter_table(
                    Table::alter()
                        .table(AutocompleteSuggestions::Table)
                        .add_column(ColumnDef::new(column).text())
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_autocomplete_entity")
                    .table(AutocompleteSuggestions::Table)
                    .col(AutocompleteSuggestions::Entity)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_autocomplete_entity_field")
                    .table(AutocompleteSuggestions::Table)
                    .col(AutocompleteSuggestions::Entity)
                    .col(AutocompleteSuggestions::Field)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_autocomplete_entity_field_value")
                    .table(AutocompleteSuggestions::Table)
                    .col(AutocompleteSuggestions::Entity)
                    .col(AutocompleteSuggestions::Field)
                    .col(AutocompleteSuggestions::Value)
                    .to_owned(),
            )
            .await
    }
}

use sea_orm_migration::prelude::*;

use crate::schema::{created_at_column, exec, id_column, table_exists};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Settings {
    Table,
    Id,
    Key,
    Value,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if table_exists(db, "settings").await? {
            return Ok(());
        }

        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .col(id_column(Settings::Id))
                    .col(
                        ColumnDef::new(Settings::Key)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Settings::Value).text().not_null())
                    .col(created_at_column(Settings::CreatedAt))
                    .col(ColumnDef::new(Settings::UpdatedAt).text())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_settings_key")
                    .table(Settings::Table)
                    .col(Settings::Key)
                    .to_owned(),
            )
            .await?;

        // Seeded only together with the table: a deleted default stays deleted.
        exec(
            db,
            "INSERT INTO settings (key, value) VALUES ('sizeable_item_threshold', '100.00')",
        )
        .await
    }
}

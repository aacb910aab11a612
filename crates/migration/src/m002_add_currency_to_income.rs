use sea_orm_migration::prelude::*;

use crate::schema::{currency_column, has_column};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum IncomeEntries {
    Table,
    Currency,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if has_column(db, "income_entries", "currency").await? {
            return Ok(());
        }

        manager
            .alter_table(
                Table::alter()
                    .table(IncomeEntries::Table)
                    .add_column(currency_column(IncomeEntries::Currency))
                    .to_owned(),
            )
            .await
    }
}

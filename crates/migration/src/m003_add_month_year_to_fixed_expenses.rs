use chrono::{Datelike, Local};
use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;

use crate::{m001_initial_tables::FixedExpenseEntries, schema::has_column};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if has_column(db, "fixed_expense_entries", "month").await? {
            return Ok(());
        }

        // Rows predating the columns are attributed to the month the upgrade runs in.
        for column in [FixedExpenseEntries::Month, FixedExpenseEntries::Year] {
            manager
                .alter_table(
                    Table::alter()
                        .table(FixedExpenseEntries::Table)
                        .add_column(ColumnDef::new(column).integer())
                        .to_owned(),
                )
                .await?;
        }

        let today = Local::now().date_naive();
        let backend = db.get_database_backend();
        db.execute(Statement::from_sql_and_values(
            backend,
            "UPDATE fixed_expense_entries SET month = ?, year = ? \
             WHERE month IS NULL OR year IS NULL",
            vec![(today.month() as i32).into(), today.year().into()],
        ))
        .await?;

        Ok(())
    }
}

use sea_orm_migration::prelude::*;

use crate::{
    m004_create_legacy_projects_tables::legacy_projects_ddl,
    schema::{exec, repair_sequence, table_sql},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

const LEGACY_COLUMNS: &str = "id, name, description, target_amount, target_date, priority, \
    category, status, savings_account_name, currency, created_at, updated_at";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let Some(sql) = table_sql(db, "projects").await? else {
            return Ok(());
        };
        let sql = sql.to_uppercase();
        if !(sql.contains("SAVINGS_ACCOUNT_NAME") && sql.contains("UNIQUE")) {
            return Ok(());
        }

        // No DROP CONSTRAINT in SQLite: rebuild the table without it.
        exec(db, &legacy_projects_ddl("projects_new", false)).await?;
        exec(
            db,
            &format!(
                "INSERT INTO projects_new ({LEGACY_COLUMNS}) SELECT {LEGACY_COLUMNS} FROM projects"
            ),
        )
        .await?;
        exec(db, "DROP TABLE projects").await?;
        exec(db, "ALTER TABLE projects_new RENAME TO projects").await?;
        repair_sequence(db, "projects").await
    }
}

use sea_orm_migration::prelude::*;

use crate::schema::{exec, table_exists};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// The first generation of projects: keyed by a free-text savings account name.
/// Later steps reshape and finally drop it; it only exists so upgrades from
/// stores of that era walk the same path as everybody else.
pub(crate) const LEGACY_PROJECTS_COLUMNS: &str = "\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    name TEXT NOT NULL, \
    description TEXT, \
    target_amount REAL NOT NULL, \
    target_date TEXT NOT NULL, \
    priority TEXT NOT NULL, \
    category TEXT, \
    status TEXT NOT NULL DEFAULT 'active', \
    savings_account_name TEXT {unique}NOT NULL, \
    currency TEXT NOT NULL DEFAULT 'EUR', \
    created_at TEXT NOT NULL DEFAULT (datetime('now')), \
    updated_at TEXT";

pub(crate) fn legacy_projects_ddl(table: &str, unique: bool) -> String {
    let columns = LEGACY_PROJECTS_COLUMNS.replace("{unique}", if unique { "UNIQUE " } else { "" });
    format!("CREATE TABLE {table} ({columns})")
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Any `projects` table, legacy or current, means this era is behind us.
        if table_exists(db, "projects").await? {
            return Ok(());
        }

        exec(db, &legacy_projects_ddl("projects", true)).await?;
        exec(
            db,
            "CREATE TABLE IF NOT EXISTS project_contributions ( \
                id INTEGER PRIMARY KEY AUTOINCREMENT, \
                project_id INTEGER NOT NULL, \
                amount REAL NOT NULL, \
                date TEXT NOT NULL, \
                notes TEXT, \
                created_at TEXT NOT NULL DEFAULT (datetime('now')), \
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE \
            )",
        )
        .await?;
        exec(
            db,
            "CREATE INDEX IF NOT EXISTS idx_project_contributions_project_id \
             ON project_contributions(project_id)",
        )
        .await
    }
}

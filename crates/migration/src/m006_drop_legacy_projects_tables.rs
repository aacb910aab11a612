use sea_orm_migration::prelude::*;

use crate::schema::{exec, has_column};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Decide on shape, not on name: the current `projects` must survive.
        if !has_column(db, "projects", "savings_account_name").await? {
            return Ok(());
        }

        exec(db, "DROP TABLE IF EXISTS project_contributions").await?;
        exec(db, "DROP TABLE IF EXISTS projects").await
    }
}

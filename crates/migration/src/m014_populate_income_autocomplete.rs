use sea_orm_migration::prelude::*;

use crate::m011_populate_expense_autocomplete::seed_suggestions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        seed_suggestions(manager.get_connection(), "income_entries", "item").await
    }
}

use sea_orm_migration::prelude::*;

use crate::{
    m007_create_savings_accounts_and_contributions::SavingsAccounts,
    schema::{amount_column, created_at_column, currency_column, has_column, id_column},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Projects {
    Table,
    Id,
    Name,
    Description,
    TargetAmount,
    Status,
    SavingsAccountId,
    Currency,
    CreatedAt,
    UpdatedAt,
}

/// Indexes are only created on columns the table actually has: SQLite would
/// otherwise accept a missing quoted column as a constant expression.
pub(crate) async fn create_project_indexes(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let db = manager.get_connection();
    if has_column(db, "projects", "status").await? {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_status")
                    .table(Projects::Table)
                    .col(Projects::Status)
                    .to_owned(),
            )
            .await?;
    }
    if !has_column(db, "projects", "savings_account_id").await? {
        return Ok(());
    }
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name("idx_projects_savings_account_id")
                .table(Projects::Table)
                .col(Projects::SavingsAccountId)
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(id_column(Projects::Id))
                    .col(ColumnDef::new(Projects::Name).text().not_null())
                    .col(ColumnDef::new(Projects::Description).text())
                    .col(amount_column(Projects::TargetAmount))
                    .col(
                        ColumnDef::new(Projects::Status)
                            .text()
                            .not_null()
                            .default("Active"),
                    )
                    .col(ColumnDef::new(Projects::SavingsAccountId).integer())
                    .col(currency_column(Projects::Currency))
                    .col(created_at_column(Projects::CreatedAt))
                    .col(ColumnDef::new(Projects::UpdatedAt).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-projects-savings_account_id")
                            .from(Projects::Table, Projects::SavingsAccountId)
                            .to(SavingsAccounts::Table, SavingsAccounts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        create_project_indexes(manager).await
    }
}

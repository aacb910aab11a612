use sea_orm_migration::prelude::*;

use crate::{
    m007_create_savings_accounts_and_contributions::SavingsAccounts,
    m008_create_projects::{Projects, create_project_indexes},
    schema::{
        amount_column, created_at_column, currency_column, exec, has_column, id_column,
        repair_sequence,
    },
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ProjectsNew {
    Table,
    PriorityOrder,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if has_column(db, "projects", "priority_order").await? {
            return Ok(());
        }

        // NOT NULL UNIQUE cannot be added in place, so the table is rebuilt
        // with the final shape and rows predating the column get `id` as rank.
        manager
            .create_table(
                Table::create()
                    .table(ProjectsNew::Table)
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
                    .col(
                        ColumnDef::new(ProjectsNew::PriorityOrder)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(created_at_column(Projects::CreatedAt))
                    .col(ColumnDef::new(Projects::UpdatedAt).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-projects-savings_account_id")
                            .from(ProjectsNew::Table, Projects::SavingsAccountId)
                            .to(SavingsAccounts::Table, SavingsAccounts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        exec(
            db,
            "INSERT INTO projects_new \
                (id, name, description, target_amount, status, savings_account_id, \
                 currency, priority_order, created_at, updated_at) \
             SELECT id, name, description, target_amount, status, savings_account_id, \
                 COALESCE(currency, 'EUR'), id, COALESCE(created_at, datetime('now')), updated_at \
             FROM projects",
        )
        .await?;
        exec(db, "DROP TABLE projects").await?;
        exec(db, "ALTER TABLE projects_new RENAME TO projects").await?;

        create_project_indexes(manager).await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_priority_order")
                    .table(Projects::Table)
                    .col(ProjectsNew::PriorityOrder)
                    .to_owned(),
            )
            .await?;

        repair_sequence(db, "projects").await
    }
}

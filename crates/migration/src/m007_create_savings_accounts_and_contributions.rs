use sea_orm_migration::prelude::*;

use crate::schema::{amount_column, created_at_column, currency_column, id_column};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum SavingsAccounts {
    Table,
    Id,
    Name,
    InitialBalance,
    Currency,
    BankInstitution,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Contributions {
    Table,
    Id,
    SavingsAccountId,
    Amount,
    Date,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavingsAccounts::Table)
                    .if_not_exists()
                    .col(id_column(SavingsAccounts::Id))
                    .col(ColumnDef::new(SavingsAccounts::Name).text().not_null())
                    .col(
                        ColumnDef::new(SavingsAccounts::InitialBalance)
                            .double()
                            .not_null()
                            .default(0),
                    )
                    .col(currency_column(SavingsAccounts::Currency))
                    .col(ColumnDef::new(SavingsAccounts::BankInstitution).text())
                    .col(created_at_column(SavingsAccounts::CreatedAt))
                    .col(ColumnDef::new(SavingsAccounts::UpdatedAt).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contributions::Table)
                    .if_not_exists()
                    .col(id_column(Contributions::Id))
                    .col(
                        ColumnDef::new(Contributions::SavingsAccountId)
                            .integer()
                            .not_null(),
                    )
                    .col(amount_column(Contributions::Amount))
                    .col(ColumnDef::new(Contributions::Date).text().not_null())
                    .col(ColumnDef::new(Contributions::Notes).text())
                    .col(created_at_column(Contributions::CreatedAt))
                    .col(ColumnDef::new(Contributions::UpdatedAt).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributions-savings_account_id")
                            .from(Contributions::Table, Contributions::SavingsAccountId)
                            .to(SavingsAccounts::Table, SavingsAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contributions_savings_account_id")
                    .table(Contributions::Table)
                    .col(Contributions::SavingsAccountId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contributions_date")
                    .table(Contributions::Table)
                    .col(Contributions::Date)
                    .to_owned(),
            )
            .await
    }
}

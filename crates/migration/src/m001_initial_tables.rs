use sea_orm_migration::prelude::*;

use crate::schema::{amount_column, created_at_column, currency_column, id_column};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum IncomeEntries {
    Table,
    Id,
    Amount,
    Date,
    Item,
    Currency,
}

#[derive(Iden)]
pub(crate) enum FixedExpenseEntries {
    Table,
    Id,
    Amount,
    Item,
    Currency,
    Month,
    Year,
}

#[derive(Iden)]
enum ActualExpenseEntries {
    Table,
    Id,
    Amount,
    Date,
    Item,
    Category,
    Currency,
}

#[derive(Iden)]
enum DebtEntries {
    Table,
    Id,
    Name,
    InitialAmount,
    CurrentBalance,
    Currency,
    LinkedFixedExpenseId,
    Notes,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IncomeEntries::Table)
                    .if_not_exists()
                    .col(id_column(IncomeEntries::Id))
                    .col(amount_column(IncomeEntries::Amount))
                    .col(ColumnDef::new(IncomeEntries::Date).text().not_null())
                    .col(ColumnDef::new(IncomeEntries::Item).text().not_null())
                    .col(currency_column(IncomeEntries::Currency))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FixedExpenseEntries::Table)
                    .if_not_exists()
                    .col(id_column(FixedExpenseEntries::Id))
                    .col(amount_column(FixedExpenseEntries::Amount))
                    .col(ColumnDef::new(FixedExpenseEntries::Item).text().not_null())
                    .col(currency_column(FixedExpenseEntries::Currency))
                    .col(
                        ColumnDef::new(FixedExpenseEntries::Month)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FixedExpenseEntries::Year)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActualExpenseEntries::Table)
                    .if_not_exists()
                    .col(id_column(ActualExpenseEntries::Id))
                    .col(amount_column(ActualExpenseEntries::Amount))
                    .col(ColumnDef::new(ActualExpenseEntries::Date).text().not_null())
                    .col(ColumnDef::new(ActualExpenseEntries::Item).text().not_null())
                    .col(
                        ColumnDef::new(ActualExpenseEntries::Category)
                            .text()
                            .not_null(),
                    )
                    .col(currency_column(ActualExpenseEntries::Currency))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DebtEntries::Table)
                    .if_not_exists()
                    .col(id_column(DebtEntries::Id))
                    .col(ColumnDef::new(DebtEntries::Name).text().not_null())
                    .col(amount_column(DebtEntries::InitialAmount))
                    .col(amount_column(DebtEntries::CurrentBalance))
                    .col(currency_column(DebtEntries::Currency))
                    .col(ColumnDef::new(DebtEntries::LinkedFixedExpenseId).integer())
                    .col(ColumnDef::new(DebtEntries::Notes).text())
                    .col(created_at_column(DebtEntries::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-debt_entries-linked_fixed_expense_id")
                            .from(DebtEntries::Table, DebtEntries::LinkedFixedExpenseId)
                            .to(FixedExpenseEntries::Table, FixedExpenseEntries::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }
}

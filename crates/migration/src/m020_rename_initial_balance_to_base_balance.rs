use sea_orm_migration::prelude::*;

use crate::{
    m007_create_savings_accounts_and_contributions::SavingsAccounts, schema::has_column,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Renamed {
    BaseBalance,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        // Missing old name means an earlier run already renamed it.
        if !has_column(db, "savings_accounts", "initial_balance").await? {
            return Ok(());
        }

        manager
            .alter_table(
                Table::alter()
                    .table(SavingsAccounts::Table)
                    .rename_column(SavingsAccounts::InitialBalance, Renamed::BaseBalance)
                    .to_owned(),
            )
            .await
    }
}

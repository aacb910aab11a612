use sea_orm_migration::prelude::*;

use crate::schema::{created_at_column, id_column};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Wishlists {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wishlists::Table)
                    .if_not_exists()
                    .col(id_column(Wishlists::Id))
                    .col(ColumnDef::new(Wishlists::Name).text().not_null())
                    .col(ColumnDef::new(Wishlists::Description).text())
                    .col(created_at_column(Wishlists::CreatedAt))
                    .col(ColumnDef::new(Wishlists::UpdatedAt).text())
                    .to_owned(),
            )
            .await
    }
}

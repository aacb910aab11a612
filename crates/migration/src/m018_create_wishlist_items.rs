use sea_orm_migration::prelude::*;

use crate::{
    m017_create_wishlists::Wishlists,
    schema::{created_at_column, currency_column, id_column, table_exists},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum WishlistItems {
    Table,
    Id,
    WishlistId,
    Name,
    Description,
    Amount,
    Currency,
    Priority,
    Notes,
    Url,
    UrlPreviewImage,
    UploadedImage,
    CustomOrder,
    Purchased,
    PurchasedAt,
    CreatedAt,
    UpdatedAt,
}

/// Every `wishlist_items` column except the short-lived `custom_order`.
pub(crate) fn item_table<T: IntoIden + 'static>(table: T, with_custom_order: bool) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(table)
        .col(id_column(WishlistItems::Id))
        .col(ColumnDef::new(WishlistItems::WishlistId).integer().not_null())
        .col(ColumnDef::new(WishlistItems::Name).text().not_null())
        .col(ColumnDef::new(WishlistItems::Description).text())
        .col(ColumnDef::new(WishlistItems::Amount).double())
        .col(currency_column(WishlistItems::Currency))
        .col(ColumnDef::new(WishlistItems::Priority).integer())
        .col(ColumnDef::new(WishlistItems::Notes).text())
        .col(ColumnDef::new(WishlistItems::Url).text())
        .col(ColumnDef::new(WishlistItems::UrlPreviewImage).text())
        .col(ColumnDef::new(WishlistItems::UploadedImage).text());
    if with_custom_order {
        stmt.col(
            ColumnDef::new(WishlistItems::CustomOrder)
                .integer()
                .not_null(),
        );
    }
    stmt.col(
        ColumnDef::new(WishlistItems::Purchased)
            .integer()
            .not_null()
            .default(0),
    )
    .col(ColumnDef::new(WishlistItems::PurchasedAt).text())
    .col(created_at_column(WishlistItems::CreatedAt))
    .col(ColumnDef::new(WishlistItems::UpdatedAt).text())
    .foreign_key(
        ForeignKey::create()
            .name("fk-wishlist_items-wishlist_id")
            .from(WishlistItems::Table, WishlistItems::WishlistId)
            .to(Wishlists::Table, Wishlists::Id)
            .on_delete(ForeignKeyAction::Cascade),
    );
    stmt
}

pub(crate) async fn create_item_indexes(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name("idx_wishlist_items_wishlist_id")
                .table(WishlistItems::Table)
                .col(WishlistItems::WishlistId)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name("idx_wishlist_items_purchased")
                .table(WishlistItems::Table)
                .col(WishlistItems::Purchased)
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if table_exists(db, "wishlist_items").await? {
            return Ok(());
        }

        manager
            .create_table(item_table(WishlistItems::Table, true))
            .await?;
        create_item_indexes(manager).await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_wishlist_items_custom_order")
                    .table(WishlistItems::Table)
                    .col(WishlistItems::CustomOrder)
                    .to_owned(),
            )
            .await
    }
}

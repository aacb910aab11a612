use sea_orm_migration::prelude::*;

use crate::{
    m018_create_wishlist_items::{create_item_indexes, item_table},
    schema::{exec, has_column, index_exists},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum WishlistItemsNew {
    Table,
}

const KEPT_COLUMNS: &str = "id, wishlist_id, name, description, amount, currency, priority, \
    notes, url, url_preview_image, uploaded_image, purchased, purchased_at, created_at, updated_at";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if !has_column(db, "wishlist_items", "custom_order").await? {
            return Ok(());
        }

        if index_exists(db, "idx_wishlist_items_custom_order").await? {
            exec(db, "DROP INDEX idx_wishlist_items_custom_order").await?;
        }

        manager
            .create_table(item_table(WishlistItemsNew::Table, false))
            .await?;
        exec(
            db,
            &format!(
                "INSERT INTO wishlist_items_new ({KEPT_COLUMNS}) \
                 SELECT {KEPT_COLUMNS} FROM wishlist_items"
            ),
        )
        .await?;
        exec(db, "DROP TABLE wishlist_items").await?;
        exec(db, "ALTER TABLE wishlist_items_new RENAME TO wishlist_items").await?;

        create_item_indexes(manager).await
    }
}

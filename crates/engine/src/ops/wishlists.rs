use sea_orm::{ActiveValue, ConnectionTrait, QueryResult, Statement, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine, Wishlist,
    util::{normalize_optional_text, normalize_required_name, now_timestamp},
    wishlists,
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, Deserialize)]
pub struct NewWishlist {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WishlistPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A wishlist with the number of items still to buy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WishlistSummary {
    #[serde(flatten)]
    pub wishlist: Wishlist,
    pub item_count: i64,
}

const SUMMARY_SELECT: &str = "SELECT w.id, w.name, w.description, w.created_at, w.updated_at, \
     COUNT(CASE WHEN wi.purchased = 0 THEN wi.id END) AS item_count \
     FROM wishlists w LEFT JOIN wishlist_items wi ON w.id = wi.wishlist_id";

fn summary_from_row(row: &QueryResult) -> Result<WishlistSummary, DbErr> {
    Ok(WishlistSummary {
        wishlist: Wishlist {
            id: row.try_get("", "id")?,
            name: row.try_get("", "name")?,
            description: row.try_get("", "description")?,
            created_at: row.try_get("", "created_at")?,
            updated_at: row.try_get("", "updated_at")?,
        },
        item_count: row.try_get("", "item_count")?,
    })
}

pub(crate) async fn require_wishlist<C: ConnectionTrait>(db: &C, id: i32) -> ResultEngine<Wishlist> {
    wishlists::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::Validation(format!("Wishlist with id {id} not found")))
}

impl Engine {
    /// Wishlists by name. `search` matches name or description, ignoring case.
    pub async fn wishlists(&self, search: Option<&str>) -> ResultEngine<Vec<WishlistSummary>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let (filter, values): (&str, Vec<Value>) = match search {
            Some(term) => {
                let pattern = format!("%{}%", term.to_lowercase());
                (
                    " WHERE LOWER(w.name) LIKE ? OR LOWER(w.description) LIKE ?",
                    vec![pattern.clone().into(), pattern.into()],
                )
            }
            None => ("", Vec::new()),
        };
        let rows = self
            .database
            .query_all(Statement::from_sql_and_values(
                self.database.get_database_backend(),
                format!("{SUMMARY_SELECT}{filter} GROUP BY w.id ORDER BY LOWER(w.name) ASC"),
                values,
            ))
            .await?;
        Ok(rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<_, _>>()?)
    }

    pub async fn wishlist(&self, id: i32) -> ResultEngine<Option<WishlistSummary>> {
        let row = self
            .database
            .query_one(Statement::from_sql_and_values(
                self.database.get_database_backend(),
                format!("{SUMMARY_SELECT} WHERE w.id = ? GROUP BY w.id"),
                vec![id.into()],
            ))
            .await?;
        Ok(row.as_ref().map(summary_from_row).transpose()?)
    }

    pub async fn create_wishlist(&self, wishlist: NewWishlist) -> ResultEngine<Wishlist> {
        let name = normalize_required_name(&wishlist.name, "wishlist name")?;
        let model = wishlists::ActiveModel {
            name: ActiveValue::Set(name),
            description: ActiveValue::Set(normalize_optional_text(wishlist.description.as_deref())),
            created_at: ActiveValue::Set(now_timestamp()),
            updated_at: ActiveValue::Set(None),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        Ok(model)
    }

    pub async fn update_wishlist(
        &self,
        id: i32,
        patch: WishlistPatch,
    ) -> ResultEngine<Option<Wishlist>> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "wishlist name"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = wishlists::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let mut model: wishlists::ActiveModel = existing.into();
            if let Some(name) = name {
                model.name = ActiveValue::Set(name);
            }
            if let Some(description) = patch.description.as_deref() {
                model.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            model.updated_at = ActiveValue::Set(Some(now_timestamp()));
            Ok(Some(model.update(&db_tx).await?))
        })
    }

    /// Items go with the wishlist.
    pub async fn delete_wishlist(&self, id: i32) -> ResultEngine<bool> {
        let deleted = wishlists::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        Ok(deleted.rows_affected > 0)
    }
}

use std::collections::BTreeSet;

use sea_orm::{
    ActiveValue, Order, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Deserialize;

use crate::{
    EngineError, Project, ProjectStatus, ResultEngine, WishlistItem, projects,
    ranking::{Direction, Ranking},
    util::{
        normalize_currency, normalize_optional_text, normalize_required_name, now_timestamp,
        unique_ids, validate_amount,
    },
    wishlist_items, wishlists,
};

use super::{Engine, projects::append_project, wishlists::require_wishlist, with_tx};

const MAX_NAME_CHARS: usize = 200;

#[derive(Clone, Debug, Deserialize)]
pub struct NewWishlistItem {
    pub wishlist_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    /// Slot to insert at; appended when missing.
    pub priority: Option<i32>,
    pub notes: Option<String>,
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WishlistItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub priority: Option<i32>,
    pub notes: Option<String>,
    /// An empty string removes the link and its preview.
    pub url: Option<String>,
    pub purchased: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct WishlistItemFilter {
    #[serde(default)]
    pub show_purchased: bool,
}

fn item_name(name: &str) -> ResultEngine<String> {
    let name = normalize_required_name(name, "wishlist item name")?;
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(EngineError::Validation(format!(
            "wishlist item name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

fn item_priority(priority: i32) -> ResultEngine<i32> {
    if priority < 1 {
        return Err(EngineError::Validation(
            "priority must be at least 1".to_string(),
        ));
    }
    Ok(priority)
}

fn item_amount(amount: f64) -> ResultEngine<f64> {
    validate_amount(amount, "wishlist item amount")
}

impl Engine {
    async fn preview_for(&self, url: Option<&str>) -> Option<String> {
        match (self.preview.as_ref(), url) {
            (Some(fetcher), Some(url)) => fetcher.preview_image(url).await,
            _ => None,
        }
    }

    /// Items of a wishlist by priority, then name. Purchased items are
    /// hidden unless asked for.
    pub async fn wishlist_items(
        &self,
        wishlist_id: i32,
        filter: WishlistItemFilter,
    ) -> ResultEngine<Vec<WishlistItem>> {
        let mut query = wishlist_items::Entity::find()
            .filter(wishlist_items::Column::WishlistId.eq(wishlist_id));
        if !filter.show_purchased {
            query = query.filter(wishlist_items::Column::Purchased.eq(false));
        }
        Ok(query
            .order_by_asc(wishlist_items::Column::Priority)
            .order_by(Expr::cust("LOWER(name)"), Order::Asc)
            .all(&self.database)
            .await?)
    }

    pub async fn wishlist_item(&self, id: i32) -> ResultEngine<Option<WishlistItem>> {
        Ok(wishlist_items::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    /// Insert an item at its requested slot, pushing the items from that slot
    /// on down by one. Slots past the end are clamped to the end.
    pub async fn create_wishlist_item(&self, item: NewWishlistItem) -> ResultEngine<WishlistItem> {
        let name = item_name(&item.name)?;
        let amount = item.amount.map(item_amount).transpose()?;
        let currency = normalize_currency(item.currency.as_deref())?;
        let priority = item.priority.map(item_priority).transpose()?;
        let url = normalize_optional_text(item.url.as_deref());
        let preview = self.preview_for(url.as_deref()).await;

        with_tx!(self, |db_tx| {
            require_wishlist(&db_tx, item.wishlist_id).await?;
            let ranking = Ranking::wishlist(item.wishlist_id);
            let end = ranking.len(&db_tx).await? + 1;
            let slot = priority.map_or(end, |p| p.min(end));
            ranking.open_slot(&db_tx, slot).await?;

            let model = wishlist_items::ActiveModel {
                wishlist_id: ActiveValue::Set(item.wishlist_id),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_optional_text(item.description.as_deref())),
                amount: ActiveValue::Set(amount),
                currency: ActiveValue::Set(currency),
                priority: ActiveValue::Set(Some(slot)),
                notes: ActiveValue::Set(normalize_optional_text(item.notes.as_deref())),
                url: ActiveValue::Set(url),
                url_preview_image: ActiveValue::Set(preview),
                uploaded_image: ActiveValue::Set(None),
                purchased: ActiveValue::Set(false),
                purchased_at: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now_timestamp()),
                updated_at: ActiveValue::Set(None),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            Ok(model)
        })
    }

    pub async fn update_wishlist_item(
        &self,
        id: i32,
        patch: WishlistItemPatch,
    ) -> ResultEngine<Option<WishlistItem>> {
        let name = patch.name.as_deref().map(item_name).transpose()?;
        let amount = patch.amount.map(item_amount).transpose()?;
        let currency = patch
            .currency
            .as_deref()
            .map(|currency| normalize_currency(Some(currency)))
            .transpose()?;
        let priority = patch.priority.map(item_priority).transpose()?;

        let Some(before) = self.wishlist_item(id).await? else {
            return Ok(None);
        };
        let new_url = patch
            .url
            .as_deref()
            .map(|url| normalize_optional_text(Some(url)))
            .filter(|url| *url != before.url);
        let preview = match &new_url {
            Some(Some(url)) => self.preview_for(Some(url)).await,
            _ => None,
        };

        with_tx!(self, |db_tx| {
            let Some(existing) = wishlist_items::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let was_purchased = existing.purchased;
            let wishlist_id = existing.wishlist_id;
            let current_priority = existing.priority;
            let mut model: wishlist_items::ActiveModel = existing.into();

            if let Some(name) = name {
                model.name = ActiveValue::Set(name);
            }
            if let Some(description) = patch.description.as_deref() {
                model.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            if let Some(amount) = amount {
                model.amount = ActiveValue::Set(Some(amount));
            }
            if let Some(currency) = currency {
                model.currency = ActiveValue::Set(currency);
            }
            if let Some(notes) = patch.notes.as_deref() {
                model.notes = ActiveValue::Set(normalize_optional_text(Some(notes)));
            }
            match new_url {
                Some(Some(url)) => {
                    model.url = ActiveValue::Set(Some(url));
                    if preview.is_some() {
                        model.url_preview_image = ActiveValue::Set(preview);
                    }
                }
                Some(None) => {
                    model.url = ActiveValue::Set(None);
                    model.url_preview_image = ActiveValue::Set(None);
                }
                None => {}
            }
            if let Some(purchased) = patch.purchased {
                model.purchased = ActiveValue::Set(purchased);
                if purchased && !was_purchased {
                    model.purchased_at = ActiveValue::Set(Some(now_timestamp()));
                } else if !purchased && was_purchased {
                    model.purchased_at = ActiveValue::Set(None);
                }
            }
            model.updated_at = ActiveValue::Set(Some(now_timestamp()));
            model.update(&db_tx).await?;

            if let Some(target) = priority {
                let ranking = Ranking::wishlist(wishlist_id);
                let from = match current_priority {
                    Some(from) => from,
                    None => {
                        ranking.compact(&db_tx).await?;
                        wishlist_items::Entity::find_by_id(id)
                            .one(&db_tx)
                            .await?
                            .and_then(|item| item.priority)
                            .unwrap_or(1)
                    }
                };
                let target = target.min(ranking.len(&db_tx).await?);
                ranking.move_to(&db_tx, id, from, target).await?;
            }

            Ok(wishlist_items::Entity::find_by_id(id).one(&db_tx).await?)
        })
    }

    /// The remaining items of the wishlist close the gap.
    pub async fn delete_wishlist_item(&self, id: i32) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let Some(existing) = wishlist_items::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(false);
            };
            let wishlist_id = existing.wishlist_id;
            existing.delete(&db_tx).await?;
            Ranking::wishlist(wishlist_id).compact(&db_tx).await?;
            Ok(true)
        })
    }

    pub async fn bulk_delete_wishlist_items(&self, ids: &[i32]) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        with_tx!(self, |db_tx| {
            let touched: BTreeSet<i32> = wishlist_items::Entity::find()
                .filter(wishlist_items::Column::Id.is_in(ids.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|item| item.wishlist_id)
                .collect();
            let deleted = wishlist_items::Entity::delete_many()
                .filter(wishlist_items::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?
                .rows_affected;
            for wishlist_id in touched {
                Ranking::wishlist(wishlist_id).compact(&db_tx).await?;
            }
            Ok(deleted)
        })
    }

    /// Mark items purchased or not. `purchased_at` only changes on rows whose
    /// flag actually flips. Returns how many of the ids exist.
    pub async fn bulk_purchase_wishlist_items(
        &self,
        ids: &[i32],
        purchased: bool,
    ) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        with_tx!(self, |db_tx| {
            let found = wishlist_items::Entity::find()
                .filter(wishlist_items::Column::Id.is_in(ids.clone()))
                .count(&db_tx)
                .await?;
            let now = now_timestamp();
            wishlist_items::Entity::update_many()
                .col_expr(wishlist_items::Column::Purchased, Expr::value(purchased))
                .col_expr(
                    wishlist_items::Column::PurchasedAt,
                    Expr::value(purchased.then(|| now.clone())),
                )
                .col_expr(wishlist_items::Column::UpdatedAt, Expr::value(now))
                .filter(wishlist_items::Column::Id.is_in(ids))
                .filter(wishlist_items::Column::Purchased.ne(purchased))
                .exec(&db_tx)
                .await?;
            Ok(found)
        })
    }

    /// Move items to another wishlist, appended after its current items in
    /// their previous order. Both sides are renumbered.
    pub async fn move_wishlist_items(
        &self,
        ids: &[i32],
        target_wishlist_id: i32,
    ) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        with_tx!(self, |db_tx| {
            if wishlists::Entity::find_by_id(target_wishlist_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::Validation(format!(
                    "Target wishlist with id {target_wishlist_id} not found"
                )));
            }
            let items = wishlist_items::Entity::find()
                .filter(wishlist_items::Column::Id.is_in(ids))
                .filter(wishlist_items::Column::WishlistId.ne(target_wishlist_id))
                .order_by_asc(wishlist_items::Column::WishlistId)
                .order_by_asc(wishlist_items::Column::Priority)
                .order_by_asc(wishlist_items::Column::Id)
                .all(&db_tx)
                .await?;

            let target = Ranking::wishlist(target_wishlist_id);
            let mut next = target.max(&db_tx).await? + 1;
            let mut sources = BTreeSet::new();
            let moved = items.len() as u64;
            for item in items {
                sources.insert(item.wishlist_id);
                let mut model: wishlist_items::ActiveModel = item.into();
                model.wishlist_id = ActiveValue::Set(target_wishlist_id);
                model.priority = ActiveValue::Set(Some(next));
                model.updated_at = ActiveValue::Set(Some(now_timestamp()));
                model.update(&db_tx).await?;
                next += 1;
            }

            for wishlist_id in sources {
                Ranking::wishlist(wishlist_id).compact(&db_tx).await?;
            }
            target.compact(&db_tx).await?;
            tracing::info!("moved {moved} wishlist items to wishlist {target_wishlist_id}");
            Ok(moved)
        })
    }

    /// Trade places with the neighbouring item of the same wishlist.
    pub async fn swap_wishlist_item_priority(
        &self,
        id: i32,
        direction: Direction,
    ) -> ResultEngine<Option<WishlistItem>> {
        with_tx!(self, |db_tx| {
            let Some(existing) = wishlist_items::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let current = existing.priority.ok_or_else(|| {
                EngineError::Validation(format!("Wishlist item {id} has no priority set"))
            })?;
            Ranking::wishlist(existing.wishlist_id)
                .swap(&db_tx, id, current, direction)
                .await?;
            Ok(wishlist_items::Entity::find_by_id(id).one(&db_tx).await?)
        })
    }

    /// Turn an item into an active project at the end of the project
    /// ranking, then remove it from its wishlist.
    pub async fn export_wishlist_item_to_project(&self, id: i32) -> ResultEngine<Project> {
        with_tx!(self, |db_tx| {
            let item = wishlist_items::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::Validation(format!("Wishlist item with id {id} not found"))
                })?;
            let amount = item.amount.filter(|amount| *amount > 0.0).ok_or_else(|| {
                EngineError::Validation("Cannot export item without a valid amount".to_string())
            })?;

            let project = append_project(
                &db_tx,
                projects::ActiveModel {
                    name: ActiveValue::Set(item.name.clone()),
                    description: ActiveValue::Set(
                        item.description.clone().or_else(|| item.notes.clone()),
                    ),
                    target_amount: ActiveValue::Set(amount),
                    status: ActiveValue::Set(ProjectStatus::Active.as_str().to_string()),
                    savings_account_id: ActiveValue::Set(None),
                    currency: ActiveValue::Set(item.currency.clone()),
                    created_at: ActiveValue::Set(now_timestamp()),
                    updated_at: ActiveValue::Set(None),
                    ..Default::default()
                },
            )
            .await?;

            let wishlist_id = item.wishlist_id;
            item.delete(&db_tx).await?;
            Ranking::wishlist(wishlist_id).compact(&db_tx).await?;
            tracing::info!("exported wishlist item {id} to project {}", project.id);
            Ok(project)
        })
    }
}

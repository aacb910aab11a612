use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Deserialize;

use crate::{
    IncomeEntry, Month, ResultEngine, income_entries,
    util::{
        format_date, join_items, normalize_currency, normalize_required_name, unique_ids,
        validate_amount,
    },
};

use super::{Engine, autocomplete::record_suggestion, fetch_for_merge, month_of, with_tx};

#[derive(Clone, Debug, Deserialize)]
pub struct NewIncomeEntry {
    pub amount: f64,
    pub date: NaiveDate,
    pub item: String,
    pub currency: Option<String>,
}

/// Fields left `None` keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IncomeEntryPatch {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub item: Option<String>,
    pub currency: Option<String>,
}

struct ValidPatch {
    amount: Option<f64>,
    date: Option<String>,
    item: Option<String>,
    currency: Option<String>,
}

impl IncomeEntryPatch {
    fn validate(self) -> ResultEngine<ValidPatch> {
        Ok(ValidPatch {
            amount: self
                .amount
                .map(|amount| validate_amount(amount, "income entry amount"))
                .transpose()?,
            date: self.date.map(format_date),
            item: self
                .item
                .map(|item| normalize_required_name(&item, "income entry item"))
                .transpose()?,
            currency: self
                .currency
                .map(|currency| normalize_currency(Some(&currency)))
                .transpose()?,
        })
    }
}

impl Engine {
    /// Income entries, newest first. With `month`, only that month's.
    pub async fn income_entries(&self, month: Option<&str>) -> ResultEngine<Vec<IncomeEntry>> {
        let mut query = income_entries::Entity::find();
        if let Some(month) = month {
            let month = Month::parse(month)?;
            query = query.filter(income_entries::Column::Date.like(month.date_pattern()));
        }
        Ok(query
            .order_by_desc(income_entries::Column::Date)
            .order_by_desc(income_entries::Column::Id)
            .all(&self.database)
            .await?)
    }

    pub async fn income_entry(&self, id: i32) -> ResultEngine<Option<IncomeEntry>> {
        Ok(income_entries::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    pub async fn create_income_entry(&self, entry: NewIncomeEntry) -> ResultEngine<IncomeEntry> {
        let amount = validate_amount(entry.amount, "income entry amount")?;
        let item = normalize_required_name(&entry.item, "income entry item")?;
        let currency = normalize_currency(entry.currency.as_deref())?;
        with_tx!(self, |db_tx| {
            let model = income_entries::ActiveModel {
                amount: ActiveValue::Set(amount),
                date: ActiveValue::Set(format_date(entry.date)),
                item: ActiveValue::Set(item),
                currency: ActiveValue::Set(currency),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            record_suggestion(&db_tx, "income_entries", "item", &model.item).await?;
            self.rebalance_touched(&db_tx, [Month::of(entry.date)])
                .await?;
            Ok(model)
        })
    }

    /// Returns `None` when `id` does not exist.
    pub async fn update_income_entry(
        &self,
        id: i32,
        patch: IncomeEntryPatch,
    ) -> ResultEngine<Option<IncomeEntry>> {
        let patch = patch.validate()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = income_entries::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let old_month = month_of(&existing.date);

            let mut model: income_entries::ActiveModel = existing.into();
            if let Some(amount) = patch.amount {
                model.amount = ActiveValue::Set(amount);
            }
            if let Some(date) = patch.date {
                model.date = ActiveValue::Set(date);
            }
            if let Some(item) = patch.item {
                model.item = ActiveValue::Set(item);
            }
            if let Some(currency) = patch.currency {
                model.currency = ActiveValue::Set(currency);
            }
            let updated = model.update(&db_tx).await?;

            self.rebalance_touched(&db_tx, old_month.into_iter().chain(month_of(&updated.date)))
                .await?;
            Ok(Some(updated))
        })
    }

    pub async fn delete_income_entry(&self, id: i32) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let Some(existing) = income_entries::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(false);
            };
            let month = month_of(&existing.date);
            existing.delete(&db_tx).await?;
            self.rebalance_touched(&db_tx, month).await?;
            Ok(true)
        })
    }

    /// Returns the number of deleted rows; unknown ids are skipped.
    pub async fn bulk_delete_income_entries(&self, ids: &[i32]) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        with_tx!(self, |db_tx| {
            let doomed = income_entries::Entity::find()
                .filter(income_entries::Column::Id.is_in(ids.clone()))
                .all(&db_tx)
                .await?;
            let deleted = income_entries::Entity::delete_many()
                .filter(income_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?
                .rows_affected;
            self.rebalance_touched(&db_tx, doomed.iter().filter_map(|e| month_of(&e.date)))
                .await?;
            Ok(deleted)
        })
    }

    /// Write the same values on every listed row.
    ///
    /// Fields missing from `patch` are taken from the first existing row
    /// (lowest id), so every row ends up identical on all four fields.
    pub async fn bulk_update_income_entries(
        &self,
        ids: &[i32],
        patch: IncomeEntryPatch,
    ) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let patch = patch.validate()?;
        with_tx!(self, |db_tx| {
            let existing = income_entries::Entity::find()
                .filter(income_entries::Column::Id.is_in(ids.clone()))
                .order_by_asc(income_entries::Column::Id)
                .all(&db_tx)
                .await?;
            let Some(first) = existing.first() else {
                return Ok(0);
            };

            let amount = patch.amount.unwrap_or(first.amount);
            let date = patch.date.unwrap_or_else(|| first.date.clone());
            let item = patch.item.unwrap_or_else(|| first.item.clone());
            let currency = patch.currency.unwrap_or_else(|| first.currency.clone());
            let new_month = month_of(&date);

            let updated = income_entries::Entity::update_many()
                .col_expr(income_entries::Column::Amount, Expr::value(amount))
                .col_expr(income_entries::Column::Date, Expr::value(date))
                .col_expr(income_entries::Column::Item, Expr::value(item))
                .col_expr(income_entries::Column::Currency, Expr::value(currency))
                .filter(income_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let touched = existing
                .iter()
                .filter_map(|e| month_of(&e.date))
                .chain(new_month);
            self.rebalance_touched(&db_tx, touched).await?;
            Ok(updated)
        })
    }

    /// Collapse several entries into one dated on the latest source date.
    pub async fn merge_income_entries(&self, ids: &[i32]) -> ResultEngine<IncomeEntry> {
        with_tx!(self, |db_tx| {
            let (ids, entries) =
                fetch_for_merge::<income_entries::Entity, _>(&db_tx, ids, "Income entry").await?;

            let amount = entries.iter().map(|e| e.amount).sum::<f64>();
            let item = join_items(entries.iter().map(|e| e.item.as_str()));
            let currency = entries[0].currency.clone();
            let date = entries
                .iter()
                .map(|e| e.date.clone())
                .max()
                .unwrap_or_default();

            let merged = income_entries::ActiveModel {
                amount: ActiveValue::Set(amount),
                date: ActiveValue::Set(date),
                item: ActiveValue::Set(item),
                currency: ActiveValue::Set(currency),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            income_entries::Entity::delete_many()
                .filter(income_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?;

            let touched = entries
                .iter()
                .filter_map(|e| month_of(&e.date))
                .chain(month_of(&merged.date));
            self.rebalance_touched(&db_tx, touched).await?;
            Ok(merged)
        })
    }
}

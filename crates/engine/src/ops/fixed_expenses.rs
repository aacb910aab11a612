use std::collections::HashSet;

use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Deserialize;

use crate::{
    EngineError, FixedExpenseEntry, Month, ResultEngine, fixed_expense_entries,
    util::{join_items, normalize_currency, normalize_required_name, unique_ids, validate_amount},
};

use super::{Engine, fetch_for_merge, with_tx};

#[derive(Clone, Debug, Deserialize)]
pub struct NewFixedExpense {
    pub amount: f64,
    pub item: String,
    pub currency: Option<String>,
    pub month: i32,
    pub year: i32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FixedExpensePatch {
    pub amount: Option<f64>,
    pub item: Option<String>,
    pub currency: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

fn validate_month(month: i32) -> ResultEngine<i32> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(EngineError::Validation(format!(
            "month must be between 1 and 12, got {month}"
        )))
    }
}

fn validate_year(year: i32) -> ResultEngine<i32> {
    if (1900..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(EngineError::Validation(format!(
            "year must be between 1900 and 9999, got {year}"
        )))
    }
}

fn bucket(entry: &FixedExpenseEntry) -> Option<Month> {
    Month::new(entry.year, u32::try_from(entry.month).ok()?).ok()
}

impl FixedExpensePatch {
    fn validate(self) -> ResultEngine<Self> {
        Ok(Self {
            amount: self
                .amount
                .map(|amount| validate_amount(amount, "fixed expense amount"))
                .transpose()?,
            item: self
                .item
                .map(|item| normalize_required_name(&item, "fixed expense item"))
                .transpose()?,
            currency: self
                .currency
                .map(|currency| normalize_currency(Some(&currency)))
                .transpose()?,
            month: self.month.map(validate_month).transpose()?,
            year: self.year.map(validate_year).transpose()?,
        })
    }
}

impl Engine {
    /// Fixed expenses, newest first. With `month`, only that month's.
    pub async fn fixed_expense_entries(
        &self,
        month: Option<&str>,
    ) -> ResultEngine<Vec<FixedExpenseEntry>> {
        let mut query = fixed_expense_entries::Entity::find();
        if let Some(month) = month {
            let month = Month::parse(month)?;
            query = query
                .filter(fixed_expense_entries::Column::Month.eq(month.month() as i32))
                .filter(fixed_expense_entries::Column::Year.eq(month.year()));
        }
        Ok(query
            .order_by_desc(fixed_expense_entries::Column::Id)
            .all(&self.database)
            .await?)
    }

    pub async fn fixed_expense_entry(&self, id: i32) -> ResultEngine<Option<FixedExpenseEntry>> {
        Ok(fixed_expense_entries::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    pub async fn create_fixed_expense_entry(
        &self,
        entry: NewFixedExpense,
    ) -> ResultEngine<FixedExpenseEntry> {
        let amount = validate_amount(entry.amount, "fixed expense amount")?;
        let item = normalize_required_name(&entry.item, "fixed expense item")?;
        let currency = normalize_currency(entry.currency.as_deref())?;
        let month = validate_month(entry.month)?;
        let year = validate_year(entry.year)?;
        with_tx!(self, |db_tx| {
            let model = fixed_expense_entries::ActiveModel {
                amount: ActiveValue::Set(amount),
                item: ActiveValue::Set(item),
                currency: ActiveValue::Set(currency),
                month: ActiveValue::Set(month),
                year: ActiveValue::Set(year),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            self.rebalance_touched(&db_tx, bucket(&model)).await?;
            Ok(model)
        })
    }

    pub async fn update_fixed_expense_entry(
        &self,
        id: i32,
        patch: FixedExpensePatch,
    ) -> ResultEngine<Option<FixedExpenseEntry>> {
        let patch = patch.validate()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = fixed_expense_entries::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };
            let old_month = bucket(&existing);

            let mut model: fixed_expense_entries::ActiveModel = existing.into();
            if let Some(amount) = patch.amount {
                model.amount = ActiveValue::Set(amount);
            }
            if let Some(item) = patch.item {
                model.item = ActiveValue::Set(item);
            }
            if let Some(currency) = patch.currency {
                model.currency = ActiveValue::Set(currency);
            }
            if let Some(month) = patch.month {
                model.month = ActiveValue::Set(month);
            }
            if let Some(year) = patch.year {
                model.year = ActiveValue::Set(year);
            }
            let updated = model.update(&db_tx).await?;

            self.rebalance_touched(&db_tx, old_month.into_iter().chain(bucket(&updated)))
                .await?;
            Ok(Some(updated))
        })
    }

    /// Debts linked to the row lose their link.
    pub async fn delete_fixed_expense_entry(&self, id: i32) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let Some(existing) = fixed_expense_entries::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
            else {
                return Ok(false);
            };
            let month = bucket(&existing);
            existing.delete(&db_tx).await?;
            self.rebalance_touched(&db_tx, month).await?;
            Ok(true)
        })
    }

    pub async fn bulk_delete_fixed_expense_entries(&self, ids: &[i32]) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        with_tx!(self, |db_tx| {
            let doomed = fixed_expense_entries::Entity::find()
                .filter(fixed_expense_entries::Column::Id.is_in(ids.clone()))
                .all(&db_tx)
                .await?;
            let deleted = fixed_expense_entries::Entity::delete_many()
                .filter(fixed_expense_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?
                .rows_affected;
            self.rebalance_touched(&db_tx, doomed.iter().filter_map(bucket))
                .await?;
            Ok(deleted)
        })
    }

    /// Same fallback rule as the income bulk update: unset fields come from
    /// the first existing row.
    pub async fn bulk_update_fixed_expense_entries(
        &self,
        ids: &[i32],
        patch: FixedExpensePatch,
    ) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let patch = patch.validate()?;
        with_tx!(self, |db_tx| {
            let existing = fixed_expense_entries::Entity::find()
                .filter(fixed_expense_entries::Column::Id.is_in(ids.clone()))
                .order_by_asc(fixed_expense_entries::Column::Id)
                .all(&db_tx)
                .await?;
            let Some(first) = existing.first() else {
                return Ok(0);
            };

            let amount = patch.amount.unwrap_or(first.amount);
            let item = patch.item.unwrap_or_else(|| first.item.clone());
            let currency = patch.currency.unwrap_or_else(|| first.currency.clone());
            let month = patch.month.unwrap_or(first.month);
            let year = patch.year.unwrap_or(first.year);

            let updated = fixed_expense_entries::Entity::update_many()
                .col_expr(fixed_expense_entries::Column::Amount, Expr::value(amount))
                .col_expr(fixed_expense_entries::Column::Item, Expr::value(item))
                .col_expr(fixed_expense_entries::Column::Currency, Expr::value(currency))
                .col_expr(fixed_expense_entries::Column::Month, Expr::value(month))
                .col_expr(fixed_expense_entries::Column::Year, Expr::value(year))
                .filter(fixed_expense_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let new_month = u32::try_from(month)
                .ok()
                .and_then(|m| Month::new(year, m).ok());
            let touched = existing.iter().filter_map(bucket).chain(new_month);
            self.rebalance_touched(&db_tx, touched).await?;
            Ok(updated)
        })
    }

    /// Collapse several fixed expenses into one, booked on the most recent
    /// year, then month, among the sources.
    pub async fn merge_fixed_expense_entries(&self, ids: &[i32]) -> ResultEngine<FixedExpenseEntry> {
        with_tx!(self, |db_tx| {
            let (ids, entries) = fetch_for_merge::<fixed_expense_entries::Entity, _>(
                &db_tx,
                ids,
                "Fixed expense entry",
            )
            .await?;

            let amount = entries.iter().map(|e| e.amount).sum::<f64>();
            let item = join_items(entries.iter().map(|e| e.item.as_str()));
            let currency = entries[0].currency.clone();
            let (year, month) = entries
                .iter()
                .map(|e| (e.year, e.month))
                .max()
                .unwrap_or((entries[0].year, entries[0].month));

            let merged = fixed_expense_entries::ActiveModel {
                amount: ActiveValue::Set(amount),
                item: ActiveValue::Set(item),
                currency: ActiveValue::Set(currency),
                month: ActiveValue::Set(month),
                year: ActiveValue::Set(year),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            fixed_expense_entries::Entity::delete_many()
                .filter(fixed_expense_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?;

            let touched = entries.iter().filter_map(bucket).chain(bucket(&merged));
            self.rebalance_touched(&db_tx, touched).await?;
            Ok(merged)
        })
    }

    /// Copy `month`'s fixed expenses (all, or only `ids`) into the next month.
    ///
    /// Rows whose item already exists in the target month are skipped, so
    /// copying twice is harmless. Returns how many rows were created.
    pub async fn copy_fixed_expenses_to_next_month(
        &self,
        month: &str,
        ids: Option<&[i32]>,
    ) -> ResultEngine<u64> {
        let source = Month::parse(month)?;
        let target = source.next();
        let ids = ids.map(unique_ids);
        with_tx!(self, |db_tx| {
            let mut query = fixed_expense_entries::Entity::find()
                .filter(fixed_expense_entries::Column::Month.eq(source.month() as i32))
                .filter(fixed_expense_entries::Column::Year.eq(source.year()));
            if let Some(ids) = ids {
                query = query.filter(fixed_expense_entries::Column::Id.is_in(ids));
            }
            let rows = query
                .order_by_asc(fixed_expense_entries::Column::Id)
                .all(&db_tx)
                .await?;

            let mut present: HashSet<String> = fixed_expense_entries::Entity::find()
                .filter(fixed_expense_entries::Column::Month.eq(target.month() as i32))
                .filter(fixed_expense_entries::Column::Year.eq(target.year()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|e| e.item)
                .collect();

            let mut copied = 0;
            for row in rows {
                if !present.insert(row.item.clone()) {
                    continue;
                }
                fixed_expense_entries::ActiveModel {
                    amount: ActiveValue::Set(row.amount),
                    item: ActiveValue::Set(row.item),
                    currency: ActiveValue::Set(row.currency),
                    month: ActiveValue::Set(target.month() as i32),
                    year: ActiveValue::Set(target.year()),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
                copied += 1;
            }
            tracing::info!("copied {copied} fixed expenses from {source} to {target}");

            if copied > 0 {
                self.rebalance_touched(&db_tx, [target]).await?;
            }
            Ok(copied)
        })
    }
}

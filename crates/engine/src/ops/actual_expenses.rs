use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Deserialize;

use crate::{
    ActualExpenseEntry, ExpenseCategory, Month, ResultEngine, actual_expense_entries,
    util::{
        format_date, join_items, normalize_currency, normalize_required_name, unique_ids,
        validate_amount,
    },
};

use super::{Engine, autocomplete::record_suggestion, fetch_for_merge, with_tx};

#[derive(Clone, Debug, Deserialize)]
pub struct NewActualExpense {
    pub amount: f64,
    pub date: NaiveDate,
    pub item: String,
    pub category: ExpenseCategory,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActualExpensePatch {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub item: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub currency: Option<String>,
}

struct ValidPatch {
    amount: Option<f64>,
    date: Option<String>,
    item: Option<String>,
    category: Option<String>,
    currency: Option<String>,
}

impl ActualExpensePatch {
    fn validate(self) -> ResultEngine<ValidPatch> {
        Ok(ValidPatch {
            amount: self
                .amount
                .map(|amount| validate_amount(amount, "actual expense amount"))
                .transpose()?,
            date: self.date.map(format_date),
            item: self
                .item
                .map(|item| normalize_required_name(&item, "actual expense item"))
                .transpose()?,
            category: self.category.map(|category| category.as_str().to_string()),
            currency: self
                .currency
                .map(|currency| normalize_currency(Some(&currency)))
                .transpose()?,
        })
    }
}

impl Engine {
    /// Actual expenses, newest first. With `month`, only that month's.
    pub async fn actual_expense_entries(
        &self,
        month: Option<&str>,
    ) -> ResultEngine<Vec<ActualExpenseEntry>> {
        let mut query = actual_expense_entries::Entity::find();
        if let Some(month) = month {
            let month = Month::parse(month)?;
            query = query.filter(actual_expense_entries::Column::Date.like(month.date_pattern()));
        }
        Ok(query
            .order_by_desc(actual_expense_entries::Column::Date)
            .order_by_desc(actual_expense_entries::Column::Id)
            .all(&self.database)
            .await?)
    }

    pub async fn actual_expense_entry(&self, id: i32) -> ResultEngine<Option<ActualExpenseEntry>> {
        Ok(actual_expense_entries::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    pub async fn create_actual_expense_entry(
        &self,
        entry: NewActualExpense,
    ) -> ResultEngine<ActualExpenseEntry> {
        let amount = validate_amount(entry.amount, "actual expense amount")?;
        let item = normalize_required_name(&entry.item, "actual expense item")?;
        let currency = normalize_currency(entry.currency.as_deref())?;
        with_tx!(self, |db_tx| {
            let model = actual_expense_entries::ActiveModel {
                amount: ActiveValue::Set(amount),
                date: ActiveValue::Set(format_date(entry.date)),
                item: ActiveValue::Set(item),
                category: ActiveValue::Set(entry.category.as_str().to_string()),
                currency: ActiveValue::Set(currency),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            record_suggestion(&db_tx, "actual_expense_entries", "item", &model.item).await?;
            Ok(model)
        })
    }

    pub async fn update_actual_expense_entry(
        &self,
        id: i32,
        patch: ActualExpensePatch,
    ) -> ResultEngine<Option<ActualExpenseEntry>> {
        let patch = patch.validate()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = actual_expense_entries::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
            else {
                return Ok(None);
            };
            let mut model: actual_expense_entries::ActiveModel = existing.into();
            if let Some(amount) = patch.amount {
                model.amount = ActiveValue::Set(amount);
            }
            if let Some(date) = patch.date {
                model.date = ActiveValue::Set(date);
            }
            if let Some(item) = patch.item {
                model.item = ActiveValue::Set(item);
            }
            if let Some(category) = patch.category {
                model.category = ActiveValue::Set(category);
            }
            if let Some(currency) = patch.currency {
                model.currency = ActiveValue::Set(currency);
            }
            Ok(Some(model.update(&db_tx).await?))
        })
    }

    pub async fn delete_actual_expense_entry(&self, id: i32) -> ResultEngine<bool> {
        let deleted = actual_expense_entries::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        Ok(deleted.rows_affected > 0)
    }

    pub async fn bulk_delete_actual_expense_entries(&self, ids: &[i32]) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = actual_expense_entries::Entity::delete_many()
            .filter(actual_expense_entries::Column::Id.is_in(ids))
            .exec(&self.database)
            .await?;
        Ok(deleted.rows_affected)
    }

    /// Unset fields come from the first existing row (lowest id).
    pub async fn bulk_update_actual_expense_entries(
        &self,
        ids: &[i32],
        patch: ActualExpensePatch,
    ) -> ResultEngine<u64> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let patch = patch.validate()?;
        with_tx!(self, |db_tx| {
            let Some(first) = actual_expense_entries::Entity::find()
                .filter(actual_expense_entries::Column::Id.is_in(ids.clone()))
                .order_by_asc(actual_expense_entries::Column::Id)
                .one(&db_tx)
                .await?
            else {
                return Ok(0);
            };

            let updated = actual_expense_entries::Entity::update_many()
                .col_expr(
                    actual_expense_entries::Column::Amount,
                    Expr::value(patch.amount.unwrap_or(first.amount)),
                )
                .col_expr(
                    actual_expense_entries::Column::Date,
                    Expr::value(patch.date.unwrap_or(first.date)),
                )
                .col_expr(
                    actual_expense_entries::Column::Item,
                    Expr::value(patch.item.unwrap_or(first.item)),
                )
                .col_expr(
                    actual_expense_entries::Column::Category,
                    Expr::value(patch.category.unwrap_or(first.category)),
                )
                .col_expr(
                    actual_expense_entries::Column::Currency,
                    Expr::value(patch.currency.unwrap_or(first.currency)),
                )
                .filter(actual_expense_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?
                .rows_affected;
            Ok(updated)
        })
    }

    /// Collapse several expenses into one dated on the earliest source date,
    /// keeping the first entry's category.
    pub async fn merge_actual_expense_entries(
        &self,
        ids: &[i32],
    ) -> ResultEngine<ActualExpenseEntry> {
        with_tx!(self, |db_tx| {
            let (ids, entries) = fetch_for_merge::<actual_expense_entries::Entity, _>(
                &db_tx,
                ids,
                "Actual expense entry",
            )
            .await?;

            let first = &entries[0];
            let category = ExpenseCategory::try_from(first.category.as_str())
                .unwrap_or(ExpenseCategory::Essential);
            let date = entries
                .iter()
                .map(|e| e.date.clone())
                .min()
                .unwrap_or_else(|| first.date.clone());

            let merged = actual_expense_entries::ActiveModel {
                amount: ActiveValue::Set(entries.iter().map(|e| e.amount).sum::<f64>()),
                date: ActiveValue::Set(date),
                item: ActiveValue::Set(join_items(entries.iter().map(|e| e.item.as_str()))),
                category: ActiveValue::Set(category.as_str().to_string()),
                currency: ActiveValue::Set(first.currency.clone()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            actual_expense_entries::Entity::delete_many()
                .filter(actual_expense_entries::Column::Id.is_in(ids))
                .exec(&db_tx)
                .await?;
            Ok(merged)
        })
    }
}

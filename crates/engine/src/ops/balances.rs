use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, Statement, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{
    ActualExpenseEntry, ExpenseCategory, IncomeEntry, Month, ResultEngine, actual_expense_entries,
    income_entries,
    util::{DEFAULT_CURRENCY, format_date},
};

use super::{Engine, debts::debts_for_month, with_tx};

/// The three monthly totals and what is left of them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AvailableCash {
    pub month: String,
    pub total_income: f64,
    pub total_fixed_expenses: f64,
    pub total_actual_expenses: f64,
    pub available_cash: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetWorth {
    pub month: String,
    pub available_cash: f64,
    /// Sum of every account's `base_balance`.
    pub total_savings: f64,
    /// Sum of the month-reduced debt balances.
    pub total_debts: f64,
    pub net_worth: f64,
}

/// The synthetic row carrying a month's leftover (income) or deficit
/// (unforeseen expense).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "entry", rename_all = "snake_case")]
pub enum BalanceEntry {
    Income(IncomeEntry),
    Expense(ActualExpenseEntry),
}

impl Engine {
    /// `income - fixed expenses - actual expenses` for `month` (`YYYY-MM`).
    pub async fn calculate_available_cash(&self, month: &str) -> ResultEngine<AvailableCash> {
        let month = Month::parse(month)?;
        month_totals(&self.database, month, None).await
    }

    /// `available cash + savings - debts` for `month`.
    pub async fn calculate_net_worth(&self, month: &str) -> ResultEngine<NetWorth> {
        let month = Month::parse(month)?;
        let available_cash = month_totals(&self.database, month, None)
            .await?
            .available_cash;
        let total_savings = scalar(
            &self.database,
            "SELECT TOTAL(base_balance) AS total FROM savings_accounts",
            Vec::new(),
        )
        .await?;
        let total_debts = debts_for_month(&self.database, month)
            .await?
            .iter()
            .map(|debt| debt.balance_for_month)
            .sum::<f64>();

        Ok(NetWorth {
            month: month.to_string(),
            available_cash,
            total_savings,
            total_debts,
            net_worth: available_cash + total_savings - total_debts,
        })
    }

    /// Recompute `month` and upsert its synthetic balance entry.
    ///
    /// Returns `None` when the month nets out to exactly zero; an entry left
    /// by an earlier run is kept untouched in that case.
    pub async fn update_balance_entry_for_month(
        &self,
        month: &str,
    ) -> ResultEngine<Option<BalanceEntry>> {
        let month = Month::parse(month)?;
        with_tx!(self, |db_tx| rebalance_month(&db_tx, month).await)
    }
}

async fn scalar<C: ConnectionTrait>(db: &C, sql: &str, values: Vec<Value>) -> ResultEngine<f64> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            sql,
            values,
        ))
        .await?;
    match row {
        Some(row) => Ok(row.try_get("", "total")?),
        None => Ok(0.0),
    }
}

/// Totals of `month`. With `skip_label`, dated rows carrying that label are
/// left out, which keeps a month's own synthetic entry out of its balance.
pub(crate) async fn month_totals<C: ConnectionTrait>(
    db: &C,
    month: Month,
    skip_label: Option<&str>,
) -> ResultEngine<AvailableCash> {
    let (label_filter, label_values): (&str, Vec<Value>) = match skip_label {
        Some(label) => (" AND item <> ?", vec![label.into()]),
        None => ("", Vec::new()),
    };
    let dated = |table: &str| {
        format!("SELECT TOTAL(amount) AS total FROM {table} WHERE date LIKE ?{label_filter}")
    };
    let dated_values = || {
        let mut values: Vec<Value> = vec![month.date_pattern().into()];
        values.extend(label_values.iter().cloned());
        values
    };

    let total_income = scalar(db, &dated("income_entries"), dated_values()).await?;
    let total_actual_expenses = scalar(db, &dated("actual_expense_entries"), dated_values()).await?;
    let total_fixed_expenses = scalar(
        db,
        "SELECT TOTAL(amount) AS total FROM fixed_expense_entries WHERE month = ? AND year = ?",
        vec![(month.month() as i32).into(), month.year().into()],
    )
    .await?;

    Ok(AvailableCash {
        month: month.to_string(),
        total_income,
        total_fixed_expenses,
        total_actual_expenses,
        available_cash: total_income - total_fixed_expenses - total_actual_expenses,
    })
}

/// Upsert the synthetic entry of `month` from its current totals.
///
/// A positive balance lands in `income_entries`, a negative one in
/// `actual_expense_entries` as an unforeseen expense. Each table holds at
/// most one such row per month; a row left on the other side by an earlier
/// run stays where it is.
pub(crate) async fn rebalance_month<C: ConnectionTrait>(
    db: &C,
    month: Month,
) -> ResultEngine<Option<BalanceEntry>> {
    let label = month.balance_label();
    let cash = month_totals(db, month, Some(&label)).await?.available_cash;
    tracing::debug!("available cash for {month} is {cash}");
    if cash == 0.0 {
        return Ok(None);
    }

    let date = format_date(month.first_day());
    let amount = cash.abs();

    if cash > 0.0 {
        let existing = income_entries::Entity::find()
            .filter(income_entries::Column::Item.eq(label.as_str()))
            .one(db)
            .await?;
        let entry = match existing {
            Some(existing) => {
                let mut model: income_entries::ActiveModel = existing.into();
                model.amount = ActiveValue::Set(amount);
                model.date = ActiveValue::Set(date);
                model.update(db).await?
            }
            None => {
                income_entries::ActiveModel {
                    amount: ActiveValue::Set(amount),
                    date: ActiveValue::Set(date),
                    item: ActiveValue::Set(label),
                    currency: ActiveValue::Set(DEFAULT_CURRENCY.to_string()),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        Ok(Some(BalanceEntry::Income(entry)))
    } else {
        let existing = actual_expense_entries::Entity::find()
            .filter(actual_expense_entries::Column::Item.eq(label.as_str()))
            .one(db)
            .await?;
        let entry = match existing {
            Some(existing) => {
                let mut model: actual_expense_entries::ActiveModel = existing.into();
                model.amount = ActiveValue::Set(amount);
                model.date = ActiveValue::Set(date);
                model.update(db).await?
            }
            None => {
                actual_expense_entries::ActiveModel {
                    amount: ActiveValue::Set(amount),
                    date: ActiveValue::Set(date),
                    item: ActiveValue::Set(label),
                    category: ActiveValue::Set(ExpenseCategory::Unforeseen.as_str().to_string()),
                    currency: ActiveValue::Set(DEFAULT_CURRENCY.to_string()),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        Ok(Some(BalanceEntry::Expense(entry)))
    }
}

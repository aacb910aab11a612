use std::collections::HashMap;

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    DebtEntry, EngineError, Month, ResultEngine, debt_entries, fixed_expense_entries,
    util::{
        normalize_currency, normalize_optional_text, normalize_required_name, now_timestamp,
        validate_amount,
    },
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, Deserialize)]
pub struct NewDebt {
    pub name: String,
    pub initial_amount: f64,
    pub current_balance: f64,
    pub currency: Option<String>,
    pub linked_fixed_expense_id: Option<i32>,
    pub notes: Option<String>,
}

/// `None` keeps the stored value, the link included.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DebtPatch {
    pub name: Option<String>,
    pub initial_amount: Option<f64>,
    pub current_balance: Option<f64>,
    pub currency: Option<String>,
    pub linked_fixed_expense_id: Option<i32>,
    pub notes: Option<String>,
}

/// A debt as seen from one month.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyDebt {
    #[serde(flatten)]
    pub debt: DebtEntry,
    /// Amount of the linked fixed expense booked in the month, if any.
    pub monthly_payment: Option<f64>,
    /// `current_balance` minus the monthly payment, never below zero.
    pub balance_for_month: f64,
}

fn check_balances(initial_amount: f64, current_balance: f64) -> ResultEngine<()> {
    validate_amount(initial_amount, "Debt entry initial_amount")?;
    validate_amount(current_balance, "Debt entry current_balance")?;
    if current_balance > initial_amount {
        return Err(EngineError::Validation(
            "Debt entry current_balance cannot exceed initial_amount".to_string(),
        ));
    }
    Ok(())
}

async fn require_fixed_expense<C: ConnectionTrait>(db: &C, id: i32) -> ResultEngine<()> {
    if fixed_expense_entries::Entity::find_by_id(id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(EngineError::Validation(format!(
            "Fixed expense entry with id {id} not found"
        )));
    }
    Ok(())
}

/// Every debt with the linked fixed expense of `month` taken off its balance.
///
/// Nothing is written: the stored `current_balance` stays as recorded.
pub(crate) async fn debts_for_month<C: ConnectionTrait>(
    db: &C,
    month: Month,
) -> ResultEngine<Vec<MonthlyDebt>> {
    let payments: HashMap<i32, f64> = fixed_expense_entries::Entity::find()
        .filter(fixed_expense_entries::Column::Month.eq(month.month() as i32))
        .filter(fixed_expense_entries::Column::Year.eq(month.year()))
        .all(db)
        .await?
        .into_iter()
        .map(|expense| (expense.id, expense.amount))
        .collect();

    let debts = debt_entries::Entity::find()
        .order_by_desc(debt_entries::Column::Id)
        .all(db)
        .await?;
    Ok(debts
        .into_iter()
        .map(|debt| {
            let monthly_payment = debt
                .linked_fixed_expense_id
                .and_then(|id| payments.get(&id).copied());
            let balance_for_month = match monthly_payment {
                Some(payment) => (debt.current_balance - payment).max(0.0),
                None => debt.current_balance,
            };
            MonthlyDebt {
                debt,
                monthly_payment,
                balance_for_month,
            }
        })
        .collect())
}

impl Engine {
    pub async fn debt_entries(&self) -> ResultEngine<Vec<DebtEntry>> {
        Ok(debt_entries::Entity::find()
            .order_by_desc(debt_entries::Column::Id)
            .all(&self.database)
            .await?)
    }

    pub async fn debt_entry(&self, id: i32) -> ResultEngine<Option<DebtEntry>> {
        Ok(debt_entries::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    /// Debts with the balance they show for `month` (`YYYY-MM`).
    pub async fn get_debt_entries_with_monthly_reduction(
        &self,
        month: &str,
    ) -> ResultEngine<Vec<MonthlyDebt>> {
        let month = Month::parse(month)?;
        debts_for_month(&self.database, month).await
    }

    pub async fn create_debt_entry(&self, entry: NewDebt) -> ResultEngine<DebtEntry> {
        let name = normalize_required_name(&entry.name, "debt name")?;
        check_balances(entry.initial_amount, entry.current_balance)?;
        let currency = normalize_currency(entry.currency.as_deref())?;
        with_tx!(self, |db_tx| {
            if let Some(linked) = entry.linked_fixed_expense_id {
                require_fixed_expense(&db_tx, linked).await?;
            }
            let model = debt_entries::ActiveModel {
                name: ActiveValue::Set(name),
                initial_amount: ActiveValue::Set(entry.initial_amount),
                current_balance: ActiveValue::Set(entry.current_balance),
                currency: ActiveValue::Set(currency),
                linked_fixed_expense_id: ActiveValue::Set(entry.linked_fixed_expense_id),
                notes: ActiveValue::Set(normalize_optional_text(entry.notes.as_deref())),
                created_at: ActiveValue::Set(now_timestamp()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            Ok(model)
        })
    }

    pub async fn update_debt_entry(
        &self,
        id: i32,
        patch: DebtPatch,
    ) -> ResultEngine<Option<DebtEntry>> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "debt name"))
            .transpose()?;
        let currency = patch
            .currency
            .as_deref()
            .map(|currency| normalize_currency(Some(currency)))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = debt_entries::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let initial_amount = patch.initial_amount.unwrap_or(existing.initial_amount);
            let current_balance = patch.current_balance.unwrap_or(existing.current_balance);
            check_balances(initial_amount, current_balance)?;
            if let Some(linked) = patch.linked_fixed_expense_id {
                require_fixed_expense(&db_tx, linked).await?;
            }

            let mut model: debt_entries::ActiveModel = existing.into();
            model.initial_amount = ActiveValue::Set(initial_amount);
            model.current_balance = ActiveValue::Set(current_balance);
            if let Some(name) = name {
                model.name = ActiveValue::Set(name);
            }
            if let Some(currency) = currency {
                model.currency = ActiveValue::Set(currency);
            }
            if let Some(linked) = patch.linked_fixed_expense_id {
                model.linked_fixed_expense_id = ActiveValue::Set(Some(linked));
            }
            if let Some(notes) = patch.notes.as_deref() {
                model.notes = ActiveValue::Set(normalize_optional_text(Some(notes)));
            }
            Ok(Some(model.update(&db_tx).await?))
        })
    }

    pub async fn delete_debt_entry(&self, id: i32) -> ResultEngine<bool> {
        let deleted = debt_entries::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        Ok(deleted.rows_affected > 0)
    }
}

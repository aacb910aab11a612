use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
    prelude::*,
};
use serde::Deserialize;

use crate::{
    Contribution, EngineError, ResultEngine, SavingsAccount, contributions, savings_accounts,
    util::{
        format_date, normalize_currency, normalize_optional_text, normalize_required_name,
        now_timestamp, validate_amount,
    },
};

use super::{Engine, with_tx};

#[derive(Clone, Debug, Deserialize)]
pub struct NewSavingsAccount {
    pub name: String,
    pub base_balance: f64,
    pub currency: Option<String>,
    pub bank_institution: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SavingsAccountPatch {
    pub name: Option<String>,
    pub base_balance: Option<f64>,
    pub currency: Option<String>,
    pub bank_institution: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewContribution {
    pub savings_account_id: i32,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContributionPatch {
    pub savings_account_id: Option<i32>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub(crate) async fn require_account<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> ResultEngine<SavingsAccount> {
    savings_accounts::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::Validation(format!("Savings account with id {id} not found")))
}

/// `base_balance + SUM(contributions)` of one account.
pub(crate) async fn account_balance<C: ConnectionTrait>(
    db: &C,
    account: &SavingsAccount,
) -> ResultEngine<f64> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT TOTAL(amount) AS total FROM contributions WHERE savings_account_id = ?",
            vec![account.id.into()],
        ))
        .await?;
    let contributed: f64 = match row {
        Some(row) => row.try_get("", "total")?,
        None => 0.0,
    };
    Ok(account.base_balance + contributed)
}

impl Engine {
    pub async fn savings_accounts(&self) -> ResultEngine<Vec<SavingsAccount>> {
        Ok(savings_accounts::Entity::find()
            .order_by_desc(savings_accounts::Column::Id)
            .all(&self.database)
            .await?)
    }

    pub async fn savings_account(&self, id: i32) -> ResultEngine<Option<SavingsAccount>> {
        Ok(savings_accounts::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    /// Current balance of an account, `None` if it does not exist.
    pub async fn savings_account_balance(&self, id: i32) -> ResultEngine<Option<f64>> {
        let Some(account) = self.savings_account(id).await? else {
            return Ok(None);
        };
        Ok(Some(account_balance(&self.database, &account).await?))
    }

    pub async fn create_savings_account(
        &self,
        account: NewSavingsAccount,
    ) -> ResultEngine<SavingsAccount> {
        let name = normalize_required_name(&account.name, "savings account name")?;
        let base_balance = validate_amount(account.base_balance, "Savings account base_balance")?;
        let currency = normalize_currency(account.currency.as_deref())?;
        let model = savings_accounts::ActiveModel {
            name: ActiveValue::Set(name),
            base_balance: ActiveValue::Set(base_balance),
            currency: ActiveValue::Set(currency),
            bank_institution: ActiveValue::Set(normalize_optional_text(
                account.bank_institution.as_deref(),
            )),
            created_at: ActiveValue::Set(now_timestamp()),
            updated_at: ActiveValue::Set(None),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        Ok(model)
    }

    pub async fn update_savings_account(
        &self,
        id: i32,
        patch: SavingsAccountPatch,
    ) -> ResultEngine<Option<SavingsAccount>> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "savings account name"))
            .transpose()?;
        let base_balance = patch
            .base_balance
            .map(|balance| validate_amount(balance, "Savings account base_balance"))
            .transpose()?;
        let currency = patch
            .currency
            .as_deref()
            .map(|currency| normalize_currency(Some(currency)))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = savings_accounts::Entity::find_by_id(id).one(&db_tx).await?
            else {
                return Ok(None);
            };
            let mut model: savings_accounts::ActiveModel = existing.into();
            if let Some(name) = name {
                model.name = ActiveValue::Set(name);
            }
            if let Some(base_balance) = base_balance {
                model.base_balance = ActiveValue::Set(base_balance);
            }
            if let Some(currency) = currency {
                model.currency = ActiveValue::Set(currency);
            }
            if let Some(bank) = patch.bank_institution.as_deref() {
                model.bank_institution = ActiveValue::Set(normalize_optional_text(Some(bank)));
            }
            model.updated_at = ActiveValue::Set(Some(now_timestamp()));
            Ok(Some(model.update(&db_tx).await?))
        })
    }

    /// Contributions go with the account; linked projects lose their link.
    pub async fn delete_savings_account(&self, id: i32) -> ResultEngine<bool> {
        let deleted = savings_accounts::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        if deleted.rows_affected > 0 {
            tracing::info!("deleted savings account {id}");
        }
        Ok(deleted.rows_affected > 0)
    }

    /// Contributions of one account, newest first.
    pub async fn contributions(&self, savings_account_id: i32) -> ResultEngine<Vec<Contribution>> {
        Ok(contributions::Entity::find()
            .filter(contributions::Column::SavingsAccountId.eq(savings_account_id))
            .order_by_desc(contributions::Column::Date)
            .order_by_desc(contributions::Column::Id)
            .all(&self.database)
            .await?)
    }

    pub async fn contribution(&self, id: i32) -> ResultEngine<Option<Contribution>> {
        Ok(contributions::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    pub async fn create_contribution(
        &self,
        contribution: NewContribution,
    ) -> ResultEngine<Contribution> {
        let amount = validate_amount(contribution.amount, "Contribution amount")?;
        with_tx!(self, |db_tx| {
            require_account(&db_tx, contribution.savings_account_id).await?;
            let model = contributions::ActiveModel {
                savings_account_id: ActiveValue::Set(contribution.savings_account_id),
                amount: ActiveValue::Set(amount),
                date: ActiveValue::Set(format_date(contribution.date)),
                notes: ActiveValue::Set(normalize_optional_text(contribution.notes.as_deref())),
                created_at: ActiveValue::Set(now_timestamp()),
                updated_at: ActiveValue::Set(None),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            Ok(model)
        })
    }

    pub async fn update_contribution(
        &self,
        id: i32,
        patch: ContributionPatch,
    ) -> ResultEngine<Option<Contribution>> {
        let amount = patch
            .amount
            .map(|amount| validate_amount(amount, "Contribution amount"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = contributions::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let mut model: contributions::ActiveModel = existing.into();
            if let Some(account_id) = patch.savings_account_id {
                require_account(&db_tx, account_id).await?;
                model.savings_account_id = ActiveValue::Set(account_id);
            }
            if let Some(amount) = amount {
                model.amount = ActiveValue::Set(amount);
            }
            if let Some(date) = patch.date {
                model.date = ActiveValue::Set(format_date(date));
            }
            if let Some(notes) = patch.notes.as_deref() {
                model.notes = ActiveValue::Set(normalize_optional_text(Some(notes)));
            }
            model.updated_at = ActiveValue::Set(Some(now_timestamp()));
            Ok(Some(model.update(&db_tx).await?))
        })
    }

    pub async fn delete_contribution(&self, id: i32) -> ResultEngine<bool> {
        let deleted = contributions::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        Ok(deleted.rows_affected > 0)
    }
}

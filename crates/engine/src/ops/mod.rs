use chrono::{Local, NaiveDate};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, PrimaryKeyTrait};

use crate::{EngineError, Month, ResultEngine, preview::PreviewFetcher, util::unique_ids};

mod actual_expenses;
mod autocomplete;
mod balances;
mod debts;
mod fixed_expenses;
mod income;
mod projects;
mod savings;
mod settings;
mod wishlist_items;
mod wishlists;

pub use actual_expenses::{ActualExpensePatch, NewActualExpense};
pub use balances::{AvailableCash, BalanceEntry, NetWorth};
pub use debts::{DebtPatch, MonthlyDebt, NewDebt};
pub use fixed_expenses::{FixedExpensePatch, NewFixedExpense};
pub use income::{IncomeEntryPatch, NewIncomeEntry};
pub use projects::{NewProject, ProjectFilter, ProjectPatch, ProjectProgress};
pub use savings::{ContributionPatch, NewContribution, NewSavingsAccount, SavingsAccountPatch};
pub use wishlist_items::{NewWishlistItem, WishlistItemFilter, WishlistItemPatch};
pub use wishlists::{NewWishlist, WishlistPatch, WishlistSummary};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    today: fn() -> NaiveDate,
    preview: Option<PreviewFetcher>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The date the engine considers "now".
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    /// Recompute the synthetic balance of the previous calendar month when
    /// any of `touched` is that month. Other months are left alone.
    pub(crate) async fn rebalance_touched<C: ConnectionTrait>(
        &self,
        db: &C,
        touched: impl IntoIterator<Item = Month>,
    ) -> ResultEngine<()> {
        let previous = Month::previous_of(self.today());
        if touched.into_iter().any(|month| month == previous) {
            tracing::debug!("mutation touched previous month {previous}, rebalancing");
            balances::rebalance_month(db, previous).await?;
        }
        Ok(())
    }
}

/// Month of a stored ISO date, `None` for rows holding something else.
pub(crate) fn month_of(date: &str) -> Option<Month> {
    Month::of_date_str(date).ok()
}

/// Load the rows a merge consumes, in the order the ids were given.
///
/// Fails before anything is written when fewer than two distinct ids are
/// passed or any of them is missing.
pub(crate) async fn fetch_for_merge<E, C>(
    db: &C,
    ids: &[i32],
    label: &str,
) -> ResultEngine<(Vec<i32>, Vec<E::Model>)>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let ids = unique_ids(ids);
    if ids.len() < 2 {
        return Err(EngineError::Validation(
            "At least 2 entries are required to merge".to_string(),
        ));
    }
    let mut entries = Vec::with_capacity(ids.len());
    for id in &ids {
        let entry = E::find_by_id(*id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("{label} with id {id} not found")))?;
        entries.push(entry);
    }
    Ok((ids, entries))
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<fn() -> NaiveDate>,
    preview: Option<PreviewFetcher>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the wall clock. Defaults to the local date.
    pub fn clock(mut self, today: fn() -> NaiveDate) -> EngineBuilder {
        self.clock = Some(today);
        self
    }

    /// Enable URL previews for wishlist items.
    pub fn preview(mut self, fetcher: PreviewFetcher) -> EngineBuilder {
        self.preview = Some(fetcher);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            today: self.clock.unwrap_or(local_today),
            preview: self.preview,
        })
    }
}

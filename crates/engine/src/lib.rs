//! Entities, domain operations and derived values of the kakebo ledger.
//!
//! Every public operation lives on [`Engine`] and runs inside a single
//! database transaction. Monthly aggregates are computed on read; the only
//! persisted aggregate is the synthetic balance entry the engine upserts for
//! the previous calendar month whenever a mutation touches it.

pub use categories::ExpenseCategory;
pub use error::EngineError;
pub use month::Month;
pub use ops::{
    ActualExpensePatch, AvailableCash, BalanceEntry, ContributionPatch, DebtPatch, Engine,
    EngineBuilder, FixedExpensePatch, IncomeEntryPatch, MonthlyDebt, NetWorth, NewActualExpense,
    NewContribution, NewDebt, NewFixedExpense, NewIncomeEntry, NewProject, NewSavingsAccount,
    NewWishlist, NewWishlistItem, ProjectFilter, ProjectPatch, ProjectProgress,
    SavingsAccountPatch, WishlistItemFilter, WishlistItemPatch, WishlistPatch, WishlistSummary,
};
pub use preview::PreviewFetcher;
pub use projects::ProjectStatus;
pub use ranking::Direction;
pub use settings::{DEFAULT_SIZEABLE_ITEM_THRESHOLD, SIZEABLE_ITEM_THRESHOLD};

pub type IncomeEntry = income_entries::Model;
pub type FixedExpenseEntry = fixed_expense_entries::Model;
pub type ActualExpenseEntry = actual_expense_entries::Model;
pub type DebtEntry = debt_entries::Model;
pub type SavingsAccount = savings_accounts::Model;
pub type Contribution = contributions::Model;
pub type Project = projects::Model;
pub type Wishlist = wishlists::Model;
pub type WishlistItem = wishlist_items::Model;
pub type Setting = settings::Model;

mod actual_expense_entries;
mod autocomplete_suggestions;
mod categories;
mod contributions;
mod debt_entries;
mod error;
mod fixed_expense_entries;
mod income_entries;
mod month;
mod ops;
mod preview;
mod projects;
mod ranking;
mod savings_accounts;
mod settings;
mod util;
mod wishlist_items;
mod wishlists;

type ResultEngine<T> = Result<T, EngineError>;

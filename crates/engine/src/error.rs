//! The module contains the error the engine can throw.
//!
//! - [`Validation`] a caller-fixable domain rule was violated (negative
//!   amount, unknown category, missing referenced row, too few entries to
//!   merge, ...).
//! - [`InvalidMonth`] a month token is not `YYYY-MM` with a month in `01..=12`.
//! - [`KeyNotFound`] the row an operation has to act on does not exist.
//!
//! Plain lookups never raise for a missing id: they return `None`/`false`
//! and leave the translation to whoever sits at the boundary.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidMonth`]: EngineError::InvalidMonth
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidMonth(a), Self::InvalidMonth(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

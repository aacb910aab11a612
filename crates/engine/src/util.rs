//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize the
//! domain rules every operation applies to already-typed input.

use chrono::{NaiveDate, Utc};

use crate::{EngineError, ResultEngine};

pub(crate) const DEFAULT_CURRENCY: &str = "EUR";

/// Amounts are non-negative finite decimals.
pub(crate) fn validate_amount(value: f64, label: &str) -> ResultEngine<f64> {
    if !value.is_finite() {
        return Err(EngineError::Validation(format!(
            "{label} must be a finite number"
        )));
    }
    if value < 0.0 {
        return Err(EngineError::Validation(format!(
            "{label} cannot be negative"
        )));
    }
    Ok(value)
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Three ASCII letters, stored upper-case. Missing means `EUR`.
pub(crate) fn normalize_currency(value: Option<&str>) -> ResultEngine<String> {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_CURRENCY.to_string());
    };
    if raw.len() != 3 || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EngineError::Validation(format!(
            "unsupported currency: {raw}"
        )));
    }
    Ok(raw.to_ascii_uppercase())
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Same shape SQLite's `datetime('now')` stores.
pub(crate) fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Merge labels: non-empty items joined with `", "`, in the order given.
pub(crate) fn join_items<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Merges and bulk edits need a non-empty, duplicate-free id list.
pub(crate) fn unique_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

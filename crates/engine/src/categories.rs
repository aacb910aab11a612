use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Category of an actual expense.
///
/// Stored by its human label, which is why `EntertainmentAndLeisure` is
/// persisted with spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    #[serde(rename = "essential")]
    Essential,
    #[serde(rename = "comfort")]
    Comfort,
    #[serde(rename = "entertainment and leisure")]
    EntertainmentAndLeisure,
    #[serde(rename = "extras")]
    Extras,
    #[serde(rename = "unforeseen")]
    Unforeseen,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Essential,
        ExpenseCategory::Comfort,
        ExpenseCategory::EntertainmentAndLeisure,
        ExpenseCategory::Extras,
        ExpenseCategory::Unforeseen,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ExpenseCategory::Essential => "essential",
            ExpenseCategory::Comfort => "comfort",
            ExpenseCategory::EntertainmentAndLeisure => "entertainment and leisure",
            ExpenseCategory::Extras => "extras",
            ExpenseCategory::Unforeseen => "unforeseen",
        }
    }
}

impl core::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExpenseCategory {
    type Error = EngineError;

    /// Accepts the stored label and the snake_case spelling.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_lowercase().replace('_', " ");
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| EngineError::Validation(format!("unknown expense category: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_snake_case() {
        assert_eq!(
            ExpenseCategory::try_from("entertainment_and_leisure").unwrap(),
            ExpenseCategory::EntertainmentAndLeisure
        );
        assert_eq!(
            ExpenseCategory::try_from("Unforeseen").unwrap(),
            ExpenseCategory::Unforeseen
        );
        assert!(ExpenseCategory::try_from("luxury").is_err());
    }
}

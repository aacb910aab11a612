use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, Setting,
    settings::{self, DEFAULT_SIZEABLE_ITEM_THRESHOLD, SIZEABLE_ITEM_THRESHOLD},
    util::now_timestamp,
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn setting(&self, key: &str) -> ResultEngine<Option<Setting>> {
        Ok(settings::Entity::find()
            .filter(settings::Column::Key.eq(key))
            .one(&self.database)
            .await?)
    }

    /// Amount above which a wishlist item counts as sizeable.
    ///
    /// Falls back to [`DEFAULT_SIZEABLE_ITEM_THRESHOLD`] when the row is
    /// missing or does not hold a number.
    pub async fn sizeable_item_threshold(&self) -> ResultEngine<f64> {
        Ok(self
            .setting(SIZEABLE_ITEM_THRESHOLD)
            .await?
            .and_then(|setting| setting.value.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_SIZEABLE_ITEM_THRESHOLD))
    }

    /// Overwrite the value of an existing setting.
    pub async fn update_setting(&self, key: &str, value: &str) -> ResultEngine<Setting> {
        if key == SIZEABLE_ITEM_THRESHOLD {
            let threshold = value.trim().parse::<f64>().map_err(|_| {
                EngineError::Validation("Sizeable item threshold must be a valid number".to_string())
            })?;
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(EngineError::Validation(
                    "Sizeable item threshold must be >= 0".to_string(),
                ));
            }
        }
        with_tx!(self, |db_tx| {
            let existing = settings::Entity::find()
                .filter(settings::Column::Key.eq(key))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::Validation(format!("Setting with key '{key}' not found"))
                })?;
            let mut model: settings::ActiveModel = existing.into();
            model.value = ActiveValue::Set(value.to_string());
            model.updated_at = ActiveValue::Set(Some(now_timestamp()));
            Ok(model.update(&db_tx).await?)
        })
    }
}

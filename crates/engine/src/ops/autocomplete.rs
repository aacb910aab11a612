use sea_orm::{ConnectionTrait, Statement, TransactionTrait};

use crate::{ResultEngine, util::now_timestamp};

use super::{Engine, with_tx};

impl Engine {
    /// Suggestions for `entity.field`, most used first, then most recent.
    pub async fn autocomplete_suggestions(
        &self,
        entity: &str,
        field: &str,
        limit: u64,
    ) -> ResultEngine<Vec<String>> {
        let rows = self
            .database
            .query_all(Statement::from_sql_and_values(
                self.database.get_database_backend(),
                "SELECT value FROM autocomplete_suggestions \
                 WHERE entity = ? AND field = ? \
                 ORDER BY usage_count DESC, last_used_at DESC, value COLLATE NOCASE \
                 LIMIT ?",
                vec![entity.into(), field.into(), (limit as i64).into()],
            ))
            .await?;
        Ok(rows
            .iter()
            .map(|row| row.try_get("", "value"))
            .collect::<Result<_, _>>()?)
    }

    /// Record one more use of `value`. Blank values are ignored.
    pub async fn save_autocomplete_suggestion(
        &self,
        entity: &str,
        field: &str,
        value: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| record_suggestion(&db_tx, entity, field, value).await)
    }
}

pub(crate) async fn record_suggestion<C: ConnectionTrait>(
    db: &C,
    entity: &str,
    field: &str,
    value: &str,
) -> ResultEngine<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let now = now_timestamp();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "INSERT INTO autocomplete_suggestions \
         (field_path, value, usage_count, last_used_at, created_at, entity, field) \
         VALUES (?, ?, 1, ?, ?, ?, ?) \
         ON CONFLICT(field_path, value) DO UPDATE SET \
         usage_count = usage_count + 1, last_used_at = excluded.last_used_at",
        vec![
            format!("{entity}.{field}").into(),
            value.into(),
            now.clone().into(),
            now.into(),
            entity.into(),
            field.into(),
        ],
    ))
    .await?;
    Ok(())
}

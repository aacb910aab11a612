use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;

use crate::schema::has_column;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        if !has_column(db, "autocomplete_suggestions", "entity").await?
            || !has_column(db, "autocomplete_suggestions", "field").await?
        {
            return Ok(());
        }

        let backend = db.get_database_backend();
        let rows = db
            .query_all(Statement::from_string(
                backend,
                "SELECT DISTINCT field_path FROM autocomplete_suggestions \
                 WHERE field_path IS NOT NULL AND field_path != '' \
                   AND (entity IS NULL OR field IS NULL)"
                    .to_string(),
            ))
            .await?;

        for row in rows {
            let field_path: String = row.try_get("", "field_path")?;
            let (entity, field) = split_field_path(&field_path);
            db.execute(Statement::from_sql_and_values(
                backend,
                "UPDATE autocomplete_suggestions SET entity = ?, field = ? \
                 WHERE field_path = ? AND (entity IS NULL OR field IS NULL)",
                vec![entity.into(), field.into(), field_path.as_str().into()],
            ))
            .await?;
        }
        Ok(())
    }
}

/// `"income_entries.item"` → `("income_entries", "item")`; no dot means no field.
fn split_field_path(field_path: &str) -> (&str, &str) {
    field_path.split_once('.').unwrap_or((field_path, ""))
}

#[cfg(test)]
mod tests {
    use super::split_field_path;

    #[test]
    fn splits_on_first_dot_only() {
        assert_eq!(
            split_field_path("income_entries.item"),
            ("income_entries", "item")
        );
        assert_eq!(split_field_path("a.b.c"), ("a", "b.c"));
        assert_eq!(split_field_path("orphan"), ("orphan", ""));
    }
}

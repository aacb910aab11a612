use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;

use crate::schema::{has_column, table_exists};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seed suggestions for `<entity>.<field>` from the distinct values already
/// stored in that column, weighted by how often each occurs.
///
/// Nothing happens once any suggestion exists for the key, so a re-run (or a
/// user who already built up suggestions) never gets duplicates.
pub(crate) async fn seed_suggestions<C: ConnectionTrait>(
    db: &C,
    entity: &str,
    field: &str,
) -> Result<(), DbErr> {
    if !table_exists(db, "autocomplete_suggestions").await? || !table_exists(db, entity).await? {
        return Ok(());
    }

    let backend = db.get_database_backend();
    let field_path = format!("{entity}.{field}");
    let existing = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS count FROM autocomplete_suggestions WHERE field_path = ?",
            vec![field_path.clone().into()],
        ))
        .await?;
    let existing: i64 = match existing {
        Some(row) => row.try_get("", "count")?,
        None => 0,
    };
    if existing > 0 {
        return Ok(());
    }

    let with_entity = has_column(db, "autocomplete_suggestions", "entity").await?;
    let (columns, values) = if with_entity {
        ("entity, field, field_path", "?, ?, ?")
    } else {
        ("field_path", "?")
    };
    let mut params: Vec<sea_orm::Value> = Vec::new();
    if with_entity {
        params.push(entity.into());
        params.push(field.into());
    }
    params.push(field_path.into());

    db.execute(Statement::from_sql_and_values(
        backend,
        format!(
            "INSERT OR IGNORE INTO autocomplete_suggestions \
                ({columns}, value, usage_count, last_used_at, created_at) \
             SELECT {values}, TRIM({field}), COUNT(*), datetime('now'), datetime('now') \
             FROM {entity} \
             WHERE {field} IS NOT NULL AND TRIM({field}) != '' \
             GROUP BY TRIM({field})"
        ),
        params,
    ))
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        seed_suggestions(manager.get_connection(), "actual_expense_entries", "item").await
    }
}

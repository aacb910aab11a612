//! Catalog introspection and shared column shapes.
//!
//! Steps never trust a version counter: before touching the store they ask
//! `sqlite_master` / `pragma_table_info` what the current shape is and only
//! act when their result state does not hold yet.

use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;

/// Execute a single raw statement.
pub(crate) async fn exec<C: ConnectionTrait>(db: &C, sql: &str) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    db.execute(Statement::from_string(backend, sql.to_string()))
        .await?;
    Ok(())
}

async fn catalog_count<C: ConnectionTrait>(
    db: &C,
    kind: &str,
    name: &str,
) -> Result<i64, DbErr> {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = ? AND name = ?",
            vec![kind.into(), name.into()],
        ))
        .await?;
    match row {
        Some(row) => row.try_get("", "count"),
        None => Ok(0),
    }
}

pub(crate) async fn table_exists<C: ConnectionTrait>(db: &C, table: &str) -> Result<bool, DbErr> {
    Ok(catalog_count(db, "table", table).await? > 0)
}

pub(crate) async fn index_exists<C: ConnectionTrait>(db: &C, index: &str) -> Result<bool, DbErr> {
    Ok(catalog_count(db, "index", index).await? > 0)
}

/// Column names of `table`, in declaration order. Empty when the table is missing.
pub(crate) async fn column_names<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<Vec<String>, DbErr> {
    let backend = db.get_database_backend();
    let rows = db
        .query_all(Statement::from_sql_and_values(
            backend,
            "SELECT name FROM pragma_table_info(?) ORDER BY cid",
            vec![table.into()],
        ))
        .await?;
    rows.iter().map(|row| row.try_get("", "name")).collect()
}

pub(crate) async fn has_column<C: ConnectionTrait>(
    db: &C,
    table: &str,
    column: &str,
) -> Result<bool, DbErr> {
    Ok(column_names(db, table)
        .await?
        .iter()
        .any(|name| name == column))
}

/// The `CREATE TABLE` text SQLite stored for `table`.
pub(crate) async fn table_sql<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<Option<String>, DbErr> {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
            vec![table.into()],
        ))
        .await?;
    match row {
        Some(row) => row.try_get("", "sql"),
        None => Ok(None),
    }
}

pub(crate) async fn row_count<C: ConnectionTrait>(db: &C, table: &str) -> Result<i64, DbErr> {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS count FROM {table}"),
        ))
        .await?;
    match row {
        Some(row) => row.try_get("", "count"),
        None => Ok(0),
    }
}

/// Point the AUTOINCREMENT bookkeeping of `table` at its current `MAX(id)`.
///
/// A recreated table starts with no `sqlite_sequence` row, so ids freed by
/// deletions before the rebuild could otherwise be handed out again.
pub(crate) async fn repair_sequence<C: ConnectionTrait>(db: &C, table: &str) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT MAX(id) AS max_id FROM {table}"),
        ))
        .await?;
    let max_id: Option<i64> = match row {
        Some(row) => row.try_get("", "max_id")?,
        None => None,
    };
    let Some(max_id) = max_id else {
        return Ok(());
    };

    let updated = db
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE sqlite_sequence SET seq = ? WHERE name = ?",
            vec![max_id.into(), table.into()],
        ))
        .await?;
    if updated.rows_affected() == 0 {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO sqlite_sequence (name, seq) VALUES (?, ?)",
            vec![table.into(), max_id.into()],
        ))
        .await?;
    }
    Ok(())
}

pub(crate) fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

pub(crate) fn amount_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).double().not_null().to_owned()
}

pub(crate) fn currency_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).text().not_null().default("EUR").to_owned()
}

/// `TEXT NOT NULL` filled by SQLite with the insertion time.
pub(crate) fn created_at_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .text()
        .not_null()
        .extra("DEFAULT (datetime('now'))")
        .to_owned()
}

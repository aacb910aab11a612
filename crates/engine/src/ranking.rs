//! Dense 1-based rankings kept in an integer column.
//!
//! Used for the global project order and for the order of items inside one
//! wishlist. Every operation leaves each rank in `1..=n` held by exactly one
//! row. Rows are moved one at a time, in an order that never lands on an
//! occupied slot, and the moving row is parked on `PARKING_OFFSET + id` first,
//! so a UNIQUE index on the column never sees a transient duplicate.

use sea_orm::{ConnectionTrait, Statement, Value};

use crate::{EngineError, ResultEngine, util::now_timestamp};

const PARKING_OFFSET: i32 = 1_000_000;

/// Which neighbour to trade places with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards rank 1.
    Up,
    Down,
}

pub(crate) struct Ranking {
    table: &'static str,
    column: &'static str,
    scope: Option<(&'static str, i32)>,
}

impl Ranking {
    pub(crate) fn projects() -> Self {
        Self {
            table: "projects",
            column: "priority_order",
            scope: None,
        }
    }

    pub(crate) fn wishlist(wishlist_id: i32) -> Self {
        Self {
            table: "wishlist_items",
            column: "priority",
            scope: Some(("wishlist_id", wishlist_id)),
        }
    }

    fn scope_filter(&self) -> (String, Vec<Value>) {
        match self.scope {
            Some((column, id)) => (format!(" AND {column} = ?"), vec![id.into()]),
            None => (String::new(), Vec::new()),
        }
    }

    /// `(id, rank)` in rank order; unranked rows come last, oldest first.
    async fn ranked<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<Vec<(i32, Option<i32>)>> {
        let (filter, values) = self.scope_filter();
        let rows = db
            .query_all(Statement::from_sql_and_values(
                db.get_database_backend(),
                format!(
                    "SELECT id, {col} AS rank FROM {table} WHERE 1 = 1{filter} \
                     ORDER BY {col} IS NULL, {col}, id",
                    col = self.column,
                    table = self.table,
                ),
                values,
            ))
            .await?;
        rows.iter()
            .map(|row| Ok((row.try_get("", "id")?, row.try_get("", "rank")?)))
            .collect()
    }

    pub(crate) async fn len<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<i32> {
        Ok(self.ranked(db).await?.len() as i32)
    }

    pub(crate) async fn max<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<i32> {
        let (filter, values) = self.scope_filter();
        let row = db
            .query_one(Statement::from_sql_and_values(
                db.get_database_backend(),
                format!(
                    "SELECT COALESCE(MAX({col}), 0) AS max_rank FROM {table} WHERE 1 = 1{filter}",
                    col = self.column,
                    table = self.table,
                ),
                values,
            ))
            .await?;
        match row {
            Some(row) => Ok(row.try_get("", "max_rank")?),
            None => Ok(0),
        }
    }

    async fn set<C: ConnectionTrait>(&self, db: &C, id: i32, rank: i32) -> ResultEngine<()> {
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            format!(
                "UPDATE {table} SET {col} = ?, updated_at = ? WHERE id = ?",
                col = self.column,
                table = self.table,
            ),
            vec![rank.into(), now_timestamp().into(), id.into()],
        ))
        .await?;
        Ok(())
    }

    async fn in_range<C: ConnectionTrait>(
        &self,
        db: &C,
        low: i32,
        high: i32,
        exclude: Option<i32>,
    ) -> ResultEngine<Vec<(i32, i32)>> {
        Ok(self
            .ranked(db)
            .await?
            .into_iter()
            .filter_map(|(id, rank)| rank.map(|rank| (id, rank)))
            .filter(|(id, rank)| *rank >= low && *rank <= high && Some(*id) != exclude)
            .collect())
    }

    /// Free `rank` for a row about to be inserted there.
    pub(crate) async fn open_slot<C: ConnectionTrait>(&self, db: &C, rank: i32) -> ResultEngine<()> {
        let mut rows = self.in_range(db, rank, i32::MAX, None).await?;
        rows.sort_by_key(|(_, rank)| std::cmp::Reverse(*rank));
        for (id, current) in rows {
            self.set(db, id, current + 1).await?;
        }
        Ok(())
    }

    /// Move `id` from `from` to `to`, sliding the rows in between by one.
    pub(crate) async fn move_to<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i32,
        from: i32,
        to: i32,
    ) -> ResultEngine<()> {
        if from == to {
            return Ok(());
        }
        self.set(db, id, PARKING_OFFSET + id).await?;

        if to < from {
            let mut rows = self.in_range(db, to, from - 1, Some(id)).await?;
            rows.sort_by_key(|(_, rank)| std::cmp::Reverse(*rank));
            for (other, rank) in rows {
                self.set(db, other, rank + 1).await?;
            }
        } else {
            let mut rows = self.in_range(db, from + 1, to, Some(id)).await?;
            rows.sort_by_key(|(_, rank)| *rank);
            for (other, rank) in rows {
                self.set(db, other, rank - 1).await?;
            }
        }

        self.set(db, id, to).await
    }

    /// Trade places with the row ranked right above or below `current`.
    pub(crate) async fn swap<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i32,
        current: i32,
        direction: Direction,
    ) -> ResultEngine<i32> {
        let target = match direction {
            Direction::Up => current - 1,
            Direction::Down => current + 1,
        };
        if target < 1 {
            return Err(EngineError::Validation(
                "item is already at the highest priority".to_string(),
            ));
        }
        let neighbour = self
            .in_range(db, target, target, Some(id))
            .await?
            .first()
            .map(|(other, _)| *other)
            .ok_or_else(|| {
                EngineError::Validation(format!("no item found with priority {target}"))
            })?;

        self.set(db, id, PARKING_OFFSET + id).await?;
        self.set(db, neighbour, current).await?;
        self.set(db, id, target).await?;
        Ok(target)
    }

    /// Renumber to `1..=n`, keeping the current order.
    pub(crate) async fn compact<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<()> {
        for (idx, (id, rank)) in self.ranked(db).await?.into_iter().enumerate() {
            let wanted = idx as i32 + 1;
            if rank != Some(wanted) {
                self.set(db, id, wanted).await?;
            }
        }
        Ok(())
    }
}

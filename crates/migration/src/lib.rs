//! Schema migrations for the kakebo store.
//!
//! There is no version table: [`Migrator::run`] replays every step, in the
//! order given by the numeric prefix of its name, on each startup. Each step
//! inspects the live schema and does nothing when its result already holds,
//! so the sequence is safe against fresh, partially upgraded and current
//! stores alike.
//!
//! The whole run shares one transaction and commits only after the last step.
//! SQLite applies DDL transactionally, so a failing step leaves the store as
//! it was. A store without transactional DDL would keep whatever DDL ran
//! before the failure; that is a known limitation of the approach, not
//! something the runner tries to repair.

pub use sea_orm_migration::prelude::*;

use sea_orm::{DatabaseConnection, TransactionTrait};
use sea_orm_migration::MigrationName;

mod m001_initial_tables;
mod m002_add_currency_to_income;
mod m003_add_month_year_to_fixed_expenses;
mod m004_create_legacy_projects_tables;
mod m005_remove_legacy_projects_unique;
mod m006_drop_legacy_projects_tables;
mod m007_create_savings_accounts_and_contributions;
mod m008_create_projects;
mod m009_add_priority_order_to_projects;
mod m010_create_autocomplete_suggestions;
mod m011_populate_expense_autocomplete;
mod m012_add_entity_and_field_to_autocomplete;
mod m013_populate_autocomplete_entity_field;
mod m014_populate_income_autocomplete;
mod m016_create_settings;
mod m017_create_wishlists;
mod m018_create_wishlist_items;
mod m019_remove_custom_order_from_wishlist_items;
mod m020_rename_initial_balance_to_base_balance;
mod schema;

pub struct Migrator;

impl Migrator {
    /// All known steps. Order here does not matter, [`Migrator::plan`] sorts them.
    pub fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m001_initial_tables::Migration),
            Box::new(m002_add_currency_to_income::Migration),
            Box::new(m003_add_month_year_to_fixed_expenses::Migration),
            Box::new(m004_create_legacy_projects_tables::Migration),
            Box::new(m005_remove_legacy_projects_unique::Migration),
            Box::new(m006_drop_legacy_projects_tables::Migration),
            Box::new(m007_create_savings_accounts_and_contributions::Migration),
            Box::new(m008_create_projects::Migration),
            Box::new(m009_add_priority_order_to_projects::Migration),
            Box::new(m010_create_autocomplete_suggestions::Migration),
            Box::new(m011_populate_expense_autocomplete::Migration),
            Box::new(m012_add_entity_and_field_to_autocomplete::Migration),
            Box::new(m013_populate_autocomplete_entity_field::Migration),
            Box::new(m014_populate_income_autocomplete::Migration),
            Box::new(m016_create_settings::Migration),
            Box::new(m017_create_wishlists::Migration),
            Box::new(m018_create_wishlist_items::Migration),
            Box::new(m019_remove_custom_order_from_wishlist_items::Migration),
            Box::new(m020_rename_initial_balance_to_base_balance::Migration),
        ]
    }

    /// The steps in execution order.
    ///
    /// Fails when a step name carries no numeric prefix or two steps share one.
    pub fn plan() -> Result<Vec<Box<dyn MigrationTrait>>, DbErr> {
        let mut steps = Self::migrations()
            .into_iter()
            .map(|step| Ok((step_number(step.name())?, step)))
            .collect::<Result<Vec<_>, DbErr>>()?;
        steps.sort_by_key(|(number, _)| *number);

        for pair in steps.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(DbErr::Migration(format!(
                    "migrations {} and {} share the number {}",
                    pair[0].1.name(),
                    pair[1].1.name(),
                    pair[0].0
                )));
            }
        }

        Ok(steps.into_iter().map(|(_, step)| step).collect())
    }

    /// Bring `db` to the current schema. Returns the names of the steps run.
    pub async fn run(db: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
        let steps = Self::plan()?;
        let txn = db.begin().await?;

        let mut applied = Vec::with_capacity(steps.len());
        for step in &steps {
            let name = step.name().to_string();
            tracing::debug!(migration = %name, "running migration step");
            let manager = SchemaManager::new(&txn);
            if let Err(err) = step.up(&manager).await {
                tracing::error!(migration = %name, "migration step failed: {err}");
                // Dropping `txn` rolls the whole run back.
                return Err(DbErr::Migration(format!("{name}: {err}")));
            }
            applied.push(name);
        }

        txn.commit().await?;
        tracing::info!(steps = applied.len(), "schema is up to date");
        Ok(applied)
    }
}

/// `"m007_create_savings_accounts"` → `7`.
fn step_number(name: &str) -> Result<u32, DbErr> {
    name.strip_prefix('m')
        .and_then(|rest| rest.split('_').next())
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            DbErr::Migration(format!("migration {name} has no numeric prefix"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_number_reads_prefix() {
        assert_eq!(step_number("m001_initial_tables").unwrap(), 1);
        assert_eq!(step_number("m020_rename").unwrap(), 20);
        assert!(step_number("initial_tables").is_err());
        assert!(step_number("m_initial").is_err());
    }

    #[test]
    fn plan_is_strictly_ascending() {
        let names: Vec<u32> = Migrator::plan()
            .unwrap()
            .iter()
            .map(|step| step_number(step.name()).unwrap())
            .collect();
        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(names.first(), Some(&1));
        assert!(!names.contains(&15));
    }
}

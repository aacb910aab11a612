use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A recurring expense, booked once per calendar month.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "fixed_expense_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub amount: f64,
    pub item: String,
    pub currency: String,
    /// 1..=12
    pub month: i32,
    pub year: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::debt_entries::Entity")]
    DebtEntries,
}

impl Related<super::debt_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DebtEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

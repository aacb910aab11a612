use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A debt. `current_balance` is what is still owed as last recorded; the
/// per-month view subtracts the linked fixed expense without persisting it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "debt_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub initial_amount: f64,
    pub current_balance: f64,
    pub currency: String,
    pub linked_fixed_expense_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fixed_expense_entries::Entity",
        from = "Column::LinkedFixedExpenseId",
        to = "super::fixed_expense_entries::Column::Id",
        on_delete = "SetNull"
    )]
    FixedExpenseEntries,
}

impl Related<super::fixed_expense_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FixedExpenseEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

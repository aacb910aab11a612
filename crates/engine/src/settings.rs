use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Known key: the amount above which a purchase counts as sizeable.
pub const SIZEABLE_ITEM_THRESHOLD: &str = "sizeable_item_threshold";

/// Fallback when the threshold row is missing or unreadable.
pub const DEFAULT_SIZEABLE_ITEM_THRESHOLD: f64 = 100.0;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub key: String,
    pub value: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

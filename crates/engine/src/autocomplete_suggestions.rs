use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "autocomplete_suggestions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// `<entity>.<field>`
    pub field_path: String,
    pub value: String,
    pub usage_count: i32,
    pub last_used_at: String,
    pub created_at: String,
    pub entity: Option<String>,
    pub field: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

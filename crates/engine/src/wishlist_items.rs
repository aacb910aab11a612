use sea_orm::entity::prelude::*;
use serde::Serialize;

/// An item on a wishlist. `priority` is its dense 1-based rank inside the
/// wishlist.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "wishlist_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub wishlist_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub currency: String,
    pub priority: Option<i32>,
    pub notes: Option<String>,
    pub url: Option<String>,
    pub url_preview_image: Option<String>,
    pub uploaded_image: Option<String>,
    pub purchased: bool,
    pub purchased_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wishlists::Entity",
        from = "Column::WishlistId",
        to = "super::wishlists::Column::Id",
        on_delete = "Cascade"
    )]
    Wishlists,
}

impl Related<super::wishlists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wishlists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

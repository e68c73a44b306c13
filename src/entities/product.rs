use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: Uuid,
    pub material_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub sale_price: Option<Decimal>,
    /// Kilograms
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub weight: Decimal,
    /// Centimetres
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub width: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub height: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub depth: Decimal,
    pub assembly_required: bool,
    pub weather_resistant: bool,
    #[sea_orm(unique)]
    pub sku: String,
    pub is_active: bool,
    pub featured: bool,
    pub warranty_months: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Price a shopper pays today: the sale price when one is set.
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn is_on_sale(&self) -> bool {
        self.sale_price.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::commerce::category::Entity",
        from = "Column::CategoryId",
        to = "super::commerce::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::commerce::material::Entity",
        from = "Column::MaterialId",
        to = "super::commerce::material::Column::Id"
    )]
    Material,
}

impl Related<super::commerce::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::commerce::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

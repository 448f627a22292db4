use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One concrete value of a category attribute (e.g. "Red" under Color)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attribute_values")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub value: String,
    pub category_attribute_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category_attribute::Entity",
        from = "Column::CategoryAttributeId",
        to = "super::category_attribute::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    CategoryAttribute,
    #[sea_orm(has_many = "super::product_attribute_value::Entity")]
    ProductAttributeValues,
}

impl Related<super::category_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryAttribute.def()
    }
}

impl Related<super::product_attribute_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductAttributeValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

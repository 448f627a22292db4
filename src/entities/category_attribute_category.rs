use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join row between a category and one of its attributes
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_attribute_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_attribute_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::category_attribute::Entity",
        from = "Column::CategoryAttributeId",
        to = "super::category_attribute::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    CategoryAttribute,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::category_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryAttribute.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

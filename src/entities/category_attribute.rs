use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named facet (e.g. Color) shared by one or more categories
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_attributes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attribute_value::Entity")]
    AttributeValues,
    #[sea_orm(has_many = "super::category_attribute_category::Entity")]
    CategoryAttributeCategories,
}

impl Related<super::attribute_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttributeValues.def()
    }
}

impl Related<super::category_attribute_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryAttributeCategories.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::category_attribute_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::category_attribute_category::Relation::CategoryAttribute.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

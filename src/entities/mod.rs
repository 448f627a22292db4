//! Database entities for the catalog schema.

pub mod attribute_value;
pub mod category;
pub mod category_attribute;
pub mod category_attribute_category;
pub mod product;
pub mod product_attribute_value;

pub mod prelude {
    pub use super::attribute_value::Entity as AttributeValue;
    pub use super::category::Entity as Category;
    pub use super::category_attribute::Entity as CategoryAttribute;
    pub use super::category_attribute_category::Entity as CategoryAttributeCategory;
    pub use super::product::Entity as Product;
    pub use super::product_attribute_value::Entity as ProductAttributeValue;
}

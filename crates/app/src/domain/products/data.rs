//! Products Data

use rust_decimal::Decimal;

use crate::domain::products::records::{ProductUuid, SizeClass};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub item_number: String,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: u64,
    /// Shipping weight in pounds.
    pub weight: Decimal,
    pub size_class: SizeClass,
}

//! Product Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Coarse packaging size used for shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored size class is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown size class `{0}`")]
pub struct UnknownSizeClass(pub String);

impl FromStr for SizeClass {
    type Err = UnknownSizeClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(UnknownSizeClass(other.to_string())),
        }
    }
}

/// Product Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub item_number: String,
    pub name: String,
    pub price: u64,
    pub weight: Decimal,
    pub size_class: SizeClass,
    pub created_at: Timestamp,
}

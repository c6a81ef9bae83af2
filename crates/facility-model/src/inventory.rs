//! Inventory items and their derived stock status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{require, ValidationError};

/// Stock level derived from quantity and reorder level. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    pub fn from_levels(quantity: u32, reorder_level: u32) -> Self {
        if quantity == 0 {
            Self::OutOfStock
        } else if quantity <= reorder_level {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::LowStock => "Low Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supply or equipment line, from `inventory`.
///
/// Documents written by older clients may still carry a `status` field; it is
/// ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub reorder_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryItem {
    pub fn status(&self) -> StockStatus {
        StockStatus::from_levels(self.quantity, self.reorder_level)
    }

    /// At or below the reorder level, including empty lines.
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    /// Quantity left after using `amount` units.
    pub fn consume(&self, amount: u32) -> Result<u32, ValidationError> {
        if amount == 0 {
            return Err(ValidationError::NonPositiveQuantity);
        }
        if amount > self.quantity {
            return Err(ValidationError::InsufficientStock {
                available: self.quantity,
            });
        }
        Ok(self.quantity - amount)
    }

    /// Quantity after receiving `amount` units.
    pub fn restock(&self, amount: u32) -> Result<u32, ValidationError> {
        if amount == 0 {
            return Err(ValidationError::NonPositiveQuantity);
        }
        Ok(self.quantity.saturating_add(amount))
    }
}

/// Input of the add-item form. Negative levels are rejected before reaching
/// this type, so the form parses into `i64` first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub reorder_level: u32,
}

impl NewInventoryItem {
    const MESSAGE: &'static str = "Please fill out all fields with valid values.";

    /// Build from raw form numbers.
    pub fn from_form(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: i64,
        reorder_level: i64,
    ) -> Result<Self, ValidationError> {
        let quantity = u32::try_from(quantity).map_err(|_| ValidationError::Negative("Quantity"))?;
        let reorder_level =
            u32::try_from(reorder_level).map_err(|_| ValidationError::Negative("Reorder level"))?;
        let item = Self {
            name: name.into(),
            category: category.into(),
            quantity,
            reorder_level,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, Self::MESSAGE)?;
        require(&self.category, Self::MESSAGE)
    }
}

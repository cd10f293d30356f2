//! Catalog resource types
//!
//! Resources are immutable catalog entries: created at process start,
//! never mutated afterwards.

use crate::{HaggleError, Price, ResourceId, Result};
use serde::{Deserialize, Serialize};

/// A sellable catalog resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Catalog identifier
    pub id: ResourceId,
    /// Display name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// File format of the underlying artifact (e.g. "pdf", "csv")
    pub format: String,
    /// Approximate size, display only (e.g. "2.4 MB")
    pub size: String,
    /// Advertised list price
    pub list_price: Price,
    /// Minimum acceptable price; offers below this draw a counter-offer
    pub floor_price: Price,
    /// Category tag for catalog browsing
    pub category: String,
}

impl Resource {
    /// Validate the pricing invariant: the floor may never exceed the list price.
    pub fn validate(&self) -> Result<()> {
        if self.floor_price > self.list_price {
            return Err(HaggleError::invalid_input(
                "floor_price",
                format!(
                    "floor {} exceeds list {} for resource {}",
                    self.floor_price, self.list_price, self.id
                ),
            ));
        }
        Ok(())
    }
}

//! Price arithmetic for the negotiation handshake
//!
//! Prices are whole currency units carried as `u64`. The only conversion
//! the handshake ever performs is the scale to minor units (cents) at the
//! gateway boundary; all negotiation math stays in whole units.

use crate::{HaggleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A price in whole currency units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub u64);

impl Price {
    /// Create a price from whole units
    pub fn new(units: u64) -> Self {
        Self(units)
    }

    /// Zero price
    pub fn zero() -> Self {
        Self(0)
    }

    /// Raw whole units
    pub fn units(&self) -> u64 {
        self.0
    }

    /// Scale to minor units (cents) for the payment gateway
    pub fn minor_units(&self) -> Result<u64> {
        self.0.checked_mul(100).ok_or(HaggleError::PriceOverflow)
    }

    /// Midpoint between this price and another, floored.
    ///
    /// Used for counter-offers: `midpoint(offer, list)` moves the
    /// negotiation halfway toward the list price each round. Offers arrive
    /// off the wire, so the sum is checked rather than assumed to fit.
    pub fn midpoint(self, other: Price) -> Result<Price> {
        self.0
            .checked_add(other.0)
            .map(|sum| Price(sum / 2))
            .ok_or(HaggleError::PriceOverflow)
    }

    /// Percentage of this price (floored integer division).
    ///
    /// Checked for the same reason as [`Price::midpoint`]: the buyer takes
    /// percentages of list prices quoted by the peer.
    pub fn percent(self, pct: u64) -> Result<Price> {
        self.0
            .checked_mul(pct)
            .map(|scaled| Price(scaled / 100))
            .ok_or(HaggleError::PriceOverflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl From<u64> for Price {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units() {
        assert_eq!(Price::new(10).minor_units().unwrap(), 1000);
        assert_eq!(Price::zero().minor_units().unwrap(), 0);
    }

    #[test]
    fn test_minor_units_overflow() {
        assert!(Price::new(u64::MAX).minor_units().is_err());
    }

    #[test]
    fn test_midpoint_floors() {
        assert_eq!(Price::new(5).midpoint(Price::new(10)).unwrap(), Price::new(7));
        assert_eq!(Price::new(6).midpoint(Price::new(10)).unwrap(), Price::new(8));
    }

    #[test]
    fn test_midpoint_overflow_is_error() {
        let err = Price::new(u64::MAX).midpoint(Price::new(2)).unwrap_err();
        assert_eq!(err.error_code(), "PRICE_OVERFLOW");
    }

    #[test]
    fn test_percent_floors() {
        assert_eq!(Price::new(13).percent(80).unwrap(), Price::new(10));
    }

    #[test]
    fn test_percent_overflow_is_error() {
        let err = Price::new(u64::MAX).percent(80).unwrap_err();
        assert_eq!(err.error_code(), "PRICE_OVERFLOW");
    }
}

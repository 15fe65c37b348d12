//! Lot models
//!
//! A lot is a traceable batch of one inventory item with its own unit cost
//! and expiration date. Lots are created by receipt movements and are only
//! ever exhausted, never deleted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A batch of a single inventory item held in one depot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub depot_id: Uuid,
    pub label: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub expiration_date: Option<NaiveDate>,
    /// Units per package, used for display and order rounding
    pub package_size: Decimal,
    /// Inherited from the inventory group
    pub tracking_expiration: bool,
    /// Inherited from the inventory group
    pub tracking_consumption: bool,
}

impl Lot {
    /// Days remaining before expiration as of a reference date
    ///
    /// `None` when the item does not track expiration or carries no date.
    pub fn lifetime_days(&self, as_of: NaiveDate) -> Option<i64> {
        if !self.tracking_expiration {
            return None;
        }
        self.expiration_date.map(|d| (d - as_of).num_days())
    }
}

/// Expiration-risk snapshot derived for one lot
///
/// Produced by the depletion simulation in the backend; serialized field
/// names follow the report layer's row contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotIndicators {
    pub lot_id: Uuid,
    pub inventory_id: Uuid,
    pub depot_id: Uuid,
    pub label: String,
    pub quantity: Decimal,
    /// Blanked when the item does not track expiration
    pub expiration_date: Option<NaiveDate>,
    #[serde(rename = "lifetime_lot")]
    pub lifetime_days: Option<i64>,
    pub exhausted: bool,
    pub expired: bool,
    pub near_expiration: bool,
    pub at_risk_of_stock_out: bool,
    pub usable_quantity_remaining: Decimal,
    #[serde(rename = "S_RISK_QUANTITY")]
    pub risk_quantity: Decimal,
    #[serde(rename = "S_RISK")]
    pub risk_days: i64,
    /// Date the depletion simulation starts consuming this lot
    pub min_stock_date: Option<NaiveDate>,
    /// Date the lot runs out, by consumption or expiration
    pub max_stock_date: Option<NaiveDate>,
}

impl LotIndicators {
    /// Baseline snapshot before the depletion simulation fills in risk data
    pub fn new(lot: &Lot, as_of: NaiveDate) -> Self {
        let exhausted = lot.quantity <= Decimal::ZERO;
        let expiration_date = if lot.tracking_expiration {
            lot.expiration_date
        } else {
            None
        };
        let expired = !exhausted
            && lot.tracking_expiration
            && expiration_date.map_or(false, |d| d < as_of);

        Self {
            lot_id: lot.id,
            inventory_id: lot.inventory_id,
            depot_id: lot.depot_id,
            label: lot.label.clone(),
            quantity: lot.quantity,
            expiration_date,
            lifetime_days: lot.lifetime_days(as_of),
            exhausted,
            expired,
            near_expiration: false,
            at_risk_of_stock_out: false,
            usable_quantity_remaining: Decimal::ZERO,
            risk_quantity: Decimal::ZERO,
            risk_days: 0,
            min_stock_date: None,
            max_stock_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(quantity: i64, expiration: Option<NaiveDate>, tracking_expiration: bool) -> Lot {
        Lot {
            id: Uuid::new_v4(),
            inventory_id: Uuid::new_v4(),
            depot_id: Uuid::new_v4(),
            label: "LOT-A".to_string(),
            quantity: Decimal::from(quantity),
            unit_cost: Decimal::ONE,
            expiration_date: expiration,
            package_size: Decimal::ONE,
            tracking_expiration,
            tracking_consumption: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lifetime_days() {
        let l = lot(10, Some(date(2024, 3, 11)), true);
        assert_eq!(l.lifetime_days(date(2024, 3, 1)), Some(10));
    }

    #[test]
    fn test_lifetime_hidden_without_tracking() {
        let l = lot(10, Some(date(2024, 3, 11)), false);
        assert_eq!(l.lifetime_days(date(2024, 3, 1)), None);
    }

    #[test]
    fn test_baseline_exhausted_lot() {
        let snapshot = LotIndicators::new(&lot(0, Some(date(2020, 1, 1)), true), date(2024, 1, 1));
        assert!(snapshot.exhausted);
        // An exhausted lot is never reported as expired
        assert!(!snapshot.expired);
    }

    #[test]
    fn test_baseline_expired_lot() {
        let snapshot = LotIndicators::new(&lot(5, Some(date(2023, 12, 1)), true), date(2024, 1, 1));
        assert!(!snapshot.exhausted);
        assert!(snapshot.expired);
    }

    #[test]
    fn test_expiration_blanked_when_not_tracked() {
        let snapshot = LotIndicators::new(&lot(5, Some(date(2023, 12, 1)), false), date(2024, 1, 1));
        assert_eq!(snapshot.expiration_date, None);
        assert!(!snapshot.expired);
    }
}

//! Inventory reorder indicator models
//!
//! Threshold formulas and status classification for one (depot, inventory)
//! pair. The heavier per-request pipeline lives in the backend services;
//! the pure classification rules live here so every consumer agrees on them.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock level classification for a (depot, inventory) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    StockOut,
    UnusedStock,
    SecurityReached,
    MinimumReached,
    InStock,
    OverMaximum,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::StockOut => "stock_out",
            StockStatus::UnusedStock => "unused_stock",
            StockStatus::SecurityReached => "security_reached",
            StockStatus::MinimumReached => "minimum_reached",
            StockStatus::InStock => "in_stock",
            StockStatus::OverMaximum => "over_maximum",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reorder thresholds for one (depot, inventory) pair, in stock units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockThresholds {
    #[serde(rename = "S_SEC")]
    pub security_stock: Decimal,
    #[serde(rename = "S_MIN")]
    pub minimum_stock: Decimal,
    #[serde(rename = "S_MAX")]
    pub maximum_stock: Decimal,
}

/// Round a threshold for presentation (two decimal places, half away from zero)
pub fn round_threshold(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the security/minimum/maximum stock thresholds
///
/// * security stock covers consumption over the reorder lead time,
/// * minimum stock scales it by the configured security multiplier,
/// * maximum stock adds one purchase interval of consumption on top.
pub fn compute_stock_thresholds(
    avg_consumption: Decimal,
    delay_months: Decimal,
    min_months_security_stock: Decimal,
    purchase_interval: Decimal,
) -> StockThresholds {
    let security_stock = avg_consumption * delay_months;
    let minimum_stock = security_stock * min_months_security_stock;
    let maximum_stock = avg_consumption * purchase_interval + minimum_stock;

    StockThresholds {
        security_stock: round_threshold(security_stock),
        minimum_stock: round_threshold(minimum_stock),
        maximum_stock: round_threshold(maximum_stock),
    }
}

/// Classify the stock level of a pair against its thresholds
///
/// The branches form a strict partition, evaluated in priority order with
/// inclusive upper boundaries (a quantity exactly at a threshold takes the
/// lower status).
pub fn classify_stock_status(
    usable_quantity: Decimal,
    avg_consumption: Decimal,
    thresholds: &StockThresholds,
) -> StockStatus {
    if usable_quantity <= Decimal::ZERO {
        StockStatus::StockOut
    } else if avg_consumption <= Decimal::ZERO {
        StockStatus::UnusedStock
    } else if usable_quantity <= thresholds.security_stock {
        StockStatus::SecurityReached
    } else if usable_quantity <= thresholds.minimum_stock {
        StockStatus::MinimumReached
    } else if usable_quantity <= thresholds.maximum_stock {
        StockStatus::InStock
    } else {
        StockStatus::OverMaximum
    }
}

/// Reorder indicator snapshot for one (depot, inventory) pair
///
/// Recomputed on every query; serialized field names follow the report
/// layer's row contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryIndicators {
    pub depot_id: Uuid,
    pub inventory_id: Uuid,
    pub quantity: Decimal,
    pub avg_consumption: Decimal,
    #[serde(flatten)]
    pub thresholds: StockThresholds,
    /// `None` when the pair has no recorded consumption
    #[serde(rename = "S_MONTH")]
    pub months_of_stock: Option<i64>,
    #[serde(rename = "S_Q")]
    pub refill_quantity: i64,
    pub status: StockStatus,
    #[serde(rename = "NO_CONSUMPTION")]
    pub no_consumption: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_snapshot_serializes_report_row_keys() {
        let snapshot = InventoryIndicators {
            depot_id: Uuid::new_v4(),
            inventory_id: Uuid::new_v4(),
            quantity: Decimal::from(150),
            avg_consumption: Decimal::from(100),
            thresholds: StockThresholds {
                security_stock: Decimal::from(200),
                minimum_stock: Decimal::from(400),
                maximum_stock: Decimal::from(700),
            },
            months_of_stock: Some(1),
            refill_quantity: 550,
            status: StockStatus::SecurityReached,
            no_consumption: false,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        for key in ["S_SEC", "S_MIN", "S_MAX", "S_MONTH", "S_Q", "NO_CONSUMPTION"] {
            assert!(json.get(key).is_some(), "missing report key {}", key);
        }
        assert_eq!(json["status"], "security_reached");
    }

    #[test]
    fn test_status_round_trips_through_json() {
        for status in [
            StockStatus::StockOut,
            StockStatus::UnusedStock,
            StockStatus::SecurityReached,
            StockStatus::MinimumReached,
            StockStatus::InStock,
            StockStatus::OverMaximum,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: StockStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }
}

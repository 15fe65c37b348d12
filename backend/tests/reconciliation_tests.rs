//! Lost stock reconciliation tests
//!
//! Tests for inter-depot transfer pairing including:
//! - Matched, partial and missing receipts
//! - Destination resolution
//! - Monetary loss totals

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use hsm_backend::services::reconciliation::{reconcile_transfers, total_value_lost};
use shared::{FluxType, StockMovement};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn transfer(
    flux: FluxType,
    document_id: Uuid,
    lot_id: Uuid,
    depot_id: Uuid,
    entity_id: Option<Uuid>,
    quantity: &str,
    unit_cost: &str,
) -> StockMovement {
    StockMovement {
        id: Uuid::new_v4(),
        document_id,
        depot_id,
        lot_id,
        inventory_id: Uuid::new_v4(),
        entity_id,
        flux,
        is_exit: flux == FluxType::ToOtherDepot,
        quantity: dec(quantity),
        unit_cost: dec(unit_cost),
        date: date(2024, 1, 15),
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test a fully received transfer produces no discrepancy
    #[test]
    fn test_matched_transfer_no_row() {
        let doc = Uuid::new_v4();
        let lot = Uuid::new_v4();
        let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

        let movements = vec![
            transfer(FluxType::ToOtherDepot, doc, lot, sender, Some(receiver), "10", "5"),
            transfer(FluxType::FromOtherDepot, doc, lot, receiver, Some(sender), "10", "5"),
        ];

        assert!(reconcile_transfers(&movements).is_empty());
    }

    /// Test a partial receipt surfaces the missing quantity
    #[test]
    fn test_partial_receipt() {
        let doc = Uuid::new_v4();
        let lot = Uuid::new_v4();
        let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

        let movements = vec![
            transfer(FluxType::ToOtherDepot, doc, lot, sender, Some(receiver), "10", "5"),
            transfer(FluxType::FromOtherDepot, doc, lot, receiver, Some(sender), "7", "5"),
        ];

        let rows = reconcile_transfers(&movements);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_sent, dec("10"));
        assert_eq!(rows[0].quantity_received, dec("7"));
        assert_eq!(rows[0].quantity_difference, dec("3"));
        assert_eq!(rows[0].value_lost, dec("15"));
        assert_eq!(rows[0].source_depot_id, sender);
        assert_eq!(rows[0].destination_depot_id, Some(receiver));
    }

    /// Test a shipment with no receipt is reported fully lost
    #[test]
    fn test_missing_receipt_fully_lost() {
        let doc = Uuid::new_v4();
        let lot = Uuid::new_v4();
        let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

        let movements = vec![transfer(
            FluxType::ToOtherDepot,
            doc,
            lot,
            sender,
            Some(receiver),
            "10",
            "5",
        )];

        let rows = reconcile_transfers(&movements);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_received, Decimal::ZERO);
        assert_eq!(rows[0].quantity_difference, dec("10"));
        assert_eq!(rows[0].value_lost, dec("50"));
        // Destination falls back to the outbound counterparty
        assert_eq!(rows[0].destination_depot_id, Some(receiver));
    }

    /// Test multiple partial receipts for one shipment are summed
    #[test]
    fn test_split_receipts_summed() {
        let doc = Uuid::new_v4();
        let lot = Uuid::new_v4();
        let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

        let movements = vec![
            transfer(FluxType::ToOtherDepot, doc, lot, sender, Some(receiver), "10", "5"),
            transfer(FluxType::FromOtherDepot, doc, lot, receiver, Some(sender), "4", "5"),
            transfer(FluxType::FromOtherDepot, doc, lot, receiver, Some(sender), "6", "5"),
        ];

        assert!(reconcile_transfers(&movements).is_empty());
    }

    /// Test an over-receipt is surfaced as a negative difference
    #[test]
    fn test_over_receipt_surfaced() {
        let doc = Uuid::new_v4();
        let lot = Uuid::new_v4();
        let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

        let movements = vec![
            transfer(FluxType::ToOtherDepot, doc, lot, sender, Some(receiver), "10", "5"),
            transfer(FluxType::FromOtherDepot, doc, lot, receiver, Some(sender), "12", "5"),
        ];

        let rows = reconcile_transfers(&movements);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_difference, dec("-2"));
        assert_eq!(rows[0].value_lost, dec("-10"));
    }

    /// Test receipts only match on the same document and lot
    #[test]
    fn test_receipt_matching_is_per_document_and_lot() {
        let lot = Uuid::new_v4();
        let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

        let movements = vec![
            transfer(FluxType::ToOtherDepot, Uuid::new_v4(), lot, sender, Some(receiver), "10", "5"),
            // Same lot, different document: not a receipt for the shipment above
            transfer(FluxType::FromOtherDepot, Uuid::new_v4(), lot, receiver, Some(sender), "10", "5"),
        ];

        let rows = reconcile_transfers(&movements);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_difference, dec("10"));
    }

    /// Test non-transfer fluxes are ignored
    #[test]
    fn test_non_transfer_fluxes_ignored() {
        let doc = Uuid::new_v4();
        let lot = Uuid::new_v4();
        let depot = Uuid::new_v4();

        let movements = vec![
            transfer(FluxType::ToPatient, doc, lot, depot, None, "10", "5"),
            transfer(FluxType::FromPurchase, doc, lot, depot, None, "10", "5"),
        ];

        assert!(reconcile_transfers(&movements).is_empty());
    }

    /// Test the monetary loss total
    #[test]
    fn test_total_value_lost() {
        let lot = Uuid::new_v4();
        let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

        let movements = vec![
            transfer(FluxType::ToOtherDepot, Uuid::new_v4(), lot, sender, Some(receiver), "10", "5"),
            transfer(FluxType::ToOtherDepot, Uuid::new_v4(), lot, sender, Some(receiver), "4", "2.5"),
        ];

        let rows = reconcile_transfers(&movements);
        // 10 * 5 + 4 * 2.5
        assert_eq!(total_value_lost(&rows), dec("60"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for transfer quantities
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The difference is always sent minus received
        #[test]
        fn prop_difference_is_sent_minus_received(
            sent in quantity_strategy(),
            received in quantity_strategy()
        ) {
            let doc = Uuid::new_v4();
            let lot = Uuid::new_v4();
            let (sender, receiver) = (Uuid::new_v4(), Uuid::new_v4());

            let movements = vec![
                transfer(FluxType::ToOtherDepot, doc, lot, sender, Some(receiver), &sent.to_string(), "5"),
                transfer(FluxType::FromOtherDepot, doc, lot, receiver, Some(sender), &received.to_string(), "5"),
            ];

            let rows = reconcile_transfers(&movements);
            if sent == received {
                prop_assert!(rows.is_empty());
            } else {
                prop_assert_eq!(rows.len(), 1);
                prop_assert_eq!(rows[0].quantity_difference, sent - received);
            }
        }

        /// The monetary loss is the difference times the unit cost
        #[test]
        fn prop_value_lost_matches_difference(
            sent in quantity_strategy(),
            cost in (1i64..=10000i64).prop_map(|n| Decimal::new(n, 2))
        ) {
            let doc = Uuid::new_v4();
            let lot = Uuid::new_v4();
            let sender = Uuid::new_v4();

            let movements = vec![transfer(
                FluxType::ToOtherDepot, doc, lot, sender, None, &sent.to_string(), &cost.to_string(),
            )];

            let rows = reconcile_transfers(&movements);
            prop_assert_eq!(rows.len(), 1);
            prop_assert_eq!(rows[0].value_lost, rows[0].quantity_difference * cost);
        }
    }
}

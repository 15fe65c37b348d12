//! Lot expiration-risk service
//!
//! Simulates sequential consumption across the lots of one
//! (depot, inventory) pair, soonest-expiring first, to flag lots that will
//! expire before they can be consumed and to quantify the quantities at
//! risk.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::consumption::{ConsumptionService, DepotInventoryPair};
use crate::services::indicators::{compute_inventory_indicators, IndicatorInput};
use shared::{Lot, LotIndicators, StockSettings, StockStatus};

/// Lot service producing expiration-risk snapshots
#[derive(Clone)]
pub struct LotService {
    db: PgPool,
    consumption: ConsumptionService,
}

/// Average month length used to convert monthly consumption to a daily rate
fn days_per_month() -> Decimal {
    Decimal::new(305, 1)
}

fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn offset_date(as_of: NaiveDate, days: Decimal) -> Option<NaiveDate> {
    round_quantity(days)
        .to_i64()
        .and_then(|d| as_of.checked_add_signed(Duration::days(d)))
}

/// Simulate depletion across the lots of one (depot, inventory) pair
///
/// Lots are consumed in ascending order of remaining lifetime, ties broken
/// by ascending quantity. A running accumulator tracks the days already
/// covered by earlier lots, so each lot's projected stock-out date accounts
/// for everything consumed before it.
pub fn compute_lot_indicators(
    lots: &[Lot],
    avg_consumption: Decimal,
    pair_status: StockStatus,
    as_of: NaiveDate,
) -> Vec<LotIndicators> {
    let mut ordered: Vec<&Lot> = lots.iter().collect();
    ordered.sort_by_key(|lot| (lot.lifetime_days(as_of).unwrap_or(i64::MAX), lot.quantity));

    let daily_consumption = avg_consumption / days_per_month();
    let at_risk_status = matches!(
        pair_status,
        StockStatus::MinimumReached | StockStatus::SecurityReached
    );

    let mut consumed_days = Decimal::ZERO;
    let mut snapshots = Vec::with_capacity(ordered.len());

    for lot in ordered {
        let mut snapshot = LotIndicators::new(lot, as_of);
        snapshot.at_risk_of_stock_out = !snapshot.expired && at_risk_status;

        let simulate = lot.tracking_consumption
            && !snapshot.exhausted
            && !snapshot.expired
            && daily_consumption > Decimal::ZERO;

        if simulate {
            let days_to_deplete = lot.quantity / daily_consumption;
            let depleted_at = consumed_days + days_to_deplete;
            let lifetime = snapshot.lifetime_days.map(Decimal::from);

            snapshot.near_expiration = lifetime.map_or(false, |lt| lt <= depleted_at);

            // Usable until expiration or stock-out, whichever comes first
            let window_end = lifetime.map_or(depleted_at, |lt| lt.min(depleted_at));
            let usable_days = (window_end - consumed_days).max(Decimal::ZERO);
            let usable_quantity = (usable_days * daily_consumption).min(lot.quantity);

            let mut risk_quantity = round_quantity(lot.quantity - usable_quantity);
            if risk_quantity < daily_consumption {
                // Below one day of consumption is rounding noise
                risk_quantity = Decimal::ZERO;
            }
            let risk_days = if risk_quantity > Decimal::ZERO {
                round_quantity(risk_quantity / daily_consumption)
                    .to_i64()
                    .unwrap_or(0)
            } else {
                0
            };

            snapshot.usable_quantity_remaining = usable_quantity;
            snapshot.risk_quantity = risk_quantity;
            snapshot.risk_days = risk_days;
            snapshot.min_stock_date = offset_date(as_of, consumed_days);
            snapshot.max_stock_date = offset_date(as_of, consumed_days + usable_days);

            consumed_days += usable_days;
        }

        snapshots.push(snapshot);
    }

    snapshots
}

/// Row for the lot fetch query, lot fields plus reorder parameters
#[derive(Debug, sqlx::FromRow)]
struct LotRow {
    id: Uuid,
    inventory_id: Uuid,
    depot_id: Uuid,
    label: String,
    quantity: Decimal,
    unit_cost: Decimal,
    expiration_date: Option<NaiveDate>,
    package_size: Decimal,
    tracking_expiration: bool,
    tracking_consumption: bool,
    delay: Decimal,
    min_months_security_stock: Decimal,
    purchase_interval: Decimal,
    depot_purchase_interval: Decimal,
}

impl LotRow {
    fn to_lot(&self) -> Lot {
        Lot {
            id: self.id,
            inventory_id: self.inventory_id,
            depot_id: self.depot_id,
            label: self.label.clone(),
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            expiration_date: self.expiration_date,
            package_size: self.package_size,
            tracking_expiration: self.tracking_expiration,
            tracking_consumption: self.tracking_consumption,
        }
    }
}

impl LotService {
    /// Create a new LotService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            consumption: ConsumptionService::new(db.clone()),
            db,
        }
    }

    async fn fetch_lots(&self, depot_id: Option<Uuid>) -> AppResult<Vec<LotRow>> {
        let rows = sqlx::query_as::<_, LotRow>(
            r#"
            SELECT l.id, l.inventory_id, l.depot_id, l.label, l.quantity, l.unit_cost,
                   l.expiration_date, l.package_size,
                   i.tracking_expiration, i.tracking_consumption,
                   i.delay, i.min_months_security_stock, i.purchase_interval,
                   d.default_purchase_interval AS depot_purchase_interval
            FROM lots l
            JOIN inventory_items i ON i.id = l.inventory_id
            JOIN depots d ON d.id = l.depot_id
            WHERE ($1::uuid IS NULL OR l.depot_id = $1)
            ORDER BY l.depot_id, l.inventory_id, l.expiration_date
            "#,
        )
        .bind(depot_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Expiration-risk snapshots for every lot, optionally restricted to
    /// one depot
    ///
    /// Lots are grouped per (depot, inventory) pair; each group shares one
    /// consumption estimate and one pair-level status.
    pub async fn lot_indicators(
        &self,
        depot_id: Option<Uuid>,
        as_of: NaiveDate,
        settings: &StockSettings,
    ) -> AppResult<Vec<LotIndicators>> {
        let rows = self.fetch_lots(depot_id).await?;

        let mut groups: BTreeMap<DepotInventoryPair, Vec<LotRow>> = BTreeMap::new();
        for row in rows {
            groups
                .entry((row.depot_id, row.inventory_id))
                .or_default()
                .push(row);
        }

        let pairs: Vec<DepotInventoryPair> = groups.keys().copied().collect();
        let amc = self.consumption.amc_table(&pairs, as_of, settings).await?;

        let mut snapshots = Vec::new();
        for ((depot_id, inventory_id), group) in &groups {
            let avg = amc.avg_consumption(*depot_id, *inventory_id);
            let lots: Vec<Lot> = group.iter().map(LotRow::to_lot).collect();

            let input = pair_indicator_input(*depot_id, *inventory_id, group, &lots, as_of);
            let indicators = compute_inventory_indicators(&input, avg, settings);

            snapshots.extend(compute_lot_indicators(&lots, avg, indicators.status, as_of));
        }

        tracing::debug!(
            lots = snapshots.len(),
            pairs = groups.len(),
            "computed lot expiration-risk snapshots"
        );
        Ok(snapshots)
    }
}

/// Aggregate one lot group into pair-level indicator inputs
fn pair_indicator_input(
    depot_id: Uuid,
    inventory_id: Uuid,
    group: &[LotRow],
    lots: &[Lot],
    as_of: NaiveDate,
) -> IndicatorInput {
    let quantity: Decimal = lots.iter().map(|l| l.quantity).sum();
    let expired_quantity: Decimal = lots
        .iter()
        .filter(|l| {
            l.quantity > Decimal::ZERO
                && l.tracking_expiration
                && l.expiration_date.map_or(false, |d| d < as_of)
        })
        .map(|l| l.quantity)
        .sum();

    // Reorder parameters are item/depot level, identical across the group
    let params = &group[0];

    IndicatorInput {
        depot_id,
        inventory_id,
        quantity,
        expired_quantity,
        delay: params.delay,
        min_months_security_stock: params.min_months_security_stock,
        purchase_interval: params.purchase_interval,
        depot_purchase_interval: params.depot_purchase_interval,
    }
}

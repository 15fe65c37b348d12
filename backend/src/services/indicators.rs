//! Inventory reorder indicator service
//!
//! Computes, per (depot, inventory) pair, the security/minimum/maximum
//! stock thresholds, months of stock remaining, refill quantity and a
//! status classification.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::consumption::{ConsumptionService, DepotInventoryPair};
use shared::{classify_stock_status, compute_stock_thresholds, InventoryIndicators, StockSettings};

/// Indicator service for reorder thresholds and stock status
#[derive(Clone)]
pub struct IndicatorService {
    db: PgPool,
    consumption: ConsumptionService,
}

/// Numeric inputs for one (depot, inventory) pair
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorInput {
    pub depot_id: Uuid,
    pub inventory_id: Uuid,
    /// Quantity on hand across all lots
    pub quantity: Decimal,
    /// Expired-but-unconsumed quantity across all lots
    pub expired_quantity: Decimal,
    /// Item reorder lead time, in months
    pub delay: Decimal,
    /// Security stock multiplier
    pub min_months_security_stock: Decimal,
    /// Item-specific purchase interval, in months
    pub purchase_interval: Decimal,
    /// Depot-wide purchase interval, in months
    pub depot_purchase_interval: Decimal,
}

/// Row for the stock level aggregation query
#[derive(Debug, sqlx::FromRow)]
struct StockLevelRow {
    depot_id: Uuid,
    inventory_id: Uuid,
    quantity: Decimal,
    expired_quantity: Decimal,
    delay: Decimal,
    min_months_security_stock: Decimal,
    purchase_interval: Decimal,
    depot_purchase_interval: Decimal,
}

impl From<&StockLevelRow> for IndicatorInput {
    fn from(row: &StockLevelRow) -> Self {
        IndicatorInput {
            depot_id: row.depot_id,
            inventory_id: row.inventory_id,
            quantity: row.quantity,
            expired_quantity: row.expired_quantity,
            delay: row.delay,
            min_months_security_stock: row.min_months_security_stock,
            purchase_interval: row.purchase_interval,
            depot_purchase_interval: row.depot_purchase_interval,
        }
    }
}

/// Compute the indicator snapshot for one (depot, inventory) pair
///
/// The lead time is floored by the enterprise minimum delay and the
/// purchase interval is the maximum of the enterprise, depot and item
/// settings. The usable quantity excludes expired stock when the
/// enterprise enables expired-stock exclusion.
pub fn compute_inventory_indicators(
    input: &IndicatorInput,
    avg_consumption: Decimal,
    settings: &StockSettings,
) -> InventoryIndicators {
    let delay = input.delay.max(settings.min_delay);
    let purchase_interval = settings
        .default_purchase_interval
        .max(input.depot_purchase_interval)
        .max(input.purchase_interval);

    let thresholds = compute_stock_thresholds(
        avg_consumption,
        delay,
        input.min_months_security_stock,
        purchase_interval,
    );

    let usable_quantity = if settings.enable_expired_stock_out {
        input.quantity - input.expired_quantity
    } else {
        input.quantity
    };

    // Months of stock is undefined without consumption, not zero
    let months_of_stock = if avg_consumption > Decimal::ZERO {
        (input.quantity / avg_consumption).floor().to_i64()
    } else {
        None
    };

    let refill_quantity = (thresholds.maximum_stock - input.quantity)
        .max(Decimal::ZERO)
        .trunc()
        .to_i64()
        .unwrap_or(0);

    let status = classify_stock_status(usable_quantity, avg_consumption, &thresholds);

    InventoryIndicators {
        depot_id: input.depot_id,
        inventory_id: input.inventory_id,
        quantity: input.quantity,
        avg_consumption,
        thresholds,
        months_of_stock,
        refill_quantity,
        status,
        no_consumption: avg_consumption <= Decimal::ZERO,
    }
}

impl IndicatorService {
    /// Create a new IndicatorService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            consumption: ConsumptionService::new(db.clone()),
            db,
        }
    }

    /// Current stock levels with item and depot reorder parameters
    async fn fetch_stock_levels(
        &self,
        depot_id: Option<Uuid>,
        as_of: NaiveDate,
    ) -> AppResult<Vec<StockLevelRow>> {
        let rows = sqlx::query_as::<_, StockLevelRow>(
            r#"
            SELECT l.depot_id, l.inventory_id,
                   COALESCE(SUM(l.quantity), 0) AS quantity,
                   COALESCE(SUM(CASE WHEN i.tracking_expiration AND l.expiration_date < $2
                                     THEN l.quantity ELSE 0 END), 0) AS expired_quantity,
                   i.delay, i.min_months_security_stock, i.purchase_interval,
                   d.default_purchase_interval AS depot_purchase_interval
            FROM lots l
            JOIN inventory_items i ON i.id = l.inventory_id
            JOIN depots d ON d.id = l.depot_id
            WHERE ($1::uuid IS NULL OR l.depot_id = $1)
            GROUP BY l.depot_id, l.inventory_id, i.delay, i.min_months_security_stock,
                     i.purchase_interval, d.default_purchase_interval
            ORDER BY l.depot_id, l.inventory_id
            "#,
        )
        .bind(depot_id)
        .bind(as_of)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Indicator snapshots for every stocked pair, optionally restricted
    /// to one depot
    pub async fn inventory_indicators(
        &self,
        depot_id: Option<Uuid>,
        as_of: NaiveDate,
        settings: &StockSettings,
    ) -> AppResult<Vec<InventoryIndicators>> {
        let rows = self.fetch_stock_levels(depot_id, as_of).await?;
        let pairs: Vec<DepotInventoryPair> = rows
            .iter()
            .map(|r| (r.depot_id, r.inventory_id))
            .collect();
        let amc = self.consumption.amc_table(&pairs, as_of, settings).await?;

        let indicators = rows
            .iter()
            .map(|row| {
                let input = IndicatorInput::from(row);
                let avg = amc.avg_consumption(row.depot_id, row.inventory_id);
                compute_inventory_indicators(&input, avg, settings)
            })
            .collect::<Vec<_>>();

        tracing::debug!(pairs = indicators.len(), "computed inventory indicators");
        Ok(indicators)
    }
}

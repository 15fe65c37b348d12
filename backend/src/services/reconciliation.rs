//! Inter-depot transfer reconciliation service
//!
//! Pairs outbound transfer movements with their inbound receipts by
//! (document, lot) and surfaces quantity discrepancies as lost stock.
//! A transfer with no receipt yet is reported as fully lost; the row keeps
//! the document and depot identifiers so callers can still separate
//! in-transit shipments.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_date_range, DateRange, FluxType, StockMovement};

/// Lost stock service reconciling inter-depot transfers
#[derive(Clone)]
pub struct LostStockService {
    db: PgPool,
}

/// Which side of the transfer relationship the caller is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferRole {
    Source,
    Destination,
}

impl TransferRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferRole::Source => "source",
            TransferRole::Destination => "destination",
        }
    }
}

/// One unresolved transfer discrepancy
#[derive(Debug, Clone, Serialize)]
pub struct LostStockRow {
    pub document_id: Uuid,
    pub lot_id: Uuid,
    pub inventory_id: Uuid,
    pub source_depot_id: Uuid,
    /// Receiving depot; taken from the receipt when present, otherwise
    /// from the outbound movement's counterparty
    pub destination_depot_id: Option<Uuid>,
    pub date: NaiveDate,
    pub unit_cost: Decimal,
    pub quantity_sent: Decimal,
    pub quantity_received: Decimal,
    pub quantity_difference: Decimal,
    pub value_lost: Decimal,
}

/// Pair transfer-out movements with transfer-in receipts and keep the
/// discrepancies
///
/// Receipts are matched on (document, lot); multiple partial receipts for
/// one shipment are summed. A missing receipt counts as zero received.
pub fn reconcile_transfers(movements: &[StockMovement]) -> Vec<LostStockRow> {
    let mut receipts: HashMap<(Uuid, Uuid), (Decimal, Uuid)> = HashMap::new();
    for movement in movements {
        if movement.flux == FluxType::FromOtherDepot {
            let slot = receipts
                .entry((movement.document_id, movement.lot_id))
                .or_insert((Decimal::ZERO, movement.depot_id));
            slot.0 += movement.quantity;
        }
    }

    let mut rows = Vec::new();
    for movement in movements {
        if movement.flux != FluxType::ToOtherDepot {
            continue;
        }

        let receipt = receipts.get(&(movement.document_id, movement.lot_id));
        let quantity_received = receipt.map(|(qty, _)| *qty).unwrap_or(Decimal::ZERO);
        let quantity_difference = movement.quantity - quantity_received;
        if quantity_difference.is_zero() {
            continue;
        }

        let destination_depot_id = receipt.map(|(_, depot)| *depot).or(movement.entity_id);

        rows.push(LostStockRow {
            document_id: movement.document_id,
            lot_id: movement.lot_id,
            inventory_id: movement.inventory_id,
            source_depot_id: movement.depot_id,
            destination_depot_id,
            date: movement.date,
            unit_cost: movement.unit_cost,
            quantity_sent: movement.quantity,
            quantity_received,
            quantity_difference,
            value_lost: quantity_difference * movement.unit_cost,
        });
    }

    rows
}

/// Total monetary loss across discrepancy rows
pub fn total_value_lost(rows: &[LostStockRow]) -> Decimal {
    rows.iter().map(|r| r.value_lost).sum()
}

/// Row for the transfer movement query
#[derive(Debug, sqlx::FromRow)]
struct TransferRow {
    id: Uuid,
    document_id: Uuid,
    depot_id: Uuid,
    /// Depot row matched by the join; `None` is a data integrity violation
    depot_ref: Option<Uuid>,
    lot_id: Uuid,
    inventory_id: Uuid,
    entity_id: Option<Uuid>,
    flux_id: i16,
    is_exit: bool,
    quantity: Decimal,
    unit_cost: Decimal,
    date: NaiveDate,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl LostStockService {
    /// Create a new LostStockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_transfers(
        &self,
        depot_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, TransferRow>(
            r#"
            SELECT m.id, m.document_id, m.depot_id, d.id AS depot_ref,
                   l.id AS lot_id, l.inventory_id,
                   m.entity_id, m.flux_id, m.is_exit, m.quantity, m.unit_cost,
                   m.date, m.created_at
            FROM stock_movements m
            JOIN lots l ON l.id = m.lot_id
            LEFT JOIN depots d ON d.id = m.depot_id
            WHERE m.flux_id IN ($2, $3)
              AND m.date BETWEEN $4 AND $5
              AND (m.depot_id = $1 OR m.entity_id = $1)
            ORDER BY m.date, m.created_at
            "#,
        )
        .bind(depot_id)
        .bind(FluxType::FromOtherDepot as i16)
        .bind(FluxType::ToOtherDepot as i16)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                if row.depot_ref.is_none() {
                    return Err(AppError::UnknownDepot {
                        movement_id: row.id,
                        depot_id: row.depot_id,
                    });
                }
                let flux = FluxType::try_from(row.flux_id).map_err(|e| AppError::UnknownFlux {
                    movement_id: row.id,
                    flux_id: e.0,
                })?;
                Ok(StockMovement {
                    id: row.id,
                    document_id: row.document_id,
                    depot_id: row.depot_id,
                    lot_id: row.lot_id,
                    inventory_id: row.inventory_id,
                    entity_id: row.entity_id,
                    flux,
                    is_exit: row.is_exit,
                    quantity: row.quantity,
                    unit_cost: row.unit_cost,
                    date: row.date,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    /// Discrepancies on transfers touching one depot over a date range
    ///
    /// The role selects the side of the relationship: `Source` keeps rows
    /// the depot shipped, `Destination` keeps rows shipped to it.
    pub async fn lost_stock(
        &self,
        depot_id: Uuid,
        role: TransferRole,
        range: DateRange,
    ) -> AppResult<Vec<LostStockRow>> {
        validate_date_range(&range).map_err(|msg| {
            AppError::validation("range", msg, "La période demandée est invalide")
        })?;

        let movements = self.fetch_transfers(depot_id, range).await?;
        let rows = reconcile_transfers(&movements);

        let filtered: Vec<LostStockRow> = rows
            .into_iter()
            .filter(|row| match role {
                TransferRole::Source => row.source_depot_id == depot_id,
                TransferRole::Destination => row.destination_depot_id == Some(depot_id),
            })
            .collect();

        tracing::debug!(
            %depot_id,
            role = role.as_str(),
            discrepancies = filtered.len(),
            "reconciled inter-depot transfers"
        );
        Ok(filtered)
    }
}

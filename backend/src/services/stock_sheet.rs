//! Weighted-average-cost stock sheet service
//!
//! Replays the chronological movements of one (depot, inventory) pair
//! against an opening balance, recalculating the weighted average unit
//! cost on every entry. No rounding is applied mid-calculation; display
//! rounding belongs to the report layer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_date_range, validate_exchange_rate, DateRange, FluxType, StockMovement};

/// Stock sheet service building WAC ledgers
#[derive(Clone)]
pub struct StockSheetService {
    db: PgPool,
}

/// Opening stock state of a ledger
///
/// The unit cost is expected in the ledger's target currency; the exchange
/// rate only restates movement costs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpeningBalance {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// One quantity/unit-cost/value triplet of a ledger line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSide {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub value: Decimal,
}

/// One movement replayed into the ledger
#[derive(Debug, Clone, Serialize)]
pub struct LedgerLine {
    pub document_id: Uuid,
    pub date: NaiveDate,
    pub flux: FluxType,
    pub entry: Option<LedgerSide>,
    pub exit: Option<LedgerSide>,
    /// Running stock state after this movement
    pub stock: LedgerSide,
}

/// Full WAC ledger for one (depot, inventory) pair
#[derive(Debug, Clone, Serialize)]
pub struct StockSheet {
    pub opening: LedgerSide,
    pub lines: Vec<LedgerLine>,
    pub total_entry_quantity: Decimal,
    pub total_entry_value: Decimal,
    pub total_exit_quantity: Decimal,
    pub total_exit_value: Decimal,
    /// Final stock state
    pub stock: LedgerSide,
}

/// Replay movements against an opening balance into a WAC ledger
///
/// Exits leave the unit cost untouched and clamp a negative stock value to
/// zero. Entries recompute the weighted average; when the running quantity
/// was negative before the entry, the movement's own quantity serves as
/// the divisor so the negative base does not pollute the average.
pub fn build_stock_sheet(
    opening: OpeningBalance,
    movements: &[StockMovement],
    exchange_rate: Decimal,
) -> StockSheet {
    let mut stock_quantity = opening.quantity;
    let mut stock_unit_cost = opening.unit_cost;
    let mut stock_value = stock_quantity * stock_unit_cost;

    let opening_side = LedgerSide {
        quantity: stock_quantity,
        unit_cost: stock_unit_cost,
        value: stock_value,
    };

    let mut lines = Vec::with_capacity(movements.len());
    let mut total_entry_quantity = Decimal::ZERO;
    let mut total_entry_value = Decimal::ZERO;
    let mut total_exit_quantity = Decimal::ZERO;
    let mut total_exit_value = Decimal::ZERO;

    for movement in movements {
        let unit_cost = movement.unit_cost * exchange_rate;
        let mut entry = None;
        let mut exit = None;

        if movement.is_exit {
            let exit_value = movement.quantity * stock_unit_cost;
            stock_quantity -= movement.quantity;
            stock_value = stock_quantity * stock_unit_cost;
            if stock_value < Decimal::ZERO {
                stock_value = Decimal::ZERO;
            }

            total_exit_quantity += movement.quantity;
            total_exit_value += exit_value;
            exit = Some(LedgerSide {
                quantity: movement.quantity,
                unit_cost: stock_unit_cost,
                value: exit_value,
            });
        } else {
            let previous_quantity = stock_quantity;
            let incoming_value = movement.quantity * unit_cost;
            let base_value = stock_value.max(Decimal::ZERO);

            stock_quantity += movement.quantity;
            stock_value = base_value + incoming_value;

            let divisor = if previous_quantity < Decimal::ZERO {
                movement.quantity
            } else {
                stock_quantity
            };
            if divisor > Decimal::ZERO {
                stock_unit_cost = stock_value / divisor;
            }

            total_entry_quantity += movement.quantity;
            total_entry_value += incoming_value;
            entry = Some(LedgerSide {
                quantity: movement.quantity,
                unit_cost,
                value: incoming_value,
            });
        }

        lines.push(LedgerLine {
            document_id: movement.document_id,
            date: movement.date,
            flux: movement.flux,
            entry,
            exit,
            stock: LedgerSide {
                quantity: stock_quantity,
                unit_cost: stock_unit_cost,
                value: stock_value,
            },
        });
    }

    StockSheet {
        opening: opening_side,
        lines,
        total_entry_quantity,
        total_entry_value,
        total_exit_quantity,
        total_exit_value,
        stock: LedgerSide {
            quantity: stock_quantity,
            unit_cost: stock_unit_cost,
            value: stock_value,
        },
    }
}

/// Row for the movement fetch query
#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
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
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_movement(self) -> AppResult<StockMovement> {
        if self.depot_ref.is_none() {
            return Err(AppError::UnknownDepot {
                movement_id: self.id,
                depot_id: self.depot_id,
            });
        }
        let flux = FluxType::try_from(self.flux_id).map_err(|e| AppError::UnknownFlux {
            movement_id: self.id,
            flux_id: e.0,
        })?;

        Ok(StockMovement {
            id: self.id,
            document_id: self.document_id,
            depot_id: self.depot_id,
            lot_id: self.lot_id,
            inventory_id: self.inventory_id,
            entity_id: self.entity_id,
            flux,
            is_exit: self.is_exit,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            date: self.date,
            created_at: self.created_at,
        })
    }
}

impl StockSheetService {
    /// Create a new StockSheetService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Chronological movements of one pair up to a cutoff date
    async fn fetch_movements(
        &self,
        depot_id: Uuid,
        inventory_id: Uuid,
        until: NaiveDate,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT m.id, m.document_id, m.depot_id, d.id AS depot_ref,
                   l.id AS lot_id, l.inventory_id,
                   m.entity_id, m.flux_id, m.is_exit, m.quantity, m.unit_cost,
                   m.date, m.created_at
            FROM stock_movements m
            JOIN lots l ON l.id = m.lot_id
            LEFT JOIN depots d ON d.id = m.depot_id
            WHERE m.depot_id = $1 AND l.inventory_id = $2 AND m.date <= $3
            ORDER BY m.date, m.created_at
            "#,
        )
        .bind(depot_id)
        .bind(inventory_id)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MovementRow::into_movement).collect()
    }

    /// Build the WAC ledger of one pair over a date range
    ///
    /// The opening balance is derived by replaying every movement before
    /// the range start; a pair with no prior history opens at zero/zero.
    pub async fn stock_sheet(
        &self,
        depot_id: Uuid,
        inventory_id: Uuid,
        range: DateRange,
        exchange_rate: Option<Decimal>,
    ) -> AppResult<StockSheet> {
        validate_date_range(&range).map_err(|msg| {
            AppError::validation("range", msg, "La période demandée est invalide")
        })?;
        let rate = exchange_rate.unwrap_or(Decimal::ONE);
        validate_exchange_rate(rate).map_err(|msg| {
            AppError::validation("exchange_rate", msg, "Le taux de change est invalide")
        })?;

        let movements = self.fetch_movements(depot_id, inventory_id, range.end).await?;
        let (before, in_range): (Vec<_>, Vec<_>) = movements
            .into_iter()
            .partition(|m| m.date < range.start);

        let prior = build_stock_sheet(OpeningBalance::default(), &before, rate);
        let opening = OpeningBalance {
            quantity: prior.stock.quantity,
            unit_cost: prior.stock.unit_cost,
        };

        tracing::debug!(
            %depot_id,
            %inventory_id,
            prior_movements = before.len(),
            movements = in_range.len(),
            "building stock sheet"
        );
        Ok(build_stock_sheet(opening, &in_range, rate))
    }
}

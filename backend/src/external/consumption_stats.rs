//! Client for the consumption statistics stored routine
//!
//! The monthly consumption aggregation runs database-side in
//! `compute_consumption_stats`; this client invokes it per
//! (depot, inventory) pair and maps the result into typed estimates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use shared::ConsumptionAlgorithm;

/// Client for the consumption statistics routine
#[derive(Clone)]
pub struct ConsumptionStatsClient {
    db: PgPool,
}

/// Algorithm-keyed monthly consumption estimates for one pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConsumptionEstimates {
    /// Gross consumption over the window, divided by the window length
    pub algo_default: Decimal,
    /// MSH variant: consumption corrected for days spent stocked out
    pub algo_msh: Decimal,
}

impl ConsumptionEstimates {
    /// Value of the configured algorithm
    pub fn select(&self, algo: ConsumptionAlgorithm) -> Decimal {
        match algo {
            ConsumptionAlgorithm::AlgoDefault => self.algo_default,
            ConsumptionAlgorithm::AlgoMsh => self.algo_msh,
        }
    }
}

/// Raw routine output row
#[derive(Debug, sqlx::FromRow)]
struct ConsumptionStatsRow {
    algo_default: Option<Decimal>,
    algo_msh: Option<Decimal>,
}

impl ConsumptionStatsClient {
    /// Create a new client over the given pool
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch consumption estimates for one (depot, inventory) pair
    ///
    /// Returns `None` when the pair has no movement history inside the
    /// averaging window; the caller decides how to default.
    pub async fn fetch(
        &self,
        depot_id: Uuid,
        inventory_id: Uuid,
        as_of: NaiveDate,
        window_months: u32,
    ) -> AppResult<Option<ConsumptionEstimates>> {
        let row = sqlx::query_as::<_, ConsumptionStatsRow>(
            "SELECT algo_default, algo_msh FROM compute_consumption_stats($1, $2, $3, $4)",
        )
        .bind(depot_id)
        .bind(inventory_id)
        .bind(as_of)
        .bind(window_months as i32)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| ConsumptionEstimates {
            algo_default: r.algo_default.unwrap_or(Decimal::ZERO),
            algo_msh: r.algo_msh.unwrap_or(Decimal::ZERO),
        }))
    }
}

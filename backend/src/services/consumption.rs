//! Average monthly consumption (AMC/CMM) lookup service
//!
//! Builds a per-request lookup table of consumption estimates for a set of
//! (depot, inventory) pairs. Pairs are deduplicated before querying; pairs
//! the routine knows nothing about default to a consumption of zero.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::consumption_stats::{ConsumptionEstimates, ConsumptionStatsClient};
use shared::{ConsumptionAlgorithm, StockSettings};

/// One (depot, inventory) pair
pub type DepotInventoryPair = (Uuid, Uuid);

/// Consumption service resolving AMC values per (depot, inventory) pair
#[derive(Clone)]
pub struct ConsumptionService {
    client: ConsumptionStatsClient,
}

/// Resolved consumption entry for one pair
#[derive(Debug, Clone, Serialize)]
pub struct AmcEntry {
    pub depot_id: Uuid,
    pub inventory_id: Uuid,
    /// All algorithm estimates returned by the routine
    pub estimates: ConsumptionEstimates,
    /// Value of the enterprise-configured algorithm
    pub avg_consumption: Decimal,
}

/// Lookup table of resolved consumption entries, keyed by pair
#[derive(Debug, Default)]
pub struct AmcTable {
    entries: HashMap<DepotInventoryPair, AmcEntry>,
}

impl AmcTable {
    /// Build the table from per-pair routine results
    ///
    /// Pairs without a routine result get zero estimates, so downstream
    /// consumers see them as `no consumption` rather than as missing data.
    pub fn from_estimates(
        resolved: Vec<(DepotInventoryPair, Option<ConsumptionEstimates>)>,
        algo: ConsumptionAlgorithm,
    ) -> Self {
        let entries = resolved
            .into_iter()
            .map(|((depot_id, inventory_id), estimates)| {
                let estimates = estimates.unwrap_or(ConsumptionEstimates {
                    algo_default: Decimal::ZERO,
                    algo_msh: Decimal::ZERO,
                });
                (
                    (depot_id, inventory_id),
                    AmcEntry {
                        depot_id,
                        inventory_id,
                        estimates,
                        avg_consumption: estimates.select(algo),
                    },
                )
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, depot_id: Uuid, inventory_id: Uuid) -> Option<&AmcEntry> {
        self.entries.get(&(depot_id, inventory_id))
    }

    /// Selected-algorithm consumption for a pair, zero when unknown
    pub fn avg_consumption(&self, depot_id: Uuid, inventory_id: Uuid) -> Decimal {
        self.get(depot_id, inventory_id)
            .map(|e| e.avg_consumption)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drop duplicate pairs while preserving first-seen order
pub fn dedupe_pairs(pairs: &[DepotInventoryPair]) -> Vec<DepotInventoryPair> {
    let mut seen = HashSet::with_capacity(pairs.len());
    pairs
        .iter()
        .copied()
        .filter(|pair| seen.insert(*pair))
        .collect()
}

impl ConsumptionService {
    /// Create a new ConsumptionService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            client: ConsumptionStatsClient::new(db),
        }
    }

    /// Resolve consumption estimates for a set of pairs as of a date
    ///
    /// The caller supplies the enterprise settings; the configured
    /// algorithm determines which estimate becomes `avg_consumption`.
    pub async fn amc_table(
        &self,
        pairs: &[DepotInventoryPair],
        as_of: NaiveDate,
        settings: &StockSettings,
    ) -> AppResult<AmcTable> {
        let unique = dedupe_pairs(pairs);
        tracing::debug!(
            requested = pairs.len(),
            unique = unique.len(),
            algo = settings.average_consumption_algo.as_str(),
            "resolving average monthly consumption"
        );

        let mut resolved = Vec::with_capacity(unique.len());
        for (depot_id, inventory_id) in unique {
            let estimates = self
                .client
                .fetch(
                    depot_id,
                    inventory_id,
                    as_of,
                    settings.month_average_consumption,
                )
                .await?;
            resolved.push(((depot_id, inventory_id), estimates));
        }

        Ok(AmcTable::from_estimates(
            resolved,
            settings.average_consumption_algo,
        ))
    }
}

//! Stock movement models
//!
//! Movements form the immutable ledger of every stock change. Corrections
//! are recorded as new offsetting movements, never as updates or deletes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason/direction code of a stock movement
///
/// The discriminants mirror the fixed `flux` reference table; unknown ids
/// are rejected rather than coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum FluxType {
    FromPurchase = 1,
    FromOtherDepot = 2,
    FromAdjustment = 3,
    FromPatient = 4,
    FromService = 5,
    FromDonation = 6,
    FromLoss = 7,
    ToOtherDepot = 8,
    ToPatient = 9,
    ToService = 10,
    ToLoss = 11,
    ToAdjustment = 12,
    FromIntegration = 13,
    InventoryReset = 14,
    InventoryAdjustment = 15,
    AggregateConsumption = 16,
}

impl FluxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FluxType::FromPurchase => "from_purchase",
            FluxType::FromOtherDepot => "from_other_depot",
            FluxType::FromAdjustment => "from_adjustment",
            FluxType::FromPatient => "from_patient",
            FluxType::FromService => "from_service",
            FluxType::FromDonation => "from_donation",
            FluxType::FromLoss => "from_loss",
            FluxType::ToOtherDepot => "to_other_depot",
            FluxType::ToPatient => "to_patient",
            FluxType::ToService => "to_service",
            FluxType::ToLoss => "to_loss",
            FluxType::ToAdjustment => "to_adjustment",
            FluxType::FromIntegration => "from_integration",
            FluxType::InventoryReset => "inventory_reset",
            FluxType::InventoryAdjustment => "inventory_adjustment",
            FluxType::AggregateConsumption => "aggregate_consumption",
        }
    }

    /// Whether this flux brings stock into the depot
    pub fn is_entry(&self) -> bool {
        matches!(
            self,
            FluxType::FromPurchase
                | FluxType::FromOtherDepot
                | FluxType::FromAdjustment
                | FluxType::FromPatient
                | FluxType::FromService
                | FluxType::FromDonation
                | FluxType::FromLoss
                | FluxType::FromIntegration
        )
    }

    /// Whether this flux takes stock out of the depot
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            FluxType::ToOtherDepot
                | FluxType::ToPatient
                | FluxType::ToService
                | FluxType::ToLoss
                | FluxType::ToAdjustment
                | FluxType::AggregateConsumption
        )
    }

    /// Whether this flux is one side of an inter-depot transfer
    pub fn is_transfer(&self) -> bool {
        matches!(self, FluxType::FromOtherDepot | FluxType::ToOtherDepot)
    }
}

impl TryFrom<i16> for FluxType {
    type Error = UnknownFluxId;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        let flux = match id {
            1 => FluxType::FromPurchase,
            2 => FluxType::FromOtherDepot,
            3 => FluxType::FromAdjustment,
            4 => FluxType::FromPatient,
            5 => FluxType::FromService,
            6 => FluxType::FromDonation,
            7 => FluxType::FromLoss,
            8 => FluxType::ToOtherDepot,
            9 => FluxType::ToPatient,
            10 => FluxType::ToService,
            11 => FluxType::ToLoss,
            12 => FluxType::ToAdjustment,
            13 => FluxType::FromIntegration,
            14 => FluxType::InventoryReset,
            15 => FluxType::InventoryAdjustment,
            16 => FluxType::AggregateConsumption,
            _ => return Err(UnknownFluxId(id)),
        };
        Ok(flux)
    }
}

/// Error for a flux id with no entry in the closed enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown flux id: {0}")]
pub struct UnknownFluxId(pub i16);

/// A single immutable stock movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    /// Groups all movements created by one transaction
    pub document_id: Uuid,
    pub depot_id: Uuid,
    pub lot_id: Uuid,
    pub inventory_id: Uuid,
    /// Counterparty of the movement: patient, service or partner depot
    pub entity_id: Option<Uuid>,
    pub flux: FluxType,
    pub is_exit: bool,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_round_trip_from_id() {
        for id in 1i16..=16 {
            let flux = FluxType::try_from(id).unwrap();
            assert_eq!(flux as i16, id);
        }
    }

    #[test]
    fn test_flux_unknown_id_rejected() {
        assert_eq!(FluxType::try_from(0), Err(UnknownFluxId(0)));
        assert_eq!(FluxType::try_from(17), Err(UnknownFluxId(17)));
        assert_eq!(FluxType::try_from(-3), Err(UnknownFluxId(-3)));
    }

    #[test]
    fn test_flux_direction_is_exclusive() {
        for id in 1i16..=16 {
            let flux = FluxType::try_from(id).unwrap();
            // A flux is an entry, an exit, or a pure bookkeeping flux, never both
            assert!(!(flux.is_entry() && flux.is_exit()), "{:?}", flux);
        }
    }

    #[test]
    fn test_transfer_fluxes() {
        assert!(FluxType::ToOtherDepot.is_transfer());
        assert!(FluxType::FromOtherDepot.is_transfer());
        assert!(!FluxType::FromPurchase.is_transfer());
        assert!(!FluxType::ToPatient.is_transfer());
    }
}

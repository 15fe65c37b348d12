//! Validation utilities for the Hospital Stock Management Platform

use rust_decimal::Decimal;

use crate::models::FluxType;
use crate::types::DateRange;

// ============================================================================
// Stock Movement Validations
// ============================================================================

/// Validate that a movement quantity is strictly positive
pub fn validate_movement_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Movement quantity must be positive");
    }
    Ok(())
}

/// Validate that a movement's direction flag agrees with its flux
///
/// Inventory resets and adjustments may go either way; every other flux has
/// a fixed direction.
pub fn validate_movement_direction(flux: FluxType, is_exit: bool) -> Result<(), &'static str> {
    match flux {
        FluxType::InventoryReset | FluxType::InventoryAdjustment => Ok(()),
        f if f.is_entry() && is_exit => Err("Entry flux recorded as an exit"),
        f if f.is_exit() && !is_exit => Err("Exit flux recorded as an entry"),
        _ => Ok(()),
    }
}

/// Validate that a unit cost is not negative
pub fn validate_unit_cost(unit_cost: Decimal) -> Result<(), &'static str> {
    if unit_cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    Ok(())
}

/// Validate a lot package size (at least one unit per package)
pub fn validate_package_size(package_size: Decimal) -> Result<(), &'static str> {
    if package_size < Decimal::ONE {
        return Err("Package size must be at least 1");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate that a date range is correctly ordered
pub fn validate_date_range(range: &DateRange) -> Result<(), &'static str> {
    if range.start > range.end {
        return Err("Date range start must not be after its end");
    }
    Ok(())
}

/// Validate an exchange rate used to restate costs
pub fn validate_exchange_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate <= Decimal::ZERO {
        return Err("Exchange rate must be positive");
    }
    Ok(())
}

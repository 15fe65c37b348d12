//! Enterprise stock settings
//!
//! Settings are loaded once per request and injected into every
//! computation. There are deliberately no fallback values for the
//! consumption algorithm or the averaging window: every reorder threshold
//! downstream depends on them, so a missing value is a hard error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Algorithm used to estimate average monthly consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionAlgorithm {
    /// Gross consumption divided by the averaging window
    AlgoDefault,
    /// MSH variant: consumption corrected for stock-out days
    AlgoMsh,
}

impl ConsumptionAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionAlgorithm::AlgoDefault => "algo_default",
            ConsumptionAlgorithm::AlgoMsh => "algo_msh",
        }
    }
}

impl FromStr for ConsumptionAlgorithm {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "algo_default" => Ok(ConsumptionAlgorithm::AlgoDefault),
            "algo_msh" => Ok(ConsumptionAlgorithm::AlgoMsh),
            _ => Err("unknown consumption algorithm"),
        }
    }
}

/// Per-enterprise stock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSettings {
    /// Averaging window for consumption estimates, in months
    pub month_average_consumption: u32,
    pub average_consumption_algo: ConsumptionAlgorithm,
    /// Floor applied to every item's reorder lead time, in months
    pub min_delay: Decimal,
    /// Enterprise-wide purchase interval, in months
    pub default_purchase_interval: Decimal,
    /// Exclude expired-but-unconsumed quantities from usable stock
    pub enable_expired_stock_out: bool,
}

impl StockSettings {
    /// Build settings from raw enterprise columns
    ///
    /// The algorithm and averaging window are mandatory; `None` means the
    /// enterprise row is incomplete and the whole computation must abort.
    pub fn from_parts(
        algo: Option<&str>,
        month_average_consumption: Option<u32>,
        min_delay: Decimal,
        default_purchase_interval: Decimal,
        enable_expired_stock_out: bool,
    ) -> Result<Self, &'static str> {
        let algo = algo.ok_or("average consumption algorithm is not configured")?;
        let average_consumption_algo = ConsumptionAlgorithm::from_str(algo)?;
        let month_average_consumption =
            month_average_consumption.ok_or("average consumption window is not configured")?;
        if month_average_consumption == 0 {
            return Err("average consumption window must be at least one month");
        }

        Ok(Self {
            month_average_consumption,
            average_consumption_algo,
            min_delay,
            default_purchase_interval,
            enable_expired_stock_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "algo_default".parse::<ConsumptionAlgorithm>().unwrap(),
            ConsumptionAlgorithm::AlgoDefault
        );
        assert_eq!(
            "algo_msh".parse::<ConsumptionAlgorithm>().unwrap(),
            ConsumptionAlgorithm::AlgoMsh
        );
        assert!("algo_median".parse::<ConsumptionAlgorithm>().is_err());
    }

    #[test]
    fn test_settings_require_algorithm() {
        let result = StockSettings::from_parts(None, Some(6), Decimal::ONE, Decimal::ONE, false);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_require_window() {
        let result =
            StockSettings::from_parts(Some("algo_default"), None, Decimal::ONE, Decimal::ONE, false);
        assert!(result.is_err());

        let zero =
            StockSettings::from_parts(Some("algo_default"), Some(0), Decimal::ONE, Decimal::ONE, false);
        assert!(zero.is_err());
    }

    #[test]
    fn test_settings_complete_row() {
        let settings = StockSettings::from_parts(
            Some("algo_msh"),
            Some(6),
            Decimal::ONE,
            Decimal::from(2),
            true,
        )
        .unwrap();
        assert_eq!(settings.average_consumption_algo, ConsumptionAlgorithm::AlgoMsh);
        assert_eq!(settings.month_average_consumption, 6);
        assert!(settings.enable_expired_stock_out);
    }
}

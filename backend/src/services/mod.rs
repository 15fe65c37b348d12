//! Stock analytics services

pub mod consumption;
pub mod indicators;
pub mod lots;
pub mod reconciliation;
pub mod settings;
pub mod stock_sheet;

pub use consumption::ConsumptionService;
pub use indicators::IndicatorService;
pub use lots::LotService;
pub use reconciliation::LostStockService;
pub use settings::SettingsService;
pub use stock_sheet::StockSheetService;

//! Enterprise stock settings loader
//!
//! Loads the per-enterprise stock configuration once per request; services
//! receive it by injection and never cache it across requests.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::StockSettings;

/// Settings service loading per-enterprise stock configuration
#[derive(Clone)]
pub struct SettingsService {
    db: PgPool,
}

/// Row for the enterprise settings query
#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    average_consumption_algo: Option<String>,
    month_average_consumption: Option<i32>,
    min_delay: Decimal,
    default_purchase_interval: Decimal,
    enable_expired_stock_out: bool,
}

impl SettingsService {
    /// Create a new SettingsService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock settings of one enterprise
    ///
    /// An incomplete row (missing algorithm or averaging window) aborts the
    /// request; no defaults are substituted.
    pub async fn load(&self, enterprise_id: Uuid) -> AppResult<StockSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT average_consumption_algo, month_average_consumption,
                   min_delay, default_purchase_interval, enable_expired_stock_out
            FROM enterprise_stock_settings
            WHERE enterprise_id = $1
            "#,
        )
        .bind(enterprise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Enterprise stock settings".to_string()))?;

        StockSettings::from_parts(
            row.average_consumption_algo.as_deref(),
            row.month_average_consumption
                .and_then(|m| u32::try_from(m).ok()),
            row.min_delay,
            row.default_purchase_interval,
            row.enable_expired_stock_out,
        )
        .map_err(AppError::IncompleteStockSettings)
    }
}

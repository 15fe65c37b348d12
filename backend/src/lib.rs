//! Hospital Stock Management Platform - Stock Analytics Backend
//!
//! Read-side analytics over depot stock: weighted-average-cost ledgers,
//! reorder thresholds, average monthly consumption, expiration-risk
//! simulation and inter-depot transfer reconciliation. HTTP routing,
//! authentication and report rendering are owned by the embedding
//! application; this crate exposes the services they call.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod external;
pub mod models;
pub mod services;

pub use config::Config;

/// Initialize tracing for embedding applications that do not bring their
/// own subscriber
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hsm_backend=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

//! Shared types and models for the Hospital Stock Management Platform
//!
//! This crate contains types shared between the stock analytics backend,
//! reporting consumers, and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;

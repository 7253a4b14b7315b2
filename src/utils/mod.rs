//! Utility modules for common functionality.
//!
//! This module provides various utility functions and types that are used across
//! the application. Currently includes:
//!
//! - address: Local address format checks
//! - amount: Decimal precision and base unit conversions
//! - constants: Constants for the application
//! - http: Retryable HTTP client construction
//! - logging: Logging utilities
//! - tests: Builders shared by unit and integration tests

pub mod address;
pub mod amount;
pub mod constants;
pub mod http;
pub mod logging;
pub mod tests;

pub use constants::*;

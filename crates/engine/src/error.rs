//! The module contains the errors the engine can return.
//!
//! Aggregation never fails: malformed remote data is coerced to safe
//! defaults. Errors only come from user input, before a request is built:
//!
//! - [`Validation`] a draft is missing a field or has an out-of-range value.
//! - [`InvalidAmount`] a typed amount cannot be parsed.
//! - [`InvalidDate`] a typed date cannot be parsed.
//! - [`InvalidBoundaryDay`] the pay-cycle boundary is outside `2..=28`.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidDate`]: EngineError::InvalidDate
//!  [`InvalidBoundaryDay`]: EngineError::InvalidBoundaryDay
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid pay cycle boundary day: {0}")]
    InvalidBoundaryDay(u32),
}

//! Providers Module - External Data Sources
//!
//! The external ML predictor lives behind the `RiskPredictor` trait.

pub mod ml_service;

pub use ml_service::*;

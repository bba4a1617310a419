//! Core Module - Risk Engine
//!
//! Normalization, local scoring, the tiered prediction protocol and
//! presentation formatting.

pub mod formatter;
pub mod normalizer;
pub mod orchestrator;
pub mod risk_score;

pub use formatter::*;
pub use normalizer::*;
pub use orchestrator::*;
pub use risk_score::*;

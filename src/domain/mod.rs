//! Core domain types and logic.

pub mod config_validation;
pub mod error;
pub mod features;
pub mod grouping;
pub mod loader;
pub mod pipeline;
pub mod trade;

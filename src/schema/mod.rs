//! Schema module - Configuration, contract and strategy types for the search.

mod config;
mod strategy;

pub use config::*;
pub use strategy::*;

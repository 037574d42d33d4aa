//! Core scoring types and logic.

pub mod analysis;
pub mod clock;
pub mod composite;
pub mod config_validation;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod position;
pub mod rules;
pub mod scoring_config;
pub mod snapshot;
pub mod strength;
pub mod summary;
pub mod technical;

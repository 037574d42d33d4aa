//! Concrete adapter implementations for ports.

pub mod csv_snapshot_adapter;
pub mod file_config_adapter;
pub mod json_history_adapter;

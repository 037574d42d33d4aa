//! Port traits the domain is written against.

pub mod config_port;
pub mod history_port;
pub mod snapshot_port;
pub mod summary_port;

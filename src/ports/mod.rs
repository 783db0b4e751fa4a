//! Port traits at the boundary of the engine.

pub mod config_port;
pub mod data_port;

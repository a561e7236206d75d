//! System configuration, startup, and shutdown logic.

pub mod config;
pub mod farm_system;
pub mod telemetry;

pub use config::*;
pub use farm_system::*;
pub use telemetry::*;

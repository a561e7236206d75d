//! Apple variety storage: creation rules, field edits, and the active toggle.

mod actions;
mod dtos;
pub mod entity;

pub use actions::*;
pub use dtos::*;

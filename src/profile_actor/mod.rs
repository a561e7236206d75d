mod actions;
mod dtos;
pub mod entity;

pub use actions::*;
pub use dtos::*;

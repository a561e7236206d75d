//! Order storage. Items are owned by their order.

mod dtos;
pub mod entity;

pub use dtos::*;

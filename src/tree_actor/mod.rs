//! Tree storage. Harvest reports live inside their tree, so every rule that
//! spans reports is checked within one table transaction.

mod actions;
mod dtos;
pub mod entity;

pub use actions::*;
pub use dtos::*;

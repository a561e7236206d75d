//! Orchard operations core: order lifecycle, employee assignment, harvest
//! scheduling and inventory, over actor-owned tables.

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod error;
pub mod harvest_schedule;
pub mod inventory;

pub mod order_actor;
pub mod profile_actor;
pub mod tree_actor;
pub mod variety_actor;

#[cfg(test)]
mod mock_framework;

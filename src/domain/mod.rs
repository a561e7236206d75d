//! Orchard business entities. Pure data plus the state rules that belong to
//! a single record; anything spanning records lives in the clients.

pub mod actor;
pub mod order;
pub mod profile;
pub mod tree;
pub mod variety;

pub use actor::*;
pub use order::*;
pub use profile::*;
pub use tree::*;
pub use variety::*;

/// Weight in pounds. Decimal so half-pound steps stay exact.
pub type Pounds = rust_decimal::Decimal;

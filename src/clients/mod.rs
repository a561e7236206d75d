//! Client handles: the operations an authenticated [`Actor`](crate::domain::Actor)
//! invokes, each orchestrating one or more table actors.

#[macro_use]
mod macros;

pub mod assignment;
pub mod order_client;
pub mod profile_client;
pub mod tree_client;
pub mod variety_client;

pub use assignment::*;
pub use order_client::*;
pub use profile_client::*;
pub use tree_client::*;
pub use variety_client::*;

use rust_decimal::Decimal;

use crate::actor_framework::EntityId;

/// An apple variety offered for sale.
///
/// Pounds on hand is never stored here; see [`crate::inventory`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppleVariety {
    pub id: EntityId,
    pub name: String,
    pub image_url: Option<String>,
    pub cost_per_pound: Decimal,
    pub is_active: bool,
}

impl AppleVariety {
    /// Names compare trimmed and case-insensitively.
    pub fn same_name(&self, other: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(other.trim())
    }
}

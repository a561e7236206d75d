use crate::domain::Role;

#[derive(Debug, Clone)]
pub enum ProfileAction {
    GrantRole(Role),
    RevokeRole(Role),
}

/// `true` when the role set actually changed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileActionResult {
    GrantRole(bool),
    RevokeRole(bool),
}

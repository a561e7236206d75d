use std::collections::BTreeSet;
use std::fmt;

use crate::actor_framework::EntityId;
use crate::error::{FarmError, FarmResult};

/// Capabilities an authenticated profile may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    Harvester,
    OrderPicker,
    Customer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Harvester, Role::OrderPicker, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Harvester => "Harvester",
            Role::OrderPicker => "OrderPicker",
            Role::Customer => "Customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The already-authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub profile_id: EntityId,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(profile_id: EntityId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            profile_id,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Fails with `Forbidden` unless the actor holds at least one of `allowed`.
    pub fn require_any(&self, allowed: &[Role]) -> FarmResult<()> {
        if allowed.iter().any(|role| self.has_role(*role)) {
            return Ok(());
        }
        Err(FarmError::Forbidden(format!(
            "profile {} needs one of {:?}",
            self.profile_id, allowed
        )))
    }

    /// Employees act on their own behalf; admins may act for anyone.
    pub fn require_self_or_admin(&self, profile_id: EntityId) -> FarmResult<()> {
        if self.is_admin() || self.profile_id == profile_id {
            return Ok(());
        }
        Err(FarmError::Forbidden(format!(
            "profile {} may not act for profile {}",
            self.profile_id, profile_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks_use_closed_set() {
        let picker = Actor::new(4, [Role::OrderPicker]);
        assert!(picker.require_any(&[Role::Admin, Role::OrderPicker]).is_ok());
        assert!(matches!(
            picker.require_any(&[Role::Customer]),
            Err(FarmError::Forbidden(_))
        ));
        assert!(!picker.is_admin());
    }

    #[test]
    fn test_self_or_admin() {
        let harvester = Actor::new(2, [Role::Harvester]);
        assert!(harvester.require_self_or_admin(2).is_ok());
        assert!(harvester.require_self_or_admin(3).is_err());

        let admin = Actor::new(1, [Role::Admin, Role::Harvester]);
        assert!(admin.require_self_or_admin(3).is_ok());
    }
}

use std::collections::BTreeSet;

use crate::actor_framework::EntityId;
use crate::domain::{Actor, Role};

/// Represents a registered person: customer or employee.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl From<&UserProfile> for Actor {
    fn from(profile: &UserProfile) -> Self {
        Actor::new(profile.id, profile.roles.iter().copied())
    }
}

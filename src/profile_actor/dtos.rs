use std::collections::BTreeSet;

use crate::domain::Role;

#[derive(Debug, Clone)]
pub struct ProfileCreate {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

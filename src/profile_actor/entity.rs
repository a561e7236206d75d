use super::actions::{ProfileAction, ProfileActionResult};
use super::dtos::{ProfileCreate, ProfilePatch};
use crate::actor_framework::{Entity, EntityId};
use crate::domain::UserProfile;
use crate::error::FarmError;

fn non_blank(field: &str, value: String) -> Result<String, FarmError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FarmError::ValidationError(format!("{} required", field)));
    }
    Ok(trimmed.to_string())
}

impl Entity for UserProfile {
    const KIND: &'static str = "UserProfile";
    type CreateParams = ProfileCreate;
    type Patch = ProfilePatch;
    type Action = ProfileAction;
    type ActionResult = ProfileActionResult;
    type Error = FarmError;

    fn id(&self) -> EntityId {
        self.id
    }

    fn from_create_params(id: EntityId, params: ProfileCreate) -> Result<Self, FarmError> {
        Ok(Self {
            id,
            first_name: non_blank("first name", params.first_name)?,
            last_name: non_blank("last name", params.last_name)?,
            address: non_blank("address", params.address)?,
            email: non_blank("email", params.email)?,
            roles: params.roles,
        })
    }

    fn on_update(&mut self, patch: ProfilePatch) -> Result<(), FarmError> {
        if let Some(first_name) = patch.first_name {
            self.first_name = non_blank("first name", first_name)?;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = non_blank("last name", last_name)?;
        }
        if let Some(address) = patch.address {
            self.address = non_blank("address", address)?;
        }
        if let Some(email) = patch.email {
            self.email = non_blank("email", email)?;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: ProfileAction) -> Result<ProfileActionResult, FarmError> {
        match action {
            ProfileAction::GrantRole(role) => Ok(ProfileActionResult::GrantRole(self.roles.insert(role))),
            ProfileAction::RevokeRole(role) => Ok(ProfileActionResult::RevokeRole(self.roles.remove(&role))),
        }
    }
}

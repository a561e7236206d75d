use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{EntityId, ResourceClient};
use crate::domain::{Actor, Role, UserProfile};
use crate::error::FarmResult;
use crate::profile_actor::{ProfileAction, ProfileActionResult, ProfileCreate, ProfilePatch};

/// Client for user profiles and their role sets.
#[derive(Clone)]
pub struct ProfileClient {
    inner: ResourceClient<UserProfile>,
}

impl_basic_client!(ProfileClient, UserProfile, profile, profiles);

impl ProfileClient {
    /// Registers a profile for an identity the authentication layer already
    /// vouched for.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn create_profile(&self, params: ProfileCreate) -> FarmResult<EntityId> {
        debug!("Sending request");
        let id = self.inner.create(params).await?;
        info!(profile_id = id, "Profile created");
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn profiles_with_role(&self, role: Role) -> FarmResult<Vec<UserProfile>> {
        debug!("Sending request");
        self.inner.list(move |profile| profile.has_role(role)).await
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn update_profile(
        &self,
        actor: &Actor,
        id: EntityId,
        patch: ProfilePatch,
    ) -> FarmResult<UserProfile> {
        actor
            .require_self_or_admin(id)
            .inspect_err(|e| warn!(error = %e, "Profile update rejected"))?;
        self.inner.update(id, patch).await
    }

    /// Grants `Admin`. Returns whether the role set changed.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn promote(&self, actor: &Actor, id: EntityId) -> FarmResult<bool> {
        self.change_admin(actor, id, ProfileAction::GrantRole(Role::Admin)).await
    }

    /// Revokes `Admin`. Returns whether the role set changed.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn demote(&self, actor: &Actor, id: EntityId) -> FarmResult<bool> {
        self.change_admin(actor, id, ProfileAction::RevokeRole(Role::Admin)).await
    }

    async fn change_admin(&self, actor: &Actor, id: EntityId, action: ProfileAction) -> FarmResult<bool> {
        actor
            .require_any(&[Role::Admin])
            .inspect_err(|e| warn!(error = %e, "Role change rejected"))?;
        let changed = match self.inner.perform_action(id, action).await? {
            ProfileActionResult::GrantRole(changed) | ProfileActionResult::RevokeRole(changed) => changed,
        };
        info!(profile_id = id, changed, "Admin role updated");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::{IdSequence, ResourceActor};
    use crate::error::FarmError;
    use std::collections::BTreeSet;

    fn params(email: &str, roles: &[Role]) -> ProfileCreate {
        ProfileCreate {
            first_name: "Ada".to_string(),
            last_name: "Pick".to_string(),
            address: "1 Orchard Rd".to_string(),
            email: email.to_string(),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn spawn_client() -> ProfileClient {
        let (actor, inner) = ResourceActor::<UserProfile>::new(8, IdSequence::new());
        tokio::spawn(actor.run());
        ProfileClient::new(inner)
    }

    #[tokio::test]
    async fn test_promote_is_admin_only() {
        let client = spawn_client();
        let admin_id = client.create_profile(params("a@farm", &[Role::Admin])).await.unwrap();
        let picker_id = client.create_profile(params("p@farm", &[Role::OrderPicker])).await.unwrap();

        let admin = Actor::from(&client.get_profile(admin_id).await.unwrap());
        let picker = Actor::from(&client.get_profile(picker_id).await.unwrap());

        assert!(matches!(client.promote(&picker, picker_id).await, Err(FarmError::Forbidden(_))));
        assert_eq!(client.promote(&admin, picker_id).await, Ok(true));
        assert_eq!(client.promote(&admin, picker_id).await, Ok(false));

        let admins = client.profiles_with_role(Role::Admin).await.unwrap();
        assert_eq!(admins.iter().map(|p| p.id).collect::<Vec<_>>(), vec![admin_id, picker_id]);

        assert_eq!(client.demote(&admin, picker_id).await, Ok(true));
        assert_eq!(client.list_profiles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_profile_edits_are_self_or_admin() {
        let client = spawn_client();
        let one = client.create_profile(params("one@farm", &[Role::Customer])).await.unwrap();
        let two = client.create_profile(params("two@farm", &[Role::Customer])).await.unwrap();
        let actor = Actor::new(one, [Role::Customer]);

        let patch = ProfilePatch {
            address: Some("2 Cider Ln".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            client.update_profile(&actor, two, patch.clone()).await,
            Err(FarmError::Forbidden(_))
        ));
        let updated = client.update_profile(&actor, one, patch).await.unwrap();
        assert_eq!(updated.address, "2 Cider Ln");

        let blank = ProfilePatch {
            email: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            client.update_profile(&actor, one, blank).await,
            Err(FarmError::ValidationError(_))
        ));
        assert!(matches!(client.get_profile(99).await, Err(FarmError::NotFound { .. })));
    }
}

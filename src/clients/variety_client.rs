use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{EntityId, ResourceClient};
use crate::domain::{Actor, AppleVariety, Order, OrderItem, Role, Tree};
use crate::error::{FarmError, FarmResult};
use crate::inventory::{pounds_on_hand, VarietyStock};
use crate::variety_actor::{VarietyAction, VarietyActionResult, VarietyCreate, VarietyPatch};

/// Client for apple varieties.
///
/// Holds read handles on the tree and order tables so it can derive stock.
#[derive(Clone)]
pub struct VarietyClient {
    inner: ResourceClient<AppleVariety>,
    trees: ResourceClient<Tree>,
    orders: ResourceClient<Order>,
}

impl_client_methods!(VarietyClient, AppleVariety, variety, varieties);

fn duplicate_name(name: &str) -> FarmError {
    FarmError::Conflict(format!("a variety named '{}' already exists", name.trim()))
}

impl VarietyClient {
    pub fn new(
        inner: ResourceClient<AppleVariety>,
        trees: ResourceClient<Tree>,
        orders: ResourceClient<Order>,
    ) -> Self {
        Self { inner, trees, orders }
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id, name = %params.name))]
    pub async fn create_variety(&self, actor: &Actor, params: VarietyCreate) -> FarmResult<EntityId> {
        actor
            .require_any(&[Role::Admin])
            .inspect_err(|e| warn!(error = %e, "Variety creation rejected"))?;
        debug!("Sending request");

        let id = self
            .inner
            .transact(move |table| {
                if table.find(|v| v.same_name(&params.name)).is_some() {
                    return Err(duplicate_name(&params.name));
                }
                table.insert(params)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Variety creation rejected"))?;

        info!(variety_id = id, "Variety created");
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn update_variety(
        &self,
        actor: &Actor,
        id: EntityId,
        patch: VarietyPatch,
    ) -> FarmResult<AppleVariety> {
        actor.require_any(&[Role::Admin])?;
        debug!("Sending request");

        self.inner
            .transact(move |table| {
                if let Some(name) = &patch.name {
                    if table.find(|v| v.id != id && v.same_name(name)).is_some() {
                        return Err(duplicate_name(name));
                    }
                }
                table.update(id, patch)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Variety update rejected"))
    }

    /// Flips the active flag and returns its new value.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn toggle_active(&self, actor: &Actor, id: EntityId) -> FarmResult<bool> {
        actor.require_any(&[Role::Admin])?;
        debug!("Sending request");
        let VarietyActionResult::ToggleActive(active) =
            self.inner.perform_action(id, VarietyAction::ToggleActive).await?;
        info!(variety_id = id, active, "Variety active flag toggled");
        Ok(active)
    }

    /// Deletes a variety nothing refers to. Varieties with trees or order
    /// items stay, and can be deactivated with [`VarietyClient::toggle_active`].
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn delete_variety(&self, actor: &Actor, id: EntityId) -> FarmResult<()> {
        actor
            .require_any(&[Role::Admin])
            .inspect_err(|e| warn!(error = %e, "Variety deletion rejected"))?;
        let variety = self.get_variety(id).await?;

        let trees = self.trees.list(move |tree| tree.variety_id == id).await?;
        let orders = self
            .orders
            .list(move |order| order.items.iter().any(|item| item.variety_id == id))
            .await?;
        if !trees.is_empty() || !orders.is_empty() {
            let err = FarmError::Conflict(format!(
                "variety '{}' is used by {} trees and {} orders",
                variety.name,
                trees.len(),
                orders.len()
            ));
            warn!(error = %err, "Variety deletion rejected");
            return Err(err);
        }

        debug!("Sending request");
        self.inner.delete(id).await?;
        info!(variety_id = id, "Variety deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn active_varieties(&self) -> FarmResult<Vec<AppleVariety>> {
        debug!("Sending request");
        self.inner.list(|variety| variety.is_active).await
    }

    /// The variety with its pounds on hand derived from every tree of the
    /// variety and every order item referencing it.
    #[instrument(skip(self))]
    pub async fn variety_stock(&self, id: EntityId) -> FarmResult<VarietyStock> {
        let variety = self.get_variety(id).await?;

        let trees = self.trees.list(move |tree| tree.variety_id == id).await?;
        let items: Vec<OrderItem> = self
            .orders
            .list(move |order| order.items.iter().any(|item| item.variety_id == id))
            .await?
            .into_iter()
            .flat_map(|order| order.items)
            .collect();

        let on_hand = pounds_on_hand(id, Some(trees.as_slice()), Some(items.as_slice()));
        debug!(?on_hand, "Stock derived");
        Ok(VarietyStock {
            variety,
            pounds_on_hand: on_hand,
        })
    }
}

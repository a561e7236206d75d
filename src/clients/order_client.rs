use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::assignment::open_order_of;
use crate::actor_framework::{EntityId, IdSequence, ResourceClient, Table};
use crate::app_system::OwnershipPolicy;
use crate::domain::{
    Actor, AppleVariety, ItemAdjustment, Order, OrderItem, OrderState, Pounds, PoundsAdjustment, Role,
    UserProfile,
};
use crate::error::{FarmError, FarmResult};
use crate::inventory::order_total;
use crate::order_actor::OrderCreate;

/// Client driving the order lifecycle.
///
/// Every transition runs as one transaction on the order table, so a failed
/// check leaves the order exactly as it was.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    varieties: ResourceClient<AppleVariety>,
    profiles: ResourceClient<UserProfile>,
    item_ids: IdSequence,
    policy: OwnershipPolicy,
}

fn require_owner(actor: &Actor, order: &Order) -> FarmResult<()> {
    if order.customer_id == actor.profile_id {
        return Ok(());
    }
    Err(FarmError::Forbidden(format!(
        "order {} belongs to customer {}",
        order.id, order.customer_id
    )))
}

fn require_draft(order: &Order) -> FarmResult<()> {
    match order.state() {
        OrderState::Draft => Ok(()),
        state => Err(FarmError::InvalidState(format!(
            "order {} is {:?}, not a draft",
            order.id, state
        ))),
    }
}

/// The order holding `item_id`, for editing.
fn order_of_item(table: &mut Table<Order>, item_id: EntityId) -> FarmResult<&mut Order> {
    table
        .values_mut()
        .find(|order| order.item(item_id).is_some())
        .ok_or(FarmError::not_found("OrderItem", item_id))
}

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        varieties: ResourceClient<AppleVariety>,
        profiles: ResourceClient<UserProfile>,
        item_ids: IdSequence,
        policy: OwnershipPolicy,
    ) -> Self {
        Self {
            inner,
            varieties,
            profiles,
            item_ids,
            policy,
        }
    }

    /// The customer's cart, created on first use.
    ///
    /// Lookup and creation happen in one transaction, so concurrent callers
    /// for the same customer all receive the same draft.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn get_or_create_draft(&self, actor: &Actor, customer_id: EntityId) -> FarmResult<Order> {
        actor
            .require_self_or_admin(customer_id)
            .inspect_err(|e| warn!(error = %e, "Draft lookup rejected"))?;
        if self.profiles.get(customer_id).await?.is_none() {
            warn!(customer_id, "Customer profile not found");
            return Err(FarmError::not_found("UserProfile", customer_id));
        }
        debug!("Sending request");

        self.inner
            .transact(move |table| {
                let existing = table
                    .find(|order| order.customer_id == customer_id && order.is_draft())
                    .map(|order| order.id);
                let id = match existing {
                    Some(id) => id,
                    None => {
                        let id = table.insert(OrderCreate { customer_id })?;
                        info!(order_id = id, customer_id, "Draft order created");
                        id
                    }
                };
                Ok(table.require(id)?.clone())
            })
            .await
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn add_item(
        &self,
        actor: &Actor,
        order_id: EntityId,
        variety_id: EntityId,
        pounds: Pounds,
    ) -> FarmResult<OrderItem> {
        let variety = self
            .varieties
            .get(variety_id)
            .await?
            .ok_or(FarmError::not_found("AppleVariety", variety_id))?;
        if !variety.is_active {
            warn!(variety = %variety.name, "Variety is not active");
            return Err(FarmError::InvalidState(format!(
                "variety '{}' is not available",
                variety.name
            )));
        }

        let actor = actor.clone();
        let item_ids = self.item_ids.clone();
        let item = self
            .inner
            .transact(move |table| {
                let order = table.require_mut(order_id)?;
                require_owner(&actor, order)?;
                require_draft(order)?;
                if pounds <= Decimal::ZERO {
                    return Err(FarmError::InvalidState(format!(
                        "cannot add {} pounds",
                        pounds
                    )));
                }
                let item = OrderItem {
                    id: item_ids.next_id(),
                    order_id,
                    variety_id,
                    pounds,
                };
                order.items.push(item.clone());
                Ok(item)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Item rejected"))?;

        info!(item_id = item.id, %pounds, "Item added");
        Ok(item)
    }

    /// Moves an item by half a pound. Going below one pound removes the item.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn adjust_item_pounds(
        &self,
        actor: &Actor,
        item_id: EntityId,
        adjustment: PoundsAdjustment,
    ) -> FarmResult<ItemAdjustment> {
        let actor = actor.clone();
        let outcome = self
            .inner
            .transact(move |table| {
                let order = order_of_item(table, item_id)?;
                require_owner(&actor, order)?;
                require_draft(order)?;
                let order_id = order.id;

                let current = order
                    .item(item_id)
                    .map(|item| item.pounds)
                    .ok_or(FarmError::not_found("OrderItem", item_id))?;
                match adjustment.apply(current) {
                    Some(pounds) => {
                        let item = order
                            .item_mut(item_id)
                            .ok_or(FarmError::not_found("OrderItem", item_id))?;
                        item.pounds = pounds;
                        Ok(ItemAdjustment::Updated(item.clone()))
                    }
                    None => {
                        order.take_item(item_id);
                        Ok(ItemAdjustment::Removed { order_id, item_id })
                    }
                }
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Adjustment rejected"))?;

        debug!(?outcome, "Item adjusted");
        Ok(outcome)
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn remove_item(&self, actor: &Actor, item_id: EntityId) -> FarmResult<OrderItem> {
        let actor = actor.clone();
        self.inner
            .transact(move |table| {
                let order = order_of_item(table, item_id)?;
                require_owner(&actor, order)?;
                require_draft(order)?;
                order
                    .take_item(item_id)
                    .ok_or(FarmError::not_found("OrderItem", item_id))
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Item removal rejected"))
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn submit(&self, actor: &Actor, order_id: EntityId) -> FarmResult<Order> {
        let actor = actor.clone();
        let order = self
            .inner
            .transact(move |table| {
                let order = table.require_mut(order_id)?;
                require_owner(&actor, order)?;
                require_draft(order)?;
                if order.items.is_empty() {
                    return Err(FarmError::InvalidState(format!("order {} has no items", order_id)));
                }
                order.date_ordered = Some(Utc::now());
                Ok(order.clone())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Submission rejected"))?;

        info!(order_id, items = order.items.len(), "Order submitted");
        Ok(order)
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn cancel(&self, actor: &Actor, order_id: EntityId) -> FarmResult<Order> {
        let actor = actor.clone();
        let order = self
            .inner
            .transact(move |table| {
                let order = table.require_mut(order_id)?;
                require_owner(&actor, order)?;
                let state = order.state();
                if state.is_terminal() {
                    return Err(FarmError::InvalidState(format!(
                        "order {} is already {:?}",
                        order_id, state
                    )));
                }
                order.canceled = true;
                Ok(order.clone())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Cancellation rejected"))?;

        info!(order_id, "Order canceled");
        Ok(order)
    }

    /// Marks an assigned order fulfilled.
    ///
    /// With strict ownership only the assigned picker or an admin may do
    /// this; otherwise any picker may.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id, strict = self.policy.strict_order_completion))]
    pub async fn complete(&self, actor: &Actor, order_id: EntityId) -> FarmResult<Order> {
        actor
            .require_any(&[Role::Admin, Role::OrderPicker])
            .inspect_err(|e| warn!(error = %e, "Completion rejected"))?;

        let actor = actor.clone();
        let strict = self.policy.strict_order_completion;
        let order = self
            .inner
            .transact(move |table| {
                let order = table.require_mut(order_id)?;
                let state = order.state();
                if state != OrderState::Assigned {
                    return Err(FarmError::InvalidState(format!(
                        "order {} is {:?}, not assigned",
                        order_id, state
                    )));
                }
                if strict && !actor.is_admin() && order.employee_id != Some(actor.profile_id) {
                    return Err(FarmError::Forbidden(format!(
                        "order {} is assigned to another picker",
                        order_id
                    )));
                }
                if order.items.is_empty() {
                    return Err(FarmError::InvalidState(format!("order {} has no items", order_id)));
                }
                order.date_completed = Some(Utc::now());
                Ok(order.clone())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Completion rejected"))?;

        info!(order_id, "Order completed");
        Ok(order)
    }

    /// Customers see only their own orders; employees see all.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn get_order(&self, actor: &Actor, order_id: EntityId) -> FarmResult<Order> {
        debug!("Sending request");
        let order = self
            .inner
            .get(order_id)
            .await?
            .ok_or(FarmError::not_found("Order", order_id))?;
        if !is_employee(actor) {
            require_owner(actor, &order)?;
        }
        Ok(order)
    }

    /// `unassigned_only` keeps submitted orders that no picker holds yet.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn list_orders(&self, actor: &Actor, unassigned_only: bool) -> FarmResult<Vec<Order>> {
        debug!("Sending request");
        let owner = (!is_employee(actor)).then_some(actor.profile_id);
        self.inner
            .list(move |order| {
                owner.map_or(true, |id| order.customer_id == id)
                    && (!unassigned_only || order.is_unassigned())
            })
            .await
    }

    /// The picker's open order, if any.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn picker_assignment(&self, actor: &Actor, picker_id: EntityId) -> FarmResult<Option<Order>> {
        actor.require_any(&[Role::Admin, Role::OrderPicker])?;
        actor.require_self_or_admin(picker_id)?;
        debug!("Sending request");
        self.inner
            .transact(move |table| Ok(open_order_of(table, picker_id).cloned()))
            .await
    }

    /// Total cost of the order, `None` when a variety it references is gone.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn order_cost(&self, actor: &Actor, order_id: EntityId) -> FarmResult<Option<Decimal>> {
        let order = self.get_order(actor, order_id).await?;
        let varieties = self.varieties.all().await?;
        Ok(order_total(&order, &varieties))
    }
}

fn is_employee(actor: &Actor) -> bool {
    [Role::Admin, Role::OrderPicker, Role::Harvester]
        .iter()
        .any(|role| actor.has_role(*role))
}

use crate::actor_framework::EntityId;

/// Payload for opening a new draft order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer_id: EntityId,
}

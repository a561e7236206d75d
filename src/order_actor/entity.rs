use super::dtos::OrderCreate;
use crate::actor_framework::{Entity, EntityId};
use crate::domain::Order;
use crate::error::FarmError;

impl Entity for Order {
    const KIND: &'static str = "Order";
    type CreateParams = OrderCreate;
    type Patch = (); // Lifecycle edits go through transactions
    type Action = ();
    type ActionResult = ();
    type Error = FarmError;

    fn id(&self) -> EntityId {
        self.id
    }

    /// Every order starts life as an empty draft.
    fn from_create_params(id: EntityId, params: OrderCreate) -> Result<Self, FarmError> {
        Ok(Self {
            id,
            customer_id: params.customer_id,
            employee_id: None,
            date_ordered: None,
            date_completed: None,
            canceled: false,
            items: Vec::new(),
        })
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), FarmError> {
        Err(FarmError::InvalidState(format!(
            "order {} only changes through its lifecycle operations",
            self.id
        )))
    }

    /// Orders are never physically deleted.
    fn on_delete(&self) -> Result<(), FarmError> {
        Err(FarmError::InvalidState(format!(
            "order {} cannot be deleted",
            self.id
        )))
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), FarmError> {
        Err(FarmError::InvalidState(format!(
            "order {} has no custom actions",
            self.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::{IdSequence, ResourceActor};

    #[tokio::test]
    async fn test_generic_writes_are_refused() {
        let (actor, client) = ResourceActor::<Order>::new(4, IdSequence::new());
        tokio::spawn(actor.run());

        let id = client.create(OrderCreate { customer_id: 3 }).await.unwrap();
        assert!(matches!(client.update(id, ()).await, Err(FarmError::InvalidState(_))));
        assert!(matches!(client.perform_action(id, ()).await, Err(FarmError::InvalidState(_))));
        assert!(matches!(client.delete(id).await, Err(FarmError::InvalidState(_))));

        let stored = client.get(id).await.unwrap().unwrap();
        assert_eq!(stored.customer_id, 3);
    }
}

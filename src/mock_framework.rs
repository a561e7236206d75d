//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver, then answer the
//! requests it sends with helpers like [`expect_get`] or [`expect_transact`].

use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, EntityId, Filter, ResourceClient, ResourceRequest, Table};

type Responder<R, T> = oneshot::Sender<Result<R, <T as Entity>::Error>>;

/// Creates a client whose requests arrive on the returned receiver instead of
/// a running `ResourceActor`, so the test decides every answer.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Responder<EntityId, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(EntityId, Responder<Option<T>, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Option<Filter<T>>, Responder<Vec<T>, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::List { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(EntityId, T::Action, Responder<T::ActionResult, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Runs the next request, which must be a transaction, against `table`.
/// Returns `false` if something else arrived.
pub async fn expect_transact<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
    table: &mut Table<T>,
) -> bool {
    match receiver.recv().await {
        Some(ResourceRequest::Transact { op }) => {
            op(table);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::IdSequence;
    use crate::domain::Order;
    use crate::error::FarmError;
    use crate::order_actor::OrderCreate;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Order>(10);

        let create_task = tokio::spawn(async move { client.create(OrderCreate { customer_id: 7 }).await });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.customer_id, 7);
        responder.send(Ok(1)).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(1));
    }

    #[tokio::test]
    async fn test_mock_transaction_runs_against_test_table() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let mut table = Table::new(IdSequence::starting_at(40));

        let task = tokio::spawn(async move {
            client
                .transact(|table| {
                    let id = table.insert(OrderCreate { customer_id: 3 })?;
                    Err::<EntityId, _>(FarmError::Conflict(format!("rolled back {}", id)))
                })
                .await
        });

        assert!(expect_transact(&mut receiver, &mut table).await);
        assert_eq!(task.await.unwrap(), Err(FarmError::Conflict("rolled back 40".to_string())));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_mock_list_applies_filter() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let mut table = Table::new(IdSequence::new());
        for customer_id in [1, 2, 1] {
            table.insert(OrderCreate { customer_id }).unwrap();
        }

        let task = tokio::spawn(async move { client.list(|order| order.customer_id == 1).await });

        let (filter, responder) = expect_list(&mut receiver).await.expect("Expected List request");
        let filter = filter.expect("Expected a filter");
        let rows: Vec<Order> = table.values().filter(|order| filter(*order)).cloned().collect();
        responder.send(Ok(rows)).unwrap();

        let ids: Vec<EntityId> = task.await.unwrap().unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_mock_action() {
        use crate::domain::AppleVariety;
        use crate::variety_actor::{VarietyAction, VarietyActionResult};

        let (client, mut receiver) = create_mock_client::<AppleVariety>(10);
        let task = tokio::spawn(async move { client.perform_action(5, VarietyAction::ToggleActive).await });

        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(id, 5);
        assert!(matches!(action, VarietyAction::ToggleActive));
        responder.send(Ok(VarietyActionResult::ToggleActive(false))).unwrap();

        assert_eq!(task.await.unwrap(), Ok(VarietyActionResult::ToggleActive(false)));
    }
}

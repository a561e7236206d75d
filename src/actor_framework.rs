use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Integer key shared by every persisted entity.
pub type EntityId = u32;

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Payloads, and Actions)
// =============================================================================

/// Failures raised by the table actors themselves, independent of any domain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameworkError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: EntityId },
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

/// Trait that any domain entity must implement to be managed by ResourceActor
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human readable entity name used in errors and spans.
    const KIND: &'static str;

    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    fn id(&self) -> EntityId;

    /// Construct the full Entity from the ID and creation parameters
    fn from_create_params(id: EntityId, params: Self::CreateParams) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

/// Monotonic id allocator. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct IdSequence(Arc<AtomicU32>);

impl IdSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: EntityId) -> Self {
        Self(Arc::new(AtomicU32::new(first)))
    }

    pub fn next_id(&self) -> EntityId {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// 2. THE TABLE
// =============================================================================

/// Rows of one entity type, kept in id order.
///
/// A table is only ever touched from inside its owning [`ResourceActor`], so
/// everything a [`Transaction`] does to it happens without interleaving.
#[derive(Debug, Clone)]
pub struct Table<T: Entity> {
    rows: BTreeMap<EntityId, T>,
    ids: IdSequence,
}

impl<T: Entity> Table<T> {
    pub fn new(ids: IdSequence) -> Self {
        Self {
            rows: BTreeMap::new(),
            ids,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn require(&self, id: EntityId) -> Result<&T, FrameworkError> {
        self.rows.get(&id).ok_or(FrameworkError::NotFound { entity: T::KIND, id })
    }

    pub fn require_mut(&mut self, id: EntityId) -> Result<&mut T, FrameworkError> {
        self.rows
            .get_mut(&id)
            .ok_or(FrameworkError::NotFound { entity: T::KIND, id })
    }

    /// Rows in ascending id order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.rows.values().find(|row| predicate(row))
    }

    pub fn insert(&mut self, params: T::CreateParams) -> Result<EntityId, T::Error> {
        let id = self.ids.next_id();
        let mut item = T::from_create_params(id, params)?;
        item.on_create()?;
        self.rows.insert(id, item);
        Ok(id)
    }

    /// Applies the patch to a copy and only stores it once the hook accepts it.
    pub fn update(&mut self, id: EntityId, patch: T::Patch) -> Result<T, T::Error> {
        let mut item = self.require(id)?.clone();
        item.on_update(patch)?;
        self.rows.insert(id, item.clone());
        Ok(item)
    }

    pub fn apply(&mut self, id: EntityId, action: T::Action) -> Result<T::ActionResult, T::Error> {
        let mut item = self.require(id)?.clone();
        let result = item.handle_action(action)?;
        self.rows.insert(id, item);
        Ok(result)
    }

    pub fn remove(&mut self, id: EntityId) -> Result<T, T::Error> {
        self.require(id)?.on_delete()?;
        self.rows
            .remove(&id)
            .ok_or_else(|| FrameworkError::NotFound { entity: T::KIND, id }.into())
    }

    fn snapshot(&self) -> BTreeMap<EntityId, T> {
        self.rows.clone()
    }

    fn restore(&mut self, rows: BTreeMap<EntityId, T>) {
        self.rows = rows;
    }
}

// =============================================================================
// 3. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, E>>;

/// Predicate evaluated inside the actor for filtered listings.
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send>;

/// Work run against the whole table as one unit.
pub type Transaction<T> = Box<dyn FnOnce(&mut Table<T>) + Send>;

pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<EntityId, T::Error>,
    },
    Get {
        id: EntityId,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        filter: Option<Filter<T>>,
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: EntityId,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    Delete {
        id: EntityId,
        respond_to: Response<(), T::Error>,
    },
    Action {
        id: EntityId,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    Transact {
        op: Transaction<T>,
    },
    Shutdown,
}

impl<T: Entity> Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRequest::Create { params, .. } => write!(f, "Create({:?})", params),
            ResourceRequest::Get { id, .. } => write!(f, "Get({})", id),
            ResourceRequest::List { filter, .. } => write!(f, "List(filtered: {})", filter.is_some()),
            ResourceRequest::Update { id, patch, .. } => write!(f, "Update({}, {:?})", id, patch),
            ResourceRequest::Delete { id, .. } => write!(f, "Delete({})", id),
            ResourceRequest::Action { id, action, .. } => write!(f, "Action({}, {:?})", id, action),
            ResourceRequest::Transact { .. } => write!(f, "Transact"),
            ResourceRequest::Shutdown => write!(f, "Shutdown"),
        }
    }
}

// =============================================================================
// 4. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    table: Table<T>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(buffer_size: usize, ids: IdSequence) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            table: Table::new(ids),
        };
        (actor, ResourceClient::new(sender))
    }

    #[instrument(name = "resource_actor", fields(entity = T::KIND), skip(self))]
    pub async fn run(mut self) {
        debug!("Table actor starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.table.insert(params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.table.get(id).cloned()));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let rows = self
                        .table
                        .values()
                        .filter(|row| filter.as_ref().map_or(true, |keep| keep(row)))
                        .cloned()
                        .collect();
                    let _ = respond_to.send(Ok(rows));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.table.update(id, patch));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.table.remove(id).map(|_| ()));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.table.apply(id, action));
                }
                ResourceRequest::Transact { op } => op(&mut self.table),
                ResourceRequest::Shutdown => {
                    debug!("Table actor shutting down");
                    break;
                }
            }
        }

        debug!(rows = self.table.len(), "Table actor stopped");
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<EntityId, T::Error> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn get(&self, id: EntityId) -> Result<Option<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn list(
        &self,
        filter: impl Fn(&T) -> bool + Send + 'static,
    ) -> Result<Vec<T>, T::Error> {
        let filter: Filter<T> = Box::new(filter);
        self.request(|respond_to| ResourceRequest::List {
            filter: Some(filter),
            respond_to,
        })
        .await
    }

    pub async fn all(&self) -> Result<Vec<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::List {
            filter: None,
            respond_to,
        })
        .await
    }

    pub async fn update(&self, id: EntityId, patch: T::Patch) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to })
            .await
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), T::Error> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    pub async fn perform_action(
        &self,
        id: EntityId,
        action: T::Action,
    ) -> Result<T::ActionResult, T::Error> {
        self.request(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }

    /// Runs `op` against the whole table with no other request interleaved.
    ///
    /// If `op` returns an error the table rows are restored to what they were
    /// before it ran, so a rejected transaction leaves nothing behind.
    pub async fn transact<R, F>(&self, op: F) -> Result<R, T::Error>
    where
        R: Send + 'static,
        F: FnOnce(&mut Table<T>) -> Result<R, T::Error> + Send + 'static,
    {
        let (respond_to, response) = oneshot::channel();
        let op: Transaction<T> = Box::new(move |table: &mut Table<T>| {
            let snapshot = table.snapshot();
            let result = op(table);
            if result.is_err() {
                table.restore(snapshot);
            }
            let _ = respond_to.send(result);
        });
        self.sender
            .send(ResourceRequest::Transact { op })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn shutdown(&self) -> Result<(), FrameworkError> {
        self.sender
            .send(ResourceRequest::Shutdown)
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }
}

// =============================================================================
// 6. EXAMPLE USAGE (Test)
// =============================================================================

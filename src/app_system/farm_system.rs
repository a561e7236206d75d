use tracing::{error, info};

use super::config::FarmConfig;
use crate::actor_framework::{IdSequence, ResourceActor, ResourceClient};
use crate::clients::{AssignmentCoordinator, OrderClient, ProfileClient, TreeClient, VarietyClient};
use crate::domain::{AppleVariety, Order, Tree, UserProfile};
use crate::error::{FarmError, FarmResult};

/// The running farm: one table actor per aggregate and the clients wired
/// over them.
pub struct FarmSystem {
    pub profiles: ProfileClient,
    pub varieties: VarietyClient,
    pub trees: TreeClient,
    pub orders: OrderClient,
    pub assignments: AssignmentCoordinator,
    shutdown: Shutdown,
}

/// Raw handles kept only to stop the actors.
struct Shutdown {
    profiles: ResourceClient<UserProfile>,
    varieties: ResourceClient<AppleVariety>,
    trees: ResourceClient<Tree>,
    orders: ResourceClient<Order>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl FarmSystem {
    /// Spawns the table actors. Must be called inside a tokio runtime.
    pub fn new(config: &FarmConfig) -> Self {
        let buffer = config.actors.channel_buffer;
        let policy = config.ownership;
        let scheduler = config.scheduler();

        let (profile_actor, profile_table) = ResourceActor::<UserProfile>::new(buffer, IdSequence::new());
        let (variety_actor, variety_table) = ResourceActor::<AppleVariety>::new(buffer, IdSequence::new());
        let (tree_actor, tree_table) = ResourceActor::<Tree>::new(buffer, IdSequence::new());
        let (order_actor, order_table) = ResourceActor::<Order>::new(buffer, IdSequence::new());

        let handles = vec![
            tokio::spawn(profile_actor.run()),
            tokio::spawn(variety_actor.run()),
            tokio::spawn(tree_actor.run()),
            tokio::spawn(order_actor.run()),
        ];

        // Reports are opened by both the tree client and the coordinator.
        let report_ids = IdSequence::new();

        let profiles = ProfileClient::new(profile_table.clone());
        let varieties = VarietyClient::new(variety_table.clone(), tree_table.clone(), order_table.clone());
        let trees = TreeClient::new(
            tree_table.clone(),
            variety_table.clone(),
            profile_table.clone(),
            report_ids.clone(),
            policy,
            scheduler,
        );
        let orders = OrderClient::new(
            order_table.clone(),
            variety_table.clone(),
            profile_table.clone(),
            IdSequence::new(),
            policy,
        );
        let assignments = AssignmentCoordinator::new(
            order_table.clone(),
            tree_table.clone(),
            profile_table.clone(),
            report_ids,
            scheduler,
        );

        info!(?policy, revisit_days = config.harvest.revisit_days, "Farm system started");

        Self {
            profiles,
            varieties,
            trees,
            orders,
            assignments,
            shutdown: Shutdown {
                profiles: profile_table,
                varieties: variety_table,
                trees: tree_table,
                orders: order_table,
                handles,
            },
        }
    }

    pub async fn shutdown(self) -> FarmResult<()> {
        info!("Shutting down system...");
        let Shutdown {
            profiles,
            varieties,
            trees,
            orders,
            handles,
        } = self.shutdown;

        profiles.shutdown().await?;
        varieties.shutdown().await?;
        trees.shutdown().await?;
        orders.shutdown().await?;

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(FarmError::Unavailable(format!("actor task failed: {}", e)));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use orchard_core::app_system::{setup_tracing, FarmConfig, FarmSystem};
use orchard_core::domain::{Actor, PoundsAdjustment, Role};
use orchard_core::error::FarmResult;
use orchard_core::profile_actor::ProfileCreate;
use orchard_core::variety_actor::VarietyCreate;

const CONFIG_PATH: &str = "orchard.toml";

fn profile(first: &str, email: &str, roles: &[Role]) -> ProfileCreate {
    ProfileCreate {
        first_name: first.to_string(),
        last_name: "Demo".to_string(),
        address: "1 Orchard Rd".to_string(),
        email: email.to_string(),
        roles: roles.iter().copied().collect::<BTreeSet<_>>(),
    }
}

async fn walk_through(system: &FarmSystem) -> FarmResult<()> {
    let admin_id = system.profiles.create_profile(profile("Ada", "ada@orchard", &[Role::Admin])).await?;
    let harvester_id = system
        .profiles
        .create_profile(profile("Hal", "hal@orchard", &[Role::Harvester]))
        .await?;
    let picker_id = system
        .profiles
        .create_profile(profile("Pia", "pia@orchard", &[Role::OrderPicker]))
        .await?;
    let customer_id = system
        .profiles
        .create_profile(profile("Cy", "cy@orchard", &[Role::Customer]))
        .await?;

    let admin = Actor::from(&system.profiles.get_profile(admin_id).await?);
    let harvester = Actor::from(&system.profiles.get_profile(harvester_id).await?);
    let picker = Actor::from(&system.profiles.get_profile(picker_id).await?);
    let customer = Actor::from(&system.profiles.get_profile(customer_id).await?);

    let variety_id = system
        .varieties
        .create_variety(
            &admin,
            VarietyCreate {
                name: "Honeycrisp".to_string(),
                image_url: None,
                cost_per_pound: Decimal::new(249, 2),
            },
        )
        .await?;
    let tree_id = system
        .trees
        .plant_tree(&admin, variety_id, Some(Utc::now() - Duration::days(400)))
        .await?;

    async {
        let now = Utc::now();
        let due = system.trees.trees_needing_harvest(&harvester, now).await?;
        info!(due = due.len(), "Trees due for harvest");

        if let Some(task) = system.assignments.assign_next_harvest(&harvester, harvester_id, now).await? {
            system
                .trees
                .complete_harvest(&harvester, task.id, Decimal::new(120, 0), Some(now))
                .await?;
        }
        let stock = system.varieties.variety_stock(variety_id).await?;
        info!(variety = %stock.variety.name, pounds_on_hand = ?stock.pounds_on_hand, "Stock after harvest");
        let still_due = system.trees.trees_needing_harvest(&harvester, now).await?;
        info!(tree_id, due = still_due.len(), "Trees due after visit");
        FarmResult::Ok(())
    }
    .instrument(tracing::info_span!("harvest"))
    .await?;

    async {
        let draft = system.orders.get_or_create_draft(&customer, customer_id).await?;
        let item = system.orders.add_item(&customer, draft.id, variety_id, Decimal::new(3, 0)).await?;
        system
            .orders
            .adjust_item_pounds(&customer, item.id, PoundsAdjustment::Increase)
            .await?;
        system.orders.submit(&customer, draft.id).await?;

        system.assignments.assign_order(&picker, draft.id, picker_id).await?;
        let order = system.orders.complete(&picker, draft.id).await?;
        let total = system.orders.order_cost(&customer, order.id).await?;
        info!(order_id = order.id, total = ?total, "Order fulfilled");

        let stock = system.varieties.variety_stock(variety_id).await?;
        info!(pounds_on_hand = ?stock.pounds_on_hand, "Stock after order");
        FarmResult::Ok(())
    }
    .instrument(tracing::info_span!("order"))
    .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = FarmConfig::load(CONFIG_PATH)?.with_env_overrides()?;
    info!(?config, "Starting orchard system");

    let system = FarmSystem::new(&config);

    if let Err(e) = walk_through(&system).await {
        error!(error = %e, "Walk-through failed");
    }

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}

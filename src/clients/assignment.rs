//! One open task per employee, for order picking and for harvesting alike.
//!
//! Every check-then-set below runs inside a single table transaction, so two
//! assignments racing for the same employee are serialized by the table actor
//! and the loser sees the winner's write.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{EntityId, IdSequence, ResourceClient, Table};
use crate::domain::{Actor, Order, OrderState, Role, Tree, TreeHarvestReport, UserProfile};
use crate::error::{FarmError, FarmResult};
use crate::harvest_schedule::HarvestScheduler;

/// The employee's open order, if any.
pub fn open_order_of(orders: &Table<Order>, employee_id: EntityId) -> Option<&Order> {
    orders.find(|order| order.is_open_assignment_of(employee_id))
}

/// The harvester's open report, if any.
pub fn open_harvest_task_of(trees: &Table<Tree>, harvester_id: EntityId) -> Option<&TreeHarvestReport> {
    trees
        .values()
        .flat_map(|tree| tree.harvest_reports.iter())
        .find(|report| report.is_open() && report.employee_id == harvester_id)
}

pub(crate) fn already_holds(kind: &str, employee_id: EntityId, task_id: EntityId) -> FarmError {
    FarmError::Conflict(format!(
        "employee {} already holds open {} {}",
        employee_id, kind, task_id
    ))
}

/// Opens a report for `harvester_id` on `tree_id` inside a tree transaction.
fn claim_in(
    table: &mut Table<Tree>,
    report_ids: &IdSequence,
    tree_id: EntityId,
    harvester_id: EntityId,
) -> FarmResult<TreeHarvestReport> {
    if let Some(held) = open_harvest_task_of(table, harvester_id) {
        return Err(already_holds("harvest task", harvester_id, held.id));
    }
    let tree = table.require_mut(tree_id)?;
    if !tree.is_standing() {
        return Err(FarmError::InvalidState(format!("tree {} has been removed", tree_id)));
    }
    if let Some(open) = tree.open_report() {
        return Err(FarmError::Conflict(format!(
            "tree {} is already claimed by employee {}",
            tree_id, open.employee_id
        )));
    }
    let report = TreeHarvestReport {
        id: report_ids.next_id(),
        tree_id,
        employee_id: harvester_id,
        harvest_date: None,
        pounds_harvested: None,
    };
    tree.harvest_reports.push(report.clone());
    Ok(report)
}

#[derive(Clone)]
pub struct AssignmentCoordinator {
    orders: ResourceClient<Order>,
    trees: ResourceClient<Tree>,
    profiles: ResourceClient<UserProfile>,
    report_ids: IdSequence,
    scheduler: HarvestScheduler,
}

impl AssignmentCoordinator {
    pub fn new(
        orders: ResourceClient<Order>,
        trees: ResourceClient<Tree>,
        profiles: ResourceClient<UserProfile>,
        report_ids: IdSequence,
        scheduler: HarvestScheduler,
    ) -> Self {
        Self {
            orders,
            trees,
            profiles,
            report_ids,
            scheduler,
        }
    }

    async fn require_employee(&self, employee_id: EntityId) -> FarmResult<UserProfile> {
        self.profiles
            .get(employee_id)
            .await?
            .ok_or(FarmError::not_found("UserProfile", employee_id))
    }

    /// Pickers may only act for themselves; admins may act for anyone.
    fn check_picker(actor: &Actor, employee_id: EntityId) -> FarmResult<()> {
        actor.require_any(&[Role::Admin, Role::OrderPicker])?;
        actor.require_self_or_admin(employee_id)
    }

    fn check_harvester(actor: &Actor, harvester_id: EntityId) -> FarmResult<()> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        actor.require_self_or_admin(harvester_id)
    }

    // ---------------------------------------------------------------------
    // Order picking
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn assign_order(
        &self,
        actor: &Actor,
        order_id: EntityId,
        employee_id: EntityId,
    ) -> FarmResult<Order> {
        Self::check_picker(actor, employee_id)
            .inspect_err(|e| warn!(error = %e, "Assignment rejected"))?;
        let employee = self.require_employee(employee_id).await?;
        debug!(employee = %employee.full_name(), "Employee validation successful");

        let order = self
            .orders
            .transact(move |table| {
                table.require(order_id)?;
                if let Some(held) = open_order_of(table, employee_id) {
                    return Err(already_holds("order", employee_id, held.id));
                }
                let order = table.require_mut(order_id)?;
                match order.state() {
                    OrderState::Submitted => {}
                    OrderState::Assigned => {
                        return Err(FarmError::Conflict(format!(
                            "order {} is already assigned",
                            order_id
                        )))
                    }
                    state => {
                        return Err(FarmError::InvalidState(format!(
                            "order {} is {:?}, not submitted",
                            order_id, state
                        )))
                    }
                }
                order.employee_id = Some(employee_id);
                Ok(order.clone())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Assignment rejected"))?;

        info!(order_id, employee_id, "Order assigned");
        Ok(order)
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn unassign_order(
        &self,
        actor: &Actor,
        order_id: EntityId,
        employee_id: EntityId,
    ) -> FarmResult<Order> {
        Self::check_picker(actor, employee_id)
            .inspect_err(|e| warn!(error = %e, "Unassignment rejected"))?;
        self.require_employee(employee_id).await?;

        let order = self
            .orders
            .transact(move |table| {
                table.require(order_id)?;
                let held = open_order_of(table, employee_id)
                    .map(|order| order.id)
                    .ok_or(FarmError::not_found("open order", employee_id))?;
                if held != order_id {
                    return Err(FarmError::Conflict(format!(
                        "employee {} holds order {}, not order {}",
                        employee_id, held, order_id
                    )));
                }
                let order = table.require_mut(order_id)?;
                order.employee_id = None;
                Ok(order.clone())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Unassignment rejected"))?;

        info!(order_id, employee_id, "Order unassigned");
        Ok(order)
    }

    // ---------------------------------------------------------------------
    // Harvesting
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn claim_harvest_task(
        &self,
        actor: &Actor,
        tree_id: EntityId,
        harvester_id: EntityId,
    ) -> FarmResult<TreeHarvestReport> {
        Self::check_harvester(actor, harvester_id)
            .inspect_err(|e| warn!(error = %e, "Claim rejected"))?;
        self.require_employee(harvester_id).await?;

        let report_ids = self.report_ids.clone();
        let report = self
            .trees
            .transact(move |table| {
                table.require(tree_id)?;
                claim_in(table, &report_ids, tree_id, harvester_id)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Claim rejected"))?;

        info!(tree_id, report_id = report.id, harvester_id, "Harvest task claimed");
        Ok(report)
    }

    /// Drops the harvester's open report, returning the tree to unclaimed.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn release_harvest_task(
        &self,
        actor: &Actor,
        report_id: EntityId,
        harvester_id: EntityId,
    ) -> FarmResult<TreeHarvestReport> {
        Self::check_harvester(actor, harvester_id)
            .inspect_err(|e| warn!(error = %e, "Release rejected"))?;
        self.require_employee(harvester_id).await?;

        let report = self
            .trees
            .transact(move |table| {
                let held = open_harvest_task_of(table, harvester_id)
                    .map(|report| (report.id, report.tree_id))
                    .ok_or(FarmError::not_found("open harvest task", harvester_id))?;
                if held.0 != report_id {
                    return Err(FarmError::Conflict(format!(
                        "employee {} holds report {}, not report {}",
                        harvester_id, held.0, report_id
                    )));
                }
                table
                    .require_mut(held.1)?
                    .take_report(report_id)
                    .ok_or(FarmError::not_found("TreeHarvestReport", report_id))
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Release rejected"))?;

        info!(report_id, harvester_id, "Harvest task released");
        Ok(report)
    }

    /// Claims the lowest-id due tree for the harvester, or returns `None` when
    /// nothing is due as of `as_of`.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn assign_next_harvest(
        &self,
        actor: &Actor,
        harvester_id: EntityId,
        as_of: DateTime<Utc>,
    ) -> FarmResult<Option<TreeHarvestReport>> {
        Self::check_harvester(actor, harvester_id)
            .inspect_err(|e| warn!(error = %e, "Scheduling rejected"))?;
        self.require_employee(harvester_id).await?;

        let scheduler = self.scheduler;
        let report_ids = self.report_ids.clone();
        let report = self
            .trees
            .transact(move |table| {
                if let Some(held) = open_harvest_task_of(table, harvester_id) {
                    return Err(already_holds("harvest task", harvester_id, held.id));
                }
                match scheduler.next_due(table.values(), as_of).map(|tree| tree.id) {
                    Some(tree_id) => claim_in(table, &report_ids, tree_id, harvester_id).map(Some),
                    None => Ok(None),
                }
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Scheduling rejected"))?;

        match &report {
            Some(report) => info!(tree_id = report.tree_id, report_id = report.id, "Next harvest scheduled"),
            None => info!("No tree is due for harvest"),
        }
        Ok(report)
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn current_harvest_task(
        &self,
        actor: &Actor,
        harvester_id: EntityId,
    ) -> FarmResult<Option<TreeHarvestReport>> {
        Self::check_harvester(actor, harvester_id)?;
        debug!("Sending request");
        self.trees
            .transact(move |table| Ok(open_harvest_task_of(table, harvester_id).cloned()))
            .await
    }
}

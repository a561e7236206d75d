use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::assignment::{already_holds, open_harvest_task_of};
use crate::actor_framework::{EntityId, IdSequence, ResourceClient, Table};
use crate::app_system::OwnershipPolicy;
use crate::domain::{Actor, AppleVariety, Pounds, Role, Tree, TreeHarvestReport, UserProfile};
use crate::error::{FarmError, FarmResult};
use crate::harvest_schedule::HarvestScheduler;
use crate::tree_actor::{ReportPatch, TreeAction, TreeActionResult, TreeCreate, TreePatch};

/// Client for trees and the harvest reports they own.
#[derive(Clone)]
pub struct TreeClient {
    inner: ResourceClient<Tree>,
    varieties: ResourceClient<AppleVariety>,
    profiles: ResourceClient<UserProfile>,
    report_ids: IdSequence,
    policy: OwnershipPolicy,
    scheduler: HarvestScheduler,
}

impl_gated_client_methods!(TreeClient, Tree, tree, trees, roles = [Role::Admin, Role::Harvester]);

fn validate_pounds(pounds: Pounds) -> FarmResult<Pounds> {
    if pounds < Decimal::ZERO {
        return Err(FarmError::ValidationError(format!(
            "harvested pounds cannot be negative, got {}",
            pounds
        )));
    }
    Ok(pounds)
}

/// The tree holding `report_id`.
fn tree_of_report(table: &mut Table<Tree>, report_id: EntityId) -> FarmResult<&mut Tree> {
    table
        .values_mut()
        .find(|tree| tree.report(report_id).is_some())
        .ok_or(FarmError::not_found("TreeHarvestReport", report_id))
}

fn require_report_owner(actor: &Actor, report: &TreeHarvestReport) -> FarmResult<()> {
    actor.require_self_or_admin(report.employee_id).map_err(|_| {
        FarmError::Forbidden(format!(
            "report {} belongs to employee {}",
            report.id, report.employee_id
        ))
    })
}

impl TreeClient {
    pub fn new(
        inner: ResourceClient<Tree>,
        varieties: ResourceClient<AppleVariety>,
        profiles: ResourceClient<UserProfile>,
        report_ids: IdSequence,
        policy: OwnershipPolicy,
        scheduler: HarvestScheduler,
    ) -> Self {
        Self {
            inner,
            varieties,
            profiles,
            report_ids,
            policy,
            scheduler,
        }
    }

    async fn require_variety(&self, variety_id: EntityId) -> FarmResult<AppleVariety> {
        self.varieties
            .get(variety_id)
            .await?
            .ok_or(FarmError::not_found("AppleVariety", variety_id))
    }

    async fn require_employee(&self, employee_id: EntityId) -> FarmResult<UserProfile> {
        self.profiles
            .get(employee_id)
            .await?
            .ok_or(FarmError::not_found("UserProfile", employee_id))
    }

    // ---------------------------------------------------------------------
    // Trees
    // ---------------------------------------------------------------------

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn plant_tree(
        &self,
        actor: &Actor,
        variety_id: EntityId,
        date_planted: Option<DateTime<Utc>>,
    ) -> FarmResult<EntityId> {
        actor
            .require_any(&[Role::Admin])
            .inspect_err(|e| warn!(error = %e, "Planting rejected"))?;
        let variety = self.require_variety(variety_id).await?;

        let id = self
            .inner
            .create(TreeCreate {
                variety_id,
                date_planted: date_planted.unwrap_or_else(Utc::now),
            })
            .await?;
        info!(tree_id = id, variety = %variety.name, "Tree planted");
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn update_tree(&self, actor: &Actor, id: EntityId, patch: TreePatch) -> FarmResult<Tree> {
        actor.require_any(&[Role::Admin])?;
        if let Some(variety_id) = patch.variety_id {
            self.require_variety(variety_id).await?;
        }
        debug!("Sending request");
        self.inner.update(id, patch).await
    }

    /// Takes the tree out of service. It is never due for harvest again.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn remove_tree(
        &self,
        actor: &Actor,
        id: EntityId,
        at: Option<DateTime<Utc>>,
    ) -> FarmResult<DateTime<Utc>> {
        actor.require_any(&[Role::Admin])?;
        let at = at.unwrap_or_else(Utc::now);
        let TreeActionResult::Remove(removed) = self
            .inner
            .perform_action(id, TreeAction::Remove { at })
            .await
            .inspect_err(|e| warn!(error = %e, "Removal rejected"))?;
        info!(tree_id = id, %removed, "Tree removed");
        Ok(removed)
    }

    /// Deletes a tree that has no harvest history. Trees with reports are
    /// removed with [`TreeClient::remove_tree`] instead.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn delete_tree(&self, actor: &Actor, id: EntityId) -> FarmResult<()> {
        actor
            .require_any(&[Role::Admin])
            .inspect_err(|e| warn!(error = %e, "Tree deletion rejected"))?;
        debug!("Sending request");

        self.inner
            .transact(move |table| {
                let reports = table.require(id)?.harvest_reports.len();
                if reports > 0 {
                    return Err(FarmError::Conflict(format!(
                        "tree {} has {} harvest reports",
                        id, reports
                    )));
                }
                table.remove(id).map(|_| ())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Tree deletion rejected"))?;

        info!(tree_id = id, "Tree deleted");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn trees_needing_harvest(&self, actor: &Actor, as_of: DateTime<Utc>) -> FarmResult<Vec<Tree>> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        debug!("Sending request");
        let scheduler = self.scheduler;
        self.inner
            .list(move |tree| scheduler.tree_needs_harvest(tree, as_of))
            .await
    }

    // ---------------------------------------------------------------------
    // Harvest reports
    // ---------------------------------------------------------------------

    /// Closes the harvester's open report with the weight picked.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn complete_harvest(
        &self,
        actor: &Actor,
        report_id: EntityId,
        pounds: Pounds,
        harvest_date: Option<DateTime<Utc>>,
    ) -> FarmResult<TreeHarvestReport> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        let pounds = validate_pounds(pounds)?;
        let harvest_date = harvest_date.unwrap_or_else(Utc::now);

        let actor = actor.clone();
        let report = self
            .inner
            .transact(move |table| {
                let report = tree_of_report(table, report_id)?
                    .report_mut(report_id)
                    .ok_or(FarmError::not_found("TreeHarvestReport", report_id))?;
                require_report_owner(&actor, report)?;
                if !report.is_open() {
                    return Err(FarmError::InvalidState(format!(
                        "report {} was already completed",
                        report_id
                    )));
                }
                report.harvest_date = Some(harvest_date);
                report.pounds_harvested = Some(pounds);
                Ok(report.clone())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Harvest completion rejected"))?;

        info!(report_id, tree_id = report.tree_id, %pounds, "Harvest completed");
        Ok(report)
    }

    /// Files a harvest that already happened as a completed report.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn record_harvest(
        &self,
        actor: &Actor,
        tree_id: EntityId,
        employee_id: EntityId,
        harvest_date: DateTime<Utc>,
        pounds: Pounds,
    ) -> FarmResult<TreeHarvestReport> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        actor.require_self_or_admin(employee_id)?;
        let pounds = validate_pounds(pounds)?;
        self.require_employee(employee_id).await?;

        let report_ids = self.report_ids.clone();
        let report = self
            .inner
            .transact(move |table| {
                let tree = table.require_mut(tree_id)?;
                if !tree.is_standing() {
                    return Err(FarmError::InvalidState(format!("tree {} has been removed", tree_id)));
                }
                let report = TreeHarvestReport {
                    id: report_ids.next_id(),
                    tree_id,
                    employee_id,
                    harvest_date: Some(harvest_date),
                    pounds_harvested: Some(pounds),
                };
                tree.harvest_reports.push(report.clone());
                Ok(report)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Harvest record rejected"))?;

        info!(report_id = report.id, tree_id, %pounds, "Harvest recorded");
        Ok(report)
    }

    /// Edits a report's fields.
    ///
    /// Strict ownership limits this to the report's employee or an admin.
    /// Only admins may hand a report to another employee; an open report
    /// cannot move to someone who already holds an open task.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id, strict = self.policy.strict_report_edit))]
    pub async fn edit_harvest_report(
        &self,
        actor: &Actor,
        report_id: EntityId,
        patch: ReportPatch,
    ) -> FarmResult<TreeHarvestReport> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        if let Some(pounds) = patch.pounds_harvested {
            validate_pounds(pounds)?;
        }
        if let Some(employee_id) = patch.employee_id {
            self.require_employee(employee_id).await?;
        }

        let actor = actor.clone();
        let strict = self.policy.strict_report_edit;
        let report = self
            .inner
            .transact(move |table| {
                let current = tree_of_report(table, report_id)?
                    .report(report_id)
                    .cloned()
                    .ok_or(FarmError::not_found("TreeHarvestReport", report_id))?;
                if strict {
                    require_report_owner(&actor, &current)?;
                }

                let mut edited = current.clone();
                if let Some(employee_id) = patch.employee_id.filter(|id| *id != current.employee_id) {
                    if !actor.is_admin() {
                        return Err(FarmError::Forbidden(
                            "only an admin may reassign a harvest report".to_string(),
                        ));
                    }
                    edited.employee_id = employee_id;
                }
                if let Some(date) = patch.harvest_date {
                    edited.harvest_date = Some(date);
                }
                if let Some(pounds) = patch.pounds_harvested {
                    edited.pounds_harvested = Some(pounds);
                }

                if edited.is_open() && edited.employee_id != current.employee_id {
                    if let Some(held) = open_harvest_task_of(table, edited.employee_id) {
                        return Err(already_holds("harvest task", edited.employee_id, held.id));
                    }
                }

                let slot = tree_of_report(table, report_id)?
                    .report_mut(report_id)
                    .ok_or(FarmError::not_found("TreeHarvestReport", report_id))?;
                *slot = edited.clone();
                Ok(edited)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Report edit rejected"))?;

        info!(report_id, employee_id = report.employee_id, "Harvest report edited");
        Ok(report)
    }

    /// Deletes an open report. Only its employee or an admin may.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn delete_harvest_report(&self, actor: &Actor, report_id: EntityId) -> FarmResult<()> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        let actor = actor.clone();
        self.inner
            .transact(move |table| {
                let tree = tree_of_report(table, report_id)?;
                let report = tree
                    .report(report_id)
                    .ok_or(FarmError::not_found("TreeHarvestReport", report_id))?;
                require_report_owner(&actor, report)?;
                if !report.is_open() {
                    return Err(FarmError::InvalidState(format!(
                        "report {} is completed and cannot be deleted",
                        report_id
                    )));
                }
                tree.take_report(report_id);
                Ok(())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Report deletion rejected"))?;

        info!(report_id, "Harvest report deleted");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn get_harvest_report(&self, actor: &Actor, report_id: EntityId) -> FarmResult<TreeHarvestReport> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        debug!("Sending request");
        self.inner
            .list(move |tree| tree.report(report_id).is_some())
            .await?
            .into_iter()
            .find_map(|tree| tree.report(report_id).cloned())
            .ok_or(FarmError::not_found("TreeHarvestReport", report_id))
    }

    /// Reports in id order, optionally for one tree.
    #[instrument(skip(self, actor), fields(actor = actor.profile_id))]
    pub async fn list_harvest_reports(
        &self,
        actor: &Actor,
        tree_id: Option<EntityId>,
    ) -> FarmResult<Vec<TreeHarvestReport>> {
        actor.require_any(&[Role::Admin, Role::Harvester])?;
        debug!("Sending request");
        let trees = match tree_id {
            Some(id) => vec![self.get_tree(actor, id).await?],
            None => self.inner.all().await?,
        };
        let mut reports: Vec<TreeHarvestReport> =
            trees.into_iter().flat_map(|tree| tree.harvest_reports).collect();
        reports.sort_by_key(|report| report.id);
        Ok(reports)
    }
}

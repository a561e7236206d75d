use chrono::{DateTime, Utc};

use crate::actor_framework::EntityId;
use crate::domain::Pounds;

/// A planted tree together with its harvest history.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub id: EntityId,
    pub variety_id: EntityId,
    pub date_planted: DateTime<Utc>,
    pub date_removed: Option<DateTime<Utc>>,
    /// Kept in ascending id order.
    pub harvest_reports: Vec<TreeHarvestReport>,
}

/// One harvest visit. `harvest_date == None` means the visit is assigned but
/// not yet performed: an open task held by `employee_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeHarvestReport {
    pub id: EntityId,
    pub tree_id: EntityId,
    pub employee_id: EntityId,
    pub harvest_date: Option<DateTime<Utc>>,
    pub pounds_harvested: Option<Pounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestTaskState {
    Unclaimed,
    Claimed { report_id: EntityId, employee_id: EntityId },
}

impl Tree {
    pub fn is_standing(&self) -> bool {
        self.date_removed.is_none()
    }

    /// Highest report id stands in for the most recent visit.
    pub fn latest_report(&self) -> Option<&TreeHarvestReport> {
        self.harvest_reports.iter().max_by_key(|report| report.id)
    }

    pub fn open_report(&self) -> Option<&TreeHarvestReport> {
        self.harvest_reports.iter().find(|report| report.is_open())
    }

    pub fn task_state(&self) -> HarvestTaskState {
        match self.open_report() {
            Some(report) => HarvestTaskState::Claimed {
                report_id: report.id,
                employee_id: report.employee_id,
            },
            None => HarvestTaskState::Unclaimed,
        }
    }

    pub fn report(&self, report_id: EntityId) -> Option<&TreeHarvestReport> {
        self.harvest_reports.iter().find(|report| report.id == report_id)
    }

    pub fn report_mut(&mut self, report_id: EntityId) -> Option<&mut TreeHarvestReport> {
        self.harvest_reports.iter_mut().find(|report| report.id == report_id)
    }

    pub fn take_report(&mut self, report_id: EntityId) -> Option<TreeHarvestReport> {
        let position = self.harvest_reports.iter().position(|r| r.id == report_id)?;
        Some(self.harvest_reports.remove(position))
    }
}

impl TreeHarvestReport {
    pub fn is_open(&self) -> bool {
        self.harvest_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: EntityId, employee_id: EntityId, done: bool) -> TreeHarvestReport {
        TreeHarvestReport {
            id,
            tree_id: 1,
            employee_id,
            harvest_date: done.then(Utc::now),
            pounds_harvested: None,
        }
    }

    #[test]
    fn test_latest_report_is_highest_id() {
        let tree = Tree {
            id: 1,
            variety_id: 1,
            date_planted: Utc::now(),
            date_removed: None,
            harvest_reports: vec![report(7, 2, true), report(3, 2, true)],
        };
        assert_eq!(tree.latest_report().map(|r| r.id), Some(7));
        assert_eq!(tree.task_state(), HarvestTaskState::Unclaimed);
    }

    #[test]
    fn test_open_report_marks_tree_claimed() {
        let mut tree = Tree {
            id: 1,
            variety_id: 1,
            date_planted: Utc::now(),
            date_removed: None,
            harvest_reports: vec![report(1, 2, true), report(2, 5, false)],
        };
        assert_eq!(
            tree.task_state(),
            HarvestTaskState::Claimed { report_id: 2, employee_id: 5 }
        );

        let taken = tree.take_report(2).map(|r| r.employee_id);
        assert_eq!(taken, Some(5));
        assert_eq!(tree.task_state(), HarvestTaskState::Unclaimed);
    }
}

//! Harvest-due decisions, computed on read from a tree's report history.

use chrono::{DateTime, Duration, Utc};

use crate::domain::Tree;

pub const DEFAULT_REVISIT_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestScheduler {
    revisit_interval: Duration,
}

impl HarvestScheduler {
    pub fn new(revisit_days: u32) -> Self {
        Self {
            revisit_interval: Duration::days(i64::from(revisit_days)),
        }
    }

    pub fn revisit_interval(&self) -> Duration {
        self.revisit_interval
    }

    /// A standing tree is due when it was never harvested or when its latest
    /// report (highest id) was harvested at least one interval before `as_of`.
    /// A latest report that is still open is a visit in progress, so the tree
    /// is not due.
    pub fn tree_needs_harvest(&self, tree: &Tree, as_of: DateTime<Utc>) -> bool {
        if !tree.is_standing() {
            return false;
        }
        match tree.latest_report() {
            None => true,
            Some(report) => report
                .harvest_date
                .is_some_and(|harvested| harvested <= as_of - self.revisit_interval),
        }
    }

    /// Due trees in the order given.
    pub fn due_trees<'a>(
        &self,
        trees: impl IntoIterator<Item = &'a Tree>,
        as_of: DateTime<Utc>,
    ) -> Vec<&'a Tree> {
        trees
            .into_iter()
            .filter(|tree| self.tree_needs_harvest(tree, as_of))
            .collect()
    }

    /// The lowest-id due tree with no open report.
    pub fn next_due<'a>(
        &self,
        trees: impl IntoIterator<Item = &'a Tree>,
        as_of: DateTime<Utc>,
    ) -> Option<&'a Tree> {
        trees
            .into_iter()
            .filter(|tree| tree.open_report().is_none() && self.tree_needs_harvest(tree, as_of))
            .min_by_key(|tree| tree.id)
    }
}

impl Default for HarvestScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REVISIT_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::EntityId;
    use crate::domain::TreeHarvestReport;

    fn standing(id: EntityId) -> Tree {
        Tree {
            id,
            variety_id: 1,
            date_planted: Utc::now() - Duration::days(365),
            date_removed: None,
            harvest_reports: Vec::new(),
        }
    }

    fn harvested(tree: &mut Tree, report_id: EntityId, at: Option<DateTime<Utc>>) {
        tree.harvest_reports.push(TreeHarvestReport {
            id: report_id,
            tree_id: tree.id,
            employee_id: 2,
            harvest_date: at,
            pounds_harvested: None,
        });
    }

    #[test]
    fn test_due_cycle_over_eight_days() {
        let scheduler = HarvestScheduler::default();
        let today = Utc::now();
        let mut tree = standing(1);

        assert!(scheduler.tree_needs_harvest(&tree, today));

        harvested(&mut tree, 1, Some(today));
        assert!(!scheduler.tree_needs_harvest(&tree, today));
        assert!(!scheduler.tree_needs_harvest(&tree, today + Duration::days(6)));
        assert!(scheduler.tree_needs_harvest(&tree, today + Duration::days(7)));
        assert!(scheduler.tree_needs_harvest(&tree, today + Duration::days(8)));

        tree.date_removed = Some(today);
        assert!(!scheduler.tree_needs_harvest(&tree, today + Duration::days(8)));
        assert!(!scheduler.tree_needs_harvest(&tree, today + Duration::days(800)));
    }

    #[test]
    fn test_latest_report_is_chosen_by_id() {
        let scheduler = HarvestScheduler::default();
        let today = Utc::now();
        let mut tree = standing(1);
        harvested(&mut tree, 9, Some(today));
        harvested(&mut tree, 4, Some(today - Duration::days(30)));
        assert!(!scheduler.tree_needs_harvest(&tree, today));
    }

    #[test]
    fn test_open_visit_is_not_due() {
        let scheduler = HarvestScheduler::new(3);
        let today = Utc::now();
        let mut tree = standing(1);
        harvested(&mut tree, 1, Some(today - Duration::days(20)));
        harvested(&mut tree, 2, None);
        assert!(!scheduler.tree_needs_harvest(&tree, today));
    }

    #[test]
    fn test_next_due_skips_claimed_and_removed() {
        let scheduler = HarvestScheduler::default();
        let today = Utc::now();

        let mut removed = standing(1);
        removed.date_removed = Some(today);
        let mut recent = standing(2);
        harvested(&mut recent, 1, Some(today));
        let fresh = standing(3);
        let other = standing(4);

        let trees = vec![other, removed, recent, fresh];
        assert_eq!(scheduler.next_due(&trees, today).map(|t| t.id), Some(3));
        assert_eq!(
            scheduler.due_trees(&trees, today).iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![4, 3]
        );
    }
}

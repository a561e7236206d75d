use chrono::{DateTime, Utc};

use crate::actor_framework::EntityId;
use crate::domain::Pounds;

#[derive(Debug, Clone)]
pub struct TreeCreate {
    pub variety_id: EntityId,
    pub date_planted: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TreePatch {
    pub variety_id: Option<EntityId>,
    pub date_planted: Option<DateTime<Utc>>,
}

/// Edits to a harvest report. Moving a report to another employee is
/// reserved for admins.
#[derive(Debug, Clone, Default)]
pub struct ReportPatch {
    pub employee_id: Option<EntityId>,
    pub harvest_date: Option<DateTime<Utc>>,
    pub pounds_harvested: Option<Pounds>,
}

//! Record admission: project filter plus category classifier.

use finplan_core::classifier::CategoryClassifier;
use finplan_core::data_processors::{first_of, project_id_candidates, PROJECT_ACCESSORS};
use serde_json::Value;
use tracing::trace;

use crate::accumulator::SourceStats;

/// Which of a record's project ids a filter compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum IdMatch {
    /// Any id variant (explicit id, code, partition key).
    #[default]
    AnyVariant,
    /// Only the id the record resolves to first.
    Primary,
}

/// Restricts builders to one project, or admits every project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFilter<'a> {
    project_id: Option<&'a str>,
    id_match: IdMatch,
}

impl<'a> ProjectFilter<'a> {
    /// A blank id is treated as "all projects".
    pub fn new(project_id: Option<&'a str>) -> Self {
        Self {
            project_id: project_id.map(str::trim).filter(|id| !id.is_empty()),
            id_match: IdMatch::AnyVariant,
        }
    }

    /// Match on the primary project id only, so that a record lands in
    /// exactly one project when the filter is run once per distinct id.
    pub fn primary(project_id: &'a str) -> Self {
        Self {
            id_match: IdMatch::Primary,
            ..Self::new(Some(project_id))
        }
    }

    /// Aggregate mode: every record passes, including records with no
    /// resolvable project.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn project_id(&self) -> Option<&'a str> {
        self.project_id
    }

    pub fn is_aggregate(&self) -> bool {
        self.project_id.is_none()
    }

    /// Whether `record` belongs to the filtered project.
    ///
    /// By default every known project-id variant on the record is compared,
    /// so a record identified only by code or by partition key still matches.
    /// A [`primary`](Self::primary) filter compares the first resolved id.
    pub fn admits(&self, record: &Value) -> bool {
        let Some(id) = self.project_id else {
            return true;
        };
        match self.id_match {
            IdMatch::AnyVariant => project_id_candidates(record).iter().any(|candidate| candidate == id),
            IdMatch::Primary => first_of(record, PROJECT_ACCESSORS).as_deref() == Some(id),
        }
    }
}

/// Apply the project filter then the classifier, counting rejections.
pub(crate) fn admit(
    record: &Value,
    filter: ProjectFilter<'_>,
    classifier: &dyn CategoryClassifier,
    stats: &mut SourceStats,
) -> bool {
    stats.seen += 1;
    if !filter.admits(record) {
        stats.excluded_by_project += 1;
        trace!("record excluded by project filter");
        return false;
    }
    if !classifier.matches(record) {
        stats.excluded_by_category += 1;
        trace!("record excluded by category classifier");
        return false;
    }
    true
}

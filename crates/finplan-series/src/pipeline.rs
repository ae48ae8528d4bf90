//! Top-level pipeline: four record arrays in, one monthly series out.
//!
//! Pure and synchronous. Nothing here reads files, holds state between calls
//! or returns an error; malformed records simply contribute nothing.

use std::collections::{BTreeMap, BTreeSet};

use finplan_core::classifier::{CategoryClassifier, KeywordClassifier};
use finplan_core::data_processors::{first_of, PROJECT_ACCESSORS};
use finplan_core::models::{AdjustmentPolicy, MonthlyPoint, SeriesTotals};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::accumulator::SourceStats;
use crate::adjustments::build_adjusted_series;
use crate::allocations::build_allocation_series;
use crate::filter::ProjectFilter;
use crate::merger::merge_series;
use crate::realized::build_realized_series;

/// The four raw record arrays the pipeline consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesInputs<'a> {
    pub realized: &'a [Value],
    pub allocations: &'a [Value],
    pub adjustments: &'a [Value],
    pub baseline: &'a [Value],
}

impl<'a> SeriesInputs<'a> {
    fn all_records(self) -> impl Iterator<Item = &'a Value> {
        self.realized
            .iter()
            .chain(self.allocations)
            .chain(self.adjustments)
            .chain(self.baseline)
    }
}

/// Knobs beyond the inputs themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesOptions<'a> {
    /// `None` (or blank) aggregates across all projects.
    pub project_id: Option<&'a str>,
    pub policy: AdjustmentPolicy,
}

/// Per-source bookkeeping of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStats {
    pub realized: SourceStats,
    pub allocations: SourceStats,
    pub baseline: SourceStats,
    pub adjustments: SourceStats,
}

/// Points, totals and statistics of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub points: Vec<MonthlyPoint>,
    pub totals: SeriesTotals,
    pub stats: SeriesStats,
}

/// Build the monthly series.
///
/// `classifier` defaults to the direct-labor (MOD) keyword classifier.
/// Adjustments without an explicit kind are inferred, defaulting to delta.
pub fn build_monthly_series(
    inputs: SeriesInputs<'_>,
    project_id: Option<&str>,
    classifier: Option<&dyn CategoryClassifier>,
) -> Vec<MonthlyPoint> {
    let default_classifier;
    let classifier: &dyn CategoryClassifier = match classifier {
        Some(c) => c,
        None => {
            default_classifier = KeywordClassifier::default();
            &default_classifier
        }
    };
    let options = SeriesOptions {
        project_id,
        policy: AdjustmentPolicy::Infer,
    };
    build_series_report(inputs, options, classifier).points
}

/// Build the monthly series together with totals and statistics.
pub fn build_series_report(
    inputs: SeriesInputs<'_>,
    options: SeriesOptions<'_>,
    classifier: &dyn CategoryClassifier,
) -> SeriesReport {
    let filter = ProjectFilter::new(options.project_id);
    filtered_report(inputs, filter, options.policy, classifier)
}

fn filtered_report(
    inputs: SeriesInputs<'_>,
    filter: ProjectFilter<'_>,
    policy: AdjustmentPolicy,
    classifier: &dyn CategoryClassifier,
) -> SeriesReport {
    let actual = build_realized_series(inputs.realized, filter, classifier);
    let allocated = build_allocation_series(inputs.allocations, filter, classifier);
    let adjusted = build_adjusted_series(
        inputs.baseline,
        inputs.adjustments,
        filter,
        classifier,
        policy,
    );

    let points = merge_series(&allocated.months, &adjusted.months, &actual.months);
    let totals = SeriesTotals::from_points(&points);

    debug!(
        "series for {}: {} months",
        filter.project_id().unwrap_or("all projects"),
        points.len()
    );

    SeriesReport {
        project_id: filter.project_id().map(str::to_string),
        points,
        totals,
        stats: SeriesStats {
            realized: actual.stats,
            allocations: allocated.stats,
            baseline: adjusted.baseline,
            adjustments: adjusted.adjustments,
        },
    }
}

/// Every primary project id found across the four arrays, sorted and
/// deduplicated.
pub fn distinct_projects(inputs: SeriesInputs<'_>) -> Vec<String> {
    inputs
        .all_records()
        .filter_map(|record| first_of(record, PROJECT_ACCESSORS))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The aggregate series plus one series per project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioReport {
    pub aggregate: SeriesReport,
    pub projects: BTreeMap<String, SeriesReport>,
}

/// Build the aggregate series and one filtered series per distinct project.
///
/// Project series match records by primary id only, so each record with a
/// project counts towards exactly one of them and the project series sum to
/// the aggregate minus the unassigned records.
pub fn build_portfolio(
    inputs: SeriesInputs<'_>,
    policy: AdjustmentPolicy,
    classifier: &dyn CategoryClassifier,
) -> PortfolioReport {
    let aggregate = build_series_report(
        inputs,
        SeriesOptions {
            project_id: None,
            policy,
        },
        classifier,
    );

    let projects: BTreeMap<String, SeriesReport> = distinct_projects(inputs)
        .into_iter()
        .map(|id| {
            let report = filtered_report(inputs, ProjectFilter::primary(&id), policy, classifier);
            (id, report)
        })
        .collect();

    info!("portfolio built for {} projects", projects.len());

    PortfolioReport {
        aggregate,
        projects,
    }
}

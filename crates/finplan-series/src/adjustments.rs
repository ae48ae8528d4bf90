//! Adjusted / projected series: baseline plan plus delta or absolute
//! adjustments.

use finplan_core::classifier::{fold_text, CategoryClassifier};
use finplan_core::data_processors::{first_of, has_any, resolve, resolve_number, MONTH_ACCESSORS};
use finplan_core::models::{AdjustmentPolicy, MonthlySeries, NormalizedRow};
use finplan_core::month_key::MonthKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::accumulator::{saturate, SourceStats};
use crate::filter::{admit, ProjectFilter};
use crate::realized::sum_point_amounts;

/// Field names recognised on adjustment records.
pub mod fields {
    pub const KIND_TAG: &[&str] = &[
        "adjustmentType",
        "adjustment_type",
        "adjustmentKind",
        "kind",
        "mode",
        "type",
        "tipo",
        "tipoAjuste",
    ];
    pub const DELTA_TAGS: &[&str] = &[
        "delta",
        "diff",
        "difference",
        "incremental",
        "increment",
        "additive",
        "add",
        "relative",
        "incremento",
    ];
    pub const ABSOLUTE_TAGS: &[&str] = &["absolute", "absoluto", "replace", "override", "set", "fixed"];
    pub const DELTA_FLAG: &str = "isDelta";
    pub const ABSOLUTE_FLAG: &str = "isAbsolute";

    /// Shape hints for a replacing value.
    pub const ABSOLUTE_VALUE: &[&str] = &[
        "newValue",
        "new_value",
        "adjustedValue",
        "adjusted_value",
        "nuevoValor",
    ];
    /// Shape hints for an additive value.
    pub const DIFFERENCE: &[&str] = &["difference", "diff", "delta", "diferencia"];
    pub const AMOUNT: &[&str] = &["amount", "monto", "value", "valor"];

    pub const DISTRIBUTION: &[&str] = &[
        "distribution",
        "monthlyDistribution",
        "monthly_distribution",
        "distribucion",
        "months",
        "breakdown",
    ];
}

/// How an adjustment amount combines with the month's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Added to the current value.
    Delta,
    /// Replaces the current value.
    Absolute,
}

/// Where an [`AdjustmentKind`] decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindSource {
    /// An explicit tag or boolean flag.
    Tagged,
    /// A shape hint such as a `newValue` or `difference` field.
    Inferred,
    /// Nothing to go on; delta was assumed.
    Defaulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindResolution {
    pub kind: AdjustmentKind,
    pub source: KindSource,
}

impl KindResolution {
    /// Resolve the kind of `entry`, falling back to its parent `record`.
    ///
    /// Tags beat shape hints at every level; the entry is consulted before the
    /// record at each step.
    pub fn resolve(entry: &Value, record: &Value) -> Self {
        if let Some(kind) = tagged_kind(entry).or_else(|| tagged_kind(record)) {
            return Self {
                kind,
                source: KindSource::Tagged,
            };
        }
        if let Some(kind) = shape_kind(entry).or_else(|| shape_kind(record)) {
            return Self {
                kind,
                source: KindSource::Inferred,
            };
        }
        Self {
            kind: AdjustmentKind::Delta,
            source: KindSource::Defaulted,
        }
    }
}

fn tagged_kind(value: &Value) -> Option<AdjustmentKind> {
    if value.get(fields::ABSOLUTE_FLAG).and_then(Value::as_bool) == Some(true) {
        return Some(AdjustmentKind::Absolute);
    }
    if value.get(fields::DELTA_FLAG).and_then(Value::as_bool) == Some(true) {
        return Some(AdjustmentKind::Delta);
    }
    resolve(value, fields::KIND_TAG, |v| {
        let tag = fold_text(v.as_str()?);
        if fields::DELTA_TAGS.contains(&tag.as_str()) {
            Some(AdjustmentKind::Delta)
        } else if fields::ABSOLUTE_TAGS.contains(&tag.as_str()) {
            Some(AdjustmentKind::Absolute)
        } else {
            None
        }
    })
}

/// An explicit replacing value outranks a difference field.
fn shape_kind(value: &Value) -> Option<AdjustmentKind> {
    if has_any(value, fields::ABSOLUTE_VALUE) {
        Some(AdjustmentKind::Absolute)
    } else if has_any(value, fields::DIFFERENCE) {
        Some(AdjustmentKind::Delta)
    } else {
        None
    }
}

fn entry_amount(entry: &Value, kind: AdjustmentKind) -> Option<f64> {
    let preferred = match kind {
        AdjustmentKind::Absolute => fields::ABSOLUTE_VALUE,
        AdjustmentKind::Delta => fields::DIFFERENCE,
    };
    resolve_number(entry, preferred).or_else(|| resolve_number(entry, fields::AMOUNT))
}

/// The per-month entries of a record: its distribution list when it carries a
/// non-empty one, otherwise the record itself.
fn entries(record: &Value) -> Vec<&Value> {
    let distribution = fields::DISTRIBUTION
        .iter()
        .filter_map(|key| record.get(*key)?.as_array())
        .find(|list| !list.is_empty());
    match distribution {
        Some(list) => list.iter().filter(|entry| entry.is_object()).collect(),
        None => vec![record],
    }
}

/// One month-level change extracted from an adjustment record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentEntry {
    pub month: MonthKey,
    pub amount: f64,
    pub resolution: KindResolution,
}

impl AdjustmentEntry {
    /// Apply this change to `series`. A delta on a month with no baseline
    /// starts from zero.
    pub fn apply(&self, series: &mut MonthlySeries) {
        match self.resolution.kind {
            AdjustmentKind::Delta => {
                let slot = series.entry(self.month).or_insert(0.0);
                *slot = saturate(*slot + self.amount);
            }
            AdjustmentKind::Absolute => {
                series.insert(self.month, self.amount);
            }
        }
    }
}

/// Extract every usable month-level change from one adjustment record.
///
/// Entries without a month or amount are dropped. Under
/// [`AdjustmentPolicy::RequireTag`] entries whose kind is not tagged are
/// dropped too.
pub fn adjustment_entries(record: &Value, policy: AdjustmentPolicy) -> Vec<AdjustmentEntry> {
    let mut out = Vec::new();
    for entry in entries(record) {
        let Some((month, _)) = first_of(entry, MONTH_ACCESSORS) else {
            trace!("adjustment entry without month");
            continue;
        };
        let resolution = KindResolution::resolve(entry, record);
        let Some(amount) = entry_amount(entry, resolution.kind) else {
            trace!("adjustment entry for {} without amount", month);
            continue;
        };

        match (resolution.source, policy) {
            (KindSource::Tagged, _) => {}
            (_, AdjustmentPolicy::RequireTag) => {
                warn!(
                    "untagged adjustment for {} skipped ({:?} would be {:?})",
                    month, resolution.kind, resolution.source
                );
                continue;
            }
            (KindSource::Inferred, AdjustmentPolicy::Infer) => {
                debug!("adjustment for {} inferred as {:?}", month, resolution.kind);
            }
            (KindSource::Defaulted, AdjustmentPolicy::Infer) => {
                debug!("adjustment for {} has no kind; treated as delta", month);
            }
        }

        out.push(AdjustmentEntry {
            month,
            amount,
            resolution,
        });
    }
    out
}

/// Baseline plan amount: the planned figure, else the projected (forecast)
/// figure, else the record total.
pub fn baseline_amount(row: &NormalizedRow) -> Option<f64> {
    row.planned.or(row.projected).or(row.total)
}

/// The adjusted series plus per-source bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjustedSeries {
    pub months: MonthlySeries,
    pub baseline: SourceStats,
    pub adjustments: SourceStats,
}

/// Build the month → adjusted/projected amount map.
///
/// Baseline records are summed per month exactly like realized amounts. The
/// adjustments are then applied in input order, so the result depends on
/// their order whenever deltas and absolutes touch the same month.
pub fn build_adjusted_series(
    baseline: &[Value],
    adjustments: &[Value],
    filter: ProjectFilter<'_>,
    classifier: &dyn CategoryClassifier,
    policy: AdjustmentPolicy,
) -> AdjustedSeries {
    let base = sum_point_amounts(baseline, filter, classifier, baseline_amount);
    let mut months = base.months;
    let mut stats = SourceStats::default();

    for record in adjustments {
        if !admit(record, filter, classifier, &mut stats) {
            continue;
        }
        let changes = adjustment_entries(record, policy);
        if changes.is_empty() {
            stats.skipped += 1;
            continue;
        }
        for change in &changes {
            change.apply(&mut months);
        }
        stats.contributed += 1;
    }

    debug!(
        "adjusted series: {} baseline and {} adjustment records over {} months",
        base.stats.contributed,
        stats.contributed,
        months.len()
    );

    AdjustedSeries {
        months,
        baseline: base.stats,
        adjustments: stats,
    }
}

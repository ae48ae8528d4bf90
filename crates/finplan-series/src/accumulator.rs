//! Per-month running totals shared by every series builder.

use std::collections::BTreeMap;

use finplan_core::models::MonthlySeries;
use finplan_core::month_key::MonthKey;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ── MonthlyAccumulator ────────────────────────────────────────────────────────

/// Collects every contribution per month and sums them on [`finish`].
///
/// Contributions are summed in sorted order, so the result is bit-for-bit
/// identical however the input records were ordered. Contributions to the
/// same month are always added, never overwritten.
///
/// [`finish`]: MonthlyAccumulator::finish
#[derive(Debug, Clone, Default)]
pub struct MonthlyAccumulator {
    contributions: BTreeMap<MonthKey, Vec<f64>>,
}

impl MonthlyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `amount` against `month`. Non-finite amounts are ignored.
    pub fn add(&mut self, month: MonthKey, amount: f64) {
        if amount.is_finite() {
            self.contributions.entry(month).or_default().push(amount);
        }
    }

    /// Number of distinct months seen so far.
    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Collapse the contributions into one total per month.
    ///
    /// A total that overflows is saturated, see [`saturate`].
    pub fn finish(self) -> MonthlySeries {
        self.contributions
            .into_iter()
            .map(|(month, mut amounts)| {
                amounts.sort_by(f64::total_cmp);
                let total: f64 = amounts.into_iter().sum();
                if !total.is_finite() {
                    warn!("total for {} overflows; saturated", month);
                }
                (month, saturate(total))
            })
            .collect()
    }
}

/// Clamp an overflowed sum of finite amounts to `f64::MAX` / `f64::MIN`.
///
/// Such a sum can only reach `±inf`, never `NaN`; `NaN` maps to `0` anyway.
pub fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

// ── SourceStats ───────────────────────────────────────────────────────────────

/// What happened to the records of one input array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    /// Records in the input array.
    pub seen: u32,
    /// Dropped by the project filter.
    pub excluded_by_project: u32,
    /// Dropped by the category classifier.
    pub excluded_by_category: u32,
    /// Admitted but without a usable month or amount.
    pub skipped: u32,
    /// Contributed to at least one month.
    pub contributed: u32,
}

/// A builder's month map together with its bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSeries {
    pub months: MonthlySeries,
    pub stats: SourceStats,
}

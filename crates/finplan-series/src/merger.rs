//! Union of the three month maps into one ordered series.

use std::collections::BTreeSet;

use finplan_core::models::{MonthlyPoint, MonthlySeries};
use finplan_core::month_key::MonthKey;
use tracing::warn;

/// Merge the allocated, adjusted/projected and actual maps.
///
/// The output covers exactly the union of the three maps' months, ascending,
/// one point per month. A month absent from a map reads as `0`. Months that
/// appear in none of the maps are not filled in.
pub fn merge_series(
    allocated: &MonthlySeries,
    adjusted: &MonthlySeries,
    actual: &MonthlySeries,
) -> Vec<MonthlyPoint> {
    let months: BTreeSet<MonthKey> = allocated
        .keys()
        .chain(adjusted.keys())
        .chain(actual.keys())
        .copied()
        .collect();

    months
        .into_iter()
        .map(|month| MonthlyPoint {
            month,
            allocated: value_at(allocated, month, "allocated"),
            adjusted_or_projected: value_at(adjusted, month, "adjustedOrProjected"),
            actual: value_at(actual, month, "actual"),
        })
        .collect()
}

fn value_at(series: &MonthlySeries, month: MonthKey, label: &str) -> f64 {
    match series.get(&month) {
        Some(v) if v.is_finite() => *v,
        Some(v) => {
            warn!("non-finite {} value {} for {}; using 0", label, v, month);
            0.0
        }
        None => 0.0,
    }
}

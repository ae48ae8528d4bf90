//! Realized-amount series: payroll entries and monthly actuals.

use finplan_core::classifier::CategoryClassifier;
use finplan_core::data_processors::RowNormalizer;
use finplan_core::models::{MonthSource, NormalizedRow};
use finplan_core::month_key::MonthKey;
use serde_json::Value;
use tracing::{debug, trace};

use crate::accumulator::{MonthlyAccumulator, SourceSeries, SourceStats};
use crate::filter::{admit, ProjectFilter};

/// Picks the amount a point-in-time or monthly record contributes.
pub type AmountSelector = fn(&NormalizedRow) -> Option<f64>;

/// Realized amount: the paid / actual figure.
pub fn realized_amount(row: &NormalizedRow) -> Option<f64> {
    row.actual
}

/// Build the month → realized amount map.
///
/// Two record shapes are accepted:
/// * monthly: an explicit month/period (or a month embedded in the sort
///   key) with an already aggregated amount;
/// * point-in-time: a payment date, reduced to its month.
///
/// Both are summed into their month; records landing on the same month
/// accumulate.
pub fn build_realized_series(
    records: &[Value],
    filter: ProjectFilter<'_>,
    classifier: &dyn CategoryClassifier,
) -> SourceSeries {
    sum_point_amounts(records, filter, classifier, realized_amount)
}

/// Shared driver for sources whose records each land on a single month.
///
/// A pre-aggregated category total reported by `classifier` takes precedence
/// over `amount`.
pub(crate) fn sum_point_amounts(
    records: &[Value],
    filter: ProjectFilter<'_>,
    classifier: &dyn CategoryClassifier,
    amount: AmountSelector,
) -> SourceSeries {
    let mut acc = MonthlyAccumulator::new();
    let mut stats = SourceStats::default();

    for record in records {
        if !admit(record, filter, classifier, &mut stats) {
            continue;
        }
        let row = RowNormalizer::normalize(record);
        match point_contribution(record, &row, classifier, amount) {
            Some((month, value)) => {
                acc.add(month, value);
                stats.contributed += 1;
            }
            None => {
                stats.skipped += 1;
                trace!("record skipped: no month or amount");
            }
        }
    }

    debug!(
        "point series: {} of {} records contributed to {} months",
        stats.contributed,
        stats.seen,
        acc.len()
    );

    SourceSeries {
        months: acc.finish(),
        stats,
    }
}

fn point_contribution(
    record: &Value,
    row: &NormalizedRow,
    classifier: &dyn CategoryClassifier,
    amount: AmountSelector,
) -> Option<(MonthKey, f64)> {
    let value = classifier.category_total(record).or_else(|| amount(row))?;
    let month = row.month?;
    if row.month_source == Some(MonthSource::Date) {
        trace!("point-in-time record reduced to {}", month);
    }
    Some((month, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use finplan_core::classifier::KeywordClassifier;
    use serde_json::json;

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn build(records: &[Value], project: Option<&str>) -> SourceSeries {
        build_realized_series(records, ProjectFilter::new(project), &KeywordClassifier::direct_labor())
    }

    #[test]
    fn test_monthly_records_are_used_as_is() {
        let records = vec![
            json!({"projectId": "A", "month": "2025-01", "category": "MOD", "amount": 1000}),
            json!({"projectId": "A", "month": "2025-02", "category": "MOD", "amount": 1100}),
        ];
        let s = build(&records, None);
        assert_eq!(s.months[&key("2025-01")], 1000.0);
        assert_eq!(s.months[&key("2025-02")], 1100.0);
        assert_eq!(s.stats.contributed, 2);
    }

    #[test]
    fn test_point_in_time_records_accumulate_by_month() {
        let records = vec![
            json!({"paidAt": "2025-03-05", "rubro": "Nómina", "amount": 400}),
            json!({"paidAt": "2025-03-20T12:00:00Z", "rubro": "Nómina", "amount": 600}),
            json!({"paidAt": "2025-04-01", "rubro": "Nómina", "amount": 50}),
        ];
        let s = build(&records, None);
        assert_eq!(s.months[&key("2025-03")], 1000.0);
        assert_eq!(s.months[&key("2025-04")], 50.0);
    }

    #[test]
    fn test_pre_aggregated_total_wins_over_generic_amount() {
        let records = vec![json!({"period": "2025-05", "totalMod": 9000, "amount": 12000})];
        let s = build(&records, None);
        assert_eq!(s.months[&key("2025-05")], 9000.0);
    }

    #[test]
    fn test_sort_key_month() {
        let records = vec![json!({"sk": "PAYROLL#2025-06#MOD", "amount": "750.5"})];
        let s = build(&records, None);
        assert_eq!(s.months[&key("2025-06")], 750.5);
    }

    #[test]
    fn test_records_without_month_or_amount_are_skipped() {
        let records = vec![
            json!({"category": "MOD", "amount": 100}),
            json!({"category": "MOD", "month": "2025-01", "amount": "n/a"}),
            json!({"category": "MOD", "month": "whenever", "amount": 5}),
        ];
        let s = build(&records, None);
        assert!(s.months.is_empty());
        assert_eq!(s.stats.skipped, 3);
        assert_eq!(s.stats.contributed, 0);
    }

    #[test]
    fn test_project_filter_and_category() {
        let records = vec![
            json!({"projectId": "A", "month": "2025-01", "category": "MOD", "amount": 1}),
            json!({"projectId": "B", "month": "2025-01", "category": "MOD", "amount": 10}),
            json!({"projectId": "A", "month": "2025-01", "category": "Hardware", "amount": 100}),
        ];
        let s = build(&records, Some("A"));
        assert_eq!(s.months[&key("2025-01")], 1.0);
        assert_eq!(s.stats.excluded_by_project, 1);
        assert_eq!(s.stats.excluded_by_category, 1);
    }
}

//! End-to-end behaviour of the monthly series pipeline.

use finplan_series::core::classifier::KeywordClassifier;
use finplan_series::core::month_key::normalize_month_key;
use finplan_series::core::AdjustmentPolicy;
use finplan_series::{
    build_monthly_series, build_series_report, MonthlyPoint, SeriesInputs, SeriesOptions,
};
use serde_json::{json, Value};

fn realized_only(records: &[Value]) -> SeriesInputs<'_> {
    SeriesInputs {
        realized: records,
        ..Default::default()
    }
}

fn months(points: &[MonthlyPoint]) -> Vec<String> {
    points.iter().map(|p| p.month.to_string()).collect()
}

#[test]
fn same_month_in_different_notations_gets_one_key() {
    let notations = [
        json!("2025-03"),
        json!("2025-03-17"),
        json!("2025-03-31T23:59:59Z"),
        json!("2025/03/01"),
        json!("17/03/2025"),
        json!("March 2025"),
        json!({"year": 2025, "month": 3}),
        json!(202503),
    ];
    for n in &notations {
        assert_eq!(
            normalize_month_key(n).map(|k| k.to_string()).as_deref(),
            Some("2025-03"),
            "notation {}",
            n
        );
    }
}

#[test]
fn realized_amounts_on_one_month_are_summed() {
    let amounts = [125.5, 300.0, 74.5, 1000.0, 0.25];
    let records: Vec<Value> = amounts
        .iter()
        .map(|a| json!({"category": "MOD", "paidAt": "2025-04-10", "amount": a}))
        .collect();
    let points = build_monthly_series(realized_only(&records), None, None);
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].actual, amounts.iter().sum::<f64>());
}

#[test]
fn allocation_expansion_rolls_over_into_next_year() {
    let allocations = vec![json!({
        "category": "MOD",
        "startMonth": "2025-11",
        "durationMonths": 3,
        "monthlyAmount": 4200
    })];
    let inputs = SeriesInputs {
        allocations: &allocations,
        ..Default::default()
    };
    let points = build_monthly_series(inputs, None, None);
    assert_eq!(months(&points), vec!["2025-11", "2025-12", "2026-01"]);
    assert!(points.iter().all(|p| p.allocated == 4200.0));
}

#[test]
fn merged_domain_is_the_union_of_sources() {
    let realized = vec![json!({"category": "MOD", "month": "2025-01", "amount": 10})];
    let allocations = vec![json!({"category": "MOD", "month": "2025-03", "amount": 30})];
    let inputs = SeriesInputs {
        realized: &realized,
        allocations: &allocations,
        ..Default::default()
    };
    let points = build_monthly_series(inputs, None, None);
    assert_eq!(months(&points), vec!["2025-01", "2025-03"]);
    assert_eq!(points[0].allocated, 0.0);
    assert_eq!(points[0].actual, 10.0);
    assert_eq!(points[1].allocated, 30.0);
    assert_eq!(points[1].actual, 0.0);
}

#[test]
fn delta_and_absolute_adjustments() {
    let baseline = vec![json!({"category": "MOD", "month": "2025-02", "planned": 1000})];

    let delta = vec![json!({"category": "MOD", "month": "2025-02", "difference": 200})];
    let inputs = SeriesInputs {
        baseline: &baseline,
        adjustments: &delta,
        ..Default::default()
    };
    assert_eq!(build_monthly_series(inputs, None, None)[0].adjusted_or_projected, 1200.0);

    let absolute = vec![json!({"category": "MOD", "month": "2025-02", "newValue": 900})];
    let inputs = SeriesInputs {
        baseline: &baseline,
        adjustments: &absolute,
        ..Default::default()
    };
    assert_eq!(build_monthly_series(inputs, None, None)[0].adjusted_or_projected, 900.0);
}

#[test]
fn other_projects_never_leak_into_a_filtered_series() {
    let realized = vec![
        json!({"projectId": "A", "category": "MOD", "month": "2025-01", "amount": 1}),
        json!({"pk": "PROJECT#B", "category": "MOD", "month": "2025-01", "amount": 1000}),
        json!({"projectCode": "B", "category": "MOD", "month": "2025-02", "amount": 1000}),
        json!({"category": "MOD", "month": "2025-03", "amount": 1000}),
    ];
    let allocations = vec![json!({
        "projectId": "B",
        "category": "MOD",
        "startMonth": "2025-01",
        "durationMonths": 12,
        "monthlyAmount": 5
    })];
    let inputs = SeriesInputs {
        realized: &realized,
        allocations: &allocations,
        ..Default::default()
    };
    let points = build_monthly_series(inputs, Some("A"), None);
    assert_eq!(months(&points), vec!["2025-01"]);
    assert_eq!(points[0].actual, 1.0);
    assert_eq!(points[0].allocated, 0.0);
}

#[test]
fn malformed_records_do_not_affect_the_series() {
    let good = vec![json!({"category": "MOD", "month": "2025-01", "amount": 10})];
    let mut noisy = good.clone();
    noisy.extend([
        json!({}),
        json!(null),
        json!([1, 2, 3]),
        json!("MOD"),
        json!({"category": "MOD", "month": null, "amount": "abc"}),
        json!({"category": "MOD", "month": "2025-13", "amount": 5}),
        json!({"category": "MOD", "month": "2025-01", "amount": "NaN"}),
        json!({"category": "MOD", "month": "2025-01", "amount": {"nested": 1}}),
        json!({"category": "MOD", "startMonth": "2025-01", "durationMonths": -4, "monthlyAmount": 1e308}),
    ]);

    let clean = build_monthly_series(realized_only(&good), None, None);
    let dirty = build_monthly_series(realized_only(&noisy), None, None);
    assert_eq!(clean, dirty);

    let inputs = SeriesInputs {
        realized: &noisy,
        allocations: &noisy,
        adjustments: &noisy,
        baseline: &noisy,
    };
    let points = build_monthly_series(inputs, None, None);
    assert!(points
        .iter()
        .all(|p| p.allocated.is_finite() && p.adjusted_or_projected.is_finite() && p.actual.is_finite()));
}

#[test]
fn output_is_independent_of_input_order() {
    let realized: Vec<Value> = (0..40)
        .map(|i| {
            json!({
                "category": "MOD",
                "month": format!("2025-{:02}", i % 12 + 1),
                "amount": 0.1 * f64::from(i) + 1e-7 * f64::from(i * i)
            })
        })
        .collect();
    let allocations: Vec<Value> = (0..10)
        .map(|i| {
            json!({
                "category": "MOD",
                "startMonth": format!("2025-{:02}", i + 1),
                "durationMonths": i + 2,
                "monthlyAmount": 33.3 * f64::from(i)
            })
        })
        .collect();
    let baseline: Vec<Value> = (0..12)
        .map(|i| json!({"category": "MOD", "month": format!("2025-{:02}", i + 1), "planned": 0.7 * f64::from(i)}))
        .collect();

    let forward = SeriesInputs {
        realized: &realized,
        allocations: &allocations,
        adjustments: &[],
        baseline: &baseline,
    };
    let out_forward = serde_json::to_string(&build_monthly_series(forward, None, None)).unwrap();

    let mut realized_rev = realized.clone();
    realized_rev.reverse();
    let mut allocations_rev = allocations.clone();
    allocations_rev.rotate_left(3);
    let mut baseline_rev = baseline.clone();
    baseline_rev.reverse();
    let shuffled = SeriesInputs {
        realized: &realized_rev,
        allocations: &allocations_rev,
        adjustments: &[],
        baseline: &baseline_rev,
    };
    let out_shuffled = serde_json::to_string(&build_monthly_series(shuffled, None, None)).unwrap();

    assert_eq!(out_forward, out_shuffled);
}

#[test]
fn require_tag_policy_ignores_untagged_adjustments() {
    let baseline = vec![json!({"category": "MOD", "month": "2025-02", "planned": 1000})];
    let adjustments = vec![
        json!({"category": "MOD", "month": "2025-02", "newValue": 1}),
        json!({"category": "MOD", "month": "2025-02", "amount": 50, "adjustmentType": "delta"}),
    ];
    let inputs = SeriesInputs {
        baseline: &baseline,
        adjustments: &adjustments,
        ..Default::default()
    };
    let report = build_series_report(
        inputs,
        SeriesOptions {
            project_id: None,
            policy: AdjustmentPolicy::RequireTag,
        },
        &KeywordClassifier::direct_labor(),
    );
    assert_eq!(report.points[0].adjusted_or_projected, 1050.0);
    assert_eq!(report.stats.adjustments.skipped, 1);
}

#[test]
fn output_points_use_chart_field_names() {
    let records = vec![json!({"category": "MOD", "month": "2025-01", "amount": 10})];
    let points = build_monthly_series(realized_only(&records), None, None);
    assert_eq!(
        serde_json::to_value(&points).unwrap(),
        json!([{"month": "2025-01", "allocated": 0.0, "adjustedOrProjected": 0.0, "actual": 10.0}])
    );
}

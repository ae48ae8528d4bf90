use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::month_key::MonthKey;

/// A month → amount map produced by one series builder.
///
/// `BTreeMap` keeps months in ascending order.
pub type MonthlySeries = BTreeMap<MonthKey, f64>;

/// Where a normalized row's month came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthSource {
    /// An explicit month / period field.
    Period,
    /// A payment or point-in-time date reduced to its month.
    Date,
    /// A `YYYY-MM` run embedded in the composite sort key.
    SortKey,
}

/// How adjustments without an explicit delta/absolute tag are treated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AdjustmentPolicy {
    /// Infer from field shape (`newValue` → absolute, `difference` → delta),
    /// defaulting to delta.
    #[default]
    Infer,
    /// Skip adjustments that are not explicitly tagged.
    RequireTag,
}

/// A raw record flattened to the fields the series builders care about.
///
/// Every numeric field is either a finite number or `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub project_id: Option<String>,
    pub month: Option<MonthKey>,
    pub month_source: Option<MonthSource>,
    pub start_month: Option<MonthKey>,
    pub duration_months: Option<u32>,
    /// Realized (paid / executed) amount.
    pub actual: Option<f64>,
    /// Planned or generic amount.
    pub planned: Option<f64>,
    /// Projected / forecast amount.
    pub projected: Option<f64>,
    pub monthly_amount: Option<f64>,
    pub unit_cost: Option<f64>,
    pub quantity: Option<f64>,
    pub total: Option<f64>,
}

impl NormalizedRow {
    /// `unit_cost × quantity` when both are present.
    pub fn unit_cost_times_quantity(&self) -> Option<f64> {
        let product = self.unit_cost? * self.quantity?;
        product.is_finite().then_some(product)
    }

    /// The month the row lands on: the explicit month, or the start month of
    /// an allocation.
    pub fn effective_month(&self) -> Option<MonthKey> {
        self.month.or(self.start_month)
    }
}

/// One month of the output series.
///
/// Field names are part of the chart contract and serialise exactly as
/// `month`, `allocated`, `adjustedOrProjected` and `actual`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: MonthKey,
    pub allocated: f64,
    #[serde(rename = "adjustedOrProjected")]
    pub adjusted_or_projected: f64,
    pub actual: f64,
}

impl MonthlyPoint {
    /// A point with every value at zero.
    pub fn empty(month: MonthKey) -> Self {
        Self {
            month,
            allocated: 0.0,
            adjusted_or_projected: 0.0,
            actual: 0.0,
        }
    }
}

/// Sums over a whole output series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesTotals {
    pub allocated: f64,
    pub adjusted_or_projected: f64,
    pub actual: f64,
    /// `actual − adjusted_or_projected`.
    pub variance: f64,
    pub months: u32,
}

impl SeriesTotals {
    /// Accumulate one point into the running totals.
    pub fn add_point(&mut self, point: &MonthlyPoint) {
        self.allocated += point.allocated;
        self.adjusted_or_projected += point.adjusted_or_projected;
        self.actual += point.actual;
        self.variance = self.actual - self.adjusted_or_projected;
        self.months += 1;
    }

    pub fn from_points(points: &[MonthlyPoint]) -> Self {
        let mut totals = Self::default();
        for point in points {
            totals.add_point(point);
        }
        totals
    }
}

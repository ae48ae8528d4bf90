//! Allocation series: planned monthly commitments, possibly spanning months.

use finplan_core::classifier::CategoryClassifier;
use finplan_core::data_processors::RowNormalizer;
use finplan_core::models::{MonthSource, NormalizedRow};
use finplan_core::month_key::MonthKey;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::accumulator::{MonthlyAccumulator, SourceSeries, SourceStats};
use crate::filter::{admit, ProjectFilter};

/// Longest span a single allocation is expanded over (50 years).
pub const MAX_ALLOCATION_MONTHS: u32 = 600;

/// The one way an allocation record is read. Shapes are tried in declaration
/// order and the first whose fields are all present wins, so a record is
/// never counted twice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllocationShape {
    /// Explicit month with its amount.
    Monthly { month: MonthKey, amount: f64 },
    /// Start month, duration and a per-month amount.
    Expanded {
        start: MonthKey,
        months: u32,
        monthly_amount: f64,
    },
    /// A total (or unit cost × quantity) landing on one derived month.
    Lump { month: MonthKey, amount: f64 },
}

impl AllocationShape {
    /// Resolve the shape of one record, or `None` if no shape's required
    /// fields are present.
    pub fn resolve(
        record: &Value,
        row: &NormalizedRow,
        classifier: &dyn CategoryClassifier,
    ) -> Option<Self> {
        let category_total = classifier.category_total(record);

        let explicit_month = match row.month_source {
            Some(MonthSource::Period) | Some(MonthSource::Date) => row.month,
            _ => None,
        };
        if let Some(month) = explicit_month {
            let amount = category_total
                .or(row.monthly_amount)
                .or(row.planned);
            if let Some(amount) = amount {
                return Some(Self::Monthly { month, amount });
            }
        }

        if let (Some(start), Some(months)) = (row.start_month, row.duration_months) {
            let monthly_amount = row
                .monthly_amount
                .or(category_total)
                .or(row.planned)
                .or_else(|| row.unit_cost_times_quantity());
            if let Some(monthly_amount) = monthly_amount {
                return Some(Self::Expanded {
                    start,
                    months,
                    monthly_amount,
                });
            }
        }

        let month = row.effective_month()?;
        let amount = row
            .total
            .or_else(|| row.unit_cost_times_quantity())
            .or(category_total)
            .or(row.planned)?;
        Some(Self::Lump { month, amount })
    }

    /// Add this allocation's contributions to `acc`.
    pub fn contribute(&self, acc: &mut MonthlyAccumulator) {
        match *self {
            Self::Monthly { month, amount } | Self::Lump { month, amount } => acc.add(month, amount),
            Self::Expanded {
                start,
                months,
                monthly_amount,
            } => {
                let span = if months > MAX_ALLOCATION_MONTHS {
                    warn!(
                        "allocation starting {} spans {} months; capped at {}",
                        start, months, MAX_ALLOCATION_MONTHS
                    );
                    MAX_ALLOCATION_MONTHS
                } else {
                    months
                };
                for offset in 0..span {
                    let Some(month) = start.add_months(offset) else {
                        break;
                    };
                    acc.add(month, monthly_amount);
                }
            }
        }
    }
}

/// Build the month → allocated amount map.
pub fn build_allocation_series(
    records: &[Value],
    filter: ProjectFilter<'_>,
    classifier: &dyn CategoryClassifier,
) -> SourceSeries {
    let mut acc = MonthlyAccumulator::new();
    let mut stats = SourceStats::default();

    for record in records {
        if !admit(record, filter, classifier, &mut stats) {
            continue;
        }
        let row = RowNormalizer::normalize(record);
        match AllocationShape::resolve(record, &row, classifier) {
            Some(shape) => {
                trace!("allocation shape {:?}", shape);
                shape.contribute(&mut acc);
                stats.contributed += 1;
            }
            None => {
                stats.skipped += 1;
                trace!("allocation skipped: no recognisable shape");
            }
        }
    }

    debug!(
        "allocation series: {} of {} records contributed to {} months",
        stats.contributed,
        stats.seen,
        acc.len()
    );

    SourceSeries {
        months: acc.finish(),
        stats,
    }
}

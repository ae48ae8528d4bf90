//! Monthly series aggregation for finplan.
//!
//! Turns four arrays of loosely typed records (realized payroll, allocations,
//! adjustments and baseline plans) into one ascending series of
//! [`MonthlyPoint`]s, for a single project or across all of them.
//!
//! Everything except [`reader`] is pure: no I/O, no shared state, and no
//! error path. A record that cannot be read contributes nothing.

pub mod accumulator;
pub mod adjustments;
pub mod allocations;
pub mod filter;
pub mod merger;
pub mod pipeline;
pub mod reader;
pub mod realized;

pub use finplan_core as core;
pub use finplan_core::models::MonthlyPoint;

pub use accumulator::{MonthlyAccumulator, SourceSeries, SourceStats};
pub use adjustments::{build_adjusted_series, AdjustedSeries, AdjustmentKind, KindSource};
pub use allocations::build_allocation_series;
pub use filter::ProjectFilter;
pub use merger::merge_series;
pub use pipeline::{
    build_monthly_series, build_portfolio, build_series_report, distinct_projects, PortfolioReport,
    SeriesInputs, SeriesOptions, SeriesReport, SeriesStats,
};
pub use reader::{load_records, RecordSet};
pub use realized::build_realized_series;

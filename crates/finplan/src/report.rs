//! Output rendering: pretty JSON or a fixed-width text table.

use std::fmt::Write as _;

use finplan_core::formatting::{execution_rate, format_amount, format_signed_amount};
use finplan_core::models::{MonthlyPoint, SeriesTotals};
use finplan_series::{PortfolioReport, SeriesReport};
use serde::Serialize;

const MONTH_WIDTH: usize = 8;
const AMOUNT_WIDTH: usize = 18;
const RATE_WIDTH: usize = 8;

const HEADERS: [&str; 6] = [
    "Month",
    "Allocated",
    "Adjusted/Projected",
    "Actual",
    "Variance",
    "Exec %",
];

/// Output format selected by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

impl OutputFormat {
    /// Anything but `table` renders as JSON.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("table") {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn render_series(report: &SeriesReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Table => Ok(series_table(report)),
    }
}

pub fn render_portfolio(portfolio: &PortfolioReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(portfolio),
        OutputFormat::Table => {
            let mut out = series_table(&portfolio.aggregate);
            for report in portfolio.projects.values() {
                out.push('\n');
                out.push_str(&series_table(report));
            }
            Ok(out)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One titled table: a row per month and a totals row.
pub fn series_table(report: &SeriesReport) -> String {
    let mut out = String::new();
    let title = match &report.project_id {
        Some(id) => format!("Project {}", id),
        None => "All projects".to_string(),
    };
    let _ = writeln!(out, "{}", title);

    if report.points.is_empty() {
        out.push_str("No data\n");
        return out;
    }

    let header = format_row(HEADERS.map(str::to_string));
    let rule = "-".repeat(header.len());
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", rule);
    for point in &report.points {
        let _ = writeln!(out, "{}", point_row(point));
    }
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", totals_row(&report.totals));
    out
}

fn point_row(point: &MonthlyPoint) -> String {
    let variance = point.actual - point.adjusted_or_projected;
    format_row([
        point.month.to_string(),
        format_amount(point.allocated, 2),
        format_amount(point.adjusted_or_projected, 2),
        format_amount(point.actual, 2),
        format_signed_amount(variance, 2),
        rate_cell(point.actual, point.adjusted_or_projected),
    ])
}

fn totals_row(totals: &SeriesTotals) -> String {
    format_row([
        "Total".to_string(),
        format_amount(totals.allocated, 2),
        format_amount(totals.adjusted_or_projected, 2),
        format_amount(totals.actual, 2),
        format_signed_amount(totals.variance, 2),
        rate_cell(totals.actual, totals.adjusted_or_projected),
    ])
}

fn rate_cell(actual: f64, planned: f64) -> String {
    execution_rate(actual, planned)
        .map(|r| format!("{:.1}%", r))
        .unwrap_or_else(|| "-".to_string())
}

fn format_row(cells: [String; 6]) -> String {
    let [month, allocated, adjusted, actual, variance, rate] = cells;
    format!(
        "{:<mw$} {:>aw$} {:>aw$} {:>aw$} {:>aw$} {:>rw$}",
        month,
        allocated,
        adjusted,
        actual,
        variance,
        rate,
        mw = MONTH_WIDTH,
        aw = AMOUNT_WIDTH,
        rw = RATE_WIDTH,
    )
}

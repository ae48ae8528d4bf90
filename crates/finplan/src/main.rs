mod bootstrap;
mod report;

use anyhow::Result;
use finplan_core::settings::Settings;
use finplan_series::{build_portfolio, build_series_report, RecordSet, SeriesOptions};

use crate::report::OutputFormat;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("finplan v{} starting", env!("CARGO_PKG_VERSION"));

    let classifier = settings.classifier()?;
    tracing::info!(
        "Category: {}, Project: {}, Adjustment policy: {:?}",
        classifier.profile().name,
        settings.project.as_deref().unwrap_or("all"),
        settings.adjustment_policy
    );

    let records = RecordSet::load(
        settings.realized.as_deref(),
        settings.allocations.as_deref(),
        settings.adjustments.as_deref(),
        settings.baseline.as_deref(),
    )?;
    let inputs = records.inputs();
    let format = OutputFormat::from_name(&settings.format);

    let output = if settings.per_project {
        if settings.project.is_some() {
            tracing::warn!("--project is ignored with --per-project");
        }
        let portfolio = build_portfolio(inputs, settings.adjustment_policy, &classifier);
        report::render_portfolio(&portfolio, format)?
    } else {
        let options = SeriesOptions {
            project_id: settings.project.as_deref(),
            policy: settings.adjustment_policy,
        };
        let series = build_series_report(inputs, options, &classifier);
        report::render_series(&series, format)?
    };

    println!("{}", output);
    Ok(())
}

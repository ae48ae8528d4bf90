use std::path::PathBuf;

use clap::Parser;

use crate::classifier::{CategoryProfile, KeywordClassifier};
use crate::error::Result;
use crate::models::AdjustmentPolicy;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly cost-category series from raw financial-planning records
#[derive(Parser, Debug, Clone)]
#[command(
    name = "finplan",
    about = "Monthly cost-category series from raw financial-planning records",
    version
)]
pub struct Settings {
    /// Realized amounts (payroll, actuals) record file
    #[arg(long)]
    pub realized: Option<PathBuf>,

    /// Allocation record file
    #[arg(long)]
    pub allocations: Option<PathBuf>,

    /// Adjustment record file
    #[arg(long)]
    pub adjustments: Option<PathBuf>,

    /// Baseline plan record file
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Restrict the series to one project (all projects when omitted)
    #[arg(long, env = "FINPLAN_PROJECT")]
    pub project: Option<String>,

    /// Built-in category profile
    #[arg(long, default_value = "mod")]
    pub category: String,

    /// JSON category profile; overrides --category
    #[arg(long)]
    pub category_file: Option<PathBuf>,

    /// Handling of adjustments without an explicit delta/absolute tag
    #[arg(long, value_enum, default_value_t = AdjustmentPolicy::Infer)]
    pub adjustment_policy: AdjustmentPolicy,

    /// Also emit one series per project
    #[arg(long)]
    pub per_project: bool,

    /// Output format
    #[arg(long, default_value = "json", value_parser = ["json", "table"])]
    pub format: String,

    /// Logging level
    #[arg(long, env = "FINPLAN_LOG_LEVEL", default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::resolve(Self::parse())
    }

    /// Same as [`load`](Self::load) but with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Self::parse_from(args))
    }

    /// Apply the `--debug` override and drop a blank project filter.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings.project = settings
            .project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        settings
    }

    /// The category profile selected by `--category-file` or `--category`.
    pub fn category_profile(&self) -> Result<CategoryProfile> {
        match &self.category_file {
            Some(path) => CategoryProfile::from_json_file(path),
            None => CategoryProfile::builtin(&self.category),
        }
    }

    pub fn classifier(&self) -> Result<KeywordClassifier> {
        Ok(KeywordClassifier::new(self.category_profile()?))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinplanError;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::load_from_args(["finplan"]);

        assert!(settings.realized.is_none());
        assert!(settings.allocations.is_none());
        assert!(settings.adjustments.is_none());
        assert!(settings.baseline.is_none());
        assert_eq!(settings.category, "mod");
        assert!(settings.category_file.is_none());
        assert_eq!(settings.adjustment_policy, AdjustmentPolicy::Infer);
        assert!(!settings.per_project);
        assert_eq!(settings.format, "json");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_cli_inputs_and_project() {
        let settings = Settings::load_from_args([
            "finplan",
            "--realized",
            "/tmp/payroll.json",
            "--baseline",
            "/tmp/baseline.jsonl",
            "--project",
            "P-1",
            "--format",
            "table",
        ]);
        assert_eq!(settings.realized, Some(PathBuf::from("/tmp/payroll.json")));
        assert_eq!(settings.baseline, Some(PathBuf::from("/tmp/baseline.jsonl")));
        assert_eq!(settings.project.as_deref(), Some("P-1"));
        assert_eq!(settings.format, "table");
    }

    #[test]
    fn test_blank_project_means_all_projects() {
        let settings = Settings::load_from_args(["finplan", "--project", "  "]);
        assert!(settings.project.is_none());
    }

    #[test]
    fn test_adjustment_policy_flag() {
        let settings = Settings::load_from_args(["finplan", "--adjustment-policy", "require-tag"]);
        assert_eq!(settings.adjustment_policy, AdjustmentPolicy::RequireTag);
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = Settings::load_from_args(["finplan", "--debug", "--log-level", "ERROR"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = Settings::try_parse_from(["finplan", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_category_profile_builtin() {
        let settings = Settings::load_from_args(["finplan", "--category", "indirect"]);
        assert_eq!(settings.category_profile().unwrap().name, "indirect");

        let settings = Settings::load_from_args(["finplan", "--category", "capex"]);
        assert!(matches!(
            settings.category_profile(),
            Err(FinplanError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_category_file_overrides_builtin() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("travel.json");
        std::fs::write(&path, r#"{"name": "travel", "keywords": ["travel"]}"#).expect("write");

        let settings = Settings::load_from_args([
            "finplan".into(),
            "--category".into(),
            "indirect".into(),
            "--category-file".into(),
            path.into_os_string(),
        ]);
        let classifier = settings.classifier().expect("classifier");
        assert_eq!(classifier.profile().name, "travel");
    }
}

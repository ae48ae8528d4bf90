//! Core types for the monthly financial series engine.
//!
//! Month keys, the raw-record field accessors, the category classifier and
//! the shared error type. Nothing in here performs I/O except loading a
//! category profile or parsing settings.

pub mod classifier;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod month_key;
pub mod settings;

pub use classifier::{CategoryClassifier, CategoryProfile, KeywordClassifier};
pub use error::{FinplanError, Result};
pub use models::{AdjustmentPolicy, MonthlyPoint, MonthlySeries, NormalizedRow, SeriesTotals};
pub use month_key::MonthKey;

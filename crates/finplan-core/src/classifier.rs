//! Cost-category membership for raw records.
//!
//! The series builders only ever ask one question of a record: "does it belong
//! to the category being charted?". [`CategoryClassifier`] is that question as
//! a capability, so a different keyword profile (or an arbitrary closure)
//! reuses the whole pipeline for another category.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::data_processors::{non_empty_str, safe_number};
use crate::error::{FinplanError, Result};

// ── CategoryClassifier ────────────────────────────────────────────────────────

/// Decides whether a raw record belongs to a cost category.
pub trait CategoryClassifier {
    /// Membership decision. Unknown records must classify as `false`.
    fn matches(&self, record: &Value) -> bool;

    /// A pre-aggregated category total carried by the record, if any.
    ///
    /// When present it is the record's amount for this category.
    fn category_total(&self, _record: &Value) -> Option<f64> {
        None
    }
}

impl<F> CategoryClassifier for F
where
    F: Fn(&Value) -> bool,
{
    fn matches(&self, record: &Value) -> bool {
        self(record)
    }
}

// ── Text folding ──────────────────────────────────────────────────────────────

/// Lowercase, strip accents, and collapse every non-alphanumeric run to a
/// single space. `"Mano-de-Obra  Directa (MOD)"` → `"mano de obra directa mod"`.
pub fn fold_text(s: &str) -> String {
    let cleaned: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── CategoryProfile ───────────────────────────────────────────────────────────

/// Free-text fields scanned for category keywords, in order.
pub const TEXT_FIELDS: &[&str] = &[
    "category",
    "categoria",
    "rubro",
    "rubroName",
    "rubro_name",
    "lineItem",
    "line_item",
    "lineItemName",
    "name",
    "nombre",
    "costType",
    "cost_type",
    "tipoCosto",
    "tipo_costo",
    "description",
    "descripcion",
    "lineCode",
    "line_code",
];

/// Identifier-like fields searched for embedded category markers.
pub const ID_FIELDS: &[&str] = &[
    "rubroId",
    "rubro_id",
    "lineItemId",
    "line_item_id",
    "categoryId",
    "category_id",
    "lineCode",
    "line_code",
    "id",
    "sk",
];

/// Keyword set describing one cost category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProfile {
    pub name: String,
    /// Whole-word phrases matched against [`TEXT_FIELDS`].
    pub keywords: Vec<String>,
    /// Fields holding a pre-aggregated total for this category.
    #[serde(default)]
    pub aggregate_fields: Vec<String>,
    /// Tokens searched for inside the values of [`ID_FIELDS`], alongside the
    /// keywords.
    #[serde(default)]
    pub id_markers: Vec<String>,
    /// Words blanked out of an identifier before that search (`modern`
    /// must not read as `mod`).
    #[serde(default)]
    pub id_exclusions: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl CategoryProfile {
    /// Direct labor ("MOD", mano de obra directa).
    pub fn direct_labor() -> Self {
        Self {
            name: "mod".to_string(),
            keywords: strings(&[
                "mod",
                "mano de obra",
                "mano de obra directa",
                "direct labor",
                "direct labour",
                "payroll",
                "nomina",
                "salario",
                "salarios",
                "sueldo",
                "sueldos",
            ]),
            aggregate_fields: strings(&[
                "totalMod",
                "modTotal",
                "total_mod",
                "mod_total",
                "modAmount",
                "mod_amount",
                "laborTotal",
                "labor_total",
            ]),
            id_markers: strings(&["mod"]),
            id_exclusions: strings(&["modern", "model", "modem", "modul", "modif", "commod"]),
        }
    }

    /// Indirect costs / overhead.
    pub fn indirect() -> Self {
        Self {
            name: "indirect".to_string(),
            keywords: strings(&[
                "indirect",
                "indirect cost",
                "indirecto",
                "indirectos",
                "costos indirectos",
                "gastos indirectos",
                "gastos generales",
                "overhead",
            ]),
            aggregate_fields: strings(&[
                "totalIndirect",
                "indirectTotal",
                "total_indirect",
                "indirect_total",
            ]),
            id_markers: strings(&["indir", "ovh"]),
            id_exclusions: Vec::new(),
        }
    }

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Result<Self> {
        match fold_text(name).as_str() {
            "mod" | "direct labor" | "labor" => Ok(Self::direct_labor()),
            "indirect" | "overhead" => Ok(Self::indirect()),
            _ => Err(FinplanError::UnknownCategory(name.to_string())),
        }
    }

    /// Load a profile from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FinplanError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Self = serde_json::from_str(&content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// A profile must be able to match something.
    pub fn validate(&self) -> Result<()> {
        let has_keyword = self.keywords.iter().any(|k| !fold_text(k).is_empty());
        if !has_keyword && self.aggregate_fields.is_empty() && self.id_markers.is_empty() {
            return Err(FinplanError::Config(format!(
                "category profile \"{}\" has no keywords, aggregate fields or id markers",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for CategoryProfile {
    fn default() -> Self {
        Self::direct_labor()
    }
}

// ── KeywordClassifier ─────────────────────────────────────────────────────────

/// Heuristic classifier driven by a [`CategoryProfile`].
///
/// Order of checks:
/// 1. any aggregate field holds a number → member;
/// 2. any text field contains a keyword as a whole word or phrase, ignoring
///    case and accents → member;
/// 3. any identifier, with separators removed, contains a marker or a
///    keyword (`MOD01`, `rubro#mod-ing`, `RUBRO-NOMINA`) once the profile's
///    exclusions are blanked out → member.
///
/// Everything else is excluded.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    profile: CategoryProfile,
    padded_keywords: Vec<String>,
    id_needles: Vec<String>,
    id_exclusions: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(profile: CategoryProfile) -> Self {
        let padded_keywords = profile
            .keywords
            .iter()
            .map(|k| fold_text(k))
            .filter(|k| !k.is_empty())
            .map(|k| format!(" {} ", k))
            .collect();
        let mut id_needles: Vec<String> = profile
            .id_markers
            .iter()
            .chain(&profile.keywords)
            .map(|m| compact(m))
            .filter(|m| !m.is_empty())
            .collect();
        id_needles.sort();
        id_needles.dedup();
        let id_exclusions = profile
            .id_exclusions
            .iter()
            .map(|e| compact(e))
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            profile,
            padded_keywords,
            id_needles,
            id_exclusions,
        }
    }

    pub fn direct_labor() -> Self {
        Self::new(CategoryProfile::direct_labor())
    }

    pub fn profile(&self) -> &CategoryProfile {
        &self.profile
    }

    fn text_matches(&self, record: &Value) -> bool {
        TEXT_FIELDS
            .iter()
            .filter_map(|field| record.get(*field).and_then(non_empty_str))
            .any(|text| {
                let padded = format!(" {} ", fold_text(&text));
                self.padded_keywords.iter().any(|k| padded.contains(k.as_str()))
            })
    }

    fn id_matches(&self, record: &Value) -> bool {
        ID_FIELDS
            .iter()
            .filter_map(|field| record.get(*field).and_then(non_empty_str))
            .any(|id| {
                let mut compacted = compact(&id);
                for excluded in &self.id_exclusions {
                    compacted = compacted.replace(excluded.as_str(), " ");
                }
                self.id_needles.iter().any(|n| compacted.contains(n.as_str()))
            })
    }
}

/// [`fold_text`] with the separators dropped: `"RUBRO#Mod-Ing"` → `"rubromoding"`.
fn compact(s: &str) -> String {
    fold_text(s).replace(' ', "")
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::direct_labor()
    }
}

impl CategoryClassifier for KeywordClassifier {
    fn matches(&self, record: &Value) -> bool {
        self.category_total(record).is_some() || self.text_matches(record) || self.id_matches(record)
    }

    fn category_total(&self, record: &Value) -> Option<f64> {
        self.profile
            .aggregate_fields
            .iter()
            .filter_map(|field| record.get(field.as_str()))
            .find_map(safe_number)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

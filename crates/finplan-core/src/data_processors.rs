use serde_json::Value;

use crate::models::{MonthSource, NormalizedRow};
use crate::month_key::{find_month_key, normalize_month_key, MonthKey};

// ── Field aliases ─────────────────────────────────────────────────────────────

/// Alias lists for each logical field, highest priority first.
///
/// Records written by different generations of the API spell the same fact
/// differently (`month` / `period` / `mes`, `amount` / `monto` / `value`).
pub mod aliases {
    pub const PROJECT_ID: &[&str] = &["projectId", "project_id", "proyectoId", "proyecto_id"];
    pub const PROJECT_CODE: &[&str] = &["projectCode", "project_code", "codigoProyecto", "codigo_proyecto"];
    pub const PARTITION_KEY: &[&str] = &["pk", "PK"];
    pub const SORT_KEY: &[&str] = &["sk", "SK"];

    pub const MONTH: &[&str] = &["month", "period", "periodo", "mes", "monthKey", "month_key"];
    pub const PAID_DATE: &[&str] = &[
        "paidAt",
        "paid_at",
        "paymentDate",
        "payment_date",
        "fechaPago",
        "fecha_pago",
        "paymentMonth",
        "payment_month",
    ];
    pub const START_MONTH: &[&str] = &[
        "startMonth",
        "start_month",
        "startDate",
        "start_date",
        "mesInicio",
        "mes_inicio",
        "fechaInicio",
    ];
    pub const DURATION: &[&str] = &[
        "durationMonths",
        "duration_months",
        "duration",
        "termMonths",
        "term_months",
        "duracion",
        "plazo",
        "meses",
    ];

    pub const ACTUAL: &[&str] = &[
        "actual",
        "actualAmount",
        "actual_amount",
        "paidAmount",
        "paid_amount",
        "realAmount",
        "montoReal",
        "amount",
        "monto",
        "value",
        "valor",
    ];
    pub const PLANNED: &[&str] = &[
        "planned",
        "plannedAmount",
        "planned_amount",
        "planAmount",
        "budget",
        "presupuesto",
        "amount",
        "monto",
        "value",
        "valor",
    ];
    pub const PROJECTED: &[&str] = &[
        "projected",
        "projectedAmount",
        "projected_amount",
        "forecast",
        "forecastAmount",
        "pronostico",
    ];
    pub const MONTHLY_AMOUNT: &[&str] = &[
        "monthlyAmount",
        "monthly_amount",
        "amountPerMonth",
        "costPerMonth",
        "montoMensual",
        "monto_mensual",
    ];
    pub const UNIT_COST: &[&str] = &["unitCost", "unit_cost", "costoUnitario", "costo_unitario", "rate"];
    pub const QUANTITY: &[&str] = &["quantity", "qty", "cantidad", "headcount", "fte"];
    pub const TOTAL: &[&str] = &["total", "totalAmount", "total_amount", "totalCost", "total_cost", "montoTotal"];
}

// ── Safe numbers ──────────────────────────────────────────────────────────────

/// Coerce a JSON value to a finite `f64`.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace, a
/// leading `$` and `,` thousands separators are tolerated). Everything else,
/// including `NaN`/`inf` strings, yields `None`.
pub fn safe_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Read a JSON value as a non-empty, trimmed string.
///
/// Numbers are rendered in their JSON form so numeric ids still resolve.
pub fn non_empty_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Accessors ─────────────────────────────────────────────────────────────────

/// One way of deriving a logical field from a raw record.
pub type Accessor<T> = fn(&Value) -> Option<T>;

/// Run `accessors` in order and return the first hit.
pub fn first_of<T>(record: &Value, accessors: &[Accessor<T>]) -> Option<T> {
    accessors.iter().find_map(|accessor| accessor(record))
}

/// First alias whose value converts successfully with `convert`.
pub fn resolve<T>(record: &Value, keys: &[&str], convert: impl Fn(&Value) -> Option<T>) -> Option<T> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(convert)
}

/// First alias carrying a finite number.
pub fn resolve_number(record: &Value, keys: &[&str]) -> Option<f64> {
    resolve(record, keys, safe_number)
}

/// First alias carrying a non-empty string.
pub fn resolve_str(record: &Value, keys: &[&str]) -> Option<String> {
    resolve(record, keys, non_empty_str)
}

/// First alias that normalizes to a month key.
pub fn resolve_month(record: &Value, keys: &[&str]) -> Option<MonthKey> {
    resolve(record, keys, normalize_month_key)
}

/// `true` when any of `keys` is present with a non-null value.
pub fn has_any(record: &Value, keys: &[&str]) -> bool {
    keys.iter()
        .any(|key| record.get(*key).is_some_and(|v| !v.is_null()))
}

pub const PROJECT_PREFIX: &str = "PROJECT#";

fn explicit_project(record: &Value) -> Option<String> {
    resolve_str(record, aliases::PROJECT_ID)
}

fn project_code(record: &Value) -> Option<String> {
    resolve_str(record, aliases::PROJECT_CODE)
}

/// `PROJECT#<id>` partition keys, prefix stripped.
fn partition_key_project(record: &Value) -> Option<String> {
    resolve(record, aliases::PARTITION_KEY, |v| {
        let pk = v.as_str()?.trim();
        let id = pk.strip_prefix(PROJECT_PREFIX)?.trim();
        (!id.is_empty()).then(|| id.to_string())
    })
}

/// Project identity accessors in priority order.
pub const PROJECT_ACCESSORS: &[Accessor<String>] =
    &[explicit_project, project_code, partition_key_project];

/// Every project identifier a record carries, across all known variants.
///
/// The project filter matches against any of these so a record keyed only by
/// code or only by partition key still belongs to its project.
pub fn project_id_candidates(record: &Value) -> Vec<String> {
    PROJECT_ACCESSORS
        .iter()
        .filter_map(|accessor| accessor(record))
        .collect()
}

fn period_month(record: &Value) -> Option<(MonthKey, MonthSource)> {
    resolve_month(record, aliases::MONTH).map(|m| (m, MonthSource::Period))
}

fn paid_date_month(record: &Value) -> Option<(MonthKey, MonthSource)> {
    resolve_month(record, aliases::PAID_DATE).map(|m| (m, MonthSource::Date))
}

fn sort_key_month(record: &Value) -> Option<(MonthKey, MonthSource)> {
    resolve(record, aliases::SORT_KEY, |v| find_month_key(v.as_str()?))
        .map(|m| (m, MonthSource::SortKey))
}

/// Month identity accessors in priority order.
pub const MONTH_ACCESSORS: &[Accessor<(MonthKey, MonthSource)>] =
    &[period_month, paid_date_month, sort_key_month];

fn duration_months(record: &Value) -> Option<u32> {
    let raw = resolve_number(record, aliases::DURATION)?;
    if raw < 1.0 || raw > f64::from(u32::MAX) {
        return None;
    }
    Some(raw.trunc() as u32)
}

// ── RowNormalizer ─────────────────────────────────────────────────────────────

/// Flattens arbitrarily shaped raw records into [`NormalizedRow`]s.
pub struct RowNormalizer;

impl RowNormalizer {
    /// Normalize one record. Never fails: unresolvable fields are `None`.
    pub fn normalize(record: &Value) -> NormalizedRow {
        let (month, month_source) = match first_of(record, MONTH_ACCESSORS) {
            Some((m, src)) => (Some(m), Some(src)),
            None => (None, None),
        };

        NormalizedRow {
            project_id: first_of(record, PROJECT_ACCESSORS),
            month,
            month_source,
            start_month: resolve_month(record, aliases::START_MONTH),
            duration_months: duration_months(record),
            actual: resolve_number(record, aliases::ACTUAL),
            planned: resolve_number(record, aliases::PLANNED),
            projected: resolve_number(record, aliases::PROJECTED),
            monthly_amount: resolve_number(record, aliases::MONTHLY_AMOUNT),
            unit_cost: resolve_number(record, aliases::UNIT_COST),
            quantity: resolve_number(record, aliases::QUANTITY),
            total: resolve_number(record, aliases::TOTAL),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

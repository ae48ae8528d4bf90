/// Format an amount with `,` thousands separators and a fixed number of
/// decimal places. No currency symbol: amounts are charted in whatever
/// currency the records were stored in.
///
/// # Examples
///
/// ```
/// use finplan_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1234.5, 2), "1,234.50");
/// assert_eq!(format_amount(1234567.0, 0), "1,234,567");
/// assert_eq!(format_amount(-9876.54, 1), "-9,876.5");
/// assert_eq!(format_amount(0.0, 2), "0.00");
/// ```
pub fn format_amount(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    // Rounding can turn a tiny negative into "-0.00"; keep the sign only when
    // a non-zero digit survives.
    if value < 0.0 && fixed.bytes().any(|b| (b'1'..=b'9').contains(&b)) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Like [`format_amount`] but always carries an explicit sign, for
/// variances: `+1,200.00`, `-35.50`, `0.00`.
///
/// # Examples
///
/// ```
/// use finplan_core::formatting::format_signed_amount;
///
/// assert_eq!(format_signed_amount(1200.0, 2), "+1,200.00");
/// assert_eq!(format_signed_amount(-35.5, 2), "-35.50");
/// assert_eq!(format_signed_amount(0.0, 2), "0.00");
/// ```
pub fn format_signed_amount(value: f64, decimals: usize) -> String {
    let formatted = format_amount(value, decimals);
    if value > 0.0 && formatted.bytes().any(|b| (b'1'..=b'9').contains(&b)) {
        format!("+{}", formatted)
    } else {
        formatted
    }
}

/// `actual / planned` as a percentage rounded to one decimal, or `None` when
/// nothing was planned.
pub fn execution_rate(actual: f64, planned: f64) -> Option<f64> {
    if planned == 0.0 || !planned.is_finite() || !actual.is_finite() {
        return None;
    }
    Some(((actual / planned) * 1000.0).round() / 10.0)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────

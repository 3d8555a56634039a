//! Scalar value normalization shared by every document parser
//!
//! Source templates are filled in by hand, so values arrive with stray
//! newlines, padding, currency symbols and the occasional vendor alias.

/// Marker the templates use for values that do not apply to a plan
pub const NOT_APPLICABLE: &str = "Not Applicable";

/// Strip newlines and control characters and trim surrounding whitespace
///
/// Absent input yields an empty string.
#[must_use]
pub fn clean(raw: Option<&str>) -> String {
    match raw {
        Some(value) => value
            .chars()
            .filter(|c| !c.is_control())
            .collect::<String>()
            .trim()
            .to_string(),
        None => String::new(),
    }
}

/// [`clean`] for values that are present
#[must_use]
pub fn clean_str(raw: &str) -> String {
    clean(Some(raw))
}

/// Clean a value and return `None` when nothing is left
#[must_use]
pub fn clean_opt(raw: Option<&str>) -> Option<String> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Lower-case a metal level and fold "expanded bronze" into "bronze"
#[must_use]
pub fn normalize_metal_level(raw: &str) -> String {
    let level = clean_str(raw).to_lowercase();
    if level == "expanded bronze" {
        "bronze".to_string()
    } else {
        level
    }
}

/// Reduce a currency or percentage cell to its leading amount
///
/// Returns `None` for `Not Applicable` and for blank input. Otherwise takes
/// the first whitespace-delimited token and drops `$` and `,`, so
/// `"$1,500 per person"` becomes `"1500"` and `"20% Coinsurance"` becomes
/// `"20%"`.
#[must_use]
pub fn unwrap_currency(raw: Option<&str>) -> Option<String> {
    let value = clean(raw);
    if value.is_empty() || value.eq_ignore_ascii_case(NOT_APPLICABLE) {
        return None;
    }
    value
        .split_whitespace()
        .next()
        .map(|token| token.replace(['$', ','], ""))
}

/// Interpret a yes/no style cell
#[must_use]
pub fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        clean(raw).to_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "x"
    )
}

/// Parse a numeric cell, tolerating `$`, `,` and `%` decoration
#[must_use]
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let value = clean(raw).replace(['$', ',', '%'], "");
    value.parse::<f64>().ok()
}

/// Normalize a header cell for tolerant column matching
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Split a comma separated list cell into cleaned, non-empty items
#[must_use]
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    clean(raw)
        .split([',', ';'])
        .map(clean_str)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Normalize a zip code cell to five digits
///
/// Numeric sheet columns lose leading zeros and may carry a `.0` suffix, so
/// `"1022.0"` becomes `"01022"`. Non-numeric values are only cleaned.
#[must_use]
pub fn normalize_zip(raw: Option<&str>) -> String {
    let value = clean(raw);
    let digits = value.strip_suffix(".0").unwrap_or(&value);
    if !digits.is_empty() && digits.len() < 5 && digits.chars().all(|c| c.is_ascii_digit()) {
        format!("{digits:0>5}")
    } else {
        digits.to_string()
    }
}

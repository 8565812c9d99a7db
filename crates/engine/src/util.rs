//! Internal helpers for parsing and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a decimal string with at most two fractional digits into an integer
/// scaled by 100 (`"12.5"` -> `1250`).
///
/// Accepts `.` or `,` as decimal separator. A leading `+`/`-` is accepted only
/// when `signed` is true.
pub(crate) fn parse_scaled_hundredths(s: &str, signed: bool, label: &str) -> ResultEngine<i64> {
    let empty = || EngineError::Validation(format!("empty {label}"));
    let invalid = || EngineError::Validation(format!("invalid {label}: {s}"));
    let overflow = || EngineError::Validation(format!("{label} too large"));

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };
    if rest.len() != trimmed.len() && !signed {
        return Err(invalid());
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let whole_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next();

    if parts.next().is_some() {
        return Err(invalid());
    }

    if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = whole_str.parse().map_err(|_| overflow())?;

    let frac: i64 = match frac_str {
        None | Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            match frac.len() {
                1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                2 => frac.parse::<i64>().map_err(|_| invalid())?,
                _ => {
                    return Err(EngineError::Validation(format!(
                        "too many decimals in {label}: {s}"
                    )));
                }
            }
        }
    };

    let total = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(overflow)?;

    if negative {
        total.checked_neg().ok_or_else(overflow)
    } else {
        Ok(total)
    }
}

/// Trim a required name, rejecting empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_rejects_sign() {
        assert!(parse_scaled_hundredths("-1", false, "percent").is_err());
        assert!(parse_scaled_hundredths("+1", false, "percent").is_err());
        assert_eq!(parse_scaled_hundredths("33.33", false, "percent").unwrap(), 3333);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_scaled_hundredths("", true, "amount").is_err());
        assert!(parse_scaled_hundredths("-", true, "amount").is_err());
        assert!(parse_scaled_hundredths("1.2.3", true, "amount").is_err());
        assert!(parse_scaled_hundredths("abc", true, "amount").is_err());
        assert!(parse_scaled_hundredths(".50", true, "amount").is_err());
        assert!(parse_scaled_hundredths("99999999999999999999", true, "amount").is_err());
    }

    #[test]
    fn required_name_is_trimmed() {
        assert_eq!(normalize_required_name("  Trip ", "group").unwrap(), "Trip");
        assert_eq!(
            normalize_required_name("   ", "group"),
            Err(EngineError::Validation(
                "group name must not be empty".to_string()
            ))
        );
    }
}

use crate::models::RegistryCode;

/// Registry codes are never shorter than this.
pub const MIN_REGISTRY_CODE_DIGITS: usize = 5;

/// Placeholder tokens upstream storage writes for a missing code.
const ABSENT_TOKENS: [&str; 3] = ["null", "nan", "none"];

/// Canonical digit string for a raw registry code, or `None` when the value
/// is absent or not a plausible code.
///
/// `860141`, `860141.0`, `"860141.0"` and `"0860141"` all yield `"860141"`.
pub fn normalize_registry_code(value: Option<&RegistryCode>) -> Option<String> {
    match value? {
        RegistryCode::Integer(n) => normalize_registry_code_str(&n.to_string()),
        RegistryCode::Float(x) => normalize_registry_code_str(&x.to_string()),
        RegistryCode::Text(s) => normalize_registry_code_str(s),
    }
}

/// String form of [`normalize_registry_code`].
pub fn normalize_registry_code_str(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || ABSENT_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digit_count(&cleaned) < MIN_REGISTRY_CODE_DIGITS {
        return None;
    }

    let parsed = if cleaned.contains('.') {
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite() && *x < u64::MAX as f64)
            .map(|x| x.trunc() as u64)
    } else {
        cleaned.parse::<u64>().ok()
    };

    let canonical = match parsed {
        Some(n) => n.to_string(),
        None => strip_digit_artifacts(&cleaned)?,
    };

    // Leading zeros or a fractional part can shrink the code below a valid
    // length. Rejecting it here keeps normalization idempotent: "00001234"
    // would otherwise yield "1234", which itself normalizes to `None`.
    (digit_count(&canonical) >= MIN_REGISTRY_CODE_DIGITS).then_some(canonical)
}

/// Fallback for values that do not parse as a number (several dots, or too
/// many digits for `u64`).
fn strip_digit_artifacts(cleaned: &str) -> Option<String> {
    let without_suffix = cleaned.strip_suffix(".0").unwrap_or(cleaned);
    let integer_part = without_suffix.split('.').next().unwrap_or_default();
    let digits = integer_part.trim_start_matches('0');
    (!digits.is_empty()).then(|| digits.to_string())
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RegistryCode {
        RegistryCode::Text(s.to_string())
    }

    #[test]
    fn float_artifacts_and_integers_agree() {
        let expected = Some("860141".to_string());
        assert_eq!(normalize_registry_code(Some(&text("860141.0"))), expected);
        assert_eq!(normalize_registry_code(Some(&text("860141"))), expected);
        assert_eq!(normalize_registry_code(Some(&RegistryCode::Integer(860141))), expected);
        assert_eq!(normalize_registry_code(Some(&RegistryCode::Float(860141.0))), expected);
    }

    #[test]
    fn zero_padding_is_removed() {
        assert_eq!(normalize_registry_code_str("000860141").as_deref(), Some("860141"));
        assert_eq!(normalize_registry_code_str("0860141.0").as_deref(), Some("860141"));
    }

    #[test]
    fn non_digits_are_stripped() {
        assert_eq!(normalize_registry_code_str(" BDNS 860141 ").as_deref(), Some("860141"));
        assert_eq!(normalize_registry_code_str("860.141").as_deref(), None);
        assert_eq!(normalize_registry_code_str("860141.9").as_deref(), Some("860141"));
    }

    #[test]
    fn absent_values_yield_none() {
        assert_eq!(normalize_registry_code(None), None);
        assert_eq!(normalize_registry_code(Some(&text(""))), None);
        assert_eq!(normalize_registry_code(Some(&text("nan"))), None);
        assert_eq!(normalize_registry_code(Some(&text("NaN"))), None);
        assert_eq!(normalize_registry_code(Some(&text("None"))), None);
        assert_eq!(normalize_registry_code(Some(&text("NULL"))), None);
        assert_eq!(normalize_registry_code(Some(&RegistryCode::Float(f64::NAN))), None);
        assert_eq!(normalize_registry_code(Some(&RegistryCode::Integer(0))), None);
    }

    #[test]
    fn short_codes_are_invalid() {
        assert_eq!(normalize_registry_code_str("1234"), None);
        assert_eq!(normalize_registry_code_str("12.34"), None);
        // Padded short codes stay invalid so the output always re-normalizes.
        assert_eq!(normalize_registry_code_str("00001234"), None);
        assert_eq!(normalize_registry_code_str("12345").as_deref(), Some("12345"));
    }

    #[test]
    fn unparsable_values_fall_back_to_digit_cleanup() {
        assert_eq!(
            normalize_registry_code_str("0012345.678.9").as_deref(),
            Some("12345")
        );
        assert_eq!(normalize_registry_code_str("....."), None);
        assert_eq!(
            normalize_registry_code_str("000123456789012345678901234567890").as_deref(),
            Some("123456789012345678901234567890")
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "860141",
            "860141.0",
            "000860141",
            "BDNS-860141",
            "12345.99",
            "0012345.678.9",
            "123456789012345678901234567890",
        ] {
            let once = normalize_registry_code_str(raw).unwrap();
            let twice = normalize_registry_code_str(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }
}

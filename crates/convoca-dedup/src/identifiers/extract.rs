use once_cell::sync::Lazy;
use regex::Regex;

// Registry announcement URLs end in `/convocatorias/<code>` (or the singular form).
static REGISTRY_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/convocatorias?/(\d+)").unwrap()
});

/// Pull a registry code out of either a bare code or a registry URL.
pub fn extract_registry_code(url_or_code: &str) -> Option<String> {
    let trimmed = url_or_code.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(trimmed.to_string());
    }

    REGISTRY_URL_REGEX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

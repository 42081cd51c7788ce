use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

use crate::models::{ProgramRecord, RegistryCode};

/// Punctuation that never changes the meaning of a program name.
const PUNCTUATION: &[char] = &['.', ',', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '-'];

/// Canonical form of a free-text field: lower-cased, diacritics stripped,
/// punctuation replaced by spaces, whitespace collapsed.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| c.general_category() != GeneralCategory::NonspacingMark)
        .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison keys of one record, computed once per detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord<'a> {
    pub id: &'a str,
    pub name: String,
    pub organism: String,
    pub registry_code: Option<String>,
}

pub fn normalize_record(record: &ProgramRecord) -> NormalizedRecord<'_> {
    NormalizedRecord {
        id: record.id.as_str(),
        name: normalize_text(&record.name),
        organism: normalize_text(&record.organism),
        registry_code: record.registry_code.as_ref().and_then(RegistryCode::normalized),
    }
}

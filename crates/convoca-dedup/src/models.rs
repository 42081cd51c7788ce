use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ─── Program record ────────────────────────────────────────

/// A financing-program announcement, either already catalogued or freshly
/// extracted.
///
/// Field aliases accept the catalogue's stored JSON (`nombre`, `organismo`,
/// `codigo_bdns`). Text fields tolerate `null` and numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, alias = "nombre", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, alias = "organismo", deserialize_with = "lenient_string")]
    pub organism: String,
    #[serde(
        default,
        alias = "codigo_bdns",
        skip_serializing_if = "Option::is_none"
    )]
    pub registry_code: Option<RegistryCode>,
}

impl ProgramRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_organism(mut self, organism: impl Into<String>) -> Self {
        self.organism = organism.into();
        self
    }

    pub fn with_registry_code(mut self, code: impl Into<RegistryCode>) -> Self {
        self.registry_code = Some(code.into());
        self
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Raw registry ("BDNS") code as it arrives from upstream storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryCode {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RegistryCode {
    /// Canonical digit string, or `None` when absent or invalid.
    pub fn normalized(&self) -> Option<String> {
        crate::identifiers::registry_code::normalize_registry_code(Some(self))
    }
}

impl fmt::Display for RegistryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RegistryCode {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RegistryCode {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for RegistryCode {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RegistryCode {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// ─── Match results ─────────────────────────────────────────

/// How sure the cascade is that a candidate duplicates the new record.
/// Variants are ordered from least to most confident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    MediumHigh,
    High,
    VeryHigh,
}

impl Confidence {
    /// Curator-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::VeryHigh => "Muy Alta",
            Self::High => "Alta",
            Self::MediumHigh => "Media-Alta",
            Self::Medium => "Media",
            Self::Low => "Baja",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which tier of the classification cascade produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactRegistryCode,
    ExactId,
    ExactNameAndOrganism,
    SimilarNameSameOrganism,
    SimilarRegistryCode,
    SimilarNameDifferentOrganism,
    AnnualVariation,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactRegistryCode => "exact_registry_code",
            Self::ExactId => "exact_id",
            Self::ExactNameAndOrganism => "exact_name_and_organism",
            Self::SimilarNameSameOrganism => "similar_name_same_organism",
            Self::SimilarRegistryCode => "similar_registry_code",
            Self::SimilarNameDifferentOrganism => "similar_name_different_organism",
            Self::AnnualVariation => "annual_variation",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate flagged as a likely duplicate. Borrows the catalogued record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult<'a> {
    pub candidate: &'a ProgramRecord,
    pub confidence: Confidence,
    /// 0..=100, higher is a more certain duplicate.
    pub score: u8,
    pub match_type: MatchType,
    pub reason: String,
}

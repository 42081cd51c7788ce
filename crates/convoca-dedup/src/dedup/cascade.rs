//! Ordered tier cascade deciding whether one candidate duplicates the new
//! record. The first tier that fires wins; lower tiers are not evaluated.

use std::cell::OnceCell;

use crate::models::{Confidence, MatchResult, MatchType, ProgramRecord};
use crate::normalize::{NormalizedRecord, normalize_record};
use crate::similarity::{is_annual_variation, registry_code_similarity, text_similarity};

/// Name similarity needed alongside an identical organism.
pub const SAME_ORGANISM_NAME_THRESHOLD: f64 = 0.85;
/// Registry-code similarity that suggests a typo in the code.
pub const SIMILAR_CODE_THRESHOLD: f64 = 0.8;
/// Name similarity that is suspicious even across organisms.
pub const CROSS_ORGANISM_NAME_THRESHOLD: f64 = 0.9;

pub const EXACT_REGISTRY_CODE_SCORE: u8 = 100;
pub const EXACT_ID_SCORE: u8 = 95;
pub const EXACT_NAME_AND_ORGANISM_SCORE: u8 = 90;
pub const ANNUAL_VARIATION_SCORE: u8 = 45;

/// The new record and one candidate, both normalized. Name similarity is
/// computed at most once and shared by the tiers that need it.
pub struct CandidatePair<'n, 'c> {
    pub new: &'n NormalizedRecord<'n>,
    pub candidate: &'c NormalizedRecord<'c>,
    name_similarity: OnceCell<f64>,
}

impl<'n, 'c> CandidatePair<'n, 'c> {
    pub fn new(new: &'n NormalizedRecord<'n>, candidate: &'c NormalizedRecord<'c>) -> Self {
        Self {
            new,
            candidate,
            name_similarity: OnceCell::new(),
        }
    }

    pub fn name_similarity(&self) -> f64 {
        *self
            .name_similarity
            .get_or_init(|| text_similarity(&self.new.name, &self.candidate.name))
    }

    fn same_organism(&self) -> bool {
        !self.new.organism.is_empty() && self.new.organism == self.candidate.organism
    }

    fn registry_codes(&self) -> Option<(&str, &str)> {
        Some((
            self.new.registry_code.as_deref()?,
            self.candidate.registry_code.as_deref()?,
        ))
    }
}

/// Score and explanation produced by a firing tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierHit {
    pub score: u8,
    pub reason: String,
}

/// One rule of the cascade: a predicate that, when it holds, also scores.
pub struct Tier {
    pub match_type: MatchType,
    pub confidence: Confidence,
    rule: fn(&CandidatePair<'_, '_>) -> Option<TierHit>,
}

impl Tier {
    pub fn evaluate(&self, pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
        (self.rule)(pair)
    }
}

/// Tiers in priority order.
pub static TIERS: [Tier; 7] = [
    Tier {
        match_type: MatchType::ExactRegistryCode,
        confidence: Confidence::VeryHigh,
        rule: exact_registry_code,
    },
    Tier {
        match_type: MatchType::ExactId,
        confidence: Confidence::VeryHigh,
        rule: exact_id,
    },
    Tier {
        match_type: MatchType::ExactNameAndOrganism,
        confidence: Confidence::VeryHigh,
        rule: exact_name_and_organism,
    },
    Tier {
        match_type: MatchType::SimilarNameSameOrganism,
        confidence: Confidence::High,
        rule: similar_name_same_organism,
    },
    Tier {
        match_type: MatchType::SimilarRegistryCode,
        confidence: Confidence::MediumHigh,
        rule: similar_registry_code,
    },
    Tier {
        match_type: MatchType::SimilarNameDifferentOrganism,
        confidence: Confidence::Medium,
        rule: similar_name_different_organism,
    },
    Tier {
        match_type: MatchType::AnnualVariation,
        confidence: Confidence::Medium,
        rule: annual_variation,
    },
];

/// `base + (similarity - floor) * factor`, truncated like an integer cast.
fn scaled_score(base: f64, similarity: f64, floor: f64, factor: f64) -> u8 {
    (base + (similarity - floor) * factor).clamp(0.0, 100.0) as u8
}

fn percent(similarity: f64) -> String {
    format!("{:.0}%", similarity * 100.0)
}

fn exact_registry_code(pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
    let (new, existing) = pair.registry_codes()?;
    (new == existing).then(|| TierHit {
        score: EXACT_REGISTRY_CODE_SCORE,
        reason: format!("Código BDNS idéntico: {new}"),
    })
}

fn exact_id(pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
    let new = pair.new.id;
    (!new.is_empty() && new == pair.candidate.id).then(|| TierHit {
        score: EXACT_ID_SCORE,
        reason: format!("Identificador idéntico: {new}"),
    })
}

fn exact_name_and_organism(pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
    let name = &pair.new.name;
    (!name.is_empty() && *name == pair.candidate.name && pair.same_organism()).then(|| TierHit {
        score: EXACT_NAME_AND_ORGANISM_SCORE,
        reason: format!("Nombre y organismo idénticos: {name} ({})", pair.new.organism),
    })
}

fn similar_name_same_organism(pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
    if !pair.same_organism() {
        return None;
    }
    let similarity = pair.name_similarity();
    (similarity >= SAME_ORGANISM_NAME_THRESHOLD).then(|| TierHit {
        score: scaled_score(80.0, similarity, SAME_ORGANISM_NAME_THRESHOLD, 67.0),
        reason: format!(
            "Nombre muy similar ({}) y mismo organismo",
            percent(similarity)
        ),
    })
}

fn similar_registry_code(pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
    let (new, existing) = pair.registry_codes()?;
    if new == existing {
        return None;
    }
    let similarity = registry_code_similarity(new, existing);
    (similarity >= SIMILAR_CODE_THRESHOLD).then(|| TierHit {
        score: scaled_score(70.0, similarity, SIMILAR_CODE_THRESHOLD, 50.0),
        reason: format!(
            "Código BDNS muy similar ({}): {new} vs {existing}",
            percent(similarity)
        ),
    })
}

fn similar_name_different_organism(pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
    let similarity = pair.name_similarity();
    (similarity >= CROSS_ORGANISM_NAME_THRESHOLD).then(|| TierHit {
        score: scaled_score(50.0, similarity, CROSS_ORGANISM_NAME_THRESHOLD, 100.0),
        reason: format!(
            "Nombre casi idéntico ({}) pero organismos diferentes",
            percent(similarity)
        ),
    })
}

fn annual_variation(pair: &CandidatePair<'_, '_>) -> Option<TierHit> {
    (pair.new.organism == pair.candidate.organism
        && is_annual_variation(&pair.new.name, &pair.candidate.name))
    .then(|| TierHit {
        score: ANNUAL_VARIATION_SCORE,
        reason: "Posible variación anual de la misma convocatoria".to_string(),
    })
}

/// Run the cascade over an already-normalized pair.
pub fn classify_normalized<'a>(
    new: &NormalizedRecord<'_>,
    candidate: &NormalizedRecord<'_>,
    record: &'a ProgramRecord,
) -> Option<MatchResult<'a>> {
    let pair = CandidatePair::new(new, candidate);
    TIERS.iter().find_map(|tier| {
        tier.evaluate(&pair).map(|hit| MatchResult {
            candidate: record,
            confidence: tier.confidence,
            score: hit.score,
            match_type: tier.match_type,
            reason: hit.reason,
        })
    })
}

/// Classify `candidate` against `new_record`; `None` when no tier fires.
pub fn classify<'a>(
    new_record: &ProgramRecord,
    candidate: &'a ProgramRecord,
) -> Option<MatchResult<'a>> {
    let new = normalize_record(new_record);
    let existing = normalize_record(candidate);
    classify_normalized(&new, &existing, candidate)
}

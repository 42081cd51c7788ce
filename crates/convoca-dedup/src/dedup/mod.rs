pub mod cascade;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE, DedupConfig};
use crate::models::{MatchResult, ProgramRecord};
use crate::normalize::normalize_record;

pub use cascade::{CandidatePair, TIERS, Tier, TierHit, classify, classify_normalized};

/// Ranks catalogued programs that may duplicate a newly extracted one.
#[derive(Debug, Clone)]
pub struct DuplicateFinder {
    min_score: u8,
    max_results: usize,
    parallel: bool,
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_results: DEFAULT_MAX_RESULTS,
            parallel: true,
        }
    }
}

impl DuplicateFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DedupConfig) -> Self {
        Self {
            min_score: config.min_score.min(100),
            max_results: config.max_results,
            parallel: config.parallel,
        }
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score.min(100);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Classify candidates on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Classify every candidate, then sort, threshold and cap the matches.
    pub fn find_duplicates<'a>(
        &self,
        new_record: &ProgramRecord,
        candidates: &'a [ProgramRecord],
    ) -> Vec<MatchResult<'a>> {
        let new = normalize_record(new_record);

        let classify_one = |record: &'a ProgramRecord| {
            let existing = normalize_record(record);
            let result = classify_normalized(&new, &existing, record);
            if let Some(m) = &result {
                debug!(
                    candidate = %record.id,
                    match_type = %m.match_type,
                    score = m.score,
                    "duplicate candidate"
                );
            }
            result
        };

        // Both branches keep input order, which the stable sort relies on.
        let matches: Vec<MatchResult<'a>> = if self.parallel {
            candidates.par_iter().filter_map(classify_one).collect()
        } else {
            candidates.iter().filter_map(classify_one).collect()
        };

        let ranked = rank_matches(matches, self.min_score, self.max_results);
        info!(
            record = %new_record.name,
            candidates = candidates.len(),
            duplicates = ranked.len(),
            "duplicate check finished"
        );
        ranked
    }
}

/// Sort by score (stable, highest first), drop scores below `min_score`,
/// keep at most `max_results`.
pub fn rank_matches(
    mut matches: Vec<MatchResult<'_>>,
    min_score: u8,
    max_results: usize,
) -> Vec<MatchResult<'_>> {
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.retain(|m| m.score >= min_score);
    matches.truncate(max_results);
    matches
}

/// One-shot detection with explicit threshold and cap.
pub fn find_duplicates<'a>(
    new_record: &ProgramRecord,
    candidates: &'a [ProgramRecord],
    min_score: u8,
    max_results: usize,
) -> Vec<MatchResult<'a>> {
    DuplicateFinder::new()
        .with_min_score(min_score)
        .with_max_results(max_results)
        .find_duplicates(new_record, candidates)
}

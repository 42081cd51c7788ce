//! Convoca Dedup: duplicate-candidate detection for financing-program
//! announcements ("convocatorias").

pub mod error;
pub mod config;
pub mod models;
pub mod normalize;
pub mod identifiers;
pub mod similarity;
pub mod dedup;
pub mod catalog;

pub use error::{DedupError, ExitCode, Result};
pub use config::DedupConfig;
pub use models::{Confidence, MatchResult, MatchType, ProgramRecord, RegistryCode};
pub use normalize::normalize_text;
pub use identifiers::{extract_registry_code, normalize_registry_code, normalize_registry_code_str};
pub use dedup::{DuplicateFinder, classify, find_duplicates, rank_matches};

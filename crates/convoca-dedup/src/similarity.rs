//! Similarity scorers over normalized text and registry codes.
//!
//! Every scorer returns a value in `[0, 1]` and treats empty input as "no
//! signal" (`0.0`). Text scorers expect input already passed through
//! [`crate::normalize::normalize_text`]; lengths are counted in chars.

use std::collections::HashSet;
use std::hash::Hash;

use once_cell::sync::Lazy;
use regex::Regex;

pub const WORD_JACCARD_WEIGHT: f64 = 0.4;
pub const BIGRAM_WEIGHT: f64 = 0.3;
pub const LENGTH_RATIO_WEIGHT: f64 = 0.1;
pub const CONTAINMENT_WEIGHT: f64 = 0.2;

/// Equal-length codes differing in more positions than this carry no signal.
pub const MAX_DIGIT_MISMATCHES: usize = 2;
/// Codes whose lengths differ by more than this carry no signal.
pub const MAX_CODE_LENGTH_DIFFERENCE: usize = 2;

/// Year-stripped names at least this similar are annual variations.
pub const ANNUAL_VARIATION_THRESHOLD: f64 = 0.85;
/// Lower bar when both names share a recurring-call marker.
pub const ANNUAL_MARKER_THRESHOLD: f64 = 0.70;

static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

// Each group must match in both names for the marker rule to apply.
static ANNUAL_MARKERS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"\b(?:convocatoria|programa|ayuda|subvencion)\b").unwrap(),
        Regex::new(r"\b(?:primera|segunda|tercera)\b").unwrap(),
        Regex::new(r"\b(?:i|ii|iii|iv|v)\b").unwrap(),
    ]
});

fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Jaccard similarity of the whitespace-separated word sets.
pub fn word_jaccard(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    jaccard(&words_a, &words_b)
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Jaccard similarity of the character-bigram shingle sets.
pub fn bigram_similarity(a: &str, b: &str) -> f64 {
    jaccard(&bigrams(a), &bigrams(b))
}

pub fn length_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    1.0 - len_a.abs_diff(len_b) as f64 / len_a.max(len_b).max(1) as f64
}

/// Shorter/longer length ratio when one string contains the other, else 0.
pub fn containment_ratio(a: &str, b: &str) -> f64 {
    if !(a.contains(b) || b.contains(a)) {
        return 0.0;
    }
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let longest = len_a.max(len_b);
    if longest == 0 {
        return 0.0;
    }
    len_a.min(len_b) as f64 / longest as f64
}

/// Weighted blend of the word, bigram, length and containment scorers.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let combined = word_jaccard(a, b) * WORD_JACCARD_WEIGHT
        + bigram_similarity(a, b) * BIGRAM_WEIGHT
        + length_ratio(a, b) * LENGTH_RATIO_WEIGHT
        + containment_ratio(a, b) * CONTAINMENT_WEIGHT;
    combined.min(1.0)
}

/// Unit-cost edit distance, two rolling rows sized by the shorter input.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return long.len();
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let insertion = previous[j + 1] + 1;
            let deletion = current[j] + 1;
            let substitution = previous[j] + usize::from(lc != sc);
            current[j + 1] = insertion.min(deletion).min(substitution);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

/// `1 - levenshtein / longest length`; 0 when either side is empty.
pub fn normalized_edit_similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / len_a.max(len_b) as f64
}

/// Typo-oriented similarity between two canonical registry codes.
///
/// Equal lengths use the share of matching positions, but only up to
/// [`MAX_DIGIT_MISMATCHES`] differing digits; more than that is no signal.
pub fn registry_code_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();

    if len_a == len_b {
        let mismatches = a.chars().zip(b.chars()).filter(|(x, y)| x != y).count();
        if mismatches <= MAX_DIGIT_MISMATCHES {
            return 1.0 - mismatches as f64 / len_a as f64;
        }
        return 0.0;
    }

    if len_a.abs_diff(len_b) <= MAX_CODE_LENGTH_DIFFERENCE {
        return normalized_edit_similarity(a, b);
    }

    0.0
}

/// Remove 19xx/20xx year tokens and collapse the leftover whitespace.
pub fn strip_years(name: &str) -> String {
    YEAR_REGEX
        .replace_all(name, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two normalized names look like the same call re-published for a
/// different year or edition.
pub fn is_annual_variation(a: &str, b: &str) -> bool {
    let a = strip_years(a);
    let b = strip_years(b);
    let similarity = text_similarity(&a, &b);

    if similarity >= ANNUAL_VARIATION_THRESHOLD {
        return true;
    }

    similarity >= ANNUAL_MARKER_THRESHOLD
        && ANNUAL_MARKERS
            .iter()
            .any(|marker| marker.is_match(&a) && marker.is_match(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn word_jaccard_counts_shared_words() {
        assert!((word_jaccard("ayudas a startups", "ayudas a pymes") - 0.5).abs() < EPS);
        assert_eq!(word_jaccard("", ""), 0.0);
        assert_eq!(word_jaccard("plan renove", "plan renove"), 1.0);
    }

    #[test]
    fn bigram_similarity_handles_short_strings() {
        assert_eq!(bigram_similarity("a", "b"), 0.0);
        assert_eq!(bigram_similarity("", ""), 0.0);
        // {ab, bc} vs {ab, bd}
        assert!((bigram_similarity("abc", "abd") - 1.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn length_ratio_and_containment() {
        assert_eq!(length_ratio("", ""), 1.0);
        assert!((length_ratio("abcd", "ab") - 0.5).abs() < EPS);
        assert!((containment_ratio("ayuda i+d 2024", "ayuda i+d") - 9.0 / 14.0).abs() < EPS);
        assert_eq!(containment_ratio("plan a", "plan b"), 0.0);
        assert_eq!(containment_ratio("", ""), 0.0);
    }

    #[test]
    fn text_similarity_identity_and_empty() {
        assert_eq!(text_similarity("programa neotec", "programa neotec"), 1.0);
        assert_eq!(text_similarity("", "programa neotec"), 0.0);
        assert_eq!(text_similarity("", ""), 0.0);
    }

    #[test]
    fn text_similarity_is_symmetric() {
        let names = [
            "programa de ayudas a startups 2024",
            "programa de ayudas a startups 2023",
            "ayuda i+d",
            "ayuda i+d 2024",
            "bonos de formacion",
            "a",
        ];
        for a in names {
            for b in names {
                assert_eq!(text_similarity(a, b), text_similarity(b, a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn text_similarity_stays_in_unit_range() {
        let sim = text_similarity(
            "ayudas para proyectos de investigacion industrial y desarrollo experimental",
            "ayudas para proyectos de investigacion industrial y desarrollo experimental 2024",
        );
        assert!(sim > 0.92 && sim < 0.93, "got {sim}");
    }

    #[test]
    fn levenshtein_matches_reference_implementation() {
        let pairs = [
            ("", ""),
            ("", "860141"),
            ("860141", "860142"),
            ("860141", "8601411"),
            ("1234567890", "2345678901"),
            ("kitten", "sitting"),
            ("subvención", "subvencion"),
        ];
        for (a, b) in pairs {
            assert_eq!(levenshtein(a, b), strsim::levenshtein(a, b), "{a} / {b}");
            assert_eq!(levenshtein(a, b), levenshtein(b, a));
        }
    }

    #[test]
    fn normalized_edit_similarity_bounds() {
        assert_eq!(normalized_edit_similarity("", "123"), 0.0);
        assert_eq!(normalized_edit_similarity("12345", "12345"), 1.0);
        assert!((normalized_edit_similarity("860141", "86014") - 5.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn registry_code_similarity_single_digit_typo() {
        assert_eq!(registry_code_similarity("860141", "860141"), 1.0);
        assert!((registry_code_similarity("860141", "860142") - 5.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn registry_code_similarity_gates_many_mismatches() {
        // Three positions differ: no signal even though 1 - 3/6 would be 0.5.
        assert_eq!(registry_code_similarity("860141", "860999"), 0.0);
        // Rotated digits are far apart position-wise.
        assert_eq!(registry_code_similarity("1234567890", "2345678901"), 0.0);
    }

    #[test]
    fn registry_code_similarity_uneven_lengths() {
        assert!((registry_code_similarity("860141", "8601411") - 6.0 / 7.0).abs() < EPS);
        assert!((registry_code_similarity("8601415", "86014150") - 7.0 / 8.0).abs() < EPS);
        assert_eq!(registry_code_similarity("860141", "860141000"), 0.0);
        assert_eq!(registry_code_similarity("", "860141"), 0.0);
    }

    #[test]
    fn strip_years_removes_only_years() {
        assert_eq!(strip_years("programa 2024 de ayudas 1999"), "programa de ayudas");
        assert_eq!(strip_years("linea 2100 y 12024"), "linea 2100 y 12024");
    }

    #[test]
    fn annual_variation_by_year_only() {
        assert!(is_annual_variation(
            "programa de ayudas a startups 2024",
            "programa de ayudas a startups 2023",
        ));
    }

    #[test]
    fn annual_variation_with_marker_word() {
        let a = "convocatoria de ayudas a la contratacion de personal investigador en centros publicos de investigacion 2023";
        let b = "convocatoria de ayudas para la contratacion de personal investigador en centros publicos de investigacion 2024";
        assert!(is_annual_variation(a, b));

        // Same wording without a marker falls short of the plain threshold.
        let a = "plan de ayudas a la contratacion de personal investigador en centros publicos de investigacion 2023";
        let b = "plan de ayudas para la contratacion de personal investigador en centros publicos de investigacion 2024";
        assert!(!is_annual_variation(a, b));
    }

    fn assert_marker_band(a: &str, b: &str) {
        let sim = text_similarity(&strip_years(a), &strip_years(b));
        assert!(
            (ANNUAL_MARKER_THRESHOLD..ANNUAL_VARIATION_THRESHOLD).contains(&sim),
            "{a} / {b}: {sim}"
        );
    }

    #[test]
    fn annual_variation_with_ordinal_edition() {
        let a = "segunda edicion de bonos de formacion digital para autonomos 2023";
        let b = "segunda edicion de los bonos de formacion digital para autonomos 2024";
        assert_marker_band(a, b);
        assert!(is_annual_variation(a, b));

        // Without the ordinal the same edit stays below the plain threshold.
        let a = "edicion de bonos de formacion digital para autonomos 2023";
        let b = "edicion de los bonos de formacion digital para autonomos 2024";
        assert_marker_band(a, b);
        assert!(!is_annual_variation(a, b));

        // An ordinal on one side only does not count.
        let a = "bonos de formacion digital para autonomos 2023";
        let b = "segunda edicion de bonos de formacion digital para autonomos 2024";
        assert_marker_band(a, b);
        assert!(!is_annual_variation(a, b));
    }

    #[test]
    fn annual_variation_with_roman_numeral() {
        let a = "plan de bonos ii de formacion digital para autonomos";
        let b = "plan de bonos ii para la formacion digital de autonomos";
        assert_marker_band(a, b);
        assert!(is_annual_variation(a, b));

        let a = "plan de bonos de formacion digital para autonomos";
        let b = "plan de bonos para la formacion digital de autonomos";
        assert_marker_band(a, b);
        assert!(!is_annual_variation(a, b));

        let a = "plan de bonos de formacion digital para autonomos";
        let b = "plan de bonos iii de formacion digital para autonomos";
        assert_marker_band(a, b);
        assert!(!is_annual_variation(a, b));
    }

    #[test]
    fn unrelated_names_are_not_annual_variations() {
        assert!(!is_annual_variation("bonos de formacion 2024", "cheques de innovacion 2023"));
        assert!(!is_annual_variation("", ""));
    }
}

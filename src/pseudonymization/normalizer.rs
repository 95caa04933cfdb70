//! Name normalization
//!
//! Pure text helpers shared by the merger, the clusterer and the assignment
//! engine:
//!
//! - [`strip_titles`] removes French honorifics (`Dr.`, `Mme`, `Maître`, ...)
//! - [`strip_prepositions`] removes one leading locative preposition
//! - [`parse_person_name`] splits a PERSON mention into first/last components
//!
//! Hyphenated tokens such as `Jean-Pierre` are always treated as one word.

use crate::pseudonymization::models::{EntityType, NameComponents};
use std::sync::OnceLock;

/// Honorific prefix, consumed with its period or when followed by a
/// non-word character. Longer alternatives come first.
const TITLE_PATTERN: &str = r"(?i)^(?:docteur|professeur|mademoiselle|madame|monsieur|maître|maitre|prof|mlle|mme|dr|pr|mr|me|m)(?:\.|(?=\W|$))\s*";

/// One leading locative preposition. Articles (`la`, `le`, `les`) belong to
/// place names and are never stripped.
const PREPOSITION_PATTERN: &str = r"(?i)^(?:(?:à|au|aux|en|de|du|des)\s+|[dl]['’]\s*)";

fn title_regex() -> &'static fancy_regex::Regex {
    static REGEX: OnceLock<fancy_regex::Regex> = OnceLock::new();
    REGEX.get_or_init(|| fancy_regex::Regex::new(TITLE_PATTERN).expect("title pattern is valid"))
}

fn preposition_regex() -> &'static regex::Regex {
    static REGEX: OnceLock<regex::Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        regex::Regex::new(PREPOSITION_PATTERN).expect("preposition pattern is valid")
    })
}

/// Collapse runs of whitespace to single spaces and trim
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip honorific titles from the start of a name, repeatedly
///
/// ```
/// use gdpr_pseudonymizer::pseudonymization::normalizer::strip_titles;
///
/// assert_eq!(strip_titles("Dr. Marie Dubois"), "Marie Dubois");
/// assert_eq!(strip_titles("M. le Pr Martin"), "le Pr Martin");
/// assert_eq!(strip_titles("Marie"), "Marie");
/// ```
pub fn strip_titles(text: &str) -> String {
    let mut current = collapse_whitespace(text);

    loop {
        let end = match title_regex().find(&current) {
            Ok(Some(m)) if m.end() > 0 => m.end(),
            // A backtracking-limit error is treated as "no title"
            _ => break,
        };
        current = current[end..].trim_start().to_string();
    }

    current
}

/// Strip at most one leading locative preposition from a location mention
///
/// ```
/// use gdpr_pseudonymizer::pseudonymization::normalizer::strip_prepositions;
///
/// assert_eq!(strip_prepositions("à Paris"), "Paris");
/// assert_eq!(strip_prepositions("d'Orléans"), "Orléans");
/// assert_eq!(strip_prepositions("Le Havre"), "Le Havre");
/// ```
pub fn strip_prepositions(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    match preposition_regex().find(&collapsed) {
        Some(m) if m.end() < collapsed.len() => collapsed[m.end()..].to_string(),
        _ => collapsed,
    }
}

/// Parse a PERSON mention into first/last name components
///
/// - no word: `(None, None)`, ambiguous
/// - one word: `(word, None)`, ambiguous
/// - two words: `(first, last)`
/// - three or more: everything but the last word is the first name, ambiguous
pub fn parse_person_name(text: &str) -> NameComponents {
    let stripped = strip_titles(text);
    let words: Vec<&str> = stripped.split_whitespace().collect();

    match words.as_slice() {
        [] => NameComponents {
            first_name: None,
            last_name: None,
            is_ambiguous: true,
        },
        [single] => NameComponents {
            first_name: Some((*single).to_string()),
            last_name: None,
            is_ambiguous: true,
        },
        [first, last] => NameComponents {
            first_name: Some((*first).to_string()),
            last_name: Some((*last).to_string()),
            is_ambiguous: false,
        },
        [init @ .., last] => NameComponents {
            first_name: Some(init.join(" ")),
            last_name: Some((*last).to_string()),
            is_ambiguous: true,
        },
    }
}

/// Normalized surface form used as a mapping key for an entity type
pub fn normalize_entity_text(text: &str, entity_type: EntityType) -> String {
    match entity_type {
        EntityType::Person => strip_titles(text),
        EntityType::Location => strip_prepositions(text),
        EntityType::Org => collapse_whitespace(text),
    }
}

/// Case-insensitive comparison key used by the clusterer
pub fn comparison_key(text: &str, entity_type: EntityType) -> String {
    normalize_entity_text(text, entity_type).to_lowercase()
}

/// Whether a PERSON mention is only an honorific ("Mme", "Dr.")
pub fn is_bare_title(text: &str) -> bool {
    !text.trim().is_empty() && strip_titles(text).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Dr. Marie Dubois", "Marie Dubois" ; "doctor with period")]
    #[test_case("Dr Marie Dubois", "Marie Dubois" ; "doctor without period")]
    #[test_case("docteur Marie Dubois", "Marie Dubois" ; "lowercase long form")]
    #[test_case("M. Olivier Durand", "Olivier Durand" ; "monsieur abbreviation")]
    #[test_case("Mme Alice Durand", "Alice Durand" ; "madame abbreviation")]
    #[test_case("Mme.Durand", "Durand" ; "period glued to name")]
    #[test_case("MAÎTRE Leroy", "Leroy" ; "uppercase accented title")]
    #[test_case("Pr. Dr. Jean Martin", "Jean Martin" ; "stacked titles")]
    #[test_case("Marie Dubois", "Marie Dubois" ; "no title")]
    #[test_case("Mercier", "Mercier" ; "title prefix inside word")]
    #[test_case("Drouet", "Drouet" ; "dr prefix inside word")]
    #[test_case("Madeleine Prat", "Madeleine Prat" ; "madame prefix inside word")]
    fn test_strip_titles(input: &str, expected: &str) {
        assert_eq!(strip_titles(input), expected);
    }

    #[test]
    fn test_strip_titles_bare_title() {
        assert_eq!(strip_titles("Mme"), "");
        assert_eq!(strip_titles("Dr."), "");
        assert!(is_bare_title("Mme"));
        assert!(is_bare_title("  Monsieur  "));
        assert!(!is_bare_title("Mme Durand"));
        assert!(!is_bare_title(""));
    }

    #[test_case("à Paris", "Paris" ; "a grave")]
    #[test_case("À Lyon", "Lyon" ; "uppercase a grave")]
    #[test_case("au Mans", "Mans" ; "au")]
    #[test_case("aux Sables-d'Olonne", "Sables-d'Olonne" ; "aux")]
    #[test_case("en Bretagne", "Bretagne" ; "en")]
    #[test_case("de Marseille", "Marseille" ; "de")]
    #[test_case("du Var", "Var" ; "du")]
    #[test_case("des Landes", "Landes" ; "des")]
    #[test_case("d'Orléans", "Orléans" ; "elided de")]
    #[test_case("d’Avignon", "Avignon" ; "elided de typographic apostrophe")]
    #[test_case("l'Isère", "Isère" ; "elided article")]
    fn test_strip_prepositions(input: &str, expected: &str) {
        assert_eq!(strip_prepositions(input), expected);
    }

    #[test_case("La Rochelle" ; "la is kept")]
    #[test_case("Le Havre" ; "le is kept")]
    #[test_case("Les Sables" ; "les is kept")]
    #[test_case("Denain" ; "de prefix inside word")]
    #[test_case("Enghien" ; "en prefix inside word")]
    fn test_strip_prepositions_keeps_place_name(input: &str) {
        assert_eq!(strip_prepositions(input), input);
    }

    #[test]
    fn test_strip_prepositions_only_once() {
        assert_eq!(strip_prepositions("de la Rochelle"), "la Rochelle");
        assert_eq!(strip_prepositions("à d'Anvers"), "d'Anvers");
    }

    #[test]
    fn test_parse_empty() {
        let parsed = parse_person_name("   ");
        assert_eq!(parsed.first_name, None);
        assert_eq!(parsed.last_name, None);
        assert!(parsed.is_ambiguous);
    }

    #[test]
    fn test_parse_single_word() {
        let parsed = parse_person_name("Mme Durand");
        assert_eq!(parsed.first_name.as_deref(), Some("Durand"));
        assert_eq!(parsed.last_name, None);
        assert!(parsed.is_ambiguous);
        assert!(parsed.is_standalone());
    }

    #[test]
    fn test_parse_two_words() {
        let parsed = parse_person_name("Dr. Marie Dubois");
        assert_eq!(parsed.first_name.as_deref(), Some("Marie"));
        assert_eq!(parsed.last_name.as_deref(), Some("Dubois"));
        assert!(!parsed.is_ambiguous);
    }

    #[test]
    fn test_parse_three_words() {
        let parsed = parse_person_name("Jean Marc Dupont");
        assert_eq!(parsed.first_name.as_deref(), Some("Jean Marc"));
        assert_eq!(parsed.last_name.as_deref(), Some("Dupont"));
        assert!(parsed.is_ambiguous);
    }

    #[test]
    fn test_parse_hyphenated_tokens_are_atomic() {
        let parsed = parse_person_name("Jean-Pierre Martin-Roux");
        assert_eq!(parsed.first_name.as_deref(), Some("Jean-Pierre"));
        assert_eq!(parsed.last_name.as_deref(), Some("Martin-Roux"));
        assert!(!parsed.is_ambiguous);
    }

    #[test]
    fn test_comparison_key_by_type() {
        assert_eq!(comparison_key("Mme Alice DURAND", EntityType::Person), "alice durand");
        assert_eq!(comparison_key("à Paris", EntityType::Location), "paris");
        assert_eq!(comparison_key("à Paris", EntityType::Org), "à paris");
    }
}

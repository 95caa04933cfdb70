//! Detection merging
//!
//! Combines the candidates of the statistical tagger and of the pattern
//! matcher into one deduplicated, position-sorted list. The tagger always
//! wins on exact matches; partial overlaps are kept and flagged for review.

use crate::pseudonymization::models::{Candidate, EntityType};
use crate::pseudonymization::normalizer::{is_bare_title, strip_titles};

/// How a pattern candidate relates to the tagger candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlapKind {
    /// No tagger candidate overlaps it
    None,
    /// Same span, or same text once titles are removed
    Exact,
    /// Overlaps at least one tagger candidate without matching it
    Partial,
}

fn classify(pattern: &Candidate, tagger: &[Candidate]) -> OverlapKind {
    let mut kind = OverlapKind::None;
    let pattern_text = strip_titles(&pattern.text);

    for existing in tagger.iter().filter(|t| t.overlaps(pattern)) {
        if existing.same_span(pattern) || strip_titles(&existing.text) == pattern_text {
            return OverlapKind::Exact;
        }
        kind = OverlapKind::Partial;
    }

    kind
}

/// Merge tagger and pattern candidates
///
/// 1. Start from all tagger candidates.
/// 2. Append pattern candidates that overlap nothing.
/// 3. Drop pattern candidates that exactly match a tagger candidate.
/// 4. Keep partially overlapping pattern candidates, flagged ambiguous.
/// 5. Sort by start position and drop PERSON candidates that are only a title.
pub fn merge_detections(tagger: Vec<Candidate>, pattern: Vec<Candidate>) -> Vec<Candidate> {
    let tagger_count = tagger.len();
    let pattern_count = pattern.len();
    let mut merged = tagger;
    let mut appended = Vec::new();
    let mut discarded = 0usize;
    let mut flagged = 0usize;

    for mut candidate in pattern {
        match classify(&candidate, &merged[..tagger_count]) {
            OverlapKind::None => appended.push(candidate),
            OverlapKind::Exact => discarded += 1,
            OverlapKind::Partial => {
                candidate.is_ambiguous = true;
                flagged += 1;
                appended.push(candidate);
            }
        }
    }

    merged.extend(appended);
    // Stable sort keeps tagger candidates ahead of pattern ones at equal starts
    merged.sort_by_key(|c| c.start);

    let before_filter = merged.len();
    merged.retain(|c| !(c.entity_type == EntityType::Person && is_bare_title(&c.text)));

    tracing::debug!(
        tagger = tagger_count,
        pattern = pattern_count,
        discarded,
        flagged,
        bare_titles = before_filter - merged.len(),
        merged = merged.len(),
        "Merged detections"
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseudonymization::models::DetectionSource;

    fn tagger(text: &str, entity_type: EntityType, start: usize) -> Candidate {
        Candidate::new(text, entity_type, start, start + text.len(), DetectionSource::Statistical)
    }

    fn pattern(text: &str, entity_type: EntityType, start: usize) -> Candidate {
        Candidate::new(text, entity_type, start, start + text.len(), DetectionSource::Pattern)
    }

    #[test]
    fn test_exact_text_after_title_normalization_is_deduplicated() {
        let merged = merge_detections(
            vec![tagger("Marie Dubois", EntityType::Person, 0)],
            vec![pattern("Dr. Marie Dubois", EntityType::Person, 0)],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "Marie Dubois");
        assert_eq!(merged[0].source, DetectionSource::Statistical);
        assert!(!merged[0].is_ambiguous);
    }

    #[test]
    fn test_identical_span_is_deduplicated() {
        let merged = merge_detections(
            vec![tagger("Paris", EntityType::Location, 10)],
            vec![pattern("Paris", EntityType::Location, 10)],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, DetectionSource::Statistical);
    }

    #[test]
    fn test_partial_overlap_keeps_both_and_flags_pattern() {
        let merged = merge_detections(
            vec![tagger("Jean Dupont", EntityType::Person, 4)],
            vec![pattern("Dupont SARL", EntityType::Org, 9)],
        );

        assert_eq!(merged.len(), 2);
        assert!(!merged[0].is_ambiguous);
        assert_eq!(merged[1].source, DetectionSource::Pattern);
        assert!(merged[1].is_ambiguous);
    }

    #[test]
    fn test_non_overlapping_pattern_is_appended_and_sorted() {
        let merged = merge_detections(
            vec![tagger("Lyon", EntityType::Location, 30)],
            vec![pattern("Mme Durand", EntityType::Person, 2)],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Mme Durand");
        assert_eq!(merged[1].text, "Lyon");
        assert!(merged.iter().all(|c| !c.is_ambiguous));
    }

    #[test]
    fn test_touching_spans_do_not_overlap() {
        let merged = merge_detections(
            vec![tagger("Marie", EntityType::Person, 0)],
            vec![pattern("Dubois", EntityType::Person, 5)],
        );
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|c| !c.is_ambiguous));
    }

    #[test]
    fn test_bare_title_person_is_filtered() {
        let merged = merge_detections(
            vec![
                tagger("Mme", EntityType::Person, 0),
                tagger("Alice Durand", EntityType::Person, 20),
            ],
            Vec::new(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "Alice Durand");
    }

    #[test]
    fn test_pattern_candidates_do_not_dedup_each_other() {
        let merged = merge_detections(
            Vec::new(),
            vec![
                pattern("Lyon", EntityType::Location, 12),
                pattern("Lyon", EntityType::Location, 40),
            ],
        );
        assert_eq!(merged.len(), 2);
    }
}

//! Variant clustering
//!
//! Groups the candidates of one document into [`CanonicalGroup`]s, one per
//! real-world entity. Candidates are first grouped by exact `(text, type)`;
//! the resulting keys are then merged with a disjoint-set structure using
//! type-specific predicates:
//!
//! - LOCATION: equal text once the preposition is removed, case-insensitive
//! - ORG: equal text, case-insensitive
//! - PERSON: equal names, a bare surname matching a full name's last token,
//!   or full names sharing both first and last tokens
//!
//! A bare surname that would link two full names with different first names
//! ("Durand" between "Olivier Durand" and "Alice Durand") is excluded from
//! every union before any merge happens. Without that pre-scan, transitivity
//! would fuse two different people into one group.

use crate::pseudonymization::models::{CanonicalGroup, Candidate, EntityType};
use crate::pseudonymization::normalizer::comparison_key;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

/// Disjoint-set forest with path compression and union by rank
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Exact-text bucket of occurrences
struct TextKey {
    entity_type: EntityType,
    normalized: String,
    occurrences: Vec<Candidate>,
}

/// Tokenized PERSON key
struct PersonTokens<'a> {
    words: Vec<&'a str>,
}

impl<'a> PersonTokens<'a> {
    fn new(normalized: &'a str) -> Self {
        Self {
            words: normalized.split_whitespace().collect(),
        }
    }

    fn is_single(&self) -> bool {
        self.words.len() == 1
    }

    fn is_multi(&self) -> bool {
        self.words.len() > 1
    }

    fn first(&self) -> Option<&'a str> {
        self.words.first().copied()
    }

    fn last(&self) -> Option<&'a str> {
        self.words.last().copied()
    }
}

/// Whether two PERSON keys denote the same person
fn same_person(a: &PersonTokens<'_>, b: &PersonTokens<'_>) -> bool {
    if a.words.is_empty() || b.words.is_empty() {
        return false;
    }
    if a.words == b.words {
        return true;
    }
    if a.is_single() && b.is_multi() {
        return a.first() == b.last();
    }
    if b.is_single() && a.is_multi() {
        return b.first() == a.last();
    }
    a.is_multi() && b.is_multi() && a.last() == b.last() && a.first() == b.first()
}

/// Indices of single-word keys that would bridge full names with different
/// first names
fn bridging_surnames(tokens: &[PersonTokens<'_>]) -> Vec<bool> {
    tokens
        .iter()
        .map(|single| {
            if !single.is_single() {
                return false;
            }
            let first_names: BTreeSet<&str> = tokens
                .iter()
                .filter(|full| full.is_multi() && full.last() == single.first())
                .filter_map(|full| full.first())
                .collect();
            first_names.len() > 1
        })
        .collect()
}

/// Union-find merges for one entity type, over key indices `members`
fn merge_keys(keys: &[TextKey], members: &[usize], sets: &mut DisjointSet) {
    let Some(&first) = members.first() else {
        return;
    };

    match keys[first].entity_type {
        EntityType::Location | EntityType::Org => {
            let mut by_text: HashMap<&str, usize> = HashMap::new();
            for &idx in members {
                match by_text.entry(keys[idx].normalized.as_str()) {
                    Entry::Occupied(root) => sets.union(*root.get(), idx),
                    Entry::Vacant(slot) => {
                        slot.insert(idx);
                    }
                }
            }
        }
        EntityType::Person => {
            let tokens: Vec<PersonTokens<'_>> = members
                .iter()
                .map(|&idx| PersonTokens::new(&keys[idx].normalized))
                .collect();
            let excluded = bridging_surnames(&tokens);

            for (idx, surname) in excluded.iter().enumerate() {
                if *surname {
                    tracing::debug!(
                        key_index = members[idx],
                        "Ambiguous standalone surname kept in its own group"
                    );
                }
            }

            for i in 0..members.len() {
                if excluded[i] {
                    continue;
                }
                for j in (i + 1)..members.len() {
                    if !excluded[j] && same_person(&tokens[i], &tokens[j]) {
                        sets.union(members[i], members[j]);
                    }
                }
            }
        }
    }
}

/// Cluster the candidates of one document into canonical groups
///
/// Groups are sorted by their first occurrence, occurrences by position, and
/// each group's canonical candidate is its longest occurrence. Candidates of
/// different entity types never share a group.
pub fn cluster_variants(candidates: &[Candidate]) -> Vec<CanonicalGroup> {
    let mut keys: Vec<TextKey> = Vec::new();
    let mut key_index: HashMap<(&str, EntityType), usize> = HashMap::new();

    for candidate in candidates {
        let idx = *key_index
            .entry((candidate.text.as_str(), candidate.entity_type))
            .or_insert_with(|| {
                keys.push(TextKey {
                    entity_type: candidate.entity_type,
                    normalized: comparison_key(&candidate.text, candidate.entity_type),
                    occurrences: Vec::new(),
                });
                keys.len() - 1
            });
        keys[idx].occurrences.push(candidate.clone());
    }

    let mut sets = DisjointSet::new(keys.len());
    for entity_type in EntityType::ALL {
        let members: Vec<usize> = (0..keys.len())
            .filter(|&i| keys[i].entity_type == entity_type)
            .collect();
        merge_keys(&keys, &members, &mut sets);
    }

    let mut clusters: HashMap<usize, Vec<Candidate>> = HashMap::new();
    for (idx, key) in keys.into_iter().enumerate() {
        let root = sets.find(idx);
        clusters.entry(root).or_default().extend(key.occurrences);
    }

    let mut groups: Vec<CanonicalGroup> = clusters
        .into_values()
        .filter_map(CanonicalGroup::from_occurrences)
        .collect();
    groups.sort_by_key(|g| (g.first_position(), g.canonical.start));

    tracing::debug!(
        candidates = candidates.len(),
        groups = groups.len(),
        "Clustered entity variants"
    );

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseudonymization::models::DetectionSource;

    fn at(text: &str, entity_type: EntityType, start: usize) -> Candidate {
        Candidate::new(text, entity_type, start, start + text.len(), DetectionSource::Statistical)
    }

    fn person(text: &str, start: usize) -> Candidate {
        at(text, EntityType::Person, start)
    }

    #[test]
    fn test_disjoint_set_union_find() {
        let mut sets = DisjointSet::new(4);
        sets.union(0, 1);
        sets.union(2, 3);
        assert_eq!(sets.find(0), sets.find(1));
        assert_ne!(sets.find(1), sets.find(2));
        sets.union(1, 3);
        assert_eq!(sets.find(0), sets.find(2));
    }

    #[test]
    fn test_exact_duplicates_form_one_group() {
        let groups = cluster_variants(&[person("Marie Dubois", 0), person("Marie Dubois", 50)]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].occurrences.len(), 2);
    }

    #[test]
    fn test_title_variants_merge() {
        let groups = cluster_variants(&[
            person("Marie Dubois", 0),
            person("Dr. Marie Dubois", 30),
            person("Dubois", 60),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].canonical.text, "Dr. Marie Dubois");
        assert_eq!(groups[0].variant_texts.len(), 3);
        let starts: Vec<usize> = groups[0].occurrences.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 30, 60]);
    }

    #[test]
    fn test_different_first_names_stay_apart() {
        let groups = cluster_variants(&[person("Olivier Durand", 0), person("Alice Durand", 30)]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_ambiguous_surname_does_not_bridge() {
        let groups = cluster_variants(&[
            person("M. Olivier Durand", 0),
            person("Mme Alice Durand", 30),
            person("Mme Durand", 60),
        ]);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].canonical.text, "Mme Durand");
        assert_eq!(groups[2].occurrences.len(), 1);
    }

    #[test]
    fn test_unambiguous_surname_joins_full_name() {
        let groups = cluster_variants(&[
            person("Olivier Durand", 0),
            person("M. Olivier Durand", 30),
            person("Durand", 60),
            person("Alice Martin", 90),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].occurrences.len(), 3);
        assert_eq!(groups[1].canonical.text, "Alice Martin");
    }

    #[test]
    fn test_location_preposition_and_case_variants_merge() {
        let groups = cluster_variants(&[
            at("Paris", EntityType::Location, 0),
            at("à Paris", EntityType::Location, 20),
            at("PARIS", EntityType::Location, 40),
            at("La Rochelle", EntityType::Location, 60),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].occurrences.len(), 3);
        assert_eq!(groups[0].canonical.text, "à Paris");
    }

    #[test]
    fn test_org_only_lowercased() {
        let groups = cluster_variants(&[
            at("Banque Arvel", EntityType::Org, 0),
            at("banque arvel", EntityType::Org, 20),
            at("de Banque Arvel", EntityType::Org, 40),
        ]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_same_text_different_types_never_merge() {
        let groups = cluster_variants(&[
            at("Orléans", EntityType::Location, 0),
            at("Orléans", EntityType::Org, 20),
            at("Orléans", EntityType::Person, 40),
        ]);

        assert_eq!(groups.len(), 3);
        let types: BTreeSet<EntityType> = groups.iter().map(|g| g.entity_type()).collect();
        assert_eq!(types.len(), 3);
    }

    #[test]
    fn test_groups_sorted_by_first_occurrence() {
        let groups = cluster_variants(&[
            at("Lyon", EntityType::Location, 50),
            person("Jean Martin", 10),
            at("Lyon", EntityType::Location, 5),
        ]);

        assert_eq!(groups[0].canonical.text, "Lyon");
        assert_eq!(groups[0].first_position(), 5);
        assert_eq!(groups[1].canonical.text, "Jean Martin");
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_variants(&[]).is_empty());
    }
}

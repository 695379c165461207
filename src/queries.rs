//! Read-only queries over a built [`MentionGraph`].

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::graph::MentionGraph;

/// Finds the journal that mentions the most distinct drugs.
///
/// Ties go to the journal encountered first when walking drugs in graph order
/// and each drug's journals in insertion order. Returns `None` when no drug
/// has any journal mention.
///
/// # Examples
///
/// ```
/// use druglink::queries::journal_with_most_drugs;
/// use druglink::MentionGraph;
///
/// assert_eq!(journal_with_most_drugs(&MentionGraph::default()), None);
/// ```
#[must_use]
pub fn journal_with_most_drugs(graph: &MentionGraph) -> Option<(String, usize)> {
    let mut drugs_per_journal: IndexMap<&str, HashSet<&str>> = IndexMap::new();
    for (drug, mentions) in graph.iter() {
        for journal in mentions.journal.keys() {
            drugs_per_journal
                .entry(journal.as_str())
                .or_default()
                .insert(drug);
        }
    }

    drugs_per_journal
        .into_iter()
        .map(|(journal, drugs)| (journal, drugs.len()))
        .fold(None, |best: Option<(&str, usize)>, (journal, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((journal, count)),
        })
        .map(|(journal, count)| (journal.to_string(), count))
}

/// Lists the drugs that share at least one journal with `target_drug`.
///
/// The target itself is excluded and the result is sorted. An unknown target
/// or a target without any shared journal yields an empty list; both cases are
/// logged.
#[must_use]
pub fn find_related_drugs(graph: &MentionGraph, target_drug: &str) -> Vec<String> {
    let Some(target) = graph.get(target_drug) else {
        tracing::warn!(drug = target_drug, "drug is not in the graph");
        return Vec::new();
    };

    let mut related: Vec<String> = graph
        .iter()
        .filter(|(drug, _)| *drug != target_drug)
        .filter(|(_, mentions)| mentions.journal.keys().any(|j| target.journal.contains_key(j)))
        .map(|(drug, _)| drug.to_string())
        .collect();
    related.sort_unstable();

    if related.is_empty() {
        tracing::info!(
            drug = target_drug,
            "no other drug is mentioned by the same journals"
        );
    }
    related
}

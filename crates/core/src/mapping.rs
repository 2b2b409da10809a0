//! Reshaping combined-search results into normalized mapping records, and the
//! cross-referenced fallback shown when a traditional system's own search finds nothing.

use ayush_types::{
    CombinedResult, MappingRecord, Page, RelatedTerm, SystemMatch, Term, TerminologySystem,
};
use serde::Serialize;
use std::collections::HashSet;

/// Where the data shown for one system came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// The system's own search endpoint.
    Direct,
    /// Related terms carried by the combined results.
    Mapped,
}

fn system_match(system: TerminologySystem, related: &RelatedTerm) -> SystemMatch {
    SystemMatch {
        system,
        code: related.term.code.clone(),
        name: related.term.display_name().to_string(),
        local_name: related.term.local_name(system).map(str::to_string),
        confidence_score: related.confidence_score,
    }
}

/// Reshape one combined result into a [`MappingRecord`].
///
/// Each traditional system slot holds the first related term, or `None` when the
/// backend returned no related terms for that system. The record confidence is the
/// result's own `confidence_score` when present, else the best slot confidence, else 0.
pub fn reshape(result: &CombinedResult) -> MappingRecord {
    let slot = |system: TerminologySystem| {
        result
            .related(system)
            .first()
            .map(|r| system_match(system, r))
    };

    let ayurveda = slot(TerminologySystem::Ayurveda);
    let siddha = slot(TerminologySystem::Siddha);
    let unani = slot(TerminologySystem::Unani);

    let confidence_score = result.confidence_score.unwrap_or_else(|| {
        [ayurveda.as_ref(), siddha.as_ref(), unani.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|m| m.confidence_score)
            .fold(0.0, f64::max)
    });

    MappingRecord {
        source_term: result.term.clone(),
        ayurveda,
        siddha,
        unani,
        confidence_score,
    }
}

/// Reshape every result of a combined-search page, preserving server order.
pub fn mapping_results(results: &[CombinedResult]) -> Vec<MappingRecord> {
    results.iter().map(reshape).collect()
}

/// Related `system` terms of `results`, in result order, each code once.
pub fn mapped_terms(results: &[CombinedResult], system: TerminologySystem) -> Vec<Term> {
    let mut seen = HashSet::new();
    results
        .iter()
        .flat_map(|r| r.related(system))
        .filter(|related| seen.insert(related.term.code.as_str()))
        .map(|related| related.term.clone())
        .collect()
}

/// The page to show for `system`: `direct` when it has results, otherwise the terms mapped
/// from `combined` for a traditional system.
///
/// Returns `None` as the source when there is nothing to show.
pub fn with_mapped_fallback(
    direct: Page<Term>,
    system: TerminologySystem,
    combined: &[CombinedResult],
) -> (Page<Term>, Option<SlotSource>) {
    if !direct.results.is_empty() {
        return (direct, Some(SlotSource::Direct));
    }
    if !TerminologySystem::TRADITIONAL.contains(&system) {
        return (direct, None);
    }

    let mapped = mapped_terms(combined, system);
    if mapped.is_empty() {
        return (direct, None);
    }
    tracing::debug!("{} search empty; falling back to {} mapped terms", system, mapped.len());
    let page = Page {
        count: mapped.len() as u64,
        results: mapped,
        next: None,
        previous: None,
    };
    (page, Some(SlotSource::Mapped))
}

//! Cross-system mappings between ICD-11 and the traditional medicine systems.

use crate::{Term, TerminologySystem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A traditional medicine term related to an ICD-11 term, with its mapping confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedTerm {
    #[serde(flatten)]
    pub term: Term,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

/// The `related_*` collections of a combined result.
///
/// The backend sends these either as a bare list or as a `{count, results}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelatedSet {
    List(Vec<RelatedTerm>),
    Paged {
        #[serde(default)]
        count: u64,
        #[serde(default)]
        results: Vec<RelatedTerm>,
    },
}

impl RelatedSet {
    pub fn terms(&self) -> &[RelatedTerm] {
        match self {
            Self::List(terms) => terms,
            Self::Paged { results, .. } => results,
        }
    }

    pub fn first(&self) -> Option<&RelatedTerm> {
        self.terms().first()
    }
}

impl Default for RelatedSet {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// One hit of the combined search endpoint: an ICD-11 term annotated with its
/// mapped traditional medicine equivalents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    #[serde(flatten)]
    pub term: Term,
    #[serde(default)]
    pub related_ayurveda: RelatedSet,
    #[serde(default)]
    pub related_siddha: RelatedSet,
    #[serde(default)]
    pub related_unani: RelatedSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl CombinedResult {
    /// Related terms for one traditional system. ICD-11 has no related set.
    pub fn related(&self, system: TerminologySystem) -> &[RelatedTerm] {
        match system {
            TerminologySystem::Ayurveda => self.related_ayurveda.terms(),
            TerminologySystem::Siddha => self.related_siddha.terms(),
            TerminologySystem::Unani => self.related_unani.terms(),
            TerminologySystem::Icd11 => &[],
        }
    }
}

/// The best traditional system match carried in one slot of a [`MappingRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMatch {
    pub system: TerminologySystem,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

/// Normalized view of a combined result: the source term plus up to three system matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub source_term: Term,
    pub ayurveda: Option<SystemMatch>,
    pub siddha: Option<SystemMatch>,
    pub unani: Option<SystemMatch>,
    pub confidence_score: f64,
}

impl MappingRecord {
    pub fn slot(&self, system: TerminologySystem) -> Option<&SystemMatch> {
        match system {
            TerminologySystem::Ayurveda => self.ayurveda.as_ref(),
            TerminologySystem::Siddha => self.siddha.as_ref(),
            TerminologySystem::Unani => self.unani.as_ref(),
            TerminologySystem::Icd11 => None,
        }
    }

    /// Number of populated traditional system slots.
    pub fn matched_systems(&self) -> usize {
        [
            self.ayurveda.is_some(),
            self.siddha.is_some(),
            self.unani.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// A stored mapping as returned by `/terminologies/mappings/{code}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icd_term: Option<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayurveda_term: Option<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siddha_term: Option<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unani_term: Option<Term>,
    #[serde(default)]
    pub confidence_score: f64,
    /// Optional similarity metrics keyed by metric name (e.g. `fuzzy`, `semantic`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub similarity_metrics: BTreeMap<String, f64>,
}

/// Aggregate mapping statistics from `/terminologies/mappings/stats/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingStats {
    #[serde(default)]
    pub total_mappings: u64,
    #[serde(default)]
    pub ayurveda_mappings: u64,
    #[serde(default)]
    pub siddha_mappings: u64,
    #[serde(default)]
    pub unani_mappings: u64,
    #[serde(default)]
    pub average_confidence: f64,
    #[serde(default)]
    pub high_confidence_mappings: u64,
    /// Set by the client when the values are placeholders substituted after a failed fetch.
    #[serde(default)]
    pub placeholder: bool,
}

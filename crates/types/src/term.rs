//! Terms and paginated result sets as returned by the terminology backend.

use crate::TerminologySystem;
use serde::{Deserialize, Serialize};

/// A single record from one traditional medicine system or ICD-11.
///
/// The backend uses `english_name` for the traditional systems and `title` for ICD-11;
/// both are optional here so one type covers every endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hindi_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tamil_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arabic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diacritical_name: Option<String>,
    #[serde(default, alias = "description", skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foundation_uri: Option<String>,
    /// Server relevance score, when the endpoint reports one.
    #[serde(default, alias = "search_score", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Term {
    /// Name used for display and matching: `english_name`, then `title`, then `code`.
    pub fn display_name(&self) -> &str {
        self.english_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.title.as_deref().filter(|s| !s.trim().is_empty()))
            .unwrap_or(&self.code)
    }

    /// The system-specific local-language name.
    ///
    /// Ayurveda uses Hindi, Siddha Tamil and Unani Arabic. ICD-11 has none.
    pub fn local_name(&self, system: TerminologySystem) -> Option<&str> {
        match system {
            TerminologySystem::Ayurveda => self.hindi_name.as_deref(),
            TerminologySystem::Siddha => self.tamil_name.as_deref(),
            TerminologySystem::Unani => self.arabic_name.as_deref(),
            TerminologySystem::Icd11 => None,
        }
    }
}

/// One page of a paginated list endpoint: `{ results, count, next, previous }`.
///
/// `next` and `previous` are opaque server cursors (usually absolute URLs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> Page<T> {
    /// The result set every failed request collapses to.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            count: 0,
            next: None,
            previous: None,
        }
    }

    /// Whether the server reports a further page.
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

//! Request and response bodies of the REST API.
//!
//! Core view models are carried as opaque JSON objects in the OpenAPI document; their
//! shape is documented on the core types themselves.

use ayush_core::ayush_types::{Mapping, MappingStats, Term, TerminologySystem};
use ayush_core::dashboard::Dashboard;
use ayush_core::search::{SearchRequest, SearchStrategy, SearchView, SourcePage};
use ayush_core::suggest::SuggestionList;
use ayush_core::{ClientConfig, TermDetail, TerminologyError, TerminologyResult, UploadPermission, UploadReceipt};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Query string of `/search` and `/search/{source}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text query
    pub q: String,
    /// System filter carried with the request (ayurveda, siddha, unani, icd11)
    pub system: Option<String>,
    /// Minimum confidence between 0 and 1
    pub threshold: Option<f64>,
    pub fuzzy: Option<bool>,
    pub full_text: Option<bool>,
    /// 1-based display page, used by `/search/{source}`
    pub page: Option<usize>,
}

impl SearchQuery {
    /// Validate the query string into a core [`SearchRequest`].
    ///
    /// # Errors
    ///
    /// Returns a `TerminologyError` if `q` is blank or `system` names no known system.
    pub fn to_request(&self, cfg: &ClientConfig) -> TerminologyResult<SearchRequest> {
        let system_filter = self
            .system
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.parse::<TerminologySystem>()
                    .map_err(|e| TerminologyError::InvalidInput(e.to_string()))
            })
            .transpose()?;

        let defaults = SearchStrategy::default();
        let mut request = SearchRequest::new(&self.q, cfg)?
            .with_system_filter(system_filter)
            .with_strategy(SearchStrategy {
                fuzzy: self.fuzzy.unwrap_or(defaults.fuzzy),
                full_text: self.full_text.unwrap_or(defaults.full_text),
            });
        if let Some(threshold) = self.threshold {
            request = request.with_threshold(threshold);
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionQuery {
    /// Current search box input
    pub q: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DetailQuery {
    /// Name of the selected term
    pub name: String,
    /// Wait for background paging to finish before answering
    pub complete: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchRes {
    #[schema(value_type = Object)]
    pub view: SearchView,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SourcePageRes {
    pub source: String,
    #[schema(value_type = Object)]
    pub page: SourcePage,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuggestionsRes {
    #[schema(value_type = Object)]
    pub suggestions: SuggestionList,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AutocompleteRes {
    pub system: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DetailRes {
    #[schema(value_type = Object)]
    pub detail: TermDetail,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TermRes {
    pub system: String,
    #[schema(value_type = Object)]
    pub term: Term,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MappingRes {
    #[schema(value_type = Object)]
    pub mapping: Mapping,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsRes {
    #[schema(value_type = Object)]
    pub stats: MappingStats,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardRes {
    #[schema(value_type = Object)]
    pub dashboard: Dashboard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadPermissionRes {
    pub enabled: bool,
    /// Why the upload control is disabled
    pub tooltip: Option<String>,
}

impl From<UploadPermission> for UploadPermissionRes {
    fn from(permission: UploadPermission) -> Self {
        Self {
            enabled: permission.is_enabled(),
            tooltip: permission.tooltip().map(str::to_string),
        }
    }
}

/// Multipart body of `POST /upload/{system}`.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub update_search_vector: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadRes {
    pub system: String,
    #[schema(value_type = Object)]
    pub receipt: UploadReceipt,
}

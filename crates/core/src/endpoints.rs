//! Request URLs for the terminology backend.
//!
//! URLs are built as pure functions of the base URL and the request parameters so the
//! same string serves as the HTTP target and as the response cache key.

use crate::constants::TERMINOLOGIES_PATH;
use crate::{TerminologyError, TerminologyResult};
use ayush_types::TerminologySystem;
use reqwest::Url;

/// Query parameters for `/terminologies/{system}/search/`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSearchParams {
    pub q: String,
    pub threshold: f64,
    pub fuzzy: bool,
    pub page: u32,
    pub page_size: u32,
}

/// Query parameters for `/terminologies/search/combined/`.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSearchParams {
    pub q: String,
    pub threshold: f64,
    pub fuzzy: bool,
    pub use_fts: bool,
    pub page: u32,
    pub page_size: u32,
}

fn endpoint(base: &str, path: &str) -> TerminologyResult<Url> {
    let raw = format!("{}/{}/{}", base.trim_end_matches('/'), TERMINOLOGIES_PATH, path);
    Url::parse(&raw).map_err(|e| TerminologyError::UrlParse(format!("{raw}: {e}")))
}

fn with_query(mut url: Url, params: &[(&str, String)]) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    url
}

/// Append one path segment (percent-encoded) after a trailing-slash endpoint.
fn with_segment(mut url: Url, segment: &str) -> TerminologyResult<Url> {
    let not_a_base = format!("{url} cannot be a base");
    url.path_segments_mut()
        .map_err(|_| TerminologyError::UrlParse(not_a_base))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

pub fn system_search_url(
    base: &str,
    system: TerminologySystem,
    params: &SystemSearchParams,
) -> TerminologyResult<Url> {
    let url = endpoint(base, &format!("{}/search/", system.slug()))?;
    Ok(with_query(
        url,
        &[
            ("q", params.q.clone()),
            ("threshold", params.threshold.to_string()),
            ("fuzzy", params.fuzzy.to_string()),
            ("page", params.page.to_string()),
            ("page_size", params.page_size.to_string()),
        ],
    ))
}

pub fn combined_search_url(base: &str, params: &CombinedSearchParams) -> TerminologyResult<Url> {
    let url = endpoint(base, "search/combined/")?;
    Ok(with_query(
        url,
        &[
            ("q", params.q.clone()),
            ("fuzzy", params.fuzzy.to_string()),
            ("threshold", params.threshold.to_string()),
            ("use_fts", params.use_fts.to_string()),
            ("page", params.page.to_string()),
            ("page_size", params.page_size.to_string()),
        ],
    ))
}

pub fn autocomplete_url(
    base: &str,
    system: TerminologySystem,
    q: &str,
    limit: u32,
) -> TerminologyResult<Url> {
    let url = endpoint(base, &format!("{}/autocomplete/", system.slug()))?;
    Ok(with_query(
        url,
        &[("q", q.to_string()), ("limit", limit.to_string())],
    ))
}

pub fn csv_upload_url(base: &str, system: TerminologySystem) -> TerminologyResult<Url> {
    endpoint(base, &format!("{}/csv/upload/", system.slug()))
}

pub fn mapping_stats_url(base: &str) -> TerminologyResult<Url> {
    endpoint(base, "mappings/stats/")
}

/// Single-item lookup: `/terminologies/{system}/{code}`.
pub fn term_url(base: &str, system: TerminologySystem, code: &str) -> TerminologyResult<Url> {
    with_segment(endpoint(base, &format!("{}/", system.slug()))?, code)
}

/// Stored mapping lookup: `/terminologies/mappings/{code}`.
pub fn mapping_url(base: &str, code: &str) -> TerminologyResult<Url> {
    with_segment(endpoint(base, "mappings/")?, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000/api";

    #[test]
    fn system_search_url_carries_all_parameters() {
        let params = SystemSearchParams {
            q: "jvara".into(),
            threshold: 0.3,
            fuzzy: true,
            page: 2,
            page_size: 20,
        };
        let url = system_search_url(BASE, TerminologySystem::Ayurveda, &params).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/terminologies/ayurveda/search/?q=jvara&threshold=0.3&fuzzy=true&page=2&page_size=20"
        );
    }

    #[test]
    fn combined_search_url_encodes_query() {
        let params = CombinedSearchParams {
            q: "high fever & chills".into(),
            threshold: 0.5,
            fuzzy: false,
            use_fts: true,
            page: 1,
            page_size: 10,
        };
        let url = combined_search_url(BASE, &params).unwrap();
        assert_eq!(url.path(), "/api/terminologies/search/combined/");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("q".into(), "high fever & chills".into()));
        assert!(pairs.contains(&("use_fts".into(), "true".into())));
        assert!(pairs.contains(&("fuzzy".into(), "false".into())));
    }

    #[test]
    fn term_url_has_no_trailing_slash_and_escapes_code() {
        let url = term_url(BASE, TerminologySystem::Icd11, "1A00/x").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/terminologies/icd11/1A00%2Fx"
        );
    }

    #[test]
    fn mapping_and_stats_urls() {
        assert_eq!(
            mapping_url(BASE, "1B72").unwrap().as_str(),
            "http://localhost:8000/api/terminologies/mappings/1B72"
        );
        assert_eq!(
            mapping_stats_url(BASE).unwrap().as_str(),
            "http://localhost:8000/api/terminologies/mappings/stats/"
        );
        assert_eq!(
            csv_upload_url(BASE, TerminologySystem::Unani)
                .unwrap()
                .as_str(),
            "http://localhost:8000/api/terminologies/unani/csv/upload/"
        );
    }

    #[test]
    fn autocomplete_url_has_limit() {
        let url = autocomplete_url(BASE, TerminologySystem::Siddha, "su", 8).unwrap();
        assert_eq!(url.query(), Some("q=su&limit=8"));
    }

    #[test]
    fn identical_params_produce_identical_urls() {
        let params = SystemSearchParams {
            q: "kasa".into(),
            threshold: 0.3,
            fuzzy: true,
            page: 1,
            page_size: 20,
        };
        let a = system_search_url(BASE, TerminologySystem::Unani, &params).unwrap();
        let b = system_search_url(BASE, TerminologySystem::Unani, &params.clone()).unwrap();
        assert_eq!(a, b);
        let next = SystemSearchParams { page: 2, ..params };
        let c = system_search_url(BASE, TerminologySystem::Unani, &next).unwrap();
        assert_ne!(a, c);
    }
}

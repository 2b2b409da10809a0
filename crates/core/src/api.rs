//! The terminology backend seam.
//!
//! [`TerminologyApi`] is the one interface the orchestration layers talk to.
//! [`HttpTerminologyClient`] implements it over `reqwest`; tests use
//! [`crate::mock::MockTerminologyApi`].

use crate::config::ClientConfig;
use crate::endpoints::{
    autocomplete_url, combined_search_url, csv_upload_url, mapping_stats_url, mapping_url,
    system_search_url, term_url, CombinedSearchParams, SystemSearchParams,
};
use crate::upload::{CsvUpload, UploadReceipt};
use crate::{TerminologyError, TerminologyResult};
use async_trait::async_trait;
use ayush_types::{CombinedResult, Mapping, MappingStats, Page, Term, TerminologySystem};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

#[async_trait]
pub trait TerminologyApi: Send + Sync {
    /// Base URL requests are issued against. Used to derive cache keys.
    fn base_url(&self) -> &str;

    /// `/terminologies/{system}/search/`
    async fn search_system(
        &self,
        system: TerminologySystem,
        params: &SystemSearchParams,
    ) -> TerminologyResult<Page<Term>>;

    /// `/terminologies/search/combined/`
    async fn search_combined(
        &self,
        params: &CombinedSearchParams,
    ) -> TerminologyResult<Page<CombinedResult>>;

    /// `/terminologies/{system}/autocomplete/`, reduced to display labels.
    async fn autocomplete(
        &self,
        system: TerminologySystem,
        q: &str,
        limit: u32,
    ) -> TerminologyResult<Vec<String>>;

    /// `/terminologies/{system}/{code}`
    async fn lookup_term(&self, system: TerminologySystem, code: &str) -> TerminologyResult<Term>;

    /// `/terminologies/mappings/{code}`
    async fn mapping(&self, code: &str) -> TerminologyResult<Mapping>;

    /// `/terminologies/mappings/stats/`
    async fn mapping_stats(&self) -> TerminologyResult<MappingStats>;

    /// `/terminologies/{system}/csv/upload/` (multipart)
    async fn upload_csv(
        &self,
        system: TerminologySystem,
        upload: CsvUpload,
    ) -> TerminologyResult<UploadReceipt>;
}

pub type SharedApi = Arc<dyn TerminologyApi>;

/// Autocomplete responses come back in several shapes depending on the system.
#[derive(Deserialize)]
#[serde(untagged)]
enum AutocompleteResponse {
    Labels(Vec<String>),
    Terms(Vec<Term>),
    // before `Paged`: every `Page` field has a default, so it would match any object
    Wrapped { suggestions: Vec<String> },
    Paged(Page<Term>),
}

impl AutocompleteResponse {
    fn into_labels(self) -> Vec<String> {
        match self {
            Self::Labels(labels) | Self::Wrapped { suggestions: labels } => labels,
            Self::Terms(terms) | Self::Paged(Page { results: terms, .. }) => terms
                .iter()
                .map(|t| t.display_name().to_string())
                .collect(),
        }
    }
}

/// HTTP client for the terminology REST backend.
#[derive(Clone, Debug)]
pub struct HttpTerminologyClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTerminologyClient {
    /// Build a client from startup configuration.
    ///
    /// No timeout is applied unless the configuration sets one.
    pub fn new(cfg: &ClientConfig) -> TerminologyResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: cfg.api_base_url().to_string(),
            client: builder.build()?,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> TerminologyResult<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        Self::decode(url, response).await
    }

    async fn decode<T: DeserializeOwned>(
        url: Url,
        response: reqwest::Response,
    ) -> TerminologyResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TerminologyError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| TerminologyError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TerminologyApi for HttpTerminologyClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search_system(
        &self,
        system: TerminologySystem,
        params: &SystemSearchParams,
    ) -> TerminologyResult<Page<Term>> {
        self.get_json(system_search_url(&self.base_url, system, params)?)
            .await
    }

    async fn search_combined(
        &self,
        params: &CombinedSearchParams,
    ) -> TerminologyResult<Page<CombinedResult>> {
        self.get_json(combined_search_url(&self.base_url, params)?)
            .await
    }

    async fn autocomplete(
        &self,
        system: TerminologySystem,
        q: &str,
        limit: u32,
    ) -> TerminologyResult<Vec<String>> {
        let response: AutocompleteResponse = self
            .get_json(autocomplete_url(&self.base_url, system, q, limit)?)
            .await?;
        let mut labels = response.into_labels();
        labels.truncate(limit as usize);
        Ok(labels)
    }

    async fn lookup_term(&self, system: TerminologySystem, code: &str) -> TerminologyResult<Term> {
        self.get_json(term_url(&self.base_url, system, code)?).await
    }

    async fn mapping(&self, code: &str) -> TerminologyResult<Mapping> {
        self.get_json(mapping_url(&self.base_url, code)?).await
    }

    async fn mapping_stats(&self) -> TerminologyResult<MappingStats> {
        self.get_json(mapping_stats_url(&self.base_url)?).await
    }

    async fn upload_csv(
        &self,
        system: TerminologySystem,
        upload: CsvUpload,
    ) -> TerminologyResult<UploadReceipt> {
        let url = csv_upload_url(&self.base_url, system)?;
        let file = reqwest::multipart::Part::bytes(upload.contents)
            .file_name(upload.file_name)
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text(
                "update_search_vector",
                upload.update_search_vector.to_string(),
            );

        tracing::info!("POST {} (csv upload)", url);
        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await?;
        Self::decode(url, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_uses_configured_base_url() {
        let cfg = ClientConfig::new("http://terminology.test/api/").unwrap();
        let client = HttpTerminologyClient::new(&cfg).unwrap();
        assert_eq!(client.base_url(), "http://terminology.test/api");
    }

    #[test]
    fn autocomplete_accepts_label_list() {
        let response: AutocompleteResponse =
            serde_json::from_str(r#"["Jvara", "Jvaratisara"]"#).unwrap();
        assert_eq!(response.into_labels(), vec!["Jvara", "Jvaratisara"]);
    }

    #[test]
    fn autocomplete_accepts_term_list_and_page() {
        let response: AutocompleteResponse =
            serde_json::from_str(r#"[{"code": "A1", "english_name": "Kasa"}]"#).unwrap();
        assert_eq!(response.into_labels(), vec!["Kasa"]);

        let response: AutocompleteResponse = serde_json::from_str(
            r#"{"results": [{"code": "1B72", "title": "Fever"}], "count": 1}"#,
        )
        .unwrap();
        assert_eq!(response.into_labels(), vec!["Fever"]);
    }

    #[test]
    fn autocomplete_accepts_wrapped_suggestions() {
        let response: AutocompleteResponse =
            serde_json::from_str(r#"{"suggestions": ["Sura"]}"#).unwrap();
        assert_eq!(response.into_labels(), vec!["Sura"]);
    }
}

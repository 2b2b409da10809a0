//! Debounced suggestions for the search box.

use crate::api::SharedApi;
use crate::config::ClientConfig;
use crate::endpoints::CombinedSearchParams;
use crate::TerminologyResult;
use ayush_types::{CombinedResult, SearchText, TerminologySystem};
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One selectable suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub label: String,
    pub code: String,
    pub system: TerminologySystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl From<&CombinedResult> for Suggestion {
    fn from(result: &CombinedResult) -> Self {
        Self {
            label: result.term.display_name().to_string(),
            code: result.term.code.clone(),
            system: TerminologySystem::Icd11,
            score: result.term.score.or(result.confidence_score),
        }
    }
}

/// Suggestions for one input, plus the leading few offered as recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestionList {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    pub recommendations: Vec<Suggestion>,
}

impl SuggestionList {
    pub fn cleared(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

fn is_suggestible(input: &str) -> bool {
    SearchText::new(input).is_ok_and(|text| text.is_suggestible())
}

/// Issues the suggestion requests themselves, without any timing.
#[derive(Clone)]
pub struct SuggestionFetcher {
    api: SharedApi,
    cfg: Arc<ClientConfig>,
}

impl SuggestionFetcher {
    pub fn new(api: SharedApi, cfg: Arc<ClientConfig>) -> Self {
        Self { api, cfg }
    }

    pub fn debounce(&self) -> Duration {
        self.cfg.suggest_debounce()
    }

    /// Suggestions for `input` from the combined endpoint.
    ///
    /// Input shorter than two characters after trimming yields an empty list without a
    /// request. A failed request also yields an empty list.
    pub async fn fetch(&self, input: &str) -> SuggestionList {
        let query = input.trim();
        if !is_suggestible(query) {
            return SuggestionList::cleared(query);
        }

        let params = CombinedSearchParams {
            q: query.to_string(),
            threshold: self.cfg.default_threshold(),
            fuzzy: true,
            use_fts: false,
            page: 1,
            page_size: self.cfg.suggestion_page_size(),
        };
        let page = match self.api.search_combined(&params).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!("suggestions for {:?} unavailable: {}", query, e);
                return SuggestionList::cleared(query);
            }
        };

        let suggestions: Vec<Suggestion> = page
            .results
            .iter()
            .take(self.cfg.suggestion_limit())
            .map(Suggestion::from)
            .collect();
        let recommendations = suggestions
            .iter()
            .take(self.cfg.recommendation_count())
            .cloned()
            .collect();

        SuggestionList {
            query: query.to_string(),
            suggestions,
            recommendations,
        }
    }

    /// Per-system autocomplete labels. Short input yields an empty list without a request.
    pub async fn autocomplete(
        &self,
        system: TerminologySystem,
        input: &str,
    ) -> TerminologyResult<Vec<String>> {
        let query = input.trim();
        if !is_suggestible(query) {
            return Ok(Vec::new());
        }
        self.api
            .autocomplete(system, query, self.cfg.suggestion_limit() as u32)
            .await
    }
}

/// Runs at most one delayed task; scheduling a new one aborts the pending one.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the delay unless another task is scheduled first.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(handle) {
                previous.abort();
            }
        }
    }

    pub fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.take() {
                previous.abort();
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The search box: debounced input in, latest [`SuggestionList`] out.
pub struct SuggestionBox {
    fetcher: SuggestionFetcher,
    debouncer: Debouncer,
    tx: Arc<watch::Sender<SuggestionList>>,
}

impl SuggestionBox {
    pub fn new(fetcher: SuggestionFetcher) -> Self {
        let (tx, _rx) = watch::channel(SuggestionList::default());
        Self {
            debouncer: Debouncer::new(fetcher.debounce()),
            fetcher,
            tx: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionList> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SuggestionList {
        self.tx.borrow().clone()
    }

    /// Feed the latest input. Short input clears immediately; anything else is
    /// fetched once the input has been stable for the debounce delay.
    pub fn input(&self, text: &str) {
        let query = text.trim().to_string();
        if !is_suggestible(&query) {
            self.debouncer.cancel();
            self.tx.send_replace(SuggestionList::cleared(&query));
            return;
        }

        let fetcher = self.fetcher.clone();
        let tx = Arc::clone(&self.tx);
        self.debouncer.schedule(async move {
            let list = fetcher.fetch(&query).await;
            tx.send_replace(list);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockTerminologyApi};
    use ayush_types::{SourceKind, Term};

    fn results(n: usize) -> Vec<CombinedResult> {
        (0..n)
            .map(|i| CombinedResult {
                term: Term {
                    code: format!("1B{i:02}"),
                    title: Some(format!("Fever {i}")),
                    score: Some(1.0 - i as f64 / 100.0),
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect()
    }

    fn fetcher(api: MockTerminologyApi) -> (SuggestionFetcher, Arc<MockTerminologyApi>) {
        let api = Arc::new(api);
        let shared: SharedApi = api.clone();
        (
            SuggestionFetcher::new(shared, Arc::new(ClientConfig::default())),
            api,
        )
    }

    #[tokio::test]
    async fn short_input_never_requests() {
        let (fetcher, api) = fetcher(MockTerminologyApi::new());
        for input in ["", " ", "f", " f "] {
            assert!(fetcher.fetch(input).await.is_empty());
        }
        assert!(fetcher
            .autocomplete(TerminologySystem::Ayurveda, "j")
            .await
            .unwrap()
            .is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn fetch_caps_and_recommends_in_server_order() {
        let (fetcher, api) =
            fetcher(MockTerminologyApi::new().with_combined_results(results(12), 10));
        let list = fetcher.fetch("fever").await;

        assert_eq!(list.suggestions.len(), 8);
        let codes: Vec<&str> = list.recommendations.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["1B00", "1B01", "1B02"]);
        assert_eq!(
            api.calls(),
            vec![MockCall::SearchCombined {
                q: "fever".into(),
                page: 1,
                page_size: 10,
            }]
        );
    }

    #[tokio::test]
    async fn failure_clears_suggestions() {
        let (fetcher, _) = fetcher(
            MockTerminologyApi::new()
                .with_combined_results(results(3), 10)
                .failing(SourceKind::Combined),
        );
        let list = fetcher.fetch("fever").await;
        assert!(list.is_empty());
        assert!(list.recommendations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_input_supersedes_pending_request() {
        let (fetcher, api) =
            fetcher(MockTerminologyApi::new().with_combined_results(results(2), 10));
        let search_box = SuggestionBox::new(fetcher);
        let mut rx = search_box.subscribe();

        search_box.input("fe");
        search_box.input("fev");
        search_box.input("feve");

        tokio::time::advance(Duration::from_millis(299)).await;
        tokio::task::yield_now().await;
        assert!(api.calls().is_empty());

        rx.changed().await.expect("suggestions published");
        assert_eq!(rx.borrow().query, "feve");
        assert_eq!(rx.borrow().suggestions.len(), 2);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_input_clears_immediately_and_cancels_pending() {
        let (fetcher, api) =
            fetcher(MockTerminologyApi::new().with_combined_results(results(2), 10));
        let search_box = SuggestionBox::new(fetcher);

        search_box.input("fever");
        search_box.input("f");
        assert!(search_box.current().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.calls().is_empty());
        assert_eq!(search_box.current().query, "f");
    }

    #[tokio::test]
    async fn autocomplete_passes_limit() {
        let (fetcher, api) = fetcher(MockTerminologyApi::new().with_autocomplete(
            TerminologySystem::Siddha,
            vec!["Suram".into(), "Sura".into()],
        ));
        let labels = fetcher
            .autocomplete(TerminologySystem::Siddha, "sur")
            .await
            .unwrap();
        assert_eq!(labels, vec!["Suram", "Sura"]);
        assert_eq!(
            api.calls(),
            vec![MockCall::Autocomplete {
                system: TerminologySystem::Siddha,
                q: "sur".into(),
                limit: 8,
            }]
        );
    }
}

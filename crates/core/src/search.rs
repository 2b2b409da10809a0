//! Search orchestration across the combined endpoint and the four per-system endpoints.
//!
//! A search issues the combined request first, then ICD-11, then the three traditional
//! systems concurrently. Each source's result lands in its own slot of a [`SearchView`]
//! published through a `watch` channel, so observers see every slot as soon as it
//! resolves. A failing source ends up empty and never affects the others.

use crate::api::SharedApi;
use crate::config::ClientConfig;
use crate::endpoints::{CombinedSearchParams, SystemSearchParams};
use crate::mapping::{mapping_results, with_mapped_fallback, SlotSource};
use crate::pagination::{fetch_display_page, PageView, PagedSource};
use crate::TerminologyResult;
use ayush_types::{
    CombinedResult, MappingRecord, Page, SearchText, SourceKind, Term, TerminologySystem,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Matching strategies; both may be enabled at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchStrategy {
    pub fuzzy: bool,
    pub full_text: bool,
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self {
            fuzzy: true,
            full_text: false,
        }
    }
}

/// A submitted search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub text: SearchText,
    /// Carried for the caller's benefit; every system is queried regardless.
    pub system_filter: Option<TerminologySystem>,
    pub threshold: f64,
    pub strategy: SearchStrategy,
}

impl SearchRequest {
    /// Build a request with the configured default threshold.
    ///
    /// # Errors
    ///
    /// Returns `TerminologyError::Text` if `query` is empty or whitespace-only.
    pub fn new(query: &str, cfg: &ClientConfig) -> TerminologyResult<Self> {
        Ok(Self {
            text: SearchText::new(query)?,
            system_filter: None,
            threshold: cfg.default_threshold(),
            strategy: SearchStrategy::default(),
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_system_filter(mut self, system: Option<TerminologySystem>) -> Self {
        self.system_filter = system;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn system_params(&self, page: u32, page_size: u32) -> SystemSearchParams {
        SystemSearchParams {
            q: self.text.as_str().to_string(),
            threshold: self.threshold,
            fuzzy: self.strategy.fuzzy,
            page,
            page_size,
        }
    }

    pub fn combined_params(&self, page: u32, page_size: u32) -> CombinedSearchParams {
        CombinedSearchParams {
            q: self.text.as_str().to_string(),
            threshold: self.threshold,
            fuzzy: self.strategy.fuzzy,
            use_fts: self.strategy.full_text,
            page,
            page_size,
        }
    }
}

/// Per-source loading flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadingFlags {
    pub combined: bool,
    pub icd11: bool,
    pub ayurveda: bool,
    pub siddha: bool,
    pub unani: bool,
}

impl LoadingFlags {
    pub fn all() -> Self {
        Self {
            combined: true,
            icd11: true,
            ayurveda: true,
            siddha: true,
            unani: true,
        }
    }

    fn flag_mut(&mut self, source: SourceKind) -> &mut bool {
        match source {
            SourceKind::Combined => &mut self.combined,
            SourceKind::Icd11 => &mut self.icd11,
            SourceKind::Ayurveda => &mut self.ayurveda,
            SourceKind::Siddha => &mut self.siddha,
            SourceKind::Unani => &mut self.unani,
        }
    }

    pub fn set(&mut self, source: SourceKind, loading: bool) {
        *self.flag_mut(source) = loading;
    }

    pub fn get(&self, source: SourceKind) -> bool {
        match source {
            SourceKind::Combined => self.combined,
            SourceKind::Icd11 => self.icd11,
            SourceKind::Ayurveda => self.ayurveda,
            SourceKind::Siddha => self.siddha,
            SourceKind::Unani => self.unani,
        }
    }

    pub fn any(&self) -> bool {
        SourceKind::ALL.iter().any(|s| self.get(*s))
    }
}

/// The unified search view model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchView {
    pub query: String,
    pub mapping_results: Vec<MappingRecord>,
    pub combined: Page<CombinedResult>,
    pub icd11: Page<Term>,
    pub ayurveda: Page<Term>,
    pub siddha: Page<Term>,
    pub unani: Page<Term>,
    /// Origin of each non-empty system slot.
    pub slot_sources: BTreeMap<TerminologySystem, SlotSource>,
    pub loading: LoadingFlags,
}

impl SearchView {
    /// A fresh view for `req` with every source loading.
    pub fn started(req: &SearchRequest) -> Self {
        Self {
            query: req.text.as_str().to_string(),
            loading: LoadingFlags::all(),
            ..Self::default()
        }
    }

    pub fn system(&self, system: TerminologySystem) -> &Page<Term> {
        match system {
            TerminologySystem::Ayurveda => &self.ayurveda,
            TerminologySystem::Siddha => &self.siddha,
            TerminologySystem::Unani => &self.unani,
            TerminologySystem::Icd11 => &self.icd11,
        }
    }

    pub fn slot_source(&self, system: TerminologySystem) -> Option<SlotSource> {
        self.slot_sources.get(&system).copied()
    }

    fn system_mut(&mut self, system: TerminologySystem) -> &mut Page<Term> {
        match system {
            TerminologySystem::Ayurveda => &mut self.ayurveda,
            TerminologySystem::Siddha => &mut self.siddha,
            TerminologySystem::Unani => &mut self.unani,
            TerminologySystem::Icd11 => &mut self.icd11,
        }
    }

    /// Total results across the four per-system sources.
    pub fn system_result_count(&self) -> u64 {
        TerminologySystem::ALL
            .iter()
            .map(|s| self.system(*s).count)
            .sum()
    }
}

/// One display page of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source_kind", content = "page", rename_all = "lowercase")]
pub enum SourcePage {
    Combined(PageView<CombinedResult>),
    System(PageView<Term>),
}

#[derive(Clone)]
pub struct SearchOrchestrator {
    api: SharedApi,
    cfg: Arc<ClientConfig>,
}

impl SearchOrchestrator {
    pub fn new(api: SharedApi, cfg: Arc<ClientConfig>) -> Self {
        Self { api, cfg }
    }

    /// One server page of the combined endpoint.
    pub async fn fetch_combined_page(
        &self,
        req: &SearchRequest,
        server_page: u32,
    ) -> TerminologyResult<Page<CombinedResult>> {
        let params = req.combined_params(server_page, self.cfg.search_page_size());
        self.api.search_combined(&params).await
    }

    /// One server page of a per-system endpoint.
    pub async fn fetch_system_page(
        &self,
        req: &SearchRequest,
        system: TerminologySystem,
        server_page: u32,
    ) -> TerminologyResult<Page<Term>> {
        let params = req.system_params(server_page, self.cfg.search_page_size());
        self.api.search_system(system, &params).await
    }

    async fn load_combined(&self, req: &SearchRequest, tx: &watch::Sender<SearchView>) {
        let page = match self.fetch_combined_page(req, 1).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("combined search for {:?} failed: {}", req.text.as_str(), e);
                Page::empty()
            }
        };
        let records = mapping_results(&page.results);
        tx.send_modify(|view| {
            view.mapping_results = records;
            view.combined = page;
            view.loading.set(SourceKind::Combined, false);
        });
    }

    async fn load_system(
        &self,
        req: &SearchRequest,
        system: TerminologySystem,
        tx: &watch::Sender<SearchView>,
    ) {
        let page = match self.fetch_system_page(req, system, 1).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("{} search for {:?} failed: {}", system, req.text.as_str(), e);
                Page::empty()
            }
        };
        tx.send_modify(|view| {
            let (page, source) = with_mapped_fallback(page, system, &view.combined.results);
            match source {
                Some(source) => view.slot_sources.insert(system, source),
                None => view.slot_sources.remove(&system),
            };
            *view.system_mut(system) = page;
            view.loading.set(SourceKind::from(system), false);
        });
    }

    /// Run a search, publishing each source's result into `tx` as it resolves.
    pub async fn run(&self, req: &SearchRequest, tx: &watch::Sender<SearchView>) {
        tracing::debug!("search {:?}", req.text.as_str());
        tx.send_replace(SearchView::started(req));

        self.load_combined(req, tx).await;
        self.load_system(req, TerminologySystem::Icd11, tx).await;
        tokio::join!(
            self.load_system(req, TerminologySystem::Ayurveda, tx),
            self.load_system(req, TerminologySystem::Siddha, tx),
            self.load_system(req, TerminologySystem::Unani, tx),
        );
    }

    /// Run a search to completion and return the final view.
    pub async fn search(&self, req: &SearchRequest) -> SearchView {
        let (tx, _rx) = watch::channel(SearchView::started(req));
        self.run(req, &tx).await;
        let view = tx.borrow().clone();
        view
    }

    /// Run a search in the background; the receiver observes every incremental update.
    pub fn spawn(&self, req: SearchRequest) -> watch::Receiver<SearchView> {
        let (tx, rx) = watch::channel(SearchView::started(&req));
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run(&req, &tx).await;
        });
        rx
    }

    /// Run a search and keep per-source pagination state for it.
    pub async fn open_session(&self, req: SearchRequest) -> SearchSession {
        let view = self.search(&req).await;
        SearchSession::new(self.clone(), req, view)
    }

    /// Display page `page` of one source, read from only the server pages that hold it.
    pub async fn source_page(
        &self,
        req: &SearchRequest,
        source: SourceKind,
        page: usize,
    ) -> TerminologyResult<SourcePage> {
        let display_size = self.cfg.display_page_size();
        let server_size = self.cfg.search_page_size() as usize;
        match source.system() {
            None => fetch_display_page(page, display_size, server_size, |n| {
                self.fetch_combined_page(req, n)
            })
            .await
            .map(SourcePage::Combined),
            Some(system) => fetch_display_page(page, display_size, server_size, |n| {
                self.fetch_system_page(req, system, n)
            })
            .await
            .map(SourcePage::System),
        }
    }
}

/// A finished search whose sources page independently.
///
/// Every source keeps its own [`PagedSource`] seeded from the search's first server page,
/// so moving between display pages fetches a server page only once local results run out.
pub struct SearchSession {
    orchestrator: SearchOrchestrator,
    request: SearchRequest,
    view: SearchView,
    combined: PagedSource<CombinedResult>,
    systems: BTreeMap<TerminologySystem, PagedSource<Term>>,
}

impl SearchSession {
    fn new(orchestrator: SearchOrchestrator, request: SearchRequest, view: SearchView) -> Self {
        let page_size = orchestrator.cfg.display_page_size();
        let combined = PagedSource::from_first_page(view.combined.clone(), page_size);
        let systems = TerminologySystem::ALL
            .into_iter()
            .map(|system| {
                let first = view.system(system).clone();
                (system, PagedSource::from_first_page(first, page_size))
            })
            .collect();
        Self {
            orchestrator,
            request,
            view,
            combined,
            systems,
        }
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    /// The search view as it stood when the search finished.
    pub fn view(&self) -> &SearchView {
        &self.view
    }

    /// The page `source` is currently on, without fetching.
    pub fn current(&self, source: SourceKind) -> SourcePage {
        match source.system() {
            None => SourcePage::Combined(self.combined.view()),
            Some(system) => SourcePage::System(
                self.systems
                    .get(&system)
                    .map(PagedSource::view)
                    .unwrap_or_else(|| {
                        PagedSource::<Term>::unfetched(self.orchestrator.cfg.display_page_size())
                            .view()
                    }),
            ),
        }
    }

    /// Move `source` to display page `page`, fetching further server pages if needed.
    ///
    /// # Errors
    ///
    /// Returns the backend error if a needed server page cannot be fetched; results
    /// already held are kept.
    pub async fn page(&mut self, source: SourceKind, page: usize) -> TerminologyResult<SourcePage> {
        let orchestrator = &self.orchestrator;
        let req = &self.request;
        match source.system() {
            None => self
                .combined
                .load_page(page, |n| orchestrator.fetch_combined_page(req, n))
                .await
                .map(SourcePage::Combined),
            Some(system) => {
                let page_size = orchestrator.cfg.display_page_size();
                self.systems
                    .entry(system)
                    .or_insert_with(|| PagedSource::unfetched(page_size))
                    .load_page(page, |n| orchestrator.fetch_system_page(req, system, n))
                    .await
                    .map(SourcePage::System)
            }
        }
    }

    /// Back to page 1 for `source`, e.g. after switching tabs.
    pub fn reset(&mut self, source: SourceKind) {
        match source.system() {
            None => self.combined.reset(),
            Some(system) => {
                if let Some(paged) = self.systems.get_mut(&system) {
                    paged.reset();
                }
            }
        }
    }
}

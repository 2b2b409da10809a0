//! Cross-system detail view for one selected term.
//!
//! Opening a detail view queries all five sources concurrently and picks the best match
//! per source. Sources that report more results keep paging in a background task, up to
//! the configured page bound, and each round publishes a refreshed [`TermDetail`].

use crate::api::SharedApi;
use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::endpoints::{
    combined_search_url, system_search_url, CombinedSearchParams, SystemSearchParams,
};
use crate::mapping::{reshape, SlotSource};
use crate::{TerminologyError, TerminologyResult};
use ayush_types::{
    CombinedResult, Mapping, MappingRecord, Page, SearchText, SourceKind, Term, TerminologySystem,
};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Pick the item whose name best matches `name`.
///
/// Exact case-insensitive match first, then substring containment in either direction,
/// then the first item.
pub fn best_match<'a, T, F>(items: &'a [T], name: &str, name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return items.first();
    }
    let lowered = |item: &T| name_of(item).trim().to_lowercase();

    items
        .iter()
        .find(|item| lowered(*item) == needle)
        .or_else(|| {
            items.iter().find(|item| {
                let candidate = lowered(*item);
                !candidate.is_empty() && (candidate.contains(&needle) || needle.contains(&candidate))
            })
        })
        .or_else(|| items.first())
}

/// How far background paging has got for one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceProgress {
    pub pages_loaded: u32,
    pub results_loaded: usize,
    pub total: u64,
    pub has_more: bool,
}

/// The assembled detail view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TermDetail {
    pub term_name: String,
    pub combined: Option<CombinedResult>,
    pub mapping: Option<MappingRecord>,
    pub icd11: Option<Term>,
    pub ayurveda: Option<Term>,
    pub siddha: Option<Term>,
    pub unani: Option<Term>,
    /// Origin of each filled system slot.
    pub slot_sources: BTreeMap<TerminologySystem, SlotSource>,
    pub progress: BTreeMap<SourceKind, SourceProgress>,
    pub background_complete: bool,
}

impl TermDetail {
    pub fn system(&self, system: TerminologySystem) -> Option<&Term> {
        match system {
            TerminologySystem::Ayurveda => self.ayurveda.as_ref(),
            TerminologySystem::Siddha => self.siddha.as_ref(),
            TerminologySystem::Unani => self.unani.as_ref(),
            TerminologySystem::Icd11 => self.icd11.as_ref(),
        }
    }

    pub fn slot_source(&self, system: TerminologySystem) -> Option<SlotSource> {
        self.slot_sources.get(&system).copied()
    }
}

enum Fetched {
    Combined(Page<CombinedResult>),
    Terms(Page<Term>),
}

/// Everything fetched so far for one detail view.
#[derive(Default)]
struct Accumulated {
    combined: Vec<CombinedResult>,
    terms: BTreeMap<TerminologySystem, Vec<Term>>,
    progress: BTreeMap<SourceKind, SourceProgress>,
}

impl Accumulated {
    fn record(&mut self, source: SourceKind, fetched: Fetched, page: u32) {
        let (added, count, next) = match fetched {
            Fetched::Combined(p) => {
                let added = p.results.len();
                self.combined.extend(p.results);
                (added, p.count, p.next)
            }
            Fetched::Terms(p) => {
                let added = p.results.len();
                if let Some(system) = source.system() {
                    self.terms.entry(system).or_default().extend(p.results);
                }
                (added, p.count, p.next)
            }
        };

        let results_loaded = match source.system() {
            None => self.combined.len(),
            Some(system) => self.terms.get(&system).map_or(0, Vec::len),
        };
        self.progress.insert(
            source,
            SourceProgress {
                pages_loaded: page,
                results_loaded,
                total: count,
                has_more: next.is_some() && added > 0,
            },
        );
    }

    fn stop(&mut self, source: SourceKind) {
        if let Some(progress) = self.progress.get_mut(&source) {
            progress.has_more = false;
        }
    }

    fn has_more(&self, source: SourceKind) -> bool {
        self.progress.get(&source).is_some_and(|p| p.has_more)
    }

    fn any_more(&self) -> bool {
        SourceKind::ALL.iter().any(|s| self.has_more(*s))
    }

    fn assemble(&self, name: &str, background_complete: bool) -> TermDetail {
        let combined = best_match(&self.combined, name, |r| r.term.display_name()).cloned();
        let mut slot_sources = BTreeMap::new();
        let mut pick = |system: TerminologySystem| {
            let direct = self
                .terms
                .get(&system)
                .and_then(|terms| best_match(terms, name, Term::display_name))
                .cloned();
            let (term, source) = match direct {
                Some(term) => (Some(term), SlotSource::Direct),
                None => (
                    combined
                        .as_ref()
                        .and_then(|c| c.related(system).first())
                        .map(|related| related.term.clone()),
                    SlotSource::Mapped,
                ),
            };
            if term.is_some() {
                slot_sources.insert(system, source);
            }
            term
        };

        let icd11 = pick(TerminologySystem::Icd11);
        let ayurveda = pick(TerminologySystem::Ayurveda);
        let siddha = pick(TerminologySystem::Siddha);
        let unani = pick(TerminologySystem::Unani);

        TermDetail {
            term_name: name.to_string(),
            mapping: combined.as_ref().map(reshape),
            combined,
            icd11,
            ayurveda,
            siddha,
            unani,
            slot_sources,
            progress: self.progress.clone(),
            background_complete,
        }
    }
}

/// A live detail view. Dropping it stops background results from being published.
pub struct DetailHandle {
    rx: watch::Receiver<TermDetail>,
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl DetailHandle {
    pub fn latest(&self) -> TermDetail {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TermDetail> {
        self.rx.clone()
    }

    pub fn is_paging(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait until background paging has finished and return the final view.
    pub async fn complete(&mut self) -> TermDetail {
        if let Ok(detail) = self.rx.wait_for(|detail| detail.background_complete).await {
            return detail.clone();
        }
        self.latest()
    }
}

impl Drop for DetailHandle {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Builds detail views, caching responses by request URL in bounded, expiring caches.
#[derive(Clone)]
pub struct DetailAggregator {
    api: SharedApi,
    cfg: Arc<ClientConfig>,
    combined_cache: Arc<ResponseCache<Page<CombinedResult>>>,
    terms_cache: Arc<ResponseCache<Page<Term>>>,
}

impl DetailAggregator {
    pub fn new(api: SharedApi, cfg: Arc<ClientConfig>) -> Self {
        let capacity = cfg.cache_capacity();
        let ttl = cfg.cache_ttl();
        Self {
            api,
            cfg,
            combined_cache: Arc::new(ResponseCache::new(capacity, ttl)),
            terms_cache: Arc::new(ResponseCache::new(capacity, ttl)),
        }
    }

    async fn fetch_combined(&self, name: &str, page: u32) -> TerminologyResult<Page<CombinedResult>> {
        let params = CombinedSearchParams {
            q: name.to_string(),
            threshold: self.cfg.default_threshold(),
            fuzzy: true,
            use_fts: false,
            page,
            page_size: self.cfg.detail_page_size(),
        };
        let key = combined_search_url(self.api.base_url(), &params)?;
        self.combined_cache
            .get_or_try_insert_with(key.as_str(), || self.api.search_combined(&params))
            .await
    }

    async fn fetch_terms(
        &self,
        name: &str,
        system: TerminologySystem,
        page: u32,
    ) -> TerminologyResult<Page<Term>> {
        let params = SystemSearchParams {
            q: name.to_string(),
            threshold: self.cfg.default_threshold(),
            fuzzy: true,
            page,
            page_size: self.cfg.detail_page_size(),
        };
        let key = system_search_url(self.api.base_url(), system, &params)?;
        self.terms_cache
            .get_or_try_insert_with(key.as_str(), || self.api.search_system(system, &params))
            .await
    }

    async fn fetch_source(&self, name: &str, source: SourceKind, page: u32) -> TerminologyResult<Fetched> {
        match source.system() {
            None => self.fetch_combined(name, page).await.map(Fetched::Combined),
            Some(system) => self.fetch_terms(name, system, page).await.map(Fetched::Terms),
        }
    }

    fn settle(name: &str, source: SourceKind, result: TerminologyResult<Fetched>) -> Fetched {
        result.unwrap_or_else(|e| {
            tracing::warn!("detail lookup of {:?} in {} failed: {}", name, source, e);
            match source {
                SourceKind::Combined => Fetched::Combined(Page::empty()),
                _ => Fetched::Terms(Page::empty()),
            }
        })
    }

    async fn first_round(&self, name: &str) -> Accumulated {
        let (combined, ayurveda, unani, siddha, icd11) = tokio::join!(
            self.fetch_source(name, SourceKind::Combined, 1),
            self.fetch_source(name, SourceKind::Ayurveda, 1),
            self.fetch_source(name, SourceKind::Unani, 1),
            self.fetch_source(name, SourceKind::Siddha, 1),
            self.fetch_source(name, SourceKind::Icd11, 1),
        );

        let mut acc = Accumulated::default();
        for (source, result) in [
            (SourceKind::Combined, combined),
            (SourceKind::Ayurveda, ayurveda),
            (SourceKind::Unani, unani),
            (SourceKind::Siddha, siddha),
            (SourceKind::Icd11, icd11),
        ] {
            acc.record(source, Self::settle(name, source, result), 1);
        }
        acc
    }

    /// Build a detail view from the first page of every source, without background paging.
    ///
    /// # Errors
    ///
    /// Returns `TerminologyError::Text` if `name` is blank. Source failures are not errors;
    /// the affected slot is simply empty.
    pub async fn load(&self, name: &str) -> TerminologyResult<TermDetail> {
        let name = SearchText::new(name)?;
        let acc = self.first_round(name.as_str()).await;
        Ok(acc.assemble(name.as_str(), true))
    }

    /// Open a live detail view: the first round is awaited, further pages arrive through
    /// the returned handle.
    pub async fn open(&self, name: &str) -> TerminologyResult<DetailHandle> {
        let name = SearchText::new(name)?;
        let acc = self.first_round(name.as_str()).await;

        let needs_paging = acc.any_more() && self.cfg.detail_max_pages() > 1;
        let (tx, rx) = watch::channel(acc.assemble(name.as_str(), !needs_paging));
        let active = Arc::new(AtomicBool::new(true));

        let task = needs_paging.then(|| {
            let aggregator = self.clone();
            let active = Arc::clone(&active);
            tokio::spawn(async move {
                aggregator.page_in_background(name, acc, tx, active).await;
            })
        });

        Ok(DetailHandle { rx, active, task })
    }

    async fn page_in_background(
        self,
        name: SearchText,
        mut acc: Accumulated,
        tx: watch::Sender<TermDetail>,
        active: Arc<AtomicBool>,
    ) {
        let name = name.as_str();
        for page in 2..=self.cfg.detail_max_pages() {
            let pending: Vec<SourceKind> = SourceKind::ALL
                .into_iter()
                .filter(|s| acc.has_more(*s))
                .collect();
            if pending.is_empty() || !active.load(Ordering::Acquire) {
                break;
            }

            tracing::debug!("detail {:?}: fetching page {} of {:?}", name, page, pending);
            let results = join_all(pending.iter().map(|s| self.fetch_source(name, *s, page))).await;
            if !active.load(Ordering::Acquire) {
                tracing::debug!("detail {:?} closed; discarding page {}", name, page);
                return;
            }

            for (source, result) in pending.into_iter().zip(results) {
                match result {
                    Ok(fetched) => acc.record(source, fetched, page),
                    Err(e) => {
                        tracing::warn!("detail page {} of {} failed: {}", page, source, e);
                        acc.stop(source);
                    }
                }
            }
            tx.send_replace(acc.assemble(name, false));
        }

        if active.load(Ordering::Acquire) {
            tx.send_replace(acc.assemble(name, true));
        }
    }

    /// Single term by code.
    pub async fn lookup(&self, system: TerminologySystem, code: &str) -> TerminologyResult<Term> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TerminologyError::InvalidInput("term code cannot be empty".into()));
        }
        self.api.lookup_term(system, code).await
    }

    /// Stored mapping for an ICD-11 code.
    pub async fn mapping(&self, code: &str) -> TerminologyResult<Mapping> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TerminologyError::InvalidInput("mapping code cannot be empty".into()));
        }
        self.api.mapping(code).await
    }
}

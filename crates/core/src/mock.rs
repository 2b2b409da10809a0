//! In-memory stand-ins for the terminology backend and the document store.
//!
//! Used by the unit tests of every service and by the REST layer's handler tests.

use crate::api::TerminologyApi;
use crate::documents::DocumentStore;
use crate::endpoints::{CombinedSearchParams, SystemSearchParams};
use crate::upload::{CsvUpload, UploadReceipt};
use crate::{TerminologyError, TerminologyResult};
use async_trait::async_trait;
use ayush_types::{
    CombinedResult, Doctor, Mapping, MappingStats, Page, Patient, SourceKind, Term,
    TerminologySystem,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// One request observed by [`MockTerminologyApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    SearchSystem {
        system: TerminologySystem,
        q: String,
        page: u32,
        page_size: u32,
    },
    SearchCombined {
        q: String,
        page: u32,
        page_size: u32,
    },
    Autocomplete {
        system: TerminologySystem,
        q: String,
        limit: u32,
    },
    LookupTerm {
        system: TerminologySystem,
        code: String,
    },
    Mapping {
        code: String,
    },
    MappingStats,
    Upload {
        system: TerminologySystem,
        file_name: String,
        update_search_vector: bool,
    },
}

impl MockCall {
    /// The search source a call targeted, if it was a search.
    pub fn source(&self) -> Option<SourceKind> {
        match self {
            Self::SearchSystem { system, .. } => Some(SourceKind::from(*system)),
            Self::SearchCombined { .. } => Some(SourceKind::Combined),
            _ => None,
        }
    }
}

/// Split `items` into server pages of `page_size`, with `count` and `next` cursors filled in.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, label: &str) -> Vec<Page<T>> {
    let page_size = page_size.max(1);
    let total = items.len();
    let chunks: Vec<&[T]> = items.chunks(page_size).collect();
    let pages = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| Page {
            results: chunk.to_vec(),
            count: total as u64,
            next: (i + 1 < pages).then(|| format!("mock://{label}?page={}", i + 2)),
            previous: (i > 0).then(|| format!("mock://{label}?page={i}")),
        })
        .collect()
}

fn unavailable(what: &str) -> TerminologyError {
    TerminologyError::Status {
        status: 503,
        url: format!("mock://{what}"),
        body: "service unavailable".into(),
    }
}

/// Programmable [`TerminologyApi`] that records every call.
pub struct MockTerminologyApi {
    base_url: String,
    system_pages: HashMap<TerminologySystem, Vec<Page<Term>>>,
    combined_pages: Vec<Page<CombinedResult>>,
    failing: HashSet<SourceKind>,
    delays: HashMap<SourceKind, Duration>,
    autocomplete: HashMap<TerminologySystem, Vec<String>>,
    terms: HashMap<(TerminologySystem, String), Term>,
    mappings: HashMap<String, Mapping>,
    stats: Option<MappingStats>,
    upload_receipt: UploadReceipt,
    fail_uploads: bool,
    calls: Mutex<Vec<MockCall>>,
}

impl MockTerminologyApi {
    pub fn new() -> Self {
        Self {
            base_url: "http://mock.test".into(),
            system_pages: HashMap::new(),
            combined_pages: Vec::new(),
            failing: HashSet::new(),
            delays: HashMap::new(),
            autocomplete: HashMap::new(),
            terms: HashMap::new(),
            mappings: HashMap::new(),
            stats: Some(MappingStats::default()),
            upload_receipt: UploadReceipt::default(),
            fail_uploads: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Serve these pages (page 1 first) for `system`.
    pub fn with_system_pages(mut self, system: TerminologySystem, pages: Vec<Page<Term>>) -> Self {
        self.system_pages.insert(system, pages);
        self
    }

    /// Serve `terms` for `system`, split into server pages of `page_size`.
    pub fn with_system_terms(
        self,
        system: TerminologySystem,
        terms: Vec<Term>,
        page_size: usize,
    ) -> Self {
        let pages = paginate(&terms, page_size, system.slug());
        self.with_system_pages(system, pages)
    }

    pub fn with_combined_pages(mut self, pages: Vec<Page<CombinedResult>>) -> Self {
        self.combined_pages = pages;
        self
    }

    pub fn with_combined_results(self, results: Vec<CombinedResult>, page_size: usize) -> Self {
        let pages = paginate(&results, page_size, "combined");
        self.with_combined_pages(pages)
    }

    /// Every search against `source` fails.
    pub fn failing(mut self, source: SourceKind) -> Self {
        self.failing.insert(source);
        self
    }

    /// Searches against `source` resolve only after `delay` (tokio time).
    pub fn with_delay(mut self, source: SourceKind, delay: Duration) -> Self {
        self.delays.insert(source, delay);
        self
    }

    pub fn with_autocomplete(mut self, system: TerminologySystem, labels: Vec<String>) -> Self {
        self.autocomplete.insert(system, labels);
        self
    }

    pub fn with_term(mut self, system: TerminologySystem, term: Term) -> Self {
        self.terms.insert((system, term.code.clone()), term);
        self
    }

    pub fn with_mapping(mut self, code: &str, mapping: Mapping) -> Self {
        self.mappings.insert(code.to_string(), mapping);
        self
    }

    pub fn with_stats(mut self, stats: MappingStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// The stats endpoint fails.
    pub fn failing_stats(mut self) -> Self {
        self.stats = None;
        self
    }

    pub fn with_upload_receipt(mut self, receipt: UploadReceipt) -> Self {
        self.upload_receipt = receipt;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Every call observed so far, in arrival order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Search calls that targeted `source`.
    pub fn search_calls(&self, source: SourceKind) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.source() == Some(source))
            .collect()
    }

    async fn respond_after_delay(&self, source: SourceKind) {
        if let Some(delay) = self.delays.get(&source) {
            tokio::time::sleep(*delay).await;
        }
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Default for MockTerminologyApi {
    fn default() -> Self {
        Self::new()
    }
}

fn page_at<T: Clone>(pages: &[Page<T>], page: u32) -> Page<T> {
    page.checked_sub(1)
        .and_then(|i| pages.get(i as usize))
        .cloned()
        .unwrap_or_else(Page::empty)
}

#[async_trait]
impl TerminologyApi for MockTerminologyApi {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search_system(
        &self,
        system: TerminologySystem,
        params: &SystemSearchParams,
    ) -> TerminologyResult<Page<Term>> {
        self.record(MockCall::SearchSystem {
            system,
            q: params.q.clone(),
            page: params.page,
            page_size: params.page_size,
        });
        self.respond_after_delay(SourceKind::from(system)).await;
        if self.failing.contains(&SourceKind::from(system)) {
            return Err(unavailable(system.slug()));
        }
        Ok(self
            .system_pages
            .get(&system)
            .map(|pages| page_at(pages, params.page))
            .unwrap_or_else(Page::empty))
    }

    async fn search_combined(
        &self,
        params: &CombinedSearchParams,
    ) -> TerminologyResult<Page<CombinedResult>> {
        self.record(MockCall::SearchCombined {
            q: params.q.clone(),
            page: params.page,
            page_size: params.page_size,
        });
        self.respond_after_delay(SourceKind::Combined).await;
        if self.failing.contains(&SourceKind::Combined) {
            return Err(unavailable("combined"));
        }
        Ok(page_at(&self.combined_pages, params.page))
    }

    async fn autocomplete(
        &self,
        system: TerminologySystem,
        q: &str,
        limit: u32,
    ) -> TerminologyResult<Vec<String>> {
        self.record(MockCall::Autocomplete {
            system,
            q: q.to_string(),
            limit,
        });
        if self.failing.contains(&SourceKind::from(system)) {
            return Err(unavailable("autocomplete"));
        }
        let mut labels = self.autocomplete.get(&system).cloned().unwrap_or_default();
        labels.truncate(limit as usize);
        Ok(labels)
    }

    async fn lookup_term(&self, system: TerminologySystem, code: &str) -> TerminologyResult<Term> {
        self.record(MockCall::LookupTerm {
            system,
            code: code.to_string(),
        });
        self.terms
            .get(&(system, code.to_string()))
            .cloned()
            .ok_or_else(|| TerminologyError::Status {
                status: 404,
                url: format!("mock://{}/{}", system.slug(), code),
                body: "not found".into(),
            })
    }

    async fn mapping(&self, code: &str) -> TerminologyResult<Mapping> {
        self.record(MockCall::Mapping {
            code: code.to_string(),
        });
        self.mappings
            .get(code)
            .cloned()
            .ok_or_else(|| TerminologyError::Status {
                status: 404,
                url: format!("mock://mappings/{code}"),
                body: "not found".into(),
            })
    }

    async fn mapping_stats(&self) -> TerminologyResult<MappingStats> {
        self.record(MockCall::MappingStats);
        self.stats.clone().ok_or_else(|| unavailable("stats"))
    }

    async fn upload_csv(
        &self,
        system: TerminologySystem,
        upload: CsvUpload,
    ) -> TerminologyResult<UploadReceipt> {
        self.record(MockCall::Upload {
            system,
            file_name: upload.file_name,
            update_search_vector: upload.update_search_vector,
        });
        if self.fail_uploads {
            return Err(TerminologyError::Status {
                status: 500,
                url: format!("mock://{}/csv/upload/", system.slug()),
                body: "import failed".into(),
            });
        }
        Ok(self.upload_receipt.clone())
    }
}

/// In-memory [`DocumentStore`].
#[derive(Default)]
pub struct MemoryDocumentStore {
    doctors: HashMap<String, Doctor>,
    patients: Vec<Patient>,
    unavailable: bool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctor(mut self, doctor: Doctor) -> Self {
        self.doctors.insert(doctor.uid.clone(), doctor);
        self
    }

    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.patients.push(patient);
        self
    }

    /// Every read fails.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check(&self) -> TerminologyResult<()> {
        if self.unavailable {
            return Err(TerminologyError::DocumentRead(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "document store unavailable",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn doctor(&self, uid: &str) -> TerminologyResult<Option<Doctor>> {
        self.check()?;
        Ok(self.doctors.get(uid).cloned())
    }

    async fn patients_created_by(&self, uid: &str) -> TerminologyResult<Vec<Patient>> {
        self.check()?;
        Ok(self
            .patients
            .iter()
            .filter(|p| p.created_by == uid)
            .cloned()
            .collect())
    }
}

//! # AYUSH Core
//!
//! Client-side logic for the AYUSH terminology service.
//!
//! This crate talks to the terminology REST backend and the document store and assembles
//! what a front end renders:
//! - prioritized multi-source search with incremental view updates
//! - debounced suggestions and per-system autocomplete
//! - client-side pagination with on-demand server paging
//! - cross-system term details with background paging and a response cache
//! - the CSV upload gate and uploader
//! - the doctor dashboard
//!
//! **No server concerns**: HTTP routing, OpenAPI and request extraction belong in
//! `api-rest` and `api-shared`.

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod detail;
pub mod documents;
pub mod endpoints;
mod error;
pub mod mapping;
pub mod mock;
pub mod pagination;
pub mod search;
pub mod suggest;
pub mod upload;

pub use ayush_types;

pub use api::{HttpTerminologyClient, SharedApi, TerminologyApi};
pub use config::ClientConfig;
pub use dashboard::{Dashboard, DashboardReader};
pub use detail::{DetailAggregator, DetailHandle, TermDetail};
pub use documents::{DocumentStore, FileDocumentStore, SharedDocumentStore};
pub use error::{TerminologyError, TerminologyResult};
pub use pagination::{PageView, PagedSource};
pub use mapping::SlotSource;
pub use search::{
    SearchOrchestrator, SearchRequest, SearchSession, SearchStrategy, SearchView, SourcePage,
};
pub use suggest::{SuggestionBox, SuggestionFetcher, SuggestionList};
pub use upload::{CsvUpload, CsvUploader, UploadGate, UploadPermission, UploadReceipt};

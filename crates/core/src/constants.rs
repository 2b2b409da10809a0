//! Constants used throughout the AYUSH core crate.
//!
//! Defaults for page sizes, debounce timing and backend paths live here so the
//! config layer, the services and the tests agree on one set of values.

/// Default terminology API base URL when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default directory for the file-backed document store.
pub const DEFAULT_DOCUMENT_DIR: &str = "documents";

/// Path prefix shared by every terminology endpoint.
pub const TERMINOLOGIES_PATH: &str = "terminologies";

/// Document collection holding doctor profiles, keyed by uid.
pub const USERS_COLLECTION: &str = "users";

/// Document collection holding patient records.
pub const PATIENTS_COLLECTION: &str = "patients";

/// Server page size for search requests issued by the search orchestrator.
pub const SEARCH_PAGE_SIZE: u32 = 20;

/// Server page size for the detail aggregator.
pub const DETAIL_PAGE_SIZE: u32 = 20;

/// Upper bound on server pages the detail aggregator fetches per source.
pub const DETAIL_MAX_PAGES: u32 = 3;

/// Maximum cached responses per detail cache.
pub const DETAIL_CACHE_CAPACITY: u64 = 500;

/// Age after which a cached detail response is refetched, in seconds.
pub const DETAIL_CACHE_TTL_SECS: u64 = 300;

/// Server page size for suggestion requests.
pub const SUGGESTION_PAGE_SIZE: u32 = 10;

/// Maximum number of suggestions offered at once.
pub const SUGGESTION_LIMIT: usize = 8;

/// Number of leading suggestions also exposed as recommendations.
pub const RECOMMENDATION_COUNT: usize = 3;

/// Client-side display page size.
pub const DISPLAY_PAGE_SIZE: usize = 10;

/// Number of page buttons shown by the pagination window.
pub const PAGE_WINDOW_WIDTH: usize = 5;

/// Default minimum confidence threshold sent with searches.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Suggestion debounce bounds and default, in milliseconds.
pub const MIN_SUGGEST_DEBOUNCE_MS: u64 = 150;
pub const MAX_SUGGEST_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_SUGGEST_DEBOUNCE_MS: u64 = 300;

/// The only identity allowed to upload CSV files.
pub const ADMIN_DISPLAY_NAME: &str = "root";
pub const ADMIN_EMAIL: &str = "root@gmail.com";

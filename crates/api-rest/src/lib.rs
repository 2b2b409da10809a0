//! # API REST
//!
//! Backend-for-frontend REST API for the AYUSH terminology client.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, multipart upload, identity headers)
//!
//! Uses `api-shared` for request/response types and `ayush-core` for everything else.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Multipart, Path as AxumPath, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::{current_user, USER_EMAIL_HEADER, USER_ID_HEADER, USER_NAME_HEADER};
use api_shared::{
    AutocompleteRes, DashboardRes, DetailQuery, DetailRes, HealthRes, HealthService, MappingRes,
    SearchQuery, SearchRes, SourcePageRes, StatsRes, SuggestionQuery, SuggestionsRes, TermRes,
    UploadForm, UploadPermissionRes, UploadRes,
};
use ayush_core::ayush_types::{CurrentUser, SourceKind, TerminologySystem};
use ayush_core::config::{
    debounce_from_env_value, max_pages_from_env_value, timeout_from_env_value,
};
use ayush_core::constants::DEFAULT_DOCUMENT_DIR;
use ayush_core::{
    ClientConfig, CsvUpload, CsvUploader, DashboardReader, DetailAggregator, FileDocumentStore,
    HttpTerminologyClient, SearchOrchestrator, SharedApi, SharedDocumentStore, SuggestionFetcher,
    TerminologyError, UploadGate,
};

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Startup configuration of the REST server, resolved once from the environment.
#[derive(Clone, Debug)]
pub struct RestConfig {
    pub addr: String,
    pub document_dir: PathBuf,
    pub client: ClientConfig,
}

/// Read the server configuration from the environment.
///
/// # Environment Variables
/// - `AYUSH_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `AYUSH_API_BASE_URL`: Terminology backend (default: "http://localhost:8000")
/// - `AYUSH_DOCUMENT_DIR`: Document store export (default: "documents")
/// - `AYUSH_SUGGEST_DEBOUNCE_MS`, `AYUSH_DETAIL_MAX_PAGES`, `AYUSH_REQUEST_TIMEOUT_SECS`
///
/// # Errors
/// Returns an error if the base URL or any numeric setting is invalid.
pub fn config_from_env() -> anyhow::Result<RestConfig> {
    let addr = std::env::var("AYUSH_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let document_dir = std::env::var("AYUSH_DOCUMENT_DIR")
        .unwrap_or_else(|_| DEFAULT_DOCUMENT_DIR.into())
        .into();

    let client = match std::env::var("AYUSH_API_BASE_URL") {
        Ok(url) => ClientConfig::new(&url)?,
        Err(_) => ClientConfig::default(),
    }
    .with_suggest_debounce(debounce_from_env_value(
        std::env::var("AYUSH_SUGGEST_DEBOUNCE_MS").ok(),
    )?)
    .with_detail_max_pages(max_pages_from_env_value(
        std::env::var("AYUSH_DETAIL_MAX_PAGES").ok(),
    )?)
    .with_request_timeout(timeout_from_env_value(
        std::env::var("AYUSH_REQUEST_TIMEOUT_SECS").ok(),
    )?);

    Ok(RestConfig {
        addr,
        document_dir,
        client,
    })
}

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ClientConfig>,
    search: SearchOrchestrator,
    suggestions: SuggestionFetcher,
    details: DetailAggregator,
    dashboard: DashboardReader,
    uploader: CsvUploader,
}

impl AppState {
    pub fn new(api: SharedApi, store: SharedDocumentStore, cfg: Arc<ClientConfig>) -> Self {
        Self {
            search: SearchOrchestrator::new(api.clone(), cfg.clone()),
            suggestions: SuggestionFetcher::new(api.clone(), cfg.clone()),
            details: DetailAggregator::new(api.clone(), cfg.clone()),
            dashboard: DashboardReader::new(api.clone(), store),
            uploader: CsvUploader::new(api),
            cfg,
        }
    }

    /// State backed by the HTTP client and the file document store.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(cfg: &RestConfig) -> anyhow::Result<Self> {
        let api: SharedApi = Arc::new(HttpTerminologyClient::new(&cfg.client)?);
        let store: SharedDocumentStore = Arc::new(FileDocumentStore::new(&cfg.document_dir));
        Ok(Self::new(api, store, Arc::new(cfg.client.clone())))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        search,
        search_source,
        suggestions,
        autocomplete,
        details,
        lookup_term,
        mapping,
        stats,
        dashboard,
        upload_permission,
        upload_csv,
    ),
    components(schemas(
        HealthRes,
        SearchRes,
        SourcePageRes,
        SuggestionsRes,
        AutocompleteRes,
        DetailRes,
        TermRes,
        MappingRes,
        StatsRes,
        DashboardRes,
        UploadPermissionRes,
        UploadForm,
        UploadRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/search/:source", get(search_source))
        .route("/suggestions", get(suggestions))
        .route("/autocomplete/:system", get(autocomplete))
        .route("/details", get(details))
        .route("/terms/:system/:code", get(lookup_term))
        .route("/mappings/:code", get(mapping))
        .route("/stats", get(stats))
        .route("/dashboard/:uid", get(dashboard))
        .route("/upload/permission", get(upload_permission))
        .route("/upload/:system", post(upload_csv))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the router on `cfg.addr` until the process is stopped.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(cfg: &RestConfig) -> anyhow::Result<()> {
    let app = router(AppState::from_config(cfg)?);
    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

type ApiError = (StatusCode, &'static str);

fn reject(e: &TerminologyError) -> ApiError {
    match e {
        TerminologyError::InvalidInput(_) | TerminologyError::Text(_) => {
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        TerminologyError::UploadNotPermitted(_) => (StatusCode::FORBIDDEN, "Upload not permitted"),
        TerminologyError::Status { status: 404, .. } => (StatusCode::NOT_FOUND, "Not found"),
        TerminologyError::Http(_)
        | TerminologyError::Status { .. }
        | TerminologyError::Decode { .. } => (StatusCode::BAD_GATEWAY, "Terminology backend error"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

fn parse_system(raw: &str) -> Result<TerminologySystem, ApiError> {
    raw.parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Unknown terminology system"))
}

fn user_from_headers(headers: &HeaderMap) -> Option<CurrentUser> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    current_user(
        header(USER_ID_HEADER),
        header(USER_NAME_HEADER),
        header(USER_EMAIL_HEADER),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Unified search view", body = SearchRes),
        (status = 400, description = "Blank query or unknown system")
    )
)]
/// Search every source for a term
///
/// Queries the combined endpoint first, then ICD-11, then the three traditional systems
/// concurrently. A failing source comes back empty; the request itself only fails on
/// invalid input.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - `q` is blank,
/// - `system` names no known system.
#[axum::debug_handler]
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchRes>, ApiError> {
    let request = query.to_request(&state.cfg).map_err(|e| reject(&e))?;
    let view = state.search.search(&request).await;
    Ok(Json(SearchRes { view }))
}

#[utoipa::path(
    get,
    path = "/search/{source}",
    params(
        ("source" = String, Path, description = "combined, icd11, ayurveda, siddha or unani"),
        SearchQuery
    ),
    responses(
        (status = 200, description = "One display page of one source", body = SourcePageRes),
        (status = 400, description = "Invalid input"),
        (status = 502, description = "Terminology backend error")
    )
)]
/// One display page of a single source
///
/// Fetches as many server pages as the requested display page needs.
#[axum::debug_handler]
async fn search_source(
    State(state): State<AppState>,
    AxumPath(source): AxumPath<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SourcePageRes>, ApiError> {
    let source: SourceKind = source
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Unknown result source"))?;
    let request = query.to_request(&state.cfg).map_err(|e| reject(&e))?;

    match state
        .search
        .source_page(&request, source, query.page.unwrap_or(1))
        .await
    {
        Ok(page) => Ok(Json(SourcePageRes {
            source: source.to_string(),
            page,
        })),
        Err(e) => {
            tracing::error!("Source page error: {:?}", e);
            Err(reject(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/suggestions",
    params(SuggestionQuery),
    responses(
        (status = 200, description = "Suggestions and recommendations", body = SuggestionsRes)
    )
)]
/// Suggestions for the search box
///
/// Short input and backend failures both yield an empty list. Debouncing is the
/// caller's concern.
#[axum::debug_handler]
async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> Json<SuggestionsRes> {
    Json(SuggestionsRes {
        suggestions: state.suggestions.fetch(&query.q).await,
    })
}

#[utoipa::path(
    get,
    path = "/autocomplete/{system}",
    params(
        ("system" = String, Path, description = "ayurveda, siddha, unani or icd11"),
        SuggestionQuery
    ),
    responses(
        (status = 200, description = "Autocomplete labels", body = AutocompleteRes),
        (status = 400, description = "Unknown terminology system"),
        (status = 502, description = "Terminology backend error")
    )
)]
#[axum::debug_handler]
async fn autocomplete(
    State(state): State<AppState>,
    AxumPath(system): AxumPath<String>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<AutocompleteRes>, ApiError> {
    let system = parse_system(&system)?;
    match state.suggestions.autocomplete(system, &query.q).await {
        Ok(labels) => Ok(Json(AutocompleteRes {
            system: system.slug().to_string(),
            labels,
        })),
        Err(e) => {
            tracing::error!("Autocomplete error: {:?}", e);
            Err(reject(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/details",
    params(DetailQuery),
    responses(
        (status = 200, description = "Cross-system detail view", body = DetailRes),
        (status = 400, description = "Blank name")
    )
)]
/// Cross-system detail view of one term
///
/// By default answers from the first page of every source. With `complete=true` the
/// response waits for background paging to finish.
#[axum::debug_handler]
async fn details(
    State(state): State<AppState>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<DetailRes>, ApiError> {
    let detail = if query.complete.unwrap_or(false) {
        let mut handle = state
            .details
            .open(&query.name)
            .await
            .map_err(|e| reject(&e))?;
        handle.complete().await
    } else {
        state
            .details
            .load(&query.name)
            .await
            .map_err(|e| reject(&e))?
    };
    Ok(Json(DetailRes { detail }))
}

#[utoipa::path(
    get,
    path = "/terms/{system}/{code}",
    params(
        ("system" = String, Path, description = "ayurveda, siddha, unani or icd11"),
        ("code" = String, Path, description = "Term code")
    ),
    responses(
        (status = 200, description = "The term", body = TermRes),
        (status = 404, description = "Not found"),
        (status = 502, description = "Terminology backend error")
    )
)]
#[axum::debug_handler]
async fn lookup_term(
    State(state): State<AppState>,
    AxumPath((system, code)): AxumPath<(String, String)>,
) -> Result<Json<TermRes>, ApiError> {
    let system = parse_system(&system)?;
    match state.details.lookup(system, &code).await {
        Ok(term) => Ok(Json(TermRes {
            system: system.slug().to_string(),
            term,
        })),
        Err(e) => {
            tracing::error!("Term lookup error: {:?}", e);
            Err(reject(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/mappings/{code}",
    params(("code" = String, Path, description = "ICD-11 code")),
    responses(
        (status = 200, description = "Stored mapping", body = MappingRes),
        (status = 404, description = "Not found"),
        (status = 502, description = "Terminology backend error")
    )
)]
#[axum::debug_handler]
async fn mapping(
    State(state): State<AppState>,
    AxumPath(code): AxumPath<String>,
) -> Result<Json<MappingRes>, ApiError> {
    match state.details.mapping(&code).await {
        Ok(mapping) => Ok(Json(MappingRes { mapping })),
        Err(e) => {
            tracing::error!("Mapping lookup error: {:?}", e);
            Err(reject(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Mapping statistics, possibly placeholders", body = StatsRes)
    )
)]
#[axum::debug_handler]
async fn stats(State(state): State<AppState>) -> Json<StatsRes> {
    Json(StatsRes {
        stats: state.dashboard.stats().await,
    })
}

#[utoipa::path(
    get,
    path = "/dashboard/{uid}",
    params(("uid" = String, Path, description = "Doctor uid")),
    responses(
        (status = 200, description = "Doctor dashboard", body = DashboardRes),
        (status = 400, description = "Blank uid")
    )
)]
/// Doctor dashboard
///
/// Profile, own patients and mapping statistics. Each part falls back on its own:
/// missing profile, empty patient list, placeholder statistics.
#[axum::debug_handler]
async fn dashboard(
    State(state): State<AppState>,
    AxumPath(uid): AxumPath<String>,
) -> Result<Json<DashboardRes>, ApiError> {
    let dashboard = state.dashboard.load(&uid).await.map_err(|e| reject(&e))?;
    Ok(Json(DashboardRes { dashboard }))
}

#[utoipa::path(
    get,
    path = "/upload/permission",
    responses(
        (status = 200, description = "Whether the caller may upload CSV files", body = UploadPermissionRes)
    )
)]
#[axum::debug_handler]
async fn upload_permission(headers: HeaderMap) -> Json<UploadPermissionRes> {
    let user = user_from_headers(&headers);
    Json(UploadGate::check(user.as_ref()).into())
}

#[utoipa::path(
    post,
    path = "/upload/{system}",
    params(("system" = String, Path, description = "ayurveda, siddha, unani or icd11")),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import summary", body = UploadRes),
        (status = 400, description = "Missing, empty or non-CSV file"),
        (status = 403, description = "Caller is not the administrator"),
        (status = 502, description = "Terminology backend error")
    )
)]
/// Upload a CSV file of terms for one system
///
/// Only the administrator identity may upload; everyone else is refused before the body
/// is read.
///
/// # Errors
/// Returns `403 Forbidden` if the caller is not the administrator, `400 Bad Request` if
/// the form carries no usable CSV file, and `502 Bad Gateway` if the backend rejects it.
#[axum::debug_handler]
async fn upload_csv(
    State(state): State<AppState>,
    AxumPath(system): AxumPath<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadRes>, ApiError> {
    let system = parse_system(&system)?;
    let user = user_from_headers(&headers);
    if !UploadGate::check(user.as_ref()).is_enabled() {
        return Err((StatusCode::FORBIDDEN, "Upload not permitted"));
    }

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut update_search_vector = false;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.csv").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid file field"))?;
                file = Some((file_name, bytes.to_vec()));
            }
            "update_search_vector" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid form field"))?;
                update_search_vector = matches!(value.trim(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    let Some((file_name, contents)) = file else {
        return Err((StatusCode::BAD_REQUEST, "Missing file field"));
    };
    let upload = CsvUpload {
        file_name,
        contents,
        update_search_vector,
    };

    match state.uploader.upload(user.as_ref(), system, upload).await {
        Ok(receipt) => Ok(Json(UploadRes {
            system: system.slug().to_string(),
            receipt,
        })),
        Err(e) => {
            tracing::error!("CSV upload error: {:?}", e);
            Err(reject(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use ayush_core::ayush_types::{CombinedResult, Term};
    use ayush_core::mock::{MemoryDocumentStore, MockCall, MockTerminologyApi};
    use ayush_core::UploadReceipt;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn term(code: &str, name: &str) -> Term {
        Term {
            code: code.into(),
            english_name: Some(name.into()),
            ..Default::default()
        }
    }

    fn app(api: MockTerminologyApi) -> (Router, Arc<MockTerminologyApi>) {
        let api = Arc::new(api);
        let shared: SharedApi = api.clone();
        let state = AppState::new(
            shared,
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(ClientConfig::default()),
        );
        (router(state), api)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn csv_upload_request(uri: &str, admin: bool) -> Request<Body> {
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"terms.csv\"\r\n\
            Content-Type: text/csv\r\n\r\n\
            code,english_name\nAY1,Jvara\n\r\n\
            --XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"update_search_vector\"\r\n\r\n\
            true\r\n\
            --XBOUNDARY--\r\n";
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .header(USER_ID_HEADER, "u1");
        if admin {
            builder = builder
                .header(USER_NAME_HEADER, "root")
                .header(USER_EMAIL_HEADER, "root@gmail.com");
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app(MockTerminologyApi::new());
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn search_survives_combined_failure() {
        let (app, _) = app(
            MockTerminologyApi::new()
                .with_combined_results(vec![CombinedResult::default()], 20)
                .with_system_terms(TerminologySystem::Icd11, vec![term("1B72", "Fever")], 20)
                .failing(SourceKind::Combined),
        );
        let (status, body) = get_json(app, "/search?q=fever").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"]["mapping_results"], Value::Array(vec![]));
        assert_eq!(body["view"]["icd11"]["results"][0]["code"], "1B72");
        assert_eq!(body["view"]["loading"]["combined"], false);
    }

    #[tokio::test]
    async fn blank_search_is_bad_request() {
        let (app, api) = app(MockTerminologyApi::new());
        let (status, _) = get_json(app, "/search?q=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn source_page_returns_requested_display_page() {
        let terms: Vec<Term> = (0..25).map(|i| term(&format!("S{i}"), "Suram")).collect();
        let (app, _) = app(MockTerminologyApi::new().with_system_terms(
            TerminologySystem::Siddha,
            terms,
            20,
        ));
        let (status, body) = get_json(app, "/search/siddha?q=suram&page=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "siddha");
        assert_eq!(body["page"]["source_kind"], "system");
        assert_eq!(body["page"]["page"]["total_pages"], 3);
        assert_eq!(
            body["page"]["page"]["items"].as_array().map(Vec::len),
            Some(5)
        );
    }

    #[tokio::test]
    async fn unknown_source_is_bad_request() {
        let (app, _) = app(MockTerminologyApi::new());
        let (status, _) = get_json(app, "/search/homeopathy?q=fever").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn short_suggestion_input_makes_no_request() {
        let (app, api) = app(MockTerminologyApi::new());
        let (status, body) = get_json(app, "/suggestions?q=f").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"]["suggestions"], Value::Array(vec![]));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_term_is_not_found() {
        let (app, _) = app(MockTerminologyApi::new());
        let (status, _) = get_json(app, "/terms/unani/U404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn details_pick_exact_match() {
        let (app, _) = app(MockTerminologyApi::new().with_system_terms(
            TerminologySystem::Ayurveda,
            vec![term("AY2", "Jvaratisara"), term("AY1", "Jvara")],
            20,
        ));
        let (status, body) = get_json(app, "/details?name=jvara").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detail"]["ayurveda"]["code"], "AY1");
    }

    #[tokio::test]
    async fn stats_fall_back_to_placeholders() {
        let (app, _) = app(MockTerminologyApi::new().failing_stats());
        let (status, body) = get_json(app, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["placeholder"], true);
    }

    #[tokio::test]
    async fn upload_permission_follows_headers() {
        let (admin_app, _) = app(MockTerminologyApi::new());
        let response = admin_app
            .oneshot(
                Request::builder()
                    .uri("/upload/permission")
                    .header(USER_ID_HEADER, "u1")
                    .header(USER_NAME_HEADER, "root")
                    .header(USER_EMAIL_HEADER, "root@gmail.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let res: UploadPermissionRes = serde_json::from_slice(&bytes).unwrap();
        assert!(res.enabled);

        let (anonymous_app, _) = app(MockTerminologyApi::new());
        let (_, body) = get_json(anonymous_app, "/upload/permission").await;
        assert_eq!(body["enabled"], false);
        assert!(body["tooltip"].is_string());
    }

    #[tokio::test]
    async fn non_admin_upload_is_forbidden_and_not_sent() {
        let (app, api) = app(MockTerminologyApi::new());
        let response = app
            .oneshot(csv_upload_request("/upload/ayurveda", false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn admin_upload_reaches_backend() {
        let (app, api) = app(MockTerminologyApi::new().with_upload_receipt(UploadReceipt {
            created: 1,
            ..Default::default()
        }));
        let response = app
            .oneshot(csv_upload_request("/upload/ayurveda", true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            api.calls(),
            vec![MockCall::Upload {
                system: TerminologySystem::Ayurveda,
                file_name: "terms.csv".into(),
                update_search_vector: true,
            }]
        );
    }

    #[tokio::test]
    async fn failed_upload_is_bad_gateway() {
        let (app, _) = app(MockTerminologyApi::new().failing_uploads());
        let response = app
            .oneshot(csv_upload_request("/upload/siddha", true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

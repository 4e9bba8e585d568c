use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use content_schema::{ContentRecord, RecordStatus, RecordType};
use medref_core::{
    CoreConfig, CorpusReport, Registry, RegistryStats, ResolvedEdge, SharedRegistry,
    fail_on_warnings_from_env_value, resolve_corpus_dir, validate_corpus_dir_safe_to_load,
};

/// Application state shared across REST API handlers
///
/// Holds the hot-swappable registry and the configuration it is reloaded from.
#[derive(Clone)]
struct AppState {
    registry: Arc<SharedRegistry>,
    config: Arc<CoreConfig>,
}

#[derive(Serialize)]
struct HealthRes {
    status: &'static str,
    records: usize,
}

#[derive(Serialize)]
struct ErrorRes {
    error: String,
}

#[derive(Serialize)]
struct ReloadRes {
    records: usize,
    rejected: usize,
    dangling: usize,
}

/// Listing entry for query endpoints; the full record is at `/records/:id`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordSummary {
    id: String,
    #[serde(rename = "type")]
    record_type: RecordType,
    name: String,
    status: RecordStatus,
}

impl From<&ContentRecord> for RecordSummary {
    fn from(record: &ContentRecord) -> Self {
        Self {
            id: record.id.clone(),
            record_type: record.record_type,
            name: record.name.clone(),
            status: record.status,
        }
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    category: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: error.to_string(),
        }),
    )
}

/// Main entry point for the medref query service
///
/// Loads the corpus once, builds the registry and serves read-only REST queries over it.
/// `POST /reload` rebuilds the registry from the same corpus directory and swaps it in.
///
/// # Environment Variables
/// - `MEDREF_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDREF_CORPUS_DIR`: corpus directory (default: `corpus/`, searched upwards)
/// - `MEDREF_FAIL_ON_WARNINGS`: refuse to start when the corpus report has warnings
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medref_core=info".parse()?)
                .add_directive("medref_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDREF_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let corpus_override = std::env::var("MEDREF_CORPUS_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(std::path::PathBuf::from);
    let corpus_dir = resolve_corpus_dir(corpus_override)?;
    validate_corpus_dir_safe_to_load(&corpus_dir)?;
    let fail_on_warnings =
        fail_on_warnings_from_env_value(std::env::var("MEDREF_FAIL_ON_WARNINGS").ok())?;
    let config = CoreConfig::new(corpus_dir, fail_on_warnings)?;

    let registry = Registry::load(&config)?;
    let report = registry.validate_corpus();
    if report.has_errors() || report.has_warnings() {
        tracing::warn!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "corpus has findings, see GET /report"
        );
    }
    registry.check_warning_gate(&config)?;

    tracing::info!("++ Starting medref REST on {}", rest_addr);
    tracing::info!("++ Serving corpus from {}", config.corpus_dir().display());

    let state = AppState {
        registry: Arc::new(SharedRegistry::new(registry)),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/records/:id", get(get_record))
        .route("/records/:id/references", get(list_references))
        .route("/records/:id/backlinks", get(list_backlinks))
        .route("/tags/:tag", get(query_by_tag))
        .route("/categories/:category", get(query_by_category))
        .route("/search", get(search))
        .route("/stats", get(stats))
        .route("/report", get(report))
        .route("/reload", post(reload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint, also reporting the number of published records.
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok",
        records: state.registry.snapshot().len(),
    })
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContentRecord>, ApiError> {
    let registry = state.registry.snapshot();
    registry
        .get_by_id(&id)
        .map(|record| Json(record.clone()))
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e))
}

/// Resolved outgoing cross-references. Dangling edges are never returned.
async fn list_references(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ResolvedEdge>>, ApiError> {
    let registry = state.registry.snapshot();
    registry
        .get_by_id(&id)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e))?;
    Ok(Json(registry.list_cross_references(&id).to_vec()))
}

async fn list_backlinks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ResolvedEdge>>, ApiError> {
    let registry = state.registry.snapshot();
    registry
        .get_by_id(&id)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e))?;
    Ok(Json(registry.list_incoming_references(&id).to_vec()))
}

async fn query_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<Vec<RecordSummary>> {
    let registry = state.registry.snapshot();
    Json(summaries(registry.query_by_tag(&tag)))
}

async fn query_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Json<Vec<RecordSummary>> {
    let registry = state.registry.snapshot();
    Json(summaries(registry.query_by_category(&category)))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<RecordSummary>> {
    let registry = state.registry.snapshot();
    Json(summaries(registry.search_in(
        params.category.as_deref(),
        params.q.as_deref().unwrap_or_default(),
    )))
}

async fn stats(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.snapshot().stats())
}

/// The corpus report captured when the current registry was built.
async fn report(State(state): State<AppState>) -> Json<CorpusReport> {
    Json(state.registry.snapshot().validate_corpus().clone())
}

/// Rebuild the registry from the configured corpus and publish it.
///
/// On failure, including a rebuilt corpus with warnings while `MEDREF_FAIL_ON_WARNINGS` is set,
/// the previous registry keeps serving and the error is returned as 422.
async fn reload(State(state): State<AppState>) -> Result<Json<ReloadRes>, ApiError> {
    let shared = Arc::clone(&state.registry);
    let config = Arc::clone(&state.config);

    let result = tokio::task::spawn_blocking(move || shared.reload(&config))
        .await
        .map_err(|e| {
            tracing::error!("Reload task error: {:?}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })?;

    let registry = result.map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e))?;
    let report = registry.validate_corpus();
    Ok(Json(ReloadRes {
        records: registry.len(),
        rejected: report.rejected,
        dangling: report.dangling.len(),
    }))
}

fn summaries(records: Vec<&ContentRecord>) -> Vec<RecordSummary> {
    records.into_iter().map(RecordSummary::from).collect()
}

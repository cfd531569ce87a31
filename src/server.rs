//! Web surface
//!
//! Three JSON endpoints cover the upload/display workflow: list batches,
//! trigger processing for one batch, and fetch the compiled results with
//! public artifact URLs. Handler errors map onto status codes; the message
//! always names the artifact or batch that failed.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::aggregate::Aggregator;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::pipeline::{BatchReport, ScoringPipeline};
use crate::storage::{store_from_config, ObjectStore};

/// Shared state behind every handler
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub pipeline: ScoringPipeline,
    pub aggregator: Aggregator,
    pub config: AppConfig,
}

impl AppState {
    /// Wire up storage, pipeline and aggregator from the configuration
    pub fn from_config(config: &AppConfig, offline: bool) -> Result<Self> {
        let store = store_from_config(config)?;
        Ok(Self {
            store: store.clone(),
            pipeline: ScoringPipeline::from_config(config, store.clone(), offline),
            aggregator: Aggregator::new(store, config.clone()),
            config: config.clone(),
        })
    }
}

/// Error wrapper that renders as a JSON response
#[derive(Debug)]
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) | Error::InputLoad { .. } => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) | Error::JoinMismatch { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(error = %self.0, "request failed");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/batches", get(list_batches))
        .route("/batches/{batch}/process", post(process_batch))
        .route("/batches/{batch}/results", get(batch_results))
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "serving batch endpoints");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct BatchListing {
    /// Batch folders that already have outputs
    processed: Vec<String>,
    /// Uploaded source tables awaiting processing
    inputs: Vec<String>,
}

async fn list_batches(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<BatchListing>, ApiError> {
    let out_prefix = format!("{}/", state.config.storage.output_prefix);
    let keys = state.store.list(&out_prefix).await?;
    let mut processed: Vec<String> = keys
        .iter()
        .filter_map(|k| k.strip_prefix(&out_prefix))
        .filter_map(|rest| rest.split('/').next())
        .map(String::from)
        .collect();
    processed.sort();
    processed.dedup();

    let in_prefix = format!("{}/", state.config.storage.input_prefix);
    let keys = state.store.list(&in_prefix).await?;
    let mut inputs: Vec<String> = keys
        .iter()
        .filter_map(|k| k.strip_prefix(&in_prefix))
        .filter(|name| *name != state.config.storage.keywords_file)
        .filter_map(|name| name.strip_suffix(".csv"))
        .map(String::from)
        .collect();
    inputs.sort();
    inputs.dedup();

    Ok(Json(BatchListing { processed, inputs }))
}

async fn process_batch(
    State(state): State<Arc<AppState>>,
    Path(batch): Path<String>,
) -> std::result::Result<Json<BatchReport>, ApiError> {
    let report = state.pipeline.process_batch(&batch).await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct ResultsResponse {
    batch: String,
    categories: usize,
    periods: Vec<String>,
    /// Public URLs of the compiled tables and charts
    urls: Vec<String>,
}

async fn batch_results(
    State(state): State<Arc<AppState>>,
    Path(batch): Path<String>,
) -> std::result::Result<Json<ResultsResponse>, ApiError> {
    let compiled = state.aggregator.compile_batch(&batch).await?;
    let urls = state.aggregator.result_urls(&batch).await?;
    Ok(Json(ResultsResponse {
        batch,
        categories: compiled.sentiment.row_count(),
        periods: compiled.sentiment.periods.clone(),
        urls,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;

    const KEYWORDS: &str = "\
Key Word Category,Key Words/Topics
Growth,growth
";

    async fn seeded_state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.root = dir.path().to_string_lossy().into_owned();
        let store = Arc::new(LocalStore::new(dir.path()));

        store
            .put(
                &config.keywords_key(),
                KEYWORDS.as_bytes().to_vec(),
                "text/csv",
            )
            .await
            .unwrap();
        store
            .put(
                &config.input_key("calls"),
                b"Q1\nstrong growth this quarter\n".to_vec(),
                "text/csv",
            )
            .await
            .unwrap();

        let state = Arc::new(AppState::from_config(&config, true).unwrap());
        (dir, state)
    }

    #[tokio::test]
    async fn test_list_batches_splits_inputs_and_processed() {
        let (_dir, state) = seeded_state().await;

        let Json(listing) = list_batches(State(state.clone())).await.unwrap();
        assert_eq!(listing.inputs, vec!["calls"]);
        assert!(listing.processed.is_empty());

        state.pipeline.process_batch("calls").await.unwrap();
        let Json(listing) = list_batches(State(state)).await.unwrap();
        assert_eq!(listing.processed, vec!["calls"]);
    }

    #[tokio::test]
    async fn test_process_then_results_flow() {
        let (_dir, state) = seeded_state().await;

        let Json(report) = process_batch(State(state.clone()), Path("calls".to_string()))
            .await
            .unwrap();
        assert_eq!(report.batch, "calls");
        assert_eq!(report.total_rows(), 1);

        let Json(results) = batch_results(State(state), Path("calls".to_string()))
            .await
            .unwrap();
        assert_eq!(results.batch, "calls");
        assert_eq!(results.categories, 1);
        assert_eq!(results.periods, vec!["Q1"]);
        assert_eq!(results.urls.len(), 4);
    }

    #[tokio::test]
    async fn test_results_for_unprocessed_batch_is_not_found() {
        let (_dir, state) = seeded_state().await;
        let err = batch_results(State(state), Path("calls".to_string()))
            .await
            .err()
            .expect("should fail before processing");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_process_missing_batch_is_not_found() {
        let (_dir, state) = seeded_state().await;
        let err = process_batch(State(state), Path("absent".to_string()))
            .await
            .err()
            .expect("missing input should fail");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_status_mapping() {
        let resp = ApiError(Error::JoinMismatch {
            artifact: "output_Q1.csv".to_string(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = ApiError(Error::Config("bad".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_router_builds() {
        let (_dir, state) = seeded_state().await;
        let _router = router(state);
    }
}

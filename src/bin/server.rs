use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use rollup::{
    error::RollupError,
    query::{CumulativeRequest, Series},
    storage::{FileStore, MemoryStore},
    Record, Rollup, RollupConfig,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    rollup: Rollup,
    records: Arc<MemoryStore>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    records: usize,
}

#[derive(Debug, Serialize)]
struct InsertResponse {
    inserted: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting rollup server");

    let config = RollupConfig::from_env();
    info!("Bind address: {}", config.bind_address);
    info!("Sum field: {}", config.sum_field);
    info!("Hour anchor: {:?}", config.hour_anchor);

    let records = match &config.data_file {
        Some(path) => FileStore::open(path, &config.sum_field).await?.into_inner(),
        None => MemoryStore::new().with_value_field(&config.sum_field),
    };
    let records = Arc::new(records);

    let state = AppState {
        rollup: Rollup::new(config.clone(), records.clone()),
        records,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/records", post(insert_records))
        .route("/cumulative", post(cumulative))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        records: state.records.len().await,
    })
}

async fn insert_records(
    State(state): State<AppState>,
    Json(batch): Json<Vec<Record>>,
) -> (StatusCode, Json<InsertResponse>) {
    let inserted = state.records.insert_batch(batch).await;
    (StatusCode::CREATED, Json(InsertResponse { inserted }))
}

async fn cumulative(
    State(state): State<AppState>,
    Json(request): Json<CumulativeRequest>,
) -> Result<Json<Series>, ApiError> {
    match state.rollup.cumulative(&request).await {
        Ok(series) => Ok(Json(series)),
        Err(e) => {
            error!("Cumulative query failed: {}", e);
            Err(error_response(e))
        }
    }
}

fn error_response(e: RollupError) -> ApiError {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };

    (status, Json(ErrorResponse { error: e.to_string() }))
}

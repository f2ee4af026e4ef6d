use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{
    delete_tier, describe_tiers, insert_tier, list_tiers, update_tiers, ApiContext, Rejected,
};
use shared::{
    domain::{TierId, TierRecord},
    error::ErrorCode,
    protocol::{tier_describe_route, tiers_route, InsertTierRequest, ObjectInfo, UpdateTiersRequest},
};
use storage::Storage;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type ApiResponse<T> = Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        object_label: settings.object_label.clone(),
    };

    let state = AppState { api };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "tier service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            tiers_route(),
            get(http_list_tiers)
                .post(http_insert_tier)
                .put(http_update_tiers),
        )
        .route(tier_describe_route(), get(http_describe_tiers))
        .route("/tiers/:tier_id", axum::routing::delete(http_delete_tier))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn http_list_tiers(State(state): State<Arc<AppState>>) -> ApiResponse<Vec<TierRecord>> {
    list_tiers(&state.api)
        .await
        .map(Json)
        .map_err(rejection_response)
}

async fn http_insert_tier(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InsertTierRequest>,
) -> ApiResponse<Vec<TierRecord>> {
    insert_tier(&state.api, req.tier)
        .await
        .map(Json)
        .map_err(rejection_response)
}

async fn http_update_tiers(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateTiersRequest>,
) -> ApiResponse<Vec<TierRecord>> {
    update_tiers(&state.api, req.tiers)
        .await
        .map(Json)
        .map_err(rejection_response)
}

async fn http_delete_tier(
    State(state): State<Arc<AppState>>,
    Path(tier_id): Path<i64>,
) -> ApiResponse<Vec<TierRecord>> {
    delete_tier(&state.api, TierId(tier_id))
        .await
        .map(Json)
        .map_err(rejection_response)
}

async fn http_describe_tiers(State(state): State<Arc<AppState>>) -> Json<ObjectInfo> {
    Json(describe_tiers(&state.api))
}

/// A single problem is sent as one error object, several as a list.
fn rejection_response(rejected: Rejected) -> (StatusCode, Json<serde_json::Value>) {
    let status = match rejected.code() {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %rejected, "tier request failed");
    }

    let Rejected(mut errors) = rejected;
    let body = if errors.len() == 1 {
        serde_json::to_value(errors.remove(0))
    } else {
        serde_json::to_value(errors)
    }
    .unwrap_or(serde_json::Value::Null);
    (status, Json(body))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

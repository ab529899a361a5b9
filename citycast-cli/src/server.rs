//! `GET /api/weather?city=` re-exposing the provider's current-weather call.

use std::{sync::Arc, time::Instant};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use citycast_core::{FetchError, WeatherProvider, validate::MIN_QUERY_CHARS};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone)]
struct AppState {
    provider: Arc<dyn WeatherProvider>,
}

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
}

struct ApiError(StatusCode, &'static str);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody { error: self.1.to_string() };
        (self.0, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: Option<String>,
}

pub fn build_router(provider: Arc<dyn WeatherProvider>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/weather", get(current_weather).options(preflight))
        .layer(cors)
        .with_state(AppState { provider })
}

pub async fn serve(host: &str, port: u16, provider: Arc<dyn WeatherProvider>) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;

    tracing::info!(%addr, "weather endpoint listening");
    eprintln!("  citycast listening on http://{addr}/api/weather?city=London");
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, build_router(provider))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn current_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Response {
    let Some(city) = params.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
        return ApiError(StatusCode::BAD_REQUEST, "City parameter is required").into_response();
    };

    if city.chars().count() < MIN_QUERY_CHARS {
        return ApiError(StatusCode::BAD_REQUEST, "City name must be at least 2 characters long")
            .into_response();
    }

    let start = Instant::now();
    let result = state.provider.current(city).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(record) => {
            tracing::info!(city, elapsed_ms, "GET /api/weather -> 200");
            Json(record).into_response()
        }
        Err(FetchError::NotFound { .. }) => {
            tracing::info!(city, elapsed_ms, "GET /api/weather -> 404");
            ApiError(StatusCode::NOT_FOUND, "City not found").into_response()
        }
        Err(FetchError::Provider { status, detail }) => {
            tracing::warn!(city, status, detail = %detail, "upstream weather request failed");
            match StatusCode::from_u16(status) {
                Ok(code) if !code.is_success() => {
                    ApiError(code, "Failed to fetch weather data").into_response()
                }
                // A 2xx we could not read is our failure, not the caller's.
                _ => ApiError(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response(),
            }
        }
        Err(FetchError::Network { detail }) => {
            tracing::error!(city, detail = %detail, "weather API error");
            ApiError(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

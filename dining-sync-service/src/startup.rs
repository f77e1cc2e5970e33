//! Application startup and lifecycle management.

use crate::config::DiningSyncConfig;
use crate::handlers;
use crate::services::sources::{
    HotelRosterClient, HotelRosterSource, ReservationPlatformClient, ReservationSource,
};
use crate::services::{get_metrics, init_metrics, Reconciler};
use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: DiningSyncConfig,
    pub reconciler: Arc<Reconciler>,
    pub reservations: Arc<dyn ReservationSource>,
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "dining-sync-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

/// Prometheus metrics endpoint.
async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the production HTTP source clients.
    pub async fn build(config: DiningSyncConfig) -> Result<Self, AppError> {
        let hotel: Arc<dyn HotelRosterSource> =
            Arc::new(HotelRosterClient::new(config.hotel_source.clone()));
        let reservations: Arc<dyn ReservationSource> = Arc::new(ReservationPlatformClient::new(
            config.reservation_source.clone(),
        ));
        Self::build_with_sources(config, hotel, reservations).await
    }

    /// Build against caller-supplied sources. Tests inject mocks here.
    pub async fn build_with_sources(
        config: DiningSyncConfig,
        hotel: Arc<dyn HotelRosterSource>,
        reservations: Arc<dyn ReservationSource>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let reconciler = Arc::new(Reconciler::new(
            hotel,
            reservations.clone(),
            config.reconciliation.clone(),
        ));

        let state = AppState {
            config: config.clone(),
            reconciler,
            reservations,
        };

        // Port 0 binds a random free port for tests.
        let listener = TcpListener::bind((config.common.host.as_str(), config.common.port))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, host = %config.common.host, port = config.common.port, "Failed to bind listener");
                AppError::from(e)
            })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "dining-sync-service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the application state.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let refresh_seconds = self.state.config.reconciliation.auto_refresh_seconds;
        if refresh_seconds > 0 {
            let reconciler = self.state.reconciler.clone();
            let period = Duration::from_secs(refresh_seconds);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                // The first tick fires immediately; skip it so the first
                // refresh happens one full period after startup.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    reconciler.silent_refresh().await;
                }
            });
            tracing::info!(seconds = refresh_seconds, "Auto-refresh enabled");
        } else {
            tracing::info!("Auto-refresh disabled");
        }

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics_endpoint))
            .route("/api/reconcile", post(handlers::reconcile))
            .route("/api/report", get(handlers::report))
            .route("/api/reservations", post(handlers::create_reservation))
            .route(
                "/api/reservations/mark-left",
                post(handlers::mark_past_as_left),
            )
            .route("/api/availability/times", get(handlers::available_times))
            .route("/api/availability/tables", get(handlers::available_tables))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(self.state.clone());

        tracing::info!(
            service = "dining-sync-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await
    }
}

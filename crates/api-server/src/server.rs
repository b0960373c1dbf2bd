//! API server — HTTP router wiring plus the Prometheus metrics listener.

use crate::rest::{self, AppState};
use crate::{account_rest, auth, auth_rest, campaign_rest, report_rest};
use axum::routing::{delete, get, post, put};
use axum::Router;
use blastline_core::config::AppConfig;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full application router over a prepared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Authentication
        .route("/api/v1/auth/register", post(auth_rest::register))
        .route("/api/v1/auth/login", post(auth_rest::login))
        .route("/api/v1/auth/admin/login", post(auth_rest::admin_login))
        .route("/api/v1/auth/logout", post(auth_rest::logout))
        // Accounts
        .route("/api/v1/accounts", get(account_rest::list_accounts))
        .route("/api/v1/accounts/profile", get(account_rest::profile))
        .route("/api/v1/accounts/credits", get(account_rest::credits))
        .route("/api/v1/accounts/password", put(auth_rest::change_password))
        .route(
            "/api/v1/accounts/:id/credits",
            put(account_rest::transfer_credits),
        )
        .route("/api/v1/accounts/:id", delete(account_rest::delete_account))
        // Campaigns
        .route(
            "/api/v1/campaigns",
            get(campaign_rest::list_campaigns).post(campaign_rest::create_campaign),
        )
        .route(
            "/api/v1/campaigns/:id/status",
            put(campaign_rest::set_campaign_status),
        )
        .route(
            "/api/v1/campaigns/:id/deduct",
            put(campaign_rest::deduct_campaign_credits),
        )
        // Suspicious activity
        .route(
            "/api/v1/suspicious-activity",
            get(campaign_rest::list_suspicious_activity)
                .post(campaign_rest::record_suspicious_activity),
        )
        // Reports
        .route("/api/v1/reports/dashboard", get(report_rest::dashboard_stats))
        .route(
            "/api/v1/reports/reseller-summary",
            get(report_rest::reseller_summary),
        )
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Main API server managing the REST and metrics listeners.
pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = build_router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);
        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}

//! Blastline — multi-tenant campaign management backend.
//!
//! Main entry point that wires the stores, ledger, and auth together and
//! starts the API server.

use blastline_api::{ApiServer, AppState};
use blastline_campaigns::{CampaignStore, SuspiciousActivityLog};
use blastline_core::config::{AppConfig, BootstrapConfig};
use blastline_core::types::Role;
use blastline_identity::{AccountStore, NewAccount};
use blastline_ledger::CreditLedger;
use blastline_platform::auth::AuthManager;
use blastline_reporting::ReportService;
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "blastline")]
#[command(about = "Multi-tenant campaign management backend")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "BLASTLINE__NODE_ID")]
    node_id: Option<String>,

    /// Bind host (overrides config)
    #[arg(long, env = "BLASTLINE__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "BLASTLINE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "BLASTLINE__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

/// Seed the configured bootstrap admin. Skipped when unconfigured or when
/// the mobile number is already registered.
fn seed_bootstrap_admin(accounts: &AccountStore, bootstrap: &BootstrapConfig) {
    let (Some(mobile), Some(password)) = (&bootstrap.admin_mobile, &bootstrap.admin_password)
    else {
        return;
    };
    if accounts.find_by_mobile(mobile).is_ok() {
        info!("Bootstrap admin already registered, skipping seed");
        return;
    }
    match accounts.create_account(
        NewAccount {
            username: bootstrap.admin_username.clone(),
            email: bootstrap.admin_email.clone(),
            mobile_number: mobile.clone(),
            role: Role::Admin,
        },
        password,
        password,
        None,
    ) {
        Ok(account) => info!(account_id = %account.id, "Bootstrap admin seeded"),
        Err(e) => error!(error = %e, "Bootstrap admin seeding failed"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blastline=info,tower_http=info".into());
    if cli.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Blastline starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    // Wire the stores, ledger, and session manager
    let accounts = Arc::new(AccountStore::new());
    let campaigns = Arc::new(CampaignStore::new());
    let suspicious = Arc::new(SuspiciousActivityLog::new());
    let ledger = Arc::new(CreditLedger::new(accounts.clone(), campaigns.clone()));
    let reports = Arc::new(ReportService::new(accounts.clone(), campaigns.clone()));
    let auth = Arc::new(AuthManager::with_ttl(chrono::Duration::hours(
        config.auth.token_ttl_hours,
    )));

    seed_bootstrap_admin(&accounts, &config.bootstrap);

    let state = AppState {
        accounts,
        campaigns,
        suspicious,
        ledger,
        reports,
        auth,
        node_id: config.node_id.clone(),
        start_time: Instant::now(),
    };

    let api_server = ApiServer::new(config.clone(), state);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Blastline is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}

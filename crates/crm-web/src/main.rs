//! CRM Pro web server.

use crm_core::{AuthConfig, AuthService};
use crm_web::{config, AppState, Config};
use database::{session, Database};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_env_files();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting CRM web server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let purged = session::purge_expired_sessions(db.pool(), chrono::Utc::now()).await?;
    if purged > 0 {
        info!(purged, "Removed expired sessions");
    }

    let auth = AuthService::new(
        db.clone(),
        AuthConfig {
            session_ttl: config.session_ttl,
            ..AuthConfig::default()
        },
    );
    let _auth_log = auth.on_auth_state_change(|event| {
        debug!(
            kind = ?event.kind,
            user_id = event.user.as_ref().map(|u| u.id.as_str()).unwrap_or("-"),
            "Auth state changed"
        );
    });

    // Build application
    let state = AppState::new(db, auth, config.api_key.clone())
        .with_secure_cookies(config.secure_cookies);
    let app = crm_web::app(state);

    // Start server
    info!(addr = %config.addr, "CRM web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! papshop-mock-api: development backend for the admin console
//!
//! Run it next to `papshop-tui` to log in with the demo accounts:
//! - admin@pap.com / admin123 (ADMIN)
//! - user@pap.com / user123 (USER, turned away by the console)

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use papshop_core::Config;
use papshop_mock_api::{auth, JwtIssuer, MockState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "papshop_mock_api=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        Config::default()
    });

    // Initialize JWT issuer
    let jwt_secret = if let Some(ref secret) = config.mock.jwt_secret {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(secret)
            .context("Invalid JWT secret (must be base64)")?
    } else {
        let secret = auth::generate_secret();
        tracing::info!("Generated random JWT secret (will change on restart)");
        secret.to_vec()
    };

    let issuer = JwtIssuer::new(&jwt_secret, config.mock.token_ttl);
    tracing::info!("Issued tokens expire after {}s", issuer.ttl());
    let state = MockState::new(issuer).context("Failed to seed demo accounts")?;
    let app = papshop_mock_api::router(state);

    // Start server
    let addr = SocketAddr::from((
        config.mock.listen_addr.parse::<std::net::IpAddr>()?,
        config.mock.port,
    ));
    tracing::info!("papshop-mock-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! admin_server — the admissions/diploma admin API.
//!
//! Configuration comes from the environment (see `config.rs`); a `.env`
//! file is honored in development.

use std::sync::Arc;

use anyhow::Context;
use campus_admin::api::{build_router, AppState};
use campus_admin::auth::{HsVerifier, JwksVerifier, TokenVerifier};
use campus_admin::config::{AuthConfig, Config};
use campus_admin::mailer::{HttpIdentityProvider, HttpMailer, IdentityProvider, Mailer};
use campus_admin::registry::{PgStatusStore, StatusRegistry, DEFAULT_CACHE_TTL};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_admin=debug,tower_http=debug".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    info!("connected to database");

    let registry = Arc::new(StatusRegistry::new(
        Arc::new(PgStatusStore::new(pool.clone())),
        DEFAULT_CACHE_TTL,
    ));

    let verifier: Arc<dyn TokenVerifier> = match &config.auth {
        AuthConfig::Jwks {
            url,
            issuer,
            audience,
        } => {
            info!(jwks_url = %url, "token verification via JWKS");
            Arc::new(JwksVerifier::new(url.clone(), issuer.clone(), audience.clone()))
        }
        AuthConfig::Secret(secret) => {
            info!("token verification via shared secret");
            Arc::new(HsVerifier::from_secret(secret.as_bytes()))
        }
    };

    let mailer: Option<Arc<dyn Mailer>> = config.mail.as_ref().map(|m| {
        Arc::new(HttpMailer::new(
            m.api_url.clone(),
            m.api_key.clone(),
            m.from.clone(),
        )) as Arc<dyn Mailer>
    });
    if mailer.is_none() {
        info!("mail provider not configured; reply sending disabled");
    }

    let idp: Option<Arc<dyn IdentityProvider>> = config.idp.as_ref().map(|i| {
        Arc::new(HttpIdentityProvider::new(i.api_url.clone(), i.api_key.clone()))
            as Arc<dyn IdentityProvider>
    });

    let state = AppState {
        pool,
        registry,
        verifier,
        mailer,
        idp,
    };
    let app = build_router(state, config.cors_allow_origin.as_deref());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    info!("admin_server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

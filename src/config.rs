//! Environment-driven configuration.
//!
//! Required:
//!   DATABASE_URL       — Postgres connection string
//!   JWKS_URL + JWT_ISSUER + JWT_AUDIENCE, or JWT_SECRET (dev/test)
//! Optional:
//!   BIND_ADDR          — listen address (default 0.0.0.0:4500)
//!   MAIL_API_URL, MAIL_API_KEY, MAIL_FROM   — transactional mail provider
//!   IDP_API_URL, IDP_API_KEY                — identity-provider management API
//!   CORS_ALLOW_ORIGIN  — exact origin; unset means allow any (dev)

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub auth: AuthConfig,
    pub mail: Option<MailConfig>,
    pub idp: Option<IdpConfig>,
    pub cors_allow_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AuthConfig {
    Jwks {
        url: String,
        issuer: String,
        audience: String,
    },
    Secret(String),
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct IdpConfig {
    pub api_url: String,
    pub api_key: String,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Config> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bind_addr = env_opt("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:4500".into());

        let auth = match (env_opt("JWKS_URL"), env_opt("JWT_SECRET")) {
            (Some(url), _) => AuthConfig::Jwks {
                url,
                issuer: std::env::var("JWT_ISSUER")
                    .context("JWT_ISSUER must be set when JWKS_URL is")?,
                audience: std::env::var("JWT_AUDIENCE")
                    .context("JWT_AUDIENCE must be set when JWKS_URL is")?,
            },
            (None, Some(secret)) => AuthConfig::Secret(secret),
            (None, None) => bail!("either JWKS_URL or JWT_SECRET must be set"),
        };

        let mail = match (env_opt("MAIL_API_URL"), env_opt("MAIL_API_KEY"), env_opt("MAIL_FROM")) {
            (Some(api_url), Some(api_key), Some(from)) => Some(MailConfig {
                api_url,
                api_key,
                from,
            }),
            (None, _, _) => None,
            _ => bail!("MAIL_API_URL requires MAIL_API_KEY and MAIL_FROM"),
        };

        let idp = match (env_opt("IDP_API_URL"), env_opt("IDP_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(IdpConfig { api_url, api_key }),
            (None, _) => None,
            _ => bail!("IDP_API_URL requires IDP_API_KEY"),
        };

        Ok(Config {
            database_url,
            bind_addr,
            auth,
            mail,
            idp,
            cors_allow_origin: env_opt("CORS_ALLOW_ORIGIN"),
        })
    }
}

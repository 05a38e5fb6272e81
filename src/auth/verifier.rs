//! Bearer-token verification.
//!
//! Production deployments verify RS256 tokens against the identity
//! provider's JSON Web Key Set, keyed by issuer/audience. Local development
//! and tests use a shared HMAC secret instead. Both sit behind the
//! [`TokenVerifier`] trait so handlers never see the difference.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::ApiError;

/// Claim keys checked for the signed-in email, in order. Identity providers
/// namespace custom claims, so the bare key is tried first and the
/// namespaced variants after it.
const EMAIL_CLAIM_KEYS: [&str; 3] = [
    "email",
    "https://campus-admin/email",
    "https://claims.campus-admin.dev/email",
];

/// Decoded claim set. Everything beyond `sub` is carried loosely since
/// providers differ in what they attach.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// The email claim, if present under any of the known keys.
    pub fn email(&self) -> Option<&str> {
        EMAIL_CLAIM_KEYS
            .iter()
            .find_map(|key| self.extra.get(*key).and_then(|v| v.as_str()))
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, ApiError>;
}

/// HMAC verifier for local development and tests.
pub struct HsVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl HsVerifier {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for HsVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| ApiError::Auth(format!("invalid token: {e}")))?;
        Ok(data.claims)
    }
}

/// RS256 verifier backed by a cached JWKS fetch.
pub struct JwksVerifier {
    http: reqwest::Client,
    jwks_url: String,
    validation: Validation,
    ttl: Duration,
    keys: RwLock<Option<(Instant, HashMap<String, DecodingKey>)>>,
}

impl JwksVerifier {
    pub fn new(jwks_url: String, issuer: String, audience: String) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        Self {
            http: reqwest::Client::new(),
            jwks_url,
            validation,
            ttl: Duration::from_secs(600),
            keys: RwLock::new(None),
        }
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, ApiError> {
        {
            let cache = self.keys.read().await;
            if let Some((fetched_at, keys)) = cache.as_ref() {
                if fetched_at.elapsed() < self.ttl {
                    if let Some(key) = keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }
        // Unknown or stale kid: refetch the set (covers provider key
        // rotation) and try again.
        let keys = self.refresh().await?;
        keys.get(kid)
            .cloned()
            .ok_or_else(|| ApiError::Auth(format!("no JWKS key for kid '{kid}'")))
    }

    async fn refresh(&self) -> Result<HashMap<String, DecodingKey>, ApiError> {
        let set: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::Auth(format!("JWKS fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::Auth(format!("JWKS parse failed: {e}")))?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            if let (Some(kid), Ok(key)) = (
                jwk.common.key_id.clone(),
                DecodingKey::from_jwk(jwk),
            ) {
                keys.insert(kid, key);
            }
        }
        tracing::debug!(count = keys.len(), "refreshed JWKS key cache");

        let mut cache = self.keys.write().await;
        *cache = Some((Instant::now(), keys.clone()));
        Ok(keys)
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let header =
            decode_header(token).map_err(|e| ApiError::Auth(format!("invalid token: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| ApiError::Auth("token header has no kid".into()))?;
        let key = self.key_for(&kid).await?;
        let data = decode::<Claims>(token, &key, &self.validation)
            .map_err(|e| ApiError::Auth(format!("invalid token: {e}")))?;
        Ok(data.claims)
    }
}

use crate::key::{ServiceAccountKey, SigningKey};
use chrono::{DateTime, Duration, Utc};
use errors::AuthError;
use jsonwebtoken::{Algorithm, Header};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// IAM token exchange endpoint. Also the audience of every signed assertion.
pub const IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";

const ASSERTION_LIFETIME_SECONDS: i64 = 3600;
const REFRESH_MARGIN_SECONDS: i64 = 600;
const DEFAULT_EXPIRES_IN_SECONDS: i64 = 43200;

/// Owns a service account key and the IAM token derived from it.
///
/// The cached token and its renewal deadline live behind one mutex that is
/// held for the whole check-refresh sequence of [`get_token`](Self::get_token).
pub struct CredentialManager {
    http_client: Client,
    token_url: String,
    signing_key: SigningKey,
    cached: Mutex<Option<CachedToken>>
}

struct CachedToken {
    token: String,
    /// Renewal deadline: the real expiry minus the refresh margin.
    expires_at: DateTime<Utc>
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    jwt: &'a str
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    iam_token: String,
    #[serde(default, deserialize_with = "seconds")]
    expires_in: Option<i64>
}

/// int64 fields of the IAM API may arrive as JSON strings.
fn seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(String)
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom)
    }
}

fn renewal_deadline(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, AuthError> {
    expires_in
        .checked_sub(REFRESH_MARGIN_SECONDS)
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| AuthError::MalformedResponse {
            reason: format!("expiresIn out of range: {}", expires_in)
        })
}

impl CredentialManager {
    pub fn new(key: ServiceAccountKey) -> Result<Self, AuthError> {
        Self::with_token_url(key, IAM_TOKEN_URL)
    }

    /// Builds a manager that exchanges assertions at `token_url` instead of
    /// the public endpoint. The assertion audience is unaffected.
    pub fn with_token_url(key: ServiceAccountKey, token_url: &str) -> Result<Self, AuthError> {
        let signing_key = key.into_signing_key()?;
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::Connection {
                reason: e.to_string()
            })?;

        debug!(
            key_id = %signing_key.key_id,
            algorithm = %signing_key.algorithm,
            "Service account key loaded"
        );

        Ok(Self {
            http_client,
            token_url: token_url.to_string(),
            signing_key,
            cached: Mutex::new(None)
        })
    }

    pub fn key_id(&self) -> &str {
        &self.signing_key.key_id
    }

    /// Returns a valid IAM token, refreshing it when the cached one reached
    /// its renewal deadline.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.expires_at {
                debug!("Using cached IAM token");
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Drops the cached token so the next [`get_token`](Self::get_token)
    /// refreshes it.
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        *cached = None;
    }

    /// Renewal deadline of the cached token, if any.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.cached.lock().await.as_ref().map(|t| t.expires_at)
    }

    fn create_assertion(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let encoding_key = self.signing_key.encoding_key()?;

        let issued_at = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.signing_key.service_account_id,
            sub: &self.signing_key.service_account_id,
            aud: IAM_TOKEN_URL,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECONDS
        };

        let mut header = Header::new(Algorithm::PS256);
        header.kid = Some(self.signing_key.key_id.clone());

        jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(|e| {
            error!(key_id = %self.signing_key.key_id, error = %e, "Failed to sign JWT");
            AuthError::InvalidCredential {
                key_id: self.signing_key.key_id.clone(),
                reason: format!("failed to sign assertion: {}", e)
            }
        })
    }

    async fn fetch_token(&self) -> Result<CachedToken, AuthError> {
        let jwt = self.create_assertion(Utc::now())?;

        let response = self
            .http_client
            .post(&self.token_url)
            .json(&TokenRequest { jwt: &jwt })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Connection to IAM token endpoint failed");
                AuthError::Connection {
                    reason: e.to_string()
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status, body = %body, "IAM token request failed");
            return Err(AuthError::TokenEndpoint { status, body });
        }

        let token_response: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| AuthError::MalformedResponse {
                    reason: e.to_string()
                })?;

        let expires_in = token_response
            .expires_in
            .unwrap_or(DEFAULT_EXPIRES_IN_SECONDS);
        let expires_at = renewal_deadline(Utc::now(), expires_in)?;

        metrics::counter!("yagpt_iam_token_refresh_total").increment(1);
        debug!(expires_at = %expires_at, "Obtained new IAM token");

        Ok(CachedToken {
            token: token_response.iam_token,
            expires_at
        })
    }
}

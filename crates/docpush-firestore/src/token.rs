//! OAuth2 token exchange for service accounts.
//!
//! A signed assertion is POSTed once to the token endpoint and traded for a
//! short-lived bearer token. Nothing is cached or retried here: any failure is
//! returned to the caller, which aborts the upload.

use std::fmt;

use chrono::{DateTime, Utc};
use docpush_models::CredentialRecord;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info_span, Instrument};

use crate::assertion::AssertionSigner;
use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_token_exchange;

/// Grant type for the JWT bearer flow.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A bearer token for the documents API.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// The raw bearer string.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchanges signed assertions for access tokens.
#[derive(Clone)]
pub struct TokenExchanger {
    http: Client,
}

impl TokenExchanger {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// POST the assertion to `token_uri` and return the `access_token` field.
    pub async fn exchange(&self, assertion: &str, token_uri: &str) -> FirestoreResult<String> {
        let span = info_span!("token_exchange", token_uri = %token_uri);
        self.post_assertion(assertion, token_uri).instrument(span).await
    }

    async fn post_assertion(&self, assertion: &str, token_uri: &str) -> FirestoreResult<String> {
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)];

        let response = self.http.post(token_uri).form(&params).send().await?;
        let status = response.status();
        record_token_exchange(status.as_u16());

        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(FirestoreError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(FirestoreError::InvalidResponse(
                "token response has no access_token".to_string(),
            )),
        }
    }
}

/// Sign an assertion for `credential` and trade it for a bearer token.
///
/// The token expires one assertion lifetime after the issue time.
pub async fn acquire_token(http: &Client, credential: &CredentialRecord) -> FirestoreResult<AccessToken> {
    let signer = AssertionSigner::new(credential)?;
    let assertion = signer.sign()?;

    let token = TokenExchanger::new(http.clone())
        .exchange(&assertion.jwt, signer.token_uri())
        .await?;

    debug!(
        client_email = %credential.client_email,
        expires_at = %assertion.expires_at(),
        "Obtained access token"
    );

    Ok(AccessToken::new(token, assertion.expires_at()))
}

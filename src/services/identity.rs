//! Verification of provider access tokens (Google, LINE).
//!
//! The client obtains an OAuth access token from the provider and posts it to
//! `/auth/{provider}`. The token is first checked against the provider's
//! introspection endpoint (audience / channel), then used to read the
//! profile. Any failure is logged with detail and reported to the caller as
//! a generic invalid credential.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::{Config, GoogleSettings, LineSettings};
use crate::error::{AppError, AppResult};
use crate::models::{ExternalIdentity, MAX_NAME_LEN, Provider, validate_http_url};

/// HTTP connect timeout for provider calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// HTTP total timeout for provider calls.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Name given to accounts whose provider profile carries none.
const FALLBACK_NAME: &str = "User";

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: Option<String>,
    azp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: Option<String>,
    verified_email: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineVerifyResponse {
    client_id: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineProfile {
    user_id: String,
    display_name: Option<String>,
    picture_url: Option<String>,
}

/// Verifies provider access tokens and returns the confirmed identity.
#[derive(Clone)]
pub struct IdentityVerifier {
    http: reqwest::Client,
    google: GoogleSettings,
    line: LineSettings,
}

impl IdentityVerifier {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            google: config.google.clone(),
            line: config.line.clone(),
        })
    }

    /// Verify `token` with `provider` and return the account it belongs to.
    pub async fn verify(
        &self,
        provider: Provider,
        token: &SecretString,
    ) -> AppResult<ExternalIdentity> {
        if token.expose_secret().trim().is_empty() {
            return Err(AppError::Validation("token must not be empty".to_string()));
        }

        match provider {
            Provider::Google => self.verify_google(token).await,
            Provider::Line => self.verify_line(token).await,
        }
    }

    async fn verify_google(&self, token: &SecretString) -> AppResult<ExternalIdentity> {
        let provider = Provider::Google;
        let tokeninfo_url = format!(
            "{}?access_token={}",
            self.google.tokeninfo_url,
            urlencoding::encode(token.expose_secret())
        );
        let info: GoogleTokenInfo = self
            .fetch_json(provider, self.http.get(tokeninfo_url), "tokeninfo")
            .await?;

        if !audience_allowed(&self.google.client_ids, &info) {
            return Err(rejected(
                provider,
                format!("audience {:?} not in allow-list", info.aud),
            ));
        }

        let profile: GoogleUserInfo = self
            .fetch_json(
                provider,
                self.http
                    .get(&self.google.userinfo_url)
                    .bearer_auth(token.expose_secret()),
                "userinfo",
            )
            .await?;

        if profile.id.trim().is_empty() {
            return Err(rejected(provider, "userinfo carried no account id"));
        }

        let email = match profile.verified_email {
            Some(false) => None,
            _ => profile
                .email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
        };

        Ok(ExternalIdentity {
            provider,
            name: display_name(profile.name.as_deref(), email.as_deref()),
            subject: profile.id,
            email,
            avatar_url: sanitize_avatar(profile.picture),
        })
    }

    async fn verify_line(&self, token: &SecretString) -> AppResult<ExternalIdentity> {
        let provider = Provider::Line;
        let verify_url = format!(
            "{}?access_token={}",
            self.line.verify_url,
            urlencoding::encode(token.expose_secret())
        );
        let verified: LineVerifyResponse = self
            .fetch_json(provider, self.http.get(verify_url), "verify")
            .await?;

        if let Some(channel_id) = &self.line.channel_id
            && verified.client_id != *channel_id
        {
            return Err(rejected(
                provider,
                format!("token issued for channel {}", verified.client_id),
            ));
        }
        if verified.expires_in <= 0 {
            return Err(rejected(provider, "token expired"));
        }

        let profile: LineProfile = self
            .fetch_json(
                provider,
                self.http
                    .get(&self.line.profile_url)
                    .bearer_auth(token.expose_secret()),
                "profile",
            )
            .await?;

        if profile.user_id.trim().is_empty() {
            return Err(rejected(provider, "profile carried no user id"));
        }

        Ok(ExternalIdentity {
            provider,
            name: display_name(profile.display_name.as_deref(), None),
            subject: profile.user_id,
            // LINE profiles never include an email address
            email: None,
            avatar_url: sanitize_avatar(profile.picture_url),
        })
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        provider: Provider,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> AppResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| rejected(provider, format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejected(provider, format!("{} returned {}", what, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| rejected(provider, format!("unreadable {} response: {}", what, e)))
    }
}

fn rejected(provider: Provider, detail: impl std::fmt::Display) -> AppError {
    warn!(provider = %provider, "Token verification failed: {}", detail);
    AppError::InvalidCredential(format!("{} token could not be verified", provider))
}

/// An empty allow-list accepts any audience.
fn audience_allowed(client_ids: &[String], info: &GoogleTokenInfo) -> bool {
    if client_ids.is_empty() {
        return true;
    }
    [info.aud.as_deref(), info.azp.as_deref()]
        .into_iter()
        .flatten()
        .any(|aud| client_ids.iter().any(|id| id == aud))
}

fn display_name(name: Option<&str>, email: Option<&str>) -> String {
    let candidate = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| {
            email
                .and_then(|e| e.split('@').next())
                .filter(|local| !local.is_empty())
        })
        .unwrap_or(FALLBACK_NAME);
    candidate.chars().take(MAX_NAME_LEN).collect()
}

fn sanitize_avatar(url: Option<String>) -> Option<String> {
    url.and_then(|u| validate_http_url("avatarUrl", &u).ok())
}

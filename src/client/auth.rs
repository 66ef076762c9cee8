// This file is part of the terraform-provider-powervs project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! IAM session: API key exchange, token cache and account lookup

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::{ClientError, ClientResult};

const APIKEY_GRANT: &str = "urn:ibm:params:oauth:grant-type:apikey";
const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    Token {
        access_token: String,
        refresh_token: Option<String>,
    },
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(****)"),
            Self::Token { refresh_token, .. } => f
                .debug_struct("Token")
                .field("refresh_token", &refresh_token.as_ref().map(|_| "****"))
                .finish_non_exhaustive(),
        }
    }
}

/// Bearer token of a request, with the account it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub access_token: String,
    pub account: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    /// `account.bss` claim of the token, decoded once
    account: Option<String>,
    /// Latest refresh token issued by IAM
    refresh_token: Option<String>,
    expires_at: u64,
}

impl CachedToken {
    fn new(access_token: String, refresh_token: Option<String>, expires_at: u64) -> Self {
        let account = decode_account(&access_token).ok();
        Self {
            access_token,
            account,
            refresh_token,
            expires_at,
        }
    }

    fn is_fresh(&self, now: u64) -> bool {
        now + EXPIRY_MARGIN_SECS < self.expires_at
    }

    fn session(&self) -> ClientResult<Session> {
        let account = self
            .account
            .clone()
            .ok_or_else(|| ClientError::Auth("IAM token has no account.bss claim".to_owned()))?;
        Ok(Session {
            access_token: self.access_token.clone(),
            account,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expiration: Option<u64>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
pub(crate) struct Authenticator {
    http: reqwest::Client,
    iam_endpoint: String,
    credentials: Credentials,
    cache: Mutex<Option<CachedToken>>,
}

impl Authenticator {
    pub(crate) fn new(http: reqwest::Client, iam_endpoint: String, credentials: Credentials) -> Self {
        let cache = match &credentials {
            Credentials::Token {
                access_token,
                refresh_token,
            } => {
                let access_token = strip_bearer(access_token).to_owned();
                let expires_at = decode_claims(&access_token)
                    .ok()
                    .and_then(|claims| claims.exp)
                    .unwrap_or(u64::MAX);
                Some(CachedToken::new(access_token, refresh_token.clone(), expires_at))
            }
            Credentials::ApiKey(_) => None,
        };
        Self {
            http,
            iam_endpoint: iam_endpoint.trim_end_matches('/').to_owned(),
            credentials,
            cache: Mutex::new(cache),
        }
    }

    /// Current session, with the token exchanged again when close to expiry
    pub(crate) async fn session(&self) -> ClientResult<Session> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(now()) {
                return cached.session();
            }
        }

        let refresh_token = cache.as_ref().and_then(|cached| cached.refresh_token.clone());
        let form: Vec<(&str, &str)> = match (&self.credentials, &refresh_token, cache.as_ref()) {
            (Credentials::ApiKey(apikey), _, _) => {
                vec![("grant_type", APIKEY_GRANT), ("apikey", apikey.as_str())]
            }
            (Credentials::Token { .. }, Some(refresh_token), _) => vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
            // A bare token without a way to renew it is used until rejected
            (Credentials::Token { .. }, None, Some(cached)) => return cached.session(),
            (Credentials::Token { .. }, None, None) => {
                return Err(ClientError::Auth("no IAM token available".to_owned()))
            }
        };

        let url = format!("{}/identity/token", self.iam_endpoint);
        debug!(url, "requesting IAM token");
        let mut request = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .form(&form);
        if matches!(self.credentials, Credentials::Token { .. }) {
            request = request.basic_auth("bx", Some("bx"));
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Auth(format!(
                "{status}: {}",
                ClientError::from_response(status.as_u16(), &body)
            )));
        }
        let token: TokenResponse = serde_json::from_str(&body)?;
        let expires_at = token
            .expiration
            .or_else(|| token.expires_in.map(|secs| now() + secs))
            .unwrap_or(u64::MAX);
        // IAM may rotate the refresh token: the latest one is used for the next exchange
        let refresh_token = token.refresh_token.or(refresh_token);
        let cached = CachedToken::new(token.access_token, refresh_token, expires_at);
        let session = cached.session();
        *cache = Some(cached);
        session
    }
}

#[derive(Debug, Default, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<u64>,
    #[serde(default)]
    account: Option<AccountClaim>,
}

#[derive(Debug, Default, Deserialize)]
struct AccountClaim {
    #[serde(default)]
    bss: Option<String>,
}

fn decode_claims(token: &str) -> ClientResult<Claims> {
    let payload = strip_bearer(token)
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::Auth("IAM token is not a JWT".to_owned()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| ClientError::Auth(format!("invalid IAM token payload: {err}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read the `account.bss` claim of an IAM token
pub fn decode_account(token: &str) -> ClientResult<String> {
    decode_claims(token)?
        .account
        .and_then(|account| account.bss)
        .filter(|bss| !bss.is_empty())
        .ok_or_else(|| ClientError::Auth("IAM token has no account.bss claim".to_owned()))
}

fn strip_bearer(token: &str) -> &str {
    token
        .strip_prefix("Bearer ")
        .or_else(|| token.strip_prefix("bearer "))
        .unwrap_or(token)
        .trim()
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn account_from_claims() {
        let token = jwt(r#"{"account":{"bss":"abc123","valid":true},"exp":10}"#);
        assert_eq!(decode_account(&token).unwrap(), "abc123");
        assert_eq!(
            decode_account(&format!("Bearer {token}")).unwrap(),
            "abc123"
        );
    }

    #[test]
    fn account_missing() {
        let token = jwt(r#"{"sub":"someone"}"#);
        assert!(matches!(decode_account(&token), Err(ClientError::Auth(_))));
        assert!(decode_account("not-a-jwt").is_err());
    }

    #[test]
    fn credentials_are_redacted() {
        let creds = Credentials::ApiKey("secret".into());
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[tokio::test]
    async fn static_token_is_used_as_is() {
        let token = jwt(r#"{"account":{"bss":"acc"}}"#);
        let auth = Authenticator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".into(),
            Credentials::Token {
                access_token: format!("Bearer {token}"),
                refresh_token: None,
            },
        );
        let session = auth.session().await.unwrap();
        assert_eq!(session.access_token, token);
        assert_eq!(session.account, "acc");
    }

    #[tokio::test]
    async fn token_without_account_is_rejected() {
        let auth = Authenticator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".into(),
            Credentials::Token {
                access_token: jwt(r#"{"sub":"someone"}"#),
                refresh_token: None,
            },
        );
        assert!(matches!(auth.session().await, Err(ClientError::Auth(_))));
    }
}

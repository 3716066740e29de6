//! Shared HTTP client
//!
//! Every API call of the admin goes through [`HttpClient`]:
//! - base URL from [`AppConfig`]
//! - cookies (`credentials: include`) and the bearer access token
//! - on 401 the access token is refreshed once and the request is retried;
//!   a second 401 clears the session and redirects to the login page

use contracts::system::auth::ApiMessage;
use gloo_net::http::{Request, RequestBuilder, Response};
use leptos::prelude::*;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use web_sys::RequestCredentials;

use super::api_utils::absolute_url;
use super::config::AppConfig;
use crate::system::auth::{api, storage};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("{}", status_text(.status, .message))]
    Status { status: u16, message: Option<String> },
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl HttpError {
    /// Message supplied by the server in the error body, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            HttpError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

fn status_text(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("request failed with status {}", status),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpClient {
    base: String,
    login_path: String,
    refresh_path: String,
}

impl HttpClient {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base: config.api_base(),
            login_path: config.auth.login_path.clone(),
            refresh_path: config.auth.refresh_path.clone(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        absolute_url(&self.base, path)
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, HttpError> {
        let url = self.url(path);
        self.execute(|token| {
            authorized(Request::get(&url), token)
                .build()
                .map_err(|e| HttpError::Encode(e.to_string()))
        })
        .await
    }

    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, HttpError> {
        let url = self.url(path);
        self.execute(|token| {
            authorized(Request::post(&url), token)
                .json(body)
                .map_err(|e| HttpError::Encode(e.to_string()))
        })
        .await
    }

    async fn execute<F>(&self, build: F) -> Result<Value, HttpError>
    where
        F: Fn(Option<&str>) -> Result<Request, HttpError>,
    {
        let token = storage::access_token();
        let response = send(build(token.as_deref())?).await?;
        if response.status() != 401 {
            return read_body(response).await;
        }

        log::warn!("401 from {}, refreshing access token", response.url());
        match api::refresh_access_token(&self.url(&self.refresh_path)).await {
            Ok(fresh) => {
                let retry = send(build(Some(&fresh))?).await?;
                if retry.status() != 401 {
                    return read_body(retry).await;
                }
                log::warn!("Retry after token refresh is still unauthorized");
            }
            Err(e) => log::warn!("Token refresh failed: {}", e),
        }

        storage::clear_tokens();
        redirect_to(&self.login_path);
        Err(HttpError::Unauthorized)
    }
}

/// Client from context, or one built from the loaded config when the tree
/// has none (isolated widgets, tests of pages).
pub fn use_http_client() -> HttpClient {
    use_context::<HttpClient>()
        .unwrap_or_else(|| HttpClient::from_config(&super::config::load_config()))
}

fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    let builder = builder.credentials(RequestCredentials::Include);
    match token {
        Some(t) => builder.header("Authorization", &format!("Bearer {}", t)),
        None => builder,
    }
}

async fn send(request: Request) -> Result<Response, HttpError> {
    request
        .send()
        .await
        .map_err(|e| HttpError::Network(e.to_string()))
}

async fn read_body(response: Response) -> Result<Value, HttpError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| HttpError::Decode(e.to_string()))?;

    if !response.ok() {
        return Err(HttpError::Status {
            status,
            message: server_message(&text),
        });
    }
    parse_body(&text)
}

/// Empty body is valid (e.g. 204 after create)
fn parse_body(text: &str) -> Result<Value, HttpError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| HttpError::Decode(e.to_string()))
}

fn server_message(text: &str) -> Option<String> {
    serde_json::from_str::<ApiMessage>(text)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.trim().is_empty())
}

fn redirect_to(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().set_href(path) {
            log::error!("Failed to redirect to {}: {:?}", path, e);
        }
    }
}

use contracts::system::auth::{RefreshRequest, RefreshResponse};
use gloo_net::http::Request;
use web_sys::RequestCredentials;

/// Exchange the stored refresh token for a new access token.
///
/// Returns the new token (already persisted) or a description of the failure.
pub async fn refresh_access_token(url: &str) -> Result<String, String> {
    let refresh_token = super::storage::refresh_token()
        .ok_or_else(|| "No refresh token stored".to_string())?;
    let request = RefreshRequest { refresh_token };

    let response = Request::post(url)
        .credentials(RequestCredentials::Include)
        .json(&request)
        .map_err(|e| format!("Failed to serialize request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;

    if !response.ok() {
        return Err(format!("Refresh failed: {}", response.status()));
    }

    let body = response
        .json::<RefreshResponse>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;

    super::storage::save_access_token(&body.access_token);
    Ok(body.access_token)
}

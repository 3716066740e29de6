use contracts::shared::select_option::{normalize_options, CreateOptionResponse, SelectOption};
use serde_json::Value;

use super::error::SelectError;
use crate::shared::http::{HttpClient, HttpError};

const GENERIC_CREATE_ERROR: &str = "Failed to create option";

/// Load and normalize the options list
pub async fn fetch_options(client: &HttpClient, url: &str) -> Result<Vec<SelectOption>, SelectError> {
    let payload = client.get_json(url).await.map_err(|e| {
        log::error!("Failed to load options from {}: {}", url, e);
        SelectError::Fetch(e.to_string())
    })?;
    Ok(normalize_options(&payload))
}

/// POST a new option. The response body is only inspected for a message;
/// the caller re-reads the list to get the authoritative entry.
pub async fn create_option(client: &HttpClient, endpoint: &str, body: &Value) -> Result<(), SelectError> {
    match client.post_json(endpoint, body).await {
        Ok(payload) => {
            if let Ok(CreateOptionResponse { message: Some(message) }) =
                serde_json::from_value::<CreateOptionResponse>(payload)
            {
                log::debug!("Option created at {}: {}", endpoint, message);
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Failed to create option at {}: {}", endpoint, e);
            Err(SelectError::Create(create_error_message(&e)))
        }
    }
}

fn create_error_message(error: &HttpError) -> String {
    error
        .server_message()
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_CREATE_ERROR.to_string())
}

use crate::shared::api_utils::join_path;
use crate::shared::http::HttpClient;
use contracts::domain::a004_product::aggregate::{ProductDto, SaveProductResponse, SupplierDraft};
use serde_json::Value;

pub const PRODUCTS_ENDPOINT: &str = "/api/products";
pub const CATEGORIES_ENDPOINT: &str = "/api/categories";
pub const UNITS_ENDPOINT: &str = "/api/units";
pub const SUPPLIERS_ENDPOINT: &str = "/api/suppliers";

pub async fn fetch_by_id(client: &HttpClient, id: &str) -> Result<ProductDto, String> {
    let url = join_path(PRODUCTS_ENDPOINT, Some(id));
    let payload = client.get_json(&url).await.map_err(|e| e.to_string())?;
    serde_json::from_value(payload).map_err(|e| format!("{e}"))
}

/// Сохранить карточку. Возвращает id товара.
pub async fn save_form(client: &HttpClient, dto: &ProductDto) -> Result<String, String> {
    let payload = client
        .post_json(PRODUCTS_ENDPOINT, dto)
        .await
        .map_err(|e| e.to_string())?;
    let response: SaveProductResponse =
        serde_json::from_value(payload).map_err(|e| format!("{e}"))?;
    Ok(response.id)
}

/// Создать поставщика из диалога быстрого ввода. Возвращает его id.
pub async fn create_supplier(client: &HttpClient, draft: &SupplierDraft) -> Result<String, String> {
    let payload = client
        .post_json(SUPPLIERS_ENDPOINT, draft)
        .await
        .map_err(|e| e.to_string())?;
    created_id(&payload).ok_or_else(|| "Server did not return the new supplier id".to_string())
}

/// `id` из ответа на создание: строка или число
fn created_id(payload: &Value) -> Option<String> {
    match payload.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

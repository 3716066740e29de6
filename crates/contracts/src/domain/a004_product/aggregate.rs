use serde::{Deserialize, Serialize};

/// DTO формы товара (карточка номенклатуры в админке)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: Option<String>,
    pub description: String,

    #[serde(rename = "productType")]
    pub product_type: String,

    pub category: String,

    pub unit: String,

    #[serde(rename = "supplierId")]
    pub supplier_id: String,

    pub comment: Option<String>,
}

/// Ответ backend на сохранение карточки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProductResponse {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Новый контрагент-поставщик, создаваемый из диалога быстрого ввода
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierDraft {
    pub name: String,
    pub inn: Option<String>,
    pub email: Option<String>,
}

use super::model;
use crate::shared::components::select_type_input::{RemoteSource, SelectConfig};
use crate::shared::http::{use_http_client, HttpClient};
use contracts::domain::a004_product::aggregate::{ProductDto, SupplierDraft};
use contracts::shared::select_option::{CreateOptionRequest, SelectChangeEvent, SelectOption};
use leptos::prelude::*;

pub const FIELD_PRODUCT_TYPE: &str = "productType";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_UNIT: &str = "unit";
pub const FIELD_SUPPLIER: &str = "supplierId";

/// ViewModel for Product details form
#[derive(Clone)]
pub struct ProductDetailsViewModel {
    pub form: RwSignal<ProductDto>,
    pub error: RwSignal<Option<String>>,
    pub saving: RwSignal<bool>,
    /// Открытый диалог быстрого создания поставщика
    pub supplier_draft: RwSignal<Option<SupplierDraft>>,
    pub creating_supplier: RwSignal<bool>,
    client: HttpClient,
}

impl ProductDetailsViewModel {
    pub fn new() -> Self {
        Self {
            form: RwSignal::new(ProductDto::default()),
            error: RwSignal::new(None),
            saving: RwSignal::new(false),
            supplier_draft: RwSignal::new(None),
            creating_supplier: RwSignal::new(false),
            client: use_http_client(),
        }
    }

    pub fn is_edit_mode(&self) -> impl Fn() -> bool + '_ {
        move || self.form.with(|f| f.id.is_some())
    }

    pub fn is_form_valid(&self) -> impl Fn() -> bool + '_ {
        move || self.form.with(|f| Self::validate_form(f).is_ok())
    }

    fn validate_form(dto: &ProductDto) -> Result<(), &'static str> {
        if dto.description.trim().is_empty() {
            return Err("Наименование обязательно для заполнения");
        }
        if dto.product_type.trim().is_empty() {
            return Err("Тип товара обязателен для заполнения");
        }
        if dto.category.trim().is_empty() {
            return Err("Категория обязательна для заполнения");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Field configs
    // ------------------------------------------------------------------

    /// Тип товара: фиксированный список, только существующие значения
    pub fn product_type_config() -> SelectConfig {
        SelectConfig::new(FIELD_PRODUCT_TYPE)
            .with_label("Тип товара")
            .with_placeholder("Выберите тип")
            .static_options(vec![
                SelectOption::new("Товар", "goods"),
                SelectOption::new("Услуга", "service"),
                SelectOption::new("Комплект", "kit"),
            ])
            .required(true)
    }

    /// Категории зависят от типа товара; недостающую можно создать сразу на сервере
    pub fn category_config(product_type: &str) -> SelectConfig {
        SelectConfig::new(FIELD_CATEGORY)
            .with_label("Категория")
            .with_placeholder("Начните вводить категорию")
            .remote(RemoteSource::new(model::CATEGORIES_ENDPOINT).with_product_type(product_type))
            .post_create(model::CATEGORIES_ENDPOINT, Some("name"))
            .required(true)
    }

    /// Единица измерения: подсказки с сервера, но допустим любой текст
    pub fn unit_config() -> SelectConfig {
        SelectConfig::new(FIELD_UNIT)
            .with_label("Единица измерения")
            .with_placeholder("шт, кг, м...")
            .remote(RemoteSource::new(model::UNITS_ENDPOINT).with_remote_search())
            .allow_custom_value(true)
    }

    /// Поставщик создаётся через диалог с дополнительными реквизитами
    pub fn supplier_config() -> SelectConfig {
        SelectConfig::new(FIELD_SUPPLIER)
            .with_label("Поставщик")
            .with_placeholder("Найдите поставщика")
            .remote(RemoteSource::new(model::SUPPLIERS_ENDPOINT))
            .delegate_create()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn apply_change(&self, event: SelectChangeEvent) {
        self.form.update(|f| Self::apply_field(f, &event));
    }

    /// Write a combobox change into the form. Changing the product type
    /// resets the category, since categories are filtered by type.
    fn apply_field(dto: &mut ProductDto, event: &SelectChangeEvent) {
        let value = event.value().to_string();
        match event.name() {
            FIELD_PRODUCT_TYPE => {
                if dto.product_type != value {
                    dto.category.clear();
                }
                dto.product_type = value;
            }
            FIELD_CATEGORY => dto.category = value,
            FIELD_UNIT => dto.unit = value,
            FIELD_SUPPLIER => dto.supplier_id = value,
            other => log::warn!("Change for unknown product field '{}'", other),
        }
    }

    pub fn open_supplier_dialog(&self, request: CreateOptionRequest) {
        self.supplier_draft.set(Some(SupplierDraft {
            name: request.label,
            ..Default::default()
        }));
    }

    pub fn close_supplier_dialog(&self) {
        self.supplier_draft.set(None);
    }

    /// Load form data from server if ID is provided
    pub fn load_if_needed(&self, id: Option<String>) {
        let Some(existing_id) = id else {
            return;
        };

        let this = self.clone();
        leptos::task::spawn_local(async move {
            match model::fetch_by_id(&this.client, &existing_id).await {
                Ok(item) => this.form.set(item),
                Err(e) => this.error.set(Some(e)),
            }
        });
    }

    pub fn save_command(&self, on_saved: Callback<String>) {
        if let Err(e) = self.form.with_untracked(Self::validate_form) {
            self.error.set(Some(e.to_string()));
            return;
        }

        let this = self.clone();
        let dto = self.form.get_untracked();
        self.saving.set(true);
        leptos::task::spawn_local(async move {
            let result = model::save_form(&this.client, &dto).await;
            this.saving.set(false);
            match result {
                Ok(id) => {
                    this.error.set(None);
                    this.form.update(|f| f.id = Some(id.clone()));
                    on_saved.run(id);
                }
                Err(e) => this.error.set(Some(e)),
            }
        });
    }

    /// POST the supplier from the dialog and select it in the form.
    /// The supplier combobox sees an unknown id and reloads its list once.
    pub fn create_supplier_command(&self) {
        let Some(draft) = self.supplier_draft.get_untracked() else {
            return;
        };
        if draft.name.trim().is_empty() {
            self.error.set(Some("Наименование поставщика обязательно".to_string()));
            return;
        }

        let this = self.clone();
        self.creating_supplier.set(true);
        leptos::task::spawn_local(async move {
            let result = model::create_supplier(&this.client, &draft).await;
            this.creating_supplier.set(false);
            match result {
                Ok(id) => {
                    log::info!("Supplier '{}' created with id {}", draft.name, id);
                    this.supplier_draft.set(None);
                    this.form.update(|f| f.supplier_id = id);
                }
                Err(e) => this.error.set(Some(e)),
            }
        });
    }
}

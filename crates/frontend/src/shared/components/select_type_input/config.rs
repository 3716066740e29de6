//! Настройка поля выбора: откуда берутся варианты и как создаются новые.
//!
//! Источник вариантов и способ создания задаются явными стратегиями
//! ([`OptionSource`], [`CreateStrategy`]), а не набором взаимоисключающих флагов.

use contracts::shared::select_option::SelectOption;
use serde::Serialize;

use crate::shared::api_utils::join_path;

/// Filter parameters appended to the options GET.
/// Empty strings are treated as "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionFilters {
    pub product_type: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize)]
struct OptionsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(rename = "productType", skip_serializing_if = "Option::is_none")]
    product_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

/// Remote options endpoint: `GET <base>[/<suffix>]?[search]&[productType]&[category]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSource {
    pub base: String,
    pub suffix: Option<String>,
    pub filters: OptionFilters,
    /// Re-query the server with `search=<text>` on every keystroke
    pub search_remote: bool,
}

impl RemoteSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Default::default()
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.filters.product_type = Some(product_type.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.filters.category = Some(category.into());
        self
    }

    pub fn with_remote_search(mut self) -> Self {
        self.search_remote = true;
        self
    }

    pub fn url(&self, search: Option<&str>) -> String {
        let path = join_path(&self.base, self.suffix.as_deref());
        let query = OptionsQuery {
            search: non_empty(search),
            product_type: non_empty(self.filters.product_type.as_deref()),
            category: non_empty(self.filters.category.as_deref()),
        };
        match serde_qs::to_string(&query) {
            Ok(qs) if !qs.is_empty() => format!("{}?{}", path, qs),
            Ok(_) => path,
            Err(e) => {
                log::warn!("Failed to encode options query for {}: {}", path, e);
                path
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSource {
    /// Fixed list supplied by the caller
    Static(Vec<SelectOption>),
    Remote(RemoteSource),
}

impl Default for OptionSource {
    fn default() -> Self {
        OptionSource::Static(Vec::new())
    }
}

/// POST endpoint used to create a missing option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTarget {
    pub endpoint: String,
    /// Body key; defaults to the field name
    pub field_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CreateStrategy {
    #[default]
    Disabled,
    /// Hand the typed text to the caller (`on_create` callback), e.g. to open a dialog
    Delegate,
    Post(PostTarget),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectConfig {
    pub name: String,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub source: OptionSource,
    pub create: CreateStrategy,
    pub allow_custom_value: bool,
    pub required: bool,
    pub read_only: bool,
}

impl SelectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn static_options(mut self, options: Vec<SelectOption>) -> Self {
        self.source = OptionSource::Static(options);
        self
    }

    pub fn remote(mut self, source: RemoteSource) -> Self {
        self.source = OptionSource::Remote(source);
        self
    }

    pub fn delegate_create(mut self) -> Self {
        self.create = CreateStrategy::Delegate;
        self
    }

    pub fn post_create(mut self, endpoint: impl Into<String>, field_name: Option<&str>) -> Self {
        self.create = CreateStrategy::Post(PostTarget {
            endpoint: endpoint.into(),
            field_name: field_name.map(str::to_string),
        });
        self
    }

    pub fn allow_custom_value(mut self, allow: bool) -> Self {
        self.allow_custom_value = allow;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Текст для сообщений валидации: подпись, затем placeholder, затем имя поля
    pub fn display_name(&self) -> &str {
        [self.label.as_deref(), self.placeholder.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(self.name.as_str())
    }

    pub fn remote_source(&self) -> Option<&RemoteSource> {
        match &self.source {
            OptionSource::Remote(remote) => Some(remote),
            OptionSource::Static(_) => None,
        }
    }

    pub fn create_enabled(&self) -> bool {
        self.create != CreateStrategy::Disabled
    }

    /// Key of the POST body for direct creation
    pub fn post_field_name<'a>(&'a self, target: &'a PostTarget) -> &'a str {
        target.field_name.as_deref().unwrap_or(self.name.as_str())
    }
}

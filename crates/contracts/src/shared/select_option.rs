//! Опции выпадающих списков (combobox / typeahead)
//!
//! Справочные endpoint'ы backend отдают варианты в разных формах: массив строк,
//! `{label, value}`, `{value}`, `{name, id}` или произвольные объекты.
//! Здесь всё это приводится к единому [`SelectOption`], у которого `label` и
//! `value` всегда строки.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Один вариант выбора.
///
/// `label` всегда хранится в виде простого текста (по нему идёт поиск и он же
/// попадает в поле ввода). Если исходная подпись содержала разметку, она
/// сохраняется в `label_html` и выводится в списке как есть, поэтому
/// вызывающая сторона обязана передавать уже очищенный HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_html: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        let raw = label.into();
        let value = value.into();
        if contains_markup(&raw) {
            Self {
                label: strip_markup(&raw),
                value,
                label_html: Some(raw),
            }
        } else {
            Self {
                label: raw,
                value,
                label_html: None,
            }
        }
    }

    /// Case-insensitive substring match against the plain label.
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.label.to_lowercase().contains(&query)
    }

    /// Exact match of the plain label, ignoring case and surrounding spaces:
    /// "blue " typed by the user commits the "Blue" option. Used for strict
    /// commit and blur resolution.
    pub fn label_equals(&self, text: &str) -> bool {
        let text = text.trim();
        !text.is_empty() && self.label.trim().to_lowercase() == text.to_lowercase()
    }
}

/// Событие изменения значения поля, которое получает родительская форма
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    pub value: String,
}

/// `{ target: {name, value}, label: {name, value: plainLabel} }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectChangeEvent {
    pub target: FieldValue,
    pub label: FieldValue,
}

impl SelectChangeEvent {
    pub fn new(name: &str, value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            target: FieldValue {
                name: name.to_string(),
                value: value.into(),
            },
            label: FieldValue {
                name: name.to_string(),
                value: label.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn value(&self) -> &str {
        &self.target.value
    }

    pub fn label(&self) -> &str {
        &self.label.value
    }
}

/// Запрос на создание нового варианта, передаваемый во внешний обработчик
/// (например, чтобы открыть диалог создания контрагента)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptionRequest {
    pub name: String,
    pub label: String,
    pub value: String,
}

/// Ответ на POST создания варианта. Форма созданной сущности не важна:
/// после успешного создания список всегда перечитывается.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOptionResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Normalize a raw options payload. Anything but an array yields an empty list;
/// items that carry no usable text are dropped.
pub fn normalize_options(payload: &Value) -> Vec<SelectOption> {
    match payload {
        Value::Array(items) => items.iter().filter_map(normalize_option).collect(),
        _ => Vec::new(),
    }
}

/// Normalize a single item of an options payload.
pub fn normalize_option(item: &Value) -> Option<SelectOption> {
    match item {
        Value::String(s) if !s.trim().is_empty() => Some(SelectOption::new(s.clone(), s.clone())),
        Value::Number(n) => Some(SelectOption::new(n.to_string(), n.to_string())),
        Value::Bool(b) => Some(SelectOption::new(b.to_string(), b.to_string())),
        Value::Object(map) => normalize_object(map),
        _ => None,
    }
}

fn normalize_object(map: &Map<String, Value>) -> Option<SelectOption> {
    if let Some(option) = pair(map, "label", "value") {
        return Some(option);
    }
    if let Some(option) = pair(map, "name", "id") {
        return Some(option);
    }

    // Произвольный объект: первая непустая строка и в подпись, и в значение
    map.values().find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(SelectOption::new(s.clone(), s.clone())),
        _ => None,
    })
}

fn pair(map: &Map<String, Value>, label_key: &str, value_key: &str) -> Option<SelectOption> {
    let label = map.get(label_key).and_then(scalar_text);
    let value = map.get(value_key).and_then(scalar_text);
    match (label, value) {
        (Some(label), Some(value)) => Some(SelectOption::new(label, value)),
        (Some(label), None) => Some(SelectOption::new(label.clone(), label)),
        (None, Some(value)) => Some(SelectOption::new(value.clone(), value)),
        (None, None) => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn contains_markup(text: &str) -> bool {
    let has_tag = text
        .find('<')
        .map(|start| text[start..].contains('>'))
        .unwrap_or(false);
    let has_entity = text
        .find('&')
        .map(|start| text[start..].contains(';'))
        .unwrap_or(false);
    has_tag || has_entity
}

/// Convert a markup label to plain text: drop tags, decode the common
/// entities and collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match (in_tag, ch) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                if is_breaking_tag(&tag) {
                    text.push(' ');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => text.push(c),
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_breaking_tag(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    matches!(name.as_str(), "br" | "p" | "div" | "li" | "tr" | "td")
}

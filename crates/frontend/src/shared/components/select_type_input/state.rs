//! Состояние поля выбора.
//!
//! Вся логика combobox живёт здесь и не зависит от браузера: каждый переход
//! меняет [`SelectState`] и возвращает список [`Effect`], которые выполняет
//! компонент (запросы к API, уведомление родителя, делегирование создания).

use contracts::shared::select_option::{CreateOptionRequest, SelectChangeEvent, SelectOption};
use serde_json::{Map, Value};

use super::config::{CreateStrategy, OptionSource, SelectConfig};
use super::error::SelectError;

/// Keys the combobox reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Tab,
    Other,
}

impl NavKey {
    pub fn from_key(key: &str) -> Self {
        match key {
            "ArrowDown" | "Down" => NavKey::ArrowDown,
            "ArrowUp" | "Up" => NavKey::ArrowUp,
            "Enter" => NavKey::Enter,
            "Escape" | "Esc" => NavKey::Escape,
            "Tab" => NavKey::Tab,
            _ => NavKey::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub url: String,
    /// Issued from typing; the view debounces these
    pub from_search: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchRequest),
    Emit(SelectChangeEvent),
    DelegateCreate(CreateOptionRequest),
    PostCreate { endpoint: String, body: Value },
}

/// A rendered dropdown row. The create row, when shown, is always index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Create(String),
    Option(SelectOption),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyOutcome {
    pub effects: Vec<Effect>,
    pub prevent_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectState {
    config: SelectConfig,
    input_value: String,
    selected_value: String,
    options: Vec<SelectOption>,
    highlighted: Option<usize>,
    show_options: bool,
    /// Typed text filters the list; cleared once a value is committed
    filtering: bool,
    touched: bool,
    error: Option<SelectError>,
    created: bool,
    loading: bool,
    fetching: bool,
    loaded: bool,
    generation: u64,
    last_emitted: Option<(String, String)>,
    external_value: String,
    /// `(label, value)` sent with the in-flight create POST
    pending_create: Option<(String, String)>,
    /// Created option to lock onto once the refreshed list arrives
    pending_lock: Option<(String, String)>,
    /// External value that already triggered a reload because it was unknown
    reloaded_for: Option<String>,
}

impl SelectState {
    pub fn new(config: SelectConfig) -> Self {
        let (options, loaded) = match &config.source {
            OptionSource::Static(options) => (options.clone(), true),
            OptionSource::Remote(_) => (Vec::new(), false),
        };
        Self {
            config,
            input_value: String::new(),
            selected_value: String::new(),
            options,
            highlighted: None,
            show_options: false,
            filtering: false,
            touched: false,
            error: None,
            created: false,
            loading: false,
            fetching: false,
            loaded,
            generation: 0,
            last_emitted: None,
            external_value: String::new(),
            pending_create: None,
            pending_lock: None,
            reloaded_for: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    pub fn input_value(&self) -> &str {
        &self.input_value
    }

    pub fn selected_value(&self) -> &str {
        &self.selected_value
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn show_options(&self) -> bool {
        self.show_options
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    pub fn error(&self) -> Option<&SelectError> {
        self.error.as_ref()
    }

    pub fn created(&self) -> bool {
        self.created
    }

    /// A create POST is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    /// Dropdown is open and has something to show
    pub fn is_open(&self) -> bool {
        self.show_options && self.row_count() > 0
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn placeholder(&self) -> String {
        if self.loading {
            "Creating...".to_string()
        } else {
            self.config.placeholder.clone().unwrap_or_default()
        }
    }

    // ------------------------------------------------------------------
    // Derived list
    // ------------------------------------------------------------------

    /// Options matching the typed text. Empty while a fetch is in flight.
    pub fn visible_options(&self) -> Vec<SelectOption> {
        if self.fetching {
            return Vec::new();
        }
        if !self.filtering {
            return self.options.clone();
        }
        self.options
            .iter()
            .filter(|o| o.matches(&self.input_value))
            .cloned()
            .collect()
    }

    pub fn show_create(&self) -> bool {
        let text = self.input_value.trim();
        self.config.create_enabled()
            && !text.is_empty()
            && !self.created
            && !self.fetching
            && !self.options.iter().any(|o| o.matches(text))
    }

    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        if self.show_create() {
            rows.push(Row::Create(self.input_value.trim().to_string()));
        }
        rows.extend(self.visible_options().into_iter().map(Row::Option));
        rows
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Seed from the external value and start loading remote options.
    pub fn mount(&mut self, value: &str) -> Vec<Effect> {
        let mut effects = self.sync_external(value);
        effects.extend(self.request_options(None));
        effects
    }

    /// Apply a new configuration; a changed source reloads the options.
    pub fn reconfigure(&mut self, config: SelectConfig) -> Vec<Effect> {
        let source_changed = self.config.source != config.source;
        self.config = config;
        if !source_changed {
            return Vec::new();
        }

        match &self.config.source {
            OptionSource::Static(options) => {
                self.options = options.clone();
                // Результат ещё не пришедшего запроса больше не нужен
                self.generation += 1;
                self.fetching = false;
                self.loaded = true;
                self.clamp_highlight();
                let external = self.external_value.clone();
                self.force_sync(&external)
            }
            OptionSource::Remote(_) => {
                self.loaded = false;
                self.reloaded_for = None;
                self.request_options(None)
            }
        }
    }

    /// Drop any in-flight request (unmount).
    pub fn cancel_pending(&mut self) {
        self.generation += 1;
        self.fetching = false;
    }

    pub fn reload(&mut self) -> Vec<Effect> {
        self.request_options(None)
    }

    pub fn request_options(&mut self, search: Option<String>) -> Vec<Effect> {
        let Some(remote) = self.config.remote_source() else {
            return Vec::new();
        };
        let url = remote.url(search.as_deref());
        self.generation += 1;
        self.fetching = true;
        vec![Effect::Fetch(FetchRequest {
            generation: self.generation,
            url,
            from_search: search.is_some(),
        })]
    }

    pub fn apply_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<SelectOption>, SelectError>,
    ) -> Vec<Effect> {
        if generation != self.generation {
            log::debug!(
                "Dropping stale options response for '{}' (generation {} != {})",
                self.config.name,
                generation,
                self.generation
            );
            return Vec::new();
        }

        self.fetching = false;
        self.loaded = true;
        match result {
            Ok(options) => {
                self.options = options;
                if matches!(self.error, Some(SelectError::Fetch(_))) {
                    self.error = None;
                }
            }
            Err(e) => {
                self.options.clear();
                self.error = Some(e);
            }
        }
        self.clamp_highlight();

        if let Some((label, value)) = self.pending_lock.take() {
            return self.lock_to(&label, &value);
        }

        let external = self.external_value.clone();
        let mut effects = self.sync_external(&external);

        // Пока шёл поиск, пользователь мог набрать точное имя варианта
        if effects.is_empty()
            && !self.config.allow_custom_value
            && self.filtering
            && self.selected_value.is_empty()
        {
            if let Some(option) = self.find_by_label(&self.input_value) {
                self.selected_value = option.value.clone();
                effects.extend(self.emit_if_changed(&option.value, &option.label));
            }
        }
        effects
    }

    // ------------------------------------------------------------------
    // External value
    // ------------------------------------------------------------------

    /// Reconcile with the parent's committed value.
    pub fn sync_external(&mut self, value: &str) -> Vec<Effect> {
        self.external_value = value.to_string();
        if self.is_echo(value) {
            return Vec::new();
        }
        self.force_sync(value)
    }

    /// The parent holds what this component last emitted and the field still shows it.
    fn is_echo(&self, value: &str) -> bool {
        let emitted = self
            .last_emitted
            .as_ref()
            .is_some_and(|(emitted, _)| emitted == value);
        if !emitted || self.selected_value != value {
            return false;
        }
        // подпись могла стать известной после загрузки списка
        match self.options.iter().find(|o| o.value == value) {
            Some(option) => self.filtering || self.input_value == option.label,
            None => true,
        }
    }

    fn force_sync(&mut self, value: &str) -> Vec<Effect> {
        let found = self
            .options
            .iter()
            .find(|o| o.value == value)
            .or_else(|| self.options.iter().find(|o| o.label_equals(value)))
            .cloned();

        match found {
            Some(option) => {
                self.input_value = option.label.clone();
                self.selected_value = option.value.clone();
                self.filtering = false;
                self.emit_if_changed(&option.value, &option.label)
            }
            None if value.is_empty() => {
                self.input_value.clear();
                self.selected_value.clear();
                self.filtering = false;
                self.last_emitted = Some((String::new(), String::new()));
                Vec::new()
            }
            None => {
                self.selected_value = value.to_string();
                self.last_emitted = Some((value.to_string(), value.to_string()));
                if !self.awaiting_options() {
                    self.input_value = value.to_string();
                    self.filtering = false;
                }
                // Неизвестное значение (например, только что созданное в диалоге):
                // перечитываем список один раз
                if self.loaded
                    && !self.fetching
                    && self.config.remote_source().is_some()
                    && self.reloaded_for.as_deref() != Some(value)
                {
                    self.reloaded_for = Some(value.to_string());
                    return self.request_options(None);
                }
                Vec::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // User interaction
    // ------------------------------------------------------------------

    pub fn focus(&mut self) {
        if self.config.read_only {
            return;
        }
        if self.row_count() > 0 {
            self.show_options = true;
            self.highlighted = Some(0);
        }
    }

    pub fn input(&mut self, text: &str) -> Vec<Effect> {
        if self.config.read_only || self.loading {
            return Vec::new();
        }

        self.input_value = text.to_string();
        self.filtering = true;
        self.created = false;
        self.touched = true;
        if matches!(
            self.error,
            Some(SelectError::Required(_)) | Some(SelectError::Create(_))
        ) {
            self.error = None;
        }

        let mut effects = if self.config.allow_custom_value {
            self.selected_value = text.to_string();
            self.emit_if_changed(text, text)
        } else {
            match self.find_by_label(text) {
                Some(option) => {
                    self.selected_value = option.value.clone();
                    self.emit_if_changed(&option.value, &option.label)
                }
                None => {
                    self.selected_value.clear();
                    self.emit_if_changed("", "")
                }
            }
        };

        self.show_options = true;
        self.highlighted = if self.row_count() > 0 { Some(0) } else { None };

        if self
            .config
            .remote_source()
            .map(|r| r.search_remote)
            .unwrap_or(false)
        {
            effects.extend(self.request_options(Some(text.trim().to_string())));
        }
        effects
    }

    pub fn key_down(&mut self, key: NavKey) -> KeyOutcome {
        match key {
            NavKey::ArrowDown | NavKey::ArrowUp => {
                if self.config.read_only {
                    return KeyOutcome::default();
                }
                let count = self.row_count();
                if count == 0 {
                    return KeyOutcome::default();
                }
                let current = self.highlighted.filter(|&i| i < count);
                let next = match (key, current) {
                    (NavKey::ArrowDown, None) => 0,
                    (NavKey::ArrowDown, Some(i)) => (i + 1) % count,
                    (_, None) | (_, Some(0)) => count - 1,
                    (_, Some(i)) => i - 1,
                };
                self.show_options = true;
                self.highlighted = Some(next);
                KeyOutcome {
                    effects: Vec::new(),
                    prevent_default: true,
                }
            }
            NavKey::Enter => {
                if !self.show_options {
                    return KeyOutcome::default();
                }
                let effects = match self.highlighted {
                    Some(index) => self.activate(index),
                    None => {
                        self.close();
                        Vec::new()
                    }
                };
                KeyOutcome {
                    effects,
                    prevent_default: true,
                }
            }
            NavKey::Escape => {
                let was_open = self.show_options;
                self.close();
                KeyOutcome {
                    effects: Vec::new(),
                    prevent_default: was_open,
                }
            }
            NavKey::Tab => {
                let effects = match (self.show_options, self.highlighted) {
                    (true, Some(index)) => self.activate(index),
                    _ => Vec::new(),
                };
                self.close();
                // фокус уходит дальше по естественному порядку
                KeyOutcome {
                    effects,
                    prevent_default: false,
                }
            }
            NavKey::Other => KeyOutcome::default(),
        }
    }

    pub fn set_highlight(&mut self, index: usize) {
        if index < self.row_count() {
            self.highlighted = Some(index);
        }
    }

    /// Commit the row at `index` (click or Enter).
    pub fn activate(&mut self, index: usize) -> Vec<Effect> {
        match self.rows().into_iter().nth(index) {
            Some(Row::Create(_)) => self.request_create(),
            Some(Row::Option(option)) => self.select_option(option),
            None => Vec::new(),
        }
    }

    pub fn select_option(&mut self, option: SelectOption) -> Vec<Effect> {
        self.input_value = option.label.clone();
        self.selected_value = option.value.clone();
        self.filtering = false;
        self.touched = true;
        self.close();
        self.validate();
        self.emit_if_changed(&option.value, &option.label)
    }

    /// Focus left the component subtree.
    pub fn blur(&mut self) -> Vec<Effect> {
        self.close();
        self.touched = true;

        let mut effects = Vec::new();
        if !self.config.allow_custom_value && !self.loading && !self.awaiting_options() {
            match self.find_by_label(&self.input_value) {
                Some(option) => effects = self.select_option(option),
                None => {
                    self.input_value.clear();
                    self.selected_value.clear();
                    self.filtering = false;
                    effects = self.emit_if_changed("", "");
                }
            }
        }
        self.validate();
        effects
    }

    // ------------------------------------------------------------------
    // Create flow
    // ------------------------------------------------------------------

    pub fn request_create(&mut self) -> Vec<Effect> {
        if !self.show_create() || self.loading {
            return Vec::new();
        }
        let label = self.input_value.trim().to_string();
        let value = if self.selected_value.is_empty() {
            label.clone()
        } else {
            self.selected_value.clone()
        };

        match self.config.create.clone() {
            CreateStrategy::Disabled => Vec::new(),
            CreateStrategy::Delegate => {
                self.close();
                vec![Effect::DelegateCreate(CreateOptionRequest {
                    name: self.config.name.clone(),
                    label,
                    value,
                })]
            }
            CreateStrategy::Post(target) => {
                self.loading = true;
                if matches!(self.error, Some(SelectError::Create(_))) {
                    self.error = None;
                }
                let mut body = Map::new();
                body.insert(
                    self.config.post_field_name(&target).to_string(),
                    Value::String(value.clone()),
                );
                self.pending_create = Some((label, value));
                vec![Effect::PostCreate {
                    endpoint: target.endpoint,
                    body: Value::Object(body),
                }]
            }
        }
    }

    pub fn apply_create(&mut self, result: Result<(), SelectError>) -> Vec<Effect> {
        let Some((label, value)) = self.pending_create.take() else {
            return Vec::new();
        };
        self.loading = false;

        if let Err(e) = result {
            log::warn!("Create option for '{}' failed: {}", self.config.name, e);
            self.error = Some(e);
            return Vec::new();
        }

        self.created = true;
        self.close();

        if self.config.remote_source().is_some() {
            self.pending_lock = Some((label, value));
            return self.request_options(None);
        }

        if !self.options.iter().any(|o| o.value == value) {
            self.options.push(SelectOption::new(label.clone(), value.clone()));
        }
        self.lock_to(&label, &value)
    }

    fn lock_to(&mut self, label: &str, value: &str) -> Vec<Effect> {
        let found = self
            .options
            .iter()
            .find(|o| o.label_equals(label))
            .or_else(|| self.options.iter().find(|o| o.value == value))
            .cloned();
        let option = match found {
            Some(option) => option,
            None if self.config.allow_custom_value => SelectOption::new(label, value),
            None => {
                // Без варианта от сервера значение не фиксируем: только текст
                log::warn!(
                    "Created option '{}' is missing from the refreshed '{}' list",
                    label,
                    self.config.name
                );
                self.input_value = label.to_string();
                self.selected_value.clear();
                self.filtering = false;
                self.created = true;
                return Vec::new();
            }
        };
        let effects = self.select_option(option);
        self.created = true;
        effects
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn close(&mut self) {
        self.show_options = false;
        self.highlighted = None;
    }

    fn clamp_highlight(&mut self) {
        let count = self.row_count();
        self.highlighted = self.highlighted.filter(|&i| i < count);
        if self.show_options && self.highlighted.is_none() && count > 0 {
            self.highlighted = Some(0);
        }
    }

    fn awaiting_options(&self) -> bool {
        self.config.remote_source().is_some() && (self.fetching || !self.loaded)
    }

    fn find_by_label(&self, text: &str) -> Option<SelectOption> {
        self.options.iter().find(|o| o.label_equals(text)).cloned()
    }

    fn validate(&mut self) {
        if self.config.required && self.touched && self.selected_value.trim().is_empty() {
            self.error = Some(SelectError::Required(
                self.config.display_name().to_string(),
            ));
        } else if matches!(self.error, Some(SelectError::Required(_))) {
            self.error = None;
        }
    }

    fn emit_if_changed(&mut self, value: &str, label: &str) -> Vec<Effect> {
        let unchanged = self
            .last_emitted
            .as_ref()
            .map(|(v, l)| v == value && l == label)
            .unwrap_or(false);
        if unchanged {
            return Vec::new();
        }
        self.last_emitted = Some((value.to_string(), label.to_string()));
        vec![Effect::Emit(SelectChangeEvent::new(
            &self.config.name,
            value,
            label,
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::components::select_type_input::config::RemoteSource;
    use serde_json::json;

    fn colors() -> Vec<SelectOption> {
        vec![SelectOption::new("Red", "r"), SelectOption::new("Blue", "b")]
    }

    fn static_state(allow_custom: bool) -> SelectState {
        let config = SelectConfig::new("color")
            .static_options(colors())
            .allow_custom_value(allow_custom);
        let mut state = SelectState::new(config);
        state.mount("");
        state
    }

    fn remote_state(config: SelectConfig) -> (SelectState, u64) {
        let mut state = SelectState::new(config);
        let effects = state.mount("");
        let generation = fetch_generation(&effects).expect("mount should fetch");
        (state, generation)
    }

    fn fetch_generation(effects: &[Effect]) -> Option<u64> {
        effects.iter().find_map(|e| match e {
            Effect::Fetch(req) => Some(req.generation),
            _ => None,
        })
    }

    fn emitted(effects: &[Effect]) -> Vec<(String, String)> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(ev) => Some((ev.value().to_string(), ev.label().to_string())),
                _ => None,
            })
            .collect()
    }

    fn labels(state: &SelectState) -> Vec<String> {
        state
            .rows()
            .into_iter()
            .map(|row| match row {
                Row::Create(text) => format!("+ {}", text),
                Row::Option(o) => o.label,
            })
            .collect()
    }

    #[test]
    fn test_nav_key_mapping() {
        assert_eq!(NavKey::from_key("ArrowDown"), NavKey::ArrowDown);
        assert_eq!(NavKey::from_key("Esc"), NavKey::Escape);
        assert_eq!(NavKey::from_key("a"), NavKey::Other);
    }

    #[test]
    fn test_typing_filters_and_enter_commits() {
        let mut state = static_state(false);
        let effects = state.input("bl");
        assert!(emitted(&effects).is_empty(), "parent already holds the empty value");
        assert_eq!(labels(&state), vec!["Blue"]);
        assert_eq!(state.highlighted(), Some(0));

        let outcome = state.key_down(NavKey::Enter);
        assert!(outcome.prevent_default);
        assert_eq!(emitted(&outcome.effects), vec![("b".to_string(), "Blue".to_string())]);
        assert_eq!(state.selected_value(), "b");
        assert_eq!(state.input_value(), "Blue");
        assert!(!state.show_options());
        assert_eq!(state.highlighted(), None);
    }

    #[test]
    fn test_strict_blur_without_match_clears() {
        let mut state = static_state(false);
        state.input("green");
        assert_eq!(state.input_value(), "green");
        assert_eq!(state.selected_value(), "");

        state.blur();
        assert_eq!(state.input_value(), "");
        assert_eq!(state.selected_value(), "");
        assert!(!state.show_options());
    }

    #[test]
    fn test_strict_exact_match_commits_while_typing() {
        let mut state = static_state(false);
        let effects = state.input("blue");
        assert_eq!(emitted(&effects), vec![("b".to_string(), "Blue".to_string())]);

        let effects = state.blur();
        assert!(emitted(&effects).is_empty(), "same pair must not be re-emitted");
        assert_eq!(state.input_value(), "Blue");
        assert_eq!(state.selected_value(), "b");
    }

    #[test]
    fn test_custom_value_commits_every_keystroke() {
        let mut state = static_state(true);
        let first = state.input("gr");
        assert_eq!(emitted(&first), vec![("gr".to_string(), "gr".to_string())]);
        let second = state.input("green");
        assert_eq!(emitted(&second), vec![("green".to_string(), "green".to_string())]);
        assert_eq!(state.selected_value(), "green");

        let again = state.input("green");
        assert!(emitted(&again).is_empty());
        assert_eq!(state.selected_value(), "green");

        state.blur();
        assert_eq!(state.input_value(), "green");
        assert_eq!(state.selected_value(), "green");
    }

    #[test]
    fn test_selecting_markup_option_commits_value() {
        let config = SelectConfig::new("color").static_options(vec![
            SelectOption::new("<b>Navy</b> blue", "navy"),
            SelectOption::new("Red", "r"),
        ]);
        let mut state = SelectState::new(config);
        state.mount("");
        state.focus();

        let effects = state.activate(0);
        assert_eq!(emitted(&effects), vec![("navy".to_string(), "Navy blue".to_string())]);
        assert_eq!(state.selected_value(), "navy");
        assert_eq!(state.input_value(), "Navy blue");
    }

    #[test]
    fn test_focus_opens_with_first_highlighted() {
        let mut state = static_state(false);
        state.focus();
        assert!(state.is_open());
        assert_eq!(state.highlighted(), Some(0));
        assert_eq!(labels(&state), vec!["Red", "Blue"]);
    }

    #[test]
    fn test_read_only_ignores_focus_and_typing() {
        let config = SelectConfig::new("color")
            .static_options(colors())
            .read_only(true);
        let mut state = SelectState::new(config);
        state.focus();
        assert!(!state.show_options());
        assert!(state.input("x").is_empty());
        assert_eq!(state.input_value(), "");
    }

    #[test]
    fn test_arrow_navigation_wraps() {
        let mut state = static_state(false);
        assert_eq!(state.highlighted(), None);

        state.key_down(NavKey::ArrowDown);
        assert_eq!(state.highlighted(), Some(0));
        state.key_down(NavKey::ArrowDown);
        assert_eq!(state.highlighted(), Some(1));
        state.key_down(NavKey::ArrowDown);
        assert_eq!(state.highlighted(), Some(0));
        state.key_down(NavKey::ArrowUp);
        assert_eq!(state.highlighted(), Some(1));
    }

    #[test]
    fn test_create_row_shifts_indices() {
        let config = SelectConfig::new("color")
            .static_options(colors())
            .delegate_create();
        let mut state = SelectState::new(config);
        state.mount("");
        state.input("e");
        // "e" is contained in Red and Blue, so no create row
        assert_eq!(labels(&state), vec!["Red", "Blue"]);

        state.input("xyz");
        assert_eq!(labels(&state), vec!["+ xyz"]);
        assert_eq!(state.highlighted(), Some(0));
        state.key_down(NavKey::ArrowDown);
        assert_eq!(state.highlighted(), Some(0));
    }

    #[test]
    fn test_escape_closes_without_changing_value() {
        let mut state = static_state(false);
        state.input("blue");
        let outcome = state.key_down(NavKey::Escape);
        assert!(outcome.prevent_default);
        assert!(outcome.effects.is_empty());
        assert!(!state.show_options());
        assert_eq!(state.selected_value(), "b");
    }

    #[test]
    fn test_tab_commits_highlighted_without_preventing_default() {
        let mut state = static_state(false);
        state.input("re");
        let outcome = state.key_down(NavKey::Tab);
        assert!(!outcome.prevent_default);
        assert_eq!(emitted(&outcome.effects), vec![("r".to_string(), "Red".to_string())]);
        assert!(!state.show_options());
    }

    #[test]
    fn test_enter_when_closed_is_not_handled() {
        let mut state = static_state(false);
        let outcome = state.key_down(NavKey::Enter);
        assert!(!outcome.prevent_default);
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn test_create_hidden_when_label_contains_text() {
        let config = SelectConfig::new("color")
            .static_options(colors())
            .delegate_create();
        let mut state = SelectState::new(config);
        state.mount("");
        state.input("Blue");
        assert!(!state.show_create());
        state.input("BLU");
        assert!(!state.show_create());
        state.input("Blues");
        assert!(state.show_create());
    }

    #[test]
    fn test_delegate_create_hands_text_to_caller() {
        let config = SelectConfig::new("supplier").delegate_create();
        let mut state = SelectState::new(config);
        state.mount("");
        state.input("NewThing");
        assert_eq!(labels(&state), vec!["+ NewThing"]);

        let effects = state.activate(0);
        assert_eq!(
            effects,
            vec![Effect::DelegateCreate(CreateOptionRequest {
                name: "supplier".to_string(),
                label: "NewThing".to_string(),
                value: "NewThing".to_string(),
            })]
        );
        assert!(state.options().is_empty());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_post_create_refetches_and_locks() {
        let config = SelectConfig::new("category")
            .remote(RemoteSource::new("/api/categories"))
            .post_create("/api/categories", Some("name"));
        let (mut state, generation) = remote_state(config);
        state.apply_fetch(generation, Ok(vec![SelectOption::new("Cups", "1")]));

        state.input("Acme");
        let effects = state.key_down(NavKey::Enter).effects;
        assert_eq!(
            effects,
            vec![Effect::PostCreate {
                endpoint: "/api/categories".to_string(),
                body: json!({"name": "Acme"}),
            }]
        );
        assert!(state.is_loading());
        assert_eq!(state.placeholder(), "Creating...");
        assert!(state.input("other").is_empty(), "input is locked while creating");

        let effects = state.apply_create(Ok(()));
        let refetch = fetch_generation(&effects).expect("list is re-fetched");
        assert!(!state.is_loading());
        assert!(state.created());

        let effects = state.apply_fetch(
            refetch,
            Ok(vec![SelectOption::new("Cups", "1"), SelectOption::new("Acme", "17")]),
        );
        assert_eq!(emitted(&effects), vec![("17".to_string(), "Acme".to_string())]);
        assert_eq!(state.input_value(), "Acme");
        assert_eq!(state.selected_value(), "17");
        assert!(!state.show_options());
        assert!(!state.show_create());
    }

    #[test]
    fn test_post_create_static_appends_locally() {
        let config = SelectConfig::new("color")
            .static_options(colors())
            .post_create("/api/colors", None);
        let mut state = SelectState::new(config);
        state.mount("");
        state.input("Green");
        let effects = state.request_create();
        assert_eq!(
            effects,
            vec![Effect::PostCreate {
                endpoint: "/api/colors".to_string(),
                body: json!({"color": "Green"}),
            }]
        );

        let effects = state.apply_create(Ok(()));
        assert_eq!(emitted(&effects), vec![("Green".to_string(), "Green".to_string())]);
        assert_eq!(state.options().len(), 3);
        assert_eq!(state.selected_value(), "Green");
    }

    #[test]
    fn test_create_suppression_resets_on_input() {
        let config = SelectConfig::new("category")
            .remote(RemoteSource::new("/api/categories"))
            .post_create("/api/categories", Some("name"));
        let (mut state, generation) = remote_state(config);
        state.apply_fetch(generation, Ok(Vec::new()));

        state.input("Acme");
        state.request_create();
        let refetch = fetch_generation(&state.apply_create(Ok(()))).unwrap();
        // server list is filtered and does not contain the new entry
        let effects = state.apply_fetch(refetch, Ok(Vec::new()));
        assert!(emitted(&effects).is_empty(), "no value without a server option");
        assert_eq!(state.selected_value(), "");
        assert!(state.created());
        assert_eq!(state.input_value(), "Acme");
        assert!(!state.show_create());

        state.focus();
        state.input("Acme");
        assert!(!state.created());
        assert!(state.show_create());
    }

    #[test]
    fn test_refetch_failure_after_create_does_not_commit_text() {
        let config = SelectConfig::new("category")
            .remote(RemoteSource::new("/api/categories"))
            .post_create("/api/categories", Some("name"));
        let (mut state, generation) = remote_state(config);
        state.apply_fetch(generation, Ok(Vec::new()));

        state.input("Acme");
        state.request_create();
        let refetch = fetch_generation(&state.apply_create(Ok(()))).unwrap();
        let effects = state.apply_fetch(refetch, Err(SelectError::Fetch("offline".to_string())));

        assert!(emitted(&effects).is_empty());
        assert_eq!(state.selected_value(), "");
        assert_eq!(state.input_value(), "Acme");
        assert_eq!(state.error(), Some(&SelectError::Fetch("offline".to_string())));
    }

    #[test]
    fn test_custom_value_create_locks_to_typed_text_when_missing() {
        let config = SelectConfig::new("unit")
            .remote(RemoteSource::new("/api/units"))
            .post_create("/api/units", Some("name"))
            .allow_custom_value(true);
        let (mut state, generation) = remote_state(config);
        state.apply_fetch(generation, Ok(Vec::new()));

        state.input("box");
        state.request_create();
        let refetch = fetch_generation(&state.apply_create(Ok(()))).unwrap();
        state.apply_fetch(refetch, Ok(Vec::new()));
        assert_eq!(state.selected_value(), "box");
        assert_eq!(state.input_value(), "box");
    }

    #[test]
    fn test_post_create_failure_keeps_text() {
        let config = SelectConfig::new("category")
            .static_options(Vec::new())
            .post_create("/api/categories", None);
        let mut state = SelectState::new(config);
        state.mount("");
        state.input("Acme");
        state.request_create();

        let effects = state.apply_create(Err(SelectError::Create("Duplicate name".to_string())));
        assert!(effects.is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.input_value(), "Acme");
        assert_eq!(state.error(), Some(&SelectError::Create("Duplicate name".to_string())));
        assert!(state.show_create(), "user can retry");

        state.input("Acme2");
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_fetch_failure_clears_options() {
        let config = SelectConfig::new("unit").remote(RemoteSource::new("/api/units"));
        let (mut state, generation) = remote_state(config);
        assert!(state.is_fetching());
        assert!(state.rows().is_empty());

        state.apply_fetch(generation, Err(SelectError::Fetch("offline".to_string())));
        assert!(state.options().is_empty());
        assert!(!state.is_fetching());
        assert_eq!(state.error(), Some(&SelectError::Fetch("offline".to_string())));

        let generation = fetch_generation(&state.reload()).unwrap();
        state.apply_fetch(generation, Ok(vec![SelectOption::new("pcs", "pcs")]));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_stale_fetch_is_ignored() {
        let config = SelectConfig::new("unit")
            .remote(RemoteSource::new("/api/units").with_remote_search());
        let (mut state, first) = remote_state(config);
        let effects = state.input("kg");
        let second = fetch_generation(&effects).unwrap();
        assert!(second > first);

        state.apply_fetch(first, Ok(vec![SelectOption::new("pcs", "pcs")]));
        assert!(state.options().is_empty());
        assert!(state.is_fetching());

        state.apply_fetch(second, Ok(vec![SelectOption::new("kg", "kg")]));
        assert_eq!(state.options().len(), 1);

        state.cancel_pending();
        assert!(!state.is_current(second));
    }

    #[test]
    fn test_remote_search_url() {
        let config = SelectConfig::new("unit")
            .remote(RemoteSource::new("/api/units").with_remote_search());
        let (mut state, _) = remote_state(config);
        let effects = state.input("kg");
        let Some(Effect::Fetch(request)) = effects.into_iter().find(|e| matches!(e, Effect::Fetch(_))) else {
            panic!("expected a fetch");
        };
        assert_eq!(request.url, "/api/units?search=kg");
        assert!(request.from_search);
    }

    #[test]
    fn test_external_value_populates_label_without_duplicate_emit() {
        let mut state = static_state(false);
        let effects = state.sync_external("b");
        assert_eq!(state.input_value(), "Blue");
        assert_eq!(emitted(&effects), vec![("b".to_string(), "Blue".to_string())]);

        let effects = state.sync_external("b");
        assert!(effects.is_empty());

        state.input("Red");
        let effects = state.sync_external("r");
        assert!(effects.is_empty());
        assert_eq!(state.input_value(), "Red");
    }

    #[test]
    fn test_external_value_by_label_is_canonicalized() {
        let mut state = static_state(false);
        let effects = state.sync_external("Blue");
        assert_eq!(emitted(&effects), vec![("b".to_string(), "Blue".to_string())]);
        assert_eq!(state.selected_value(), "b");
    }

    #[test]
    fn test_echo_of_empty_commit_keeps_typed_text() {
        let mut state = static_state(false);
        state.input("gre");
        // parent echoes the empty commit back
        assert!(state.sync_external("").is_empty());
        assert_eq!(state.input_value(), "gre");
    }

    #[test]
    fn test_reselect_after_parent_reset_emits() {
        let mut state = static_state(false);
        state.select_option(SelectOption::new("Blue", "b"));
        // parent clears the field (e.g. a dependent filter changed)
        state.sync_external("");
        assert_eq!(state.input_value(), "");

        state.focus();
        let effects = state.activate(1);
        assert_eq!(emitted(&effects), vec![("b".to_string(), "Blue".to_string())]);
        assert_eq!(state.selected_value(), "b");
    }

    #[test]
    fn test_parent_restores_last_emitted_value() {
        let mut state = static_state(false);
        state.select_option(SelectOption::new("Blue", "b"));
        state.sync_external("");
        state.sync_external("b");
        assert_eq!(state.input_value(), "Blue");
        assert_eq!(state.selected_value(), "b");
    }

    #[test]
    fn test_parent_override_with_unknown_value_then_reselect() {
        let mut state = static_state(false);
        state.select_option(SelectOption::new("Blue", "b"));
        state.sync_external("legacy");
        assert_eq!(state.selected_value(), "legacy");

        state.focus();
        let effects = state.activate(1);
        assert_eq!(emitted(&effects), vec![("b".to_string(), "Blue".to_string())]);
    }

    #[test]
    fn test_parent_reset_clears_field() {
        let mut state = static_state(false);
        state.input("blue");
        state.sync_external("");
        assert_eq!(state.input_value(), "");
        assert_eq!(state.selected_value(), "");
    }

    #[test]
    fn test_remote_value_resolved_after_load() {
        let config = SelectConfig::new("supplier").remote(RemoteSource::new("/api/counterparties"));
        let mut state = SelectState::new(config);
        let effects = state.mount("15");
        let generation = fetch_generation(&effects).unwrap();
        assert_eq!(state.input_value(), "");
        assert_eq!(state.selected_value(), "15");

        // blur before options arrive must not wipe the value
        state.blur();
        assert_eq!(state.selected_value(), "15");

        let effects = state.apply_fetch(generation, Ok(vec![SelectOption::new("Acme", "15")]));
        assert_eq!(emitted(&effects), vec![("15".to_string(), "Acme".to_string())]);
        assert_eq!(state.input_value(), "Acme");
    }

    #[test]
    fn test_unknown_external_value_reloads_once() {
        let config = SelectConfig::new("supplier").remote(RemoteSource::new("/api/counterparties"));
        let (mut state, generation) = remote_state(config);
        state.apply_fetch(generation, Ok(vec![SelectOption::new("Acme", "15")]));

        // value of an option created elsewhere (e.g. in a dialog)
        let effects = state.sync_external("16");
        let reload = fetch_generation(&effects).expect("unknown value triggers reload");

        let effects = state.apply_fetch(
            reload,
            Ok(vec![SelectOption::new("Acme", "15"), SelectOption::new("Globex", "16")]),
        );
        assert_eq!(emitted(&effects), vec![("16".to_string(), "Globex".to_string())]);
        assert_eq!(state.input_value(), "Globex");

        let effects = state.sync_external("99");
        let reload = fetch_generation(&effects).unwrap();
        let effects = state.apply_fetch(reload, Ok(Vec::new()));
        assert!(fetch_generation(&effects).is_none(), "no reload loop");
    }

    #[test]
    fn test_required_validation_on_blur() {
        let config = SelectConfig::new("category")
            .with_label("Category")
            .static_options(colors())
            .required(true);
        let mut state = SelectState::new(config);
        state.mount("");
        assert_eq!(state.error(), None);

        state.focus();
        state.blur();
        assert_eq!(state.error(), Some(&SelectError::Required("Category".to_string())));

        state.input("red");
        assert_eq!(state.error(), None);
        state.blur();
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_reconfigure_with_new_filter_refetches() {
        let config = SelectConfig::new("category")
            .remote(RemoteSource::new("/api/categories").with_product_type("goods"));
        let (mut state, _) = remote_state(config.clone());

        assert!(state.reconfigure(config.clone()).is_empty());

        let changed = config.remote(RemoteSource::new("/api/categories").with_product_type("service"));
        let effects = state.reconfigure(changed);
        let Some(Effect::Fetch(request)) = effects.first() else {
            panic!("expected a fetch");
        };
        assert_eq!(request.url, "/api/categories?productType=service");
    }
}

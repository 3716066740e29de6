use contracts::shared::select_option::{CreateOptionRequest, SelectChangeEvent};
use gloo_timers::future::TimeoutFuture;
use leptos::ev::{Event, FocusEvent, KeyboardEvent, MouseEvent};
use leptos::html::Div;
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::Value;
use thaw::*;
use uuid::Uuid;
use wasm_bindgen::JsCast;

use super::api;
use super::config::SelectConfig;
use super::scroll::{keep_row_visible, reveal_in_container};
use super::state::{Effect as StateEffect, FetchRequest, NavKey, Row, SelectState};
use crate::shared::http::{use_http_client, HttpClient};

/// Пауза перед поисковым запросом к серверу, мс
const SEARCH_DEBOUNCE_MS: u32 = 250;

/// Executes the effects produced by [`SelectState`] transitions
#[derive(Clone)]
struct EffectRunner {
    state: RwSignal<SelectState>,
    client: HttpClient,
    on_change: Option<Callback<SelectChangeEvent>>,
    on_create: Option<Callback<CreateOptionRequest>>,
}

impl EffectRunner {
    /// Apply a transition and run what it produced. Callbacks are invoked
    /// after the state borrow is released.
    fn dispatch(&self, transition: impl FnOnce(&mut SelectState) -> Vec<StateEffect>) {
        let effects = self.state.try_update(transition).unwrap_or_default();
        self.run(effects);
    }

    fn run(&self, effects: Vec<StateEffect>) {
        for effect in effects {
            match effect {
                StateEffect::Emit(event) => {
                    if let Some(on_change) = self.on_change {
                        on_change.run(event);
                    }
                }
                StateEffect::DelegateCreate(request) => match self.on_create {
                    Some(on_create) => on_create.run(request),
                    None => log::warn!(
                        "Create requested for '{}' but no on_create handler is set",
                        request.name
                    ),
                },
                StateEffect::Fetch(request) => self.fetch(request),
                StateEffect::PostCreate { endpoint, body } => self.post(endpoint, body),
            }
        }
    }

    fn fetch(&self, request: FetchRequest) {
        let this = self.clone();
        spawn_local(async move {
            if request.from_search {
                TimeoutFuture::new(SEARCH_DEBOUNCE_MS).await;
                let current = this
                    .state
                    .try_with_untracked(|s| s.is_current(request.generation))
                    .unwrap_or(false);
                if !current {
                    return;
                }
            }
            let result = api::fetch_options(&this.client, &request.url).await;
            this.dispatch(|s| s.apply_fetch(request.generation, result));
        });
    }

    fn post(&self, endpoint: String, body: Value) {
        let this = self.clone();
        spawn_local(async move {
            let result = api::create_option(&this.client, &endpoint, &body).await;
            this.dispatch(|s| s.apply_create(result));
        });
    }
}

/// Поле выбора с подсказками (typeahead / combobox)
///
/// - варианты из статического списка или с сервера
/// - свободный ввод (`allow_custom_value`) или только существующие варианты
/// - создание недостающего варианта: POST на сервер или через `on_create`
/// - навигация стрелками, Enter/Tab для выбора, Escape для закрытия
///
/// Родитель владеет значением: компонент синхронизируется с `value` и
/// сообщает об изменениях через `on_change`.
#[component]
pub fn SelectTypeInput(
    /// Источник вариантов, стратегия создания и флаги поля
    #[prop(into)]
    config: Signal<SelectConfig>,
    /// Значение, сохранённое в форме (value или подпись варианта)
    #[prop(into)]
    value: Signal<String>,
    /// Вызывается при каждом подтверждённом изменении
    #[prop(optional)]
    on_change: Option<Callback<SelectChangeEvent>>,
    /// Обработчик создания для `CreateStrategy::Delegate`
    #[prop(optional)]
    on_create: Option<Callback<CreateOptionRequest>>,
    #[prop(optional, into)]
    disabled: MaybeProp<bool>,
    /// Внешний индикатор загрузки (например, пока родитель создаёт вариант)
    #[prop(optional, into)]
    loading: MaybeProp<bool>,
    /// Прокручиваемый контейнер (тело диалога, панель), в котором лежит поле
    #[prop(optional)]
    scroll_container: Option<NodeRef<Div>>,
    /// ID для input element
    #[prop(optional, into)]
    id: MaybeProp<String>,
) -> impl IntoView {
    let state = RwSignal::new(SelectState::new(config.get_untracked()));
    let runner = EffectRunner {
        state,
        client: use_http_client(),
        on_change,
        on_create,
    };

    let input_id = id
        .get_untracked()
        .unwrap_or_else(|| format!("select-{}", Uuid::new_v4()));
    let listbox_id = format!("{}-listbox", input_id);

    let root_ref = NodeRef::<Div>::new();
    let list_ref = NodeRef::<Div>::new();

    runner.dispatch(|s| s.mount(&value.get_untracked()));

    // Source or filter change -> reload
    {
        let runner = runner.clone();
        Effect::new(move |prev: Option<()>| {
            let next = config.get();
            if prev.is_some() {
                runner.dispatch(move |s| s.reconfigure(next));
            }
        });
    }

    // Parent changed the committed value
    {
        let runner = runner.clone();
        Effect::new(move |prev: Option<String>| {
            let next = value.get();
            if prev.is_some_and(|p| p != next) {
                let current = next.clone();
                runner.dispatch(move |s| s.sync_external(&current));
            }
            next
        });
    }

    Effect::new(move |_| {
        let highlighted = state.with(|s| if s.is_open() { s.highlighted() } else { None });
        if let (Some(index), Some(list)) = (highlighted, list_ref.get()) {
            keep_row_visible(&list, index);
        }
    });

    Effect::new(move |_| {
        let open = state.with(|s| s.is_open());
        if !open {
            return;
        }
        let container = scroll_container.and_then(|c| c.get());
        if let (Some(container), Some(root)) = (container, root_ref.get()) {
            reveal_in_container(&container, &root);
        }
    });

    on_cleanup(move || {
        let _ = state.try_update(|s| s.cancel_pending());
    });

    let is_disabled = move || {
        disabled.get().unwrap_or(false)
            || loading.get().unwrap_or(false)
            || state.with(|s| s.is_loading())
    };

    let on_input = {
        let runner = runner.clone();
        move |ev: Event| {
            let text = event_target_value(&ev);
            runner.dispatch(move |s| s.input(&text));
        }
    };

    let on_keydown = {
        let runner = runner.clone();
        move |ev: KeyboardEvent| {
            let key = NavKey::from_key(&ev.key());
            if key == NavKey::Other {
                return;
            }
            let outcome = state.try_update(|s| s.key_down(key)).unwrap_or_default();
            if outcome.prevent_default {
                ev.prevent_default();
                // Escape закрывает только список, не диалог вокруг поля
                if key == NavKey::Escape {
                    ev.stop_propagation();
                }
            }
            runner.run(outcome.effects);
        }
    };

    let on_blur = {
        let runner = runner.clone();
        move |ev: FocusEvent| {
            // Фокус остался внутри компонента (например, на кнопке создания)
            let inside = ev
                .related_target()
                .and_then(|target| target.dyn_into::<web_sys::Node>().ok())
                .zip(root_ref.get())
                .map(|(node, root)| root.contains(Some(&node)))
                .unwrap_or(false);
            if !inside {
                runner.dispatch(|s| s.blur());
            }
        }
    };

    let label_for = input_id.clone();
    let aria_controls = listbox_id.clone();

    view! {
        <div class="form__group select-type-input" node_ref=root_ref>
            {move || {
                let (label, required) = state.with(|s| (s.config().label.clone(), s.config().required));
                let label_for = label_for.clone();
                label.map(|l| view! {
                    <label class="form__label" for=label_for>
                        {l}
                        {required.then(|| view! { <span class="form__required">" *"</span> })}
                    </label>
                })
            }}

            <div class="select-type-input__control">
                <input
                    type="text"
                    id=input_id
                    class=move || {
                        if state.with(|s| s.error().is_some()) {
                            "form__input select-type-input__input form__input--invalid"
                        } else {
                            "form__input select-type-input__input"
                        }
                    }
                    role="combobox"
                    aria-autocomplete="list"
                    aria-controls=aria_controls
                    aria-expanded=move || state.with(|s| s.is_open()).to_string()
                    autocomplete="off"
                    prop:value=move || state.with(|s| s.input_value().to_string())
                    placeholder=move || state.with(|s| s.placeholder())
                    readonly=move || state.with(|s| s.config().read_only)
                    required=move || state.with(|s| s.config().required)
                    disabled=is_disabled
                    on:focus=move |_| state.update(|s| s.focus())
                    on:input=on_input
                    on:keydown=on_keydown
                    on:blur=on_blur
                />
                {move || {
                    state
                        .with(|s| s.is_fetching() || s.is_loading())
                        .then(|| view! {
                            <span class="select-type-input__spinner">
                                <Spinner />
                            </span>
                        })
                }}
            </div>

            {move || {
                let (open, rows, highlighted) =
                    state.with(|s| (s.is_open(), s.rows(), s.highlighted()));
                if !open {
                    return None;
                }
                let runner = runner.clone();
                Some(view! {
                    <div
                        class="select-type-input__list"
                        role="listbox"
                        id=listbox_id.clone()
                        node_ref=list_ref
                    >
                        {rows
                            .into_iter()
                            .enumerate()
                            .map(|(index, row)| {
                                render_row(index, row, highlighted == Some(index), state, runner.clone())
                            })
                            .collect_view()}
                    </div>
                })
            }}

            {move || {
                state
                    .with(|s| s.error().map(|e| e.to_string()))
                    .map(|msg| view! { <div class="form__error">{msg}</div> })
            }}
        </div>
    }
}

fn render_row(
    index: usize,
    row: Row,
    active: bool,
    state: RwSignal<SelectState>,
    runner: EffectRunner,
) -> AnyView {
    // mousedown + preventDefault: фокус остаётся в поле ввода
    let on_pick = move |ev: MouseEvent| {
        ev.prevent_default();
        runner.dispatch(|s| s.activate(index));
    };
    let on_hover = move |_: MouseEvent| {
        if state.with_untracked(|s| s.highlighted()) != Some(index) {
            state.update(|s| s.set_highlight(index));
        }
    };

    let active_class = if active { "select-type-input__option--active" } else { "" };

    match row {
        Row::Create(text) => view! {
            <button
                type="button"
                tabindex="-1"
                class=format!("select-type-input__option select-type-input__option--create {}", active_class)
                role="option"
                aria-selected=active.to_string()
                data-index=index.to_string()
                on:mousedown=on_pick
                on:mouseenter=on_hover
            >
                {format!("+ Create \"{}\"", text)}
            </button>
        }
        .into_any(),
        Row::Option(option) => {
            let label = match option.label_html {
                Some(html) => view! { <span inner_html=html></span> }.into_any(),
                None => view! { <span>{option.label}</span> }.into_any(),
            };
            view! {
                <div
                    class=format!("select-type-input__option {}", active_class)
                    role="option"
                    aria-selected=active.to_string()
                    data-index=index.to_string()
                    data-value=option.value
                    on:mousedown=on_pick
                    on:mouseenter=on_hover
                >
                    {label}
                </div>
            }
            .into_any()
        }
    }
}

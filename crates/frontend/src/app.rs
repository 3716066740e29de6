use crate::domain::a004_product::ui::details::ProductDetails;
use crate::shared::config::load_config;
use crate::shared::http::HttpClient;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    let config = load_config();
    log::info!("API base: {}", config.api_base());

    // One client for the whole tree: comboboxes and forms pick it up via context.
    provide_context(HttpClient::from_config(&config));
    provide_context(config);

    let (saved_id, set_saved_id) = signal(None::<String>);

    view! {
        <main class="page">
            {move || saved_id.get().map(|id| view! {
                <div class="notice notice--success">{format!("Товар сохранён: {}", id)}</div>
            })}
            <ProductDetails
                id=None
                on_saved=Callback::new(move |id: String| set_saved_id.set(Some(id)))
                on_cancel=Callback::new(move |_: ()| set_saved_id.set(None))
            />
        </main>
    }
}

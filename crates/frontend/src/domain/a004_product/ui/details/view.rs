use super::view_model::ProductDetailsViewModel;
use crate::shared::components::select_type_input::SelectTypeInput;
use crate::shared::modal::Modal;
use contracts::domain::a004_product::aggregate::SupplierDraft;
use contracts::shared::select_option::{CreateOptionRequest, SelectChangeEvent};
use leptos::html::Div;
use leptos::prelude::*;

fn non_empty(v: String) -> Option<String> {
    if v.trim().is_empty() {
        None
    } else {
        Some(v)
    }
}

#[component]
pub fn ProductDetails(
    id: Option<String>,
    on_saved: Callback<String>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    let vm = ProductDetailsViewModel::new();
    vm.load_if_needed(id);

    let form_ref = NodeRef::<Div>::new();

    let on_change = {
        let vm = vm.clone();
        Callback::new(move |event: SelectChangeEvent| vm.apply_change(event))
    };
    let on_create_supplier = {
        let vm = vm.clone();
        Callback::new(move |request: CreateOptionRequest| vm.open_supplier_dialog(request))
    };

    let category_config = {
        let form = vm.form;
        Memo::new(move |_| {
            form.with(|f| ProductDetailsViewModel::category_config(&f.product_type))
        })
    };

    let form = vm.form;
    let saving = vm.saving;
    let supplier_draft = vm.supplier_draft;
    let dialog_open = Memo::new(move |_| supplier_draft.with(|d| d.is_some()));

    view! {
        <div class="details-container">
            <div class="details-header">
                <h3>
                    {
                        let vm = vm.clone();
                        move || if vm.is_edit_mode()() { "Редактирование товара" } else { "Новый товар" }
                    }
                </h3>
            </div>

            {
                let vm = vm.clone();
                move || vm.error.get().map(|e| view! { <div class="error">{e}</div> })
            }

            <div class="details-form" node_ref=form_ref>
                <div class="form__group">
                    <label class="form__label" for="description">
                        {"Наименование"}
                        <span class="form__required">" *"</span>
                    </label>
                    <input
                        type="text"
                        id="description"
                        class="form__input"
                        prop:value=move || form.with(|f| f.description.clone())
                        on:input=move |ev| form.update(|f| f.description = event_target_value(&ev))
                        placeholder="Введите наименование"
                    />
                </div>

                <SelectTypeInput
                    id="product-type"
                    config=Signal::stored(ProductDetailsViewModel::product_type_config())
                    value=Signal::derive(move || form.with(|f| f.product_type.clone()))
                    on_change=on_change
                    disabled=saving
                    scroll_container=form_ref
                />

                <SelectTypeInput
                    id="product-category"
                    config=category_config
                    value=Signal::derive(move || form.with(|f| f.category.clone()))
                    on_change=on_change
                    disabled=saving
                    scroll_container=form_ref
                />

                <SelectTypeInput
                    id="product-unit"
                    config=Signal::stored(ProductDetailsViewModel::unit_config())
                    value=Signal::derive(move || form.with(|f| f.unit.clone()))
                    on_change=on_change
                    disabled=saving
                    scroll_container=form_ref
                />

                <SelectTypeInput
                    id="product-supplier"
                    config=Signal::stored(ProductDetailsViewModel::supplier_config())
                    value=Signal::derive(move || form.with(|f| f.supplier_id.clone()))
                    on_change=on_change
                    on_create=on_create_supplier
                    disabled=saving
                    loading=vm.creating_supplier
                    scroll_container=form_ref
                />

                <div class="form__group">
                    <label class="form__label" for="comment">{"Комментарий"}</label>
                    <textarea
                        id="comment"
                        class="form__input"
                        prop:value=move || form.with(|f| f.comment.clone().unwrap_or_default())
                        on:input=move |ev| form.update(|f| f.comment = non_empty(event_target_value(&ev)))
                    />
                </div>

                <div class="form-actions">
                    <button class="btn btn-primary"
                        disabled={
                            let vm = vm.clone();
                            move || saving.get() || !vm.is_form_valid()()
                        }
                        on:click={
                            let vm = vm.clone();
                            move |_| vm.save_command(on_saved)
                        }
                    >{"💾 Сохранить"}</button>
                    <button class="btn btn-secondary" on:click=move |_| on_cancel.run(())>{"Отмена"}</button>
                </div>
            </div>

            {
                let vm = vm.clone();
                move || dialog_open.get().then(|| {
                    view! { <SupplierDialog vm=vm.clone() /> }
                })
            }
        </div>
    }
}

/// Быстрое создание поставщика из поля выбора
#[component]
fn SupplierDialog(vm: ProductDetailsViewModel) -> impl IntoView {
    let draft = vm.supplier_draft;
    let creating = vm.creating_supplier;

    let update = move |apply: fn(&mut SupplierDraft, String), value: String| {
        draft.update(|d| {
            if let Some(d) = d.as_mut() {
                apply(d, value);
            }
        });
    };
    let field = move |read: fn(&SupplierDraft) -> String| {
        move || draft.with(|d| d.as_ref().map(read).unwrap_or_default())
    };

    let on_close = {
        let vm = vm.clone();
        Callback::new(move |_: ()| vm.close_supplier_dialog())
    };

    view! {
        <Modal title="Новый поставщик" on_close=on_close>
            <div class="form__group">
                <label class="form__label" for="supplier-name">{"Наименование"}</label>
                <input
                    type="text"
                    id="supplier-name"
                    class="form__input"
                    prop:value=field(|d| d.name.clone())
                    on:input=move |ev| update(|d, v| d.name = v, event_target_value(&ev))
                />
            </div>
            <div class="form__group">
                <label class="form__label" for="supplier-inn">{"ИНН"}</label>
                <input
                    type="text"
                    id="supplier-inn"
                    class="form__input"
                    prop:value=field(|d| d.inn.clone().unwrap_or_default())
                    on:input=move |ev| update(|d, v| d.inn = non_empty(v), event_target_value(&ev))
                    placeholder="ИНН (опционально)"
                />
            </div>
            <div class="form__group">
                <label class="form__label" for="supplier-email">{"Email"}</label>
                <input
                    type="email"
                    id="supplier-email"
                    class="form__input"
                    prop:value=field(|d| d.email.clone().unwrap_or_default())
                    on:input=move |ev| update(|d, v| d.email = non_empty(v), event_target_value(&ev))
                    placeholder="Email (опционально)"
                />
            </div>
            <div class="form-actions">
                <button class="btn btn-primary"
                    disabled=move || creating.get()
                    on:click={
                        let vm = vm.clone();
                        move |_| vm.create_supplier_command()
                    }
                >
                    {move || if creating.get() { "Создание..." } else { "Создать" }}
                </button>
                <button class="btn btn-secondary" on:click=move |_| on_close.run(())>{"Отмена"}</button>
            </div>
        </Modal>
    }
}

//! Keeping the dropdown and its highlighted row on screen.

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

/// Space kept below the input for the open dropdown, px
const DROPDOWN_RESERVE_PX: f64 = 240.0;

/// New `scrollTop` for a list so that the row `[row_top, row_top + row_height)`
/// is fully visible, or `None` when it already is.
pub fn row_scroll_target(scroll_top: i32, view_height: i32, row_top: i32, row_height: i32) -> Option<i32> {
    if row_top < scroll_top {
        Some(row_top)
    } else if row_top + row_height > scroll_top + view_height {
        Some(row_top + row_height - view_height)
    } else {
        None
    }
}

/// Scroll delta for a container so that the target plus the dropdown
/// reserve fits inside it. Positive scrolls down.
pub fn container_scroll_delta(
    container_top: f64,
    container_bottom: f64,
    target_top: f64,
    target_bottom: f64,
    reserve: f64,
) -> f64 {
    let overflow = target_bottom + reserve - container_bottom;
    if target_top < container_top {
        target_top - container_top
    } else if overflow > 0.0 {
        // не уводим сам input за верхний край
        overflow.min(target_top - container_top)
    } else {
        0.0
    }
}

pub fn keep_row_visible(list: &HtmlElement, index: usize) {
    let selector = format!("[data-index=\"{}\"]", index);
    let Ok(Some(row)) = list.query_selector(&selector) else {
        return;
    };
    let Some(row) = row.dyn_ref::<HtmlElement>() else {
        return;
    };
    if let Some(top) = row_scroll_target(
        list.scroll_top(),
        list.client_height(),
        row.offset_top(),
        row.offset_height(),
    ) {
        list.set_scroll_top(top);
    }
}

/// Scroll an explicitly passed container so the open dropdown is visible.
pub fn reveal_in_container(container: &Element, target: &Element) {
    let outer = container.get_bounding_client_rect();
    let inner = target.get_bounding_client_rect();
    let delta = container_scroll_delta(
        outer.top(),
        outer.bottom(),
        inner.top(),
        inner.bottom(),
        DROPDOWN_RESERVE_PX,
    );
    if delta != 0.0 {
        container.set_scroll_top(container.scroll_top() + delta.round() as i32);
    }
}

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement};

/// Look up `id` and cast it to the element type the page is expected to use
fn typed_by_id<T: JsCast>(document: &Document, id: &str, type_name: &str) -> Result<T, JsValue> {
    get_element_by_id(document, id)?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("#{} is not an {}", id, type_name)))
}

pub fn get_element_by_id(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing page element #{}", id)))
}

pub fn get_html_element_by_id(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
    typed_by_id(document, id, "HtmlElement")
}

pub fn get_input_by_id(document: &Document, id: &str) -> Result<HtmlInputElement, JsValue> {
    typed_by_id(document, id, "HtmlInputElement")
}

pub fn create_element_with_class(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    element.set_class_name(class);
    Ok(element)
}

/// Attach a listener for `event`. Handlers stay registered for the life of
/// the page, so the closure is leaked on purpose.
pub fn add_listener<F>(element: &Element, event: &str, callback: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let handler = Closure::<dyn FnMut(Event)>::new(callback);
    element.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

pub fn add_click_listener<F>(element: &Element, mut callback: F) -> Result<(), JsValue>
where
    F: FnMut() + 'static,
{
    add_listener(element, "click", move |_| callback())
}

fn set_display(element: &HtmlElement, value: &str) {
    if let Err(e) = element.style().set_property("display", value) {
        log::warn!("Could not set display on element: {:?}", e);
    }
}

pub fn show_element(element: &HtmlElement) {
    set_display(element, "block");
}

/// Show or hide the element with the given ID; a missing element is ignored
pub fn set_visible(document: &Document, id: &str, visible: bool) {
    if let Ok(element) = get_html_element_by_id(document, id) {
        set_display(&element, if visible { "block" } else { "none" });
    }
}

pub fn clear_element(element: &Element) {
    element.set_inner_html("");
}

pub fn scroll_to_bottom(element: &Element) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        html.set_scroll_top(html.scroll_height());
    }
}

/// Add or remove a CSS class
pub fn toggle_class(element: &Element, class: &str, on: bool) {
    let classes = element.class_list();
    let result = if on { classes.add_1(class) } else { classes.remove_1(class) };
    if let Err(e) = result {
        log::warn!("Could not toggle class {}: {:?}", class, e);
    }
}

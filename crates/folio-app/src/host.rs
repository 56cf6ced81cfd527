// crates/folio-app/src/host.rs
// Browser page host: PageHost over web-sys elements

use std::cell::Cell;

use futures::future::LocalBoxFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry,
    KeyboardEvent, ScrollBehavior, ScrollIntoViewOptions, Window,
};

use folio_core::host::{DomEvent, Handler, ListenTarget, NodeKey, PageHost, Query};
use folio_core::{FolioError, Result};

/// Expando property carrying a node's identity
const KEY_PROPERTY: &str = "__folioKey";

/// Convert a JS exception into a host error
pub fn js_err(value: JsValue) -> FolioError {
    match value.as_string() {
        Some(message) => FolioError::Host(message),
        None => FolioError::Host(format!("{:?}", value)),
    }
}

pub struct WebPage {
    window: Window,
    document: Document,
    root: Element,
    next_key: Cell<u64>,
}

impl WebPage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| FolioError::host("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| FolioError::host("No document"))?;
        let root = document
            .document_element()
            .ok_or_else(|| FolioError::host("No document element"))?;
        Ok(Self {
            window,
            document,
            root,
            next_key: Cell::new(1),
        })
    }

    /// True while the parser is still building the document
    pub fn is_loading(&self) -> bool {
        is_loading_state(&self.document.ready_state())
    }
}

/// `document.readyState` is "loading", "interactive" or "complete"
fn is_loading_state(state: &str) -> bool {
    state == "loading"
}

impl PageHost for WebPage {
    type Node = Element;

    fn document(&self) -> Element {
        self.root.clone()
    }

    fn key(&self, node: &Element) -> NodeKey {
        let property = JsValue::from_str(KEY_PROPERTY);
        if let Some(existing) = js_sys::Reflect::get(node, &property)
            .ok()
            .and_then(|v| v.as_f64())
        {
            return NodeKey(existing as u64);
        }

        let key = self.next_key.get();
        self.next_key.set(key + 1);
        if let Err(e) = js_sys::Reflect::set(node, &property, &JsValue::from_f64(key as f64)) {
            log::warn!("Could not tag node {}: {:?}", key, e);
        }
        NodeKey(key)
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, scope: &Element, query: &Query<'_>) -> Vec<Element> {
        let css = query.to_css();
        let mut found = Vec::new();
        if scope.matches(&css).unwrap_or(false) {
            found.push(scope.clone());
        }
        match scope.query_selector_all(&css) {
            Ok(list) => {
                for i in 0..list.length() {
                    if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                        found.push(el);
                    }
                }
            }
            Err(e) => log::warn!("Query {} failed: {:?}", css, e),
        }
        found
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn attributes(&self, node: &Element) -> Vec<(String, String)> {
        let map = node.attributes();
        (0..map.length())
            .filter_map(|i| map.item(i))
            .map(|attr| (attr.name(), attr.value()))
            .collect()
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) -> Result<()> {
        node.set_attribute(name, value).map_err(js_err)
    }

    fn remove_attribute(&self, node: &Element, name: &str) -> Result<()> {
        node.remove_attribute(name).map_err(js_err)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) -> Result<()> {
        node.class_list().add_1(class).map_err(js_err)
    }

    fn remove_class(&self, node: &Element, class: &str) -> Result<()> {
        node.class_list().remove_1(class).map_err(js_err)
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn set_inner_html(&self, node: &Element, html: &str) -> Result<()> {
        node.set_inner_html(html);
        Ok(())
    }

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(js_err)
    }

    fn replace(&self, old: &Element, new: &Element) -> Result<()> {
        old.replace_with_with_node_1(new).map_err(js_err)
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<()> {
        parent.append_child(child).map(|_| ()).map_err(js_err)
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        ancestor.contains(Some(node))
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn listen(&self, target: ListenTarget<Element>, event: &str, handler: Handler) -> Result<()> {
        let target: web_sys::EventTarget = match target {
            ListenTarget::Node(el) => el.into(),
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Window => self.window.clone().into(),
        };

        let name = event.to_string();
        let callback = Closure::wrap(Box::new(move |e: web_sys::Event| {
            let event = match e.dyn_ref::<KeyboardEvent>() {
                Some(key) => DomEvent::with_key(name.as_str(), key.key()),
                None => DomEvent::new(name.as_str()),
            };
            handler(&event);
            if event.default_prevented() {
                e.prevent_default();
            }
        }) as Box<dyn FnMut(_)>);

        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(js_err)?;
        // Listeners live for the page
        callback.forget();
        Ok(())
    }

    fn dispatch(&self, event: &str) -> Result<()> {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        let custom = CustomEvent::new_with_event_init_dict(event, &init).map_err(js_err)?;
        self.document.dispatch_event(&custom).map(|_| ()).map_err(js_err)
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_into_view(&self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn observe_visibility(&self, node: &Element, handler: Handler) -> Result<()> {
        let callback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    if entry.is_intersecting() {
                        handler(&DomEvent::new("intersect"));
                        observer.unobserve(&entry.target());
                    }
                }
            },
        ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

        let observer =
            IntersectionObserver::new(callback.as_ref().unchecked_ref()).map_err(js_err)?;
        observer.observe(node);
        callback.forget();
        Ok(())
    }

    fn form_value(&self, form: &Element, field: &str) -> Option<String> {
        let selector = format!("[name=\"{}\"]", field.replace('"', "\\\""));
        let control = form.query_selector(&selector).ok()??;
        if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        if let Some(area) = control.dyn_ref::<HtmlTextAreaElement>() {
            return Some(area.value());
        }
        if let Some(select) = control.dyn_ref::<HtmlSelectElement>() {
            return Some(select.value());
        }
        control.get_attribute("value")
    }

    fn reset_form(&self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        spawn_local(task);
    }

    fn base_url(&self) -> String {
        self.document
            .base_uri()
            .ok()
            .flatten()
            .or_else(|| self.window.location().href().ok())
            .unwrap_or_default()
    }

    fn current_year(&self) -> i32 {
        js_sys::Date::new_0().get_full_year() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_loading_state_defers_boot() {
        assert!(is_loading_state("loading"));
        assert!(!is_loading_state("interactive"));
        assert!(!is_loading_state("complete"));
    }
}

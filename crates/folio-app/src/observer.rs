// crates/folio-app/src/observer.rs
// MutationObserver feeding added subtrees to the coordinator, flushed after a debounce

use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord};

use folio_core::Coordinator;
use folio_core::host::PageHost;

use crate::host::{WebPage, js_err};
use crate::net::timeout_millis;

/// Watch the whole document for added elements. The first change after a
/// flush schedules the next one; later changes join the pending batch.
pub fn watch(
    page: &WebPage,
    coordinator: Rc<Coordinator<WebPage>>,
    debounce: Duration,
) -> folio_core::Result<()> {
    let delay = timeout_millis(debounce);

    let callback = Closure::wrap(Box::new(move |records: js_sys::Array, _: MutationObserver| {
        let mut added = Vec::new();
        for record in records.iter() {
            let record: MutationRecord = record.unchecked_into();
            let nodes = record.added_nodes();
            for i in 0..nodes.length() {
                if let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    added.push(el);
                }
            }
        }
        if added.is_empty() {
            return;
        }

        if coordinator.notify_structural_change(added) {
            let coordinator = coordinator.clone();
            Timeout::new(delay, move || {
                coordinator.flush();
            })
            .forget();
        }
    }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(js_err)?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer
        .observe_with_options(&page.document(), &init)
        .map_err(js_err)?;
    callback.forget();

    log::debug!("Watching for structural changes ({}ms debounce)", delay);
    Ok(())
}

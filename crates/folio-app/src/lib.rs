// crates/folio-app/src/lib.rs
// Folio - WASM entry point: wire the include loader and page features to the live DOM

mod host;
mod net;
mod observer;

pub use host::WebPage;
pub use net::{GlooContact, GlooFragments, GlooTimer};

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use folio_core::host::{DomEvent, ListenTarget, PageHost};
use folio_core::{Coordinator, FolioError, IncludeLoader, SiteConfig, Trigger, features};

/// Id of the inline JSON configuration block
const CONFIG_ELEMENT_ID: &str = "site-config";

#[wasm_bindgen(start)]
pub fn main() {
    // Better panic messages in browser console
    console_error_panic_hook::set_once();

    let page = match WebPage::new() {
        Ok(page) => Rc::new(page),
        Err(e) => {
            _ = console_log::init_with_level(log::Level::Info);
            log::error!("Folio cannot start: {}", e);
            return;
        }
    };

    let (config, config_error) = load_config(&page);
    _ = console_log::init_with_level(config.log_level());
    if let Some(e) = config_error {
        log::warn!("Ignoring invalid #{}: {}", CONFIG_ELEMENT_ID, e);
    }

    if let Err(e) = boot(page, config) {
        log::error!("Folio failed to start: {}", e);
    }
}

/// Read the inline config block. Absent means defaults; invalid means
/// defaults plus the parse error for logging once the logger exists.
fn load_config(page: &WebPage) -> (SiteConfig, Option<FolioError>) {
    let Some(block) = page.by_id(CONFIG_ELEMENT_ID) else {
        return (SiteConfig::default(), None);
    };
    let json = page.text(&block);
    if json.trim().is_empty() {
        return (SiteConfig::default(), None);
    }
    match SiteConfig::from_json(&json) {
        Ok(config) => (config, None),
        Err(e) => (SiteConfig::default(), Some(e)),
    }
}

fn boot(page: Rc<WebPage>, config: SiteConfig) -> folio_core::Result<()> {
    let mut coordinator = Coordinator::new(page.clone());
    features::install(&mut coordinator, &config, GlooContact, GlooTimer);
    let coordinator = Rc::new(coordinator);
    log::debug!("Features: {}", coordinator.feature_names().join(", "));

    let loader = IncludeLoader::new(
        page.clone(),
        GlooFragments,
        GlooTimer,
        config.include.clone(),
    );
    {
        let coordinator = coordinator.clone();
        loader.on_complete(move || {
            coordinator.run_document(Trigger::IncludesLoaded);
        });
    }

    observer::watch(&page, coordinator.clone(), config.rescan_debounce())?;

    on_page_ready(&page, move || {
        coordinator.run_document(Trigger::PageReady);
        spawn_local(async move {
            let report = loader.run().await;
            log::info!(
                "Includes settled: {} injected, {} failed",
                report.injected(),
                report.failures().count()
            );
        });
    })
}

/// Run `ready` once the document is parsed, immediately if it already is
fn on_page_ready(page: &WebPage, ready: impl FnOnce() + 'static) -> folio_core::Result<()> {
    if !page.is_loading() {
        ready();
        return Ok(());
    }

    let pending = RefCell::new(Some(ready));
    page.listen(
        ListenTarget::Document,
        "DOMContentLoaded",
        Rc::new(move |_: &DomEvent| {
            if let Some(ready) = pending.borrow_mut().take() {
                ready();
            }
        }),
    )
}

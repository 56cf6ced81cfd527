// crates/folio-core/src/features/nav.rs
// Mobile navigation menu: toggle, backdrop, link and Escape dismissal

use std::rc::Rc;

use crate::Result;
use crate::features::OPEN_CLASS;
use crate::host::{DomEvent, ListenTarget, PageHost, Query};
use crate::rebind::{BindKey, BindRegistry, Feature};

pub const TOGGLE_ID: &str = "nav-toggle";
pub const MENU_ID: &str = "nav-menu";
pub const BACKDROP_ID: &str = "nav-backdrop";

pub struct MobileNav {
    registry: Rc<BindRegistry>,
}

impl Default for MobileNav {
    fn default() -> Self {
        Self {
            registry: Rc::new(BindRegistry::new("mobile-nav")),
        }
    }
}

impl MobileNav {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Open or close the menu. Elements are looked up on every call because the
/// header may be re-injected.
pub fn set_menu_open<H: PageHost>(host: &H, open: bool) -> Result<()> {
    let Some(menu) = host.by_id(MENU_ID) else {
        return Ok(());
    };

    let apply = |node: &H::Node| {
        if open {
            host.add_class(node, OPEN_CLASS)
        } else {
            host.remove_class(node, OPEN_CLASS)
        }
    };

    apply(&menu)?;
    if let Some(backdrop) = host.by_id(BACKDROP_ID) {
        apply(&backdrop)?;
    }
    if let Some(toggle) = host.by_id(TOGGLE_ID) {
        host.set_attribute(&toggle, "aria-expanded", if open { "true" } else { "false" })?;
    }
    Ok(())
}

pub fn is_menu_open<H: PageHost>(host: &H) -> bool {
    host.by_id(MENU_ID)
        .is_some_and(|menu| host.has_class(&menu, OPEN_CLASS))
}

fn close_handler<H: PageHost>(host: &Rc<H>) -> Rc<dyn Fn(&DomEvent)> {
    let host = host.clone();
    Rc::new(move |_: &DomEvent| {
        if let Err(e) = set_menu_open(&*host, false) {
            log::warn!("Failed to close navigation: {}", e);
        }
    })
}

impl<H: PageHost> Feature<H> for MobileNav {
    fn name(&self) -> &'static str {
        "mobile-nav"
    }

    fn bind(&self, host: &Rc<H>, _scope: &H::Node) -> Result<usize> {
        // Ids are unique, so the whole document is cheap to check
        let (Some(toggle), Some(menu)) = (host.by_id(TOGGLE_ID), host.by_id(MENU_ID)) else {
            return Ok(0);
        };

        let mut bound = 0;

        let attached = self.registry.bind_once(BindKey::Node(host.key(&toggle)), || {
            host.set_attribute(&toggle, "aria-controls", MENU_ID)?;
            if host.attribute(&toggle, "aria-expanded").is_none() {
                host.set_attribute(&toggle, "aria-expanded", "false")?;
            }
            let h = host.clone();
            host.listen(
                ListenTarget::Node(toggle.clone()),
                "click",
                Rc::new(move |_: &DomEvent| {
                    let open = !is_menu_open(&*h);
                    if let Err(e) = set_menu_open(&*h, open) {
                        log::warn!("Failed to toggle navigation: {}", e);
                    }
                }),
            )
        })?;
        bound += usize::from(attached);

        if let Some(backdrop) = host.by_id(BACKDROP_ID) {
            let key = BindKey::Node(host.key(&backdrop));
            let attached = self.registry.bind_once(key, || {
                host.listen(ListenTarget::Node(backdrop), "click", close_handler(host))
            })?;
            bound += usize::from(attached);
        }

        for link in host.query_all(&menu, &Query::Tag("a")) {
            let key = BindKey::Node(host.key(&link));
            let attached = self.registry.bind_once(key, || {
                host.listen(ListenTarget::Node(link), "click", close_handler(host))
            })?;
            bound += usize::from(attached);
        }

        let attached = self.registry.bind_once(BindKey::Global("nav-escape"), || {
            let h = host.clone();
            host.listen(
                ListenTarget::Document,
                "keydown",
                Rc::new(move |event: &DomEvent| {
                    if event.key.as_deref() == Some("Escape") && is_menu_open(&*h) {
                        if let Err(e) = set_menu_open(&*h, false) {
                            log::warn!("Failed to close navigation: {}", e);
                        }
                    }
                }),
            )
        })?;
        bound += usize::from(attached);

        Ok(bound)
    }
}

// crates/folio-core/src/features/scroll.rs
// Smooth scrolling for in-page anchor links

use std::rc::Rc;

use crate::Result;
use crate::host::{DomEvent, ListenTarget, PageHost, Query};
use crate::rebind::{BindKey, BindRegistry, Feature};

const ANCHOR_LINKS: Query<'static> = Query::AttrPrefix {
    name: "href",
    prefix: "#",
};

pub struct SmoothScroll {
    registry: BindRegistry,
}

impl Default for SmoothScroll {
    fn default() -> Self {
        Self {
            registry: BindRegistry::new("smooth-scroll"),
        }
    }
}

/// Element id named by an in-page href, if any
fn fragment_target(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

impl<H: PageHost> Feature<H> for SmoothScroll {
    fn name(&self) -> &'static str {
        "smooth-scroll"
    }

    fn bind(&self, host: &Rc<H>, scope: &H::Node) -> Result<usize> {
        let mut bound = 0;
        for link in host.query_all(scope, &ANCHOR_LINKS) {
            let key = BindKey::Node(host.key(&link));
            let attached = self.registry.bind_once(key, || {
                let h = host.clone();
                let anchor = link.clone();
                host.listen(
                    ListenTarget::Node(link),
                    "click",
                    Rc::new(move |event: &DomEvent| {
                        let href = h.attribute(&anchor, "href").unwrap_or_default();
                        let Some(target) = fragment_target(&href).and_then(|id| h.by_id(id))
                        else {
                            return;
                        };
                        event.prevent_default();
                        h.scroll_into_view(&target);
                    }),
                )
            })?;
            bound += usize::from(attached);
        }
        Ok(bound)
    }
}

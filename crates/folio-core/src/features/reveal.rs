// crates/folio-core/src/features/reveal.rs
// Reveal-on-scroll

use std::rc::Rc;

use crate::Result;
use crate::host::{DomEvent, PageHost, Query};
use crate::rebind::{BindKey, BindRegistry, Feature};

pub const REVEAL_CLASS: &str = "reveal";
pub const VISIBLE_CLASS: &str = "is-visible";

pub struct Reveal {
    registry: BindRegistry,
}

impl Default for Reveal {
    fn default() -> Self {
        Self {
            registry: BindRegistry::new("reveal"),
        }
    }
}

impl<H: PageHost> Feature<H> for Reveal {
    fn name(&self) -> &'static str {
        "reveal"
    }

    fn bind(&self, host: &Rc<H>, scope: &H::Node) -> Result<usize> {
        let mut bound = 0;
        for node in host.query_all(scope, &Query::Class(REVEAL_CLASS)) {
            let attached = self.registry.bind_once(BindKey::Node(host.key(&node)), || {
                let h = host.clone();
                let target = node.clone();
                host.observe_visibility(
                    &node,
                    Rc::new(move |_: &DomEvent| {
                        if let Err(e) = h.add_class(&target, VISIBLE_CLASS) {
                            log::debug!("Reveal failed: {}", e);
                        }
                    }),
                )
            })?;
            bound += usize::from(attached);
        }
        Ok(bound)
    }
}

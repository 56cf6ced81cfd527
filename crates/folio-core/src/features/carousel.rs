// crates/folio-core/src/features/carousel.rs
// Deck carousel: one active slide per [data-carousel] root, wrapping prev/next

use std::cell::Cell;
use std::rc::Rc;

use crate::Result;
use crate::host::{DomEvent, ListenTarget, PageHost, Query};
use crate::rebind::{BindKey, BindRegistry, Feature};

pub const ACTIVE_CLASS: &str = "is-active";

pub struct Carousel {
    registry: BindRegistry,
}

impl Default for Carousel {
    fn default() -> Self {
        Self {
            registry: BindRegistry::new("carousel"),
        }
    }
}

struct Deck<H: PageHost> {
    host: Rc<H>,
    slides: Vec<H::Node>,
    index: Cell<usize>,
}

impl<H: PageHost> Deck<H> {
    fn show(&self, index: usize) {
        let len = self.slides.len();
        let index = index % len;
        self.index.set(index);
        for (i, slide) in self.slides.iter().enumerate() {
            let applied = if i == index {
                self.host.add_class(slide, ACTIVE_CLASS)
            } else {
                self.host.remove_class(slide, ACTIVE_CLASS)
            };
            if let Err(e) = applied {
                log::debug!("Carousel slide update failed: {}", e);
            }
        }
    }

    fn step(&self, forward: bool) {
        let len = self.slides.len();
        let current = self.index.get();
        let next = if forward { current + 1 } else { current + len - 1 };
        self.show(next);
    }
}

impl<H: PageHost> Feature<H> for Carousel {
    fn name(&self) -> &'static str {
        "carousel"
    }

    fn bind(&self, host: &Rc<H>, scope: &H::Node) -> Result<usize> {
        let mut bound = 0;
        for root in host.query_all(scope, &Query::Attr("data-carousel")) {
            let slides = host.query_all(&root, &Query::Attr("data-slide"));
            if slides.is_empty() {
                continue;
            }
            let attached = self.registry.bind_once(BindKey::Node(host.key(&root)), || {
                let start = slides
                    .iter()
                    .position(|s| host.has_class(s, ACTIVE_CLASS))
                    .unwrap_or(0);
                let deck = Rc::new(Deck {
                    host: host.clone(),
                    slides,
                    index: Cell::new(start),
                });
                deck.show(start);

                for (query, forward) in [
                    (Query::Attr("data-carousel-prev"), false),
                    (Query::Attr("data-carousel-next"), true),
                ] {
                    for control in host.query_all(&root, &query) {
                        let deck = deck.clone();
                        host.listen(
                            ListenTarget::Node(control),
                            "click",
                            Rc::new(move |_: &DomEvent| deck.step(forward)),
                        )?;
                    }
                }
                Ok(())
            })?;
            bound += usize::from(attached);
        }
        Ok(bound)
    }
}

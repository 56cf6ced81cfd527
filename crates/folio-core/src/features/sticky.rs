// crates/folio-core/src/features/sticky.rs
// Sticky navigation bar class toggle

use std::rc::Rc;

use crate::Result;
use crate::config::NavConfig;
use crate::host::{DomEvent, ListenTarget, PageHost};
use crate::rebind::{BindKey, BindRegistry, Feature};

pub const STICKY_CLASS: &str = "is-sticky";

pub struct StickyNav {
    config: Rc<NavConfig>,
    registry: BindRegistry,
}

impl StickyNav {
    pub fn new(config: NavConfig) -> Self {
        Self {
            config: Rc::new(config),
            registry: BindRegistry::new("sticky-nav"),
        }
    }
}

/// Apply the sticky class for the current scroll offset
pub fn update_sticky<H: PageHost>(host: &H, config: &NavConfig) -> Result<()> {
    let Some(nav) = host.by_id(&config.sticky_id) else {
        return Ok(());
    };
    if host.scroll_y() > config.sticky_threshold {
        host.add_class(&nav, STICKY_CLASS)
    } else {
        host.remove_class(&nav, STICKY_CLASS)
    }
}

impl<H: PageHost> Feature<H> for StickyNav {
    fn name(&self) -> &'static str {
        "sticky-nav"
    }

    fn listens_to(&self, trigger: crate::rebind::Trigger) -> bool {
        !matches!(trigger, crate::rebind::Trigger::Mutation)
    }

    fn bind(&self, host: &Rc<H>, _scope: &H::Node) -> Result<usize> {
        // The bar may arrive with the header fragment; sync it on every pass
        update_sticky(&**host, &self.config)?;

        let attached = self.registry.bind_once(BindKey::Global("window-scroll"), || {
            let h = host.clone();
            let config = self.config.clone();
            host.listen(
                ListenTarget::Window,
                "scroll",
                Rc::new(move |_: &DomEvent| {
                    if let Err(e) = update_sticky(&*h, &config) {
                        log::debug!("Sticky nav update failed: {}", e);
                    }
                }),
            )
        })?;
        Ok(usize::from(attached))
    }
}

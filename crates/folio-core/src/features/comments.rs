// crates/folio-core/src/features/comments.rs
// Third-party comments widget mount

use std::rc::Rc;

use crate::Result;
use crate::config::CommentsConfig;
use crate::host::PageHost;
use crate::rebind::{BindKey, BindRegistry, Feature, Trigger};

pub struct Comments {
    config: CommentsConfig,
    registry: BindRegistry,
}

impl Comments {
    pub fn new(config: CommentsConfig) -> Self {
        Self {
            config,
            registry: BindRegistry::new("comments"),
        }
    }
}

impl<H: PageHost> Feature<H> for Comments {
    fn name(&self) -> &'static str {
        "comments"
    }

    // Containers usually arrive inside a fragment
    fn listens_to(&self, trigger: Trigger) -> bool {
        matches!(trigger, Trigger::IncludesLoaded | Trigger::Mutation)
    }

    fn bind(&self, host: &Rc<H>, _scope: &H::Node) -> Result<usize> {
        if self.config.script_src.trim().is_empty() {
            return Ok(0);
        }
        let Some(container) = host.by_id(self.config.container_id()) else {
            return Ok(0);
        };
        let mounted = self.registry.bind_once(BindKey::Node(host.key(&container)), || {
            let script = host.create_element("script")?;
            host.set_attribute(&script, "src", &self.config.script_src)?;
            host.set_attribute(&script, "async", "")?;
            host.set_attribute(&script, "crossorigin", "anonymous")?;
            for (name, value) in &self.config.attributes {
                host.set_attribute(&script, name, value)?;
            }
            host.append_child(&container, &script)
        })?;
        if !mounted {
            return Ok(0);
        }
        log::info!("Mounted comments widget from {}", self.config.script_src);
        Ok(1)
    }
}

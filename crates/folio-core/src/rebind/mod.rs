// crates/folio-core/src/rebind/mod.rs
// Rebind coordination: run every feature's discover-and-bind pass on each trigger

mod registry;
mod rescan;

pub use registry::{BindKey, BindRegistry};
pub use rescan::RescanQueue;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, warn};

use crate::Result;
use crate::host::PageHost;

/// What caused a rescan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    PageReady,
    IncludesLoaded,
    Mutation,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::PageReady => "page-ready",
            Trigger::IncludesLoaded => "includes-loaded",
            Trigger::Mutation => "mutation",
        };
        f.write_str(name)
    }
}

/// A page feature that binds listeners to elements it discovers.
///
/// `bind` may run any number of times over overlapping scopes. It must
/// guard every attachment with its own `BindRegistry` and return only the
/// number of targets bound by this call. Missing markup is `Ok(0)`.
pub trait Feature<H: PageHost> {
    fn name(&self) -> &'static str;

    fn listens_to(&self, trigger: Trigger) -> bool {
        let _ = trigger;
        true
    }

    fn bind(&self, host: &Rc<H>, scope: &H::Node) -> Result<usize>;
}

pub struct Coordinator<H: PageHost> {
    host: Rc<H>,
    features: Vec<Box<dyn Feature<H>>>,
    queue: RefCell<RescanQueue<H::Node>>,
}

impl<H: PageHost> Coordinator<H> {
    pub fn new(host: Rc<H>) -> Self {
        Self {
            host,
            features: Vec::new(),
            queue: RefCell::new(RescanQueue::default()),
        }
    }

    pub fn register(&mut self, feature: impl Feature<H> + 'static) -> &mut Self {
        self.features.push(Box::new(feature));
        self
    }

    pub fn with(mut self, feature: impl Feature<H> + 'static) -> Self {
        self.register(feature);
        self
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    /// Run every feature listening to `trigger` over `scope`. A failing
    /// feature is logged and skipped. Returns the number of new bindings.
    pub fn run(&self, trigger: Trigger, scope: &H::Node) -> usize {
        let mut bound = 0;
        for feature in self.features.iter().filter(|f| f.listens_to(trigger)) {
            match feature.bind(&self.host, scope) {
                Ok(0) => {}
                Ok(n) => {
                    debug!("{} bound {} target(s) on {}", feature.name(), n, trigger);
                    bound += n;
                }
                Err(e) => warn!("{} failed on {}: {}", feature.name(), trigger, e),
            }
        }
        bound
    }

    /// Run over the whole document
    pub fn run_document(&self, trigger: Trigger) -> usize {
        let document = self.host.document();
        self.run(trigger, &document)
    }

    /// Record added subtrees. True when the caller should schedule a
    /// debounced `flush`.
    pub fn notify_structural_change(&self, added: impl IntoIterator<Item = H::Node>) -> bool {
        self.queue.borrow_mut().push(added)
    }

    pub fn pending_changes(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Rescan each minimal queued root for mutation-watching features
    pub fn flush(&self) -> usize {
        let roots = self.queue.borrow_mut().drain_roots(&*self.host);
        if roots.is_empty() {
            return 0;
        }
        debug!("Rescanning {} changed subtree(s)", roots.len());
        roots
            .iter()
            .map(|root| self.run(Trigger::Mutation, root))
            .sum()
    }
}

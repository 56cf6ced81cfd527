// crates/folio-core/src/rebind/registry.rs
// Idempotency guard: which targets a feature has already bound

use std::cell::RefCell;
use std::collections::HashSet;

use log::debug;

use crate::host::NodeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindKey {
    /// A specific element, by identity
    Node(NodeKey),
    /// A page-wide listener (document or window)
    Global(&'static str),
}

/// Set of already-claimed targets, owned by one feature for the page lifetime.
/// There is no reset.
#[derive(Debug)]
pub struct BindRegistry {
    name: &'static str,
    seen: RefCell<HashSet<BindKey>>,
}

impl BindRegistry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            seen: RefCell::new(HashSet::new()),
        }
    }

    /// Check-and-set. True only for the first claim of `key`.
    pub fn claim(&self, key: BindKey) -> bool {
        self.seen.borrow_mut().insert(key)
    }

    /// Run `attach` for an unbound `key` and record the key only once it
    /// succeeds, so a failed attach is retried on the next pass.
    /// Ok(false) means the key was already bound.
    pub fn bind_once(
        &self,
        key: BindKey,
        attach: impl FnOnce() -> crate::Result<()>,
    ) -> crate::Result<bool> {
        if self.is_bound(&key) {
            return Ok(false);
        }
        if let Err(e) = attach() {
            debug!("{}: attach for {:?} failed, left unbound", self.name, key);
            return Err(e);
        }
        Ok(self.claim(key))
    }

    pub fn is_bound(&self, key: &BindKey) -> bool {
        self.seen.borrow().contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }
}

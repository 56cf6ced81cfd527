// crates/folio-core/src/signal.rs
// One-shot completion signal

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};

type Hook = Box<dyn FnOnce()>;

struct Inner {
    raised: Cell<bool>,
    hooks: RefCell<Vec<Hook>>,
    sender: RefCell<Option<oneshot::Sender<()>>>,
    receiver: Shared<oneshot::Receiver<()>>,
}

/// Page-wide "all placeholders resolved" notification.
///
/// Clones share state. Raised at most once; hooks registered after raising
/// run immediately.
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Rc<Inner>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            inner: Rc::new(Inner {
                raised: Cell::new(false),
                hooks: RefCell::new(Vec::new()),
                sender: RefCell::new(Some(sender)),
                receiver: receiver.shared(),
            }),
        }
    }

    pub fn is_raised(&self) -> bool {
        self.inner.raised.get()
    }

    pub fn subscribe(&self, hook: impl FnOnce() + 'static) {
        if self.is_raised() {
            hook();
        } else {
            self.inner.hooks.borrow_mut().push(Box::new(hook));
        }
    }

    /// Returns false if the signal was already raised
    pub fn raise(&self) -> bool {
        if self.inner.raised.replace(true) {
            return false;
        }

        if let Some(sender) = self.inner.sender.borrow_mut().take() {
            let _ = sender.send(());
        }

        // Hooks may subscribe again; those run inline since `raised` is set
        let hooks = std::mem::take(&mut *self.inner.hooks.borrow_mut());
        for hook in hooks {
            hook();
        }
        true
    }

    /// Resolves once the signal is raised
    pub async fn wait(&self) {
        let _ = self.inner.receiver.clone().await;
    }
}

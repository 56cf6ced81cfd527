// crates/folio-core/src/host.rs
// Page host abstraction: the seam between Folio logic and a live document

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use chrono::Datelike;
use futures::future::{self, Either, LocalBoxFuture};

use crate::Result;

/// Stable identity of an element for the lifetime of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Typed element query. Hosts translate it to their own matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    Id(&'a str),
    Class(&'a str),
    Tag(&'a str),
    Attr(&'a str),
    AttrPrefix { name: &'a str, prefix: &'a str },
}

impl Query<'_> {
    /// Equivalent CSS selector
    pub fn to_css(&self) -> String {
        match self {
            Query::Id(id) => format!("#{}", id),
            Query::Class(class) => format!(".{}", class),
            Query::Tag(tag) => tag.to_string(),
            Query::Attr(name) => format!("[{}]", name),
            Query::AttrPrefix { name, prefix } => {
                format!("[{}^=\"{}\"]", name, prefix.replace('"', "\\\""))
            }
        }
    }
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Where a listener is attached
#[derive(Debug, Clone)]
pub enum ListenTarget<N> {
    Node(N),
    Document,
    Window,
}

/// Host-neutral view of a DOM event handed to feature handlers
#[derive(Debug, Default)]
pub struct DomEvent {
    pub name: String,
    pub key: Option<String>,
    default_prevented: Cell<bool>,
}

impl DomEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_key(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some(key.into()),
            default_prevented: Cell::new(false),
        }
    }

    /// Ask the host to cancel the browser's default action once the handler returns
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

pub type Handler = Rc<dyn Fn(&DomEvent)>;

/// A live document, as seen by Folio.
///
/// `query_all` yields `scope` itself first when it matches, then matching
/// descendants in document order. Everything runs on one thread; handlers
/// may call back into the host.
pub trait PageHost: 'static {
    type Node: Clone + 'static;

    fn document(&self) -> Self::Node;
    fn key(&self, node: &Self::Node) -> NodeKey;
    fn by_id(&self, id: &str) -> Option<Self::Node>;
    fn query_all(&self, scope: &Self::Node, query: &Query<'_>) -> Vec<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<()>;
    fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<()>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str) -> Result<()>;
    fn remove_class(&self, node: &Self::Node, class: &str) -> Result<()>;

    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&self, node: &Self::Node, text: &str);
    /// Replace the node's children with parsed markup. Scripts in it stay inert.
    fn set_inner_html(&self, node: &Self::Node, html: &str) -> Result<()>;
    fn create_element(&self, tag: &str) -> Result<Self::Node>;
    fn replace(&self, old: &Self::Node, new: &Self::Node) -> Result<()>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn listen(&self, target: ListenTarget<Self::Node>, event: &str, handler: Handler)
    -> Result<()>;
    /// Fire a bubbling document-level event
    fn dispatch(&self, event: &str) -> Result<()>;

    fn scroll_y(&self) -> f64;
    fn scroll_into_view(&self, node: &Self::Node);
    /// Call `handler` when the node first enters the viewport
    fn observe_visibility(&self, node: &Self::Node, handler: Handler) -> Result<()>;

    fn form_value(&self, form: &Self::Node, field: &str) -> Option<String>;
    fn reset_form(&self, form: &Self::Node);

    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
    fn base_url(&self) -> String;

    fn current_year(&self) -> i32 {
        chrono::Local::now().year()
    }
}

/// Source of sleep futures for the current host
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut(pub Duration);

/// Race `fut` against the timer. The losing future is dropped.
pub async fn with_timeout<T, F>(
    timer: &impl Timer,
    after: Duration,
    fut: F,
) -> std::result::Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    let sleep = timer.sleep(after);
    futures::pin_mut!(fut);
    match future::select(fut, sleep).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(((), _)) => Err(TimedOut(after)),
    }
}

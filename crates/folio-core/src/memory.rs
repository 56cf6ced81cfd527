// crates/folio-core/src/memory.rs
// In-memory page host: a small DOM tree built with scraper, for headless
// runs and tests. Models the browser rules Folio depends on: markup set as
// HTML leaves its scripts inert, and a script element created by code runs
// when it is inserted into the document.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{LocalBoxFuture, join_all};
use scraper::{ElementRef, Html};

use crate::host::{DomEvent, Handler, ListenTarget, NodeKey, PageHost, Query};
use crate::{FolioError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug)]
enum Kind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        /// Parsed from an HTML string; never runs
        inert: bool,
        /// Script already executed
        started: bool,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: Vec<NodeData>,
}

/// A script the page executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedScript {
    pub src: Option<String>,
    pub code: String,
}

struct Listener {
    target: ListenTarget<NodeId>,
    event: String,
    handler: Handler,
}

pub struct MemoryPage {
    tree: RefCell<Tree>,
    base_url: String,
    year: Cell<Option<i32>>,
    scroll_y: Cell<f64>,
    listeners: RefCell<Vec<Listener>>,
    watchers: RefCell<Vec<(NodeId, Handler)>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
    dispatched: RefCell<Vec<String>>,
    executed: RefCell<Vec<ExecutedScript>>,
    scrolled: RefCell<Vec<NodeId>>,
}

impl Tree {
    fn push(&mut self, kind: Kind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn import_element(&mut self, el: ElementRef<'_>, parent: NodeId, inert: bool) {
        let value = el.value();
        let kind = Kind::Element {
            tag: value.name().to_ascii_lowercase(),
            attrs: value
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            inert,
            started: !inert,
        };
        let id = self.push(kind, Some(parent));
        self.import_children(el, id, inert);
    }

    /// Elements and text only; comments and doctypes are dropped
    fn import_children(&mut self, el: ElementRef<'_>, parent: NodeId, inert: bool) {
        for child in el.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                self.import_element(child_el, parent, inert);
            } else if let Some(text) = child.value().as_text() {
                let content: &str = text;
                self.push(Kind::Text(content.to_string()), Some(parent));
            }
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    fn attrs(&self, id: NodeId) -> Option<&Vec<(String, String)>> {
        match &self.nodes[id.0].kind {
            Kind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes[id.0].kind {
            Kind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            Kind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    fn matches(&self, id: NodeId, query: &Query<'_>) -> bool {
        let Some(tag) = self.tag(id) else {
            return false;
        };
        match query {
            Query::Id(value) => self.attribute(id, "id") == Some(*value),
            Query::Class(class) => self.has_class(id, class),
            Query::Tag(name) => tag.eq_ignore_ascii_case(name),
            Query::Attr(name) => self.attribute(id, name).is_some(),
            Query::AttrPrefix { name, prefix } => self
                .attribute(id, name)
                .is_some_and(|v| v.starts_with(prefix)),
        }
    }

    /// Preorder, `id` included
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    fn text(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match &self.nodes[n.0].kind {
                Kind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn contains(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node.0].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        for child in &self.nodes[id.0].children {
            match &self.nodes[child.0].kind {
                Kind::Text(text) => out.push_str(text),
                Kind::Element { tag, attrs, .. } => {
                    out.push('<');
                    out.push_str(tag);
                    for (k, v) in attrs {
                        out.push_str(&format!(" {}=\"{}\"", k, v.replace('"', "&quot;")));
                    }
                    out.push('>');
                    if !VOID_TAGS.contains(&tag.as_str()) {
                        self.serialize(*child, out);
                        out.push_str(&format!("</{}>", tag));
                    }
                }
                Kind::Document => {}
            }
        }
    }
}

impl MemoryPage {
    /// Parse a full document. Scripts in the initial markup count as
    /// already run.
    pub fn new(html: &str) -> Self {
        let mut tree = Tree::default();
        tree.push(Kind::Document, None);
        let parsed = Html::parse_document(html);
        tree.import_element(parsed.root_element(), ROOT, false);

        Self {
            tree: RefCell::new(tree),
            base_url: "https://folio.test/index.html".to_string(),
            year: Cell::new(None),
            scroll_y: Cell::new(0.0),
            listeners: RefCell::new(Vec::new()),
            watchers: RefCell::new(Vec::new()),
            tasks: RefCell::new(Vec::new()),
            dispatched: RefCell::new(Vec::new()),
            executed: RefCell::new(Vec::new()),
            scrolled: RefCell::new(Vec::new()),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_year(self, year: i32) -> Self {
        self.year.set(Some(year));
        self
    }

    pub fn inner_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().serialize(*node, &mut out);
        out
    }

    pub fn first(&self, query: &Query<'_>) -> Option<NodeId> {
        self.query_all(&ROOT, query).into_iter().next()
    }

    /// Parse `html` and append it under `parent` the way a script would
    /// (`insertAdjacentHTML`). Returns the new top-level nodes.
    pub fn append_html(&self, parent: &NodeId, html: &str) -> Vec<NodeId> {
        let fragment = Html::parse_fragment(html);
        let mut tree = self.tree.borrow_mut();
        let before = tree.nodes[parent.0].children.len();
        tree.import_children(fragment.root_element(), *parent, true);
        tree.nodes[parent.0].children[before..].to_vec()
    }

    pub fn remove(&self, node: &NodeId) {
        self.tree.borrow_mut().detach(*node);
    }

    /// Fill a form control: `value` attribute for inputs, text for textareas
    pub fn set_value(&self, node: &NodeId, value: &str) {
        let is_textarea = self.tree.borrow().tag(*node) == Some("textarea");
        if is_textarea {
            self.set_text(node, value);
        } else {
            let _ = self.set_attribute(node, "value", value);
        }
    }

    pub fn click(&self, node: &NodeId) -> bool {
        self.fire_bubbling(*node, DomEvent::new("click"))
    }

    pub fn submit(&self, form: &NodeId) -> bool {
        self.fire_bubbling(*form, DomEvent::new("submit"))
    }

    pub fn key_down(&self, key: &str) -> bool {
        let event = DomEvent::with_key("keydown", key);
        self.fire(|t| matches!(t, ListenTarget::Document), &event);
        event.default_prevented()
    }

    pub fn scroll_to(&self, y: f64) {
        self.scroll_y.set(y);
        let event = DomEvent::new("scroll");
        self.fire(|t| matches!(t, ListenTarget::Window), &event);
    }

    /// Report `node` as entering the viewport. Each watcher fires once.
    pub fn make_visible(&self, node: &NodeId) {
        let (hit, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut *self.watchers.borrow_mut())
            .into_iter()
            .partition(|(n, _)| n == node);
        *self.watchers.borrow_mut() = rest;
        let event = DomEvent::new("intersect");
        for (_, handler) in hit {
            handler(&event);
        }
    }

    pub fn listener_count(&self, node: &NodeId, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| matches!(&l.target, ListenTarget::Node(n) if n == node) && l.event == event)
            .count()
    }

    pub fn global_listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| !matches!(l.target, ListenTarget::Node(_)) && l.event == event)
            .count()
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.borrow().len()
    }

    /// Drive spawned tasks until none are left
    pub async fn run_tasks(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                break;
            }
            join_all(tasks).await;
        }
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.borrow().clone()
    }

    pub fn executed_scripts(&self) -> Vec<ExecutedScript> {
        self.executed.borrow().clone()
    }

    /// Inert script elements still attached to the document
    pub fn inert_scripts(&self) -> usize {
        let tree = self.tree.borrow();
        tree.descendants(ROOT)
            .into_iter()
            .filter(|n| {
                matches!(
                    &tree.nodes[n.0].kind,
                    Kind::Element { tag, inert: true, .. } if tag == "script"
                )
            })
            .count()
    }

    pub fn scrolled_into_view(&self) -> Vec<NodeId> {
        self.scrolled.borrow().clone()
    }

    fn fire(&self, select: impl Fn(&ListenTarget<NodeId>) -> bool, event: &DomEvent) {
        let handlers: Vec<Handler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.event == event.name && select(&l.target))
            .map(|l| l.handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Target, then ancestors, then document listeners
    fn fire_bubbling(&self, node: NodeId, event: DomEvent) -> bool {
        let path: Vec<NodeId> = {
            let tree = self.tree.borrow();
            let mut path = vec![node];
            let mut current = node;
            while let Some(parent) = tree.nodes[current.0].parent {
                path.push(parent);
                current = parent;
            }
            path
        };
        for hop in path {
            self.fire(|t| matches!(t, ListenTarget::Node(n) if *n == hop), &event);
        }
        self.fire(|t| matches!(t, ListenTarget::Document), &event);
        event.default_prevented()
    }

    /// Run scripts in a freshly inserted subtree
    fn on_inserted(&self, node: NodeId) {
        let mut ran = Vec::new();
        {
            let mut tree = self.tree.borrow_mut();
            if !tree.contains(ROOT, node) {
                return;
            }
            for id in tree.descendants(node) {
                let src = tree.attribute(id, "src").map(str::to_string);
                let code = tree.text(id);
                if let Kind::Element {
                    tag,
                    inert: false,
                    started,
                    ..
                } = &mut tree.nodes[id.0].kind
                {
                    if tag == "script" && !*started {
                        *started = true;
                        ran.push(ExecutedScript { src, code });
                    }
                }
            }
        }
        self.executed.borrow_mut().extend(ran);
    }
}

fn host_err(message: &str) -> FolioError {
    FolioError::host(message)
}

impl PageHost for MemoryPage {
    type Node = NodeId;

    fn document(&self) -> NodeId {
        ROOT
    }

    fn key(&self, node: &NodeId) -> NodeKey {
        NodeKey(node.0 as u64)
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.first(&Query::Id(id))
    }

    fn query_all(&self, scope: &NodeId, query: &Query<'_>) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        tree.descendants(*scope)
            .into_iter()
            .filter(|n| tree.matches(*n, query))
            .collect()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree.borrow().attribute(*node, name).map(str::to_string)
    }

    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
        self.tree.borrow().attrs(*node).cloned().unwrap_or_default()
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let attrs = tree
            .attrs_mut(*node)
            .ok_or_else(|| host_err("not an element"))?;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let attrs = tree
            .attrs_mut(*node)
            .ok_or_else(|| host_err("not an element"))?;
        attrs.retain(|(k, _)| k != name);
        Ok(())
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.tree.borrow().has_class(*node, class)
    }

    fn add_class(&self, node: &NodeId, class: &str) -> Result<()> {
        if self.has_class(node, class) {
            return Ok(());
        }
        let list = self.attribute(node, "class").unwrap_or_default();
        let list = if list.trim().is_empty() {
            class.to_string()
        } else {
            format!("{} {}", list.trim(), class)
        };
        self.set_attribute(node, "class", &list)
    }

    fn remove_class(&self, node: &NodeId, class: &str) -> Result<()> {
        let Some(list) = self.attribute(node, "class") else {
            return Ok(());
        };
        let list: Vec<&str> = list.split_whitespace().filter(|c| *c != class).collect();
        self.set_attribute(node, "class", &list.join(" "))
    }

    fn text(&self, node: &NodeId) -> String {
        self.tree.borrow().text(*node)
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        let mut tree = self.tree.borrow_mut();
        tree.clear_children(*node);
        if !text.is_empty() {
            tree.push(Kind::Text(text.to_string()), Some(*node));
        }
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) -> Result<()> {
        self.tree.borrow_mut().clear_children(*node);
        self.append_html(node, html);
        Ok(())
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        let kind = Kind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            inert: false,
            started: false,
        };
        Ok(self.tree.borrow_mut().push(kind, None))
    }

    fn replace(&self, old: &NodeId, new: &NodeId) -> Result<()> {
        {
            let mut tree = self.tree.borrow_mut();
            let parent = tree.nodes[old.0]
                .parent
                .ok_or_else(|| host_err("cannot replace a detached node"))?;
            tree.detach(*new);
            let siblings = &mut tree.nodes[parent.0].children;
            let pos = siblings
                .iter()
                .position(|c| c == old)
                .ok_or_else(|| host_err("corrupt tree"))?;
            siblings[pos] = *new;
            tree.nodes[old.0].parent = None;
            tree.nodes[new.0].parent = Some(parent);
        }
        self.on_inserted(*new);
        Ok(())
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        {
            let mut tree = self.tree.borrow_mut();
            if tree.contains(*child, *parent) {
                return Err(host_err("cannot append a node inside itself"));
            }
            tree.detach(*child);
            tree.nodes[parent.0].children.push(*child);
            tree.nodes[child.0].parent = Some(*parent);
        }
        self.on_inserted(*child);
        Ok(())
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        self.tree.borrow().contains(*ancestor, *node)
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.tree.borrow().contains(ROOT, *node)
    }

    fn listen(&self, target: ListenTarget<NodeId>, event: &str, handler: Handler) -> Result<()> {
        self.listeners.borrow_mut().push(Listener {
            target,
            event: event.to_string(),
            handler,
        });
        Ok(())
    }

    fn dispatch(&self, event: &str) -> Result<()> {
        self.dispatched.borrow_mut().push(event.to_string());
        let event = DomEvent::new(event);
        self.fire(|t| matches!(t, ListenTarget::Document), &event);
        Ok(())
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn scroll_into_view(&self, node: &NodeId) {
        self.scrolled.borrow_mut().push(*node);
    }

    fn observe_visibility(&self, node: &NodeId, handler: Handler) -> Result<()> {
        self.watchers.borrow_mut().push((*node, handler));
        Ok(())
    }

    fn form_value(&self, form: &NodeId, field: &str) -> Option<String> {
        let tree = self.tree.borrow();
        let control = tree
            .descendants(*form)
            .into_iter()
            .find(|n| tree.attribute(*n, "name") == Some(field))?;
        if tree.tag(control) == Some("textarea") {
            Some(tree.text(control))
        } else {
            Some(tree.attribute(control, "value").unwrap_or_default().to_string())
        }
    }

    fn reset_form(&self, form: &NodeId) {
        let controls: Vec<NodeId> = {
            let tree = self.tree.borrow();
            tree.descendants(*form)
                .into_iter()
                .filter(|n| tree.attribute(*n, "name").is_some())
                .collect()
        };
        for control in controls {
            self.set_value(&control, "");
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }

    fn current_year(&self) -> i32 {
        self.year.get().unwrap_or_else(|| {
            use chrono::Datelike;
            chrono::Local::now().year()
        })
    }
}

impl std::fmt::Debug for MemoryPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPage")
            .field("nodes", &self.tree.borrow().nodes.len())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

/// Shared handle, as features expect
pub fn page(html: &str) -> Rc<MemoryPage> {
    Rc::new(MemoryPage::new(html))
}

// crates/folio-core/src/include/mod.rs
// Include loader: resolve [data-include] placeholders into live content

mod source;
mod tokens;

pub use source::{FragmentSource, resolve_source};
pub use tokens::{escape_html, substitute_tokens};

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use futures::future::join_all;
use log::{debug, info, warn};

use crate::config::IncludeConfig;
use crate::error::IncludeError;
use crate::features::year::stamp_year;
use crate::host::{PageHost, Query, Timer, with_timeout};
use crate::rebind::{BindKey, BindRegistry};
use crate::signal::CompletionSignal;

/// Document event fired once every placeholder is ready
pub const INCLUDES_LOADED_EVENT: &str = "includes:loaded";

pub const LOADING_CLASS: &str = "include-loading";
pub const READY_CLASS: &str = "include-ready";
pub const FAILED_CLASS: &str = "include-failed";
pub const STATE_ATTRIBUTE: &str = "data-include-state";

/// Placeholder lifecycle: pending -> loading -> {injected | failed} -> ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderState {
    Pending,
    Loading,
    Injected,
    Failed,
    Ready,
}

impl PlaceholderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderState::Pending => "pending",
            PlaceholderState::Loading => "loading",
            PlaceholderState::Injected => "injected",
            PlaceholderState::Failed => "failed",
            PlaceholderState::Ready => "ready",
        }
    }
}

impl fmt::Display for PlaceholderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered placeholder element and its fragment source
#[derive(Debug, Clone)]
pub struct Placeholder<N> {
    pub node: N,
    pub src: String,
}

#[derive(Debug, Clone)]
pub struct PlaceholderOutcome {
    pub src: String,
    pub result: Result<(), IncludeError>,
}

/// Result of one loader pass
#[derive(Debug, Clone, Default)]
pub struct IncludeReport {
    pub outcomes: Vec<PlaceholderOutcome>,
}

impl IncludeReport {
    pub fn injected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &IncludeError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }
}

pub struct IncludeLoader<H: PageHost, S, T> {
    host: Rc<H>,
    source: S,
    timer: T,
    config: IncludeConfig,
    claimed: BindRegistry,
    signal: CompletionSignal,
    started: Cell<bool>,
}

impl<H, S, T> IncludeLoader<H, S, T>
where
    H: PageHost,
    S: FragmentSource,
    T: Timer,
{
    pub fn new(host: Rc<H>, source: S, timer: T, config: IncludeConfig) -> Self {
        Self {
            host,
            source,
            timer,
            config,
            claimed: BindRegistry::new("include"),
            signal: CompletionSignal::new(),
            started: Cell::new(false),
        }
    }

    /// Handle to the completion signal; subscribe before calling `run`
    pub fn completion(&self) -> CompletionSignal {
        self.signal.clone()
    }

    /// Register a hook that runs after every placeholder is ready
    pub fn on_complete(&self, hook: impl FnOnce() + 'static) {
        self.signal.subscribe(hook);
    }

    /// Placeholders not yet claimed by an earlier pass
    pub fn discover(&self) -> Vec<Placeholder<H::Node>> {
        let document = self.host.document();
        self.host
            .query_all(&document, &Query::Attr(&self.config.attribute))
            .into_iter()
            .filter(|node| self.claimed.claim(BindKey::Node(self.host.key(node))))
            .map(|node| {
                let src = self
                    .host
                    .attribute(&node, &self.config.attribute)
                    .unwrap_or_default();
                self.mark(&node, PlaceholderState::Pending);
                Placeholder { node, src }
            })
            .collect()
    }

    /// Fetch every placeholder concurrently, wait for all of them, then
    /// announce completion. Only the first pass raises the signal, even
    /// when a later pass overlaps it and settles sooner.
    pub async fn run(&self) -> IncludeReport {
        let first = !self.started.replace(true);
        let placeholders = self.discover();
        info!("Resolving {} include placeholder(s)", placeholders.len());

        let outcomes = join_all(placeholders.iter().map(|p| self.resolve(p))).await;
        let report = IncludeReport { outcomes };

        if first && !self.signal.is_raised() {
            if let Err(e) = self.host.dispatch(INCLUDES_LOADED_EVENT) {
                warn!("Failed to dispatch {}: {}", INCLUDES_LOADED_EVENT, e);
            }
            self.signal.raise();
        }

        debug!(
            "Includes settled: {} injected, {} failed",
            report.injected(),
            report.outcomes.len() - report.injected()
        );
        report
    }

    async fn resolve(&self, placeholder: &Placeholder<H::Node>) -> PlaceholderOutcome {
        let node = &placeholder.node;
        self.mark(node, PlaceholderState::Loading);

        let result = self.load(placeholder).await;
        match &result {
            Ok(()) => self.mark(node, PlaceholderState::Injected),
            Err(e) => {
                warn!("Include failed: {}", e);
                self.mark(node, PlaceholderState::Failed);
            }
        }
        self.mark(node, PlaceholderState::Ready);

        PlaceholderOutcome {
            src: placeholder.src.clone(),
            result,
        }
    }

    async fn load(&self, placeholder: &Placeholder<H::Node>) -> Result<(), IncludeError> {
        let src = &placeholder.src;
        let url = resolve_source(&self.host.base_url(), src, &self.config.allowed_origins)?;

        let fetched = match self.config.timeout() {
            Some(after) => with_timeout(&self.timer, after, self.source.fetch_text(url.as_str()))
                .await
                .map_err(|_| IncludeError::Timeout {
                    src: src.clone(),
                    after,
                })?,
            None => self.source.fetch_text(url.as_str()).await,
        };
        let text = fetched.map_err(|source| IncludeError::Fetch {
            src: src.clone(),
            source,
        })?;

        let html = substitute_tokens(&text, &self.token_values(&placeholder.node));
        let inject_err = |e: crate::FolioError| IncludeError::Inject {
            src: src.clone(),
            reason: e.to_string(),
        };

        self.host
            .set_inner_html(&placeholder.node, &html)
            .map_err(inject_err)?;
        reactivate_scripts(&*self.host, &placeholder.node).map_err(inject_err)?;
        stamp_year(&*self.host, &placeholder.node);
        Ok(())
    }

    /// Placeholder `data-<name>` overrides, otherwise configured defaults
    fn token_values(&self, node: &H::Node) -> BTreeMap<String, String> {
        self.config
            .tokens
            .iter()
            .map(|(name, default)| {
                let value = self
                    .host
                    .attribute(node, &format!("data-{}", name))
                    .unwrap_or_else(|| default.clone());
                (name.clone(), value)
            })
            .collect()
    }

    fn mark(&self, node: &H::Node, state: PlaceholderState) {
        let host = &*self.host;
        let applied = host
            .set_attribute(node, STATE_ATTRIBUTE, state.as_str())
            .and_then(|_| match state {
                PlaceholderState::Loading => host.add_class(node, LOADING_CLASS),
                PlaceholderState::Failed => host.add_class(node, FAILED_CLASS),
                PlaceholderState::Ready => host
                    .remove_class(node, LOADING_CLASS)
                    .and_then(|_| host.add_class(node, READY_CLASS)),
                PlaceholderState::Pending | PlaceholderState::Injected => Ok(()),
            });
        if let Err(e) = applied {
            debug!("Could not mark placeholder {}: {}", state, e);
        }
    }
}

/// Markup assigned as HTML does not execute its scripts. Rebuild each
/// `<script>` under `scope` with the same attributes and text and swap it
/// in place of the inert copy.
pub fn reactivate_scripts<H: PageHost>(host: &H, scope: &H::Node) -> crate::Result<usize> {
    let scripts = host.query_all(scope, &Query::Tag("script"));
    for inert in &scripts {
        let fresh = host.create_element("script")?;
        for (name, value) in host.attributes(inert) {
            host.set_attribute(&fresh, &name, &value)?;
        }
        let code = host.text(inert);
        if !code.is_empty() {
            host.set_text(&fresh, &code);
        }
        host.replace(inert, &fresh)?;
    }
    Ok(scripts.len())
}

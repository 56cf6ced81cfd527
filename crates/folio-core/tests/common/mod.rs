// crates/folio-core/tests/common/mod.rs
// Shared fixtures: tokio-backed timer and a scripted fragment source

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::FetchError;
use folio_core::contact::{ContactReply, ContactTransport};
use folio_core::host::Timer;
use folio_core::include::FragmentSource;
use futures::future::LocalBoxFuture;

pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[derive(Clone)]
struct Route {
    delay: Duration,
    response: Result<String, FetchError>,
}

/// Fragment source answering from a fixed route table after a delay.
/// Clones share the request log.
#[derive(Clone, Default)]
pub struct Fragments {
    routes: HashMap<String, Route>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, path: &str, delay_ms: u64, body: &str) -> Self {
        self.routes.insert(
            url(path),
            Route {
                delay: Duration::from_millis(delay_ms),
                response: Ok(body.to_string()),
            },
        );
        self
    }

    pub fn status(mut self, path: &str, delay_ms: u64, status: u16) -> Self {
        self.routes.insert(
            url(path),
            Route {
                delay: Duration::from_millis(delay_ms),
                response: Err(FetchError::Status(status)),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

pub fn url(path: &str) -> String {
    format!("https://folio.test{}", path)
}

#[async_trait(?Send)]
impl FragmentSource for Fragments {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        let Some(route) = self.routes.get(url).cloned() else {
            return Err(FetchError::Status(404));
        };
        tokio::time::sleep(route.delay).await;
        route.response
    }
}

/// Contact transport that records requests and answers after a delay
#[derive(Clone)]
pub struct Mailbox {
    pub delay: Duration,
    pub status: u16,
    pub body: String,
    pub sent: Rc<RefCell<Vec<String>>>,
}

impl Mailbox {
    pub fn accepting() -> Self {
        Self {
            delay: Duration::from_millis(20),
            status: 200,
            body: String::new(),
            sent: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

#[async_trait(?Send)]
impl ContactTransport for Mailbox {
    async fn post_json(&self, _path: &str, body: String) -> Result<ContactReply, FetchError> {
        self.sent.borrow_mut().push(body);
        tokio::time::sleep(self.delay).await;
        Ok(ContactReply {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

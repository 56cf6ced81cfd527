// crates/folio-app/src/net.rs
// Fragment fetching, contact posting and timers over gloo

use std::time::Duration;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use web_sys::AbortController;

use folio_core::FetchError;
use folio_core::contact::{ContactReply, ContactTransport};
use folio_core::host::Timer;
use folio_core::include::FragmentSource;

fn network(e: impl std::fmt::Debug) -> FetchError {
    FetchError::Network(format!("{:?}", e))
}

/// GETs fragments with the browser fetch API
pub struct GlooFragments;

#[async_trait(?Send)]
impl FragmentSource for GlooFragments {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = Request::get(url).send().await.map_err(network)?;
        if !resp.ok() {
            return Err(FetchError::Status(resp.status()));
        }
        resp.text().await.map_err(network)
    }
}

/// Aborts the in-flight request when the owning future is dropped
struct AbortOnDrop(AbortController);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// POSTs contact messages as JSON
pub struct GlooContact;

#[async_trait(?Send)]
impl ContactTransport for GlooContact {
    async fn post_json(&self, path: &str, body: String) -> Result<ContactReply, FetchError> {
        let controller = AbortController::new().map_err(network)?;
        let signal = controller.signal();
        let _guard = AbortOnDrop(controller);

        let resp = Request::post(path)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .abort_signal(Some(&signal))
            .body(body)
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;

        let status = resp.status();
        // An unreadable error body still carries its status
        let body = resp.text().await.unwrap_or_default();
        Ok(ContactReply { status, body })
    }
}

/// setTimeout takes a signed 32-bit delay; anything larger wraps and fires at once
pub(crate) fn timeout_millis(duration: Duration) -> u32 {
    const MAX_DELAY: u128 = i32::MAX as u128;
    duration.as_millis().min(MAX_DELAY) as u32
}

pub struct GlooTimer;

impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(TimeoutFuture::new(timeout_millis(duration)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_clamped() {
        assert_eq!(timeout_millis(Duration::from_millis(250)), 250);
        assert_eq!(timeout_millis(Duration::from_millis(i32::MAX as u64)), i32::MAX as u32);
        assert_eq!(timeout_millis(Duration::from_millis(u32::MAX as u64)), i32::MAX as u32);
        assert_eq!(timeout_millis(Duration::from_secs(u64::MAX / 1000)), i32::MAX as u32);
    }
}

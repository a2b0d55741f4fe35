//! Core Hock registrar: the expectation pool, routing and verification.

use super::types::HockError;
use crate::expectation::{
    Expectation, ExpectationOptions, ExpectationSnapshot, ExpectedBody, IncomingRequest,
    Registrar, RequestFilters, StubBuilder,
};
use crate::response::ResponseSink;
use bytes::Bytes;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Body sent when no expectation matches a request.
pub const NO_MATCH_BODY: &str = "No Matching Response!\n";

type SharedExpectation = Arc<Mutex<Expectation>>;

/// HTTP test double.
///
/// Declare expectations with [`get`](Hock::get), [`post`](Hock::post) and
/// friends, serve traffic with [`listen`](Hock::listen) (or feed requests to
/// [`respond`](Hock::respond) directly), then call [`done`](Hock::done) to
/// verify every expectation was met.
///
/// `Hock` is a cheap handle; clones share the same pool.
#[derive(Clone, Default)]
pub struct Hock {
    inner: Arc<HockState>,
}

#[derive(Default)]
struct HockState {
    /// Expectations still eligible for matching, in declaration order
    pending: RwLock<Vec<SharedExpectation>>,
    /// Expectations removed after reaching their maximum
    retired: RwLock<Vec<SharedExpectation>>,
    filters: RwLock<RequestFilters>,
    default_reply_headers: RwLock<HashMap<String, String>>,
}

impl Hock {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Declaration =====

    /// Declare an expectation with full options.
    pub fn request(&self, options: ExpectationOptions) -> StubBuilder<'_, Self> {
        StubBuilder::new(self, options)
    }

    pub fn get(&self, url: impl Into<String>) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("GET", url))
    }

    pub fn delete(&self, url: impl Into<String>) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("DELETE", url))
    }

    pub fn head(&self, url: impl Into<String>) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("HEAD", url))
    }

    pub fn copy(&self, url: impl Into<String>) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("COPY", url))
    }

    pub fn options(&self, url: impl Into<String>) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("OPTIONS", url))
    }

    pub fn post(
        &self,
        url: impl Into<String>,
        body: impl Into<ExpectedBody>,
    ) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("POST", url).with_body(body))
    }

    pub fn put(
        &self,
        url: impl Into<String>,
        body: impl Into<ExpectedBody>,
    ) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("PUT", url).with_body(body))
    }

    pub fn patch(
        &self,
        url: impl Into<String>,
        body: impl Into<ExpectedBody>,
    ) -> StubBuilder<'_, Self> {
        self.request(ExpectationOptions::new("PATCH", url).with_body(body))
    }

    // ===== Filters & defaults =====

    /// Rewrite incoming urls before matching.
    pub fn filtering_path<F>(&self, filter: F) -> &Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.inner.filters.write().path = Some(Arc::new(filter));
        self
    }

    /// Rewrite incoming urls by replacing every match of `pattern`.
    pub fn filtering_path_regex(&self, pattern: Regex, replacement: impl Into<String>) -> &Self {
        let replacement = replacement.into();
        self.filtering_path(move |url| {
            pattern
                .replace_all(url, replacement.as_str())
                .into_owned()
        })
    }

    /// Rewrite incoming bodies before matching (all methods but GET/DELETE).
    pub fn filtering_request_body<F>(&self, filter: F) -> &Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.inner.filters.write().body = Some(Arc::new(filter));
        self
    }

    /// Headers sent by replies declared after this call without own headers.
    pub fn set_default_reply_headers<K, V>(
        &self,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> &Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        *self.inner.default_reply_headers.write() = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    // ===== Routing =====

    /// Route `request` to the first matching expectation and write its reply.
    ///
    /// Returns `Ok(false)` when nothing matched; a 500 is written in that case.
    /// An expectation that reaches its maximum is retired from matching.
    pub async fn respond(
        &self,
        mut request: IncomingRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<bool, HockError> {
        let filters = self.filters();
        let candidates: Vec<SharedExpectation> = self.inner.pending.read().clone();

        for candidate in candidates {
            let mut expectation = candidate.lock().await;
            // Retired by a delivery that held the lock before us
            if expectation.should_prune() {
                continue;
            }

            match expectation.is_match(&mut request, &filters) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!("Match fault on {} {}: {}", request.method, request.url, e);
                    write_plain(sink, 500, &e.to_string()).await?;
                    return Err(e.into());
                }
            }

            debug!("Matched {} {}", request.method, request.url);
            let outcome = expectation.send_response(sink).await;
            let prune = expectation.should_prune();
            drop(expectation);

            if prune {
                self.retire(&candidate);
            }
            if let Err(e) = &outcome {
                error!(
                    "Delivery failed for {} {}: {}",
                    request.method, request.url, e
                );
            }
            outcome?;
            return Ok(true);
        }

        warn!("No matching expectation for {} {}", request.method, request.url);
        write_plain(sink, 500, NO_MATCH_BODY).await?;
        Ok(false)
    }

    fn retire(&self, candidate: &SharedExpectation) {
        let mut pending = self.inner.pending.write();
        let before = pending.len();
        pending.retain(|e| !Arc::ptr_eq(e, candidate));
        if pending.len() != before {
            self.inner.retired.write().push(Arc::clone(candidate));
            debug!("Retired expectation ({} pending)", pending.len());
        }
    }

    // ===== Inspection & verification =====

    /// Whether a pending expectation was declared with exactly these
    /// attributes. Bodies are compared as plain text.
    pub async fn has_route(
        &self,
        method: &str,
        url: &str,
        body: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> bool {
        let body = body.unwrap_or("");
        let headers: HashMap<String, String> = headers
            .map(|h| h.iter().map(|(k, v)| (k.to_lowercase(), v.clone())).collect())
            .unwrap_or_default();

        let candidates: Vec<SharedExpectation> = self.inner.pending.read().clone();
        for candidate in candidates {
            let expectation = candidate.lock().await;
            if expectation.method() == method
                && expectation.url() == url
                && expectation.body().as_str() == body
                && expectation.headers() == &headers
            {
                return true;
            }
        }
        false
    }

    /// Snapshots of the expectations still eligible for matching.
    pub async fn pending(&self) -> Vec<ExpectationSnapshot> {
        let candidates: Vec<SharedExpectation> = self.inner.pending.read().clone();
        let mut snapshots = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            snapshots.push(candidate.lock().await.to_json());
        }
        snapshots
    }

    /// Verify every declared expectation met its occurrence bounds.
    ///
    /// Retired expectations are checked too: one can reach its maximum
    /// without ever reaching its minimum.
    pub async fn done(&self) -> Result<(), HockError> {
        let all: Vec<SharedExpectation> = {
            let pending = self.inner.pending.read();
            let retired = self.inner.retired.read();
            pending.iter().chain(retired.iter()).cloned().collect()
        };

        let mut unsatisfied = Vec::new();
        for candidate in all {
            let expectation = candidate.lock().await;
            if expectation.is_done() {
                unsatisfied.push(expectation.to_json());
            }
        }

        if unsatisfied.is_empty() {
            Ok(())
        } else {
            Err(HockError::Unsatisfied(unsatisfied))
        }
    }

    /// Drop every expectation, pending and retired.
    pub fn clear(&self) {
        self.inner.pending.write().clear();
        self.inner.retired.write().clear();
    }
}

impl Registrar for Hock {
    fn enqueue(&self, expectation: Expectation) {
        debug!(
            "Enqueued {} {} (min={}, max={})",
            expectation.method(),
            expectation.url(),
            expectation.min_requests(),
            expectation.max_requests()
        );
        self.inner
            .pending
            .write()
            .push(Arc::new(Mutex::new(expectation)));
    }

    fn default_reply_headers(&self) -> HashMap<String, String> {
        self.inner.default_reply_headers.read().clone()
    }

    fn filters(&self) -> RequestFilters {
        self.inner.filters.read().clone()
    }
}

async fn write_plain(
    sink: &mut dyn ResponseSink,
    status: u16,
    body: &str,
) -> Result<(), HockError> {
    let headers: HashMap<String, String> =
        [("content-type".to_string(), "text/plain".to_string())]
            .into_iter()
            .collect();
    sink.write_head(status, &headers).await?;
    sink.end(Some(Bytes::from(body.to_string()))).await?;
    Ok(())
}

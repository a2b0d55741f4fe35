//! Core Expectation struct: construction, multiplicity and lifecycle.

use super::reply::Reply;
use super::types::{
    ExpectationOptions, ExpectationSnapshot, ExpectationStats, ExpectedBody, Many, UNBOUNDED,
};
use std::collections::HashMap;

/// A single declared request/response stub.
///
/// Holds the match criteria (method, url, body, headers), the reply to send,
/// and the multiplicity counters. The registrar owning the expectation is the
/// only writer of `count`.
pub struct Expectation {
    pub(super) method: String,
    pub(super) url: String,
    pub(super) body: ExpectedBody,
    pub(super) headers: HashMap<String, String>,
    pub(super) reply: Reply,
    pub(super) default_reply_headers: HashMap<String, String>,
    pub(super) min_requests: usize,
    pub(super) max_requests: usize,
    pub(super) count: usize,
}

impl Expectation {
    /// Create an expectation with the default multiplicity of exactly once.
    pub fn new(options: ExpectationOptions) -> Self {
        let mut expectation = Self {
            method: options
                .method
                .map(|m| m.to_uppercase())
                .unwrap_or_else(|| "GET".to_string()),
            url: options.url,
            body: options.body.unwrap_or_default(),
            headers: HashMap::with_capacity(options.headers.len()),
            reply: Reply::default(),
            default_reply_headers: HashMap::new(),
            min_requests: 1,
            max_requests: 1,
            count: 0,
        };
        // Already lower-case names first, so a mixed-case duplicate wins
        let (lower, mut mixed): (Vec<_>, Vec<_>) = options
            .headers
            .into_iter()
            .partition(|(name, _)| name.chars().all(|c| !c.is_uppercase()));
        mixed.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in lower.into_iter().chain(mixed) {
            expectation.header(name, value);
        }
        expectation
    }

    /// Add an expected header. The name is stored lower-cased, replacing any
    /// previous value under the same lower-cased name.
    pub fn header(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> &mut Self {
        self.headers
            .insert(name.as_ref().to_lowercase(), value.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &ExpectedBody {
        &self.body
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn reply(&self) -> &Reply {
        &self.reply
    }

    /// Attach the reply sent on every match.
    pub fn set_reply(&mut self, reply: Reply) -> &mut Self {
        self.reply = reply;
        self
    }

    /// Headers sent when the reply carries none of its own.
    pub fn set_default_reply_headers(&mut self, headers: HashMap<String, String>) -> &mut Self {
        self.default_reply_headers = headers;
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn min_requests(&self) -> usize {
        self.min_requests
    }

    /// Upper bound, [`UNBOUNDED`] when unlimited.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Upper bound for log output.
    pub(super) fn max_label(&self) -> String {
        if self.max_requests == UNBOUNDED {
            "unbounded".to_string()
        } else {
            self.max_requests.to_string()
        }
    }

    // ===== Multiplicity =====

    /// Allow the expectation to match several times.
    ///
    /// With `None`, the bounds become at least once and unbounded. A given
    /// `min` raises `max` when it would exceed it; a given `max` is applied
    /// as-is, even below `min`.
    pub fn many(&mut self, options: impl Into<Option<Many>>) -> &mut Self {
        let options = options
            .into()
            .unwrap_or_else(|| Many::new(1, UNBOUNDED));

        if let Some(min) = options.min {
            self.min_requests = min;
            if self.min_requests > self.max_requests {
                self.max_requests = self.min_requests;
            }
        }

        if let Some(max) = options.max {
            self.max_requests = max;
        }

        self
    }

    pub fn min(&mut self, n: usize) -> &mut Self {
        self.many(Many::min(n))
    }

    pub fn max(&mut self, n: usize) -> &mut Self {
        self.many(Many::max(n))
    }

    pub fn once(&mut self) -> &mut Self {
        self.many(Many::new(1, 1))
    }

    pub fn twice(&mut self) -> &mut Self {
        self.many(Many::new(1, 2))
    }

    pub fn any(&mut self) -> &mut Self {
        self.many(Many::new(0, UNBOUNDED))
    }

    // ===== Lifecycle =====

    /// True when the occurrence contract is NOT met, i.e. `count` lies
    /// outside `[min, max]`.
    ///
    /// A verifier checking that every expectation is satisfied asserts this
    /// is false for all of them.
    pub fn is_done(&self) -> bool {
        !(self.count >= self.min_requests && self.count <= self.max_requests)
    }

    /// True once `count` reached `max`; the registrar retires the expectation.
    pub fn should_prune(&self) -> bool {
        self.count >= self.max_requests
    }

    /// Live snapshot of the criteria and counters.
    pub fn to_json(&self) -> ExpectationSnapshot {
        ExpectationSnapshot {
            method: self.method.clone(),
            url: self.url.clone(),
            body: self.body.as_str().to_string(),
            headers: self.headers.clone(),
            stats: ExpectationStats {
                count: self.count,
                min: self.min_requests,
                max: (self.max_requests != UNBOUNDED).then_some(self.max_requests),
                is_done: self.is_done(),
                should_prune: self.should_prune(),
            },
        }
    }
}

impl std::fmt::Debug for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expectation")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("reply", &self.reply)
            .field("min_requests", &self.min_requests)
            .field("max_requests", &self.max_requests)
            .field("count", &self.count)
            .finish()
    }
}

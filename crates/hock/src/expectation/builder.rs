//! Fluent declaration of expectations.
//!
//! A [`StubBuilder`] wraps an expectation under construction together with the
//! registrar that will own it. Multiplicity calls return the builder so they
//! can be chained; the terminal `reply*` calls hand the expectation to the
//! registrar and return the registrar, ready for the next declaration.

use super::core::Expectation;
use super::reply::{Reply, ReplyBody};
use super::types::{ExpectationOptions, ExpectedBody, Many, RequestFilters};
use std::collections::HashMap;
use std::path::PathBuf;

/// Owner of a pool of expectations.
pub trait Registrar {
    /// Take ownership of a fully declared expectation.
    fn enqueue(&self, expectation: Expectation);

    /// Headers for replies declared without their own.
    fn default_reply_headers(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Hooks applied to incoming requests at match time.
    fn filters(&self) -> RequestFilters {
        RequestFilters::default()
    }
}

/// An expectation being declared against a registrar.
#[must_use = "an expectation is only registered once a reply is attached"]
pub struct StubBuilder<'a, R: Registrar + ?Sized> {
    registrar: &'a R,
    expectation: Expectation,
}

impl<'a, R: Registrar + ?Sized> StubBuilder<'a, R> {
    pub fn new(registrar: &'a R, options: ExpectationOptions) -> Self {
        let mut expectation = Expectation::new(options);
        expectation.set_default_reply_headers(registrar.default_reply_headers());
        Self {
            registrar,
            expectation,
        }
    }

    /// Expected header (name is lower-cased).
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.expectation.header(name, value);
        self
    }

    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.expectation.header(name, value);
        }
        self
    }

    /// Expected body. Structured values are stored as JSON text.
    pub fn body(mut self, body: impl Into<ExpectedBody>) -> Self {
        self.expectation.body = body.into();
        self
    }

    pub fn many(mut self, options: impl Into<Option<Many>>) -> Self {
        self.expectation.many(options);
        self
    }

    pub fn min(mut self, n: usize) -> Self {
        self.expectation.min(n);
        self
    }

    pub fn max(mut self, n: usize) -> Self {
        self.expectation.max(n);
        self
    }

    pub fn once(mut self) -> Self {
        self.expectation.once();
        self
    }

    pub fn twice(mut self) -> Self {
        self.expectation.twice();
        self
    }

    pub fn any(mut self) -> Self {
        self.expectation.any();
        self
    }

    /// The expectation as declared so far.
    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Reply with `status` and `body`, then register the expectation.
    pub fn reply(self, status: u16, body: impl Into<ReplyBody>) -> &'a R {
        self.respond_with(Reply::new(status, body))
    }

    /// Reply with the contents of the file at `path`, opened on first delivery.
    pub fn reply_with_file(self, status: u16, path: impl Into<PathBuf>) -> &'a R {
        self.respond_with(Reply::file(status, path))
    }

    /// Attach a fully built reply and register the expectation.
    pub fn respond_with(mut self, reply: Reply) -> &'a R {
        self.expectation.set_reply(reply);
        self.registrar.enqueue(self.expectation);
        self.registrar
    }
}

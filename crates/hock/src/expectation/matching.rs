//! Request matching for expectations.

use super::core::Expectation;
use super::types::{
    BodySide, ExpectedBody, IncomingRequest, MatchError, RequestBody, RequestFilters,
};
use crate::predicate::{deep_equals, to_structural};
use std::borrow::Cow;
use std::collections::HashMap;

impl Expectation {
    /// Check whether `request` satisfies this expectation.
    ///
    /// The path filter, if any, rewrites `request.url` in place. GET and DELETE
    /// expectations never look at the body. For every other method the body
    /// filter, if any, is applied to a copy of the incoming body, and bodies are
    /// compared structurally before headers are checked.
    ///
    /// A body that is not valid JSON is a [`MatchError`], not a mismatch.
    pub fn is_match(
        &self,
        request: &mut IncomingRequest,
        filters: &RequestFilters,
    ) -> Result<bool, MatchError> {
        if let Some(path_filter) = &filters.path {
            request.url = path_filter(&request.url);
        }

        if self.method != request.method || self.url != request.url {
            return Ok(false);
        }
        if self.method == "GET" || self.method == "DELETE" {
            return Ok(self.headers_match(&request.headers));
        }

        // Bodies before headers: an unparsable body faults even on a header miss
        let body = match &filters.body {
            Some(body_filter) => {
                Cow::Owned(RequestBody::Text(body_filter(&request.body.to_text())))
            }
            None => Cow::Borrowed(&request.body),
        };
        Ok(bodies_match(&self.body, &body)? && self.headers_match(&request.headers))
    }

    /// One-directional containment: every non-empty expected header must be
    /// present with the identical value. Incoming keys are not normalized.
    fn headers_match(&self, incoming: &HashMap<String, String>) -> bool {
        self.headers
            .iter()
            .filter(|(_, expected)| !expected.is_empty())
            .all(|(name, expected)| incoming.get(name) == Some(expected))
    }
}

fn bodies_match(expected: &ExpectedBody, incoming: &RequestBody) -> Result<bool, MatchError> {
    let ExpectedBody::Literal(expected_text) = expected else {
        return Ok(true);
    };

    let expected = to_structural(expected_text).map_err(|source| MatchError::InvalidJson {
        side: BodySide::Expected,
        source,
    })?;
    let actual = match incoming {
        RequestBody::Text(text) => {
            Cow::Owned(to_structural(text).map_err(|source| MatchError::InvalidJson {
                side: BodySide::Incoming,
                source,
            })?)
        }
        RequestBody::Json(value) => Cow::Borrowed(value),
    };

    Ok(deep_equals(&actual, &expected))
}

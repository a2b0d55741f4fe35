//! Stub entries of a fixture.

use crate::expectation::UNBOUNDED;
use crate::hock::HockError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}

/// One declared expectation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StubFixture {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    /// Expected body: `"*"`, a string, or a structured value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<MaxRequests>,
    #[serde(default)]
    pub reply: ReplyFixture,
}

/// Upper bound of a stub: a count, or `unbounded`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MaxRequests {
    Count(usize),
    Named(String),
}

impl MaxRequests {
    pub fn resolve(&self) -> Result<usize, HockError> {
        match self {
            MaxRequests::Count(n) => Ok(*n),
            MaxRequests::Named(name)
                if name.eq_ignore_ascii_case("unbounded")
                    || name.eq_ignore_ascii_case("infinity") =>
            {
                Ok(UNBOUNDED)
            }
            MaxRequests::Named(name) => Err(HockError::Config(format!(
                "max must be a number or \"unbounded\", got \"{name}\""
            ))),
        }
    }
}

/// Reply of a stub. `file` takes precedence over `body`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyFixture {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for ReplyFixture {
    fn default() -> Self {
        Self {
            status: default_status(),
            body: None,
            headers: None,
            file: None,
        }
    }
}

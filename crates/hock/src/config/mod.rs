//! Fixture configuration for Hock.
//!
//! A fixture declares listener settings and a list of stubs, so a Hock can be
//! started from a file instead of code. Fixtures are YAML; JSON documents are
//! accepted as well since JSON is valid YAML.
//!
//! ```yaml
//! port: 7000
//! defaultReplyHeaders:
//!   content-type: application/json
//! stubs:
//!   - url: /relationships
//!     max: unbounded
//!     reply:
//!       status: 200
//!       body: { hello: hello }
//!   - method: POST
//!     url: /messaging
//!     body: "*"
//!     reply:
//!       body: { data: { hello: true } }
//! ```

mod stub;

use crate::hock::HockError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use stub::{MaxRequests, ReplyFixture, StubFixture};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HockConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Headers for replies that declare none
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub default_reply_headers: HashMap<String, String>,
    #[serde(default)]
    pub stubs: Vec<StubFixture>,
    /// Directory relative reply files resolve against (set by `from_file`)
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for HockConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_reply_headers: HashMap::new(),
            stubs: Vec::new(),
            base_dir: None,
        }
    }
}

impl HockConfig {
    /// Parse a fixture document.
    pub fn from_yaml_str(content: &str) -> Result<Self, HockError> {
        serde_yaml::from_str(content).map_err(|e| HockError::Config(e.to_string()))
    }

    /// Load a fixture file. Relative reply files resolve against its directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HockError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| HockError::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_yaml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Resolve a reply file path against `base_dir`.
    pub fn resolve_path(&self, file: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if file.is_relative() => base.join(file),
            _ => file.to_path_buf(),
        }
    }
}

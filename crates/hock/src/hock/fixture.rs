//! Building a Hock from a fixture configuration.

use super::core::Hock;
use super::types::HockError;
use crate::config::{HockConfig, StubFixture};
use crate::expectation::{ExpectationOptions, Reply, ReplyBody};
use tracing::info;

impl Hock {
    /// Create a Hock with every stub of `config` declared, in order.
    pub fn with_config(config: &HockConfig) -> Result<Hock, HockError> {
        let hock = Hock::new();
        hock.set_default_reply_headers(config.default_reply_headers.clone());
        for stub in &config.stubs {
            hock.declare_fixture(config, stub)?;
        }
        info!("Loaded {} stub(s) from fixture", config.stubs.len());
        Ok(hock)
    }

    fn declare_fixture(&self, config: &HockConfig, stub: &StubFixture) -> Result<(), HockError> {
        let mut options = ExpectationOptions::new(stub.method.as_str(), stub.url.as_str());
        options.headers = stub.headers.clone();
        if let Some(body) = &stub.body {
            options = options.with_body(body.clone());
        }

        let mut builder = self.request(options);
        if let Some(min) = stub.min {
            builder = builder.min(min);
        }
        if let Some(max) = &stub.max {
            builder = builder.max(max.resolve()?);
        }

        let body = match (&stub.reply.file, &stub.reply.body) {
            (Some(file), _) => ReplyBody::file(config.resolve_path(file)),
            (None, Some(body)) => ReplyBody::from(body.clone()),
            (None, None) => ReplyBody::default(),
        };
        let mut reply = Reply::new(stub.reply.status, body);
        reply.headers = stub.reply.headers.clone();
        builder.respond_with(reply);
        Ok(())
    }
}

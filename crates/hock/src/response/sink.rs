use crate::expectation::DeliveryError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;

/// Destination of a reply.
#[async_trait]
pub trait ResponseSink: Send {
    /// Write status code and headers. Must be called once, before any body.
    async fn write_head(
        &mut self,
        status: u16,
        headers: &HashMap<String, String>,
    ) -> Result<(), DeliveryError>;

    /// Write one body chunk.
    async fn write(&mut self, chunk: Bytes) -> Result<(), DeliveryError>;

    /// Finish the response, optionally with a last body chunk.
    async fn end(&mut self, body: Option<Bytes>) -> Result<(), DeliveryError>;
}

/// In-memory sink that records the whole response.
#[derive(Debug, Default, Clone)]
pub struct BufferedSink {
    status: Option<u16>,
    headers: HashMap<String, String>,
    body: BytesMut,
    chunks: usize,
    ended: bool,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8 (lossy).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Number of non-empty writes, including the final `end` chunk.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), DeliveryError> {
        if self.ended {
            return Err(DeliveryError::Ended);
        }
        if !chunk.is_empty() {
            self.body.extend_from_slice(chunk);
            self.chunks += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseSink for BufferedSink {
    async fn write_head(
        &mut self,
        status: u16,
        headers: &HashMap<String, String>,
    ) -> Result<(), DeliveryError> {
        if self.status.is_some() {
            return Err(DeliveryError::HeadAlreadyWritten);
        }
        self.status = Some(status);
        self.headers = headers.clone();
        Ok(())
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), DeliveryError> {
        self.push(&chunk)
    }

    async fn end(&mut self, body: Option<Bytes>) -> Result<(), DeliveryError> {
        if let Some(chunk) = body {
            self.push(&chunk)?;
        }
        if self.ended {
            return Err(DeliveryError::Ended);
        }
        self.ended = true;
        Ok(())
    }
}

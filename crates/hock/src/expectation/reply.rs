//! Reply definition and delivery.
//!
//! A reply body is text, binary, a structured value, or a byte stream. Streams
//! can only be read once, so a stream reply that may be delivered more than
//! once is captured into a [`ReplayBuffer`] during its first delivery.

use super::core::Expectation;
use super::types::DeliveryError;
use crate::response::ResponseSink;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Single-use byte source.
pub type BoxedSource = Box<dyn AsyncRead + Send + Unpin>;

/// Where a streaming body comes from.
pub enum StreamSource {
    Reader(BoxedSource),
    /// Opened lazily, on first delivery.
    File(PathBuf),
}

/// Streaming body state.
///
/// Starts `Unconsumed` and moves to `Buffered` exactly once, when the first
/// delivery finishes reading the source. Every later delivery writes the
/// buffered bytes.
pub enum ReplayBuffer {
    Unconsumed(StreamSource),
    Buffered(Bytes),
}

impl ReplayBuffer {
    pub fn is_buffered(&self) -> bool {
        matches!(self, ReplayBuffer::Buffered(_))
    }

    /// Write the stream to `sink`. With `replay`, keep a copy of every chunk
    /// and switch to `Buffered` at end of stream.
    async fn deliver(
        &mut self,
        replay: bool,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), DeliveryError> {
        let source = match std::mem::replace(self, ReplayBuffer::Buffered(Bytes::new())) {
            ReplayBuffer::Buffered(bytes) => {
                *self = ReplayBuffer::Buffered(bytes.clone());
                return sink.end(Some(bytes)).await;
            }
            ReplayBuffer::Unconsumed(source) => source,
        };

        let reader: BoxedSource = match source {
            StreamSource::Reader(reader) => reader,
            StreamSource::File(path) => match tokio::fs::File::open(&path).await {
                Ok(file) => Box::new(file),
                Err(source) => {
                    *self = ReplayBuffer::Unconsumed(StreamSource::File(path.clone()));
                    return Err(DeliveryError::OpenFile { path, source });
                }
            },
        };
        let mut chunks = ReaderStream::new(reader);

        if !replay {
            while let Some(chunk) = chunks.next().await {
                sink.write(chunk?).await?;
            }
            return sink.end(None).await;
        }

        // Keep reading after a sink failure so the buffer is complete
        let mut buffered = BytesMut::new();
        let mut write_error = None;
        let outcome = loop {
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    buffered.extend_from_slice(&chunk);
                    if write_error.is_none() {
                        if let Err(e) = sink.write(chunk).await {
                            write_error = Some(e);
                        }
                    }
                }
                Some(Err(e)) => break Err(DeliveryError::from(e)),
                None => break Ok(()),
            }
        };

        debug!("Buffered {} byte stream reply for replay", buffered.len());
        *self = ReplayBuffer::Buffered(buffered.freeze());

        outcome?;
        if let Some(e) = write_error {
            return Err(e);
        }
        sink.end(None).await
    }
}

/// Body of a reply.
pub enum ReplyBody {
    Text(String),
    Binary(Bytes),
    /// Serialized to JSON text when written
    Json(serde_json::Value),
    Stream(ReplayBuffer),
}

impl ReplyBody {
    /// Stream body read from `reader`.
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        ReplyBody::Stream(ReplayBuffer::Unconsumed(StreamSource::Reader(Box::new(
            reader,
        ))))
    }

    /// Stream body read from the file at `path`, opened on first delivery.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ReplyBody::Stream(ReplayBuffer::Unconsumed(StreamSource::File(path.into())))
    }
}

impl Default for ReplyBody {
    fn default() -> Self {
        ReplyBody::Text(String::new())
    }
}

impl From<&str> for ReplyBody {
    fn from(text: &str) -> Self {
        ReplyBody::Text(text.to_string())
    }
}

impl From<String> for ReplyBody {
    fn from(text: String) -> Self {
        ReplyBody::Text(text)
    }
}

impl From<Bytes> for ReplyBody {
    fn from(bytes: Bytes) -> Self {
        ReplyBody::Binary(bytes)
    }
}

impl From<Vec<u8>> for ReplyBody {
    fn from(bytes: Vec<u8>) -> Self {
        ReplyBody::Binary(Bytes::from(bytes))
    }
}

impl From<serde_json::Value> for ReplyBody {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ReplyBody::default(),
            serde_json::Value::String(text) => ReplyBody::Text(text),
            other => ReplyBody::Json(other),
        }
    }
}

impl fmt::Debug for ReplyBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyBody::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ReplyBody::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
            ReplyBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            ReplyBody::Stream(ReplayBuffer::Unconsumed(StreamSource::File(path))) => {
                f.debug_tuple("File").field(path).finish()
            }
            ReplyBody::Stream(ReplayBuffer::Unconsumed(StreamSource::Reader(_))) => {
                f.write_str("Stream(<unconsumed>)")
            }
            ReplyBody::Stream(ReplayBuffer::Buffered(bytes)) => {
                f.debug_tuple("Buffered").field(&bytes.len()).finish()
            }
        }
    }
}

/// Canned response of an expectation.
#[derive(Debug)]
pub struct Reply {
    pub status_code: u16,
    pub body: ReplyBody,
    /// When `None`, the expectation's default reply headers are sent.
    pub headers: Option<HashMap<String, String>>,
}

impl Reply {
    pub fn new(status_code: u16, body: impl Into<ReplyBody>) -> Self {
        Self {
            status_code,
            body: body.into(),
            headers: None,
        }
    }

    /// Reply streaming the contents of `path`.
    pub fn file(status_code: u16, path: impl Into<PathBuf>) -> Self {
        Self::new(status_code, ReplyBody::file(path))
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }
}

impl Default for Reply {
    fn default() -> Self {
        Self::new(200, ReplyBody::default())
    }
}

impl Expectation {
    /// Deliver the reply to `sink`.
    ///
    /// Increments `count` first, so a failed delivery still counts. Returns
    /// [`should_prune`](Expectation::should_prune) evaluated after the
    /// increment.
    pub async fn send_response(
        &mut self,
        sink: &mut dyn ResponseSink,
    ) -> Result<bool, DeliveryError> {
        self.count += 1;
        let replay = self.max_requests > 1;

        let headers = self
            .reply
            .headers
            .as_ref()
            .unwrap_or(&self.default_reply_headers);
        sink.write_head(self.reply.status_code, headers).await?;

        match &mut self.reply.body {
            ReplyBody::Stream(buffer) => buffer.deliver(replay, sink).await?,
            ReplyBody::Binary(bytes) => sink.end(Some(bytes.clone())).await?,
            ReplyBody::Json(value) => {
                let encoded = serde_json::to_vec(value)?;
                sink.end(Some(Bytes::from(encoded))).await?
            }
            ReplyBody::Text(text) => sink.end(Some(Bytes::from(text.clone()))).await?,
        }

        debug!(
            "Delivered {} {} ({}/{})",
            self.method,
            self.url,
            self.count,
            self.max_label()
        );
        Ok(self.should_prune())
    }
}

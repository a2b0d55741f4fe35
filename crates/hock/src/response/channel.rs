//! Channel-backed sink used by the HTTP listener.
//!
//! The head travels over a oneshot channel so the listener can build the
//! response as soon as it is known; body chunks travel over an unbounded
//! channel that becomes the streaming response body. Dropping the sink (or
//! calling `end`) closes the body stream.

use super::sink::ResponseSink;
use crate::expectation::DeliveryError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::{mpsc, oneshot};
use std::collections::HashMap;

/// Status and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: HashMap<String, String>,
}

/// Writing half of a response channel.
#[derive(Debug)]
pub struct ChannelSink {
    head: Option<oneshot::Sender<ResponseHead>>,
    body: Option<mpsc::UnboundedSender<Bytes>>,
}

/// Reading half of a response channel.
#[derive(Debug)]
pub struct ChannelReceiver {
    pub head: oneshot::Receiver<ResponseHead>,
    pub body: mpsc::UnboundedReceiver<Bytes>,
}

/// Create a connected sink/receiver pair.
pub fn channel() -> (ChannelSink, ChannelReceiver) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::unbounded();
    (
        ChannelSink {
            head: Some(head_tx),
            body: Some(body_tx),
        },
        ChannelReceiver {
            head: head_rx,
            body: body_rx,
        },
    )
}

impl ChannelSink {
    fn send(&mut self, chunk: Bytes) -> Result<(), DeliveryError> {
        let sender = self.body.as_ref().ok_or(DeliveryError::Ended)?;
        if chunk.is_empty() {
            return Ok(());
        }
        sender
            .unbounded_send(chunk)
            .map_err(|_| DeliveryError::Closed)
    }
}

#[async_trait]
impl ResponseSink for ChannelSink {
    async fn write_head(
        &mut self,
        status: u16,
        headers: &HashMap<String, String>,
    ) -> Result<(), DeliveryError> {
        let sender = self.head.take().ok_or(DeliveryError::HeadAlreadyWritten)?;
        sender
            .send(ResponseHead {
                status,
                headers: headers.clone(),
            })
            .map_err(|_| DeliveryError::Closed)
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), DeliveryError> {
        self.send(chunk)
    }

    async fn end(&mut self, body: Option<Bytes>) -> Result<(), DeliveryError> {
        if let Some(chunk) = body {
            self.send(chunk)?;
        }
        // Closing the sender terminates the body stream
        self.body.take().ok_or(DeliveryError::Ended)?;
        Ok(())
    }
}

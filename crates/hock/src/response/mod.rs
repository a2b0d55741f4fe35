//! Outgoing response sinks.
//!
//! An expectation writes its reply through the [`ResponseSink`] trait:
//! a head (status and headers), zero or more body chunks, then an end marker.
//! [`BufferedSink`] collects everything in memory; [`ChannelSink`] forwards it
//! to the HTTP listener, which streams the body to the client.

mod channel;
mod sink;

pub use channel::{channel, ChannelReceiver, ChannelSink, ResponseHead};
pub use sink::{BufferedSink, ResponseSink};

//! Expectations: declared request/response stubs.
//!
//! This module provides:
//! - `Expectation`: match criteria, canned reply and occurrence bounds
//! - `StubBuilder` / `Registrar`: fluent declaration against an owning pool
//! - `Reply` / `ReplyBody` / `ReplayBuffer`: what gets sent back, including
//!   stream bodies that are buffered for replay
//!
//! ## Module Structure
//!
//! - `types`: declaration inputs, incoming request shape, snapshots, errors
//! - `core`: the Expectation struct, multiplicity and lifecycle
//! - `matching`: request matching
//! - `reply`: reply bodies and delivery
//! - `builder`: registrar trait and fluent builder

mod builder;
mod core;
mod matching;
mod reply;
mod types;


pub use builder::{Registrar, StubBuilder};
pub use self::core::Expectation;
pub use reply::{BoxedSource, ReplayBuffer, Reply, ReplyBody, StreamSource};
pub use types::{
    BodyFilter, BodySide, DeliveryError, ExpectationOptions, ExpectationSnapshot,
    ExpectationStats, ExpectedBody, IncomingRequest, MatchError, Many, PathFilter, RequestBody,
    RequestFilters, UNBOUNDED, WILDCARD_BODY,
};

//! The Hock registrar and its HTTP listener.
//!
//! This module provides:
//! - `Hock`: the ordered pool of expectations, request routing and
//!   end-of-test verification
//! - `HockServer`: an embedded HTTP/1 listener feeding requests to a `Hock`
//!
//! ## Module Structure
//!
//! - `types`: error type
//! - `core`: the Hock struct (declaration, routing, verification)
//! - `handler`: hyper request handling
//! - `server`: listener lifecycle
//! - `fixture`: building a Hock from a fixture config

mod core;
mod fixture;
mod handler;
mod server;
mod types;

#[cfg(test)]
mod tests;

pub use self::core::{Hock, NO_MATCH_BODY};
pub use server::HockServer;
pub use types::HockError;

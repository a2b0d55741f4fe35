//! Hock: an HTTP test double.
//!
//! Declare the requests a client under test is expected to make, along with
//! canned replies, serve them over a local listener, then verify every
//! expectation was met.
//!
//! ```no_run
//! use hock::Hock;
//!
//! # async fn demo() -> Result<(), hock::HockError> {
//! let hock = Hock::new();
//! hock.get("/widgets")
//!     .reply(200, serde_json::json!({ "widgets": [] }))
//!     .post("/widgets", serde_json::json!({ "name": "sprocket" }))
//!     .twice()
//!     .reply(201, "created");
//!
//! let server = hock.listen("127.0.0.1:0".parse().unwrap()).await?;
//! // ... drive the client against server.url("/widgets") ...
//! hock.done().await?;
//! server.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod expectation;
pub mod hock;
pub mod predicate;
pub mod response;

pub use config::HockConfig;
pub use expectation::{Expectation, ExpectationOptions, Many, Reply, ReplyBody};
pub use hock::{Hock, HockError, HockServer, NO_MATCH_BODY};

//! Patmux is a pattern-based HTTP request multiplexer.
//!
//! Routes pair a [`Matcher`](route::Matcher) with an [`Endpoint`]. Requests
//! are dispatched to the first route, in registration order, whose matcher
//! accepts them. A prefix tree over the route prefixes (one per HTTP method
//! in use) keeps the number of matchers consulted per request small, without
//! changing which route wins.
//!
//! # Example
//!
//! ```
//! use patmux::{
//!     endpoint::make_sync,
//!     middleware::Tracing,
//!     route::{get, post},
//!     Endpoint, Mux, Request,
//! };
//!
//! let users = Mux::sub()
//!     .handle(get("/:name"), make_sync(|req| format!("user {}", req.param("name"))))
//!     .handle(post("/"), make_sync(|_| "created"));
//!
//! let app = Mux::new()
//!     .with(Tracing)
//!     .at("/users/*", users)
//!     .handle(get("/:file.:ext"), make_sync(|req| req.param("ext").to_string()));
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let resp = app
//!     .call(Request::builder().uri_str("/users/carl").finish())
//!     .await
//!     .unwrap();
//! assert_eq!(resp.into_body().into_string(), "user carl");
//!
//! let resp = app
//!     .call(Request::builder().uri_str("/data.tar.gz").finish())
//!     .await
//!     .unwrap();
//! assert_eq!(resp.into_body().into_string(), "tar.gz");
//! # });
//! ```
//!
//! # Patterns
//!
//! See [`Pattern`](route::Pattern) for the pattern syntax. Values captured
//! by a pattern are read with [`Request::param`], or through the
//! [`Bindings`](route::Bindings) of the request.
//!
//! # Logging
//!
//! Route registration is logged at `debug` level and dispatch at `trace`
//! level with [`tracing`](https://crates.io/crates/tracing). The
//! [`Tracing`](middleware::Tracing) middleware adds a span per request. No
//! subscriber is installed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod endpoint;
pub mod error;
pub mod middleware;
pub mod route;

#[doc(inline)]
pub use http;

mod body;
mod mux;
mod request;
mod response;
mod utils;

pub use async_trait::async_trait;
pub use body::Body;
pub use endpoint::{Endpoint, EndpointExt};
pub use error::{Error, Result};
pub use middleware::Middleware;
pub use mux::Mux;
pub use request::{Request, RequestBuilder};
pub use response::{IntoResponse, Response, ResponseBuilder};

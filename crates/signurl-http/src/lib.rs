//! HTTP layer that enforces signed URLs.
//!
//! This crate puts a [`Verifier`](signurl_core::Verifier) in front of an
//! application handler:
//!
//! - **Handler** ([`handler`]): The [`SignedHandler`](handler::SignedHandler)
//!   trait the application implements; it only ever sees verified requests.
//!
//! - **Service** ([`service`]): The [`SignedUrlService`](service::SignedUrlService)
//!   that implements hyper's `Service` trait.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> SignedUrlService (hyper Service)
//!     -> Health check interception
//!     -> Body collection
//!     -> Skip predicate (optional)
//!     -> Verifier (403 text/plain on failure)
//!     -> SignedHandler
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use signurl_core::SigningConfig;
//! use signurl_http::handler::StaticHandler;
//! use signurl_http::service::{SignedUrlHttpConfig, SignedUrlService};
//!
//! let config = SignedUrlHttpConfig::new(SigningConfig::from_env());
//! let service = SignedUrlService::new(StaticHandler::new("Hello, world!"), config);
//! // Use `service` with hyper server.
//! ```

pub mod handler;
pub mod service;

pub use handler::{ResponseBody, SignedHandler, StaticHandler};
pub use service::{SignedUrlHttpConfig, SignedUrlService, SkipPredicate};

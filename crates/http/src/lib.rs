//! Managed HTTP listener.
//!
//! [`HttpServer`] wraps one listening socket and implements the
//! `quiesce_operations::Listener` capability: a hyper accept loop with
//! graceful connection draining and an atomic reject gate evaluated before
//! any request reaches dispatch.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quiesce_http::{FnHandler, HttpServer};
//! use http::{Response, StatusCode};
//! use http_body_util::Full;
//! use hyper::body::Bytes;
//!
//! let mut server = HttpServer::new("biz", "127.0.0.1:8082".parse().unwrap());
//! server.handle(
//!     "/orders",
//!     Arc::new(FnHandler::new(|_req| async {
//!         Response::builder()
//!             .status(StatusCode::OK)
//!             .body(Full::new(Bytes::from_static(b"ok\n")))
//!             .unwrap()
//!     })),
//! );
//! ```

mod reject;
mod router;
mod server;

pub use reject::{RejectLayer, RejectService};
pub use router::{FnHandler, Handler, Router};
pub use server::HttpServer;

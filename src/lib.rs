//! Pooled HTTP/1.x client and a frame-based server loop for `tokio-core`
//!
//! The client keeps idle keep-alive connections in a [`Pool`] owned by the
//! client instance, transparently retries a request once when a reused
//! connection turns out to be closed by the peer, and follows redirects for
//! an allow-listed set of statuses and methods.
//!
//! Both sides talk to the network through the [`Wire`] trait, which turns a
//! byte stream into head and body frames. The default implementations are
//! the HTTP/1.x codecs in `client::ClientCodec` and `server::ServerCodec`.
//!
//! [`Pool`]: client/struct.Pool.html
//! [`Wire`]: trait.Wire.html
#![recursion_limit="100"]

extern crate futures;
extern crate futures_cpupool;
extern crate url;
extern crate httparse;
extern crate tokio_core;
extern crate tokio_io;
extern crate tk_bufstream;
extern crate tk_listen;
#[cfg(feature="date_header")] extern crate httpdate;
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate matches;
#[macro_use] extern crate log;


pub mod client;
pub mod server;
pub mod mock;
mod base_serializer;
mod body_parser;
mod chunked;
mod error;
mod frame;
mod headers;
mod version;
mod wire;

pub use base_serializer::HeaderError;
pub use error::Error;
pub use frame::{Frame, RequestHead, ResponseHead};
pub use version::Version;
pub use wire::Wire;

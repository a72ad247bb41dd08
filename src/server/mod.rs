//! HTTP server protocol implementation
//!
//! Every accepted connection is served by a `Proto` future which reads
//! a whole request, calls the `Handler` and writes the reply. The
//! connection is kept open while both request and response allow it.
//!
mod codec;
mod config;
mod listener;
mod proto;

pub use self::codec::ServerCodec;
pub use self::listener::{Server, create_server};
pub use self::proto::Proto;

use std::net::SocketAddr;

use futures::{Future, IntoFuture};

use error::Error;
use frame::{RequestHead, ResponseHead};


/// Fine-grained configuration of the HTTP server
#[derive(Debug, Clone)]
pub struct Config {
    max_request_length: usize,
}

/// A response head and an optional body
pub type Reply = (ResponseHead, Option<Vec<u8>>);

/// Info about the connection a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    /// Remote address (`None` for non-socket transports)
    pub addr: Option<SocketAddr>,
    /// Sequential number of the connection
    pub id: usize,
}

/// An application handler of the requests
///
/// Implemented for all closures
/// `FnMut(RequestHead, Vec<u8>, Peer) -> R` where `R: IntoFuture`.
pub trait Handler {
    type Future: Future<Item=Reply, Error=Error>;
    /// Request is received fully, including its body
    fn call(&mut self, head: RequestHead, body: Vec<u8>, peer: Peer)
        -> Self::Future;
}

impl<F, R> Handler for F
    where F: FnMut(RequestHead, Vec<u8>, Peer) -> R,
          R: IntoFuture<Item=Reply, Error=Error>,
{
    type Future = R::Future;
    fn call(&mut self, head: RequestHead, body: Vec<u8>, peer: Peer)
        -> R::Future
    {
        (self)(head, body, peer).into_future()
    }
}

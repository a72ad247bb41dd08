use std::rc::Rc;
use std::sync::Arc;

use futures::Future;
use futures::future::err;
use tokio_core::reactor::Handle;

use error::Error;
use client::{Config, Options, Pool, Provider, Request, Response};
use client::{Transport, TcpTransport, UrlParts};


/// HTTP client with a connection pool
///
/// Cloning the client is cheap, clones share the pool and the transport.
/// The client (and every request future) must stay on the thread where it
/// was created.
#[derive(Clone)]
pub struct Client {
    provider: Provider,
    config: Arc<Config>,
}

impl Client {
    /// Create a client with its own empty pool
    pub fn new<T: Transport + 'static>(transport: T) -> Client {
        Client::with_pool(transport, Pool::new())
    }
    /// Create a client using the existing pool
    pub fn with_pool<T: Transport + 'static>(transport: T, pool: Pool)
        -> Client
    {
        Client {
            provider: Provider::new(pool, Rc::new(transport)),
            config: Arc::new(Config::new()),
        }
    }
    /// Create a client connecting over plain TCP
    pub fn tcp(handle: &Handle) -> Client {
        Client::new(TcpTransport::new(handle))
    }
    /// Replace default config of the requests
    pub fn set_config(&mut self, config: &Arc<Config>) -> &mut Self {
        self.config = config.clone();
        self
    }
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }
    pub fn pool(&self) -> &Pool {
        self.provider.pool()
    }
    /// Make a request
    ///
    /// The `options` might be `()` for the client's config, a number of
    /// milliseconds or a `Duration` for the connection timeout, or a whole
    /// `Arc<Config>`.
    ///
    /// An invalid url fails the future without doing any I/O.
    pub fn request<O: Into<Options>>(&self, method: &str, url: &str,
        headers: &[(&str, &str)], body: Option<Vec<u8>>, options: O)
        -> Box<Future<Item=Response, Error=Error>>
    {
        let url = match UrlParts::parse(url) {
            Ok(url) => url,
            Err(e) => return Box::new(err(e)),
        };
        let config = options.into().apply(&self.config);
        let headers = headers.iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Box::new(Request::new(&self.provider, &config,
                              method, url, headers, body))
    }
    /// A shortcut for a `GET` request with default options
    pub fn fetch(&self, url: &str) -> Box<Future<Item=Response, Error=Error>> {
        self.request("GET", url, &[], None, ())
    }
}

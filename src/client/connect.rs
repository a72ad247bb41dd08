use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::rc::Rc;
use std::time::Duration;

use futures::{Future, Async, Poll};
use futures::future::{ok, err};
use futures_cpupool::CpuPool;
use tokio_core::net::TcpStream;
use tokio_core::reactor::{Handle, Timeout};

use error::Error;
use wire::ClientWire;
use client::codec::ClientCodec;
use client::pool::{Pool, Connection};


/// A way to establish new connections
///
/// The default implementation is `TcpTransport`. Implement this trait to
/// add TLS or to run requests over something other than TCP.
pub trait Transport {
    /// Connect to the peer and return a wire speaking HTTP
    ///
    /// The timeout (if any) covers name resolution and connection
    /// establishment.
    fn connect(&self, hostname: &str, port: u16, secure: bool,
        timeout: Option<Duration>)
        -> Box<Future<Item=ClientWire, Error=Error>>;
}

/// Gives out a pooled connection or establishes a new one
#[derive(Clone)]
pub struct Provider {
    pool: Pool,
    transport: Rc<Transport>,
}

/// Plain TCP transport on top of `tokio-core`
///
/// Names are resolved with the system resolver on a single-thread
/// `CpuPool`. Secure connections are not supported.
#[derive(Clone)]
pub struct TcpTransport {
    handle: Handle,
    resolver: CpuPool,
}

/// Fails with `Error::Timeout` if the future isn't resolved in time
struct WithTimeout<F> {
    future: F,
    timeout: Timeout,
}

impl Provider {
    pub fn new(pool: Pool, transport: Rc<Transport>) -> Provider {
        Provider {
            pool: pool,
            transport: transport,
        }
    }
    /// The pool connections are taken from and released to
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
    /// Take an idle connection from the pool or connect a new one
    pub fn obtain(&self, hostname: &str, port: u16, secure: bool,
        timeout: Option<Duration>)
        -> Box<Future<Item=Connection, Error=Error>>
    {
        if let Some(conn) = self.pool.acquire(hostname, port, secure) {
            return Box::new(ok(conn));
        }
        debug!("Opening new connection to {}:{}", hostname, port);
        let name = hostname.to_string();
        Box::new(self.transport.connect(hostname, port, secure, timeout)
            .map(move |wire| Connection::new(&name, port, secure, wire)))
    }
}

impl TcpTransport {
    pub fn new(handle: &Handle) -> TcpTransport {
        TcpTransport {
            handle: handle.clone(),
            resolver: CpuPool::new(1),
        }
    }
    fn resolve(&self, hostname: &str, port: u16)
        -> Box<Future<Item=SocketAddr, Error=Error>>
    {
        let bare = hostname.trim_left_matches('[').trim_right_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return Box::new(ok(SocketAddr::new(ip, port)));
        }
        let name = format!("{}:{}", hostname, port);
        Box::new(self.resolver.spawn_fn(move || {
            match name.to_socket_addrs() {
                Ok(mut addrs) => addrs.next().ok_or(Error::NameNotFound),
                Err(e) => Err(Error::Name(e)),
            }
        }))
    }
}

impl Transport for TcpTransport {
    fn connect(&self, hostname: &str, port: u16, secure: bool,
        timeout: Option<Duration>)
        -> Box<Future<Item=ClientWire, Error=Error>>
    {
        if secure {
            return Box::new(err(Error::UnsupportedScheme));
        }
        let handle = self.handle.clone();
        let future = self.resolve(hostname, port)
            .and_then(move |addr| {
                debug!("Connecting to {}", addr);
                TcpStream::connect(&addr, &handle).map_err(Error::Io)
            })
            .map(|sock| Box::new(ClientCodec::new(sock)) as ClientWire);
        match timeout {
            Some(dur) => match Timeout::new(dur, &self.handle) {
                Ok(timeout) => Box::new(WithTimeout {
                    future: future,
                    timeout: timeout,
                }),
                Err(e) => Box::new(err(Error::Io(e))),
            },
            None => Box::new(future),
        }
    }
}

impl<F: Future<Error=Error>> Future for WithTimeout<F> {
    type Item = F::Item;
    type Error = Error;
    fn poll(&mut self) -> Poll<F::Item, Error> {
        if let Async::Ready(value) = self.future.poll()? {
            return Ok(Async::Ready(value));
        }
        match self.timeout.poll()? {
            Async::Ready(()) => Err(Error::Timeout),
            Async::NotReady => Ok(Async::NotReady),
        }
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use futures::Future;

    use super::Provider;
    use client::pool::{Pool, Connection};
    use mock::{MockTransport, MockWire};

    #[test]
    fn pool_first() {
        let pool = Pool::new();
        let transport = MockTransport::new();
        let wire = MockWire::new();
        let conn = Connection::new("example.com", 80, false,
                                   Box::new(wire.clone()));
        let id = conn.id();
        pool.release(conn);
        let provider = Provider::new(pool.clone(), Rc::new(transport.clone()));
        let conn = provider.obtain("example.com", 80, false, None)
            .wait().unwrap();
        assert_eq!(conn.id(), id);
        assert!(conn.is_reused());
        assert_eq!(transport.connects().len(), 0);
    }

    #[test]
    fn connect_on_miss() {
        let transport = MockTransport::new();
        transport.push(MockWire::new());
        let provider = Provider::new(Pool::new(), Rc::new(transport.clone()));
        let conn = provider.obtain("example.com", 8080, false, None)
            .wait().unwrap();
        assert!(!conn.is_reused());
        assert_eq!(conn.hostname(), "example.com");
        assert_eq!(conn.port(), 8080);
        assert_eq!(transport.connects(),
                   vec![("example.com".to_string(), 8080, false)]);
    }

    #[test]
    fn transport_error() {
        let transport = MockTransport::new();
        let provider = Provider::new(Pool::new(), Rc::new(transport));
        assert!(provider.obtain("example.com", 80, false, None)
            .wait().is_err());
    }
}

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use futures::{Future, Stream, Poll};
use tk_listen::ListenExt;
use tokio_core::net::TcpListener;
use tokio_core::reactor::Handle;

use error::Error;
use server::{Config, Handler, Peer, Proto, ServerCodec};

/// Maximum number of connections served simultaneously
const MAX_CONNECTIONS: usize = 10000;


/// An accept loop of the HTTP server
///
/// This is a future which never resolves by itself. It must be run on the
/// reactor (`core.run(server)` or `handle.spawn(server)`).
pub struct Server {
    addr: SocketAddr,
    future: Box<Future<Item=(), Error=()>>,
}

/// Start an HTTP server at `host:port`
///
/// Port `0` means any free port, use `Server::local_addr` to find out
/// which one is used.
pub fn create_server<H>(host: &str, port: u16, handler: H, handle: &Handle)
    -> Result<Server, Error>
    where H: Handler + Clone + 'static,
          H::Future: 'static,
{
    let addr = (host, port).to_socket_addrs().map_err(Error::Name)?
        .next().ok_or(Error::NameNotFound)?;
    Server::bind(&addr, &Config::new().done(), handler, handle)
}

impl Server {
    /// Listen at the address and serve connections with the handler
    pub fn bind<H>(addr: &SocketAddr, config: &Arc<Config>, handler: H,
        handle: &Handle)
        -> Result<Server, Error>
        where H: Handler + Clone + 'static,
              H::Future: 'static,
    {
        let listener = TcpListener::bind(addr, handle)?;
        let addr = listener.local_addr()?;
        info!("Listening on {}", addr);
        let config = config.clone();
        let mut counter = 0;
        let future = listener.incoming()
            .sleep_on_error(Duration::from_millis(100), handle)
            .map(move |(socket, peer_addr)| {
                counter += 1;
                let peer = Peer { addr: Some(peer_addr), id: counter };
                debug!("Connection {} from {}", counter, peer_addr);
                Proto::new(ServerCodec::new(socket), peer,
                           handler.clone(), &config)
                .map_err(move |e| {
                    warn!("Connection {} from {} failed: {}",
                        peer.id, peer_addr, e);
                })
            })
            .listen(MAX_CONNECTIONS);
        Ok(Server {
            addr: addr,
            future: Box::new(future),
        })
    }
    /// Address the server is listening at
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Future for Server {
    type Item = ();
    type Error = ();
    fn poll(&mut self) -> Poll<(), ()> {
        self.future.poll()
    }
}

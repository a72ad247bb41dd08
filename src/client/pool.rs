use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering, ATOMIC_USIZE_INIT};

use wire::{Wire, ClientWire};

static CONNECTION_ID: AtomicUsize = ATOMIC_USIZE_INIT;


/// A client connection
///
/// Owned by the request which is currently using it, or by the `Pool`
/// while idle.
pub struct Connection {
    id: usize,
    hostname: String,
    port: u16,
    secure: bool,
    wire: ClientWire,
    reused: bool,
    idle: bool,
}

/// A cache of idle keep-alive connections
///
/// Cloning the pool creates a new handle to the same set of connections.
///
/// The pool is meant for a single-threaded reactor. No suspension point
/// happens while the pool is borrowed, so `acquire` and `release` are
/// atomic with respect to other futures running on the same reactor.
#[derive(Clone)]
pub struct Pool {
    idle: Rc<RefCell<Vec<Connection>>>,
}

impl Connection {
    /// Wrap a freshly established connection
    pub fn new(hostname: &str, port: u16, secure: bool, wire: ClientWire)
        -> Connection
    {
        Connection {
            id: CONNECTION_ID.fetch_add(1, Ordering::SeqCst),
            hostname: hostname.to_string(),
            port: port,
            secure: secure,
            wire: wire,
            reused: false,
            idle: false,
        }
    }
    /// Unique (per process) identifier of the connection
    pub fn id(&self) -> usize {
        self.id
    }
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn secure(&self) -> bool {
        self.secure
    }
    /// Whether connection was taken from the pool
    pub fn is_reused(&self) -> bool {
        self.reused
    }
    /// Whether connection is currently sitting in the pool
    pub fn is_idle(&self) -> bool {
        self.idle
    }
    pub fn wire(&mut self) -> &mut ClientWire {
        &mut self.wire
    }
    pub fn is_closing(&self) -> bool {
        self.wire.is_closing()
    }
    /// Send end-of-stream and drop the connection
    pub fn close(mut self) {
        debug!("Closing connection {} to {}:{}",
            self.id, self.hostname, self.port);
        self.wire.write_eof();
    }
    fn matches(&self, hostname: &str, port: u16, secure: bool) -> bool {
        self.port == port && self.secure == secure &&
            self.hostname.eq_ignore_ascii_case(hostname)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("reused", &self.reused)
            .field("idle", &self.idle)
            .finish()
    }
}

impl Pool {
    /// Create an empty pool
    pub fn new() -> Pool {
        Pool {
            idle: Rc::new(RefCell::new(Vec::new())),
        }
    }
    /// Take an idle connection to the specified peer
    ///
    /// Most recently released connections are tried first. Every candidate
    /// is checked for being closed by peer, closed ones are dropped and
    /// never returned.
    pub fn acquire(&self, hostname: &str, port: u16, secure: bool)
        -> Option<Connection>
    {
        let mut idle = self.idle.borrow_mut();
        while let Some(idx) = idle.iter()
            .rposition(|c| c.matches(hostname, port, secure))
        {
            let mut conn = idle.remove(idx);
            if conn.wire.is_closed_by_peer() {
                debug!("Pooled connection {} to {}:{} is closed by peer",
                    conn.id, hostname, port);
                conn.close();
                continue;
            }
            debug!("Reusing connection {} to {}:{}", conn.id, hostname, port);
            conn.reused = true;
            conn.idle = false;
            return Some(conn);
        }
        None
    }
    /// Put connection back into the pool
    ///
    /// A connection that is closing is dropped instead.
    pub fn release(&self, mut conn: Connection) {
        if conn.is_closing() {
            debug!("Dropping closing connection {}", conn.id);
            return;
        }
        debug!("Connection {} to {}:{} is idle",
            conn.id, conn.hostname, conn.port);
        conn.idle = true;
        self.idle.borrow_mut().push(conn);
    }
    /// Number of idle connections
    pub fn len(&self) -> usize {
        self.idle.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.idle.borrow().is_empty()
    }
    /// Whether connection with this id is in the pool
    pub fn contains(&self, id: usize) -> bool {
        self.count(id) > 0
    }
    /// Number of times connection with this id is in the pool
    pub fn count(&self, id: usize) -> usize {
        self.idle.borrow().iter().filter(|c| c.id == id).count()
    }
    /// Close all idle connections
    pub fn clear(&self) {
        let conns: Vec<_> = self.idle.borrow_mut().drain(..).collect();
        for conn in conns {
            conn.close();
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.len())
            .finish()
    }
}

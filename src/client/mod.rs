//! The pooled HTTP/1.x client
//!
//! ```rust,ignore
//! let mut core = Core::new().unwrap();
//! let client = Client::tcp(&core.handle());
//! let resp = core.run(client.fetch("http://example.com/")).unwrap();
//! println!("{} bytes", resp.body().len());
//! ```
//!
mod client;
mod codec;
mod config;
mod connect;
mod pool;
mod request;
mod url_parts;
pub mod redirect;

pub use self::client::Client;
pub use self::codec::ClientCodec;
pub use self::connect::{Provider, Transport, TcpTransport};
pub use self::pool::{Pool, Connection};
pub use self::request::{Request, Response};
pub use self::url_parts::UrlParts;
pub use wire::ClientWire;

use std::sync::Arc;
use std::time::Duration;


/// Fine-grained configuration of the client requests
#[derive(Debug, Clone)]
pub struct Config {
    timeout: Option<Duration>,
    follow_redirects: bool,
    redirection_codes: Vec<u16>,
    redirection_methods: Vec<String>,
    max_redirects: usize,
    max_response_length: usize,
}

/// Per-request options
///
/// Usually constructed implicitly from one of:
///
/// * `()` -- use the config of the client
/// * `u64` -- connection timeout in milliseconds, the rest from the client
/// * `Duration` -- same as above
/// * `Arc<Config>` -- replace client config for this request
#[derive(Debug, Clone)]
pub enum Options {
    Default,
    Timeout(Duration),
    Config(Arc<Config>),
}

impl From<()> for Options {
    fn from(_: ()) -> Options {
        Options::Default
    }
}

impl From<u64> for Options {
    fn from(millis: u64) -> Options {
        Options::Timeout(Duration::from_millis(millis))
    }
}

impl From<Duration> for Options {
    fn from(dur: Duration) -> Options {
        Options::Timeout(dur)
    }
}

impl From<Arc<Config>> for Options {
    fn from(cfg: Arc<Config>) -> Options {
        Options::Config(cfg)
    }
}

impl<'a> From<&'a Arc<Config>> for Options {
    fn from(cfg: &'a Arc<Config>) -> Options {
        Options::Config(cfg.clone())
    }
}

impl Options {
    fn apply(self, base: &Arc<Config>) -> Arc<Config> {
        match self {
            Options::Default => base.clone(),
            Options::Timeout(dur) => {
                let mut cfg = (**base).clone();
                cfg.timeout = Some(dur);
                Arc::new(cfg)
            }
            Options::Config(cfg) => cfg,
        }
    }
}

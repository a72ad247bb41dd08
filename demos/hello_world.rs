extern crate tokio_core;
extern crate tk_fetch;
#[macro_use] extern crate log;
extern crate env_logger;

use std::env;

use tokio_core::reactor::Core;

use tk_fetch::{Error, RequestHead, ResponseHead};
use tk_fetch::server::{create_server, Peer, Reply};

const BODY: &'static str = "Hello World!";


fn hello(req: RequestHead, _body: Vec<u8>, peer: Peer)
    -> Result<Reply, Error>
{
    info!("{} {} from {:?}", req.method, req.path, peer.addr);
    let mut resp = ResponseHead::new(200, "OK");
    resp.add_header("Server",
        concat!("tk-fetch/", env!("CARGO_PKG_VERSION")));
    resp.add_header("Content-Type", "text/plain");
    Ok((resp, Some(BODY.as_bytes().to_vec())))
}


fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init().expect("init logging");

    let mut lp = Core::new().unwrap();

    let server = create_server("0.0.0.0", 8080, hello, &lp.handle())
        .expect("server started");

    lp.run(server).unwrap();
}

extern crate futures;
extern crate tokio_core;
extern crate tk_fetch;

use std::net::SocketAddr;

use tokio_core::reactor::Core;

use tk_fetch::{Error, RequestHead, ResponseHead};
use tk_fetch::client::Client;
use tk_fetch::server::{create_server, Peer, Reply};


fn echo(head: RequestHead, body: Vec<u8>, _peer: Peer)
    -> Result<Reply, Error>
{
    let mut resp = ResponseHead::new(200, "OK");
    if head.path == "/close" {
        resp.keep_alive = false;
    }
    let mut data = format!("{} {} ", head.method, head.path).into_bytes();
    data.extend(body);
    Ok((resp, Some(data)))
}

fn start(core: &Core) -> SocketAddr {
    let server = create_server("127.0.0.1", 0, echo, &core.handle())
        .unwrap();
    let addr = server.local_addr();
    core.handle().spawn(server);
    addr
}

#[test]
fn get_and_post() {
    let mut core = Core::new().unwrap();
    let addr = start(&core);
    let client = Client::tcp(&core.handle());

    let url = format!("http://{}/hello", addr);
    let resp = core.run(client.fetch(&url)).unwrap();
    assert_eq!(resp.code(), 200);
    assert_eq!(resp.body(), b"GET /hello ");
    assert!(resp.header("Date").is_some());
    assert_eq!(client.pool().len(), 1);

    let resp = core.run(client.request("POST", &url, &[],
                                       Some(b"data".to_vec()), ()))
        .unwrap();
    assert_eq!(resp.body(), b"POST /hello data");
    assert_eq!(client.pool().len(), 1);
}

#[test]
fn head_then_get() {
    let mut core = Core::new().unwrap();
    let addr = start(&core);
    let client = Client::tcp(&core.handle());

    let url = format!("http://{}/x", addr);
    let resp = core.run(client.request("HEAD", &url, &[], None, ()))
        .unwrap();
    assert_eq!(resp.header("Content-Length"), Some("8"));
    assert_eq!(resp.body(), b"");
    assert_eq!(client.pool().len(), 1);

    let resp = core.run(client.fetch(&url)).unwrap();
    assert_eq!(resp.body(), b"GET /x ");
    assert_eq!(client.pool().len(), 1);
}

#[test]
fn connection_close() {
    let mut core = Core::new().unwrap();
    let addr = start(&core);
    let client = Client::tcp(&core.handle());

    let url = format!("http://{}/close", addr);
    let resp = core.run(client.fetch(&url)).unwrap();
    assert_eq!(resp.body(), b"GET /close ");
    assert!(!resp.keep_alive());
    assert!(client.pool().is_empty());
}

#[test]
fn https_unsupported() {
    let mut core = Core::new().unwrap();
    let client = Client::tcp(&core.handle());
    match core.run(client.fetch("https://127.0.0.1:1/")) {
        Err(Error::UnsupportedScheme) => {}
        other => panic!("unexpected {:?}", other),
    }
}

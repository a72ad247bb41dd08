use std::mem;
use std::sync::Arc;

use futures::{Future, Async, Poll};

use base_serializer::is_bodyless;
use error::Error;
use frame::{Frame, RequestHead, ResponseHead};
use headers;
use server::{Config, Handler, Peer, Reply};
use wire::Wire;


enum State<F> {
    ReadHead,
    ReadBody(RequestHead, Vec<u8>),
    Handling(F, bool),
    Flushing(bool),
    Void,
}

/// A future which serves a single connection
///
/// Resolves when connection is closed, either by the peer between
/// requests or by us after a non-keep-alive exchange.
pub struct Proto<W, H: Handler> {
    wire: W,
    peer: Peer,
    handler: H,
    config: Arc<Config>,
    state: State<H::Future>,
}

/// Adds `Content-Length` if body size is not specified otherwise
fn prepare_head(head: &mut ResponseHead, body: &Option<Vec<u8>>) {
    if is_bodyless(head.code) {
        return;
    }
    let has_length = head.headers.iter().any(|&(ref name, _)| {
        headers::is_content_length(name) ||
        headers::is_transfer_encoding(name)
    });
    if !has_length {
        let len = body.as_ref().map(|x| x.len()).unwrap_or(0);
        head.headers.push(("Content-Length".to_string(), len.to_string()));
    }
}

fn wants_close(head: &ResponseHead) -> bool {
    !head.keep_alive || head.headers.iter().any(|&(ref name, ref value)| {
        headers::is_connection(name) &&
        headers::has_token(value.as_bytes(), headers::is_close)
    })
}

impl<W, H> Proto<W, H>
    where W: Wire<In=RequestHead, Out=ResponseHead>,
          H: Handler,
{
    pub fn new(wire: W, peer: Peer, handler: H, config: &Arc<Config>)
        -> Proto<W, H>
    {
        Proto {
            wire: wire,
            peer: peer,
            handler: handler,
            config: config.clone(),
            state: State::ReadHead,
        }
    }
    fn write_reply(&mut self, reply: Reply) -> Result<bool, Error> {
        let (mut head, body) = reply;
        prepare_head(&mut head, &body);
        let close = wants_close(&head);
        let bodyless = is_bodyless(head.code);
        self.wire.start_write(Frame::Head(head))?;
        if let Some(body) = body {
            if body.len() > 0 && !bodyless {
                self.wire.start_write(Frame::Data(body))?;
            }
        }
        self.wire.start_write(Frame::Data(Vec::new()))?;
        Ok(!close)
    }
}

impl<W, H> Future for Proto<W, H>
    where W: Wire<In=RequestHead, Out=ResponseHead>,
          H: Handler,
{
    type Item = ();
    type Error = Error;
    fn poll(&mut self) -> Poll<(), Error> {
        loop {
            self.state = match mem::replace(&mut self.state, State::Void) {
                State::ReadHead => match self.wire.poll_read()? {
                    Async::Ready(Some(Frame::Head(head))) => {
                        State::ReadBody(head, Vec::new())
                    }
                    Async::Ready(Some(Frame::Data(_))) => {
                        return Err(Error::UnexpectedFrame);
                    }
                    Async::Ready(None) => {
                        debug!("Connection {} closed by peer", self.peer.id);
                        return Ok(Async::Ready(()));
                    }
                    Async::NotReady => {
                        self.state = State::ReadHead;
                        return Ok(Async::NotReady);
                    }
                },
                State::ReadBody(head, mut body) => {
                    match self.wire.poll_read()? {
                        Async::Ready(Some(Frame::Data(chunk))) => {
                            if chunk.len() == 0 {
                                let keep_alive = head.keep_alive;
                                let fut = self.handler.call(head, body,
                                                            self.peer);
                                State::Handling(fut, keep_alive)
                            } else {
                                if body.len() + chunk.len() >
                                    self.config.max_request_length
                                {
                                    return Err(Error::RequestTooLong);
                                }
                                body.extend(chunk);
                                State::ReadBody(head, body)
                            }
                        }
                        Async::Ready(Some(Frame::Head(_))) => {
                            return Err(Error::UnexpectedFrame);
                        }
                        Async::Ready(None) => {
                            return Err(Error::ResetOnRequestBody);
                        }
                        Async::NotReady => {
                            self.state = State::ReadBody(head, body);
                            return Ok(Async::NotReady);
                        }
                    }
                }
                State::Handling(mut fut, keep_alive) => match fut.poll()? {
                    Async::Ready(reply) => {
                        let keep = self.write_reply(reply)? && keep_alive;
                        State::Flushing(keep)
                    }
                    Async::NotReady => {
                        self.state = State::Handling(fut, keep_alive);
                        return Ok(Async::NotReady);
                    }
                },
                State::Flushing(keep) => match self.wire.poll_flush()? {
                    Async::Ready(()) if keep => State::ReadHead,
                    Async::Ready(()) => {
                        debug!("Closing connection {}", self.peer.id);
                        self.wire.write_eof();
                        return Ok(Async::Ready(()));
                    }
                    Async::NotReady => {
                        self.state = State::Flushing(keep);
                        return Ok(Async::NotReady);
                    }
                },
                State::Void => unreachable!(),
            };
        }
    }
}

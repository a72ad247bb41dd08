//! In-memory wires and transport for tests
//!
//! `MockWire` replays scripted frames and records everything written to it.
//! Clones share the same state, so a test may keep a clone to inspect the
//! wire after handing it to a client or server.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use futures::{Future, Async, Poll};
use futures::future::{ok, err};

use client::{ClientWire, Transport};
use error::Error;
use frame::{Frame, RequestHead, ResponseHead};
use wire::Wire;


struct MockState<I, O> {
    input: VecDeque<Frame<I>>,
    output: Vec<Frame<O>>,
    reads: usize,
    resets: usize,
    flushes: usize,
    eof_written: bool,
    peer_closed: bool,
    reset: bool,
    closing: bool,
}

/// A scripted `Wire`
///
/// Frames pushed with `push` are returned by `poll_read` in order. When
/// they are exhausted, the wire reports end of stream.
pub struct MockWire<I=ResponseHead, O=RequestHead> {
    state: Rc<RefCell<MockState<I, O>>>,
}

struct TransportState {
    wires: VecDeque<MockWire>,
    connects: Vec<(String, u16, bool)>,
}

/// A transport which hands out prepared client wires
///
/// When no wires are left, `connect` fails with connection refused.
#[derive(Clone)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
}

impl<I, O> Clone for MockWire<I, O> {
    fn clone(&self) -> MockWire<I, O> {
        MockWire { state: self.state.clone() }
    }
}

fn new_state<I, O>() -> MockWire<I, O> {
    MockWire {
        state: Rc::new(RefCell::new(MockState {
            input: VecDeque::new(),
            output: Vec::new(),
            reads: 0,
            resets: 0,
            flushes: 0,
            eof_written: false,
            peer_closed: false,
            reset: false,
            closing: false,
        })),
    }
}

impl MockWire<ResponseHead, RequestHead> {
    /// Client side of the connection
    pub fn new() -> MockWire<ResponseHead, RequestHead> {
        new_state()
    }
    /// Script a whole response: head, body (if not empty) and terminator
    pub fn respond(&self, head: ResponseHead, body: &[u8]) -> &Self {
        self.push(Frame::Head(head));
        if body.len() > 0 {
            self.push(Frame::Data(body.to_vec()));
        }
        self.push(Frame::Data(Vec::new()));
        self
    }
    /// Request heads written so far
    pub fn requests(&self) -> Vec<RequestHead> {
        self.state.borrow().output.iter().filter_map(|f| match *f {
            Frame::Head(ref h) => Some(h.clone()),
            Frame::Data(_) => None,
        }).collect()
    }
}

impl MockWire<RequestHead, ResponseHead> {
    /// Server side of the connection
    pub fn server() -> MockWire<RequestHead, ResponseHead> {
        new_state()
    }
    /// Script a whole request: head, body (if not empty) and terminator
    pub fn request(&self, head: RequestHead, body: &[u8]) -> &Self {
        self.push(Frame::Head(head));
        if body.len() > 0 {
            self.push(Frame::Data(body.to_vec()));
        }
        self.push(Frame::Data(Vec::new()));
        self
    }
    /// Response heads written so far
    pub fn responses(&self) -> Vec<ResponseHead> {
        self.state.borrow().output.iter().filter_map(|f| match *f {
            Frame::Head(ref h) => Some(h.clone()),
            Frame::Data(_) => None,
        }).collect()
    }
}

impl<I, O: Clone> MockWire<I, O> {
    /// Add a frame to be read
    pub fn push(&self, frame: Frame<I>) {
        self.state.borrow_mut().input.push_back(frame);
    }
    /// All frames written so far
    pub fn written(&self) -> Vec<Frame<O>> {
        self.state.borrow().output.clone()
    }
    /// Concatenated data frames written so far
    pub fn written_body(&self) -> Vec<u8> {
        let mut result = Vec::new();
        for frame in &self.state.borrow().output {
            if let Frame::Data(ref data) = *frame {
                result.extend_from_slice(data);
            }
        }
        result
    }
    /// Number of frames which were read
    pub fn reads(&self) -> usize {
        self.state.borrow().reads
    }
    /// Number of frames which are still not read
    pub fn pending(&self) -> usize {
        self.state.borrow().input.len()
    }
    pub fn resets(&self) -> usize {
        self.state.borrow().resets
    }
    pub fn flushes(&self) -> usize {
        self.state.borrow().flushes
    }
    pub fn eof_written(&self) -> bool {
        self.state.borrow().eof_written
    }
    /// Make `is_closed_by_peer` return true
    pub fn close_by_peer(&self) {
        self.state.borrow_mut().peer_closed = true;
    }
    /// Make reads fail with `ConnectionReset` once the script is exhausted
    ///
    /// Unlike `close_by_peer` the liveness check still succeeds.
    pub fn reset_by_peer(&self) {
        self.state.borrow_mut().reset = true;
    }
    pub fn set_closing(&self) {
        self.state.borrow_mut().closing = true;
    }
}

impl<I, O> Wire for MockWire<I, O> {
    type In = I;
    type Out = O;
    fn poll_read(&mut self) -> Poll<Option<Frame<I>>, Error> {
        let mut state = self.state.borrow_mut();
        match state.input.pop_front() {
            Some(frame) => {
                state.reads += 1;
                Ok(Async::Ready(Some(frame)))
            }
            None if state.reset => {
                state.closing = true;
                Err(Error::Io(io::Error::new(
                    io::ErrorKind::ConnectionReset, "connection reset")))
            }
            None => {
                state.closing = true;
                Ok(Async::Ready(None))
            }
        }
    }
    fn start_write(&mut self, frame: Frame<O>) -> Result<(), Error> {
        self.state.borrow_mut().output.push(frame);
        Ok(())
    }
    fn poll_flush(&mut self) -> Poll<(), Error> {
        self.state.borrow_mut().flushes += 1;
        Ok(Async::Ready(()))
    }
    fn write_eof(&mut self) {
        let mut state = self.state.borrow_mut();
        state.eof_written = true;
        state.closing = true;
    }
    fn reset(&mut self) {
        self.state.borrow_mut().resets += 1;
    }
    fn is_closing(&self) -> bool {
        self.state.borrow().closing
    }
    fn is_closed_by_peer(&mut self) -> bool {
        let state = self.state.borrow();
        state.peer_closed || state.closing
    }
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport {
            state: Rc::new(RefCell::new(TransportState {
                wires: VecDeque::new(),
                connects: Vec::new(),
            })),
        }
    }
    /// Add a wire for the next `connect`
    pub fn push(&self, wire: MockWire) -> &Self {
        self.state.borrow_mut().wires.push_back(wire);
        self
    }
    /// All `(hostname, port, secure)` connected to so far
    pub fn connects(&self) -> Vec<(String, u16, bool)> {
        self.state.borrow().connects.clone()
    }
}

impl Transport for MockTransport {
    fn connect(&self, hostname: &str, port: u16, secure: bool,
        _timeout: Option<Duration>)
        -> Box<Future<Item=ClientWire, Error=Error>>
    {
        let mut state = self.state.borrow_mut();
        state.connects.push((hostname.to_string(), port, secure));
        match state.wires.pop_front() {
            Some(wire) => Box::new(ok(Box::new(wire) as ClientWire)),
            None => Box::new(err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "no more mock connections")))),
        }
    }
}

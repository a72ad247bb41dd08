use std::mem;
use std::sync::Arc;

use futures::{Future, Async, Poll};

use error::Error;
use frame::{Frame, RequestHead, ResponseHead};
use headers::{is_host, is_content_length, is_transfer_encoding};
use headers::ends_with_chunked;
use version::Version;
use client::{Config, Provider, Connection, UrlParts};
use client::redirect;


enum State {
    Start,
    Connecting(Box<Future<Item=Connection, Error=Error>>),
    Sending(Connection),
    ReadHead(Connection),
    ReadBody(Connection, ResponseHead, Vec<u8>),
    Void,
}

/// A future that executes the request
///
/// It takes a connection from the pool (or connects), sends the request,
/// buffers the whole response, returns the connection to the pool when
/// the response is keep-alive, and follows redirects.
///
/// If a connection taken from the pool is closed before the response head
/// is received, the request is sent once more on a fresh connection. Note
/// this means a non-idempotent request might be executed twice if the peer
/// processed it before closing the connection.
pub struct Request {
    provider: Provider,
    config: Arc<Config>,
    method: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    url: UrlParts,
    retried: bool,
    redirects: usize,
    state: State,
}

/// A fully buffered response
#[derive(Debug, Clone)]
pub struct Response {
    head: ResponseHead,
    body: Vec<u8>,
    url: UrlParts,
}

/// Build a request head sent to the `url`
///
/// Headers are copied verbatim. `Host` is added unless present and
/// `Content-Length` is added for the body unless either length or chunked
/// encoding is already specified.
pub fn build_head(method: &str, url: &UrlParts,
    headers: &[(String, String)], body: Option<&[u8]>)
    -> RequestHead
{
    let mut has_host = false;
    let mut has_length = false;
    let mut chunked = false;
    let mut result = Vec::with_capacity(headers.len() + 2);
    for &(ref name, ref value) in headers {
        if is_host(name) {
            has_host = true;
        } else if is_content_length(name) {
            has_length = true;
        } else if is_transfer_encoding(name) {
            chunked = chunked || ends_with_chunked(value.as_bytes());
        }
        result.push((name.clone(), value.clone()));
    }
    if !has_host {
        result.insert(0, ("Host".to_string(), url.host.clone()));
    }
    if let Some(body) = body {
        if !has_length && !chunked {
            result.push(("Content-Length".to_string(),
                         body.len().to_string()));
        }
    }
    RequestHead {
        method: method.to_string(),
        path: url.path.clone(),
        version: Version::Http11,
        headers: result,
        keep_alive: true,
    }
}

impl Request {
    pub fn new(provider: &Provider, config: &Arc<Config>,
        method: &str, url: UrlParts, headers: Vec<(String, String)>,
        body: Option<Vec<u8>>)
        -> Request
    {
        Request {
            provider: provider.clone(),
            config: config.clone(),
            method: method.to_string(),
            headers: headers,
            body: body,
            url: url,
            retried: false,
            redirects: 0,
            state: State::Start,
        }
    }

    fn write_request(&self, conn: &mut Connection) -> Result<(), Error> {
        let head = build_head(&self.method, &self.url, &self.headers,
            self.body.as_ref().map(|x| &x[..]));
        let wire = conn.wire();
        wire.start_write(Frame::Head(head))?;
        if let Some(ref body) = self.body {
            if body.len() > 0 {
                wire.start_write(Frame::Data(body.clone()))?;
            }
        }
        wire.start_write(Frame::Data(Vec::new()))?;
        Ok(())
    }

    /// Returns the connection and decides whether to follow the redirect
    ///
    /// Returns `None` if the request must be sent again to the new url.
    /// Decides whether a failure before the response head is retried
    ///
    /// A connection taken from the pool might have been closed by the peer
    /// right after the liveness check, which shows up as a reset.
    fn recover(&mut self, conn: Connection, e: Error) -> Result<State, Error> {
        if conn.is_reused() && !self.retried {
            debug!("Pooled connection {} failed before response \
                to {} {}: {}, retrying", conn.id(), self.method, self.url, e);
            self.retried = true;
            conn.close();
            Ok(State::Start)
        } else {
            Err(e)
        }
    }

    fn finish(&mut self, conn: Connection, mut head: ResponseHead,
        body: Vec<u8>)
        -> Result<Option<Response>, Error>
    {
        // e.g. the request had `Connection: close`
        if conn.is_closing() {
            head.keep_alive = false;
        }
        if head.keep_alive {
            self.provider.pool().release(conn);
        } else {
            conn.close();
        }
        if !redirect::is_eligible(&self.config, &self.method, head.code) {
            return Ok(Some(Response {
                head: head,
                body: body,
                url: self.url.clone(),
            }));
        }
        let target = redirect::resolve(&self.url, &head)?;
        self.redirects += 1;
        if self.redirects > self.config.max_redirects {
            return Err(Error::TooManyRedirects);
        }
        debug!("Redirect {} {} -> {}", head.code, self.url, target);
        let same_host = target.host == self.url.host;
        self.headers.retain(|&(ref name, _)| {
            !is_content_length(name) && !is_transfer_encoding(name) &&
            (same_host || !is_host(name))
        });
        self.url = target;
        self.body = None;
        self.retried = false;
        Ok(None)
    }
}

impl Future for Request {
    type Item = Response;
    type Error = Error;
    fn poll(&mut self) -> Poll<Response, Error> {
        loop {
            self.state = match mem::replace(&mut self.state, State::Void) {
                State::Start => {
                    State::Connecting(self.provider.obtain(
                        &self.url.hostname, self.url.port, self.url.secure,
                        self.config.timeout))
                }
                State::Connecting(mut fut) => match fut.poll()? {
                    Async::Ready(mut conn) => {
                        debug!("Sending {} {} on connection {}",
                            self.method, self.url, conn.id());
                        self.write_request(&mut conn)?;
                        State::Sending(conn)
                    }
                    Async::NotReady => {
                        self.state = State::Connecting(fut);
                        return Ok(Async::NotReady);
                    }
                },
                State::Sending(mut conn) => match conn.wire().poll_flush() {
                    Ok(Async::Ready(())) => State::ReadHead(conn),
                    Ok(Async::NotReady) => {
                        self.state = State::Sending(conn);
                        return Ok(Async::NotReady);
                    }
                    Err(e) => self.recover(conn, e)?,
                },
                State::ReadHead(mut conn) => match conn.wire().poll_read() {
                    Err(e) => self.recover(conn, e)?,
                    Ok(Async::Ready(Some(Frame::Head(head)))) => {
                        if self.method == "HEAD" {
                            // no body follows, regardless of the headers
                            conn.wire().reset();
                            match self.finish(conn, head, Vec::new())? {
                                Some(resp) => return Ok(Async::Ready(resp)),
                                None => State::Start,
                            }
                        } else {
                            State::ReadBody(conn, head, Vec::new())
                        }
                    }
                    Ok(Async::Ready(Some(Frame::Data(_)))) => {
                        return Err(Error::UnexpectedFrame);
                    }
                    Ok(Async::Ready(None)) => {
                        let reused = conn.is_reused();
                        if !conn.is_closing() {
                            conn.close();
                        }
                        if reused && !self.retried {
                            debug!("Pooled connection closed before \
                                response to {} {}, retrying",
                                self.method, self.url);
                            self.retried = true;
                            State::Start
                        } else {
                            return Err(Error::ConnectionClosed);
                        }
                    }
                    Ok(Async::NotReady) => {
                        self.state = State::ReadHead(conn);
                        return Ok(Async::NotReady);
                    }
                },
                State::ReadBody(mut conn, mut head, mut body) => {
                    match conn.wire().poll_read()? {
                        Async::Ready(Some(Frame::Data(chunk))) => {
                            if chunk.len() == 0 {
                                match self.finish(conn, head, body)? {
                                    Some(resp) => {
                                        return Ok(Async::Ready(resp));
                                    }
                                    None => State::Start,
                                }
                            } else {
                                if body.len() + chunk.len() >
                                    self.config.max_response_length
                                {
                                    return Err(Error::ResponseBodyTooLong);
                                }
                                body.extend(chunk);
                                State::ReadBody(conn, head, body)
                            }
                        }
                        Async::Ready(Some(Frame::Head(_))) => {
                            return Err(Error::UnexpectedFrame);
                        }
                        Async::Ready(None) => {
                            // body ended by closing the connection
                            head.keep_alive = false;
                            match self.finish(conn, head, body)? {
                                Some(resp) => return Ok(Async::Ready(resp)),
                                None => State::Start,
                            }
                        }
                        Async::NotReady => {
                            self.state = State::ReadBody(conn, head, body);
                            return Ok(Async::NotReady);
                        }
                    }
                }
                State::Void => unreachable!(),
            };
        }
    }
}

impl Response {
    pub fn code(&self) -> u16 {
        self.head.code
    }
    pub fn reason(&self) -> &str {
        &self.head.reason
    }
    pub fn headers(&self) -> &[(String, String)] {
        &self.head.headers
    }
    /// Value of the first header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }
    pub fn body(&self) -> &[u8] {
        &self.body
    }
    /// Whether connection was returned to the pool
    ///
    /// False if either side asked to close the connection or the body was
    /// terminated by the end of stream.
    pub fn keep_alive(&self) -> bool {
        self.head.keep_alive
    }
    /// Url of the final response (differs from requested after redirects)
    pub fn url(&self) -> &UrlParts {
        &self.url
    }
    pub fn head(&self) -> &ResponseHead {
        &self.head
    }
    pub fn into_parts(self) -> (ResponseHead, Vec<u8>) {
        (self.head, self.body)
    }
}

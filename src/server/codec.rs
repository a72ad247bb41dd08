use futures::{Async, Poll};
use httparse;
use tk_bufstream::{IoBuf, Buf};
use tokio_io::{AsyncRead, AsyncWrite};

use base_serializer::{MessageState, Body, HeaderError};
use body_parser::BodyProgress;
use error::Error;
use frame::{Frame, RequestHead, ResponseHead, owned_headers};
use headers::{self, BodyKind};
use version::Version;
use wire::Wire;


/// Number of headers to allocate on a stack
const MIN_HEADERS: usize = 16;
/// A hard limit on the number of headers
const MAX_HEADERS: usize = 1024;


enum ReadState {
    Headers,
    Body(BodyProgress),
}

/// Things we need to remember about the request to write a response
#[derive(Debug, Clone, Copy)]
struct RequestInfo {
    version: Version,
    is_head: bool,
    keep_alive: bool,
}

/// HTTP/1.x server side of the `Wire` over any byte stream
///
/// Parses requests (fixed-size and chunked bodies) and writes responses.
/// Sends `100 Continue` to clients which expect it, never sends a body
/// in response to `HEAD`, and adds `Connection: close` when connection is
/// going to be closed.
pub struct ServerCodec<S> {
    io: IoBuf<S>,
    reading: ReadState,
    writing: MessageState,
    request: RequestInfo,
    closing: bool,
}

fn parse_headers(buffer: &mut Buf)
    -> Result<Option<(RequestHead, BodyProgress, bool)>, Error>
{
    let (head, body, expect_continue, bytes) = {
        let mut vec;
        let mut headers = [httparse::EMPTY_HEADER; MIN_HEADERS];
        let mut raw = httparse::Request::new(&mut headers);
        let mut result = raw.parse(&buffer[..]);
        if matches!(result, Err(httparse::Error::TooManyHeaders)) {
            vec = vec![httparse::EMPTY_HEADER; MAX_HEADERS];
            raw = httparse::Request::new(&mut vec);
            result = raw.parse(&buffer[..]);
        }
        let bytes = match result? {
            httparse::Status::Complete(bytes) => bytes,
            httparse::Status::Partial => return Ok(None),
        };
        let version = Version::from_httparse(raw.version.unwrap_or(1));
        // request without a length has no body
        let framing = headers::scan(&*raw.headers, false, BodyKind::Fixed(0))?;
        let head = RequestHead {
            method: raw.method.unwrap_or("").to_string(),
            path: raw.path.unwrap_or("").to_string(),
            version: version,
            headers: owned_headers(&*raw.headers),
            keep_alive: framing.is_persistent(version),
        };
        (head, framing.body, framing.expect_continue, bytes)
    };
    buffer.consume(bytes);
    let expect = expect_continue && body != BodyKind::Fixed(0);
    Ok(Some((head, BodyProgress::new(body), expect)))
}

impl<S> ServerCodec<S> {
    pub fn new(sock: S) -> ServerCodec<S> {
        ServerCodec {
            io: IoBuf::new(sock),
            reading: ReadState::Headers,
            writing: MessageState::Done,
            request: RequestInfo {
                version: Version::Http11,
                is_head: false,
                keep_alive: true,
            },
            closing: false,
        }
    }
    fn write_head(&mut self, head: ResponseHead) -> Result<(), Error> {
        if head.code == 100 || !self.writing.is_complete() {
            return Err(Error::UnexpectedFrame);
        }
        let close = !self.request.keep_alive || !head.keep_alive ||
            head.headers.iter().any(|&(ref name, ref value)| {
                headers::is_connection(name) &&
                headers::has_token(value.as_bytes(), headers::is_close)
            });
        if close {
            self.closing = true;
        }
        let buf = &mut self.io.out_buf;
        let msg = &mut self.writing;
        *msg = MessageState::ResponseStart {
            version: self.request.version,
            body: if self.request.is_head { Body::Head } else { Body::Normal },
            close: close,
        };
        msg.response_status(buf, head.code, &head.reason);
        let mut has_date = false;
        for &(ref name, ref value) in &head.headers {
            if headers::is_content_length(name) {
                let len = value.trim().parse()
                    .map_err(|_| Error::BadContentLength)?;
                msg.add_length(buf, len)?;
            } else if headers::is_transfer_encoding(name) {
                if !headers::ends_with_chunked(value.as_bytes()) {
                    return Err(HeaderError::BodyLengthHeader.into());
                }
                msg.add_chunked(buf)?;
            } else if headers::is_connection(name) {
                // written by the serializer
                continue;
            } else {
                has_date = has_date || name.eq_ignore_ascii_case("Date");
                msg.add_header(buf, name, value.as_bytes())?;
            }
        }
        if !close && self.request.version == Version::Http10 {
            msg.add_header(buf, "Connection", b"keep-alive")?;
        }
        if !has_date {
            add_date(msg, buf);
        }
        msg.done_headers(buf)?;
        Ok(())
    }
}

#[cfg(feature="date_header")]
fn add_date(msg: &mut MessageState, buf: &mut Buf) {
    use httpdate::HttpDate;
    use std::time::SystemTime;
    msg.format_header(buf, "Date", HttpDate::from(SystemTime::now()))
        .ok();
}

#[cfg(not(feature="date_header"))]
fn add_date(_msg: &mut MessageState, _buf: &mut Buf) {
}

impl<S: AsyncRead + AsyncWrite> Wire for ServerCodec<S> {
    type In = RequestHead;
    type Out = ResponseHead;

    fn poll_read(&mut self) -> Poll<Option<Frame<RequestHead>>, Error> {
        loop {
            let end = match self.reading {
                ReadState::Headers => {
                    if self.io.in_buf.len() > 0 {
                        if let Some((head, body, expect)) =
                            parse_headers(&mut self.io.in_buf)?
                        {
                            self.request = RequestInfo {
                                version: head.version,
                                is_head: head.method == "HEAD",
                                keep_alive: head.keep_alive,
                            };
                            if expect {
                                let mut msg = MessageState::ResponseStart {
                                    version: head.version,
                                    body: Body::Normal,
                                    close: false,
                                };
                                msg.response_continue(&mut self.io.out_buf);
                            }
                            self.reading = ReadState::Body(body);
                            return Ok(Async::Ready(Some(Frame::Head(head))));
                        }
                    }
                    if self.io.read()? == 0 {
                        if self.io.done() {
                            self.closing = true;
                            if self.io.in_buf.len() > 0 {
                                debug!("Connection closed in the middle \
                                    of request headers");
                            }
                            return Ok(Async::Ready(None));
                        }
                        return Ok(Async::NotReady);
                    }
                    false
                }
                ReadState::Body(ref mut progress) => {
                    progress.parse(&mut self.io.in_buf)?;
                    let (bytes, done) = progress.check_buf(&self.io.in_buf);
                    if bytes > 0 {
                        let data = self.io.in_buf[..bytes].to_vec();
                        progress.consume(&mut self.io.in_buf, bytes);
                        return Ok(Async::Ready(Some(Frame::Data(data))));
                    }
                    if done {
                        true
                    } else {
                        // `100 Continue` might be waiting in the buffer
                        self.io.flush()?;
                        if self.io.read()? == 0 {
                            if self.io.done() {
                                self.closing = true;
                                return Err(Error::ResetOnRequestBody);
                            }
                            return Ok(Async::NotReady);
                        }
                        false
                    }
                }
            };
            if end {
                self.reading = ReadState::Headers;
                return Ok(Async::Ready(Some(Frame::Data(Vec::new()))));
            }
        }
    }

    fn start_write(&mut self, frame: Frame<ResponseHead>)
        -> Result<(), Error>
    {
        match frame {
            Frame::Head(head) => self.write_head(head),
            Frame::Data(ref data) if data.len() == 0 => {
                self.writing.done(&mut self.io.out_buf)?;
                Ok(())
            }
            Frame::Data(data) => {
                self.writing.write_body(&mut self.io.out_buf, &data)?;
                Ok(())
            }
        }
    }

    fn poll_flush(&mut self) -> Poll<(), Error> {
        self.io.flush()?;
        if self.io.out_buf.len() == 0 {
            Ok(Async::Ready(()))
        } else {
            Ok(Async::NotReady)
        }
    }

    fn write_eof(&mut self) {
        self.closing = true;
        self.io.flush().ok();
    }

    fn reset(&mut self) {
        self.reading = ReadState::Headers;
    }

    fn is_closing(&self) -> bool {
        self.closing
    }

    fn is_closed_by_peer(&mut self) -> bool {
        if !self.closing {
            match self.io.read() {
                Ok(0) if !self.io.done() => {}
                Ok(0) | Err(_) => self.closing = true,
                // pipelined request is fine on the server side
                Ok(_) => {}
            }
        }
        self.closing
    }
}

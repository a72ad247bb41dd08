use futures::{Async, Poll};
use httparse;
use tk_bufstream::{IoBuf, Buf};
use tokio_io::{AsyncRead, AsyncWrite};

use base_serializer::{MessageState, HeaderError, is_bodyless};
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


#[derive(Debug)]
enum ReadState {
    Headers,
    Body(BodyProgress),
}

enum BodyStep {
    Data(Vec<u8>),
    End,
    Eof,
    NotReady,
}

/// HTTP/1.x client side of the `Wire` over any byte stream
///
/// Writes requests and parses responses. Supports fixed-size, chunked, and
/// until-end-of-stream response bodies.
pub struct ClientCodec<S> {
    io: IoBuf<S>,
    reading: ReadState,
    writing: MessageState,
    is_head: bool,
    closing: bool,
}

fn parse_headers(buffer: &mut Buf, is_head: bool)
    -> Result<Option<(ResponseHead, BodyProgress)>, Error>
{
    let (head, body, bytes) = {
        let mut vec;
        let mut headers = [httparse::EMPTY_HEADER; MIN_HEADERS];
        let mut raw = httparse::Response::new(&mut headers);
        let mut result = raw.parse(&buffer[..]);
        if matches!(result, Err(httparse::Error::TooManyHeaders)) {
            vec = vec![httparse::EMPTY_HEADER; MAX_HEADERS];
            raw = httparse::Response::new(&mut vec);
            result = raw.parse(&buffer[..]);
        }
        let bytes = match result? {
            httparse::Status::Complete(bytes) => bytes,
            httparse::Status::Partial => return Ok(None),
        };
        let version = Version::from_httparse(raw.version.unwrap_or(1));
        let code = raw.code.unwrap_or(0);
        let framing = headers::scan(&*raw.headers,
            is_head || is_bodyless(code), BodyKind::Eof)?;
        let head = ResponseHead {
            version: version,
            code: code,
            reason: raw.reason.unwrap_or("").to_string(),
            headers: owned_headers(&*raw.headers),
            // body that lasts until the end of stream can't be followed
            // by another response
            keep_alive: framing.is_persistent(version)
                && framing.body != BodyKind::Eof,
        };
        (head, framing.body, bytes)
    };
    buffer.consume(bytes);
    Ok(Some((head, BodyProgress::new(body))))
}

fn read_body<S: AsyncRead>(io: &mut IoBuf<S>, progress: &mut BodyProgress)
    -> Result<BodyStep, Error>
{
    loop {
        progress.parse(&mut io.in_buf)?;
        let (bytes, done) = progress.check_buf(&io.in_buf);
        if bytes > 0 {
            let data = io.in_buf[..bytes].to_vec();
            progress.consume(&mut io.in_buf, bytes);
            return Ok(BodyStep::Data(data));
        }
        if done {
            return Ok(BodyStep::End);
        }
        if io.read()? == 0 {
            if io.done() {
                if progress.is_eof() {
                    return Ok(BodyStep::Eof);
                }
                return Err(Error::ResetOnResponseBody);
            }
            return Ok(BodyStep::NotReady);
        }
    }
}

impl<S> ClientCodec<S> {
    pub fn new(sock: S) -> ClientCodec<S> {
        ClientCodec {
            io: IoBuf::new(sock),
            reading: ReadState::Headers,
            writing: MessageState::Done,
            is_head: false,
            closing: false,
        }
    }
    fn write_head(&mut self, head: RequestHead) -> Result<(), Error> {
        if !self.writing.is_complete() {
            return Err(Error::UnexpectedFrame);
        }
        let buf = &mut self.io.out_buf;
        let msg = &mut self.writing;
        *msg = MessageState::RequestStart;
        self.is_head = head.method == "HEAD";
        msg.request_line(buf, &head.method, &head.path, head.version);
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
            } else {
                if headers::is_connection(name) &&
                    headers::has_token(value.as_bytes(), headers::is_close)
                {
                    self.closing = true;
                }
                msg.add_header(buf, name, value.as_bytes())?;
            }
        }
        msg.done_headers(buf)?;
        Ok(())
    }
}

impl<S: AsyncRead + AsyncWrite> Wire for ClientCodec<S> {
    type In = ResponseHead;
    type Out = RequestHead;

    fn poll_read(&mut self) -> Poll<Option<Frame<ResponseHead>>, Error> {
        loop {
            match self.reading {
                ReadState::Headers => {
                    if self.io.in_buf.len() > 0 {
                        let parsed = parse_headers(&mut self.io.in_buf,
                                                   self.is_head)?;
                        if let Some((head, body)) = parsed {
                            if head.code >= 100 && head.code < 200
                                && head.code != 101
                            {
                                debug!("Skipping interim response {}",
                                       head.code);
                                continue;
                            }
                            if !head.keep_alive {
                                self.closing = true;
                            }
                            self.reading = ReadState::Body(body);
                            return Ok(Async::Ready(Some(Frame::Head(head))));
                        }
                    }
                    if self.io.read()? == 0 {
                        if self.io.done() {
                            self.closing = true;
                            if self.io.in_buf.len() == 0 {
                                return Ok(Async::Ready(None));
                            }
                            return Err(Error::ResetOnResponseHeaders);
                        }
                        return Ok(Async::NotReady);
                    }
                    continue;
                }
                ReadState::Body(ref mut progress) => {
                    match read_body(&mut self.io, progress)? {
                        BodyStep::Data(data) => {
                            return Ok(Async::Ready(Some(Frame::Data(data))));
                        }
                        BodyStep::End => {}
                        BodyStep::Eof => {
                            self.closing = true;
                            return Ok(Async::Ready(None));
                        }
                        BodyStep::NotReady => return Ok(Async::NotReady),
                    }
                }
            }
            self.reading = ReadState::Headers;
            return Ok(Async::Ready(Some(Frame::Data(Vec::new()))));
        }
    }

    fn start_write(&mut self, frame: Frame<RequestHead>)
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
        // socket is closed when the codec is dropped
        self.io.flush().ok();
    }

    fn reset(&mut self) {
        self.reading = ReadState::Headers;
        self.is_head = false;
    }

    fn is_closing(&self) -> bool {
        self.closing
    }

    fn is_closed_by_peer(&mut self) -> bool {
        if self.closing {
            return true;
        }
        let closed = match self.io.read() {
            Ok(0) => self.io.done(),
            // a response which we didn't ask for
            Ok(_) => true,
            Err(e) => {
                debug!("Error on idle connection: {}", e);
                true
            }
        };
        if closed || self.io.in_buf.len() > 0 {
            self.closing = true;
        }
        self.closing
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::io::{self, Read, Write, Cursor};
    use std::rc::Rc;

    use futures::{Async, Poll};
    use tokio_io::{AsyncRead, AsyncWrite};

    use super::ClientCodec;
    use error::Error;
    use frame::{Frame, RequestHead, ResponseHead};
    use wire::Wire;

    struct Io {
        input: Cursor<Vec<u8>>,
        output: Rc<RefCell<Vec<u8>>>,
    }

    impl Read for Io {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }
    impl Write for Io {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }
    impl AsyncRead for Io {}
    impl AsyncWrite for Io {
        fn shutdown(&mut self) -> Poll<(), io::Error> {
            Ok(Async::Ready(()))
        }
    }

    fn codec(input: &str) -> (ClientCodec<Io>, Rc<RefCell<Vec<u8>>>) {
        let output = Rc::new(RefCell::new(Vec::new()));
        let io = Io {
            input: Cursor::new(input.as_bytes().to_vec()),
            output: output.clone(),
        };
        (ClientCodec::new(io), output)
    }

    fn read(codec: &mut ClientCodec<Io>) -> Option<Frame<ResponseHead>> {
        match codec.poll_read() {
            Ok(Async::Ready(x)) => x,
            Ok(Async::NotReady) => panic!("not ready"),
            Err(e) => panic!("error: {}", e),
        }
    }

    fn head(codec: &mut ClientCodec<Io>) -> ResponseHead {
        match read(codec) {
            Some(Frame::Head(h)) => h,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn data(codec: &mut ClientCodec<Io>) -> Vec<u8> {
        match read(codec) {
            Some(Frame::Data(d)) => d,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fixed_body() {
        let (mut c, _) = codec("HTTP/1.1 200 OK\r\n\
            Content-Length: 5\r\n\r\nhello");
        let h = head(&mut c);
        assert_eq!(h.code, 200);
        assert_eq!(h.reason, "OK");
        assert!(h.keep_alive);
        assert_eq!(data(&mut c), b"hello");
        assert_eq!(data(&mut c), b"");
        assert!(!c.is_closing());
        assert!(read(&mut c).is_none());
        assert!(c.is_closing());
    }

    #[test]
    fn chunked_body() {
        let (mut c, _) = codec("HTTP/1.1 200 OK\r\n\
            Transfer-Encoding: chunked\r\n\r\n\
            5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
        head(&mut c);
        let mut body = Vec::new();
        loop {
            let chunk = data(&mut c);
            if chunk.len() == 0 { break; }
            body.extend(chunk);
        }
        assert_eq!(body, b"hello world");
    }

    #[test]
    fn eof_body() {
        let (mut c, _) = codec("HTTP/1.0 200 OK\r\n\r\nuntil the end");
        let h = head(&mut c);
        assert!(!h.keep_alive);
        assert_eq!(data(&mut c), b"until the end");
        assert!(read(&mut c).is_none());
    }

    #[test]
    fn two_responses() {
        let (mut c, _) = codec("HTTP/1.1 204 No Content\r\n\r\n\
            HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
        assert_eq!(head(&mut c).code, 204);
        assert_eq!(data(&mut c), b"");
        assert_eq!(head(&mut c).code, 200);
        assert_eq!(data(&mut c), b"ok");
        assert_eq!(data(&mut c), b"");
    }

    #[test]
    fn head_response_then_next() {
        let (mut c, _) = codec("HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n\
            HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
        c.start_write(Frame::Head(RequestHead::new("HEAD", "/"))).unwrap();
        head(&mut c);
        c.reset();
        let h = head(&mut c);
        assert_eq!(h.header("content-length"), Some("2"));
        assert_eq!(data(&mut c), b"ok");
    }

    #[test]
    fn interim_response_skipped() {
        let (mut c, _) = codec("HTTP/1.1 100 Continue\r\n\r\n\
            HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(head(&mut c).code, 200);
    }

    #[test]
    fn connection_close() {
        let (mut c, _) = codec("HTTP/1.1 200 OK\r\nConnection: close\r\n\
            Content-Length: 0\r\n\r\n");
        assert!(!head(&mut c).keep_alive);
        assert!(c.is_closing());
    }

    #[test]
    fn reset_on_headers() {
        let (mut c, _) = codec("HTTP/1.1 200 OK\r\nContent-");
        match c.poll_read() {
            Err(Error::ResetOnResponseHeaders) => {}
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn reset_on_body() {
        let (mut c, _) = codec("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n\
            short");
        head(&mut c);
        assert_eq!(data(&mut c), b"short");
        match c.poll_read() {
            Err(Error::ResetOnResponseBody) => {}
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn write_request() {
        let (mut c, output) = codec("");
        let mut req = RequestHead::new("POST", "/x");
        req.headers.push(("Host".to_string(), "example.com".to_string()));
        req.headers.push(("Content-Length".to_string(), "5".to_string()));
        c.start_write(Frame::Head(req)).unwrap();
        c.start_write(Frame::Data(b"hello".to_vec())).unwrap();
        c.start_write(Frame::Data(Vec::new())).unwrap();
        assert!(matches!(c.poll_flush(), Ok(Async::Ready(()))));
        assert_eq!(&output.borrow()[..], &b"POST /x HTTP/1.1\r\n\
            Host: example.com\r\nContent-Length: 5\r\n\r\nhello"[..]);
    }

    #[test]
    fn write_chunked_request() {
        let (mut c, output) = codec("");
        let mut req = RequestHead::new("PUT", "/");
        req.headers.push(("Transfer-Encoding".to_string(),
                          "chunked".to_string()));
        c.start_write(Frame::Head(req)).unwrap();
        c.start_write(Frame::Data(b"abc".to_vec())).unwrap();
        c.start_write(Frame::Data(Vec::new())).unwrap();
        assert!(matches!(c.poll_flush(), Ok(Async::Ready(()))));
        assert_eq!(&output.borrow()[..], &b"PUT / HTTP/1.1\r\n\
            Transfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n"[..]);
    }

    #[test]
    fn closed_by_peer() {
        let (mut c, _) = codec("");
        assert!(c.is_closed_by_peer());
        let (mut c, _) = codec("HTTP/1.1 200 OK\r\n\r\n");
        assert!(c.is_closed_by_peer());
    }
}

use httparse::{InvalidChunkSize, parse_chunk_size};
use tk_bufstream::Buf;


/// Incremental decoder of the chunked transfer encoding
///
/// Decoded payload is kept in place at the start of the buffer: chunk
/// headers and delimiters are removed as soon as they are parsed, so
/// `buffered()` bytes at the front of the buffer are the body.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    buffered: usize,
    pending: usize,
    trailer: bool,
    done: bool,
}

impl State {
    pub fn new() -> State {
        State {
            buffered: 0,
            pending: 0,
            trailer: false,
            done: false,
        }
    }
    pub fn parse(&mut self, buf: &mut Buf) -> Result<(), InvalidChunkSize> {
        let State {
            ref mut buffered, ref mut pending,
            ref mut trailer, ref mut done,
        } = *self;
        while !*done && *buffered < buf.len() {
            if *trailer {
                // Trailer fields are skipped, we only need the final CRLF
                let rest = &buf[*buffered..];
                let end = if rest.starts_with(b"\r\n") {
                    Some(2)
                } else {
                    rest.windows(4).position(|w| w == b"\r\n\r\n")
                        .map(|x| x + 4)
                };
                match end {
                    Some(bytes) => {
                        buf.remove_range(*buffered..*buffered+bytes);
                        *done = true;
                    }
                    None => return Ok(()),
                }
            } else if *pending == 0 {
                use httparse::Status::*;
                match parse_chunk_size(&buf[*buffered..])? {
                    Complete((bytes, 0)) => {
                        buf.remove_range(*buffered..*buffered+bytes);
                        *trailer = true;
                    }
                    Complete((bytes, chunk_size)) => {
                        buf.remove_range(*buffered..*buffered+bytes);
                        // TODO(tailhook) check that chunk_size < usize
                        *pending = chunk_size as usize;
                    }
                    Partial => {
                        return Ok(());
                    }
                }
            } else if *buffered + *pending + 2 <= buf.len() {
                *buffered += *pending;
                *pending = 0;
                buf.remove_range(*buffered..*buffered+2);
            } else if *buffered + *pending <= buf.len() {
                // whole chunk is here but the CRLF after it is not
                return Ok(());
            } else {
                *pending -= buf.len() - *buffered;
                *buffered = buf.len();
            }
        }
        Ok(())
    }
    pub fn buffered(&self) -> usize {
        self.buffered
    }
    pub fn is_done(&self) -> bool {
        self.done
    }
    pub fn consume(&mut self, n: usize) {
        assert!(self.buffered >= n);
        self.buffered -= n;
    }
}

#[cfg(test)]
mod test {
    use super::State;
    use tk_bufstream::Buf;

    #[test]
    fn simple() {
        let mut state = State::new();
        let mut buf = Buf::new();
        buf.extend(b"4\r\nhell\r\n");
        assert_eq!(state.parse(&mut buf), Ok(()));
        assert_eq!(state.buffered(), 4);
        assert!(!state.is_done());
        state.consume(4);
        buf.consume(4);
        assert_eq!(state.buffered(), 0);
        buf.extend(b"0\r\n");
        assert_eq!(state.parse(&mut buf), Ok(()));
        assert!(!state.is_done());
        buf.extend(b"\r\n");
        assert_eq!(state.parse(&mut buf), Ok(()));
        assert!(state.is_done());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn split_chunk() {
        let mut state = State::new();
        let mut buf = Buf::new();
        buf.extend(b"5\r\nhel");
        assert_eq!(state.parse(&mut buf), Ok(()));
        assert_eq!(state.buffered(), 3);
        buf.extend(b"lo\r\n0\r\n\r\nHTTP/1.1");
        assert_eq!(state.parse(&mut buf), Ok(()));
        assert!(state.is_done());
        assert_eq!(&buf[..state.buffered()], b"hello");
        // next message is left untouched
        assert_eq!(&buf[5..], b"HTTP/1.1");
    }

    #[test]
    fn trailers_skipped() {
        let mut state = State::new();
        let mut buf = Buf::new();
        buf.extend(b"2\r\nok\r\n0\r\nX-Checksum: 1\r\n\r\n");
        assert_eq!(state.parse(&mut buf), Ok(()));
        assert!(state.is_done());
        assert_eq!(&buf[..], b"ok");
    }
}

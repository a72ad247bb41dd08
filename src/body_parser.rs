use httparse::InvalidChunkSize;
use tk_bufstream::Buf;

use chunked;
use headers::BodyKind;


#[derive(Debug, Clone)]
pub enum BodyProgress {
    Fixed(u64), // bytes left
    Eof, // only for client implemementation
    Chunked(chunked::State),
}

impl BodyProgress {
    pub fn new(kind: BodyKind) -> BodyProgress {
        match kind {
            BodyKind::Fixed(x) => BodyProgress::Fixed(x),
            BodyKind::Chunked => BodyProgress::Chunked(chunked::State::new()),
            BodyKind::Eof => BodyProgress::Eof,
        }
    }
    /// Returns useful number of bytes in buffer and "end" ("done") flag
    ///
    /// The `Eof` body is never done by itself, the end of stream is the
    /// only signal that it's over.
    pub fn check_buf(&self, buf: &Buf) -> (usize, bool) {
        use self::BodyProgress::*;
        match *self {
            Fixed(x) if x <= buf.len() as u64 => (x as usize, true),
            Fixed(_) => (buf.len(), false),
            Chunked(ref s) => (s.buffered(), s.is_done()),
            Eof => (buf.len(), false),
        }
    }
    pub fn parse(&mut self, buf: &mut Buf) -> Result<(), InvalidChunkSize> {
        use self::BodyProgress::*;
        match *self {
            Fixed(_) => {},
            Chunked(ref mut s) => s.parse(buf)?,
            Eof => {}
        }
        Ok(())
    }
    pub fn consume(&mut self, buf: &mut Buf, n: usize) {
        use self::BodyProgress::*;
        buf.consume(n);
        match *self {
            Fixed(ref mut x) => {
                assert!(*x >= n as u64);
                *x -= n as u64;
            }
            Chunked(ref mut s) => s.consume(n),
            Eof => {}
        }
    }
    pub fn is_eof(&self) -> bool {
        matches!(*self, BodyProgress::Eof)
    }
}

use std::str::from_utf8;

use httparse::Header;

use error::Error;
use version::Version;


/// How the length of a message body is determined
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Fixed(u64),
    Chunked,
    /// Body lasts until the connection is closed (responses only)
    Eof,
}

/// Framing-related facts collected from message headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framing {
    pub body: BodyKind,
    pub close: bool,
    pub keep_alive: bool,
    pub expect_continue: bool,
}

impl Framing {
    /// Whether connection may be reused after this message
    ///
    /// HTTP/1.1 is persistent unless `Connection: close` is sent, HTTP/1.0
    /// only when `Connection: keep-alive` is sent.
    pub fn is_persistent(&self, version: Version) -> bool {
        !self.close && (version == Version::Http11 || self.keep_alive)
    }
}

pub fn is_transfer_encoding(val: &str) -> bool {
    val.eq_ignore_ascii_case("Transfer-Encoding")
}

pub fn is_content_length(val: &str) -> bool {
    val.eq_ignore_ascii_case("Content-Length")
}

pub fn is_connection(val: &str) -> bool {
    val.eq_ignore_ascii_case("Connection")
}

pub fn is_host(val: &str) -> bool {
    val.eq_ignore_ascii_case("Host")
}

pub fn is_expect(val: &str) -> bool {
    val.eq_ignore_ascii_case("Expect")
}

fn trim(val: &[u8]) -> &[u8] {
    let ws = |c: &u8| matches!(*c, b'\r' | b'\n' | b' ' | b'\t');
    let start = val.iter().position(|c| !ws(c)).unwrap_or(val.len());
    let end = val.iter().rposition(|c| !ws(c)).map(|x| x + 1).unwrap_or(start);
    &val[start..end]
}

// header value is byte sequence
// we need case insensitive comparison and strip out of the whitespace
fn is_token(val: &[u8], token: &str) -> bool {
    trim(val).eq_ignore_ascii_case(token.as_bytes())
}

pub fn is_close(val: &[u8]) -> bool {
    is_token(val, "close")
}

pub fn is_keep_alive(val: &[u8]) -> bool {
    is_token(val, "keep-alive")
}

pub fn is_chunked(val: &[u8]) -> bool {
    is_token(val, "chunked")
}

pub fn is_continue(val: &[u8]) -> bool {
    is_token(val, "100-continue")
}

/// Checks every element of a comma-separated header value
pub fn has_token<F: Fn(&[u8]) -> bool>(val: &[u8], check: F) -> bool {
    val.split(|&x| x == b',').any(check)
}

/// Chunked encoding is only in effect when it's the last one applied
pub fn ends_with_chunked(val: &[u8]) -> bool {
    val.split(|&x| x == b',').last().map(is_chunked).unwrap_or(false)
}

/// Implements the body length algorithm of RFC 7230 section 3.3.3
///
/// 1. `bodyless` messages (responses to HEAD, 1xx, 204, 304) have no body
/// 2. If last transfer encoding is chunked -> Chunked
/// 3. If Content-Length -> Fixed
/// 4. Else `unknown` (`Eof` for responses, `Fixed(0)` for requests)
pub fn scan(headers: &[Header], bodyless: bool, unknown: BodyKind)
    -> Result<Framing, Error>
{
    let mut has_content_length = false;
    let mut framing = Framing {
        body: unknown,
        close: false,
        keep_alive: false,
        expect_continue: false,
    };
    for header in headers.iter() {
        if is_connection(header.name) {
            if has_token(header.value, is_close) {
                framing.close = true;
            }
            if has_token(header.value, is_keep_alive) {
                framing.keep_alive = true;
            }
        } else if is_expect(header.name) {
            framing.expect_continue = is_continue(header.value);
        } else if bodyless {
            continue;
        } else if is_transfer_encoding(header.name) {
            if ends_with_chunked(header.value) {
                if has_content_length {
                    // override but don't allow keep-alive
                    framing.close = true;
                }
                framing.body = BodyKind::Chunked;
            }
        } else if is_content_length(header.name) {
            if has_content_length {
                return Err(Error::DuplicateContentLength);
            }
            has_content_length = true;
            if framing.body != BodyKind::Chunked {
                let s = from_utf8(header.value)
                    .map_err(|_| Error::BadContentLength)?;
                let len = s.trim().parse()
                    .map_err(|_| Error::BadContentLength)?;
                framing.body = BodyKind::Fixed(len);
            } else {
                // transfer-encoding has preference and don't allow keep-alive
                framing.close = true;
            }
        }
    }
    if bodyless {
        framing.body = BodyKind::Fixed(0);
    }
    Ok(framing)
}

/// Finds the first header with the name, case-insensitively
pub fn find<'a>(headers: &'a [(String, String)], name: &str)
    -> Option<&'a str>
{
    headers.iter()
        .find(|&&(ref k, _)| k.eq_ignore_ascii_case(name))
        .map(|&(_, ref v)| &v[..])
}

#[cfg(test)]
mod test {
    use httparse::Header;

    use super::{is_content_length, is_transfer_encoding, is_connection};
    use super::{is_chunked, is_close, is_continue, is_keep_alive};
    use super::{ends_with_chunked, scan, BodyKind};
    use error::Error;
    use version::Version;

    fn h<'x>(name: &'x str, value: &'x str) -> Header<'x> {
        Header { name: name, value: value.as_bytes() }
    }

    #[test]
    fn test_names() {
        assert!(is_content_length("Content-Length"));
        assert!(is_content_length("CONTENT-length"));
        assert!(is_transfer_encoding("transfer-ENCODING"));
        assert!(is_connection("ConneCTION"));
        assert!(!is_connection("Connections"));
    }

    #[test]
    fn test_chunked() {
        assert!(is_chunked(b"chunked"));
        assert!(is_chunked(b"chuNKED"));
        assert!(is_chunked(b"   CHUNKED  "));
        assert!(!is_chunked(b"   CHUNKED 1 "));
        assert!(ends_with_chunked(b"gzip, chunked"));
        assert!(!ends_with_chunked(b"chunked, gzip"));
    }

    #[test]
    fn test_close() {
        assert!(is_close(b"close"));
        assert!(is_close(b"   clOSE   "));
        assert!(!is_close(b"Close  1 "));
        assert!(!is_close(b" xclose   "));
        assert!(is_keep_alive(b" Keep-Alive"));
    }

    #[test]
    fn test_continue() {
        assert!(is_continue(b"100-Continue"));
        assert!(is_continue(b"   100-continue   "));
        assert!(!is_continue(b"100-coztinue   "));
    }

    #[test]
    fn fixed_body() {
        let headers = [h("Content-Length", " 12 "), h("Connection", "close")];
        let framing = scan(&headers, false, BodyKind::Eof).unwrap();
        assert_eq!(framing.body, BodyKind::Fixed(12));
        assert!(framing.close);
        assert!(!framing.is_persistent(Version::Http11));
    }

    #[test]
    fn chunked_wins_but_closes() {
        let headers = [h("Content-Length", "5"),
                       h("Transfer-Encoding", "chunked")];
        let framing = scan(&headers, false, BodyKind::Eof).unwrap();
        assert_eq!(framing.body, BodyKind::Chunked);
        assert!(!framing.is_persistent(Version::Http11));
    }

    #[test]
    fn bodyless_ignores_length() {
        let headers = [h("Content-Length", "nonsense")];
        let framing = scan(&headers, true, BodyKind::Eof).unwrap();
        assert_eq!(framing.body, BodyKind::Fixed(0));
    }

    #[test]
    fn unknown_length() {
        let framing = scan(&[], false, BodyKind::Eof).unwrap();
        assert_eq!(framing.body, BodyKind::Eof);
        assert!(framing.is_persistent(Version::Http11));
        assert!(!framing.is_persistent(Version::Http10));
    }

    #[test]
    fn http10_keep_alive() {
        let headers = [h("Connection", "Keep-Alive")];
        let framing = scan(&headers, false, BodyKind::Eof).unwrap();
        assert!(framing.is_persistent(Version::Http10));
    }

    #[test]
    fn duplicate_length() {
        let headers = [h("Content-Length", "5"), h("content-length", "5")];
        match scan(&headers, false, BodyKind::Eof) {
            Err(Error::DuplicateContentLength) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}

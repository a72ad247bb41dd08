use std::str::from_utf8;

use httparse::Header;

use headers;
use version::Version;


/// A single unit read from or written to a `Wire`
///
/// Message is a `Head` followed by zero or more non-empty `Data` frames and
/// exactly one empty `Data` frame that terminates the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<H> {
    Head(H),
    Data(Vec<u8>),
}

/// Request line and headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub version: Version,
    pub headers: Vec<(String, String)>,
    /// Whether connection may be reused after the response
    ///
    /// Filled in by the server codec, ignored when writing.
    pub keep_alive: bool,
}

/// Status line and headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    /// Whether connection may be reused after this response
    pub keep_alive: bool,
}

impl<H> Frame<H> {
    /// Returns true for an empty data frame (end of message body)
    pub fn is_end(&self) -> bool {
        matches!(*self, Frame::Data(ref x) if x.len() == 0)
    }
}

impl RequestHead {
    /// A `HTTP/1.1` request without headers
    pub fn new(method: &str, path: &str) -> RequestHead {
        RequestHead {
            method: method.to_string(),
            path: path.to_string(),
            version: Version::Http11,
            headers: Vec::new(),
            keep_alive: true,
        }
    }
    /// Value of the first header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        headers::find(&self.headers, name)
    }
}

impl ResponseHead {
    /// A `HTTP/1.1` keep-alive response without headers
    pub fn new(code: u16, reason: &str) -> ResponseHead {
        ResponseHead {
            version: Version::Http11,
            code: code,
            reason: reason.to_string(),
            headers: Vec::new(),
            keep_alive: true,
        }
    }
    /// Append a header
    pub fn add_header<N, V>(&mut self, name: N, value: V) -> &mut Self
        where N: Into<String>, V: Into<String>,
    {
        self.headers.push((name.into(), value.into()));
        self
    }
    /// Value of the first header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        headers::find(&self.headers, name)
    }
}

/// Copies parsed headers into owned pairs
///
/// Values that are not valid utf-8 are converted lossily.
pub fn owned_headers(raw: &[Header]) -> Vec<(String, String)> {
    raw.iter().map(|h| {
        let value = match from_utf8(h.value) {
            Ok(x) => x.to_string(),
            Err(_) => String::from_utf8_lossy(h.value).into_owned(),
        };
        (h.name.to_string(), value)
    }).collect()
}

#[cfg(test)]
mod test {
    use super::{Frame, ResponseHead};

    #[test]
    fn end_frame() {
        assert!(Frame::Data::<ResponseHead>(vec![]).is_end());
        assert!(!Frame::Data::<ResponseHead>(b"x".to_vec()).is_end());
        assert!(!Frame::Head(ResponseHead::new(200, "OK")).is_end());
    }

    #[test]
    fn header_lookup() {
        let mut head = ResponseHead::new(301, "Moved Permanently");
        head.add_header("LOCATION", "/b");
        assert_eq!(head.header("location"), Some("/b"));
        assert_eq!(head.header("Content-Length"), None);
    }
}

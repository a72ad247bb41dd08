//! Redirect policy and resolution of the `Location` header
use error::Error;
use frame::ResponseHead;
use client::{Config, UrlParts};


/// Value of the `Location` header (case-insensitive lookup)
pub fn location(head: &ResponseHead) -> Option<&str> {
    head.header("Location")
}

/// Whether request with this method should follow the redirect status
pub fn is_eligible(config: &Config, method: &str, code: u16) -> bool {
    config.follow_redirects &&
        config.redirection_codes.contains(&code) &&
        config.redirection_methods.iter().any(|m| m == method)
}

/// Resolve the target of the redirect against the url of the request
///
/// Relative references are resolved as in RFC 3986 section 5: scheme,
/// host and port are inherited, dot segments are removed, query comes
/// from the reference. The fragment of the base url is kept if the
/// reference has none (RFC 7231 section 7.1.2).
pub fn resolve(base: &UrlParts, head: &ResponseHead)
    -> Result<UrlParts, Error>
{
    let location = location(head).ok_or(Error::NoLocationHeader)?;
    let target = base.to_url()?
        .join(location.trim())
        .map_err(|_| Error::InvalidUrl)?;
    let mut parts = UrlParts::from_url(&target)?;
    if parts.fragment.is_none() {
        parts.fragment = base.fragment.clone();
    }
    Ok(parts)
}

#[cfg(test)]
mod test {
    use super::{resolve, is_eligible};
    use client::{Config, UrlParts};
    use error::Error;
    use frame::ResponseHead;

    fn moved(location: &str) -> ResponseHead {
        let mut head = ResponseHead::new(301, "Moved Permanently");
        head.add_header("location", location);
        head
    }

    fn target(base: &str, location: &str) -> String {
        let base = UrlParts::parse(base).unwrap();
        resolve(&base, &moved(location)).unwrap().to_string()
    }

    #[test]
    fn absolute_path() {
        assert_eq!(target("http://example.com/a", "/b"),
                   "http://example.com/b");
        assert_eq!(target("http://example.com:8080/a/b", "/c?x=1"),
                   "http://example.com:8080/c?x=1");
    }

    #[test]
    fn relative_path() {
        assert_eq!(target("http://example.com/a/b", "c"),
                   "http://example.com/a/c");
        assert_eq!(target("http://example.com/a/b/c", "../d"),
                   "http://example.com/a/d");
        assert_eq!(target("http://example.com/a?q", "?z"),
                   "http://example.com/a?z");
    }

    #[test]
    fn absolute_url() {
        assert_eq!(target("http://example.com/a", "https://other.org/x"),
                   "https://other.org/x");
        assert_eq!(target("https://example.com/a", "//cdn.example.com/x"),
                   "https://cdn.example.com/x");
    }

    #[test]
    fn fragment() {
        assert_eq!(target("http://example.com/a#top", "/b"),
                   "http://example.com/b#top");
        assert_eq!(target("http://example.com/a#top", "/b#bottom"),
                   "http://example.com/b#bottom");
    }

    #[test]
    fn no_location() {
        let base = UrlParts::parse("http://example.com/").unwrap();
        let head = ResponseHead::new(302, "Found");
        match resolve(&base, &head) {
            Err(Error::NoLocationHeader) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unsupported_target() {
        let base = UrlParts::parse("http://example.com/").unwrap();
        match resolve(&base, &moved("ftp://example.com/file")) {
            Err(Error::InvalidUrl) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn eligibility() {
        let cfg = Config::new();
        assert!(is_eligible(&cfg, "GET", 301));
        assert!(is_eligible(&cfg, "HEAD", 307));
        assert!(!is_eligible(&cfg, "POST", 302));
        assert!(!is_eligible(&cfg, "GET", 303));
        assert!(!is_eligible(&cfg, "GET", 200));
        let cfg = Config::new().follow_redirects(false).done();
        assert!(!is_eligible(&cfg, "GET", 301));
        let cfg = Config::new().redirection_codes(&[303]).done();
        assert!(is_eligible(&cfg, "GET", 303));
    }
}

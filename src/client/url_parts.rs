use std::fmt;

use url::Url;

use error::Error;


/// Components of an absolute `http://` or `https://` url
///
/// These are exactly the pieces needed to make a request: where to connect
/// (`hostname`, `port`, `secure`), what to put into the `Host` header
/// (`host`) and into the request line (`path`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlParts {
    /// Scheme is `https`
    pub secure: bool,
    /// Hostname with the port suffix if the port is not the default one
    pub host: String,
    /// Bare hostname (IPv6 addresses keep the brackets)
    pub hostname: String,
    pub port: u16,
    /// Path including the query string, never empty
    pub path: String,
    /// Non-empty fragment
    pub fragment: Option<String>,
}

fn has_http_scheme(url: &str) -> bool {
    let url = url.trim_left();
    match url.find("://") {
        Some(idx) => {
            let scheme = &url[..idx];
            scheme.eq_ignore_ascii_case("http")
                || scheme.eq_ignore_ascii_case("https")
        }
        None => false,
    }
}

impl UrlParts {
    /// Parse an absolute url
    ///
    /// Fails with `Error::InvalidUrl` unless it's `http://` or `https://`
    /// url with a non-empty host.
    pub fn parse(url: &str) -> Result<UrlParts, Error> {
        if !has_http_scheme(url) {
            return Err(Error::InvalidUrl);
        }
        let url = Url::parse(url).map_err(|_| Error::InvalidUrl)?;
        UrlParts::from_url(&url)
    }
    /// Build from an already parsed url
    pub fn from_url(url: &Url) -> Result<UrlParts, Error> {
        let secure = match url.scheme() {
            "http" => false,
            "https" => true,
            _ => return Err(Error::InvalidUrl),
        };
        let hostname = match url.host_str() {
            Some(h) if h.len() > 0 => h.to_string(),
            _ => return Err(Error::InvalidUrl),
        };
        // `url` strips the port when it's the default for the scheme
        let (host, port) = match url.port() {
            Some(port) => (format!("{}:{}", hostname, port), port),
            None => (hostname.clone(), if secure { 443 } else { 80 }),
        };
        let mut path = if url.path().len() > 0 {
            url.path().to_string()
        } else {
            String::from("/")
        };
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        let fragment = match url.fragment() {
            Some(f) if f.len() > 0 => Some(f.to_string()),
            _ => None,
        };
        Ok(UrlParts {
            secure: secure,
            host: host,
            hostname: hostname,
            port: port,
            path: path,
            fragment: fragment,
        })
    }
    /// Convert back to the `url::Url`
    pub fn to_url(&self) -> Result<Url, Error> {
        Url::parse(&self.to_string()).map_err(|_| Error::InvalidUrl)
    }
    /// Returns `http` or `https`
    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }
}

impl fmt::Display for UrlParts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme(), self.host, self.path)?;
        if let Some(ref frag) = self.fragment {
            write!(f, "#{}", frag)?;
        }
        Ok(())
    }
}

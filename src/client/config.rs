use std::sync::Arc;
use std::time::Duration;

use client::{Config};

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            timeout: None,
            follow_redirects: true,
            redirection_codes: vec![301, 302, 307],
            redirection_methods: vec!["HEAD".to_string(), "GET".to_string()],
            max_redirects: 10,
            max_response_length: 10_485_760,
        }
    }
    /// Timeout for establishing a connection
    ///
    /// Reused connections are not affected. There is no timeout by default.
    pub fn timeout(&mut self, value: Duration) -> &mut Self {
        self.timeout = Some(value);
        self
    }
    /// Whether redirects should be followed automatically (default `true`)
    pub fn follow_redirects(&mut self, value: bool) -> &mut Self {
        self.follow_redirects = value;
        self
    }
    /// Status codes that are followed as redirects
    ///
    /// Default is `301`, `302`, `307`.
    pub fn redirection_codes(&mut self, codes: &[u16]) -> &mut Self {
        self.redirection_codes = codes.to_vec();
        self
    }
    /// Methods of requests that are followed when redirected
    ///
    /// Default is `HEAD` and `GET`. The body is never sent again after
    /// redirect, so it doesn't make much sense to add `POST` here.
    pub fn redirection_methods(&mut self, methods: &[&str]) -> &mut Self {
        self.redirection_methods = methods.iter()
            .map(|x| x.to_string()).collect();
        self
    }
    /// Maximum number of redirects in a chain (default 10)
    pub fn max_redirects(&mut self, value: usize) -> &mut Self {
        self.max_redirects = value;
        self
    }
    /// Maximum size of the response body that is buffered (default 10MiB)
    pub fn max_response_length(&mut self, value: usize) -> &mut Self {
        self.max_response_length = value;
        self
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}

impl Config {
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }
    pub fn get_follow_redirects(&self) -> bool {
        self.follow_redirects
    }
    pub fn get_redirection_codes(&self) -> &[u16] {
        &self.redirection_codes
    }
    pub fn get_redirection_methods(&self) -> &[String] {
        &self.redirection_methods
    }
    pub fn get_max_redirects(&self) -> usize {
        self.max_redirects
    }
    pub fn get_max_response_length(&self) -> usize {
        self.max_response_length
    }
}

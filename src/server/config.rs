use std::sync::Arc;

use server::{Config};

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            max_request_length: 10_485_760,
        }
    }
    /// Maximum size of the request body (default 10MiB)
    ///
    /// Connection is closed if request is larger.
    pub fn max_request_length(&mut self, value: usize) -> &mut Self {
        self.max_request_length = value;
        self
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}

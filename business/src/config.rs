//! Client-side configuration.

use ustr::Ustr;

/// Where the kiosk backend lives.
#[derive(Debug, Clone)]
pub struct BusinessConfig {
    pub api_base_url: String,
}

impl BusinessConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
        }
    }

    /// Base URL with any trailing slash stripped, interned for cheap
    /// sharing with the request paths appended by the gateway.
    pub fn api_url(&self) -> Ustr {
        Ustr::from(self.api_base_url.trim_end_matches('/'))
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        // The demo service binds port 5000 locally.
        Self::new("http://127.0.0.1:5000")
    }
}

//! Limits for message head parsing.

/// Bounds on the header block of a request or response.
///
/// | Field | Default |
/// |-------|---------|
/// | `max_headers` | 100 |
/// | `max_line_len` | 8192 |
///
/// # Example
///
/// ```ignore
/// let config = HttpConfig::new().with_max_headers(32).with_max_line_len(1024);
/// let parser = RequestParser::with_config(config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    /// Maximum number of header fields in one head or trailer.
    pub max_headers: usize,
    /// Maximum octets in one start line or header line, CRLF included.
    pub max_line_len: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl HttpConfig {
    /// Default limits, usable in const contexts.
    pub const DEFAULT: Self = Self {
        max_headers: 100,
        max_line_len: 8192,
    };

    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[inline]
    pub const fn with_max_headers(mut self, max: usize) -> Self {
        self.max_headers = max;
        self
    }

    /// Sets the longest accepted line, in octets.
    #[inline]
    pub const fn with_max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = HttpConfig::new().with_max_headers(3).with_max_line_len(40);
        assert_eq!(config.max_headers, 3);
        assert_eq!(config.max_line_len, 40);
        assert_eq!(HttpConfig::default(), HttpConfig::DEFAULT);
    }
}

//! Parse limits and configuration.

use crate::CancelToken;

/// Default cap on triangles per file.
pub const DEFAULT_MAX_TRIANGLES: u32 = 10_000_000;

/// Default cap on ASCII line length in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// Configuration for a parse invocation.
///
/// The two limits are the subsystem's guard against oversized or
/// adversarial input; there is no timeout beyond the caller's
/// [`CancelToken`]. Defaults match the documented safety caps.
///
/// # Example
///
/// ```
/// use stl_io::{CancelToken, ParseOptions};
///
/// let token = CancelToken::new();
/// let options = ParseOptions::default()
///     .with_max_triangles(500_000)
///     .with_cancel_token(token.clone());
/// assert_eq!(options.max_triangles, 500_000);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Hard cap on triangles; exceeding it aborts the parse.
    pub max_triangles: u32,
    /// Hard cap on a single ASCII line, in bytes.
    pub max_line_length: usize,
    /// Cooperative cancellation handle checked at iteration boundaries.
    pub cancel: CancelToken,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_triangles: DEFAULT_MAX_TRIANGLES,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            cancel: CancelToken::new(),
        }
    }
}

impl ParseOptions {
    /// Set the triangle cap.
    #[must_use]
    pub fn with_max_triangles(mut self, max: u32) -> Self {
        self.max_triangles = max;
        self
    }

    /// Set the ASCII line-length cap in bytes.
    #[must_use]
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_caps() {
        let options = ParseOptions::default();
        assert_eq!(options.max_triangles, 10_000_000);
        assert_eq!(options.max_line_length, 1024);
        assert!(!options.cancel.is_cancelled());
    }

    #[test]
    fn builders_compose() {
        let options = ParseOptions::default()
            .with_max_triangles(7)
            .with_max_line_length(80);
        assert_eq!(options.max_triangles, 7);
        assert_eq!(options.max_line_length, 80);
    }
}

//! Parser configuration for resource limits.
//!
//! This module provides [`ParseConfig`] for bounding the resources a parse
//! may use, and [`NestingGuard`] for carrying a nesting budget through
//! suspended parser states.
//!
//! # Nesting Limits
//!
//! Every parser in this crate family is a state machine that resumes its
//! children from inside its own `feed` call. A state nested `n` levels deep
//! therefore uses `n` native stack frames while input is flowing. The
//! default limit of 128 follows `serde_json`.
//!
//! # Example
//!
//! ```ignore
//! use pullkit_core::config::ParseConfig;
//!
//! // Use default limits (nesting depth: 128)
//! let config = ParseConfig::default();
//!
//! // Allow deeper nesting and cap the input size
//! let config = ParseConfig::new()
//!     .with_max_nesting_depth(256)
//!     .with_max_input_len(1 << 20);
//! ```

use crate::Error;

/// Configuration for parser resource limits.
///
/// # Default Values
///
/// | Setting | Default | Rationale |
/// |---------|---------|-----------|
/// | `max_nesting_depth` | 128 | Matches serde_json default |
/// | `max_input_len` | `usize::MAX` | No limit by default |
///
/// # Security Considerations
///
/// Without nesting limits, deeply nested input like `{{{{{{...}}}}}}` can
/// cause stack overflow while a parser resumes its nested states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum allowed nesting depth.
    ///
    /// Each record, markup, attribute value, group or selector predicate
    /// enters one level. Exceeding the limit fails the parse with
    /// [`Error::NestingLimitExceeded`].
    ///
    /// Default: 128 (matching serde_json)
    pub max_nesting_depth: usize,

    /// Maximum number of code points an incremental driver accepts.
    ///
    /// Default: `usize::MAX` (no limit)
    pub max_input_len: usize,
}

impl Default for ParseConfig {
    /// Returns the default configuration.
    ///
    /// - `max_nesting_depth`: 128
    /// - `max_input_len`: `usize::MAX`
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ParseConfig {
    /// Default configuration, usable in const contexts.
    pub const DEFAULT: Self = Self {
        max_nesting_depth: 128,
        max_input_len: usize::MAX,
    };

    /// Creates a new configuration with default values.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Sets the maximum nesting depth.
    ///
    /// # Arguments
    ///
    /// * `depth` - Maximum nesting level. Use `usize::MAX` to disable the limit.
    #[inline]
    pub const fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Sets the maximum input length in code points.
    #[inline]
    pub const fn with_max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = len;
        self
    }

    /// Disables the nesting limit.
    ///
    /// # Warning
    ///
    /// Only use this when parsing trusted input! Untrusted deeply-nested
    /// input can cause stack overflow.
    #[inline]
    pub const fn disable_nesting_limit(self) -> Self {
        self.with_max_nesting_depth(usize::MAX)
    }

    /// A guard at depth 0 enforcing this configuration's nesting limit.
    #[inline]
    pub const fn guard(&self) -> NestingGuard {
        NestingGuard::new(self.max_nesting_depth)
    }
}

/// Tracks nesting depth inside suspended parser states.
///
/// Unlike a mutable depth counter, a guard is a `Copy` value: a parent
/// state keeps its own guard and hands [`enter`](Self::enter)ed copies to
/// the children it creates. Dropping a child state needs no matching
/// "exit" call.
///
/// # Example
///
/// ```ignore
/// struct RecordParser {
///     guard: NestingGuard,
///     // ...
/// }
///
/// fn nested(&self, input: &mut impl Input) -> Parsed<Self, Value> {
///     let guard = match self.guard.enter() {
///         Ok(guard) => guard,
///         Err(error) => return Parsed::Error(Diagnostic::limit(error, input)),
///     };
///     // ... create the child parser with `guard` ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestingGuard {
    depth: usize,
    limit: usize,
}

impl NestingGuard {
    /// Creates a new guard with depth 0.
    #[inline]
    pub const fn new(limit: usize) -> Self {
        Self { depth: 0, limit }
    }

    /// Current nesting depth.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Maximum allowed depth.
    #[inline]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns a guard one level deeper.
    ///
    /// Returns `Err(Error::NestingLimitExceeded)` if the new depth would
    /// exceed the limit.
    #[inline]
    pub fn enter(self) -> Result<Self, Error> {
        let depth = self.depth.saturating_add(1);
        if depth > self.limit {
            Err(Error::NestingLimitExceeded {
                depth,
                limit: self.limit,
            })
        } else {
            Ok(Self {
                depth,
                limit: self.limit,
            })
        }
    }
}

impl Default for NestingGuard {
    fn default() -> Self {
        ParseConfig::DEFAULT.guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_defaults() {
        let config = ParseConfig::default();
        assert_eq!(config.max_nesting_depth, 128);
        assert_eq!(config.max_input_len, usize::MAX);
    }

    #[test]
    fn test_parse_config_builder() {
        let config = ParseConfig::new()
            .with_max_nesting_depth(256)
            .with_max_input_len(10000);

        assert_eq!(config.max_nesting_depth, 256);
        assert_eq!(config.max_input_len, 10000);
    }

    #[test]
    fn test_parse_config_disable_nesting() {
        let config = ParseConfig::new().disable_nesting_limit();
        assert_eq!(config.max_nesting_depth, usize::MAX);
    }

    #[test]
    fn test_nesting_guard_enter_copies() {
        let root = NestingGuard::new(128);
        let child = root.enter().unwrap();
        let grandchild = child.enter().unwrap();

        assert_eq!(root.depth(), 0);
        assert_eq!(child.depth(), 1);
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn test_nesting_guard_limit_exceeded() {
        let mut guard = NestingGuard::new(3);

        for _ in 0..3 {
            guard = guard.enter().unwrap();
        }
        assert_eq!(guard.depth(), 3);

        let result = guard.enter();
        assert!(matches!(
            result,
            Err(Error::NestingLimitExceeded { depth: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_nesting_guard_saturates() {
        let guard = ParseConfig::new().disable_nesting_limit().guard();
        assert!(guard.enter().is_ok());
    }
}

//! Parser and renderer configuration.

use crate::error::ConfigError;

/// Flags controlling parsing and rendering.
///
/// The same value is handed to the [`Parser`](crate::Parser) and to the
/// renderers; each component reads only the flags that concern it.
///
/// ```rust
/// use commark_core::Options;
///
/// let options = Options::default().with_smart(true).with_safe(true);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    /// Attach line/column spans to block nodes and emit them when rendering.
    pub source_pos: bool,
    /// Render soft breaks as hard breaks.
    pub hard_breaks: bool,
    /// Suppress raw HTML and dangerous link targets when rendering HTML.
    pub safe: bool,
    /// Render soft breaks as spaces.
    pub no_breaks: bool,
    /// Replace invalid UTF-8 silently instead of logging a warning.
    pub validate_utf8: bool,
    /// Convert straight quotes, dashes and ellipses to typographic forms.
    pub smart: bool,
}

impl Options {
    /// Enable or disable source position tracking.
    pub fn with_source_pos(mut self, enabled: bool) -> Self {
        self.source_pos = enabled;
        self
    }

    /// Enable or disable rendering soft breaks as hard breaks.
    pub fn with_hard_breaks(mut self, enabled: bool) -> Self {
        self.hard_breaks = enabled;
        self
    }

    /// Enable or disable safe mode.
    pub fn with_safe(mut self, enabled: bool) -> Self {
        self.safe = enabled;
        self
    }

    /// Enable or disable rendering soft breaks as spaces.
    pub fn with_no_breaks(mut self, enabled: bool) -> Self {
        self.no_breaks = enabled;
        self
    }

    /// Enable or disable silent UTF-8 substitution.
    pub fn with_validate_utf8(mut self, enabled: bool) -> Self {
        self.validate_utf8 = enabled;
        self
    }

    /// Enable or disable smart punctuation.
    pub fn with_smart(mut self, enabled: bool) -> Self {
        self.smart = enabled;
        self
    }

    /// Check that no two flags contradict each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hard_breaks && self.no_breaks {
            return Err(ConfigError::Conflict("hard_breaks", "no_breaks"));
        }
        Ok(())
    }
}

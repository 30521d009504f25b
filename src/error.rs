//! Error types

/// Why [`DebugLog::init`](crate::DebugLog::init) could not bring the logger up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// Requested queue capacity is zero or exceeds the static storage.
    InvalidCapacity { requested: usize, max: usize },
    /// The platform refused to create the consumer task.
    SpawnFailed,
}

impl InitError {
    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidCapacity { .. } => "invalid queue capacity",
            Self::SpawnFailed => "consumer task spawn failed",
        }
    }
}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidCapacity { requested, max } => {
                write!(f, "{}: {} (allowed 1..={})", self.message(), requested, max)
            }
            Self::SpawnFailed => f.write_str(self.message()),
        }
    }
}

/// Template text that does not satisfy the placeholder grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateError {
    /// Text contains a non-ASCII byte.
    NonAscii,
    /// More placeholders than numeric fields.
    TooManyPlaceholders,
    /// Conversion character outside `u d i x X o c`.
    UnknownConversion,
    /// Text ends inside a placeholder.
    Unterminated,
    /// Newline before the end of the text.
    EmbeddedNewline,
    /// Field width above [`MAX_WIDTH`](crate::template::MAX_WIDTH).
    WidthTooLarge,
}

impl TemplateError {
    /// Get error message
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NonAscii => "template text must be ASCII",
            Self::TooManyPlaceholders => "template has more than three placeholders",
            Self::UnknownConversion => "unsupported placeholder conversion",
            Self::Unterminated => "template ends inside a placeholder",
            Self::WidthTooLarge => "placeholder width too large",
            Self::EmbeddedNewline => "template newline allowed only at the end",
        }
    }
}

impl core::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Task creation failed on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnError;

impl core::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("task spawn failed")
    }
}

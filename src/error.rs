use thiserror::Error;

/// Classifies rule-file format errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// Magic number does not identify a compiled suffix rule file
    BadMagic,
    /// Bit widths or node-type values differ from the supported layout
    LayoutMismatch,
    /// A section declared a zero length
    EmptySection,
    /// A node or child entry points outside its target table
    InconsistentTables,
}

/// Errors produced while loading rule files or converting domain labels
#[derive(Error, Debug)]
pub enum EtnError {
    #[error("Format error: {message}")]
    Format {
        kind: FormatErrorKind,
        message: String,
    },

    #[error("Truncated {section}: expected {expected} bytes, got {actual}")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Out of memory while allocating {0}")]
    OutOfMemory(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Arithmetic overflow in punycode {0}")]
    Overflow(&'static str),

    #[error("Output buffer exhausted (capacity {0})")]
    NoBufs(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtnError {
    pub(crate) fn format(kind: FormatErrorKind, message: impl Into<String>) -> Self {
        EtnError::Format {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EtnError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EtnError>;

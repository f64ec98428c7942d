use thiserror::Error;

pub type DecodeResult<T> = std::result::Result<T, AxmlError>;

/// Coarse classification of a decode failure.
///
/// Every [`AxmlError`] maps onto exactly one kind, which makes it easy to match on the
/// category of a failure without caring about the details carried by the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OutOfBounds,
    MalformedChunk,
    MalformedString,
    UnbalancedNamespace,
    UnbalancedElement,
    TruncatedDocument,
    UnsupportedMagicNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxmlError {
    #[error("buffer too small for {what} at offset {offset} (need {need} bytes, have {have})")]
    OutOfBounds {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("malformed chunk at offset {offset}: {message}")]
    MalformedChunk { offset: u64, message: String },

    #[error("malformed string at offset {offset}: {message}")]
    MalformedString { offset: u64, message: String },

    #[error("unbalanced namespace at offset {offset}: {message}")]
    UnbalancedNamespace { offset: u64, message: String },

    #[error("unbalanced element at offset {offset}: {message}")]
    UnbalancedElement { offset: u64, message: String },

    #[error(
        "document ended at offset {offset} with {open_elements} open element(s) and {open_namespaces} open namespace(s)"
    )]
    TruncatedDocument {
        offset: u64,
        open_elements: usize,
        open_namespaces: usize,
    },

    #[error("unsupported magic number 0x{magic:08x} at offset {offset}, expected 0x{expected:08x}")]
    UnsupportedMagicNumber {
        offset: u64,
        magic: u32,
        expected: u32,
    },
}

impl AxmlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AxmlError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            AxmlError::MalformedChunk { .. } => ErrorKind::MalformedChunk,
            AxmlError::MalformedString { .. } => ErrorKind::MalformedString,
            AxmlError::UnbalancedNamespace { .. } => ErrorKind::UnbalancedNamespace,
            AxmlError::UnbalancedElement { .. } => ErrorKind::UnbalancedElement,
            AxmlError::TruncatedDocument { .. } => ErrorKind::TruncatedDocument,
            AxmlError::UnsupportedMagicNumber { .. } => ErrorKind::UnsupportedMagicNumber,
        }
    }

    /// Absolute offset (from the start of the decoded buffer) the error refers to.
    pub fn offset(&self) -> u64 {
        match self {
            AxmlError::OutOfBounds { offset, .. }
            | AxmlError::MalformedChunk { offset, .. }
            | AxmlError::MalformedString { offset, .. }
            | AxmlError::UnbalancedNamespace { offset, .. }
            | AxmlError::UnbalancedElement { offset, .. }
            | AxmlError::TruncatedDocument { offset, .. }
            | AxmlError::UnsupportedMagicNumber { offset, .. } => *offset,
        }
    }

    /// Human readable description, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub(crate) fn malformed_chunk(offset: usize, message: impl Into<String>) -> Self {
        AxmlError::MalformedChunk {
            offset: offset as u64,
            message: message.into(),
        }
    }

    pub(crate) fn malformed_string(offset: usize, message: impl Into<String>) -> Self {
        AxmlError::MalformedString {
            offset: offset as u64,
            message: message.into(),
        }
    }

    pub(crate) fn unbalanced_namespace(offset: usize, message: impl Into<String>) -> Self {
        AxmlError::UnbalancedNamespace {
            offset: offset as u64,
            message: message.into(),
        }
    }

    pub(crate) fn unbalanced_element(offset: usize, message: impl Into<String>) -> Self {
        AxmlError::UnbalancedElement {
            offset: offset as u64,
            message: message.into(),
        }
    }
}

use thiserror::Error;

/// Fatal failures raised by the archive, schema, and tree stages.
///
/// Each variant carries the minimal context needed to reproduce the failure
/// without a debugger: a byte offset, an entry or field name, or a declared
/// index.
#[derive(Debug, Error)]
pub enum FigError {
    #[error("not a valid archive: {reason}")]
    NotArchive { reason: String },

    #[error("archive is missing required entry `{name}`")]
    MissingEntry { name: String },

    #[error("expected magic `fig-kiwi`, found {found:?}")]
    BadMagic { found: Vec<u8> },

    #[error("unsupported compression method {method}")]
    UnsupportedCompression { method: u32 },

    #[error("corrupt input at offset {offset}: {reason}")]
    Corrupt { offset: usize, reason: String },

    #[error("schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("invalid render option: {reason}")]
    InvalidOption { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A recoverable issue encountered while decoding geometry or rendering a
/// node. Collected, never panicked, never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub node: Option<crate::id::Id>,
    pub message: String,
}

impl Warning {
    pub fn new(node: Option<crate::id::Id>, message: impl Into<String>) -> Self {
        Self { node, message: message.into() }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node {
            Some(id) => write!(f, "{id}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

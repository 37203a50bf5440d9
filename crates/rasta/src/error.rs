//! Conversion errors.
//!
//! Every error is fatal: the traversal stops at the first one and no partial
//! output is considered complete.

use rasta_syntax::Pos;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvertError {
    #[error("{pos}: unsupported node kind {kind}")]
    UnsupportedNodeKind { kind: String, pos: Pos },

    #[error("{pos}: cannot parse integer literal {text:?}")]
    LiteralParseError { text: String, pos: Pos },

    #[error("{pos}: value declaration names {count} identifiers, only one is supported")]
    UnsupportedArity { count: usize, pos: Pos },

    #[error("{pos}: {kind} is only valid at the top level of a file")]
    Misplaced { kind: String, pos: Pos },

    #[error("conversion cancelled")]
    Cancelled,

    #[error("conversion task failed: {0}")]
    TaskFailed(String),
}

impl ConvertError {
    /// Position of the offending node, if the error has one.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            ConvertError::UnsupportedNodeKind { pos, .. }
            | ConvertError::LiteralParseError { pos, .. }
            | ConvertError::UnsupportedArity { pos, .. }
            | ConvertError::Misplaced { pos, .. } => Some(*pos),
            ConvertError::Cancelled | ConvertError::TaskFailed(_) => None,
        }
    }
}

/// Error surfaced by the stream driver.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("failed to write output: {0}")]
    Sink(#[from] std::io::Error),
}

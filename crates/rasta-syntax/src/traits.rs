//! Traits for source-language readers.

use crate::ast::File;

/// Error that can occur when reading source code into a syntax tree.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("expected {expected}, got {got}")]
    UnexpectedNode { expected: String, got: String },
}

/// A reader parses source text into a compilation-unit tree.
pub trait Reader: Send + Sync {
    /// Language identifier (e.g., "go").
    fn language(&self) -> &'static str;

    /// File extensions this reader handles (e.g., &["go"]).
    fn extensions(&self) -> &'static [&'static str];

    /// Parse source code into a compilation unit.
    fn read(&self, source: &str) -> Result<File, ReadError>;
}

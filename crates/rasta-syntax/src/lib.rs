//! Go syntax trees for the rasta translator.
//!
//! `rasta-syntax` owns the input side of the translator: an owned,
//! `go/ast`-shaped tree ([`File`], [`Node`]) and readers that produce it from
//! source text.
//!
//! # Architecture
//!
//! ```text
//! Go source ──> Reader (tree-sitter) ──> File { package, decls: [Node] }
//! ```
//!
//! The tree only models the constructs the translator has conversion rules
//! for. Everything else the reader sees is kept as an
//! [`NodeKind::Unsupported`] leaf carrying its `go/ast` kind name.
//!
//! # Example
//!
//! ```ignore
//! use rasta_syntax::read_go;
//!
//! let file = read_go("package demo\nfunc foo() { return 5 }")?;
//! assert_eq!(file.package.name, "demo");
//! ```

pub mod ast;
pub mod registry;
pub mod traits;

pub mod input;

// Re-exports: tree types
pub use ast::{BasicLit, DeclToken, File, Ident, LitKind, Node, NodeKind, Pos};

// Re-exports: Traits
pub use traits::{ReadError, Reader};

// Re-exports: Registry
pub use registry::{reader_for_extension, reader_for_language, readers, register_reader};

// Re-exports: Built-in readers
#[cfg(feature = "read-go")]
pub use input::go::GoReader;
#[cfg(feature = "read-go")]
pub use input::read_go;

//! Go syntax trees to symbolic expressions.
//!
//! `rasta` walks one Go compilation unit and streams Mathematica-style
//! expressions for it, bracketed by `BeginPackage["name"]` and `EndPackage[]`.
//!
//! # Architecture
//!
//! ```text
//! Go source ──> rasta-syntax ──> File ──> StreamDriver ──> Sink
//!                                           │
//!                                  Evaluator (tokio tasks)
//!                                           │
//!                                  classify: Node ──> Rule
//! ```
//!
//! Children of a node are converted concurrently, but arguments always appear
//! in source order, and top-level declarations are emitted in source order.
//!
//! # Example
//!
//! ```ignore
//! let file = rasta_syntax::read_go("package demo\nfunc foo() {}")?;
//! let exprs = rasta::translate(file).await?;
//! assert_eq!(exprs[0].to_string(), "BeginPackage[\"demo\"]");
//! ```

pub mod classify;
pub mod config;
pub mod driver;
pub mod error;
pub mod eval;
pub mod expr;
pub mod serialize;

pub use config::{OutputFormat, RastaConfig};
pub use driver::{JsonSink, Sink, StreamDriver, TextSink};
pub use error::{ConvertError, DriveError};
pub use eval::{EvalOptions, Evaluator};
pub use expr::{Expression, Normal, Symbol};
pub use serialize::{ContextPath, Renderer};

use rasta_syntax::{File, Node};

/// Translate a compilation unit with default settings.
pub async fn translate(file: File) -> Result<Vec<Expression>, DriveError> {
    StreamDriver::default().collect(file).await
}

/// Convert a single node with default settings, reporting the root cause of
/// any failure.
pub async fn convert_node(node: Node) -> Result<Expression, ConvertError> {
    let evaluator = Evaluator::new(&EvalOptions::default());
    evaluator
        .convert(node)
        .await
        .map_err(|err| evaluator.root_cause(err))
}

/// Pretty-printed JSON dump of a syntax tree, for debugging the reader.
pub fn dump_syntax(file: &File) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(file)
}

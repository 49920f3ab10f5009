//! ecmaform emitter: prints a [`ecmaform_types::ast::Program`] back to
//! JavaScript source text.
//!
//! # Output modes
//!
//! - **Pretty** (default): 4-space indentation, one statement per line, no
//!   trailing newline.
//! - **Compact** (`minify.whitespace`): no optional whitespace or newlines.
//!   Words that would otherwise merge (`return x`, `a - -b`) keep a single
//!   separating space.
//!
//! Literals print their raw source text when they came from source, so
//! `0x10` and `'single'` survive unchanged.
//!
//! # Source maps
//!
//! With `sourceMaps` enabled, [`emit`] also returns a v3 source map with a
//! segment at each statement and expression start. See [`source_map`].

mod emitter;
mod expr;
mod stmt;
pub mod error;
pub mod source_map;

pub use emitter::{emit, to_source, EmitOutput};
pub use error::{EmitError, EmitResult};
pub use expr::quote_str;
pub use source_map::SourceMap;

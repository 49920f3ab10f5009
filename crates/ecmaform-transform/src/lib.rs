//! ecmaform transform pipeline.
//!
//! A validated [`Program`](ecmaform_types::ast::Program) goes through a fixed
//! sequence of [`Pass`]es selected by the
//! [`TransformConfig`](ecmaform_types::TransformConfig):
//!
//! 1. `strip_types`: TypeScript syntax removed, enums lowered
//! 2. `es2021`: logical assignment
//! 3. `es2020`: nullish coalescing and optional chaining
//! 4. `es2016`: exponentiation
//! 5. `es2015`: templates, arrows, shorthand, block bindings, defaults, spread
//! 6. `commonjs`: ES module syntax to `require`/`exports`
//! 7. `compress`: constant folding and dead code removal

pub mod error;
pub mod pass;
pub mod passes;
pub mod temps;

pub use error::{PassResult, TransformError, TransformWarning};
pub use pass::{transform_program, Pass, Pipeline, Transformed};

//! ecmaform lexer: converts JavaScript/TypeScript source text into a token
//! stream.

pub mod lexer;
pub mod token;

pub use lexer::{Dialect, LexResult, Lexer};
pub use token::{Token, TokenKind, ALL_KEYWORDS};

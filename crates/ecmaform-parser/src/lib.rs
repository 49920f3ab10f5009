//! ecmaform parser: converts a token stream into an AST.

mod parse_decl;
mod parse_expr;
mod parse_pattern;
mod parse_stmt;
mod parse_type;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING_DEPTH};

use ecmaform_lexer::{Dialect, Lexer};
use ecmaform_types::{Diagnostics, SourceFile, Syntax};

/// Lex and parse `source_file` in one step.
///
/// Lexer and parser diagnostics are merged in source order.
pub fn parse_source(source_file: &SourceFile, dialect: Dialect, syntax: Syntax) -> ParseResult {
    let lexed = Lexer::new(source_file).with_dialect(dialect).lex();
    let parsed = Parser::new(lexed.tokens, source_file)
        .with_dialect(dialect)
        .with_typescript(syntax == Syntax::Typescript)
        .parse();

    let mut errors = Diagnostics::new();
    errors.extend(lexed.errors);
    errors.extend(parsed.errors);
    errors.items.sort_by_key(|d| d.span.start);
    ParseResult {
        program: parsed.program,
        errors,
    }
}

//! Core parser infrastructure: token cursor, error reporting, recovery,
//! speculation and automatic semicolon insertion.

use std::collections::HashSet;

use ecmaform_lexer::{Dialect, Token, TokenKind};
use ecmaform_types::ast::{Ident, Program, ProgramKind};
use ecmaform_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span};

/// Maximum nesting depth of statements, expressions and types.
pub const MAX_NESTING_DEPTH: u32 = 256;

/// The parser.
///
/// Consumes a token stream produced by the lexer and builds a [`Program`].
/// Malformed statements are reported and skipped; the program root is always
/// built.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: Diagnostics,
    pub(crate) dialect: Dialect,
    pub(crate) typescript: bool,
    depth: u32,
    /// Inside a function body (`return` target).
    pub(crate) in_function: bool,
    pub(crate) in_async: bool,
    pub(crate) in_generator: bool,
    /// Disallow the `in` operator (for-statement heads).
    pub(crate) no_in: bool,
    /// Inside a TypeScript `declare` statement.
    pub(crate) in_ambient: bool,
    /// Spans of parenthesized expressions (parens included).
    pub(crate) parenthesized: HashSet<Span>,
}

/// Result of parsing: the program plus every diagnostic collected.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Diagnostics,
}

/// Saved cursor for speculative parsing.
pub(crate) struct Checkpoint {
    pos: usize,
    errors: Diagnostics,
    tokens_patched: Vec<(usize, Token)>,
}

/// Function-context flags saved around a nested function body.
#[derive(Clone, Copy)]
pub(crate) struct FnContext {
    in_function: bool,
    in_async: bool,
    in_generator: bool,
    no_in: bool,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file. Defaults to
    /// module dialect and plain ECMAScript.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        let mut tokens = tokens;
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = source_file.source.len() as u32;
            tokens.push(Token::new(TokenKind::Eof, Span::point(end), false));
        }
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::new(),
            dialect: Dialect::Module,
            typescript: false,
            depth: 0,
            in_function: false,
            in_async: false,
            in_generator: false,
            no_in: false,
            in_ambient: false,
            parenthesized: HashSet::new(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Accept the TypeScript syntax subset.
    pub fn with_typescript(mut self, typescript: bool) -> Self {
        self.typescript = typescript;
        self
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// The span of the previously consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(0)
        }
    }

    /// Opaque cursor position, for progress checks.
    pub(crate) fn pos_marker(&self) -> usize {
        self.pos
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Span from `start` to the end of the previously consumed token.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        start.merge(self.previous_span())
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from the current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Is the current token the contextual word `name`?
    pub(crate) fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(n) if n == name)
    }

    pub(crate) fn eat_ident(&mut self, name: &str) -> bool {
        if self.check_ident(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The current token starts on a new line.
    pub(crate) fn at_line_break(&self) -> bool {
        self.peek().had_line_break
    }

    /// Index of the token after the bracket that closes the one at
    /// `self.pos + offset`, if balanced.
    pub(crate) fn after_matching_bracket(&self, offset: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut idx = self.pos + offset;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(idx + 1 - self.pos);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            idx += 1;
        }
        None
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or records
    /// an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    /// Expect a binding identifier (contextual keywords allowed).
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Expect an IdentifierName: an identifier or any reserved word (after
    /// `.`, as an object key, in import/export specifiers).
    pub(crate) fn expect_identifier_name(&mut self) -> Option<Ident> {
        let kind = self.peek_kind();
        if kind.is_identifier_name() {
            let name = kind.to_string();
            let span = self.advance().span;
            Some(Ident::new(name, span))
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected property name, got '{}'", self.peek_kind()),
            );
            None
        }
    }

    /// Consume a statement terminator, applying automatic semicolon insertion:
    /// a `;` may be omitted before `}`, at end of input, or after a line break.
    pub(crate) fn consume_semicolon(&mut self) -> Option<()> {
        if self.eat(&TokenKind::Semicolon)
            || self.check_exact(&TokenKind::RBrace)
            || self.at_end()
            || self.at_line_break()
        {
            Some(())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected ';', got '{}'", self.peek_kind()),
            );
            None
        }
    }

    /// `>` closing a type argument list, splitting `>>`, `>>>`, `>=` and
    /// friends in place.
    pub(crate) fn expect_type_close(&mut self) -> Option<()> {
        let rest = match self.peek_kind() {
            TokenKind::Gt => {
                self.advance();
                return Some(());
            }
            TokenKind::RShift => TokenKind::Gt,
            TokenKind::URShift => TokenKind::RShift,
            TokenKind::GtEq => TokenKind::Eq,
            TokenKind::RShiftEq => TokenKind::GtEq,
            TokenKind::URShiftEq => TokenKind::RShiftEq,
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected '>', got '{}'", self.peek_kind()),
                );
                return None;
            }
        };
        let idx = self.pos;
        let token = &mut self.tokens[idx];
        token.kind = rest;
        token.span.start += 1;
        token.had_line_break = false;
        Some(())
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position. Placeholder tokens for
    /// invalid characters already carry a lexer diagnostic, so they are not
    /// reported twice.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        if matches!(self.peek_kind(), TokenKind::Unknown(_)) {
            return;
        }
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.errors
            .push(Diagnostic::at(self.source_file, code, message, span));
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.total
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Enter one nesting level; records E203 and returns `None` past the
    /// limit. Every successful `enter` must be paired with [`Parser::leave`].
    pub(crate) fn enter(&mut self) -> Option<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("maximum nesting depth is {MAX_NESTING_DEPTH}"),
            );
            return None;
        }
        self.depth += 1;
        Some(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` one nesting level deeper.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        self.enter()?;
        let result = f(self);
        self.leave();
        result
    }

    /// Run a loop that builds a left-nested chain (`a.b.c`, `f()()`,
    /// `1 + 2 + 3`). The loop calls [`Parser::enter`] once per link, since
    /// every link wraps the tree one level deeper; the starting depth is
    /// restored afterwards.
    pub(crate) fn chain<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let depth = self.depth;
        let result = f(self);
        self.depth = depth;
        result
    }

    // ── Context ───────────────────────────────────────────────────────────────

    pub(crate) fn fn_context(&self) -> FnContext {
        FnContext {
            in_function: self.in_function,
            in_async: self.in_async,
            in_generator: self.in_generator,
            no_in: self.no_in,
        }
    }

    pub(crate) fn restore_fn_context(&mut self, ctx: FnContext) {
        self.in_function = ctx.in_function;
        self.in_async = ctx.in_async;
        self.in_generator = ctx.in_generator;
        self.no_in = ctx.no_in;
    }

    /// Run `f` with the `in` operator allowed or disallowed, restoring the
    /// previous setting afterwards.
    pub(crate) fn with_no_in<T>(&mut self, no_in: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.no_in;
        self.no_in = no_in;
        let result = f(self);
        self.no_in = saved;
        result
    }

    /// `await` is an operator inside async functions and at module top level.
    pub(crate) fn await_allowed(&self) -> bool {
        self.in_async || (!self.in_function && self.dialect == ProgramKind::Module)
    }

    // ── Speculation ───────────────────────────────────────────────────────────

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            errors: self.errors.clone(),
            tokens_patched: self.tokens[self.pos..]
                .iter()
                .enumerate()
                .take(64)
                .filter(|(_, t)| {
                    matches!(
                        t.kind,
                        TokenKind::RShift
                            | TokenKind::URShift
                            | TokenKind::GtEq
                            | TokenKind::RShiftEq
                            | TokenKind::URShiftEq
                    )
                })
                .map(|(i, t)| (self.pos + i, t.clone()))
                .collect(),
        }
    }

    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.errors = checkpoint.errors;
        for (idx, token) in checkpoint.tokens_patched {
            self.tokens[idx] = token;
        }
    }

    /// Run `f` speculatively: keep its result if it succeeded without new
    /// diagnostics, otherwise rewind and return `None`.
    pub(crate) fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        let before = self.error_count();
        let ctx = self.fn_context();
        let depth = self.depth;
        match f(self) {
            Some(value) if self.error_count() == before => Some(value),
            _ => {
                self.rewind(checkpoint);
                self.restore_fn_context(ctx);
                self.depth = depth;
                None
            }
        }
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until a statement boundary: past a `;`, before a `}`, or
    /// before a statement keyword that starts a new line.
    pub(crate) fn synchronize(&mut self) {
        let start = self.pos;
        while !self.at_end() {
            if self.eat(&TokenKind::Semicolon) {
                return;
            }
            if self.check_exact(&TokenKind::RBrace) {
                return;
            }
            if self.pos != start && self.at_line_break() && self.starts_statement() {
                return;
            }
            self.advance();
        }
    }

    fn starts_statement(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Var
            | TokenKind::Const
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::If
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::Return
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Throw
            | TokenKind::Try
            | TokenKind::Switch
            | TokenKind::Import
            | TokenKind::Export
            | TokenKind::Debugger => true,
            TokenKind::Ident(name) => matches!(
                name.as_str(),
                "let" | "async" | "interface" | "type" | "enum" | "declare"
            ),
            _ => false,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Program`].
    pub fn parse(mut self) -> ParseResult {
        let body = self.parse_statement_list(true);
        let program = Program {
            kind: self.dialect,
            body,
            span: Span::new(0, self.source_file.source.len() as u32),
        };
        ParseResult {
            program,
            errors: self.errors,
        }
    }
}

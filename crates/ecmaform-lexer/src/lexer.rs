//! Core lexer: converts source text to a lazy token stream.
//!
//! Features:
//! - The full ES2022 token set plus the TypeScript punctuation subset
//! - Template literals with nested `${expr}` via a brace-depth stack
//! - Regular expression literals, disambiguated from `/` by the previous
//!   significant token
//! - Line and block comments skipped; line breaks inside block comments are
//!   reported on the next token for automatic semicolon insertion
//! - Hashbang line skipped; HTML-like comments in script dialect
//! - Error recovery: invalid input yields a [`TokenKind::Unknown`] placeholder
//!   and a diagnostic, then scanning continues

use ecmaform_types::ast::ProgramKind;
use ecmaform_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// Script or module source. Only script code recognizes `<!--` comments.
pub type Dialect = ProgramKind;

/// Result of lexing: tokens + any diagnostics collected.
#[derive(Debug)]
pub struct LexResult {
    /// The token stream (always ends with exactly one [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

/// The lexer.
///
/// Implements `Iterator<Item = Token>`: yields tokens on demand, then exactly
/// one [`TokenKind::Eof`], then `None`. [`Lexer::reset`] restarts from the
/// beginning of the source.
pub struct Lexer<'src> {
    source_file: &'src SourceFile,
    text: &'src str,
    dialect: Dialect,
    /// Current byte offset into `text`.
    pos: usize,
    errors: Diagnostics,
    /// One entry per open `${`: the number of unclosed `{` inside it.
    template_stack: Vec<u32>,
    regex_allowed: bool,
    done: bool,
}

enum Escape {
    Char(char),
    LineContinuation,
    Invalid(&'static str),
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file, in module dialect.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source_file,
            text: &source_file.source,
            dialect: Dialect::Module,
            pos: 0,
            errors: Diagnostics::new(),
            template_stack: Vec::new(),
            regex_allowed: true,
            done: false,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Restart from the beginning of the source, discarding diagnostics.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.errors = Diagnostics::new();
        self.template_stack.clear();
        self.regex_allowed = true;
        self.done = false;
    }

    /// Diagnostics recorded so far.
    pub fn errors(&self) -> &Diagnostics {
        &self.errors
    }

    /// Lex the entire source into a token stream.
    pub fn lex(mut self) -> LexResult {
        let tokens = self.by_ref().collect();
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(offset)
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn slice_from(&self, start: usize) -> &'src str {
        &self.text[start..self.pos]
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.errors
            .push(Diagnostic::at(self.source_file, code, message, span));
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and comments. Returns `true` if a line terminator was
    /// crossed.
    fn skip_trivia(&mut self) -> bool {
        let mut line_break = false;
        if self.pos == 0 && self.text.starts_with("#!") {
            self.skip_line_comment();
        }
        loop {
            match self.peek() {
                Some(ch) if is_line_terminator(ch) => {
                    self.advance();
                    line_break = true;
                    if self.dialect == Dialect::Script && self.text[self.pos..].starts_with("-->")
                    {
                        self.skip_line_comment();
                    }
                }
                Some(ch) if is_whitespace(ch) => {
                    self.advance();
                }
                Some('/') if self.peek_byte(1) == Some(b'/') => self.skip_line_comment(),
                Some('/') if self.peek_byte(1) == Some(b'*') => {
                    if self.skip_block_comment() {
                        line_break = true;
                    }
                }
                Some('<')
                    if self.dialect == Dialect::Script
                        && self.text[self.pos..].starts_with("<!--") =>
                {
                    self.skip_line_comment()
                }
                _ => break,
            }
        }
        line_break
    }

    /// Skip to (not past) the next line terminator.
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    /// Skip a `/* ... */` comment. Returns `true` if it spans lines.
    fn skip_block_comment(&mut self) -> bool {
        let start = self.pos;
        self.pos += 2;
        let mut line_break = false;
        loop {
            match self.advance() {
                None => {
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "unterminated block comment",
                        self.span_from(start),
                    );
                    return line_break;
                }
                Some('*') if self.eat('/') => return line_break,
                Some(ch) if is_line_terminator(ch) => line_break = true,
                Some(_) => {}
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token dispatch
    // ─────────────────────────────────────────────────────────────

    fn scan(&mut self) -> Token {
        let had_line_break = self.skip_trivia();
        let start = self.pos;

        if self.errors.is_full() {
            self.pos = self.text.len();
            return Token::new(TokenKind::Eof, self.span_from(self.pos), had_line_break);
        }

        let Some(ch) = self.peek() else {
            if !self.template_stack.is_empty() {
                self.template_stack.clear();
                self.emit_error(
                    ErrorCode::UNTERMINATED_TEMPLATE,
                    "unterminated template literal",
                    self.span_from(start),
                );
            }
            return Token::new(TokenKind::Eof, self.span_from(start), had_line_break);
        };

        let kind = match ch {
            '`' => {
                self.advance();
                self.scan_template(start, true)
            }
            '}' if self.template_stack.last() == Some(&0) => {
                self.template_stack.pop();
                self.advance();
                self.scan_template(start, false)
            }
            '"' | '\'' => self.scan_string(start, ch),
            '0'..='9' => self.scan_number(start),
            '.' if self.peek_byte(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.scan_number(start)
            }
            '#' if self.peek_at(1).is_some_and(is_id_start) => {
                self.advance();
                let (name, _) = self.scan_identifier_name();
                TokenKind::PrivateName(name)
            }
            '/' if self.regex_allowed => self.scan_regex(start),
            c if is_id_start(c) || c == '\\' => {
                let (name, escaped) = self.scan_identifier_name();
                if name.is_empty() {
                    self.unknown(start)
                } else if escaped {
                    TokenKind::Ident(name)
                } else {
                    TokenKind::from_keyword(&name).unwrap_or(TokenKind::Ident(name))
                }
            }
            _ => match self.scan_punctuator() {
                Some(kind) => kind,
                None => {
                    self.advance();
                    self.unknown(start)
                }
            },
        };

        match kind {
            TokenKind::LBrace => {
                if let Some(depth) = self.template_stack.last_mut() {
                    *depth += 1;
                }
            }
            TokenKind::RBrace => {
                if let Some(depth) = self.template_stack.last_mut() {
                    *depth = depth.saturating_sub(1);
                }
            }
            _ => {}
        }

        self.regex_allowed = kind.allows_regex_after();
        Token::new(kind, self.span_from(start), had_line_break)
    }

    /// Record an unexpected-character diagnostic for the text consumed since
    /// `start` and return the placeholder token kind.
    fn unknown(&mut self, start: usize) -> TokenKind {
        if self.pos == start {
            self.advance();
        }
        let text = self.slice_from(start).to_string();
        self.emit_error(
            ErrorCode::UNEXPECTED_CHARACTER,
            format!("unexpected character '{}'", text.escape_debug()),
            self.span_from(start),
        );
        TokenKind::Unknown(text)
    }

    // ─────────────────────────────────────────────────────────────
    // Punctuators
    // ─────────────────────────────────────────────────────────────

    /// Longest-match punctuator scan.
    fn scan_punctuator(&mut self) -> Option<TokenKind> {
        let rest = &self.text[self.pos..];
        const TABLE: &[(&str, TokenKind)] = &[
            (">>>=", TokenKind::URShiftEq),
            ("...", TokenKind::Ellipsis),
            ("===", TokenKind::EqEqEq),
            ("!==", TokenKind::NotEqEq),
            ("**=", TokenKind::StarStarEq),
            ("<<=", TokenKind::LShiftEq),
            (">>=", TokenKind::RShiftEq),
            (">>>", TokenKind::URShift),
            ("&&=", TokenKind::AmpAmpEq),
            ("||=", TokenKind::PipePipeEq),
            ("??=", TokenKind::QuestionQuestionEq),
            ("=>", TokenKind::Arrow),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("**", TokenKind::StarStar),
            ("++", TokenKind::PlusPlus),
            ("--", TokenKind::MinusMinus),
            ("<<", TokenKind::LShift),
            (">>", TokenKind::RShift),
            ("&&", TokenKind::AmpAmp),
            ("||", TokenKind::PipePipe),
            ("??", TokenKind::QuestionQuestion),
            ("+=", TokenKind::PlusEq),
            ("-=", TokenKind::MinusEq),
            ("*=", TokenKind::StarEq),
            ("/=", TokenKind::SlashEq),
            ("%=", TokenKind::PercentEq),
            ("&=", TokenKind::AmpEq),
            ("|=", TokenKind::PipeEq),
            ("^=", TokenKind::CaretEq),
            ("?.", TokenKind::QuestionDot),
            ("{", TokenKind::LBrace),
            ("}", TokenKind::RBrace),
            ("(", TokenKind::LParen),
            (")", TokenKind::RParen),
            ("[", TokenKind::LBracket),
            ("]", TokenKind::RBracket),
            (";", TokenKind::Semicolon),
            (",", TokenKind::Comma),
            (".", TokenKind::Dot),
            ("?", TokenKind::Question),
            (":", TokenKind::Colon),
            ("@", TokenKind::At),
            ("=", TokenKind::Eq),
            ("<", TokenKind::Lt),
            (">", TokenKind::Gt),
            ("+", TokenKind::Plus),
            ("-", TokenKind::Minus),
            ("*", TokenKind::Star),
            ("/", TokenKind::Slash),
            ("%", TokenKind::Percent),
            ("&", TokenKind::Amp),
            ("|", TokenKind::Pipe),
            ("^", TokenKind::Caret),
            ("!", TokenKind::Bang),
            ("~", TokenKind::Tilde),
        ];
        for (text, kind) in TABLE {
            if !rest.starts_with(text) {
                continue;
            }
            // `a?.5:b` is a conditional, not optional chaining.
            if *kind == TokenKind::QuestionDot
                && rest.as_bytes().get(2).is_some_and(u8::is_ascii_digit)
            {
                continue;
            }
            self.pos += text.len();
            return Some(kind.clone());
        }
        None
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers
    // ─────────────────────────────────────────────────────────────

    /// Scan identifier characters, decoding `\uXXXX` escapes. Returns the
    /// name and whether any escape was present.
    fn scan_identifier_name(&mut self) -> (String, bool) {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            match self.peek() {
                Some('\\') if self.peek_byte(1) == Some(b'u') => {
                    let start = self.pos;
                    self.pos += 2;
                    match self.scan_unicode_escape_value() {
                        Some(c) if is_id_part(c) => {
                            name.push(c);
                            escaped = true;
                        }
                        _ => {
                            self.emit_error(
                                ErrorCode::INVALID_ESCAPE,
                                "invalid unicode escape in identifier",
                                self.span_from(start),
                            );
                        }
                    }
                }
                Some(c) if (name.is_empty() && is_id_start(c)) || (!name.is_empty() && is_id_part(c)) => {
                    name.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        (name, escaped)
    }

    // ─────────────────────────────────────────────────────────────
    // Numbers
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: usize) -> TokenKind {
        let mut bigint_allowed = true;
        let radix = match (self.peek_byte(0), self.peek_byte(1)) {
            (Some(b'0'), Some(b'x' | b'X')) => 16,
            (Some(b'0'), Some(b'o' | b'O')) => 8,
            (Some(b'0'), Some(b'b' | b'B')) => 2,
            _ => 10,
        };

        let value = if radix != 10 {
            self.pos += 2;
            let digits_start = self.pos;
            self.scan_digits(radix);
            let digits: String = self.slice_from(digits_start).replace('_', "");
            if digits.is_empty() {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("expected digits after '{}'", self.slice_from(start)),
                    self.span_from(start),
                );
            }
            digits.chars().fold(0.0_f64, |acc, c| {
                acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
            })
        } else if self.is_legacy_octal() {
            bigint_allowed = false;
            self.scan_digits(10);
            let digits = self.slice_from(start);
            if digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
                digits
                    .bytes()
                    .fold(0.0_f64, |acc, b| acc * 8.0 + (b - b'0') as f64)
            } else {
                digits.parse().unwrap_or(0.0)
            }
        } else {
            self.scan_digits(10);
            if self.peek() == Some('.') {
                bigint_allowed = false;
                self.advance();
                self.scan_digits(10);
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let save = self.pos;
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                if self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                    bigint_allowed = false;
                    self.scan_digits(10);
                } else {
                    self.pos = save;
                    self.advance();
                    self.emit_error(
                        ErrorCode::INVALID_NUMBER,
                        "missing exponent digits",
                        self.span_from(start),
                    );
                }
            }
            self.slice_from(start)
                .replace('_', "")
                .parse()
                .unwrap_or(f64::NAN)
        };

        if self.peek() == Some('n') {
            self.advance();
            if !bigint_allowed {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    "invalid BigInt literal",
                    self.span_from(start),
                );
            }
            return TokenKind::BigInt(self.slice_from(start).to_string());
        }

        if self.peek().is_some_and(|c| is_id_start(c) || c.is_ascii_digit()) {
            let bad_start = self.pos;
            while self.peek().is_some_and(is_id_part) {
                self.advance();
            }
            self.emit_error(
                ErrorCode::INVALID_NUMBER,
                "identifier starts immediately after numeric literal",
                self.span_from(bad_start),
            );
        }

        TokenKind::Num {
            value,
            raw: self.slice_from(start).to_string(),
        }
    }

    /// `0` followed directly by a decimal digit (`017`).
    fn is_legacy_octal(&self) -> bool {
        self.peek_byte(0) == Some(b'0') && self.peek_byte(1).is_some_and(|b| b.is_ascii_digit())
    }

    /// Scan digits of `radix` with `_` separators, reporting misplaced
    /// separators.
    fn scan_digits(&mut self, radix: u32) {
        let mut prev_digit = false;
        let mut prev_sep = false;
        while let Some(c) = self.peek() {
            if c == '_' {
                if !prev_digit {
                    self.report_separator();
                }
                prev_sep = true;
                prev_digit = false;
            } else if c.is_digit(radix) {
                prev_digit = true;
                prev_sep = false;
            } else {
                break;
            }
            self.advance();
        }
        if prev_sep {
            self.report_separator();
        }
    }

    fn report_separator(&mut self) {
        let span = Span::new(self.pos as u32, self.pos as u32 + 1);
        self.emit_error(
            ErrorCode::INVALID_NUMBER,
            "numeric separators are only allowed between digits",
            span,
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Strings
    // ─────────────────────────────────────────────────────────────

    fn scan_string(&mut self, start: usize, quote: char) -> TokenKind {
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        self.span_from(start),
                    );
                    break;
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let esc_start = self.pos;
                    self.advance();
                    match self.scan_escape(false) {
                        Escape::Char(c) => value.push(c),
                        Escape::LineContinuation => {}
                        Escape::Invalid(msg) => {
                            self.emit_error(ErrorCode::INVALID_ESCAPE, msg, self.span_from(esc_start))
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        TokenKind::Str {
            value,
            raw: self.slice_from(start).to_string(),
        }
    }

    /// Scan one escape sequence; the backslash is already consumed.
    fn scan_escape(&mut self, in_template: bool) -> Escape {
        let Some(c) = self.advance() else {
            return Escape::Invalid("unterminated escape sequence");
        };
        match c {
            'n' => Escape::Char('\n'),
            't' => Escape::Char('\t'),
            'r' => Escape::Char('\r'),
            'b' => Escape::Char('\u{8}'),
            'f' => Escape::Char('\u{c}'),
            'v' => Escape::Char('\u{b}'),
            '0' if !self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) => Escape::Char('\0'),
            '0'..='7' => {
                if in_template {
                    return Escape::Invalid("octal escapes are not allowed in templates");
                }
                let mut value = c.to_digit(8).unwrap_or(0);
                let max_len = if c <= '3' { 2 } else { 1 };
                for _ in 0..max_len {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.advance();
                        }
                        None => break,
                    }
                }
                Escape::Char(char::from_u32(value).unwrap_or('\u{fffd}'))
            }
            '8' | '9' if in_template => Escape::Invalid("invalid escape in template"),
            'x' => {
                let hex = self.take_hex(2);
                match hex {
                    Some(v) => Escape::Char(char::from_u32(v).unwrap_or('\u{fffd}')),
                    None => Escape::Invalid("invalid hexadecimal escape sequence"),
                }
            }
            'u' => match self.scan_unicode_escape_value() {
                Some(c) => Escape::Char(c),
                None => Escape::Invalid("invalid unicode escape sequence"),
            },
            '\r' => {
                self.eat('\n');
                Escape::LineContinuation
            }
            '\n' | '\u{2028}' | '\u{2029}' => Escape::LineContinuation,
            other => Escape::Char(other),
        }
    }

    /// Decode the part of a unicode escape after `\u`: `XXXX` or `{X...}`.
    /// A high surrogate followed by an escaped low surrogate combines; a
    /// lone surrogate becomes U+FFFD.
    fn scan_unicode_escape_value(&mut self) -> Option<char> {
        let code = if self.eat('{') {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = self.slice_from(start);
            if digits.is_empty() || !self.eat('}') {
                return None;
            }
            u32::from_str_radix(digits, 16).ok().filter(|&v| v <= 0x10FFFF)?
        } else {
            self.take_hex(4)?
        };
        if (0xD800..0xDC00).contains(&code) && self.text[self.pos..].starts_with("\\u") {
            let save = self.pos;
            self.pos += 2;
            if let Some(low) = self.take_hex(4).filter(|v| (0xDC00..0xE000).contains(v)) {
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined);
            }
            self.pos = save;
        }
        Some(char::from_u32(code).unwrap_or('\u{fffd}'))
    }

    fn take_hex(&mut self, len: usize) -> Option<u32> {
        let digits = self.text.get(self.pos..self.pos + len)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        self.pos += len;
        u32::from_str_radix(digits, 16).ok()
    }

    // ─────────────────────────────────────────────────────────────
    // Templates
    // ─────────────────────────────────────────────────────────────

    /// Scan template characters after `` ` `` (`opening`) or after the `}`
    /// closing a substitution, up to `` ` `` or `${`.
    fn scan_template(&mut self, start: usize, opening: bool) -> TokenKind {
        let mut cooked = Some(String::new());
        let mut raw = String::new();
        let terminated_by_substitution = loop {
            match self.peek() {
                None => {
                    self.emit_error(
                        ErrorCode::UNTERMINATED_TEMPLATE,
                        "unterminated template literal",
                        self.span_from(start),
                    );
                    break false;
                }
                Some('`') => {
                    self.advance();
                    break false;
                }
                Some('$') if self.peek_byte(1) == Some(b'{') => {
                    self.pos += 2;
                    self.template_stack.push(0);
                    break true;
                }
                Some('\\') => {
                    let esc_start = self.pos;
                    self.advance();
                    let escape = self.scan_escape(true);
                    raw.push_str(&self.slice_from(esc_start).replace("\r\n", "\n").replace('\r', "\n"));
                    match escape {
                        Escape::Char(c) => {
                            if let Some(cooked) = cooked.as_mut() {
                                cooked.push(c);
                            }
                        }
                        Escape::LineContinuation => {}
                        Escape::Invalid(_) => cooked = None,
                    }
                }
                Some('\r') => {
                    self.advance();
                    self.eat('\n');
                    raw.push('\n');
                    if let Some(cooked) = cooked.as_mut() {
                        cooked.push('\n');
                    }
                }
                Some(c) => {
                    self.advance();
                    raw.push(c);
                    if let Some(cooked) = cooked.as_mut() {
                        cooked.push(c);
                    }
                }
            }
        };
        match (opening, terminated_by_substitution) {
            (true, false) => TokenKind::NoSubstitutionTemplate { cooked, raw },
            (true, true) => TokenKind::TemplateHead { cooked, raw },
            (false, true) => TokenKind::TemplateMiddle { cooked, raw },
            (false, false) => TokenKind::TemplateTail { cooked, raw },
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Regular expressions
    // ─────────────────────────────────────────────────────────────

    fn scan_regex(&mut self, start: usize) -> TokenKind {
        self.advance();
        let body_start = self.pos;
        let mut in_class = false;
        let body_end = loop {
            match self.peek() {
                None => break None,
                Some(c) if is_line_terminator(c) => break None,
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some(c) if !is_line_terminator(c) => {
                            self.advance();
                        }
                        _ => break None,
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    let end = self.pos;
                    self.advance();
                    break Some(end);
                }
                Some(_) => {
                    self.advance();
                }
            }
        };
        let Some(body_end) = body_end else {
            self.emit_error(
                ErrorCode::UNTERMINATED_REGEX,
                "unterminated regular expression literal",
                self.span_from(start),
            );
            return TokenKind::Regex {
                pattern: self.text[body_start..self.pos].to_string(),
                flags: String::new(),
            };
        };
        let flags_start = self.pos;
        while self.peek().is_some_and(is_id_part) {
            self.advance();
        }
        TokenKind::Regex {
            pattern: self.text[body_start..body_end].to_string(),
            flags: self.slice_from(flags_start).to_string(),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let token = self.scan();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        Some(token)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Character classes
// ─────────────────────────────────────────────────────────────────────

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{b}' | '\u{c}' | '\u{a0}' | '\u{feff}')
        || (!c.is_ascii() && c.is_whitespace() && !is_line_terminator(c))
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '$' || c == '_' || (!c.is_ascii() && c.is_alphabetic())
}

fn is_id_part(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '$'
        || c == '_'
        || c == '\u{200c}'
        || c == '\u{200d}'
        || (!c.is_ascii() && c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> LexResult {
        let sf = SourceFile::new("test.js", src);
        Lexer::new(&sf).lex()
    }

    #[test]
    fn test_iterator_yields_single_eof() {
        let sf = SourceFile::new("test.js", "a");
        let mut lexer = Lexer::new(&sf);
        assert!(matches!(lexer.next().map(|t| t.kind), Some(TokenKind::Ident(_))));
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_reset_restarts() {
        let sf = SourceFile::new("test.js", "x + @");
        let mut lexer = Lexer::new(&sf);
        let first: Vec<_> = lexer.by_ref().collect();
        assert_eq!(lexer.errors().len(), 0);
        lexer.reset();
        let second: Vec<_> = lexer.by_ref().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let result = lex("let  answer = 42;");
        assert_eq!(result.tokens[1].span, Span::new(5, 11));
        assert_eq!(result.tokens[3].span, Span::new(14, 16));
    }

    #[test]
    fn test_line_break_flag() {
        let result = lex("a\nb /* x\n */ c d");
        let flags: Vec<_> = result.tokens.iter().map(|t| t.had_line_break).collect();
        assert_eq!(flags, vec![false, true, true, false, false]);
    }

    #[test]
    fn test_hashbang_skipped() {
        let result = lex("#!/usr/bin/env node\nx");
        assert_eq!(result.tokens[0].kind, TokenKind::Ident("x".into()));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_html_comment_only_in_script() {
        let sf = SourceFile::new("test.js", "a <!-- b\nc");
        let script = Lexer::new(&sf).with_dialect(Dialect::Script).lex();
        assert_eq!(script.tokens.len(), 3);
        let module = Lexer::new(&sf).lex();
        assert!(module.tokens.len() > 3);
    }
}

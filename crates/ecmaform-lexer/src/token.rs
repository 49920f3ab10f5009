//! Token types for the ecmaform lexer.
//!
//! Defines [`TokenKind`] covering every ES2022 lexeme plus the handful the
//! TypeScript subset needs, and [`Token`], which pairs a kind with a source
//! [`Span`] and the line-break flag automatic semicolon insertion reads.

use ecmaform_types::Span;
use std::fmt;

/// Every reserved word the lexer turns into a dedicated token.
///
/// Contextual words (`let`, `async`, `of`, `get`, `set`, `static`, `as`,
/// `type`, `interface`, ...) are lexed as [`TokenKind::Ident`] and recognized
/// by the parser where they matter.
pub const ALL_KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line terminator appeared between the previous token and this one
    /// (including inside a block comment).
    pub had_line_break: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, had_line_break: bool) -> Self {
        Self {
            kind,
            span,
            had_line_break,
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }

    /// The exact source text of this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.span.start as usize..self.span.end as usize)
            .unwrap_or("")
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────
    /// `42`, `0x2A`, `1_000`, `.5e3`
    Num { value: f64, raw: String },
    /// `10n`; raw text including the suffix.
    BigInt(String),
    /// `"a\n"`; `raw` includes the quotes.
    Str { value: String, raw: String },
    /// `/ab+c/gi`
    Regex { pattern: String, flags: String },

    // ── Templates ─────────────────────────────────────────────
    // `cooked` is `None` when the raw text has an invalid escape.
    /// `` `text` ``
    NoSubstitutionTemplate { cooked: Option<String>, raw: String },
    /// `` `text${ ``
    TemplateHead { cooked: Option<String>, raw: String },
    /// `}text${`
    TemplateMiddle { cooked: Option<String>, raw: String },
    /// `` }text` ``
    TemplateTail { cooked: Option<String>, raw: String },

    // ── Names ─────────────────────────────────────────────────
    Ident(String),
    /// `#name`; carries the name without `#`.
    PrivateName(String),

    // ── Reserved words ────────────────────────────────────────
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    InstanceOf,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    TypeOf,
    Var,
    Void,
    While,
    With,

    // ── Punctuation ───────────────────────────────────────────
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `?`
    Question,
    /// `?.`
    QuestionDot,
    /// `:`
    Colon,
    /// `=>`
    Arrow,
    /// `@`
    At,

    // ── Operators ─────────────────────────────────────────────
    Eq,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,
    LShift,
    RShift,
    URShift,
    Amp,
    Pipe,
    Caret,
    Bang,
    Tilde,
    AmpAmp,
    PipePipe,
    QuestionQuestion,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    StarStarEq,
    LShiftEq,
    RShiftEq,
    URShiftEq,
    AmpEq,
    PipeEq,
    CaretEq,
    AmpAmpEq,
    PipePipeEq,
    QuestionQuestionEq,

    // ── Special ───────────────────────────────────────────────
    /// Placeholder for an invalid character; a diagnostic was recorded.
    Unknown(String),
    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `None` for identifiers, including
    /// contextual keywords.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "catch" => TokenKind::Catch,
            "class" => TokenKind::Class,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "debugger" => TokenKind::Debugger,
            "default" => TokenKind::Default,
            "delete" => TokenKind::Delete,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "enum" => TokenKind::Enum,
            "export" => TokenKind::Export,
            "extends" => TokenKind::Extends,
            "false" => TokenKind::False,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::InstanceOf,
            "new" => TokenKind::New,
            "null" => TokenKind::Null,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "switch" => TokenKind::Switch,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::TypeOf,
            "var" => TokenKind::Var,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "with" => TokenKind::With,
            _ => return None,
        })
    }

    /// The source spelling of a keyword, punctuator or operator.
    pub fn fixed_str(&self) -> Option<&'static str> {
        Some(match self {
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Class => "class",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Debugger => "debugger",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Enum => "enum",
            TokenKind::Export => "export",
            TokenKind::Extends => "extends",
            TokenKind::False => "false",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::InstanceOf => "instanceof",
            TokenKind::New => "new",
            TokenKind::Null => "null",
            TokenKind::Return => "return",
            TokenKind::Super => "super",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::True => "true",
            TokenKind::Try => "try",
            TokenKind::TypeOf => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::With => "with",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Ellipsis => "...",
            TokenKind::Question => "?",
            TokenKind::QuestionDot => "?.",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "=>",
            TokenKind::At => "@",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::EqEqEq => "===",
            TokenKind::NotEq => "!=",
            TokenKind::NotEqEq => "!==",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::LShift => "<<",
            TokenKind::RShift => ">>",
            TokenKind::URShift => ">>>",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::QuestionQuestion => "??",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::StarStarEq => "**=",
            TokenKind::LShiftEq => "<<=",
            TokenKind::RShiftEq => ">>=",
            TokenKind::URShiftEq => ">>>=",
            TokenKind::AmpEq => "&=",
            TokenKind::PipeEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::AmpAmpEq => "&&=",
            TokenKind::PipePipeEq => "||=",
            TokenKind::QuestionQuestionEq => "??=",
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self.fixed_str(), Some(s) if s.as_bytes()[0].is_ascii_alphabetic())
    }

    /// Returns `true` if the identifier-like text of this token can be used
    /// as a property name after `.` or as an object key.
    pub fn is_identifier_name(&self) -> bool {
        matches!(self, TokenKind::Ident(_)) || self.is_keyword()
    }

    /// Returns `true` if a `/` following this token starts a regular
    /// expression rather than a division.
    pub fn allows_regex_after(&self) -> bool {
        match self {
            TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus
            | TokenKind::This
            | TokenKind::Super
            | TokenKind::Null
            | TokenKind::True
            | TokenKind::False => false,
            TokenKind::Num { .. }
            | TokenKind::BigInt(_)
            | TokenKind::Str { .. }
            | TokenKind::Regex { .. }
            | TokenKind::NoSubstitutionTemplate { .. }
            | TokenKind::TemplateTail { .. }
            | TokenKind::Ident(_)
            | TokenKind::PrivateName(_)
            | TokenKind::Unknown(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.fixed_str() {
            return f.write_str(s);
        }
        match self {
            TokenKind::Num { raw, .. } => f.write_str(raw),
            TokenKind::BigInt(raw) => f.write_str(raw),
            TokenKind::Str { raw, .. } => f.write_str(raw),
            TokenKind::Regex { pattern, flags } => write!(f, "/{pattern}/{flags}"),
            TokenKind::NoSubstitutionTemplate { raw, .. } => write!(f, "`{raw}`"),
            TokenKind::TemplateHead { raw, .. } => write!(f, "`{raw}${{"),
            TokenKind::TemplateMiddle { raw, .. } => write!(f, "}}{raw}${{"),
            TokenKind::TemplateTail { raw, .. } => write!(f, "}}{raw}`"),
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::PrivateName(name) => write!(f, "#{name}"),
            TokenKind::Unknown(text) => f.write_str(text),
            TokenKind::Eof => f.write_str("end of input"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all() {
        for kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw)
                .unwrap_or_else(|| panic!("keyword {kw} not recognised"));
            assert_eq!(kind.to_string(), *kw);
            assert!(kind.is_keyword());
        }
    }

    #[test]
    fn test_contextual_words_are_identifiers() {
        for word in ["let", "async", "await", "yield", "of", "get", "set", "static", "as", "type"] {
            assert_eq!(TokenKind::from_keyword(word), None, "{word}");
        }
    }

    #[test]
    fn test_punctuators_are_not_keywords() {
        assert!(!TokenKind::Arrow.is_keyword());
        assert!(!TokenKind::QuestionQuestionEq.is_keyword());
        assert!(!TokenKind::Ident("x".into()).is_keyword());
    }

    #[test]
    fn test_identifier_name_includes_keywords() {
        assert!(TokenKind::Default.is_identifier_name());
        assert!(TokenKind::Ident("x".into()).is_identifier_name());
        assert!(!TokenKind::Dot.is_identifier_name());
    }

    #[test]
    fn test_regex_allowed_after() {
        assert!(TokenKind::Eq.allows_regex_after());
        assert!(TokenKind::LParen.allows_regex_after());
        assert!(TokenKind::Return.allows_regex_after());
        assert!(TokenKind::RBrace.allows_regex_after());
        assert!(!TokenKind::RParen.allows_regex_after());
        assert!(!TokenKind::Ident("a".into()).allows_regex_after());
        assert!(!TokenKind::Num { value: 1.0, raw: "1".into() }.allows_regex_after());
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::URShiftEq.to_string(), ">>>=");
        assert_eq!(TokenKind::PrivateName("x".into()).to_string(), "#x");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
        assert_eq!(
            TokenKind::Str { value: "a".into(), raw: "'a'".into() }.to_string(),
            "'a'"
        );
    }
}

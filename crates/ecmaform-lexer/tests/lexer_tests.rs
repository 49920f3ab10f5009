//! Lexer tests.
//!
//! Covers: reserved words, contextual identifiers, punctuators, numeric,
//! string, template and regex literals, comments, line-break tracking,
//! error recovery, and the 100-iteration determinism test.

use ecmaform_lexer::{Lexer, TokenKind, ALL_KEYWORDS};
use ecmaform_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex and return the error codes in order.
fn error_codes(source: &str) -> Vec<ErrorCode> {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf).lex().errors.iter().map(|e| e.code).collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_string())
}

fn num(source: &str) -> f64 {
    match kinds(source).first() {
        Some(TokenKind::Num { value, .. }) => *value,
        other => panic!("expected number for {source:?}, got {other:?}"),
    }
}

fn string_value(source: &str) -> String {
    match kinds(source).first() {
        Some(TokenKind::Str { value, .. }) => value.clone(),
        other => panic!("expected string for {source:?}, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Words
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_all_reserved_words() {
    for kw in ALL_KEYWORDS {
        let k = kinds(kw);
        assert_eq!(k.len(), 1, "{kw}");
        assert!(k[0].is_keyword(), "{kw} should lex as a keyword");
    }
}

#[test]
fn test_contextual_keywords_are_identifiers() {
    assert_eq!(
        kinds("let async await yield of"),
        vec![ident("let"), ident("async"), ident("await"), ident("yield"), ident("of")]
    );
}

#[test]
fn test_identifier_characters() {
    assert_eq!(kinds("$el _private café"), vec![ident("$el"), ident("_private"), ident("café")]);
}

#[test]
fn test_escaped_identifier_is_never_keyword() {
    assert_eq!(kinds("\\u0069f"), vec![ident("if")]);
}

#[test]
fn test_private_name() {
    assert_eq!(
        kinds("this.#count"),
        vec![TokenKind::This, TokenKind::Dot, TokenKind::PrivateName("count".into())]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Punctuators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_longest_match_punctuators() {
    assert_eq!(
        kinds("a >>>= b ?? c ??= d?.e ** f"),
        vec![
            ident("a"),
            TokenKind::URShiftEq,
            ident("b"),
            TokenKind::QuestionQuestion,
            ident("c"),
            TokenKind::QuestionQuestionEq,
            ident("d"),
            TokenKind::QuestionDot,
            ident("e"),
            TokenKind::StarStar,
            ident("f"),
        ]
    );
}

#[test]
fn test_question_dot_before_digit_is_conditional() {
    let k = kinds("a?.5:b");
    assert_eq!(k[1], TokenKind::Question);
    assert!(matches!(k[2], TokenKind::Num { value, .. } if value == 0.5));
}

#[test]
fn test_arrow_and_spread() {
    assert_eq!(
        kinds("(...xs) => xs"),
        vec![
            TokenKind::LParen,
            TokenKind::Ellipsis,
            ident("xs"),
            TokenKind::RParen,
            TokenKind::Arrow,
            ident("xs"),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_decimal_numbers() {
    assert_eq!(num("42"), 42.0);
    assert_eq!(num("3.14"), 3.14);
    assert_eq!(num(".5"), 0.5);
    assert_eq!(num("1e3"), 1000.0);
    assert_eq!(num("2.5E-1"), 0.25);
    assert_eq!(num("1_000_000"), 1_000_000.0);
}

#[test]
fn test_radix_numbers() {
    assert_eq!(num("0xFF"), 255.0);
    assert_eq!(num("0o17"), 15.0);
    assert_eq!(num("0b1010"), 10.0);
    assert_eq!(num("017"), 15.0);
    assert_eq!(num("019"), 19.0);
}

#[test]
fn test_number_keeps_raw_text() {
    match &kinds("0x1_F")[0] {
        TokenKind::Num { raw, value } => {
            assert_eq!(raw, "0x1_F");
            assert_eq!(*value, 31.0);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_bigint() {
    assert_eq!(kinds("10n"), vec![TokenKind::BigInt("10n".into())]);
    assert_eq!(kinds("0xffn"), vec![TokenKind::BigInt("0xffn".into())]);
}

#[test]
fn test_malformed_numbers() {
    assert_eq!(error_codes("1__0"), vec![ErrorCode::INVALID_NUMBER]);
    assert_eq!(error_codes("0x"), vec![ErrorCode::INVALID_NUMBER]);
    assert_eq!(error_codes("3in"), vec![ErrorCode::INVALID_NUMBER]);
    assert_eq!(error_codes("1.5n"), vec![ErrorCode::INVALID_NUMBER]);
}

// ─────────────────────────────────────────────────────────────────────
// Strings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_string_escapes() {
    assert_eq!(string_value(r#""a\nb""#), "a\nb");
    assert_eq!(string_value(r"'it\'s'"), "it's");
    assert_eq!(string_value(r#""\x41B\u{43}""#), "ABC");
    assert_eq!(string_value(r#""😀""#), "😀");
    assert_eq!(string_value("\"a\\\nb\""), "ab");
    assert_eq!(string_value(r#""\101""#), "A");
}

#[test]
fn test_string_keeps_raw() {
    match &kinds(r"'a\tb'")[0] {
        TokenKind::Str { raw, .. } => assert_eq!(raw, r"'a\tb'"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_unterminated_string() {
    assert_eq!(error_codes("\"abc\nx"), vec![ErrorCode::UNTERMINATED_STRING]);
    let k = kinds("\"abc\nx");
    assert_eq!(k.last(), Some(&ident("x")));
}

#[test]
fn test_invalid_escape() {
    assert_eq!(error_codes(r#""\xZZ""#), vec![ErrorCode::INVALID_ESCAPE]);
    assert_eq!(error_codes(r#""\u{110000}""#), vec![ErrorCode::INVALID_ESCAPE]);
}

// ─────────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_no_substitution_template() {
    assert_eq!(
        kinds("`hi`"),
        vec![TokenKind::NoSubstitutionTemplate {
            cooked: Some("hi".into()),
            raw: "hi".into()
        }]
    );
}

#[test]
fn test_template_with_substitutions() {
    let k = kinds("`a${x}b${y}c`");
    assert_eq!(
        k,
        vec![
            TokenKind::TemplateHead { cooked: Some("a".into()), raw: "a".into() },
            ident("x"),
            TokenKind::TemplateMiddle { cooked: Some("b".into()), raw: "b".into() },
            ident("y"),
            TokenKind::TemplateTail { cooked: Some("c".into()), raw: "c".into() },
        ]
    );
}

#[test]
fn test_template_nested_braces_and_templates() {
    let k = kinds("`${ {a: `in${b}`}.a }!`");
    assert!(matches!(k[0], TokenKind::TemplateHead { .. }));
    assert_eq!(k[1], TokenKind::LBrace);
    assert!(matches!(k[4], TokenKind::TemplateHead { .. }));
    assert!(matches!(k[6], TokenKind::TemplateTail { .. }));
    assert_eq!(k[7], TokenKind::RBrace);
    assert!(
        matches!(&k[k.len() - 1], TokenKind::TemplateTail { cooked: Some(c), .. } if c == "!")
    );
}

#[test]
fn test_template_invalid_escape_has_no_cooked_value() {
    let k = kinds(r"`\unicode`");
    assert_eq!(
        k,
        vec![TokenKind::NoSubstitutionTemplate { cooked: None, raw: r"\unicode".into() }]
    );
    assert!(error_codes(r"`\unicode`").is_empty());
}

#[test]
fn test_template_raw_normalizes_crlf() {
    match &kinds("`a\r\nb`")[0] {
        TokenKind::NoSubstitutionTemplate { cooked, raw } => {
            assert_eq!(raw, "a\nb");
            assert_eq!(cooked.as_deref(), Some("a\nb"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_unterminated_template() {
    assert_eq!(error_codes("`abc"), vec![ErrorCode::UNTERMINATED_TEMPLATE]);
    assert_eq!(error_codes("`a${b"), vec![ErrorCode::UNTERMINATED_TEMPLATE]);
}

// ─────────────────────────────────────────────────────────────────────
// Regular expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_regex_vs_division() {
    assert_eq!(
        kinds("x = /ab+c/gi"),
        vec![
            ident("x"),
            TokenKind::Eq,
            TokenKind::Regex { pattern: "ab+c".into(), flags: "gi".into() },
        ]
    );
    assert_eq!(kinds("a / b / c")[1], TokenKind::Slash);
    assert_eq!(kinds("(a) / 2")[3], TokenKind::Slash);
}

#[test]
fn test_regex_class_may_contain_slash() {
    assert_eq!(
        kinds("return /[/]\\//"),
        vec![
            TokenKind::Return,
            TokenKind::Regex { pattern: "[/]\\/".into(), flags: String::new() },
        ]
    );
}

#[test]
fn test_unterminated_regex() {
    assert_eq!(error_codes("x = /abc\n"), vec![ErrorCode::UNTERMINATED_REGEX]);
}

// ─────────────────────────────────────────────────────────────────────
// Comments & line breaks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_comments_skipped() {
    assert_eq!(kinds("a // line\n/* block */ b"), vec![ident("a"), ident("b")]);
}

#[test]
fn test_unterminated_block_comment() {
    assert_eq!(error_codes("a /* never"), vec![ErrorCode::UNTERMINATED_COMMENT]);
}

#[test]
fn test_line_break_inside_block_comment_counts() {
    let sf = SourceFile::new("test.js", "return /*\n*/ x");
    let tokens = Lexer::new(&sf).lex().tokens;
    assert!(tokens[1].had_line_break);
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_character_placeholder() {
    let k = kinds("a ¬ b");
    assert_eq!(k, vec![ident("a"), TokenKind::Unknown("¬".into()), ident("b")]);
    assert_eq!(error_codes("a ¬ b"), vec![ErrorCode::UNEXPECTED_CHARACTER]);
}

#[test]
fn test_error_position() {
    let sf = SourceFile::new("test.js", "let x;\nlet y = ¬;");
    let result = Lexer::new(&sf).lex();
    let err = &result.errors.items[0];
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 9);
    assert_eq!(err.source_line, "let y = ¬;");
}

#[test]
fn test_errors_are_capped() {
    let src = "¬ ".repeat(500);
    let sf = SourceFile::new("test.js", src);
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.errors.len(), ecmaform_types::MAX_DIAGNOSTICS);
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

#[test]
fn test_stream_ends_with_exactly_one_eof() {
    for src in ["", "a", "`unterminated", "\"x", "/* x"] {
        let sf = SourceFile::new("test.js", src);
        let tokens = Lexer::new(&sf).lex().tokens;
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1, "{src:?}");
        assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
    }
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let src = "const greet = (name) => `hello ${name}`;\nexport default greet(/w+/g, 0x1F ?? 2n);";
    let first = kinds(src);
    for i in 0..100 {
        assert_eq!(kinds(src), first, "Determinism failure at iteration {i}");
    }
}

//! TypeScript type annotations.
//!
//! Types are parsed only so they can be removed; the tree keeps enough
//! structure to span and inspect them but is not meant to round-trip.
//!
//! ```text
//! Type         = FunctionType | Union ["extends" Union "?" Type ":" Type]
//! Union        = ["|"] Intersection ("|" Intersection)*
//! Intersection = ["&"] Operator ("&" Operator)*
//! Operator     = ("keyof" | "unique" | "readonly" | "infer") Operator | Postfix
//! Postfix      = Primary ("[" "]" | "[" Type "]")*
//! ```

use ecmaform_lexer::TokenKind;
use ecmaform_types::ast::*;
use ecmaform_types::{ErrorCode, Span};

use crate::parser::Parser;

const TYPE_KEYWORDS: &[&str] = &[
    "any", "unknown", "number", "string", "boolean", "bigint", "symbol", "object", "never",
    "undefined", "intrinsic",
];

const TYPE_OPERATORS: &[&str] = &["keyof", "unique", "readonly", "infer"];

impl<'src> Parser<'src> {
    pub(crate) fn parse_type(&mut self) -> Option<TsType> {
        self.enter()?;
        let result = self.parse_type_inner();
        self.leave();
        result
    }

    fn parse_type_inner(&mut self) -> Option<TsType> {
        let start = self.current_span();
        if self.starts_function_type() {
            return self.parse_function_type(start);
        }
        let check = self.parse_union_type()?;
        if !self.check_exact(&TokenKind::Extends) || self.at_line_break() {
            return Some(check);
        }
        self.advance();
        let extends = self.parse_union_type()?;
        self.expect(&TokenKind::Question)?;
        let true_ty = self.parse_type()?;
        self.expect(&TokenKind::Colon)?;
        let false_ty = self.parse_type()?;
        Some(TsType {
            kind: TsTypeKind::Conditional {
                check: Box::new(check),
                extends: Box::new(extends),
                true_ty: Box::new(true_ty),
                false_ty: Box::new(false_ty),
            },
            span: self.span_from(start),
        })
    }

    /// `(...) =>`, `<T>(...) =>`, `new (...) =>`, `abstract new (...) =>`
    fn starts_function_type(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Lt | TokenKind::New => true,
            TokenKind::Ident(name) if name == "abstract" => {
                self.look_ahead(1).kind == TokenKind::New
            }
            TokenKind::LParen => self
                .after_matching_bracket(0)
                .is_some_and(|after| self.look_ahead(after).kind == TokenKind::Arrow),
            _ => false,
        }
    }

    fn parse_function_type(&mut self, start: Span) -> Option<TsType> {
        self.eat_ident("abstract");
        let is_constructor = self.eat(&TokenKind::New);
        let type_params = self.parse_optional_type_params()?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::Arrow)?;
        let ret = self.parse_type()?;
        Some(TsType {
            kind: TsTypeKind::Function {
                type_params,
                params,
                ret: Box::new(ret),
                is_constructor,
            },
            span: self.span_from(start),
        })
    }

    fn parse_union_type(&mut self) -> Option<TsType> {
        let start = self.current_span();
        self.eat(&TokenKind::Pipe);
        let first = self.parse_intersection_type()?;
        if !self.check_exact(&TokenKind::Pipe) {
            return Some(first);
        }
        let mut types = vec![first];
        while self.eat(&TokenKind::Pipe) {
            types.push(self.parse_intersection_type()?);
        }
        Some(TsType {
            kind: TsTypeKind::Union(types),
            span: self.span_from(start),
        })
    }

    fn parse_intersection_type(&mut self) -> Option<TsType> {
        let start = self.current_span();
        self.eat(&TokenKind::Amp);
        let first = self.parse_type_operator()?;
        if !self.check_exact(&TokenKind::Amp) {
            return Some(first);
        }
        let mut types = vec![first];
        while self.eat(&TokenKind::Amp) {
            types.push(self.parse_type_operator()?);
        }
        Some(TsType {
            kind: TsTypeKind::Intersection(types),
            span: self.span_from(start),
        })
    }

    fn parse_type_operator(&mut self) -> Option<TsType> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Ident(name)
                if TYPE_OPERATORS.contains(&name.as_str())
                    && !matches!(
                        self.look_ahead(1).kind,
                        TokenKind::Comma
                            | TokenKind::RParen
                            | TokenKind::RBracket
                            | TokenKind::Gt
                            | TokenKind::Semicolon
                            | TokenKind::Eq
                            | TokenKind::Pipe
                            | TokenKind::Amp
                            | TokenKind::Dot
                    ) =>
            {
                name.clone()
            }
            _ => return self.parse_postfix_type(),
        };
        self.advance();
        self.enter()?;
        let inner = self.parse_type_operator();
        self.leave();
        Some(TsType {
            kind: TsTypeKind::Operator {
                op,
                ty: Box::new(inner?),
            },
            span: self.span_from(start),
        })
    }

    fn parse_postfix_type(&mut self) -> Option<TsType> {
        let start = self.current_span();
        let mut ty = self.parse_primary_type()?;
        while self.check_exact(&TokenKind::LBracket) && !self.at_line_break() {
            self.advance();
            if self.eat(&TokenKind::RBracket) {
                ty = TsType {
                    kind: TsTypeKind::Array(Box::new(ty)),
                    span: self.span_from(start),
                };
            } else {
                let index = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                ty = TsType {
                    kind: TsTypeKind::Indexed {
                        object: Box::new(ty),
                        index: Box::new(index),
                    },
                    span: self.span_from(start),
                };
            }
        }
        Some(ty)
    }

    fn parse_primary_type(&mut self) -> Option<TsType> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let next = self.look_ahead(1);
                // Type predicates: `x is T`, `asserts x is T`, `asserts x`.
                if matches!(&next.kind, TokenKind::Ident(n) if n == "is") && !next.had_line_break {
                    self.advance();
                    self.advance();
                    let ty = self.parse_type()?;
                    TsTypeKind::Operator {
                        op: "is".into(),
                        ty: Box::new(ty),
                    }
                } else if name == "asserts"
                    && matches!(next.kind, TokenKind::Ident(_) | TokenKind::This)
                    && !next.had_line_break
                {
                    self.advance();
                    let subject = self.parse_primary_type()?;
                    TsTypeKind::Operator {
                        op: "asserts".into(),
                        ty: Box::new(subject),
                    }
                } else if TYPE_KEYWORDS.contains(&name.as_str()) {
                    self.advance();
                    TsTypeKind::Keyword(name)
                } else {
                    let name = self.parse_qualified_name()?;
                    let type_args = if self.check_exact(&TokenKind::Lt) && !self.at_line_break() {
                        self.parse_type_args()?
                    } else {
                        Vec::new()
                    };
                    TsTypeKind::Ref { name, type_args }
                }
            }
            TokenKind::Void | TokenKind::Null | TokenKind::This => {
                let token = self.advance();
                TsTypeKind::Keyword(token.kind.to_string())
            }
            TokenKind::TypeOf => {
                self.advance();
                let name = self.parse_qualified_name()?;
                TsTypeKind::TypeQuery(name)
            }
            TokenKind::Str { raw, .. } => {
                self.advance();
                TsTypeKind::Lit(raw)
            }
            TokenKind::Num { raw, .. } | TokenKind::BigInt(raw) => {
                self.advance();
                TsTypeKind::Lit(raw)
            }
            TokenKind::NoSubstitutionTemplate { raw, .. } => {
                self.advance();
                TsTypeKind::Lit(format!("`{raw}`"))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                TsTypeKind::Lit(token.kind.to_string())
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek_kind().clone() {
                    TokenKind::Num { raw, .. } | TokenKind::BigInt(raw) => {
                        self.advance();
                        TsTypeKind::Lit(format!("-{raw}"))
                    }
                    other => {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            format!("expected number after '-' in type, got '{other}'"),
                        );
                        return None;
                    }
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                TsTypeKind::Paren(Box::new(inner))
            }
            TokenKind::LBracket => self.parse_tuple_type()?,
            TokenKind::LBrace => {
                if self.starts_mapped_type() {
                    self.parse_mapped_type()?
                } else {
                    TsTypeKind::TypeLit(self.parse_type_members()?)
                }
            }
            TokenKind::Eof => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "expected type, got end of input");
                return None;
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected type, got '{other}'"),
                );
                return None;
            }
        };
        Some(TsType {
            kind,
            span: self.span_from(start),
        })
    }

    /// `A.B.C`
    fn parse_qualified_name(&mut self) -> Option<String> {
        let mut name = self.expect_identifier_name()?.name;
        while self.check_exact(&TokenKind::Dot) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_identifier_name()?.name);
        }
        Some(name)
    }

    /// `[A, B?, ...C[]]`, optionally with element labels.
    fn parse_tuple_type(&mut self) -> Option<TsTypeKind> {
        self.expect(&TokenKind::LBracket)?;
        let mut elems = Vec::new();
        while !self.check_exact(&TokenKind::RBracket) {
            let rest = self.eat(&TokenKind::Ellipsis);
            let labelled = matches!(self.peek_kind(), TokenKind::Ident(_))
                && (self.look_ahead(1).kind == TokenKind::Colon
                    || (self.look_ahead(1).kind == TokenKind::Question
                        && self.look_ahead(2).kind == TokenKind::Colon));
            if labelled {
                self.advance();
                self.eat(&TokenKind::Question);
                self.advance();
            }
            let start = self.current_span();
            let mut ty = self.parse_type()?;
            self.eat(&TokenKind::Question);
            if rest {
                ty = TsType {
                    kind: TsTypeKind::Operator {
                        op: "...".into(),
                        ty: Box::new(ty),
                    },
                    span: self.span_from(start),
                };
            }
            elems.push(ty);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Some(TsTypeKind::Tuple(elems))
    }

    fn starts_mapped_type(&self) -> bool {
        let mut offset = 1;
        if matches!(self.look_ahead(offset).kind, TokenKind::Plus | TokenKind::Minus) {
            offset += 1;
        }
        if matches!(&self.look_ahead(offset).kind, TokenKind::Ident(n) if n == "readonly") {
            offset += 1;
        }
        self.look_ahead(offset).kind == TokenKind::LBracket
            && matches!(self.look_ahead(offset + 1).kind, TokenKind::Ident(_))
            && self.look_ahead(offset + 2).kind == TokenKind::In
    }

    /// `{ readonly [K in keyof T]?: T[K] }`
    fn parse_mapped_type(&mut self) -> Option<TsTypeKind> {
        self.expect(&TokenKind::LBrace)?;
        if !self.eat(&TokenKind::Plus) {
            self.eat(&TokenKind::Minus);
        }
        self.eat_ident("readonly");
        self.expect(&TokenKind::LBracket)?;
        let param = self.expect_identifier()?;
        self.expect(&TokenKind::In)?;
        let constraint = self.parse_type()?;
        if self.eat_ident("as") {
            self.parse_type()?;
        }
        self.expect(&TokenKind::RBracket)?;
        if !self.eat(&TokenKind::Plus) {
            self.eat(&TokenKind::Minus);
        }
        self.eat(&TokenKind::Question);
        let ty = if self.eat(&TokenKind::Colon) {
            Some(Box::new(self.parse_type()?))
        } else {
            None
        };
        self.eat(&TokenKind::Semicolon);
        self.expect(&TokenKind::RBrace)?;
        Some(TsTypeKind::Mapped {
            param,
            constraint: Box::new(constraint),
            ty,
        })
    }

    // ── Type Parameters & Arguments ───────────────────────────────────────────

    /// `<T, U extends V = W>`
    pub(crate) fn parse_type_params(&mut self) -> Option<Vec<TsTypeParam>> {
        self.expect(&TokenKind::Lt)?;
        let mut params = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Gt | TokenKind::Eof) {
            let start = self.current_span();
            // Variance and const modifiers.
            while (self.check_exact(&TokenKind::Const)
                || self.check_exact(&TokenKind::In)
                || self.check_ident("out"))
                && matches!(self.look_ahead(1).kind, TokenKind::Ident(_))
            {
                self.advance();
            }
            let name = self.expect_identifier()?;
            let constraint = if self.eat(&TokenKind::Extends) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(TsTypeParam {
                name,
                constraint,
                default,
                span: self.span_from(start),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_type_close()?;
        Some(params)
    }

    /// `<A, B>`
    pub(crate) fn parse_type_args(&mut self) -> Option<Vec<TsType>> {
        self.expect(&TokenKind::Lt)?;
        let mut args = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Gt | TokenKind::Eof) {
            args.push(self.parse_type()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_type_close()?;
        Some(args)
    }

    // ── Object Type Members ───────────────────────────────────────────────────

    /// `{ member; member, member }` for interfaces and type literals.
    pub(crate) fn parse_type_members(&mut self) -> Option<Vec<TsTypeMember>> {
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            members.push(self.parse_type_member()?);
            if self.eat(&TokenKind::Semicolon) || self.eat(&TokenKind::Comma) {
                continue;
            }
            if !self.check_exact(&TokenKind::RBrace) && !self.at_line_break() {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected ';', got '{}'", self.peek_kind()),
                );
                return None;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(members)
    }

    fn parse_type_member(&mut self) -> Option<TsTypeMember> {
        let start = self.current_span();

        if self.check_exact(&TokenKind::LParen) || self.check_exact(&TokenKind::Lt) {
            let (type_params, params, ret) = self.parse_signature()?;
            return Some(TsTypeMember {
                kind: TsTypeMemberKind::Call {
                    type_params,
                    params,
                    ret,
                },
                span: self.span_from(start),
            });
        }
        if self.check_exact(&TokenKind::New)
            && matches!(self.look_ahead(1).kind, TokenKind::LParen | TokenKind::Lt)
        {
            self.advance();
            let (type_params, params, ret) = self.parse_signature()?;
            return Some(TsTypeMember {
                kind: TsTypeMemberKind::Call {
                    type_params,
                    params,
                    ret,
                },
                span: self.span_from(start),
            });
        }

        let readonly = self.check_ident("readonly")
            && !matches!(
                self.look_ahead(1).kind,
                TokenKind::Colon | TokenKind::Question | TokenKind::LParen | TokenKind::Semicolon
            );
        if readonly {
            self.advance();
        }

        // Index signature: `[key: string]: T`
        if self.check_exact(&TokenKind::LBracket)
            && matches!(self.look_ahead(1).kind, TokenKind::Ident(_))
            && self.look_ahead(2).kind == TokenKind::Colon
        {
            self.advance();
            let param = self.expect_identifier()?;
            self.expect(&TokenKind::Colon)?;
            let param_ty = self.parse_type()?;
            self.expect(&TokenKind::RBracket)?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            return Some(TsTypeMember {
                kind: TsTypeMemberKind::Index {
                    param,
                    param_ty,
                    ty,
                    readonly,
                },
                span: self.span_from(start),
            });
        }

        // Accessor signatures are recorded as methods.
        if (self.check_ident("get") || self.check_ident("set"))
            && !matches!(
                self.look_ahead(1).kind,
                TokenKind::Colon
                    | TokenKind::Question
                    | TokenKind::LParen
                    | TokenKind::Semicolon
                    | TokenKind::Comma
                    | TokenKind::RBrace
            )
        {
            self.advance();
        }

        let key = self.parse_prop_key(false)?;
        let optional = self.eat(&TokenKind::Question);
        if self.check_exact(&TokenKind::LParen) || self.check_exact(&TokenKind::Lt) {
            let (type_params, params, ret) = self.parse_signature()?;
            return Some(TsTypeMember {
                kind: TsTypeMemberKind::Method {
                    key,
                    optional,
                    type_params,
                    params,
                    ret,
                },
                span: self.span_from(start),
            });
        }
        let ty = self.parse_optional_type_annotation()?;
        Some(TsTypeMember {
            kind: TsTypeMemberKind::Property {
                key,
                optional,
                readonly,
                ty,
            },
            span: self.span_from(start),
        })
    }

    #[allow(clippy::type_complexity)]
    fn parse_signature(&mut self) -> Option<(Vec<TsTypeParam>, Vec<Param>, Option<TsType>)> {
        let type_params = self.parse_optional_type_params()?;
        let params = self.parse_params()?;
        let ret = self.parse_optional_type_annotation()?;
        Some((type_params, params, ret))
    }
}

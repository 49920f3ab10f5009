//! Binding and assignment patterns.
//!
//! ```text
//! BindingTarget  = Ident | "[" ArrayElems "]" | "{" ObjectProps "}"
//! BindingElement = BindingTarget ["=" Assignment]
//! ```

use ecmaform_lexer::TokenKind;
use ecmaform_types::ast::*;
use ecmaform_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// A declaration binding: identifier, array pattern or object pattern.
    pub(crate) fn parse_binding_target(&mut self) -> Option<Pattern> {
        self.enter()?;
        let result = self.parse_binding_target_inner();
        self.leave();
        result
    }

    fn parse_binding_target_inner(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::Ident(_) => {
                let id = self.expect_identifier()?;
                Some(Pattern::ident(id.name, id.span))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elems = Vec::new();
                while !self.check_exact(&TokenKind::RBracket) {
                    if self.eat(&TokenKind::Comma) {
                        elems.push(None);
                        continue;
                    }
                    let elem_start = self.current_span();
                    if self.eat(&TokenKind::Ellipsis) {
                        let inner = self.parse_binding_target()?;
                        elems.push(Some(Pattern::new(
                            PatternKind::Rest(Box::new(inner)),
                            self.span_from(elem_start),
                        )));
                        break;
                    }
                    elems.push(Some(self.parse_binding_element()?));
                    if !self.check_exact(&TokenKind::RBracket) {
                        self.expect(&TokenKind::Comma)?;
                    }
                }
                self.expect(&TokenKind::RBracket)?;
                Some(Pattern::new(PatternKind::Array(elems), self.span_from(start)))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut props = Vec::new();
                while !self.check_exact(&TokenKind::RBrace) {
                    let prop = self.parse_object_pattern_prop()?;
                    let is_rest = matches!(prop.kind, ObjectPatPropKind::Rest(_));
                    props.push(prop);
                    if is_rest || self.check_exact(&TokenKind::RBrace) {
                        break;
                    }
                    self.expect(&TokenKind::Comma)?;
                }
                self.expect(&TokenKind::RBrace)?;
                Some(Pattern::new(PatternKind::Object(props), self.span_from(start)))
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected binding pattern, got '{other}'"),
                );
                None
            }
        }
    }

    fn parse_object_pattern_prop(&mut self) -> Option<ObjectPatProp> {
        let start = self.current_span();
        if self.eat(&TokenKind::Ellipsis) {
            let id = self.expect_identifier()?;
            return Some(ObjectPatProp {
                kind: ObjectPatPropKind::Rest(Pattern::ident(id.name, id.span)),
                span: self.span_from(start),
            });
        }
        if matches!(self.peek_kind(), TokenKind::Ident(_))
            && self.look_ahead(1).kind != TokenKind::Colon
        {
            let name = self.expect_identifier()?;
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.with_no_in(false, |p| p.parse_assignment())?)
            } else {
                None
            };
            return Some(ObjectPatProp {
                kind: ObjectPatPropKind::Shorthand { name, default },
                span: self.span_from(start),
            });
        }
        let key = self.parse_prop_key(false)?;
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_binding_element()?;
        Some(ObjectPatProp {
            kind: ObjectPatPropKind::KeyValue { key, value },
            span: self.span_from(start),
        })
    }

    /// `target [= default]`
    pub(crate) fn parse_binding_element(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        let target = self.parse_binding_target()?;
        if !self.eat(&TokenKind::Eq) {
            return Some(target);
        }
        let default = self.with_no_in(false, |p| p.parse_assignment())?;
        Some(Pattern::new(
            PatternKind::Assign {
                left: Box::new(target),
                right: Box::new(default),
            },
            self.span_from(start),
        ))
    }

    /// Reinterpret an already-parsed expression as an assignment pattern
    /// (the head of `for (x of xs)` / `for (x in o)`).
    pub(crate) fn expr_to_pattern(&mut self, expr: Expr) -> Option<Pattern> {
        let span = expr.span;
        let parenthesized = self.parenthesized.contains(&span);
        let kind = match expr.kind {
            ExprKind::Ident(name) => PatternKind::Ident(name),
            ExprKind::Member { .. } | ExprKind::TsNonNull(_) | ExprKind::TsAs { .. } => {
                PatternKind::Expr(Box::new(expr))
            }
            ExprKind::Array(elems) if !parenthesized => {
                let last = elems.len().saturating_sub(1);
                let mut out = Vec::with_capacity(elems.len());
                for (i, elem) in elems.into_iter().enumerate() {
                    let Some(elem) = elem else {
                        out.push(None);
                        continue;
                    };
                    if elem.spread {
                        if i != last {
                            self.error_at(
                                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                                "rest element must be last",
                                elem.expr.span,
                            );
                            return None;
                        }
                        let elem_span = elem.expr.span;
                        let inner = self.expr_to_pattern(elem.expr)?;
                        out.push(Some(Pattern::new(
                            PatternKind::Rest(Box::new(inner)),
                            elem_span,
                        )));
                    } else {
                        out.push(Some(self.expr_to_element(elem.expr)?));
                    }
                }
                PatternKind::Array(out)
            }
            ExprKind::Object(props) if !parenthesized => {
                let mut out = Vec::with_capacity(props.len());
                for prop in props {
                    let kind = match prop.kind {
                        PropKind::Shorthand(name) => ObjectPatPropKind::Shorthand {
                            name,
                            default: None,
                        },
                        PropKind::KeyValue { key, value } => ObjectPatPropKind::KeyValue {
                            key,
                            value: self.expr_to_element(value)?,
                        },
                        PropKind::Spread(rest) => ObjectPatPropKind::Rest(self.expr_to_pattern(rest)?),
                        PropKind::Method { .. } => {
                            self.error_at(
                                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                                "invalid destructuring target",
                                prop.span,
                            );
                            return None;
                        }
                    };
                    out.push(ObjectPatProp {
                        kind,
                        span: prop.span,
                    });
                }
                PatternKind::Object(out)
            }
            _ => {
                self.error_at(
                    ErrorCode::INVALID_ASSIGNMENT_TARGET,
                    "invalid assignment target",
                    span,
                );
                return None;
            }
        };
        Some(Pattern::new(kind, span))
    }

    /// A destructuring element, where `target = default` becomes a pattern
    /// default.
    fn expr_to_element(&mut self, expr: Expr) -> Option<Pattern> {
        match expr.kind {
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                value,
            } => {
                let left = self.expr_to_pattern(*target)?;
                Some(Pattern::new(
                    PatternKind::Assign {
                        left: Box::new(left),
                        right: value,
                    },
                    expr.span,
                ))
            }
            kind => self.expr_to_pattern(Expr::new(kind, expr.span)),
        }
    }
}

//! Expression parsing.
//!
//! Precedence (lowest to highest):
//! ```text
//! 1.  sequence       a, b
//! 2.  assignment     = += -= *= /= %= **= <<= >>= >>>= &= |= ^= &&= ||= ??=
//!                    arrow functions, yield
//! 3.  conditional    a ? b : c
//! 4.  binary         ?? || && | ^ & == < << + * **   (see BinaryOp::precedence)
//!                    TypeScript `as` / `satisfies` bind like relational operators
//! 5.  unary          ! ~ + - typeof void delete await ++x --x
//! 6.  postfix        x++ x--
//! 7.  call/member    a.b a?.b a[b] a(b) a`t` new A() a!
//! 8.  primary        literals, identifiers, ( ), [ ], { }, function, class, templates
//! ```

use ecmaform_lexer::TokenKind;
use ecmaform_types::ast::*;
use ecmaform_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Sequence & Assignment
    // ══════════════════════════════════════════════════════════════════════════

    /// `Assignment ("," Assignment)*`
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let first = self.parse_assignment()?;
        if !self.check_exact(&TokenKind::Comma) {
            return Some(first);
        }
        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        Some(Expr::new(ExprKind::Sequence(exprs), self.span_from(start)))
    }

    pub(crate) fn parse_assignment(&mut self) -> Option<Expr> {
        self.enter()?;
        let result = self.parse_assignment_inner();
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self) -> Option<Expr> {
        let start = self.current_span();

        if self.in_generator && self.check_ident("yield") {
            return self.parse_yield(start);
        }
        if let Some(arrow) = self.try_parse_arrow(start)? {
            return Some(arrow);
        }

        let left = self.parse_conditional()?;
        let Some(op) = assign_op(self.peek_kind()) else {
            return Some(left);
        };
        self.check_assign_target(&left, op == AssignOp::Assign)?;
        self.advance();
        let value = self.parse_assignment()?;
        Some(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(left),
                value: Box::new(value),
            },
            self.span_from(start),
        ))
    }

    /// `yield`, `yield expr`, `yield* expr`
    fn parse_yield(&mut self, start: Span) -> Option<Expr> {
        self.advance();
        let has_arg = !self.at_line_break()
            && !matches!(
                self.peek_kind(),
                TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::Comma
                    | TokenKind::Semicolon
                    | TokenKind::Colon
                    | TokenKind::Eof
                    | TokenKind::In
            );
        if !has_arg {
            return Some(Expr::new(
                ExprKind::Yield {
                    arg: None,
                    delegate: false,
                },
                self.span_from(start),
            ));
        }
        let delegate = self.eat(&TokenKind::Star);
        let arg = self.parse_assignment()?;
        Some(Expr::new(
            ExprKind::Yield {
                arg: Some(Box::new(arg)),
                delegate,
            },
            self.span_from(start),
        ))
    }

    /// Validates the left-hand side of an assignment. Destructuring patterns
    /// are only allowed for plain `=`.
    fn check_assign_target(&mut self, target: &Expr, allow_pattern: bool) -> Option<()> {
        if self.is_valid_target(target, allow_pattern) {
            Some(())
        } else {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "invalid assignment target",
                target.span,
            );
            None
        }
    }

    fn is_valid_target(&self, target: &Expr, allow_pattern: bool) -> bool {
        match &target.kind {
            ExprKind::Ident(_) | ExprKind::Member { .. } => true,
            ExprKind::TsNonNull(inner) | ExprKind::TsAs { expr: inner, .. } => {
                self.is_valid_target(inner, false)
            }
            ExprKind::Array(elems) if allow_pattern && !self.parenthesized.contains(&target.span) => {
                let last = elems.len().saturating_sub(1);
                elems.iter().enumerate().all(|(i, elem)| match elem {
                    None => true,
                    Some(e) if e.spread => i == last && self.is_valid_target(&e.expr, true),
                    Some(e) => self.is_valid_binding_element(&e.expr),
                })
            }
            ExprKind::Object(props) if allow_pattern && !self.parenthesized.contains(&target.span) => {
                let last = props.len().saturating_sub(1);
                props.iter().enumerate().all(|(i, prop)| match &prop.kind {
                    PropKind::Shorthand(_) => true,
                    PropKind::KeyValue { value, .. } => self.is_valid_binding_element(value),
                    PropKind::Spread(rest) => i == last && self.is_valid_target(rest, false),
                    PropKind::Method { .. } => false,
                })
            }
            _ => false,
        }
    }

    /// A destructuring element: a target, optionally with a default.
    fn is_valid_binding_element(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                ..
            } => self.is_valid_target(target, true),
            _ => self.is_valid_target(expr, true),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Arrow Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// Detects and parses an arrow function at the current position.
    /// `Some(None)` means "not an arrow"; `None` means an arrow was
    /// recognised but failed to parse.
    fn try_parse_arrow(&mut self, start: Span) -> Option<Option<Expr>> {
        let next = self.look_ahead(1).clone();
        match self.peek_kind().clone() {
            TokenKind::Ident(name) if next.kind == TokenKind::Arrow && !next.had_line_break => {
                let span = self.advance().span;
                let params = vec![simple_param(name, span)];
                self.parse_arrow_body(start, params, false, Vec::new(), None)
                    .map(Some)
            }
            TokenKind::Ident(name) if name == "async" && !next.had_line_break => {
                match next.kind {
                    TokenKind::Ident(param)
                        if self.look_ahead(2).kind == TokenKind::Arrow
                            && !self.look_ahead(2).had_line_break =>
                    {
                        self.advance();
                        let span = self.advance().span;
                        let params = vec![simple_param(param, span)];
                        self.parse_arrow_body(start, params, true, Vec::new(), None)
                            .map(Some)
                    }
                    TokenKind::LParen if self.paren_starts_arrow(1) => {
                        self.advance();
                        self.parse_paren_arrow(start, true, Vec::new()).map(Some)
                    }
                    TokenKind::LParen if self.typescript && self.paren_may_start_typed_arrow(1) => {
                        Some(self.try_parse(|p| {
                            p.advance();
                            p.parse_paren_arrow(start, true, Vec::new())
                        }))
                    }
                    _ => Some(None),
                }
            }
            TokenKind::LParen if self.paren_starts_arrow(0) => {
                self.parse_paren_arrow(start, false, Vec::new()).map(Some)
            }
            TokenKind::LParen if self.typescript && self.paren_may_start_typed_arrow(0) => {
                Some(self.try_parse(|p| p.parse_paren_arrow(start, false, Vec::new())))
            }
            TokenKind::Lt if self.typescript => Some(self.try_parse(|p| {
                let type_params = p.parse_type_params()?;
                let is_async = false;
                p.parse_paren_arrow(start, is_async, type_params)
            })),
            _ => Some(None),
        }
    }

    /// `( ... ) =>` on the same line.
    fn paren_starts_arrow(&self, offset: usize) -> bool {
        self.after_matching_bracket(offset).is_some_and(|after| {
            let token = self.look_ahead(after);
            token.kind == TokenKind::Arrow && !token.had_line_break
        })
    }

    /// `( ... ) :` could be an arrow with a return type annotation, or the
    /// consequent of a conditional.
    fn paren_may_start_typed_arrow(&self, offset: usize) -> bool {
        self.after_matching_bracket(offset)
            .is_some_and(|after| self.look_ahead(after).kind == TokenKind::Colon)
    }

    fn parse_paren_arrow(
        &mut self,
        start: Span,
        is_async: bool,
        type_params: Vec<TsTypeParam>,
    ) -> Option<Expr> {
        let ctx = self.fn_context();
        self.in_async = is_async;
        let params = self.parse_params();
        self.restore_fn_context(ctx);
        let params = params?;
        let return_type = if self.typescript && self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.parse_arrow_body(start, params, is_async, type_params, return_type)
    }

    fn parse_arrow_body(
        &mut self,
        start: Span,
        params: Vec<Param>,
        is_async: bool,
        type_params: Vec<TsTypeParam>,
        return_type: Option<TsType>,
    ) -> Option<Expr> {
        let arrow = self.expect(&TokenKind::Arrow)?;
        if arrow.had_line_break {
            self.error_at(
                ErrorCode::UNEXPECTED_TOKEN,
                "line break is not allowed before '=>'",
                arrow.span,
            );
            return None;
        }
        let ctx = self.fn_context();
        self.in_function = true;
        self.in_async = is_async;
        self.in_generator = false;
        let body = if self.check_exact(&TokenKind::LBrace) {
            self.no_in = false;
            self.parse_block().map(ArrowBody::Block)
        } else {
            self.parse_assignment()
                .map(|expr| ArrowBody::Expr(Box::new(expr)))
        };
        self.restore_fn_context(ctx);
        let body = body?;
        Some(Expr::new(
            ExprKind::Arrow(Box::new(ArrowFunction {
                params,
                body,
                is_async,
                type_params,
                return_type,
                span: self.span_from(start),
            })),
            self.span_from(start),
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Conditional & Binary
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_conditional(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Some(test);
        }
        let cons = self.with_no_in(false, |p| p.parse_assignment())?;
        self.expect(&TokenKind::Colon)?;
        let alt = self.parse_assignment()?;
        Some(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                cons: Box::new(cons),
                alt: Box::new(alt),
            },
            self.span_from(start),
        ))
    }

    /// Precedence climbing over [`BinaryOp::precedence`].
    fn parse_binary(&mut self, min_prec: u8) -> Option<Expr> {
        self.chain(|p| p.parse_binary_inner(min_prec))
    }

    fn parse_binary_inner(&mut self, min_prec: u8) -> Option<Expr> {
        let start = self.current_span();
        let mut left = self.parse_unary()?;

        loop {
            if self.typescript
                && !self.at_line_break()
                && (self.check_ident("as") || self.check_ident("satisfies"))
            {
                if AS_PRECEDENCE < min_prec {
                    break;
                }
                self.enter()?;
                let is_as = self.advance().kind == TokenKind::Ident("as".into());
                let ty = if is_as && self.check_exact(&TokenKind::Const) {
                    let span = self.advance().span;
                    TsType {
                        kind: TsTypeKind::Keyword("const".into()),
                        span,
                    }
                } else {
                    self.parse_type()?
                };
                let expr = Box::new(left);
                let kind = if is_as {
                    ExprKind::TsAs { expr, ty }
                } else {
                    ExprKind::TsSatisfies { expr, ty }
                };
                left = Expr::new(kind, self.span_from(start));
                continue;
            }

            let Some(op) = binary_op(self.peek_kind(), self.no_in) else {
                break;
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            if op == BinaryOp::Exp && self.is_bare_unary(&left) {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    "unary expression before '**' must be parenthesized",
                );
                return None;
            }
            self.enter()?;
            self.advance();
            let next_min = if op.is_right_associative() { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            if self.mixes_nullish(op, &left) || self.mixes_nullish(op, &right) {
                self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    "'??' cannot be mixed with '||' or '&&' without parentheses",
                    start.merge(right.span),
                );
                return None;
            }
            left = Expr::binary(op, left, right, self.span_from(start));
        }
        Some(left)
    }

    fn is_bare_unary(&self, expr: &Expr) -> bool {
        matches!(expr.kind, ExprKind::Unary { .. } | ExprKind::Await(_))
            && !self.parenthesized.contains(&expr.span)
    }

    /// `a ?? b || c` and friends need explicit parentheses.
    fn mixes_nullish(&self, op: BinaryOp, operand: &Expr) -> bool {
        let ExprKind::Binary { op: inner, .. } = &operand.kind else {
            return false;
        };
        let mixed = match op {
            BinaryOp::NullishCoalescing => {
                matches!(inner, BinaryOp::LogicalOr | BinaryOp::LogicalAnd)
            }
            BinaryOp::LogicalOr | BinaryOp::LogicalAnd => *inner == BinaryOp::NullishCoalescing,
            _ => false,
        };
        mixed && !self.parenthesized.contains(&operand.span)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Unary & Postfix
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::TypeOf => Some(UnaryOp::TypeOf),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let arg = self.nested(|p| p.parse_unary())?;
            return Some(Expr::new(
                ExprKind::Unary {
                    op,
                    arg: Box::new(arg),
                },
                self.span_from(start),
            ));
        }

        match self.peek_kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let arg = self.nested(|p| p.parse_unary())?;
                self.check_assign_target(&arg, false)?;
                Some(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        arg: Box::new(arg),
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Ident(name) if name == "await" && self.await_allowed() => {
                self.advance();
                let arg = self.nested(|p| p.parse_unary())?;
                Some(Expr::new(
                    ExprKind::Await(Box::new(arg)),
                    self.span_from(start),
                ))
            }
            // `<T>expr` type assertion.
            TokenKind::Lt if self.typescript => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect_type_close()?;
                let expr = self.nested(|p| p.parse_unary())?;
                Some(Expr::new(
                    ExprKind::TsAs {
                        expr: Box::new(expr),
                        ty,
                    },
                    self.span_from(start),
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let expr = self.parse_call_member(true)?;
        let op = match self.peek_kind() {
            TokenKind::PlusPlus if !self.at_line_break() => UpdateOp::Increment,
            TokenKind::MinusMinus if !self.at_line_break() => UpdateOp::Decrement,
            _ => return Some(expr),
        };
        self.check_assign_target(&expr, false)?;
        self.advance();
        Some(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                arg: Box::new(expr),
            },
            self.span_from(start),
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Call & Member
    // ══════════════════════════════════════════════════════════════════════════

    /// Left-hand-side expression: member accesses, calls (when `allow_call`),
    /// tagged templates and optional chains.
    pub(crate) fn parse_call_member(&mut self, allow_call: bool) -> Option<Expr> {
        self.chain(|p| p.parse_call_member_links(allow_call))
    }

    fn parse_call_member_links(&mut self, allow_call: bool) -> Option<Expr> {
        let start = self.current_span();
        let mut expr = if self.check_exact(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let mut in_chain = false;

        loop {
            if self.starts_link(allow_call) {
                self.enter()?;
            }
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let prop = self.parse_member_name()?;
                    expr = member(expr, prop, false, self.span_from(start));
                }
                TokenKind::QuestionDot => {
                    if !allow_call {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            "optional chain is not allowed in 'new' expression",
                        );
                        return None;
                    }
                    self.advance();
                    in_chain = true;
                    match self.peek_kind() {
                        TokenKind::LParen => {
                            let args = self.parse_arguments()?;
                            expr = call(expr, args, true, Vec::new(), self.span_from(start));
                        }
                        TokenKind::LBracket => {
                            self.advance();
                            let prop = self.with_no_in(false, |p| p.parse_expression())?;
                            self.expect(&TokenKind::RBracket)?;
                            expr = member(
                                expr,
                                MemberProp::Computed(Box::new(prop)),
                                true,
                                self.span_from(start),
                            );
                        }
                        TokenKind::Lt if self.typescript => {
                            let type_args = self.parse_type_args()?;
                            let args = self.parse_arguments()?;
                            expr = call(expr, args, true, type_args, self.span_from(start));
                        }
                        _ => {
                            let prop = self.parse_member_name()?;
                            expr = member(expr, prop, true, self.span_from(start));
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let prop = self.with_no_in(false, |p| p.parse_expression())?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = member(
                        expr,
                        MemberProp::Computed(Box::new(prop)),
                        false,
                        self.span_from(start),
                    );
                }
                TokenKind::LParen if allow_call => {
                    let args = self.parse_arguments()?;
                    expr = call(expr, args, false, Vec::new(), self.span_from(start));
                }
                TokenKind::Lt if self.typescript && allow_call => {
                    let typed_call = self.try_parse(|p| {
                        let type_args = p.parse_type_args()?;
                        if p.check_exact(&TokenKind::LParen) {
                            Some((type_args, p.parse_arguments()?))
                        } else {
                            None
                        }
                    });
                    match typed_call {
                        Some((type_args, args)) => {
                            expr = call(expr, args, false, type_args, self.span_from(start));
                        }
                        None => break,
                    }
                }
                TokenKind::NoSubstitutionTemplate { .. } | TokenKind::TemplateHead { .. } => {
                    if in_chain {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            "tagged template cannot be used in an optional chain",
                        );
                        return None;
                    }
                    let template = self.parse_template(true)?;
                    expr = Expr::new(
                        ExprKind::TaggedTemplate {
                            tag: Box::new(expr),
                            template,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::Bang if self.typescript && !self.at_line_break() => {
                    self.advance();
                    expr = Expr::new(ExprKind::TsNonNull(Box::new(expr)), self.span_from(start));
                }
                _ => break,
            }
        }

        if in_chain {
            let span = expr.span;
            expr = Expr::new(ExprKind::OptChain(Box::new(expr)), span);
        }
        Some(expr)
    }

    /// Whether the next token continues a call/member chain.
    fn starts_link(&self, allow_call: bool) -> bool {
        match self.peek_kind() {
            TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::LBracket
            | TokenKind::NoSubstitutionTemplate { .. }
            | TokenKind::TemplateHead { .. } => true,
            TokenKind::LParen => allow_call,
            TokenKind::Lt => self.typescript && allow_call,
            TokenKind::Bang => self.typescript && !self.at_line_break(),
            _ => false,
        }
    }

    /// Property name after `.` or `?.`.
    fn parse_member_name(&mut self) -> Option<MemberProp> {
        if let TokenKind::PrivateName(name) = self.peek_kind().clone() {
            let span = self.advance().span;
            return Some(MemberProp::PrivateName(Ident::new(name, span)));
        }
        Some(MemberProp::Ident(self.expect_identifier_name()?))
    }

    /// `new Callee[<T>][(args)]` or `new.target`.
    fn parse_new(&mut self) -> Option<Expr> {
        self.nested(|p| p.parse_new_inner())
    }

    fn parse_new_inner(&mut self) -> Option<Expr> {
        let start = self.expect(&TokenKind::New)?.span;
        if self.eat(&TokenKind::Dot) {
            if !self.eat_ident("target") {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected 'target', got '{}'", self.peek_kind()),
                );
                return None;
            }
            return Some(Expr::new(
                ExprKind::MetaProp {
                    meta: "new".into(),
                    prop: "target".into(),
                },
                self.span_from(start),
            ));
        }
        let callee = self.parse_call_member(false)?;
        let type_args = if self.typescript && self.check_exact(&TokenKind::Lt) {
            self.try_parse(|p| p.parse_type_args()).unwrap_or_default()
        } else {
            Vec::new()
        };
        let args = if self.check_exact(&TokenKind::LParen) {
            Some(self.parse_arguments()?)
        } else {
            None
        };
        Some(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
                type_args,
            },
            self.span_from(start),
        ))
    }

    /// `( [...]Assignment, ... )`
    fn parse_arguments(&mut self) -> Option<Vec<ExprOrSpread>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            let spread = self.eat(&TokenKind::Ellipsis);
            let expr = self.with_no_in(false, |p| p.parse_assignment())?;
            args.push(ExprOrSpread { spread, expr });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let next = self.look_ahead(1).clone();
        let kind = match self.peek_kind().clone() {
            TokenKind::Ident(name)
                if name == "async" && next.kind == TokenKind::Function && !next.had_line_break =>
            {
                self.advance();
                let function = self.parse_function(start, true, false)?;
                return Some(Expr::new(
                    ExprKind::Function(Box::new(function)),
                    self.span_from(start),
                ));
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            TokenKind::This => {
                self.advance();
                ExprKind::This
            }
            TokenKind::Super => {
                self.advance();
                ExprKind::Super
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::Null
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::Num { value, raw } => {
                self.advance();
                ExprKind::Num {
                    value,
                    raw: Some(raw),
                }
            }
            TokenKind::BigInt(raw) => {
                self.advance();
                ExprKind::BigInt(raw)
            }
            TokenKind::Str { value, raw } => {
                self.advance();
                ExprKind::Str {
                    value,
                    raw: Some(raw),
                }
            }
            TokenKind::Regex { pattern, flags } => {
                self.advance();
                ExprKind::Regex { pattern, flags }
            }
            TokenKind::NoSubstitutionTemplate { .. } | TokenKind::TemplateHead { .. } => {
                ExprKind::Template(self.parse_template(false)?)
            }
            TokenKind::LParen => return self.parse_parenthesized(),
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                let function = self.parse_function(start, false, false)?;
                ExprKind::Function(Box::new(function))
            }
            TokenKind::Class => {
                let class = self.parse_class(start, false)?;
                ExprKind::Class(Box::new(class))
            }
            TokenKind::Import => {
                self.advance();
                if self.eat(&TokenKind::Dot) {
                    if !self.eat_ident("meta") {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            format!("expected 'meta', got '{}'", self.peek_kind()),
                        );
                        return None;
                    }
                    if self.dialect == ProgramKind::Script {
                        self.error_at(
                            ErrorCode::MODULE_SYNTAX_IN_SCRIPT,
                            "'import.meta' may only appear in modules",
                            self.span_from(start),
                        );
                        return None;
                    }
                    ExprKind::MetaProp {
                        meta: "import".into(),
                        prop: "meta".into(),
                    }
                } else if self.check_exact(&TokenKind::LParen) {
                    // Dynamic `import(...)`: a call whose callee is the keyword.
                    ExprKind::Ident("import".into())
                } else {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected '(' or '.', got '{}'", self.peek_kind()),
                    );
                    return None;
                }
            }
            TokenKind::Eof => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unexpected end of input");
                return None;
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected token '{other}'"),
                );
                return None;
            }
        };
        Some(Expr::new(kind, self.span_from(start)))
    }

    /// `( Expression )`; the span is widened to cover the parentheses.
    fn parse_parenthesized(&mut self) -> Option<Expr> {
        let start = self.expect(&TokenKind::LParen)?.span;
        let mut expr = self.with_no_in(false, |p| p.parse_expression())?;
        self.expect(&TokenKind::RParen)?;
        expr.span = self.span_from(start);
        self.parenthesized.insert(expr.span);
        Some(expr)
    }

    /// `[a, , ...b]`
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.expect(&TokenKind::LBracket)?.span;
        let mut elems = Vec::new();
        while !self.check_exact(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma) {
                elems.push(None);
                continue;
            }
            let spread = self.eat(&TokenKind::Ellipsis);
            let expr = self.with_no_in(false, |p| p.parse_assignment())?;
            elems.push(Some(ExprOrSpread { spread, expr }));
            if !self.check_exact(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Some(Expr::new(ExprKind::Array(elems), self.span_from(start)))
    }

    /// The current word is a modifier (`get`, `set`, `async`) rather than a
    /// property name.
    fn is_object_modifier(&self) -> bool {
        let next = self.look_ahead(1);
        !matches!(
            next.kind,
            TokenKind::Colon
                | TokenKind::LParen
                | TokenKind::Comma
                | TokenKind::RBrace
                | TokenKind::Eq
                | TokenKind::Lt
        )
    }

    /// `{ a, b: 1, [c]: 2, ...d, m() {}, get g() {} }`
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let mut props = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            props.push(self.parse_object_prop()?);
            if !self.check_exact(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(Expr::new(ExprKind::Object(props), self.span_from(start)))
    }

    fn parse_object_prop(&mut self) -> Option<Prop> {
        let start = self.current_span();
        if self.eat(&TokenKind::Ellipsis) {
            let arg = self.with_no_in(false, |p| p.parse_assignment())?;
            return Some(Prop {
                kind: PropKind::Spread(arg),
                span: self.span_from(start),
            });
        }

        let is_async = self.check_ident("async")
            && self.is_object_modifier()
            && !self.look_ahead(1).had_line_break;
        if is_async {
            self.advance();
        }
        let is_generator = self.eat(&TokenKind::Star);
        let accessor = if (self.check_ident("get") || self.check_ident("set"))
            && self.is_object_modifier()
        {
            let kind = if self.check_ident("get") {
                MethodKind::Getter
            } else {
                MethodKind::Setter
            };
            self.advance();
            Some(kind)
        } else {
            None
        };

        let key_is_plain_ident = matches!(self.peek_kind(), TokenKind::Ident(_));
        let key = self.parse_prop_key(false)?;

        if self.check_exact(&TokenKind::LParen) || (self.typescript && self.check_exact(&TokenKind::Lt))
        {
            let function = self.parse_function_rest(start, None, is_async, is_generator, false)?;
            return Some(Prop {
                kind: PropKind::Method {
                    key,
                    function: Box::new(function),
                    kind: accessor.unwrap_or(MethodKind::Method),
                },
                span: self.span_from(start),
            });
        }
        if accessor.is_some() || is_async || is_generator {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '(', got '{}'", self.peek_kind()),
            );
            return None;
        }

        if self.eat(&TokenKind::Colon) {
            let value = self.with_no_in(false, |p| p.parse_assignment())?;
            return Some(Prop {
                kind: PropKind::KeyValue { key, value },
                span: self.span_from(start),
            });
        }

        match key {
            PropKey::Ident(ident) if key_is_plain_ident => {
                // `{ a = 1 }` is only meaningful as a destructuring target; it
                // is kept as `a: a = 1` and validated when converted.
                if self.eat(&TokenKind::Eq) {
                    let default = self.with_no_in(false, |p| p.parse_assignment())?;
                    let target = Expr::ident(ident.name.clone(), ident.span);
                    let value = Expr::assign(target, default, self.span_from(start));
                    return Some(Prop {
                        kind: PropKind::KeyValue {
                            key: PropKey::Ident(ident),
                            value,
                        },
                        span: self.span_from(start),
                    });
                }
                Some(Prop {
                    kind: PropKind::Shorthand(ident),
                    span: self.span_from(start),
                })
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected ':', got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Template literal. Untagged templates must not contain invalid escapes.
    ///
    /// Each substitution counts as a nesting level: lowering turns the
    /// literal into a left-nested `+` chain.
    pub(crate) fn parse_template(&mut self, tagged: bool) -> Option<Template> {
        self.chain(|p| p.parse_template_parts(tagged))
    }

    fn parse_template_parts(&mut self, tagged: bool) -> Option<Template> {
        let start = self.current_span();
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();

        let first = self.advance();
        match first.kind {
            TokenKind::NoSubstitutionTemplate { cooked, raw } => {
                quasis.push(self.template_element(cooked, raw, first.span, tagged)?);
            }
            TokenKind::TemplateHead { cooked, raw } => {
                quasis.push(self.template_element(cooked, raw, first.span, tagged)?);
                loop {
                    self.enter()?;
                    exprs.push(self.with_no_in(false, |p| p.parse_expression())?);
                    let part = self.advance();
                    match part.kind {
                        TokenKind::TemplateMiddle { cooked, raw } => {
                            quasis.push(self.template_element(cooked, raw, part.span, tagged)?);
                        }
                        TokenKind::TemplateTail { cooked, raw } => {
                            quasis.push(self.template_element(cooked, raw, part.span, tagged)?);
                            break;
                        }
                        other => {
                            self.error_at(
                                ErrorCode::UNEXPECTED_TOKEN,
                                format!("expected '}}' to close template substitution, got '{other}'"),
                                part.span,
                            );
                            return None;
                        }
                    }
                }
            }
            other => {
                self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected template literal, got '{other}'"),
                    first.span,
                );
                return None;
            }
        }

        Some(Template {
            quasis,
            exprs,
            span: self.span_from(start),
        })
    }

    fn template_element(
        &mut self,
        cooked: Option<String>,
        raw: String,
        span: Span,
        tagged: bool,
    ) -> Option<TemplateElement> {
        if cooked.is_none() && !tagged {
            self.error_at(
                ErrorCode::INVALID_ESCAPE,
                "invalid escape sequence in template literal",
                span,
            );
            return None;
        }
        Some(TemplateElement { cooked, raw, span })
    }
}

/// Relational precedence, shared by `as` and `satisfies`.
const AS_PRECEDENCE: u8 = 10;

fn simple_param(name: String, span: Span) -> Param {
    Param {
        pat: Pattern::ident(name, span),
        type_ann: None,
        optional: false,
        span,
    }
}

fn member(object: Expr, prop: MemberProp, optional: bool, span: Span) -> Expr {
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            prop,
            optional,
        },
        span,
    )
}

fn call(
    callee: Expr,
    args: Vec<ExprOrSpread>,
    optional: bool,
    type_args: Vec<TsType>,
    span: Span,
) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
            optional,
            type_args,
        },
        span,
    )
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::StarStarEq => AssignOp::ExpAssign,
        TokenKind::LShiftEq => AssignOp::LShiftAssign,
        TokenKind::RShiftEq => AssignOp::RShiftAssign,
        TokenKind::URShiftEq => AssignOp::ZeroFillRShiftAssign,
        TokenKind::PipeEq => AssignOp::BitOrAssign,
        TokenKind::CaretEq => AssignOp::BitXorAssign,
        TokenKind::AmpEq => AssignOp::BitAndAssign,
        TokenKind::AmpAmpEq => AssignOp::AndAssign,
        TokenKind::PipePipeEq => AssignOp::OrAssign,
        TokenKind::QuestionQuestionEq => AssignOp::NullishAssign,
        _ => return None,
    })
}

fn binary_op(kind: &TokenKind, no_in: bool) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::EqEq => BinaryOp::EqEq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::EqEqEq => BinaryOp::EqEqEq,
        TokenKind::NotEqEq => BinaryOp::NotEqEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::LShift => BinaryOp::LShift,
        TokenKind::RShift => BinaryOp::RShift,
        TokenKind::URShift => BinaryOp::ZeroFillRShift,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::StarStar => BinaryOp::Exp,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::In if !no_in => BinaryOp::In,
        TokenKind::InstanceOf => BinaryOp::InstanceOf,
        TokenKind::PipePipe => BinaryOp::LogicalOr,
        TokenKind::AmpAmp => BinaryOp::LogicalAnd,
        TokenKind::QuestionQuestion => BinaryOp::NullishCoalescing,
        _ => return None,
    })
}

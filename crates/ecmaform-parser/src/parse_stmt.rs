//! Statement parsing.
//!
//! ```text
//! Statement = Block | VarStatement | ";" | ExpressionStatement
//!           | IfStatement | ForStatement | WhileStatement | DoWhileStatement
//!           | ContinueStatement | BreakStatement | ReturnStatement
//!           | LabelledStatement | ThrowStatement | TryStatement
//!           | SwitchStatement | "debugger" ";" | Declaration
//! ```

use ecmaform_lexer::TokenKind;
use ecmaform_types::ast::*;
use ecmaform_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Statement Lists
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse statements until `}` (or end of input). At top level a stray `}`
    /// is reported and skipped.
    pub(crate) fn parse_statement_list(&mut self, top_level: bool) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        let mut last_failed = false;
        while !self.at_end() {
            if self.check_exact(&TokenKind::RBrace) {
                if !top_level {
                    break;
                }
                // The failed statement before already accounts for this brace.
                if !last_failed {
                    self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unexpected '}'");
                }
                self.advance();
                last_failed = false;
                continue;
            }
            let before = self.pos_marker();
            match self.parse_statement() {
                Some(stmt) => {
                    stmts.push(stmt);
                    last_failed = false;
                }
                None => {
                    self.synchronize();
                    if self.pos_marker() == before {
                        self.advance();
                    }
                    last_failed = true;
                }
            }
        }
        stmts
    }

    /// `{ Statement* }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let stmts = self.parse_statement_list(false);
        self.expect(&TokenKind::RBrace)?;
        Some(Block {
            stmts,
            span: self.span_from(start),
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        self.enter()?;
        let result = self.parse_statement_inner();
        self.leave();
        result
    }

    fn parse_statement_inner(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                Some(Stmt::new(StmtKind::Block(block), self.span_from(start)))
            }
            TokenKind::Semicolon => {
                self.advance();
                Some(Stmt::new(StmtKind::Empty, start))
            }
            TokenKind::Var => self.parse_var_statement(VarKind::Var),
            TokenKind::Const => {
                if self.typescript && self.look_ahead(1).kind == TokenKind::Enum {
                    self.advance();
                    return self.parse_enum(start, true);
                }
                self.parse_var_statement(VarKind::Const)
            }
            TokenKind::Function => {
                let function = self.parse_function(start, false, true)?;
                Some(Stmt::new(
                    StmtKind::Function(Box::new(function)),
                    self.span_from(start),
                ))
            }
            TokenKind::Class => {
                let class = self.parse_class(start, true)?;
                Some(Stmt::new(
                    StmtKind::Class(Box::new(class)),
                    self.span_from(start),
                ))
            }
            TokenKind::If => self.parse_if(start),
            TokenKind::For => self.parse_for(start),
            TokenKind::While => {
                self.advance();
                let test = self.parse_paren_expression()?;
                let body = self.parse_statement()?;
                Some(Stmt::new(
                    StmtKind::While {
                        test,
                        body: Box::new(body),
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Do => {
                self.advance();
                let body = self.parse_statement()?;
                self.expect(&TokenKind::While)?;
                let test = self.parse_paren_expression()?;
                self.eat(&TokenKind::Semicolon);
                Some(Stmt::new(
                    StmtKind::DoWhile {
                        body: Box::new(body),
                        test,
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Return => {
                self.advance();
                let arg = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semicolon()?;
                Some(Stmt::new(StmtKind::Return(arg), self.span_from(start)))
            }
            TokenKind::Break | TokenKind::Continue => {
                let is_break = self.advance().kind == TokenKind::Break;
                let label = if matches!(self.peek_kind(), TokenKind::Ident(_)) && !self.at_line_break()
                {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                let kind = if is_break {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                };
                Some(Stmt::new(kind, self.span_from(start)))
            }
            TokenKind::Throw => {
                self.advance();
                if self.at_line_break() {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "line break is not allowed after 'throw'",
                    );
                    return None;
                }
                let arg = self.parse_expression()?;
                self.consume_semicolon()?;
                Some(Stmt::new(StmtKind::Throw(arg), self.span_from(start)))
            }
            TokenKind::Try => self.parse_try(start),
            TokenKind::Switch => self.parse_switch(start),
            TokenKind::Debugger => {
                self.advance();
                self.consume_semicolon()?;
                Some(Stmt::new(StmtKind::Debugger, self.span_from(start)))
            }
            TokenKind::With => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "'with' statements are not supported",
                );
                None
            }
            TokenKind::Import
                if !matches!(
                    self.look_ahead(1).kind,
                    TokenKind::LParen | TokenKind::Dot
                ) =>
            {
                self.parse_import(start)
            }
            TokenKind::Export => self.parse_export(start),
            TokenKind::Enum if self.typescript => self.parse_enum(start, false),
            TokenKind::Ident(name) => self.parse_identifier_statement(start, &name),
            _ => self.parse_expression_statement(start),
        }
    }

    /// Statements that begin with an identifier: contextual declarations,
    /// labels, or plain expressions.
    fn parse_identifier_statement(&mut self, start: Span, name: &str) -> Option<Stmt> {
        let next = self.look_ahead(1).clone();
        let next_on_same_line = !next.had_line_break;
        match name {
            "let" if self.is_let_declaration() => self.parse_var_statement(VarKind::Let),
            "async" if next.kind == TokenKind::Function && next_on_same_line => {
                self.advance();
                let function = self.parse_function(start, true, true)?;
                Some(Stmt::new(
                    StmtKind::Function(Box::new(function)),
                    self.span_from(start),
                ))
            }
            "interface"
                if self.typescript
                    && next_on_same_line
                    && matches!(next.kind, TokenKind::Ident(_)) =>
            {
                self.parse_interface(start)
            }
            "type"
                if self.typescript
                    && next_on_same_line
                    && matches!(next.kind, TokenKind::Ident(_)) =>
            {
                self.parse_type_alias(start)
            }
            "abstract"
                if self.typescript && next_on_same_line && next.kind == TokenKind::Class =>
            {
                self.advance();
                let class = self.parse_class(start, true)?;
                Some(Stmt::new(
                    StmtKind::Class(Box::new(class)),
                    self.span_from(start),
                ))
            }
            "declare" if self.typescript && next_on_same_line && self.is_declare_target() => {
                self.parse_declare(start)
            }
            "namespace" | "module"
                if self.typescript
                    && next_on_same_line
                    && matches!(next.kind, TokenKind::Ident(_) | TokenKind::Str { .. }) =>
            {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    format!("'{name}' declarations are not supported"),
                );
                self.skip_ambient_body();
                Some(Stmt::new(StmtKind::Empty, self.span_from(start)))
            }
            _ if next.kind == TokenKind::Colon => {
                let label = self.expect_identifier()?;
                self.advance();
                let body = self.parse_statement()?;
                Some(Stmt::new(
                    StmtKind::Labeled {
                        label,
                        body: Box::new(body),
                    },
                    self.span_from(start),
                ))
            }
            _ => self.parse_expression_statement(start),
        }
    }

    fn parse_expression_statement(&mut self, start: Span) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Some(Stmt::new(
            StmtKind::Expr(Box::new(expr)),
            self.span_from(start),
        ))
    }

    /// `let` starts a declaration when followed by a binding.
    fn is_let_declaration(&self) -> bool {
        matches!(
            self.look_ahead(1).kind,
            TokenKind::Ident(_) | TokenKind::LBracket | TokenKind::LBrace
        )
    }

    /// No expression follows `return` on this line.
    fn at_statement_end(&self) -> bool {
        self.at_line_break()
            || self.at_end()
            || matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace)
    }

    /// `( Expression )`
    pub(crate) fn parse_paren_expression(&mut self) -> Option<Expr> {
        self.expect(&TokenKind::LParen)?;
        let expr = self.with_no_in(false, |p| p.parse_expression())?;
        self.expect(&TokenKind::RParen)?;
        Some(expr)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Variable Declarations
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_var_statement(&mut self, kind: VarKind) -> Option<Stmt> {
        let start = self.current_span();
        self.advance();
        let decl = self.parse_var_declarations(kind, start)?;
        self.consume_semicolon()?;
        if !self.in_ambient {
            let missing = decl
                .decls
                .iter()
                .find(|d| d.init.is_none() && (kind == VarKind::Const || d.name.as_ident().is_none()));
            if let Some(declarator) = missing {
                let message = if kind == VarKind::Const {
                    "missing initializer in const declaration"
                } else {
                    "missing initializer in destructuring declaration"
                };
                let span = declarator.span;
                self.error_at(ErrorCode::MISSING_INITIALIZER, message, span);
            }
        }
        Some(Stmt::new(StmtKind::Var(decl), self.span_from(start)))
    }

    /// Declarators after the `var`/`let`/`const` keyword.
    pub(crate) fn parse_var_declarations(&mut self, kind: VarKind, start: Span) -> Option<VarDecl> {
        let mut decls = Vec::new();
        loop {
            let decl_start = self.current_span();
            let name = self.parse_binding_target()?;
            let definite = self.typescript && self.eat(&TokenKind::Bang);
            let type_ann = if self.typescript && self.eat(&TokenKind::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            decls.push(VarDeclarator {
                name,
                type_ann,
                definite,
                init,
                span: self.span_from(decl_start),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(VarDecl {
            kind,
            decls,
            span: self.span_from(start),
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Control Flow
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_if(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        let test = self.parse_paren_expression()?;
        let cons = self.parse_statement()?;
        let alt = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Some(Stmt::new(
            StmtKind::If {
                test,
                cons: Box::new(cons),
                alt,
            },
            self.span_from(start),
        ))
    }

    /// `for (init; test; update)`, `for (left in right)`, `for [await] (left of right)`
    fn parse_for(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        let is_await = if self.check_ident("await") && self.await_allowed() {
            self.advance();
            true
        } else {
            false
        };
        self.expect(&TokenKind::LParen)?;

        if self.eat(&TokenKind::Semicolon) {
            return self.parse_for_rest(start, None);
        }

        let var_kind = match self.peek_kind() {
            TokenKind::Var => Some(VarKind::Var),
            TokenKind::Const => Some(VarKind::Const),
            TokenKind::Ident(name) if name == "let" && self.is_let_declaration() => {
                Some(VarKind::Let)
            }
            _ => None,
        };

        if let Some(kind) = var_kind {
            let decl_start = self.current_span();
            self.advance();
            let decl = self.with_no_in(true, |p| p.parse_var_declarations(kind, decl_start))?;
            if self.check_ident("of") || self.check_exact(&TokenKind::In) {
                if decl.decls.len() != 1 || decl.decls[0].init.is_some() {
                    self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "for-in/of loop variable must be a single declaration without initializer",
                        decl.span,
                    );
                    return None;
                }
                return self.parse_for_in_of(start, ForHead::Var(decl), is_await);
            }
            self.expect(&TokenKind::Semicolon)?;
            return self.parse_for_rest(start, Some(ForInit::Var(decl)));
        }

        let init = self.with_no_in(true, |p| p.parse_expression())?;
        if self.check_ident("of") || self.check_exact(&TokenKind::In) {
            let pattern = self.expr_to_pattern(init)?;
            return self.parse_for_in_of(start, ForHead::Pattern(pattern), is_await);
        }
        self.expect(&TokenKind::Semicolon)?;
        self.parse_for_rest(start, Some(ForInit::Expr(init)))
    }

    /// The part of a classic `for` after the first `;`.
    fn parse_for_rest(&mut self, start: Span, init: Option<ForInit>) -> Option<Stmt> {
        let test = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.with_no_in(false, |p| p.parse_expression())?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check_exact(&TokenKind::RParen) {
            None
        } else {
            Some(self.with_no_in(false, |p| p.parse_expression())?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_statement()?;
        Some(Stmt::new(
            StmtKind::For {
                init,
                test,
                update,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn parse_for_in_of(&mut self, start: Span, left: ForHead, is_await: bool) -> Option<Stmt> {
        let is_of = self.eat_ident("of");
        if !is_of {
            self.advance();
        }
        let right = self.with_no_in(false, |p| {
            if is_of {
                p.parse_assignment()
            } else {
                p.parse_expression()
            }
        })?;
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let kind = if is_of {
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            }
        } else {
            StmtKind::ForIn { left, right, body }
        };
        Some(Stmt::new(kind, self.span_from(start)))
    }

    fn parse_try(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        let block = self.parse_block()?;
        let handler = if self.check_exact(&TokenKind::Catch) {
            let catch_start = self.advance().span;
            let param = if self.eat(&TokenKind::LParen) {
                let param = self.parse_binding_target()?;
                if self.typescript && self.eat(&TokenKind::Colon) {
                    self.parse_type()?;
                }
                self.expect(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            })
        } else {
            None
        };
        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "expected 'catch' or 'finally' after try block",
            );
            return None;
        }
        Some(Stmt::new(
            StmtKind::Try {
                block,
                handler,
                finalizer,
            },
            self.span_from(start),
        ))
    }

    fn parse_switch(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        let discriminant = self.parse_paren_expression()?;
        self.expect(&TokenKind::LBrace)?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            let case_start = self.current_span();
            let test = if self.eat(&TokenKind::Case) {
                Some(self.with_no_in(false, |p| p.parse_expression())?)
            } else if self.check_exact(&TokenKind::Default) {
                if seen_default {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "more than one default clause in switch statement",
                    );
                    return None;
                }
                seen_default = true;
                self.advance();
                None
            } else {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected 'case' or 'default', got '{}'", self.peek_kind()),
                );
                return None;
            };
            self.expect(&TokenKind::Colon)?;
            let mut body = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase {
                test,
                body,
                span: self.span_from(case_start),
            });
        }
        self.expect(&TokenKind::RBrace)?;
        Some(Stmt::new(
            StmtKind::Switch {
                discriminant,
                cases,
            },
            self.span_from(start),
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // TypeScript Ambient Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// `declare` is followed by something it can apply to.
    fn is_declare_target(&self) -> bool {
        match &self.look_ahead(1).kind {
            TokenKind::Var
            | TokenKind::Const
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::Enum => true,
            TokenKind::Ident(name) => matches!(
                name.as_str(),
                "let" | "async" | "abstract" | "module" | "namespace" | "global" | "type"
                    | "interface"
            ),
            _ => false,
        }
    }

    /// `declare <declaration>`: parsed and kept only so it can be stripped.
    fn parse_declare(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        if self.check_ident("module") || self.check_ident("namespace") || self.check_ident("global")
        {
            self.skip_ambient_body();
            let empty = Stmt::new(StmtKind::Empty, self.span_from(start));
            return Some(Stmt::new(
                StmtKind::TsDeclare(Box::new(empty)),
                self.span_from(start),
            ));
        }
        let saved = self.in_ambient;
        self.in_ambient = true;
        let inner = self.parse_statement();
        self.in_ambient = saved;
        Some(Stmt::new(
            StmtKind::TsDeclare(Box::new(inner?)),
            self.span_from(start),
        ))
    }

    /// Skip `module "x" { ... }` / `namespace A.B { ... }` / `global { ... }`
    /// (or a body-less `declare module "x";`) as a balanced token run.
    pub(crate) fn skip_ambient_body(&mut self) {
        while !self.at_end()
            && !self.check_exact(&TokenKind::LBrace)
            && !self.check_exact(&TokenKind::Semicolon)
        {
            self.advance();
        }
        if self.eat(&TokenKind::Semicolon) {
            return;
        }
        let mut depth = 0usize;
        while !self.at_end() {
            match self.advance().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}

//! Declaration parsing: functions, classes, modules, TypeScript declarations.
//!
//! ```text
//! FunctionDecl = ["async"] "function" ["*"] Ident [TypeParams] Params [":" Type] Block
//! ClassDecl    = "class" Ident [TypeParams] ["extends" LhsExpr] ["implements" Types] ClassBody
//! ImportDecl   = "import" (StringLit | ImportClause "from" StringLit) ";"
//! ExportDecl   = "export" ("default" ... | "*" ... | "{" ... "}" | Declaration)
//! ```

use ecmaform_lexer::TokenKind;
use ecmaform_types::ast::*;
use ecmaform_types::{ErrorCode, Span};

use crate::parser::Parser;

const ACCESSIBILITY_MODIFIERS: &[&str] = &["public", "private", "protected"];
const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "static", "readonly", "declare", "abstract", "override",
];

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// `function [*] name (params) { body }`. The current token is `function`;
    /// a preceding `async` has already been consumed.
    pub(crate) fn parse_function(
        &mut self,
        start: Span,
        is_async: bool,
        require_name: bool,
    ) -> Option<Function> {
        self.expect(&TokenKind::Function)?;
        let is_generator = self.eat(&TokenKind::Star);
        let id = if matches!(self.peek_kind(), TokenKind::Ident(_)) {
            Some(self.expect_identifier()?)
        } else if require_name {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected function name, got '{}'", self.peek_kind()),
            );
            return None;
        } else {
            None
        };
        let allow_no_body = self.typescript;
        self.parse_function_rest(start, id, is_async, is_generator, allow_no_body)
    }

    /// Type parameters, parameters, return type and body.
    pub(crate) fn parse_function_rest(
        &mut self,
        start: Span,
        id: Option<Ident>,
        is_async: bool,
        is_generator: bool,
        allow_no_body: bool,
    ) -> Option<Function> {
        let type_params = self.parse_optional_type_params()?;
        let ctx = self.fn_context();
        self.in_function = true;
        self.in_async = is_async;
        self.in_generator = is_generator;
        self.no_in = false;
        let rest = self.parse_signature_and_body(allow_no_body);
        self.restore_fn_context(ctx);
        let (params, return_type, body) = rest?;
        Some(Function {
            id,
            params,
            body,
            is_async,
            is_generator,
            type_params,
            return_type,
            span: self.span_from(start),
        })
    }

    #[allow(clippy::type_complexity)]
    fn parse_signature_and_body(
        &mut self,
        allow_no_body: bool,
    ) -> Option<(Vec<Param>, Option<TsType>, Option<Block>)> {
        let params = self.parse_params()?;
        let return_type = self.parse_optional_type_annotation()?;
        let body = if self.check_exact(&TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else if allow_no_body || self.in_ambient {
            self.consume_semicolon()?;
            None
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{{', got '{}'", self.peek_kind()),
            );
            return None;
        };
        Some((params, return_type, body))
    }

    /// `( Param, ... )`
    pub(crate) fn parse_params(&mut self) -> Option<Vec<Param>> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            let param = self.parse_param()?;
            let is_rest = matches!(param.pat.kind, PatternKind::Rest(_));
            params.push(param);
            if is_rest || !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(params)
    }

    fn parse_param(&mut self) -> Option<Param> {
        let start = self.current_span();
        if self.typescript && self.is_parameter_property() {
            self.error_at_current(
                ErrorCode::UNSUPPORTED_SYNTAX,
                "parameter properties are not supported",
            );
            return None;
        }
        let is_rest = self.eat(&TokenKind::Ellipsis);
        let mut pat = if self.check_exact(&TokenKind::This) && self.typescript {
            let span = self.advance().span;
            Pattern::ident("this", span)
        } else {
            self.parse_binding_target()?
        };
        let optional = self.typescript && self.eat(&TokenKind::Question);
        let type_ann = self.parse_optional_type_annotation()?;
        if is_rest {
            pat = Pattern::new(PatternKind::Rest(Box::new(pat)), self.span_from(start));
        } else if self.eat(&TokenKind::Eq) {
            let default = self.with_no_in(false, |p| p.parse_assignment())?;
            pat = Pattern::new(
                PatternKind::Assign {
                    left: Box::new(pat),
                    right: Box::new(default),
                },
                self.span_from(start),
            );
        }
        Some(Param {
            pat,
            type_ann,
            optional,
            span: self.span_from(start),
        })
    }

    /// `constructor(private x: number)`: a modifier followed by a binding.
    fn is_parameter_property(&self) -> bool {
        let is_modifier = matches!(
            self.peek_kind(),
            TokenKind::Ident(name)
                if ACCESSIBILITY_MODIFIERS.contains(&name.as_str())
                    || name == "readonly"
                    || name == "override"
        );
        is_modifier
            && matches!(
                self.look_ahead(1).kind,
                TokenKind::Ident(_) | TokenKind::LBrace | TokenKind::LBracket
            )
    }

    /// `: Type` when parsing TypeScript.
    pub(crate) fn parse_optional_type_annotation(&mut self) -> Option<Option<TsType>> {
        if self.typescript && self.eat(&TokenKind::Colon) {
            Some(Some(self.parse_type()?))
        } else {
            Some(None)
        }
    }

    /// `<T, U extends X = Y>` when parsing TypeScript.
    pub(crate) fn parse_optional_type_params(&mut self) -> Option<Vec<TsTypeParam>> {
        if self.typescript && self.check_exact(&TokenKind::Lt) {
            self.parse_type_params()
        } else {
            Some(Vec::new())
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Classes
    // ══════════════════════════════════════════════════════════════════════════

    /// `class [Name] [<T>] [extends Base] [implements I] { members }`
    pub(crate) fn parse_class(&mut self, start: Span, require_name: bool) -> Option<Class> {
        self.expect(&TokenKind::Class)?;
        let id = match self.peek_kind() {
            TokenKind::Ident(name) if name != "implements" => Some(self.expect_identifier()?),
            _ if require_name => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected class name, got '{}'", self.peek_kind()),
                );
                return None;
            }
            _ => None,
        };
        let type_params = self.parse_optional_type_params()?;
        let super_class = if self.eat(&TokenKind::Extends) {
            let base = self.parse_call_member(true)?;
            if self.typescript && self.check_exact(&TokenKind::Lt) {
                self.parse_type_args()?;
            }
            Some(Box::new(base))
        } else {
            None
        };
        let mut implements = Vec::new();
        if self.typescript && self.eat_ident("implements") {
            loop {
                implements.push(self.parse_type()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_class_member()?);
        }
        self.expect(&TokenKind::RBrace)?;

        Some(Class {
            id,
            super_class,
            members,
            type_params,
            implements,
            span: self.span_from(start),
        })
    }

    /// The token after the current one can still start a member name, so the
    /// current word is a modifier rather than the name itself.
    fn modifier_applies(&self) -> bool {
        let next = self.look_ahead(1);
        match &next.kind {
            TokenKind::LParen
            | TokenKind::Eq
            | TokenKind::Semicolon
            | TokenKind::Colon
            | TokenKind::Question
            | TokenKind::Bang
            | TokenKind::RBrace
            | TokenKind::Lt
            | TokenKind::Comma
            | TokenKind::Eof => false,
            _ => !next.had_line_break || next.kind == TokenKind::LBrace,
        }
    }

    fn parse_class_member(&mut self) -> Option<ClassMember> {
        let start = self.current_span();

        if self.check_ident("static") && self.look_ahead(1).kind == TokenKind::LBrace {
            self.advance();
            let ctx = self.fn_context();
            self.in_function = true;
            self.in_async = false;
            self.in_generator = false;
            let block = self.parse_block();
            self.restore_fn_context(ctx);
            return Some(ClassMember {
                kind: ClassMemberKind::StaticBlock(block?),
                span: self.span_from(start),
            });
        }

        let mut accessibility = None;
        let mut is_static = false;
        let mut readonly = false;
        let mut declare = false;
        let mut is_abstract = false;
        loop {
            let modifier = match self.peek_kind() {
                TokenKind::Ident(name) if MEMBER_MODIFIERS.contains(&name.as_str()) => name.clone(),
                _ => break,
            };
            if (!self.typescript && modifier != "static") || !self.modifier_applies() {
                break;
            }
            self.advance();
            match modifier.as_str() {
                "public" => accessibility = Some(Accessibility::Public),
                "private" => accessibility = Some(Accessibility::Private),
                "protected" => accessibility = Some(Accessibility::Protected),
                "static" => is_static = true,
                "readonly" => readonly = true,
                "declare" => declare = true,
                "abstract" => is_abstract = true,
                _ => {}
            }
        }

        let is_async = self.check_ident("async") && self.modifier_applies();
        if is_async {
            self.advance();
        }
        let is_generator = self.eat(&TokenKind::Star);
        let accessor = if (self.check_ident("get") || self.check_ident("set"))
            && self.modifier_applies()
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

        let key = self.parse_prop_key(true)?;
        let optional = self.typescript && self.eat(&TokenKind::Question);
        if self.typescript {
            // Definite assignment `x!: T` carries no runtime meaning.
            self.eat(&TokenKind::Bang);
        }

        if self.check_exact(&TokenKind::LParen) || self.check_exact(&TokenKind::Lt) {
            let is_constructor = !is_static
                && matches!(key.static_name().as_deref(), Some("constructor"))
                && !matches!(key, PropKey::Computed(_));
            let kind = accessor.unwrap_or(if is_constructor {
                MethodKind::Constructor
            } else {
                MethodKind::Method
            });
            let allow_no_body = self.typescript;
            let function =
                self.parse_function_rest(start, None, is_async, is_generator, allow_no_body)?;
            return Some(ClassMember {
                kind: ClassMemberKind::Method {
                    key,
                    function: Box::new(function),
                    kind,
                    is_static,
                    accessibility,
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

        let type_ann = self.parse_optional_type_annotation()?;
        let value = if self.eat(&TokenKind::Eq) {
            let ctx = self.fn_context();
            self.in_function = true;
            self.in_async = false;
            self.in_generator = false;
            self.no_in = false;
            let value = self.parse_assignment();
            self.restore_fn_context(ctx);
            Some(value?)
        } else {
            None
        };
        self.consume_semicolon()?;
        Some(ClassMember {
            kind: ClassMemberKind::Property {
                key,
                value,
                is_static,
                type_ann,
                accessibility,
                readonly,
                optional,
                declare: declare || is_abstract,
            },
            span: self.span_from(start),
        })
    }

    /// Object and class member names.
    pub(crate) fn parse_prop_key(&mut self, allow_private: bool) -> Option<PropKey> {
        match self.peek_kind().clone() {
            TokenKind::Str { value, raw } => {
                let span = self.advance().span;
                Some(PropKey::Str(StrLit {
                    value,
                    raw: Some(raw),
                    span,
                }))
            }
            TokenKind::Num { value, raw } => {
                self.advance();
                Some(PropKey::Num {
                    value,
                    raw: Some(raw),
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.with_no_in(false, |p| p.parse_assignment())?;
                self.expect(&TokenKind::RBracket)?;
                Some(PropKey::Computed(Box::new(expr)))
            }
            TokenKind::PrivateName(name) if allow_private => {
                let span = self.advance().span;
                Some(PropKey::PrivateName(Ident::new(name, span)))
            }
            _ => Some(PropKey::Ident(self.expect_identifier_name()?)),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Modules
    // ══════════════════════════════════════════════════════════════════════════

    fn report_module_syntax_in_script(&mut self, span: Span) {
        if self.dialect == ProgramKind::Script {
            self.error_at(
                ErrorCode::MODULE_SYNTAX_IN_SCRIPT,
                "import and export declarations may only appear in modules",
                span,
            );
        }
    }

    /// `import ...`. Reported (but still parsed) in script dialect.
    pub(crate) fn parse_import(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        self.report_module_syntax_in_script(start);

        let type_only = self.typescript
            && self.check_ident("type")
            && match &self.look_ahead(1).kind {
                TokenKind::LBrace | TokenKind::Star => true,
                TokenKind::Ident(name) => {
                    !(name == "from" && matches!(self.look_ahead(2).kind, TokenKind::Str { .. }))
                }
                _ => false,
            };
        if type_only {
            self.advance();
        }

        let mut specifiers = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::Str { .. }) {
            if matches!(self.peek_kind(), TokenKind::Ident(_)) {
                let local = self.expect_identifier()?;
                if self.typescript && self.check_exact(&TokenKind::Eq) {
                    self.error_at_current(
                        ErrorCode::UNSUPPORTED_SYNTAX,
                        "'import = require()' is not supported",
                    );
                    return None;
                }
                specifiers.push(ImportSpecifier::Default(local));
                if !self.eat(&TokenKind::Comma) {
                    return self.finish_import(start, specifiers, type_only);
                }
            }
            if self.eat(&TokenKind::Star) {
                if !self.eat_ident("as") {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected 'as', got '{}'", self.peek_kind()),
                    );
                    return None;
                }
                specifiers.push(ImportSpecifier::Namespace(self.expect_identifier()?));
            } else {
                self.expect(&TokenKind::LBrace)?;
                while !self.check_exact(&TokenKind::RBrace) {
                    specifiers.push(self.parse_import_specifier()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace)?;
            }
            return self.finish_import(start, specifiers, type_only);
        }

        let source = self.expect_module_source()?;
        self.skip_import_attributes();
        self.consume_semicolon()?;
        Some(Stmt::new(
            StmtKind::Import(ImportDecl {
                specifiers,
                source,
                type_only,
            }),
            self.span_from(start),
        ))
    }

    fn finish_import(
        &mut self,
        start: Span,
        specifiers: Vec<ImportSpecifier>,
        type_only: bool,
    ) -> Option<Stmt> {
        if !self.eat_ident("from") {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected 'from', got '{}'", self.peek_kind()),
            );
            return None;
        }
        let source = self.expect_module_source()?;
        self.skip_import_attributes();
        self.consume_semicolon()?;
        Some(Stmt::new(
            StmtKind::Import(ImportDecl {
                specifiers,
                source,
                type_only,
            }),
            self.span_from(start),
        ))
    }

    /// `name`, `name as local`, `type name` inside `import { ... }`.
    fn parse_import_specifier(&mut self) -> Option<ImportSpecifier> {
        let type_only = self.eat_type_modifier();
        let imported = self.expect_identifier_name()?;
        if self.eat_ident("as") {
            let local = self.expect_identifier()?;
            Some(ImportSpecifier::Named {
                imported: Some(imported),
                local,
                type_only,
            })
        } else {
            if TokenKind::from_keyword(&imported.name).is_some() {
                self.error_at(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("'{}' cannot be used as a local binding", imported.name),
                    imported.span,
                );
                return None;
            }
            Some(ImportSpecifier::Named {
                imported: None,
                local: imported,
                type_only,
            })
        }
    }

    /// TypeScript inline `type` modifier on an import/export specifier.
    fn eat_type_modifier(&mut self) -> bool {
        if self.typescript
            && self.check_ident("type")
            && self.look_ahead(1).kind.is_identifier_name()
            && !matches!(&self.look_ahead(1).kind, TokenKind::Ident(n) if n == "as")
        {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_module_source(&mut self) -> Option<StrLit> {
        match self.peek_kind().clone() {
            TokenKind::Str { value, raw } => {
                let span = self.advance().span;
                Some(StrLit {
                    value,
                    raw: Some(raw),
                    span,
                })
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected module specifier string, got '{other}'"),
                );
                None
            }
        }
    }

    /// `with { type: "json" }` import attributes are accepted and dropped.
    fn skip_import_attributes(&mut self) {
        if (self.check_exact(&TokenKind::With) || self.check_ident("assert"))
            && !self.at_line_break()
            && self.look_ahead(1).kind == TokenKind::LBrace
        {
            self.advance();
            if let Some(len) = self.after_matching_bracket(0) {
                for _ in 0..len {
                    self.advance();
                }
            }
        }
    }

    /// `export ...`. Reported (but still parsed) in script dialect.
    pub(crate) fn parse_export(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        self.report_module_syntax_in_script(start);

        let decl = match self.peek_kind().clone() {
            TokenKind::Default => {
                self.advance();
                ExportDecl::Default(self.parse_export_default()?)
            }
            TokenKind::Star => {
                self.advance();
                let exported = if self.eat_ident("as") {
                    Some(self.expect_identifier_name()?)
                } else {
                    None
                };
                if !self.eat_ident("from") {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected 'from', got '{}'", self.peek_kind()),
                    );
                    return None;
                }
                let source = self.expect_module_source()?;
                self.skip_import_attributes();
                self.consume_semicolon()?;
                ExportDecl::All { exported, source }
            }
            TokenKind::LBrace => self.parse_export_named(false)?,
            TokenKind::Ident(name)
                if self.typescript
                    && name == "type"
                    && self.look_ahead(1).kind == TokenKind::LBrace =>
            {
                self.advance();
                self.parse_export_named(true)?
            }
            TokenKind::Eq if self.typescript => {
                self.error_at_current(ErrorCode::UNSUPPORTED_SYNTAX, "'export =' is not supported");
                return None;
            }
            TokenKind::Ident(name) if self.typescript && name == "as" => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "'export as namespace' is not supported",
                );
                return None;
            }
            _ => {
                let stmt = self.parse_statement()?;
                let is_declaration = matches!(
                    stmt.kind,
                    StmtKind::Var(_)
                        | StmtKind::Function(_)
                        | StmtKind::Class(_)
                        | StmtKind::TsInterface(_)
                        | StmtKind::TsTypeAlias(_)
                        | StmtKind::TsEnum(_)
                        | StmtKind::TsDeclare(_)
                );
                if !is_declaration {
                    self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "expected a declaration after 'export'",
                        stmt.span,
                    );
                    return None;
                }
                ExportDecl::Decl(Box::new(stmt))
            }
        };
        Some(Stmt::new(StmtKind::Export(decl), self.span_from(start)))
    }

    fn parse_export_default(&mut self) -> Option<DefaultExport> {
        let start = self.current_span();
        let next = self.look_ahead(1).clone();
        match self.peek_kind() {
            TokenKind::Function => {
                let function = self.parse_function(start, false, false)?;
                Some(DefaultExport::Function(Box::new(function)))
            }
            TokenKind::Ident(name)
                if name == "async"
                    && next.kind == TokenKind::Function
                    && !next.had_line_break =>
            {
                self.advance();
                let function = self.parse_function(start, true, false)?;
                Some(DefaultExport::Function(Box::new(function)))
            }
            TokenKind::Class => {
                let class = self.parse_class(start, false)?;
                Some(DefaultExport::Class(Box::new(class)))
            }
            TokenKind::Ident(name)
                if self.typescript && name == "abstract" && next.kind == TokenKind::Class =>
            {
                self.advance();
                let class = self.parse_class(start, false)?;
                Some(DefaultExport::Class(Box::new(class)))
            }
            _ => {
                let expr = self.with_no_in(false, |p| p.parse_assignment())?;
                self.consume_semicolon()?;
                Some(DefaultExport::Expr(Box::new(expr)))
            }
        }
    }

    /// `{ a, b as c } [from "m"];`
    fn parse_export_named(&mut self, type_only: bool) -> Option<ExportDecl> {
        self.expect(&TokenKind::LBrace)?;
        let mut specifiers = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            let spec_start = self.current_span();
            let spec_type_only = self.eat_type_modifier();
            let local = self.expect_identifier_name()?;
            let exported = if self.eat_ident("as") {
                Some(self.expect_identifier_name()?)
            } else {
                None
            };
            specifiers.push(ExportSpecifier {
                local,
                exported,
                type_only: spec_type_only,
                span: self.span_from(spec_start),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let source = if self.eat_ident("from") {
            let source = self.expect_module_source()?;
            self.skip_import_attributes();
            Some(source)
        } else {
            None
        };
        self.consume_semicolon()?;
        Some(ExportDecl::Named {
            specifiers,
            source,
            type_only,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // TypeScript Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// `interface Name<T> extends A, B { members }`
    pub(crate) fn parse_interface(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        let id = self.expect_identifier()?;
        let type_params = self.parse_optional_type_params()?;
        let mut extends = Vec::new();
        if self.eat(&TokenKind::Extends) {
            loop {
                extends.push(self.parse_type()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let body = self.parse_type_members()?;
        Some(Stmt::new(
            StmtKind::TsInterface(TsInterfaceDecl {
                id,
                type_params,
                extends,
                body,
            }),
            self.span_from(start),
        ))
    }

    /// `type Name<T> = Type;`
    pub(crate) fn parse_type_alias(&mut self, start: Span) -> Option<Stmt> {
        self.advance();
        let id = self.expect_identifier()?;
        let type_params = self.parse_optional_type_params()?;
        self.expect(&TokenKind::Eq)?;
        let ty = self.parse_type()?;
        self.consume_semicolon()?;
        Some(Stmt::new(
            StmtKind::TsTypeAlias(TsTypeAliasDecl {
                id,
                type_params,
                ty,
            }),
            self.span_from(start),
        ))
    }

    /// `[const] enum Name { A, B = 2, "c" = "c" }`. The current token is `enum`.
    pub(crate) fn parse_enum(&mut self, start: Span, is_const: bool) -> Option<Stmt> {
        self.expect(&TokenKind::Enum)?;
        let id = self.expect_identifier()?;
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            let member_start = self.current_span();
            let name = match self.peek_kind().clone() {
                TokenKind::Str { value, raw } => {
                    let span = self.advance().span;
                    PropKey::Str(StrLit {
                        value,
                        raw: Some(raw),
                        span,
                    })
                }
                _ => PropKey::Ident(self.expect_identifier_name()?),
            };
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.with_no_in(false, |p| p.parse_assignment())?)
            } else {
                None
            };
            members.push(TsEnumMember {
                name,
                init,
                span: self.span_from(member_start),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(Stmt::new(
            StmtKind::TsEnum(TsEnumDecl {
                id,
                members,
                is_const,
            }),
            self.span_from(start),
        ))
    }
}

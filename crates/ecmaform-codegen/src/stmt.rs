//! Statement, declaration and module-item emission.

use ecmaform_types::ast::*;

use crate::emitter::Emitter;
use crate::error::{EmitError, EmitResult};
use crate::expr::{quote_str, PREC_ASSIGN, PREC_NEW, PREC_SEQUENCE};

impl Emitter<'_> {
    pub(crate) fn emit_stmt(&mut self, stmt: &Stmt) -> EmitResult<()> {
        self.mark(stmt.span, None);
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.stmt_start = Some(self.out.len());
                self.emit_expr(expr, PREC_SEQUENCE)?;
                self.write(";");
            }
            StmtKind::Var(decl) => {
                self.emit_var_decl(decl)?;
                self.write(";");
            }
            StmtKind::Function(function) => self.emit_function(function)?,
            StmtKind::Class(class) => self.emit_class(class)?,
            StmtKind::Block(block) => self.emit_block(block)?,
            StmtKind::Empty => self.write(";"),
            StmtKind::If { test, cons, alt } => self.emit_if(test, cons, alt.as_deref())?,
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.word("for");
                self.space();
                self.write("(");
                match init {
                    Some(ForInit::Var(decl)) => {
                        self.no_in = true;
                        let result = self.emit_var_decl(decl);
                        self.no_in = false;
                        result?;
                    }
                    Some(ForInit::Expr(expr)) => {
                        self.no_in = true;
                        let result = self.emit_expr(expr, PREC_SEQUENCE);
                        self.no_in = false;
                        result?;
                    }
                    None => {}
                }
                self.write(";");
                if let Some(test) = test {
                    self.space();
                    self.emit_expr(test, PREC_SEQUENCE)?;
                }
                self.write(";");
                if let Some(update) = update {
                    self.space();
                    self.emit_expr(update, PREC_SEQUENCE)?;
                }
                self.write(")");
                self.emit_body(body)?;
            }
            StmtKind::ForIn { left, right, body } => {
                self.word("for");
                self.space();
                self.write("(");
                self.emit_for_head(left)?;
                self.space();
                self.word("in");
                self.space();
                self.emit_expr(right, PREC_SEQUENCE)?;
                self.write(")");
                self.emit_body(body)?;
            }
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            } => {
                self.word("for");
                if *is_await {
                    self.word("await");
                }
                self.space();
                self.write("(");
                self.emit_for_head(left)?;
                self.space();
                self.word("of");
                self.space();
                self.emit_expr(right, PREC_ASSIGN)?;
                self.write(")");
                self.emit_body(body)?;
            }
            StmtKind::While { test, body } => {
                self.word("while");
                self.space();
                self.write("(");
                self.emit_expr(test, PREC_SEQUENCE)?;
                self.write(")");
                self.emit_body(body)?;
            }
            StmtKind::DoWhile { body, test } => {
                self.word("do");
                self.emit_body(body)?;
                if matches!(body.kind, StmtKind::Block(_)) {
                    self.space();
                } else {
                    self.newline();
                }
                self.word("while");
                self.space();
                self.write("(");
                self.emit_expr(test, PREC_SEQUENCE)?;
                self.write(");");
            }
            StmtKind::Return(arg) => {
                self.word("return");
                if let Some(arg) = arg {
                    self.space();
                    self.emit_expr(arg, PREC_SEQUENCE)?;
                }
                self.write(";");
            }
            StmtKind::Break(label) | StmtKind::Continue(label) => {
                let keyword = if matches!(stmt.kind, StmtKind::Break(_)) {
                    "break"
                } else {
                    "continue"
                };
                self.word(keyword);
                if let Some(label) = label {
                    self.space();
                    self.word(&label.name);
                }
                self.write(";");
            }
            StmtKind::Throw(arg) => {
                self.word("throw");
                self.space();
                self.emit_expr(arg, PREC_SEQUENCE)?;
                self.write(";");
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.word("try");
                self.space();
                self.emit_block(block)?;
                if let Some(handler) = handler {
                    self.space();
                    self.word("catch");
                    self.space();
                    if let Some(param) = &handler.param {
                        self.write("(");
                        self.emit_pattern(param)?;
                        self.write(")");
                        self.space();
                    }
                    self.emit_block(&handler.body)?;
                }
                if let Some(finalizer) = finalizer {
                    self.space();
                    self.word("finally");
                    self.space();
                    self.emit_block(finalizer)?;
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => self.emit_switch(discriminant, cases)?,
            StmtKind::Labeled { label, body } => {
                self.word(&label.name);
                self.write(":");
                self.space();
                self.emit_stmt(body)?;
            }
            StmtKind::Debugger => {
                self.word("debugger");
                self.write(";");
            }
            StmtKind::Import(decl) => self.emit_import(decl, stmt.span)?,
            StmtKind::Export(decl) => self.emit_export(decl, stmt.span)?,
            StmtKind::TsInterface(_)
            | StmtKind::TsTypeAlias(_)
            | StmtKind::TsEnum(_)
            | StmtKind::TsDeclare(_) => {
                return Err(EmitError::UnexpectedNode {
                    what: "TypeScript declaration",
                    span: stmt.span,
                })
            }
        }
        Ok(())
    }

    pub(crate) fn emit_block(&mut self, block: &Block) -> EmitResult<()> {
        self.emit_stmt_list(&block.stmts)
    }

    fn emit_stmt_list(&mut self, stmts: &[Stmt]) -> EmitResult<()> {
        if stmts.is_empty() {
            self.write("{}");
            return Ok(());
        }
        self.write("{");
        self.indent();
        for stmt in stmts {
            self.newline();
            self.emit_stmt(stmt)?;
        }
        self.dedent();
        self.newline();
        self.write("}");
        Ok(())
    }

    /// The body of a control statement, on the same line as its head.
    fn emit_body(&mut self, body: &Stmt) -> EmitResult<()> {
        match &body.kind {
            StmtKind::Empty => {
                self.write(";");
                Ok(())
            }
            _ => {
                self.space();
                self.emit_stmt(body)
            }
        }
    }

    fn emit_if(&mut self, test: &Expr, cons: &Stmt, alt: Option<&Stmt>) -> EmitResult<()> {
        self.word("if");
        self.space();
        self.write("(");
        self.emit_expr(test, PREC_SEQUENCE)?;
        self.write(")");
        // `if (a) if (b) x; else y;` would rebind the else.
        let braced = alt.is_some() && ends_with_open_if(cons);
        if braced {
            self.space();
            self.write("{");
            self.indent();
            self.newline();
            self.emit_stmt(cons)?;
            self.dedent();
            self.newline();
            self.write("}");
        } else {
            self.emit_body(cons)?;
        }
        let Some(alt) = alt else {
            return Ok(());
        };
        if braced || matches!(cons.kind, StmtKind::Block(_)) {
            self.space();
        } else {
            self.newline();
        }
        self.word("else");
        match &alt.kind {
            StmtKind::If { .. } => {
                self.write(" ");
                self.emit_stmt(alt)
            }
            _ => self.emit_body(alt),
        }
    }

    fn emit_switch(&mut self, discriminant: &Expr, cases: &[SwitchCase]) -> EmitResult<()> {
        self.word("switch");
        self.space();
        self.write("(");
        self.emit_expr(discriminant, PREC_SEQUENCE)?;
        self.write(")");
        self.space();
        if cases.is_empty() {
            self.write("{}");
            return Ok(());
        }
        self.write("{");
        self.indent();
        for case in cases {
            self.newline();
            self.mark(case.span, None);
            match &case.test {
                Some(test) => {
                    self.word("case");
                    self.space();
                    self.emit_expr(test, PREC_SEQUENCE)?;
                }
                None => self.word("default"),
            }
            self.write(":");
            self.indent();
            for stmt in &case.body {
                self.newline();
                self.emit_stmt(stmt)?;
            }
            self.dedent();
        }
        self.dedent();
        self.newline();
        self.write("}");
        Ok(())
    }

    pub(crate) fn emit_var_decl(&mut self, decl: &VarDecl) -> EmitResult<()> {
        self.word(decl.kind.as_str());
        self.space();
        for (i, declarator) in decl.decls.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.emit_pattern(&declarator.name)?;
            if let Some(init) = &declarator.init {
                self.space();
                self.op("=");
                self.space();
                self.emit_expr(init, PREC_ASSIGN)?;
            }
        }
        Ok(())
    }

    fn emit_for_head(&mut self, head: &ForHead) -> EmitResult<()> {
        match head {
            ForHead::Var(decl) => self.emit_var_decl(decl),
            ForHead::Pattern(pattern) => self.emit_pattern(pattern),
        }
    }

    // ── Functions & classes ──────────────────────────────────────────────

    pub(crate) fn emit_function(&mut self, function: &Function) -> EmitResult<()> {
        if function.is_async {
            self.word("async");
            self.space();
        }
        self.word("function");
        if function.is_generator {
            self.write("*");
        }
        if let Some(id) = &function.id {
            self.space();
            self.word(&id.name);
        }
        self.emit_function_rest(function)
    }

    /// Parameters and body, shared by declarations and methods.
    pub(crate) fn emit_function_rest(&mut self, function: &Function) -> EmitResult<()> {
        self.emit_params(&function.params)?;
        self.space();
        match &function.body {
            Some(body) => self.emit_block(body),
            None => Err(EmitError::UnexpectedNode {
                what: "function signature without a body",
                span: function.span,
            }),
        }
    }

    pub(crate) fn emit_params(&mut self, params: &[Param]) -> EmitResult<()> {
        self.write("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.emit_pattern(&param.pat)?;
        }
        self.write(")");
        Ok(())
    }

    pub(crate) fn emit_class(&mut self, class: &Class) -> EmitResult<()> {
        self.word("class");
        if let Some(id) = &class.id {
            self.space();
            self.word(&id.name);
        }
        if let Some(super_class) = &class.super_class {
            self.space();
            self.word("extends");
            self.space();
            self.emit_expr(super_class, PREC_NEW)?;
        }
        self.space();
        if class.members.is_empty() {
            self.write("{}");
            return Ok(());
        }
        self.write("{");
        self.indent();
        for member in &class.members {
            self.newline();
            self.mark(member.span, None);
            match &member.kind {
                ClassMemberKind::Method {
                    key,
                    function,
                    kind,
                    is_static,
                    ..
                } => self.emit_method(key, function, *kind, *is_static)?,
                ClassMemberKind::Property {
                    key,
                    value,
                    is_static,
                    ..
                } => {
                    if *is_static {
                        self.word("static");
                        self.space();
                    }
                    self.emit_prop_key(key)?;
                    if let Some(value) = value {
                        self.space();
                        self.op("=");
                        self.space();
                        self.emit_expr(value, PREC_ASSIGN)?;
                    }
                    self.write(";");
                }
                ClassMemberKind::StaticBlock(block) => {
                    self.word("static");
                    self.space();
                    self.emit_block(block)?;
                }
            }
        }
        self.dedent();
        self.newline();
        self.write("}");
        Ok(())
    }

    /// A class or object-literal method.
    pub(crate) fn emit_method(
        &mut self,
        key: &PropKey,
        function: &Function,
        kind: MethodKind,
        is_static: bool,
    ) -> EmitResult<()> {
        if is_static {
            self.word("static");
            self.space();
        }
        match kind {
            MethodKind::Getter => {
                self.word("get");
                self.space();
            }
            MethodKind::Setter => {
                self.word("set");
                self.space();
            }
            MethodKind::Method | MethodKind::Constructor => {
                if function.is_async {
                    self.word("async");
                    self.space();
                }
                if function.is_generator {
                    self.write("*");
                }
            }
        }
        self.emit_prop_key(key)?;
        self.emit_function_rest(function)
    }

    // ── Modules ──────────────────────────────────────────────────────────

    fn emit_import(&mut self, decl: &ImportDecl, span: ecmaform_types::Span) -> EmitResult<()> {
        if decl.type_only {
            return Err(EmitError::UnexpectedNode {
                what: "type-only import",
                span,
            });
        }
        self.word("import");
        self.space();
        if decl.specifiers.is_empty() {
            self.emit_module_source(&decl.source);
            self.write(";");
            return Ok(());
        }
        let mut named = Vec::new();
        let mut first = true;
        for specifier in &decl.specifiers {
            match specifier {
                ImportSpecifier::Default(local) => {
                    if !first {
                        self.comma();
                    }
                    self.word(&local.name);
                    first = false;
                }
                ImportSpecifier::Namespace(local) => {
                    if !first {
                        self.comma();
                    }
                    self.write("*");
                    self.space();
                    self.word("as");
                    self.space();
                    self.word(&local.name);
                    first = false;
                }
                ImportSpecifier::Named {
                    imported,
                    local,
                    type_only,
                } => {
                    if *type_only {
                        return Err(EmitError::UnexpectedNode {
                            what: "type-only import specifier",
                            span: local.span,
                        });
                    }
                    named.push((imported.as_ref(), local));
                }
            }
        }
        if !named.is_empty() {
            if !first {
                self.comma();
            }
            self.write("{");
            self.space();
            for (i, (imported, local)) in named.into_iter().enumerate() {
                if i > 0 {
                    self.comma();
                }
                match imported {
                    Some(imported) if imported.name != local.name => {
                        self.word(&imported.name);
                        self.space();
                        self.word("as");
                        self.space();
                        self.word(&local.name);
                    }
                    _ => self.word(&local.name),
                }
            }
            self.space();
            self.write("}");
        }
        self.space();
        self.word("from");
        self.space();
        self.emit_module_source(&decl.source);
        self.write(";");
        Ok(())
    }

    fn emit_export(&mut self, decl: &ExportDecl, span: ecmaform_types::Span) -> EmitResult<()> {
        self.word("export");
        self.space();
        match decl {
            ExportDecl::Decl(inner) => self.emit_stmt(inner),
            ExportDecl::Default(default) => {
                self.word("default");
                self.space();
                match default {
                    DefaultExport::Expr(expr) => {
                        self.stmt_start = Some(self.out.len());
                        self.emit_expr(expr, PREC_ASSIGN)?;
                        self.write(";");
                        Ok(())
                    }
                    DefaultExport::Function(function) => self.emit_function(function),
                    DefaultExport::Class(class) => self.emit_class(class),
                }
            }
            ExportDecl::Named {
                specifiers,
                source,
                type_only,
            } => {
                if *type_only || specifiers.iter().any(|s| s.type_only) {
                    return Err(EmitError::UnexpectedNode {
                        what: "type-only export",
                        span,
                    });
                }
                if specifiers.is_empty() {
                    self.write("{}");
                } else {
                    self.write("{");
                    self.space();
                    for (i, specifier) in specifiers.iter().enumerate() {
                        if i > 0 {
                            self.comma();
                        }
                        self.word(&specifier.local.name);
                        if let Some(exported) = &specifier.exported {
                            if exported.name != specifier.local.name {
                                self.space();
                                self.word("as");
                                self.space();
                                self.word(&exported.name);
                            }
                        }
                    }
                    self.space();
                    self.write("}");
                }
                if let Some(source) = source {
                    self.space();
                    self.word("from");
                    self.space();
                    self.emit_module_source(source);
                }
                self.write(";");
                Ok(())
            }
            ExportDecl::All { exported, source } => {
                self.write("*");
                if let Some(exported) = exported {
                    self.space();
                    self.word("as");
                    self.space();
                    self.word(&exported.name);
                }
                self.space();
                self.word("from");
                self.space();
                self.emit_module_source(source);
                self.write(";");
                Ok(())
            }
        }
    }

    fn emit_module_source(&mut self, source: &StrLit) {
        match &source.raw {
            Some(raw) => self.write(raw),
            None => self.write(&quote_str(&source.value)),
        }
    }
}

/// Whether a statement ends in an `if` without `else` that a following
/// `else` would attach to.
fn ends_with_open_if(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::If { alt: None, .. } => true,
        StmtKind::If { alt: Some(alt), .. } => ends_with_open_if(alt),
        StmtKind::For { body, .. }
        | StmtKind::ForIn { body, .. }
        | StmtKind::ForOf { body, .. }
        | StmtKind::While { body, .. }
        | StmtKind::Labeled { body, .. } => ends_with_open_if(body),
        _ => false,
    }
}

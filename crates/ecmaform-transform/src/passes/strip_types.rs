//! TypeScript removal.
//!
//! Annotations, type parameters, interfaces, type aliases, ambient
//! declarations, overload signatures and `as`/`satisfies`/`!` wrappers are
//! dropped. Imports whose bindings are never used as values are elided, the
//! same way `tsc` does. Enums become a `var` plus an initializer IIFE:
//!
//! ```text
//! enum E { A, B = "b" }
//! // =>
//! var E;
//! (function(E) {
//!     E[E["A"] = 0] = "A";
//!     E["B"] = "b";
//! })(E || (E = {}));
//! ```

use std::collections::HashSet;

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::Span;

use crate::error::{PassResult, TransformWarning};
use crate::pass::Pass;

pub struct StripTypes;

impl Pass for StripTypes {
    fn name(&self) -> &'static str {
        "strip_types"
    }

    fn run(&self, mut program: Program, _warnings: &mut Vec<TransformWarning>) -> PassResult<Program> {
        let type_names = declared_type_names(&program.body);
        Stripper.visit_program(&mut program);

        let mut usage = ValueUsage::default();
        usage.visit_program(&mut program);
        elide_type_only_bindings(&mut program.body, &usage.names, &type_names);
        Ok(program)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Stripping
// ══════════════════════════════════════════════════════════════════════════════

struct Stripper;

impl Stripper {
    /// Rewrite one statement into zero or more statements.
    fn strip_stmt(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        let span = stmt.span;
        match stmt.kind {
            StmtKind::TsInterface(_) | StmtKind::TsTypeAlias(_) | StmtKind::TsDeclare(_) => {}
            StmtKind::Function(function) if function.body.is_none() => {}
            StmtKind::TsEnum(decl) => out.extend(lower_enum(decl, span, None)),
            StmtKind::Import(import) if import.type_only => {}
            StmtKind::Export(ExportDecl::Named {
                type_only: true, ..
            }) => {}
            StmtKind::Export(ExportDecl::Decl(decl)) => {
                let Stmt {
                    kind,
                    span: decl_span,
                } = *decl;
                match kind {
                    StmtKind::TsInterface(_)
                    | StmtKind::TsTypeAlias(_)
                    | StmtKind::TsDeclare(_) => {}
                    StmtKind::Function(function) if function.body.is_none() => {}
                    StmtKind::TsEnum(decl) => out.extend(lower_enum(decl, span, Some(span))),
                    kind => out.push(Stmt::new(
                        StmtKind::Export(ExportDecl::Decl(Box::new(Stmt::new(kind, decl_span)))),
                        span,
                    )),
                }
            }
            StmtKind::Export(ExportDecl::Default(DefaultExport::Function(function)))
                if function.body.is_none() => {}
            kind => out.push(Stmt::new(kind, span)),
        }
    }

    fn strip_params(&mut self, params: &mut Vec<Param>) {
        params.retain(|p| p.pat.as_ident() != Some("this"));
        for param in params.iter_mut() {
            param.type_ann = None;
            param.optional = false;
        }
    }
}

impl VisitMut for Stripper {
    fn visit_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in std::mem::take(stmts) {
            self.strip_stmt(stmt, &mut out);
        }
        *stmts = out;
        visit::walk_stmts(self, stmts);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        // Single-statement bodies (`if (x) enum E {}`) cannot expand in
        // place; wrap them in a block first.
        if needs_stripping(stmt) {
            let span = stmt.span;
            let inner = std::mem::replace(stmt, Stmt::new(StmtKind::Empty, span));
            let mut out = Vec::new();
            self.strip_stmt(inner, &mut out);
            *stmt = match out.len() {
                0 => Stmt::new(StmtKind::Empty, span),
                1 => out.remove(0),
                _ => Stmt::new(StmtKind::Block(Block { stmts: out, span }), span),
            };
        }
        visit::walk_stmt(self, stmt);
    }

    fn visit_var_decl(&mut self, decl: &mut VarDecl) {
        for declarator in &mut decl.decls {
            declarator.type_ann = None;
            declarator.definite = false;
        }
        visit::walk_var_decl(self, decl);
    }

    fn visit_function(&mut self, function: &mut Function) {
        function.type_params.clear();
        function.return_type = None;
        self.strip_params(&mut function.params);
        visit::walk_function(self, function);
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        arrow.type_params.clear();
        arrow.return_type = None;
        self.strip_params(&mut arrow.params);
        visit::walk_arrow(self, arrow);
    }

    fn visit_class(&mut self, class: &mut Class) {
        class.type_params.clear();
        class.implements.clear();
        class.members.retain(|member| match &member.kind {
            ClassMemberKind::Method { function, .. } => function.body.is_some(),
            ClassMemberKind::Property { declare, .. } => !declare,
            ClassMemberKind::StaticBlock(_) => true,
        });
        for member in &mut class.members {
            match &mut member.kind {
                ClassMemberKind::Method { accessibility, .. } => *accessibility = None,
                ClassMemberKind::Property {
                    type_ann,
                    accessibility,
                    readonly,
                    optional,
                    ..
                } => {
                    *type_ann = None;
                    *accessibility = None;
                    *readonly = false;
                    *optional = false;
                }
                ClassMemberKind::StaticBlock(_) => {}
            }
        }
        visit::walk_class(self, class);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        loop {
            let inner = match &mut expr.kind {
                ExprKind::TsAs { expr: inner, .. }
                | ExprKind::TsSatisfies { expr: inner, .. }
                | ExprKind::TsNonNull(inner) => std::mem::take(&mut **inner),
                _ => break,
            };
            *expr = inner;
        }
        match &mut expr.kind {
            ExprKind::Call { type_args, .. } | ExprKind::New { type_args, .. } => {
                type_args.clear();
            }
            _ => {}
        }
        visit::walk_expr(self, expr);
    }
}

fn needs_stripping(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::TsInterface(_)
        | StmtKind::TsTypeAlias(_)
        | StmtKind::TsDeclare(_)
        | StmtKind::TsEnum(_) => true,
        StmtKind::Function(function) => function.body.is_none(),
        _ => false,
    }
}

// ── Enums ────────────────────────────────────────────────────────────────────

/// `var E;` followed by the initializer IIFE. With `export_span`, the `var`
/// is exported.
fn lower_enum(decl: TsEnumDecl, span: Span, export_span: Option<Span>) -> Vec<Stmt> {
    let name = decl.id.name.clone();
    let var = Stmt::new(
        StmtKind::Var(VarDecl {
            kind: VarKind::Var,
            decls: vec![VarDeclarator {
                name: Pattern::ident(name.clone(), decl.id.span),
                type_ann: None,
                definite: false,
                init: None,
                span: decl.id.span,
            }],
            span,
        }),
        span,
    );
    let var = match export_span {
        Some(export_span) => Stmt::new(
            StmtKind::Export(ExportDecl::Decl(Box::new(var))),
            export_span,
        ),
        None => var,
    };

    let mut members_seen: Vec<String> = Vec::new();
    let mut body = Vec::with_capacity(decl.members.len());
    // Value of the next auto-numbered member, while it is known statically.
    let mut next: Option<f64> = Some(0.0);
    let mut previous: Option<String> = None;
    for member in decl.members {
        let key = member.name.static_name().unwrap_or_default();
        let mspan = member.span;
        let (value, is_string) = match member.init {
            Some(mut init) => {
                qualify_member_refs(&mut init, &name, &members_seen);
                let is_string = matches!(
                    init.kind,
                    ExprKind::Str { .. } | ExprKind::Template(_)
                );
                next = match &init.kind {
                    ExprKind::Num { value, .. } => Some(value + 1.0),
                    ExprKind::Unary {
                        op: UnaryOp::Minus,
                        arg,
                    } => match &arg.kind {
                        ExprKind::Num { value, .. } => Some(1.0 - value),
                        _ => None,
                    },
                    _ => None,
                };
                (init, is_string)
            }
            None => {
                let value = match (next, &previous) {
                    (Some(n), _) => Expr::num(n, mspan),
                    (None, Some(prev)) => Expr::binary(
                        BinaryOp::Add,
                        enum_member(&name, prev, mspan),
                        Expr::num(1.0, mspan),
                        mspan,
                    ),
                    (None, None) => Expr::num(0.0, mspan),
                };
                next = next.map(|n| n + 1.0);
                (value, false)
            }
        };

        // E["A"] = value
        let assign = Expr::assign(enum_member(&name, &key, mspan), value, mspan);
        let stmt_expr = if is_string {
            assign
        } else {
            // E[E["A"] = 0] = "A"
            Expr::assign(
                Expr::new(
                    ExprKind::Member {
                        object: Box::new(Expr::ident(name.clone(), mspan)),
                        prop: MemberProp::Computed(Box::new(assign)),
                        optional: false,
                    },
                    mspan,
                ),
                Expr::str(key.clone(), mspan),
                mspan,
            )
        };
        body.push(Stmt::expr(stmt_expr));
        members_seen.push(key.clone());
        previous = Some(key);
    }

    let iife_fn = Expr::new(
        ExprKind::Function(Box::new(Function {
            id: None,
            params: vec![Param {
                pat: Pattern::ident(name.clone(), decl.id.span),
                type_ann: None,
                optional: false,
                span: decl.id.span,
            }],
            body: Some(Block { stmts: body, span }),
            is_async: false,
            is_generator: false,
            type_params: Vec::new(),
            return_type: None,
            span,
        })),
        span,
    );
    // E || (E = {})
    let arg = Expr::binary(
        BinaryOp::LogicalOr,
        Expr::ident(name.clone(), span),
        Expr::assign(
            Expr::ident(name.clone(), span),
            Expr::new(ExprKind::Object(Vec::new()), span),
            span,
        ),
        span,
    );
    let iife = Stmt::expr(Expr::call(iife_fn, vec![arg], span));
    vec![var, iife]
}

/// `E["name"]`
fn enum_member(enum_name: &str, member: &str, span: Span) -> Expr {
    Expr::new(
        ExprKind::Member {
            object: Box::new(Expr::ident(enum_name, span)),
            prop: MemberProp::Computed(Box::new(Expr::str(member, span))),
            optional: false,
        },
        span,
    )
}

/// Inside an initializer, earlier members are referenced by bare name
/// (`B = A << 1`); rewrite those to `E.A`.
fn qualify_member_refs(init: &mut Expr, enum_name: &str, members: &[String]) {
    struct Qualify<'a> {
        enum_name: &'a str,
        members: &'a [String],
    }
    impl VisitMut for Qualify<'_> {
        fn visit_expr(&mut self, expr: &mut Expr) {
            if let ExprKind::Ident(name) = &expr.kind {
                if self.members.iter().any(|m| m == name) {
                    let name = name.clone();
                    *expr = Expr::member(Expr::ident(self.enum_name, expr.span), name, expr.span);
                    return;
                }
            }
            visit::walk_expr(self, expr);
        }

        fn visit_function(&mut self, _function: &mut Function) {}
        fn visit_arrow(&mut self, _arrow: &mut ArrowFunction) {}
    }
    Qualify { enum_name, members }.visit_expr(init);
}

// ══════════════════════════════════════════════════════════════════════════════
// Import/export elision
// ══════════════════════════════════════════════════════════════════════════════

/// Names declared only as types at the top level (`interface`, `type`,
/// `declare`), which cannot be re-exported as values.
fn declared_type_names(body: &[Stmt]) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in body {
        let stmt = match &stmt.kind {
            StmtKind::Export(ExportDecl::Decl(decl)) => decl,
            _ => stmt,
        };
        match &stmt.kind {
            StmtKind::TsInterface(decl) => {
                names.insert(decl.id.name.clone());
            }
            StmtKind::TsTypeAlias(decl) => {
                names.insert(decl.id.name.clone());
            }
            _ => {}
        }
    }
    names
}

/// Every identifier read as a value once types are gone.
#[derive(Default)]
struct ValueUsage {
    names: HashSet<String>,
}

impl VisitMut for ValueUsage {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if let ExprKind::Ident(name) = &expr.kind {
            self.names.insert(name.clone());
        }
        visit::walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        match &stmt.kind {
            // Import bindings are declarations, not uses.
            StmtKind::Import(_) => return,
            StmtKind::Export(ExportDecl::Named {
                specifiers,
                source: None,
                ..
            }) => {
                for spec in specifiers {
                    self.names.insert(spec.local.name.clone());
                }
            }
            _ => {}
        }
        visit::walk_stmt(self, stmt);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        // Shorthand properties `{ a }` reach here.
        self.names.insert(ident.name.clone());
    }
}

fn elide_type_only_bindings(
    body: &mut Vec<Stmt>,
    used: &HashSet<String>,
    type_names: &HashSet<String>,
) {
    let value_declared: HashSet<String> = top_level_value_names(body);
    body.retain_mut(|stmt| match &mut stmt.kind {
        StmtKind::Import(import) => {
            if import.specifiers.is_empty() {
                return true;
            }
            import.specifiers.retain(|spec| match spec {
                ImportSpecifier::Named {
                    type_only: true, ..
                } => false,
                spec => used.contains(&spec.local().name),
            });
            !import.specifiers.is_empty()
        }
        StmtKind::Export(ExportDecl::Named {
            specifiers, source, ..
        }) => {
            if specifiers.is_empty() {
                return true;
            }
            let local_only = source.is_none();
            specifiers.retain(|spec| {
                !spec.type_only
                    && !(local_only
                        && type_names.contains(&spec.local.name)
                        && !value_declared.contains(&spec.local.name))
            });
            !specifiers.is_empty()
        }
        _ => true,
    });
}

/// Names bound by top-level value declarations and value imports.
fn top_level_value_names(body: &[Stmt]) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in body {
        let stmt = match &stmt.kind {
            StmtKind::Export(ExportDecl::Decl(decl)) => decl,
            _ => stmt,
        };
        match &stmt.kind {
            StmtKind::Var(decl) => {
                for d in &decl.decls {
                    names.extend(d.name.bound_names());
                }
            }
            StmtKind::Function(function) => {
                if let Some(id) = &function.id {
                    names.insert(id.name.clone());
                }
            }
            StmtKind::Class(class) => {
                if let Some(id) = &class.id {
                    names.insert(id.name.clone());
                }
            }
            StmtKind::Import(import) => {
                for spec in &import.specifiers {
                    names.insert(spec.local().name.clone());
                }
            }
            _ => {}
        }
    }
    names
}

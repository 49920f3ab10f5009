//! ES module syntax to CommonJS.
//!
//! ```text
//! import a, { b as c } from "./m";    var _m = require("./m");
//! export const x = 1;            =>   var a = _m.__esModule ? _m.default : _m, c = _m.b;
//! export default f();                 const x = 1;
//!                                     exports.default = f();
//! ```
//!
//! Every local export is defined up front as a getter on `exports`, so
//! later reassignments stay visible to importers. Imported bindings are
//! read once, when the module body starts. The output opens with
//! `"use strict"` and, when anything is exported, the `__esModule` marker.
//! `import(x)` becomes `Promise.resolve().then(function() { return require(x); })`
//! and top-level `this` becomes `void 0`.

use std::collections::HashMap;

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::Span;

use crate::error::{PassResult, TransformWarning};
use crate::pass::Pass;
use crate::temps::{prologue_len, NameGen};

pub struct CommonJs;

impl Pass for CommonJs {
    fn name(&self) -> &'static str {
        "commonjs"
    }

    fn run(&self, mut program: Program, _warnings: &mut Vec<TransformWarning>) -> PassResult<Program> {
        if program.kind != ProgramKind::Module {
            return Ok(program);
        }
        let names = NameGen::for_program(&mut program);
        let mut conversion = Conversion {
            names,
            module_vars: HashMap::new(),
            getters: Vec::new(),
            requires: Vec::new(),
            body: Vec::new(),
            has_exports: false,
        };
        let span = program.span;
        let mut body = std::mem::take(&mut program.body);
        let directives: Vec<Stmt> = body.drain(..prologue_len(&body)).collect();
        for stmt in body {
            conversion.convert(stmt);
        }

        let mut out = directives;
        let has_use_strict = out.iter().any(is_use_strict);
        if !has_use_strict {
            out.insert(0, Stmt::expr(Expr::str("use strict", span)));
        }
        if conversion.has_exports {
            out.push(define_property(
                "__esModule",
                object(vec![("value", Expr::new(ExprKind::Bool(true), span))], span),
                span,
            ));
        }
        for (exported, value) in std::mem::take(&mut conversion.getters) {
            out.push(export_getter(&exported, value, span));
        }
        out.append(&mut conversion.requires);
        out.append(&mut conversion.body);
        program.body = out;

        RuntimeRewrite { depth: 0 }.visit_program(&mut program);
        Ok(program)
    }
}

struct Conversion {
    names: NameGen,
    /// Module specifier to the variable holding its `require` result.
    module_vars: HashMap<String, String>,
    /// Exported name and the expression its getter returns, in source order.
    getters: Vec<(String, Expr)>,
    requires: Vec<Stmt>,
    body: Vec<Stmt>,
    has_exports: bool,
}

impl Conversion {
    fn convert(&mut self, stmt: Stmt) {
        let span = stmt.span;
        match stmt.kind {
            StmtKind::Import(import) => self.convert_import(import, span),
            StmtKind::Export(export) => {
                self.has_exports = true;
                self.convert_export(export, span);
            }
            kind => self.body.push(Stmt::new(kind, span)),
        }
    }

    /// The variable holding `require(source)`, emitting the `require` on
    /// first use.
    fn module_var(&mut self, source: &StrLit, span: Span) -> String {
        if let Some(name) = self.module_vars.get(&source.value) {
            return name.clone();
        }
        let name = self.names.unique(&module_var_base(&source.value));
        self.requires.push(var_stmt(
            vec![(name.clone(), require_call(source, span))],
            span,
        ));
        self.module_vars.insert(source.value.clone(), name.clone());
        name
    }

    fn convert_import(&mut self, import: ImportDecl, span: Span) {
        if import.specifiers.is_empty() {
            self.requires.push(Stmt::expr(require_call(&import.source, span)));
            return;
        }
        let module = self.module_var(&import.source, span);
        let module_ref = || Expr::ident(module.clone(), span);
        let mut bindings = Vec::with_capacity(import.specifiers.len());
        for spec in import.specifiers {
            match spec {
                ImportSpecifier::Default(local) => {
                    // _m.__esModule ? _m.default : _m
                    let value = Expr::new(
                        ExprKind::Conditional {
                            test: Box::new(Expr::member(module_ref(), "__esModule", span)),
                            cons: Box::new(Expr::member(module_ref(), "default", span)),
                            alt: Box::new(module_ref()),
                        },
                        span,
                    );
                    bindings.push((local.name, value));
                }
                ImportSpecifier::Namespace(local) => bindings.push((local.name, module_ref())),
                ImportSpecifier::Named {
                    imported, local, ..
                } => {
                    let imported = imported.as_ref().unwrap_or(&local).name.clone();
                    bindings.push((local.name, Expr::member(module_ref(), imported, span)));
                }
            }
        }
        self.requires.push(var_stmt(bindings, span));
    }

    fn convert_export(&mut self, export: ExportDecl, span: Span) {
        match export {
            ExportDecl::Decl(decl) => {
                for name in declared_names(&decl) {
                    self.getters.push((name.clone(), Expr::ident(name, span)));
                }
                self.body.push(*decl);
            }
            ExportDecl::Default(DefaultExport::Expr(expr)) => {
                let target = Expr::member(Expr::ident("exports", span), "default", span);
                self.body.push(Stmt::expr(Expr::assign(target, *expr, span)));
            }
            ExportDecl::Default(DefaultExport::Function(mut function)) => {
                let name = self.default_name(&mut function.id, span);
                self.getters.push(("default".to_string(), Expr::ident(name, span)));
                self.body.push(Stmt::new(StmtKind::Function(function), span));
            }
            ExportDecl::Default(DefaultExport::Class(mut class)) => {
                let name = self.default_name(&mut class.id, span);
                self.getters.push(("default".to_string(), Expr::ident(name, span)));
                self.body.push(Stmt::new(StmtKind::Class(class), span));
            }
            ExportDecl::Named {
                specifiers, source, ..
            } => {
                let module = source.as_ref().map(|source| self.module_var(source, span));
                for spec in specifiers {
                    let exported = spec.exported_name().to_string();
                    let value = match &module {
                        Some(module) => {
                            Expr::member(Expr::ident(module.clone(), span), spec.local.name, span)
                        }
                        None => Expr::ident(spec.local.name, spec.local.span),
                    };
                    self.getters.push((exported, value));
                }
            }
            ExportDecl::All {
                exported: Some(exported),
                source,
            } => {
                let module = self.module_var(&source, span);
                self.getters.push((exported.name, Expr::ident(module, span)));
            }
            ExportDecl::All {
                exported: None,
                source,
            } => {
                let module = self.module_var(&source, span);
                self.requires.push(export_star(&module, span));
            }
        }
    }

    /// Name an anonymous `export default function/class`.
    fn default_name(&mut self, id: &mut Option<Ident>, span: Span) -> String {
        match id {
            Some(id) => id.name.clone(),
            None => {
                let name = self.names.unique("_default");
                *id = Some(Ident::new(name.clone(), span));
                name
            }
        }
    }
}

fn declared_names(stmt: &Stmt) -> Vec<String> {
    match &stmt.kind {
        StmtKind::Var(decl) => decl.decls.iter().flat_map(|d| d.name.bound_names()).collect(),
        StmtKind::Function(function) => function.id.iter().map(|id| id.name.clone()).collect(),
        StmtKind::Class(class) => class.id.iter().map(|id| id.name.clone()).collect(),
        _ => Vec::new(),
    }
}

fn is_use_strict(stmt: &Stmt) -> bool {
    matches!(&stmt.kind, StmtKind::Expr(e) if matches!(&e.kind, ExprKind::Str { value, .. } if value == "use strict"))
}

/// `"./foo-bar.js"` => `_foo_bar`
fn module_var_base(specifier: &str) -> String {
    let file = specifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(specifier);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "_module".to_string()
    } else {
        format!("_{sanitized}")
    }
}

// ── Builders ─────────────────────────────────────────────────────────────────

fn require_call(source: &StrLit, span: Span) -> Expr {
    Expr::call(
        Expr::ident("require", span),
        vec![Expr::new(
            ExprKind::Str {
                value: source.value.clone(),
                raw: source.raw.clone(),
            },
            source.span,
        )],
        span,
    )
}

fn var_stmt(bindings: Vec<(String, Expr)>, span: Span) -> Stmt {
    let decls = bindings
        .into_iter()
        .map(|(name, init)| VarDeclarator {
            name: Pattern::ident(name, span),
            type_ann: None,
            definite: false,
            init: Some(init),
            span,
        })
        .collect();
    Stmt::new(
        StmtKind::Var(VarDecl {
            kind: VarKind::Var,
            decls,
            span,
        }),
        span,
    )
}

fn object(entries: Vec<(&str, Expr)>, span: Span) -> Expr {
    Expr::new(
        ExprKind::Object(
            entries
                .into_iter()
                .map(|(key, value)| Prop {
                    kind: PropKind::KeyValue {
                        key: PropKey::Ident(Ident::new(key, span)),
                        value,
                    },
                    span,
                })
                .collect(),
        ),
        span,
    )
}

fn function_expr(params: &[&str], stmts: Vec<Stmt>, span: Span) -> Expr {
    Expr::new(
        ExprKind::Function(Box::new(Function {
            id: None,
            params: params
                .iter()
                .map(|name| Param {
                    pat: Pattern::ident(*name, span),
                    type_ann: None,
                    optional: false,
                    span,
                })
                .collect(),
            body: Some(Block { stmts, span }),
            is_async: false,
            is_generator: false,
            type_params: Vec::new(),
            return_type: None,
            span,
        })),
        span,
    )
}

/// `function() { return value; }`
fn thunk(value: Expr, span: Span) -> Expr {
    function_expr(&[], vec![Stmt::new(StmtKind::Return(Some(value)), span)], span)
}

/// `Object.defineProperty(target, "name", descriptor);` with `exports` as
/// the target.
fn define_property(name: &str, descriptor: Expr, span: Span) -> Stmt {
    define_property_on(Expr::ident("exports", span), Expr::str(name, span), descriptor, span)
}

fn define_property_on(target: Expr, name: Expr, descriptor: Expr, span: Span) -> Stmt {
    Stmt::expr(Expr::call(
        Expr::member(Expr::ident("Object", span), "defineProperty", span),
        vec![target, name, descriptor],
        span,
    ))
}

fn export_getter(exported: &str, value: Expr, span: Span) -> Stmt {
    define_property(
        exported,
        object(
            vec![
                ("enumerable", Expr::new(ExprKind::Bool(true), span)),
                ("get", thunk(value, span)),
            ],
            span,
        ),
        span,
    )
}

/// ```text
/// Object.keys(_m).forEach(function(key) {
///     if (key === "default" || key === "__esModule" || Object.prototype.hasOwnProperty.call(exports, key)) return;
///     Object.defineProperty(exports, key, { enumerable: true, get: function() { return _m[key]; } });
/// });
/// ```
fn export_star(module: &str, span: Span) -> Stmt {
    let key = || Expr::ident("key", span);
    let is_key = |name: &str| Expr::binary(BinaryOp::EqEqEq, key(), Expr::str(name, span), span);
    let has_own = Expr::call(
        Expr::member(
            Expr::member(
                Expr::member(Expr::ident("Object", span), "prototype", span),
                "hasOwnProperty",
                span,
            ),
            "call",
            span,
        ),
        vec![Expr::ident("exports", span), key()],
        span,
    );
    let skip = Expr::binary(
        BinaryOp::LogicalOr,
        Expr::binary(BinaryOp::LogicalOr, is_key("default"), is_key("__esModule"), span),
        has_own,
        span,
    );
    let guard = Stmt::new(
        StmtKind::If {
            test: skip,
            cons: Box::new(Stmt::new(StmtKind::Return(None), span)),
            alt: None,
        },
        span,
    );
    let read = Expr::new(
        ExprKind::Member {
            object: Box::new(Expr::ident(module, span)),
            prop: MemberProp::Computed(Box::new(key())),
            optional: false,
        },
        span,
    );
    let define = define_property_on(
        Expr::ident("exports", span),
        key(),
        object(
            vec![
                ("enumerable", Expr::new(ExprKind::Bool(true), span)),
                ("get", thunk(read, span)),
            ],
            span,
        ),
        span,
    );
    let keys = Expr::call(
        Expr::member(Expr::ident("Object", span), "keys", span),
        vec![Expr::ident(module, span)],
        span,
    );
    Stmt::expr(Expr::call(
        Expr::member(keys, "forEach", span),
        vec![function_expr(&["key"], vec![guard, define], span)],
        span,
    ))
}

// ── Runtime rewrites ─────────────────────────────────────────────────────────

/// Dynamic `import()` and top-level `this`.
struct RuntimeRewrite {
    /// Enclosing non-arrow functions and classes.
    depth: usize,
}

impl VisitMut for RuntimeRewrite {
    fn visit_function(&mut self, function: &mut Function) {
        self.depth += 1;
        visit::walk_function(self, function);
        self.depth -= 1;
    }

    fn visit_class(&mut self, class: &mut Class) {
        if let Some(super_class) = &mut class.super_class {
            self.visit_expr(super_class);
        }
        self.depth += 1;
        for member in &mut class.members {
            match &mut member.kind {
                ClassMemberKind::Method { function, .. } => self.visit_function(function),
                ClassMemberKind::Property {
                    value: Some(value), ..
                } => self.visit_expr(value),
                ClassMemberKind::Property { .. } => {}
                ClassMemberKind::StaticBlock(block) => visit::walk_block(self, block),
            }
        }
        self.depth -= 1;
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        visit::walk_expr(self, expr);
        let span = expr.span;
        if self.depth == 0 && matches!(expr.kind, ExprKind::This) {
            *expr = Expr::undefined(span);
            return;
        }
        let is_dynamic_import = matches!(
            &expr.kind,
            ExprKind::Call { callee, .. } if callee.as_ident() == Some("import")
        );
        if !is_dynamic_import {
            return;
        }
        if let ExprKind::Call { args, .. } = std::mem::take(expr).kind {
            let require = Expr::new(
                ExprKind::Call {
                    callee: Box::new(Expr::ident("require", span)),
                    args,
                    optional: false,
                    type_args: Vec::new(),
                },
                span,
            );
            let resolved = Expr::call(
                Expr::member(Expr::ident("Promise", span), "resolve", span),
                Vec::new(),
                span,
            );
            *expr = Expr::call(
                Expr::member(resolved, "then", span),
                vec![thunk(require, span)],
                span,
            );
        }
    }
}

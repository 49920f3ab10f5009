//! Fresh names for synthesized bindings.
//!
//! Lowering passes introduce temporaries (`_a`, `_b`, ...) and captures
//! (`_this`, `_arguments`). Names are drawn from a [`NameGen`] seeded with
//! every identifier already present in the program, so a synthesized name
//! never shadows or collides with a user binding. Generation order is fixed,
//! which keeps output deterministic.

use std::collections::HashSet;

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::Span;

#[derive(Debug, Default)]
pub struct NameGen {
    used: HashSet<String>,
    next_temp: usize,
}

impl NameGen {
    /// Seed with every name appearing in `program`.
    pub fn for_program(program: &mut Program) -> Self {
        let mut collector = NameCollector::default();
        collector.visit_program(program);
        Self {
            used: collector.names,
            next_temp: 0,
        }
    }

    /// The next unused temporary: `_a` ... `_z`, then `_a1` ... `_z1`, ...
    pub fn temp(&mut self) -> String {
        loop {
            let letter = (b'a' + (self.next_temp % 26) as u8) as char;
            let round = self.next_temp / 26;
            self.next_temp += 1;
            let name = if round == 0 {
                format!("_{letter}")
            } else {
                format!("_{letter}{round}")
            };
            if self.used.insert(name.clone()) {
                return name;
            }
        }
    }

    /// `base` itself if unused, otherwise `base1`, `base2`, ...
    pub fn unique(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let name = format!("{base}{n}");
            if self.used.insert(name.clone()) {
                return name;
            }
            n += 1;
        }
    }
}

#[derive(Default)]
struct NameCollector {
    names: HashSet<String>,
}

impl VisitMut for NameCollector {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if let ExprKind::Ident(name) = &expr.kind {
            self.names.insert(name.clone());
        }
        visit::walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pat: &mut Pattern) {
        if let PatternKind::Ident(name) = &pat.kind {
            self.names.insert(name.clone());
        }
        visit::walk_pattern(self, pat);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        self.names.insert(ident.name.clone());
    }
}

// ── Hoisted temporaries ──────────────────────────────────────────────────────

/// Temporaries declared per function scope, hoisted as one `var` statement
/// at the top of the scope body.
#[derive(Debug)]
pub struct TempScopes {
    pub names: NameGen,
    stack: Vec<Vec<String>>,
}

impl TempScopes {
    pub fn new(names: NameGen) -> Self {
        Self {
            names,
            stack: vec![Vec::new()],
        }
    }

    pub fn push(&mut self) {
        self.stack.push(Vec::new());
    }

    /// Close the innermost scope, returning the temps it declared.
    pub fn pop(&mut self) -> Vec<String> {
        self.stack.pop().unwrap_or_default()
    }

    /// Declare a fresh temporary in the innermost scope.
    pub fn declare(&mut self) -> String {
        let name = self.names.temp();
        if let Some(scope) = self.stack.last_mut() {
            scope.push(name.clone());
        }
        name
    }
}

/// Insert `var a, b;` after the directive prologue of `stmts`.
pub fn hoist_vars(stmts: &mut Vec<Stmt>, names: Vec<String>, span: Span) {
    if names.is_empty() {
        return;
    }
    let decls = names
        .into_iter()
        .map(|name| VarDeclarator {
            name: Pattern::ident(name, span),
            type_ann: None,
            definite: false,
            init: None,
            span,
        })
        .collect();
    let decl = Stmt::new(
        StmtKind::Var(VarDecl {
            kind: VarKind::Var,
            decls,
            span,
        }),
        span,
    );
    let at = prologue_len(stmts);
    stmts.insert(at, decl);
}

/// Number of leading directive statements (`"use strict";`).
pub fn prologue_len(stmts: &[Stmt]) -> usize {
    stmts.iter().take_while(|s| s.is_directive()).count()
}

/// Run `edit` on the block body of `arrow`, turning `=> expr` into
/// `=> { return expr; }` first.
pub fn edit_arrow_block(arrow: &mut ArrowFunction, edit: impl FnOnce(&mut Block)) {
    let empty = ArrowBody::Block(Block {
        stmts: Vec::new(),
        span: arrow.span,
    });
    let mut block = match std::mem::replace(&mut arrow.body, empty) {
        ArrowBody::Block(block) => block,
        ArrowBody::Expr(expr) => {
            let span = expr.span;
            Block {
                stmts: vec![Stmt::new(StmtKind::Return(Some(*expr)), span)],
                span,
            }
        }
    };
    edit(&mut block);
    arrow.body = ArrowBody::Block(block);
}

/// Hoist `names` into an arrow body.
pub fn hoist_vars_into_arrow(arrow: &mut ArrowFunction, names: Vec<String>, span: Span) {
    if names.is_empty() {
        return;
    }
    edit_arrow_block(arrow, |block| hoist_vars(&mut block.stmts, names, span));
}

// ── Single evaluation ────────────────────────────────────────────────────────

/// Returns `true` when `expr` can be evaluated twice without a temp.
fn is_duplicable(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Ident(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::Null
            | ExprKind::Bool(_)
            | ExprKind::Num { .. }
            | ExprKind::Str { .. }
    )
}

/// Split `expr` into a first evaluation and a reference that can be cloned
/// for every later read. Anything that is not a plain reference or literal
/// goes through a fresh temp: `(_a = expr)` then `_a`.
pub fn memoize(expr: Expr, scopes: &mut TempScopes) -> (Expr, Expr) {
    if is_duplicable(&expr) {
        return (expr.clone(), expr);
    }
    let span = expr.span;
    let temp = scopes.declare();
    (
        Expr::assign(Expr::ident(temp.clone(), span), expr, span),
        Expr::ident(temp, span),
    )
}

/// Split an assignment target so it can be both read and written while its
/// object and key are evaluated once. The first expression performs any
/// temp assignments and must be evaluated before the second.
pub fn split_reference(target: Expr, scopes: &mut TempScopes) -> (Expr, Expr) {
    let span = target.span;
    match target.kind {
        ExprKind::Member {
            object,
            prop,
            optional,
        } => {
            let (obj_first, obj_ref) = memoize(*object, scopes);
            let (prop_first, prop_ref) = match prop {
                MemberProp::Computed(key) => {
                    let (first, reference) = memoize(*key, scopes);
                    (
                        MemberProp::Computed(Box::new(first)),
                        MemberProp::Computed(Box::new(reference)),
                    )
                }
                prop => (prop.clone(), prop),
            };
            (
                Expr::new(
                    ExprKind::Member {
                        object: Box::new(obj_first),
                        prop: prop_first,
                        optional,
                    },
                    span,
                ),
                Expr::new(
                    ExprKind::Member {
                        object: Box::new(obj_ref),
                        prop: prop_ref,
                        optional,
                    },
                    span,
                ),
            )
        }
        kind => {
            let target = Expr::new(kind, span);
            (target.clone(), target)
        }
    }
}

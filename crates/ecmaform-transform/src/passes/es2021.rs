//! Logical assignment lowering.
//!
//! ```text
//! a ||= b      =>  a || (a = b)
//! o.p &&= b    =>  o.p && (o.p = b)
//! f().p ??= b  =>  (_a = f()).p ?? (_a.p = b)
//! ```
//!
//! `??` produced here is lowered further by `es2020` when the target needs it.
//!
//! Numeric separators (`1_000`) are dropped from literal source text.

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};

use crate::error::{PassResult, TransformWarning};
use crate::pass::Pass;
use crate::temps::{hoist_vars, hoist_vars_into_arrow, split_reference, NameGen, TempScopes};

pub struct Es2021;

impl Pass for Es2021 {
    fn name(&self) -> &'static str {
        "es2021"
    }

    fn run(&self, mut program: Program, _warnings: &mut Vec<TransformWarning>) -> PassResult<Program> {
        let names = NameGen::for_program(&mut program);
        LogicalAssign {
            scopes: TempScopes::new(names),
        }
        .visit_program(&mut program);
        Ok(program)
    }
}

struct LogicalAssign {
    scopes: TempScopes,
}

impl VisitMut for LogicalAssign {
    fn visit_program(&mut self, program: &mut Program) {
        visit::walk_program(self, program);
        let temps = self.scopes.pop();
        hoist_vars(&mut program.body, temps, program.span);
    }

    fn visit_function(&mut self, function: &mut Function) {
        self.scopes.push();
        visit::walk_function(self, function);
        let temps = self.scopes.pop();
        if let Some(body) = &mut function.body {
            hoist_vars(&mut body.stmts, temps, function.span);
        }
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        self.scopes.push();
        visit::walk_arrow(self, arrow);
        let temps = self.scopes.pop();
        let span = arrow.span;
        hoist_vars_into_arrow(arrow, temps, span);
    }

    fn visit_prop_key(&mut self, key: &mut PropKey) {
        if let PropKey::Num { raw: Some(raw), .. } = key {
            strip_separators(raw);
        }
        visit::walk_prop_key(self, key);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        visit::walk_expr(self, expr);
        match &mut expr.kind {
            ExprKind::Num { raw: Some(raw), .. } | ExprKind::BigInt(raw) => {
                strip_separators(raw);
                return;
            }
            _ => {}
        }
        let logical = match &expr.kind {
            ExprKind::Assign { op, .. } => op.logical_op(),
            _ => None,
        };
        let Some(logical) = logical else {
            return;
        };
        let span = expr.span;
        if let ExprKind::Assign { target, value, .. } = std::mem::take(expr).kind {
            let (read, write) = split_reference(*target, &mut self.scopes);
            *expr = Expr::binary(logical, read, Expr::assign(write, *value, span), span);
        }
    }
}

fn strip_separators(raw: &mut String) {
    if raw.contains('_') {
        raw.retain(|c| c != '_');
    }
}

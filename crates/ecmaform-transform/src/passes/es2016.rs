//! Exponentiation lowering: `a ** b` => `Math.pow(a, b)`.
//!
//! `Math.pow` throws on BigInt arguments, so `**` with a BigInt literal
//! operand is kept as written and reported.

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::{ErrorCode, Span};

use crate::error::{PassResult, TransformWarning};
use crate::pass::Pass;
use crate::temps::{hoist_vars, hoist_vars_into_arrow, split_reference, NameGen, TempScopes};

pub struct Es2016;

impl Pass for Es2016 {
    fn name(&self) -> &'static str {
        "es2016"
    }

    fn run(&self, mut program: Program, warnings: &mut Vec<TransformWarning>) -> PassResult<Program> {
        let names = NameGen::for_program(&mut program);
        let mut exponent = Exponent {
            scopes: TempScopes::new(names),
            warnings,
        };
        exponent.visit_program(&mut program);
        Ok(program)
    }
}

struct Exponent<'w> {
    scopes: TempScopes,
    warnings: &'w mut Vec<TransformWarning>,
}

/// A BigInt literal, possibly negated.
fn is_bigint(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::BigInt(_) => true,
        ExprKind::Unary {
            op: UnaryOp::Minus,
            arg,
        } => is_bigint(arg),
        _ => false,
    }
}

fn math_pow(base: Expr, exponent: Expr, span: Span) -> Expr {
    Expr::call(
        Expr::member(Expr::ident("Math", span), "pow", span),
        vec![base, exponent],
        span,
    )
}

impl VisitMut for Exponent<'_> {
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

    fn visit_expr(&mut self, expr: &mut Expr) {
        visit::walk_expr(self, expr);
        let applies = matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::Exp,
                ..
            } | ExprKind::Assign {
                op: AssignOp::ExpAssign,
                ..
            }
        );
        if !applies {
            return;
        }
        let span = expr.span;
        let bigint = match &expr.kind {
            ExprKind::Binary { left, right, .. } => is_bigint(left) || is_bigint(right),
            ExprKind::Assign { value, .. } => is_bigint(value),
            _ => false,
        };
        if bigint {
            tracing::debug!(start = span.start, "BigInt exponentiation kept");
            self.warnings.push(TransformWarning::new(
                "es2016",
                ErrorCode::BIGINT_EXPONENT_KEPT,
                "'**' on a BigInt cannot use Math.pow; kept as written",
                span,
            ));
            return;
        }
        *expr = match std::mem::take(expr).kind {
            ExprKind::Binary { left, right, .. } => math_pow(*left, *right, span),
            ExprKind::Assign { target, value, .. } => {
                // The written reference is evaluated before the right side.
                let (write, read) = split_reference(*target, &mut self.scopes);
                Expr::assign(write, math_pow(read, *value, span), span)
            }
            kind => Expr::new(kind, span),
        };
    }
}

//! Nullish coalescing and optional chaining lowering.
//!
//! ```text
//! a ?? b      =>  a !== null && a !== void 0 ? a : b
//! f() ?? b    =>  (_a = f()) !== null && _a !== void 0 ? _a : b
//! a?.b.c      =>  a === null || a === void 0 ? void 0 : a.b.c
//! o.m?.(x)    =>  (_a = o.m) === null || _a === void 0 ? void 0 : _a.call(o, x)
//! delete a?.b =>  a === null || a === void 0 ? true : delete a.b
//! ```

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::Span;

use crate::error::{PassResult, TransformError, TransformWarning};
use crate::pass::Pass;
use crate::temps::{hoist_vars, hoist_vars_into_arrow, memoize, NameGen, TempScopes};

const PASS: &str = "es2020";

pub struct Es2020;

impl Pass for Es2020 {
    fn name(&self) -> &'static str {
        PASS
    }

    fn run(&self, mut program: Program, _warnings: &mut Vec<TransformWarning>) -> PassResult<Program> {
        let names = NameGen::for_program(&mut program);
        let mut lowering = Nullish {
            scopes: TempScopes::new(names),
            error: None,
        };
        lowering.visit_program(&mut program);
        match lowering.error {
            Some(err) => Err(err),
            None => Ok(program),
        }
    }
}

struct Nullish {
    scopes: TempScopes,
    error: Option<TransformError>,
}

/// One `.prop` or `(args)` step of a chain, innermost first.
enum Link {
    Member {
        prop: MemberProp,
        optional: bool,
        span: Span,
    },
    Call {
        args: Vec<ExprOrSpread>,
        optional: bool,
        span: Span,
    },
}

impl Link {
    fn is_optional(&self) -> bool {
        match self {
            Self::Member { optional, .. } | Self::Call { optional, .. } => *optional,
        }
    }

    /// Apply this step to `object` as a plain (non-optional) access.
    fn apply(self, object: Expr) -> Expr {
        match self {
            Self::Member { prop, span, .. } => Expr::new(
                ExprKind::Member {
                    object: Box::new(object),
                    prop,
                    optional: false,
                },
                span,
            ),
            Self::Call { args, span, .. } => Expr::new(
                ExprKind::Call {
                    callee: Box::new(object),
                    args,
                    optional: false,
                    type_args: Vec::new(),
                },
                span,
            ),
        }
    }
}

/// What the innermost (fully evaluated) chain becomes.
#[derive(Clone, Copy)]
enum Finish {
    Value,
    Delete(Span),
}

fn strict_eq(left: Expr, right: Expr, span: Span) -> Expr {
    Expr::binary(BinaryOp::EqEqEq, left, right, span)
}

fn strict_ne(left: Expr, right: Expr, span: Span) -> Expr {
    Expr::binary(BinaryOp::NotEqEq, left, right, span)
}

/// `first === null || reference === void 0`
fn is_nullish_test(first: Expr, reference: Expr, span: Span) -> Expr {
    Expr::binary(
        BinaryOp::LogicalOr,
        strict_eq(first, Expr::new(ExprKind::Null, span), span),
        strict_eq(reference, Expr::undefined(span), span),
        span,
    )
}

fn conditional(test: Expr, cons: Expr, alt: Expr, span: Span) -> Expr {
    Expr::new(
        ExprKind::Conditional {
            test: Box::new(test),
            cons: Box::new(cons),
            alt: Box::new(alt),
        },
        span,
    )
}

impl Nullish {
    fn lower_nullish(&mut self, left: Expr, right: Expr, span: Span) -> Expr {
        let (first, reference) = memoize(left, &mut self.scopes);
        let test = Expr::binary(
            BinaryOp::LogicalAnd,
            strict_ne(first, Expr::new(ExprKind::Null, span), span),
            strict_ne(reference.clone(), Expr::undefined(span), span),
            span,
        );
        conditional(test, reference, right, span)
    }

    fn lower_chain(&mut self, chain: Expr, finish: Finish, span: Span) -> Expr {
        let (base, links) = unchain(chain);
        if !links.iter().any(Link::is_optional) {
            self.error = Some(TransformError::unexpected(
                PASS,
                "optional chain without an optional link",
                span,
            ));
            return base;
        }
        self.build(base, links.into_iter(), finish, span)
    }

    fn build(
        &mut self,
        mut current: Expr,
        mut links: std::vec::IntoIter<Link>,
        finish: Finish,
        span: Span,
    ) -> Expr {
        while let Some(link) = links.next() {
            if !link.is_optional() {
                current = link.apply(current);
                continue;
            }
            let (test, applied) = match link {
                Link::Call { args, span: call_span, .. }
                    if matches!(current.kind, ExprKind::Member { .. }) =>
                {
                    self.optional_method_call(current, args, call_span)
                }
                link => {
                    let (first, reference) = memoize(current, &mut self.scopes);
                    let test = is_nullish_test(first, reference.clone(), span);
                    (test, link.apply(reference))
                }
            };
            let short = match finish {
                Finish::Value => Expr::undefined(span),
                Finish::Delete(_) => Expr::new(ExprKind::Bool(true), span),
            };
            let rest = self.build(applied, links, finish, span);
            return conditional(test, short, rest, span);
        }
        match finish {
            Finish::Value => current,
            Finish::Delete(delete_span) => Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Delete,
                    arg: Box::new(current),
                },
                delete_span,
            ),
        }
    }

    /// `o.m?.(args)` keeps `o` as the receiver: `_a.call(o, args)`.
    fn optional_method_call(
        &mut self,
        callee: Expr,
        args: Vec<ExprOrSpread>,
        span: Span,
    ) -> (Expr, Expr) {
        let callee_span = callee.span;
        let (object, prop) = match callee.kind {
            ExprKind::Member { object, prop, .. } => (object, prop),
            kind => {
                let (first, reference) = memoize(Expr::new(kind, callee_span), &mut self.scopes);
                let test = is_nullish_test(first, reference.clone(), span);
                let call = Link::Call {
                    args,
                    optional: false,
                    span,
                }
                .apply(reference);
                return (test, call);
            }
        };
        let (object_first, this_arg) = if matches!(object.kind, ExprKind::Super) {
            (*object, Expr::new(ExprKind::This, span))
        } else {
            memoize(*object, &mut self.scopes)
        };
        let method = Expr::new(
            ExprKind::Member {
                object: Box::new(object_first),
                prop,
                optional: false,
            },
            callee_span,
        );
        let temp = self.scopes.declare();
        let first = Expr::assign(Expr::ident(temp.clone(), callee_span), method, callee_span);
        let test = is_nullish_test(first, Expr::ident(temp.clone(), callee_span), span);
        let mut call_args = vec![ExprOrSpread::expr(this_arg)];
        call_args.extend(args);
        let call = Expr::new(
            ExprKind::Call {
                callee: Box::new(Expr::member(Expr::ident(temp, callee_span), "call", callee_span)),
                args: call_args,
                optional: false,
                type_args: Vec::new(),
            },
            span,
        );
        (test, call)
    }
}

/// Split a chain into its base object and its steps, innermost first.
fn unchain(mut expr: Expr) -> (Expr, Vec<Link>) {
    let mut links = Vec::new();
    loop {
        let span = expr.span;
        match expr.kind {
            ExprKind::Member {
                object,
                prop,
                optional,
            } => {
                links.push(Link::Member {
                    prop,
                    optional,
                    span,
                });
                expr = *object;
            }
            ExprKind::Call {
                callee,
                args,
                optional,
                ..
            } => {
                links.push(Link::Call {
                    args,
                    optional,
                    span,
                });
                expr = *callee;
            }
            kind => {
                links.reverse();
                return (Expr::new(kind, span), links);
            }
        }
    }
}

impl VisitMut for Nullish {
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
        let span = expr.span;

        // `delete a?.b` short-circuits to `true`, so it is lowered as a unit.
        let deleted_chain = match &mut expr.kind {
            ExprKind::Unary {
                op: UnaryOp::Delete,
                arg,
            } => match &mut arg.kind {
                ExprKind::OptChain(inner) => {
                    visit::walk_expr(self, inner);
                    Some(std::mem::take(&mut **inner))
                }
                _ => None,
            },
            _ => None,
        };
        if let Some(chain) = deleted_chain {
            *expr = self.lower_chain(chain, Finish::Delete(span), span);
            return;
        }

        visit::walk_expr(self, expr);
        let applies = matches!(
            expr.kind,
            ExprKind::OptChain(_)
                | ExprKind::Binary {
                    op: BinaryOp::NullishCoalescing,
                    ..
                }
        );
        if !applies {
            return;
        }
        *expr = match std::mem::take(expr).kind {
            ExprKind::OptChain(inner) => self.lower_chain(*inner, Finish::Value, span),
            ExprKind::Binary { left, right, .. } => self.lower_nullish(*left, *right, span),
            kind => Expr::new(kind, span),
        };
    }
}

//! Constant folding and dead code removal.
//!
//! - literal arithmetic, comparisons, string concatenation, `!` and
//!   `typeof` on literals fold to a literal
//! - `&&`/`||` with a literal left side, and `if`/`?:`/`while` with a
//!   constant test, keep only the branch that can run; an object or array
//!   test counts as constant only when building it has no side effects
//! - a folded callee or `delete` operand that is a property reference is
//!   written `(0, o.m)`, so the call gets no receiver and `delete` does
//!   not remove the property
//! - statements after `return`, `throw`, `break` or `continue` are dropped,
//!   except function declarations and the names of `var` declarations
//! - empty statements are dropped and blocks without lexical declarations
//!   are spliced into their parent list
//!
//! Folding never produces `NaN`, infinities or `-0`, which have no literal
//! form.

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::Span;

use crate::error::{PassResult, TransformWarning};
use crate::pass::Pass;

pub struct Compress;

impl Pass for Compress {
    fn name(&self) -> &'static str {
        "compress"
    }

    fn run(&self, mut program: Program, _warnings: &mut Vec<TransformWarning>) -> PassResult<Program> {
        Compressor.visit_program(&mut program);
        Ok(program)
    }
}

struct Compressor;

impl VisitMut for Compressor {
    fn visit_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        visit::walk_stmts(self, stmts);
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in std::mem::take(stmts) {
            match stmt.kind {
                StmtKind::Empty => {}
                StmtKind::Block(block) if !has_lexical_decl(&block.stmts) => {
                    out.extend(block.stmts);
                }
                kind => out.push(Stmt::new(kind, stmt.span)),
            }
        }
        drop_unreachable(&mut out);
        *stmts = out;
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        visit::walk_stmt(self, stmt);
        let span = stmt.span;
        let replacement = match &mut stmt.kind {
            StmtKind::If { test, cons, alt } => match truthiness(test) {
                Some(true) => {
                    let kept = std::mem::replace(&mut **cons, Stmt::new(StmtKind::Empty, span));
                    let dropped = alt.take();
                    Some(with_hoisted_vars(kept, dropped.as_deref(), span))
                }
                Some(false) => {
                    let dropped = std::mem::replace(&mut **cons, Stmt::new(StmtKind::Empty, span));
                    let kept = match alt.take() {
                        Some(alt) => *alt,
                        None => Stmt::new(StmtKind::Empty, span),
                    };
                    Some(with_hoisted_vars(kept, Some(&dropped), span))
                }
                None => None,
            },
            StmtKind::While { test, body } if truthiness(test) == Some(false) => {
                Some(hoisted_vars_only(body, span))
            }
            _ => None,
        };
        if let Some(replacement) = replacement {
            *stmt = replacement;
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        let guarded = match &expr.kind {
            ExprKind::Call { callee, .. } => foldable(callee),
            ExprKind::TaggedTemplate { tag, .. } => foldable(tag),
            ExprKind::Unary {
                op: UnaryOp::Delete,
                arg,
            } => foldable(arg),
            _ => false,
        };
        visit::walk_expr(self, expr);
        if guarded {
            detach_reference(expr);
        }
        if let Some(folded) = fold(expr) {
            *expr = folded;
        }
    }
}

/// Shapes [`fold`] can reduce to one of their operands.
fn foldable(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Binary { op, .. } => op.is_logical(),
        ExprKind::Conditional { .. } => true,
        _ => false,
    }
}

/// After `(a && o.m)()` folded to `o.m()`, restore the original meaning:
/// `(0, o.m)()` calls without a receiver, `(0, eval)()` is an indirect
/// eval and `delete (0, o.p)` deletes nothing.
fn detach_reference(expr: &mut Expr) {
    let (slot, is_delete) = match &mut expr.kind {
        ExprKind::Call { callee, .. } => (callee, false),
        ExprKind::TaggedTemplate { tag, .. } => (tag, false),
        ExprKind::Unary {
            op: UnaryOp::Delete,
            arg,
        } => (arg, true),
        _ => return,
    };
    let detach = match &slot.kind {
        ExprKind::Member { .. } | ExprKind::OptChain(_) => true,
        ExprKind::Ident(name) => is_delete || name == "eval",
        _ => false,
    };
    if detach {
        let span = slot.span;
        let reference = std::mem::take(&mut **slot);
        **slot = Expr::new(
            ExprKind::Sequence(vec![Expr::num(0.0, span), reference]),
            span,
        );
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

fn has_lexical_decl(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|s| match &s.kind {
        StmtKind::Var(decl) => decl.kind != VarKind::Var,
        StmtKind::Function(_) | StmtKind::Class(_) => true,
        _ => false,
    })
}

fn is_terminator(stmt: &Stmt) -> bool {
    matches!(
        stmt.kind,
        StmtKind::Return(_) | StmtKind::Throw(_) | StmtKind::Break(_) | StmtKind::Continue(_)
    )
}

/// Drop statements following a terminator, keeping hoisted declarations.
fn drop_unreachable(stmts: &mut Vec<Stmt>) {
    let Some(end) = stmts.iter().position(is_terminator) else {
        return;
    };
    let tail = stmts.split_off(end + 1);
    for stmt in tail {
        match &stmt.kind {
            StmtKind::Function(_) => stmts.push(stmt),
            _ => {
                let names = var_names(&stmt);
                if !names.is_empty() {
                    stmts.push(declare_vars(names, stmt.span));
                }
            }
        }
    }
}

/// `var` names declared by `stmt`, not looking into nested functions.
fn var_names(stmt: &Stmt) -> Vec<String> {
    struct Collector(Vec<String>);
    impl VisitMut for Collector {
        fn visit_var_decl(&mut self, decl: &mut VarDecl) {
            if decl.kind == VarKind::Var {
                for d in &decl.decls {
                    for name in d.name.bound_names() {
                        if !self.0.contains(&name) {
                            self.0.push(name);
                        }
                    }
                }
            }
        }
        fn visit_expr(&mut self, _expr: &mut Expr) {}
        fn visit_function(&mut self, _function: &mut Function) {}
        fn visit_class(&mut self, _class: &mut Class) {}
    }
    let mut stmt = stmt.clone();
    let mut collector = Collector(Vec::new());
    collector.visit_stmt(&mut stmt);
    collector.0
}

/// `var a, b;`
fn declare_vars(names: Vec<String>, span: Span) -> Stmt {
    Stmt::new(
        StmtKind::Var(VarDecl {
            kind: VarKind::Var,
            decls: names
                .into_iter()
                .map(|name| VarDeclarator {
                    name: Pattern::ident(name, span),
                    type_ann: None,
                    definite: false,
                    init: None,
                    span,
                })
                .collect(),
            span,
        }),
        span,
    )
}

/// `kept`, plus a `var` for names declared in the dropped branch.
fn with_hoisted_vars(kept: Stmt, dropped: Option<&Stmt>, span: Span) -> Stmt {
    let names = dropped.map(var_names).unwrap_or_default();
    if names.is_empty() {
        return kept;
    }
    let decl = declare_vars(names, span);
    let stmts = match kept.kind {
        StmtKind::Empty => vec![decl],
        kind => vec![Stmt::new(kind, kept.span), decl],
    };
    Stmt::new(StmtKind::Block(Block { stmts, span }), span)
}

fn hoisted_vars_only(dropped: &Stmt, span: Span) -> Stmt {
    with_hoisted_vars(Stmt::new(StmtKind::Empty, span), Some(dropped), span)
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// A literal value known at compile time.
#[derive(Debug, Clone, PartialEq)]
enum Constant {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
}

impl Constant {
    fn of(expr: &Expr) -> Option<Self> {
        match &expr.kind {
            ExprKind::Num { value, .. } => Some(Self::Num(*value)),
            ExprKind::Str { value, .. } => Some(Self::Str(value.clone())),
            ExprKind::Bool(b) => Some(Self::Bool(*b)),
            ExprKind::Null => Some(Self::Null),
            ExprKind::Unary {
                op: UnaryOp::Void,
                arg,
            } if is_literal(arg) => Some(Self::Undefined),
            ExprKind::Unary {
                op: UnaryOp::Minus,
                arg,
            } => match &arg.kind {
                ExprKind::Num { value, .. } => Some(Self::Num(-value)),
                _ => None,
            },
            _ => None,
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Self::Num(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Null | Self::Undefined => false,
        }
    }

    fn type_of(&self) -> &'static str {
        match self {
            Self::Num(_) => "number",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Null => "object",
            Self::Undefined => "undefined",
        }
    }

    /// `ToNumber`, for the operands folding accepts.
    fn to_number(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Null => Some(0.0),
            Self::Undefined => Some(f64::NAN),
            Self::Str(_) => None,
        }
    }

    /// `ToString`, when it is exact for the value.
    fn to_js_string(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Num(n) => number_to_string(*n),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null => Some("null".to_string()),
            Self::Undefined => Some("undefined".to_string()),
        }
    }
}

fn is_literal(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Num { .. } | ExprKind::Str { .. } | ExprKind::Bool(_) | ExprKind::Null
    )
}

/// Numbers whose JavaScript string form matches Rust's: finite, and not in
/// the ranges JavaScript writes with an exponent.
fn number_to_string(n: f64) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    let abs = n.abs();
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        return None;
    }
    Some(format_number(n))
}

fn truthiness(expr: &Expr) -> Option<bool> {
    match &expr.kind {
        ExprKind::Function(_) | ExprKind::Arrow(_) => Some(true),
        ExprKind::Object(_) | ExprKind::Array(_) => is_pure(expr).then_some(true),
        _ => Constant::of(expr).map(|c| c.truthy()),
    }
}

/// Evaluating `expr` cannot run user code or throw. Identifier reads are
/// excluded: an undeclared name throws.
fn is_pure(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Function(_) | ExprKind::Arrow(_) | ExprKind::This | ExprKind::Regex { .. } => true,
        ExprKind::Array(elems) => elems
            .iter()
            .flatten()
            .all(|elem| !elem.spread && is_pure(&elem.expr)),
        ExprKind::Object(props) => props.iter().all(|prop| match &prop.kind {
            PropKind::KeyValue { key, value } => !matches!(key, PropKey::Computed(_)) && is_pure(value),
            PropKind::Method { key, .. } => !matches!(key, PropKey::Computed(_)),
            PropKind::Shorthand(_) | PropKind::Spread(_) => false,
        }),
        _ => Constant::of(expr).is_some(),
    }
}

/// A numeric literal, written as `-n` when negative. Non-finite results and
/// `-0` have no literal and are not produced.
fn num_expr(value: f64, span: Span) -> Option<Expr> {
    if !value.is_finite() || (value == 0.0 && value.is_sign_negative()) {
        return None;
    }
    if value < 0.0 {
        return Some(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Minus,
                arg: Box::new(Expr::num(-value, span)),
            },
            span,
        ));
    }
    Some(Expr::num(value, span))
}

fn bool_expr(value: bool, span: Span) -> Expr {
    Expr::new(ExprKind::Bool(value), span)
}

fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
}

fn to_uint32(n: f64) -> u32 {
    to_int32(n) as u32
}

fn fold(expr: &mut Expr) -> Option<Expr> {
    let span = expr.span;
    match &mut expr.kind {
        ExprKind::Unary { op, arg } => {
            let value = Constant::of(arg)?;
            match op {
                UnaryOp::Not => Some(bool_expr(!value.truthy(), span)),
                UnaryOp::TypeOf => Some(Expr::str(value.type_of(), span)),
                UnaryOp::BitNot => num_expr(f64::from(!to_int32(value.to_number()?)), span),
                _ => None,
            }
        }
        ExprKind::Binary { op, left, right } => {
            let op = *op;
            if op.is_logical() {
                return fold_logical(op, left, right);
            }
            let l = Constant::of(left)?;
            let r = Constant::of(right)?;
            fold_binary(op, &l, &r, span)
        }
        ExprKind::Conditional { test, cons, alt } => match truthiness(test)? {
            true => Some(std::mem::take(&mut **cons)),
            false => Some(std::mem::take(&mut **alt)),
        },
        _ => None,
    }
}

fn fold_logical(op: BinaryOp, left: &mut Expr, right: &mut Expr) -> Option<Expr> {
    let value = Constant::of(left)?;
    let take_left = match op {
        BinaryOp::LogicalAnd => !value.truthy(),
        BinaryOp::LogicalOr => value.truthy(),
        _ => !matches!(value, Constant::Null | Constant::Undefined),
    };
    Some(if take_left {
        std::mem::take(left)
    } else {
        std::mem::take(right)
    })
}

fn fold_binary(op: BinaryOp, l: &Constant, r: &Constant, span: Span) -> Option<Expr> {
    use BinaryOp::*;
    match op {
        Add => match (l, r) {
            (Constant::Str(_), _) | (_, Constant::Str(_)) => {
                let joined = l.to_js_string()? + &r.to_js_string()?;
                Some(Expr::str(joined, span))
            }
            _ => num_expr(l.to_number()? + r.to_number()?, span),
        },
        Sub | Mul | Div | Mod | Exp => {
            let (a, b) = (number_operand(l)?, number_operand(r)?);
            let value = match op {
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                Mod => a % b,
                _ => a.powf(b),
            };
            num_expr(value, span)
        }
        BitOr | BitAnd | BitXor | LShift | RShift | ZeroFillRShift => {
            let (a, b) = (number_operand(l)?, number_operand(r)?);
            let shift = to_uint32(b) & 31;
            let value = match op {
                BitOr => f64::from(to_int32(a) | to_int32(b)),
                BitAnd => f64::from(to_int32(a) & to_int32(b)),
                BitXor => f64::from(to_int32(a) ^ to_int32(b)),
                LShift => f64::from(to_int32(a).wrapping_shl(shift)),
                RShift => f64::from(to_int32(a) >> shift),
                _ => f64::from(to_uint32(a) >> shift),
            };
            num_expr(value, span)
        }
        EqEqEq | NotEqEq => {
            let equal = strict_equals(l, r);
            Some(bool_expr(if op == EqEqEq { equal } else { !equal }, span))
        }
        EqEq | NotEq => {
            let equal = loose_equals(l, r)?;
            Some(bool_expr(if op == EqEq { equal } else { !equal }, span))
        }
        Lt | LtEq | Gt | GtEq => {
            let ordering = match (l, r) {
                (Constant::Str(a), Constant::Str(b)) => {
                    // JavaScript compares strings by UTF-16 code units.
                    Some(a.encode_utf16().cmp(b.encode_utf16()))
                }
                _ => number_operand(l)?.partial_cmp(&number_operand(r)?),
            };
            let result = match ordering {
                None => false,
                Some(ordering) => match op {
                    Lt => ordering.is_lt(),
                    LtEq => ordering.is_le(),
                    Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
            };
            Some(bool_expr(result, span))
        }
        _ => None,
    }
}

/// Numeric operands only; strings are left to the runtime's parser.
fn number_operand(c: &Constant) -> Option<f64> {
    match c {
        Constant::Num(n) => Some(*n),
        Constant::Bool(_) | Constant::Null => c.to_number(),
        _ => None,
    }
}

fn strict_equals(l: &Constant, r: &Constant) -> bool {
    match (l, r) {
        (Constant::Num(a), Constant::Num(b)) => a == b,
        (Constant::Str(a), Constant::Str(b)) => a == b,
        (Constant::Bool(a), Constant::Bool(b)) => a == b,
        (Constant::Null, Constant::Null) | (Constant::Undefined, Constant::Undefined) => true,
        _ => false,
    }
}

fn loose_equals(l: &Constant, r: &Constant) -> Option<bool> {
    use Constant::*;
    match (l, r) {
        (Null | Undefined, Null | Undefined) => Some(true),
        (Null | Undefined, _) | (_, Null | Undefined) => Some(false),
        (Num(_), Num(_)) | (Str(_), Str(_)) | (Bool(_), Bool(_)) => Some(strict_equals(l, r)),
        (Num(a), Bool(_)) => Some(Some(*a) == r.to_number()),
        (Bool(_), Num(b)) => Some(l.to_number() == Some(*b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::num(n, Span::default())
    }

    fn binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
        Expr::binary(op, l, r, Span::default())
    }

    fn folded(mut expr: Expr) -> Expr {
        Compressor.visit_expr(&mut expr);
        expr
    }

    #[test]
    fn test_number_to_string_ranges() {
        assert_eq!(number_to_string(3.0).as_deref(), Some("3"));
        assert_eq!(number_to_string(0.25).as_deref(), Some("0.25"));
        assert_eq!(number_to_string(1e21), None);
        assert_eq!(number_to_string(1e-7), None);
        assert_eq!(number_to_string(f64::NAN), None);
    }

    #[test]
    fn test_negative_result_is_unary_minus() {
        let expr = folded(binary(BinaryOp::Sub, num(1.0), num(3.0)));
        assert!(matches!(
            expr.kind,
            ExprKind::Unary {
                op: UnaryOp::Minus,
                ..
            }
        ));
        assert_eq!(Constant::of(&expr), Some(Constant::Num(-2.0)));
    }

    #[test]
    fn test_division_by_zero_is_not_folded() {
        let expr = folded(binary(BinaryOp::Div, num(1.0), num(0.0)));
        assert!(matches!(expr.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_int32_conversions() {
        assert_eq!(to_int32(4294967296.0 + 5.0), 5);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_uint32(-1.0), u32::MAX);
        assert_eq!(to_int32(2147483648.0), i32::MIN);
    }

    #[test]
    fn test_loose_equality() {
        assert_eq!(loose_equals(&Constant::Null, &Constant::Undefined), Some(true));
        assert_eq!(loose_equals(&Constant::Num(1.0), &Constant::Bool(true)), Some(true));
        assert_eq!(loose_equals(&Constant::Num(1.0), &Constant::Str("1".into())), None);
    }
}

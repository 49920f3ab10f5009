//! Expression and pattern emission.
//!
//! Parentheses are derived from operator precedence rather than recorded
//! from the source, so trees built by the transform passes print correctly.

use ecmaform_types::ast::*;

use crate::emitter::Emitter;
use crate::error::{EmitError, EmitResult};

pub(crate) const PREC_SEQUENCE: u8 = 0;
/// Assignment, arrow functions and `yield`.
pub(crate) const PREC_ASSIGN: u8 = 1;
pub(crate) const PREC_CONDITIONAL: u8 = 2;
pub(crate) const PREC_UNARY: u8 = 15;
pub(crate) const PREC_POSTFIX: u8 = 16;
/// `new X` without arguments; also the floor for assignment targets.
pub(crate) const PREC_NEW: u8 = 17;
pub(crate) const PREC_CALL: u8 = 18;
pub(crate) const PREC_PRIMARY: u8 = 19;

/// Binding strength of an expression's outermost operator.
pub(crate) fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Sequence(_) => PREC_SEQUENCE,
        ExprKind::Assign { .. } | ExprKind::Arrow(_) | ExprKind::Yield { .. } => PREC_ASSIGN,
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Unary { .. } | ExprKind::Await(_) => PREC_UNARY,
        ExprKind::Update { prefix: true, .. } => PREC_UNARY,
        ExprKind::Update { prefix: false, .. } => PREC_POSTFIX,
        ExprKind::New { args: None, .. } => PREC_NEW,
        ExprKind::New { .. }
        | ExprKind::Call { .. }
        | ExprKind::Member { .. }
        | ExprKind::TaggedTemplate { .. }
        | ExprKind::OptChain(_) => PREC_CALL,
        ExprKind::Num { value, raw } if is_negative(*value, raw.as_deref()) => PREC_UNARY,
        _ => PREC_PRIMARY,
    }
}

fn is_negative(value: f64, raw: Option<&str>) -> bool {
    match raw {
        Some(raw) => raw.starts_with('-'),
        None => value.is_sign_negative() && value != 0.0,
    }
}

impl Emitter<'_> {
    /// Print `expr`, parenthesized when it binds looser than `min_prec`.
    pub(crate) fn emit_expr(&mut self, expr: &Expr, min_prec: u8) -> EmitResult<()> {
        let parens = self.needs_parens(expr, min_prec);
        self.emit_expr_parens(expr, parens)
    }

    fn emit_expr_parens(&mut self, expr: &Expr, parens: bool) -> EmitResult<()> {
        if !parens {
            return self.emit_expr_inner(expr);
        }
        let no_in = std::mem::replace(&mut self.no_in, false);
        self.write("(");
        let result = self.emit_expr_inner(expr);
        self.write(")");
        self.no_in = no_in;
        result
    }

    fn needs_parens(&self, expr: &Expr, min_prec: u8) -> bool {
        if precedence(expr) < min_prec {
            return true;
        }
        match &expr.kind {
            ExprKind::Function(_) | ExprKind::Class(_) => self.at_stmt_start(),
            ExprKind::Object(_) => self.at_stmt_start() || self.at_arrow_body_start(),
            // `({ a } = b)`: the pattern itself cannot be parenthesized.
            ExprKind::Assign { target, .. } => {
                matches!(target.kind, ExprKind::Object(_))
                    && (self.at_stmt_start() || self.at_arrow_body_start())
            }
            ExprKind::Binary {
                op: BinaryOp::In, ..
            } => self.no_in,
            _ => false,
        }
    }

    fn emit_expr_inner(&mut self, expr: &Expr) -> EmitResult<()> {
        self.mark(expr.span, expr.as_ident());
        match &expr.kind {
            ExprKind::Ident(name) => self.word(name),
            ExprKind::This => self.word("this"),
            ExprKind::Super => self.word("super"),
            ExprKind::Null => self.word("null"),
            ExprKind::Bool(value) => self.word(if *value { "true" } else { "false" }),
            ExprKind::Num { value, raw } => {
                let text = match raw {
                    Some(raw) => raw.clone(),
                    None => format_number(*value),
                };
                if text.starts_with('-') {
                    self.op(&text);
                } else {
                    self.word(&text);
                }
            }
            ExprKind::BigInt(raw) => self.word(raw),
            ExprKind::Str { value, raw } => match raw {
                Some(raw) => self.write(raw),
                None => self.write(&quote_str(value)),
            },
            ExprKind::Regex { pattern, flags } => {
                self.op("/");
                self.write(pattern);
                self.write("/");
                self.write(flags);
            }
            ExprKind::Template(template) => self.emit_template(template)?,
            ExprKind::TaggedTemplate { tag, template } => {
                self.emit_callee(tag)?;
                self.emit_template(template)?;
            }
            ExprKind::Array(elems) => {
                self.write("[");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    if let Some(elem) = elem {
                        self.emit_arg(elem)?;
                    }
                }
                if matches!(elems.last(), Some(None)) {
                    self.write(",");
                }
                self.write("]");
            }
            ExprKind::Object(props) => self.emit_object(props)?,
            ExprKind::Function(function) => self.emit_function(function)?,
            ExprKind::Arrow(arrow) => self.emit_arrow(arrow)?,
            ExprKind::Class(class) => self.emit_class(class)?,
            ExprKind::Unary { op, arg } => {
                match op {
                    UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete => {
                        self.word(op.as_str());
                        self.space();
                    }
                    _ => self.op(op.as_str()),
                }
                self.emit_expr(arg, PREC_UNARY)?;
            }
            ExprKind::Update { op, prefix, arg } => {
                if *prefix {
                    self.op(op.as_str());
                    self.emit_expr(arg, PREC_NEW)?;
                } else {
                    self.emit_expr(arg, PREC_NEW)?;
                    self.op(op.as_str());
                }
            }
            ExprKind::Binary { op, left, right } => self.emit_binary(*op, left, right)?,
            ExprKind::Assign { op, target, value } => {
                self.emit_expr(target, PREC_NEW)?;
                self.space();
                self.op(op.as_str());
                self.space();
                self.emit_expr(value, PREC_ASSIGN)?;
            }
            ExprKind::Member {
                object,
                prop,
                optional,
            } => {
                self.emit_member_object(object)?;
                self.emit_member_prop(prop, *optional)?;
            }
            ExprKind::Call {
                callee,
                args,
                optional,
                ..
            } => {
                self.emit_callee(callee)?;
                if *optional {
                    self.write("?.");
                }
                self.emit_args(args)?;
            }
            ExprKind::New { callee, args, .. } => {
                self.word("new");
                self.space();
                let parens = self.needs_parens(callee, PREC_CALL) || contains_call(callee);
                self.emit_expr_parens(callee, parens)?;
                if let Some(args) = args {
                    self.emit_args(args)?;
                }
            }
            ExprKind::Conditional { test, cons, alt } => {
                self.emit_expr(test, PREC_CONDITIONAL + 1)?;
                self.space();
                self.write("?");
                self.space();
                self.emit_expr(cons, PREC_ASSIGN)?;
                self.space();
                self.write(":");
                self.space();
                self.emit_expr(alt, PREC_ASSIGN)?;
            }
            ExprKind::Sequence(exprs) => {
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    self.emit_expr(expr, PREC_ASSIGN)?;
                }
            }
            ExprKind::OptChain(chain) => self.emit_expr_inner(chain)?,
            ExprKind::Yield { arg, delegate } => {
                self.word("yield");
                if *delegate {
                    self.write("*");
                }
                if let Some(arg) = arg {
                    self.space();
                    self.emit_expr(arg, PREC_ASSIGN)?;
                }
            }
            ExprKind::Await(arg) => {
                self.word("await");
                self.space();
                self.emit_expr(arg, PREC_UNARY)?;
            }
            ExprKind::MetaProp { meta, prop } => {
                self.word(meta);
                self.write(".");
                self.word(prop);
            }
            ExprKind::TsAs { .. } | ExprKind::TsSatisfies { .. } | ExprKind::TsNonNull(_) => {
                return Err(EmitError::UnexpectedNode {
                    what: "TypeScript expression",
                    span: expr.span,
                })
            }
            ExprKind::Invalid => {
                return Err(EmitError::UnexpectedNode {
                    what: "invalid expression",
                    span: expr.span,
                })
            }
        }
        Ok(())
    }

    fn emit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> EmitResult<()> {
        let prec = op.precedence();
        let (left_min, right_min) = if op.is_right_associative() {
            (prec + 1, prec)
        } else {
            (prec, prec + 1)
        };
        let left_parens = self.needs_parens(left, left_min)
            || mixes_nullish(op, left)
            // `(-a) ** b`: a unary operand of `**` must be parenthesized.
            || (op == BinaryOp::Exp && precedence(left) == PREC_UNARY);
        self.emit_expr_parens(left, left_parens)?;
        match op {
            BinaryOp::In | BinaryOp::InstanceOf => {
                self.space();
                self.word(op.as_str());
                self.space();
            }
            _ => {
                self.space();
                self.op(op.as_str());
                self.space();
            }
        }
        let right_parens = self.needs_parens(right, right_min) || mixes_nullish(op, right);
        self.emit_expr_parens(right, right_parens)
    }

    fn emit_member_object(&mut self, object: &Expr) -> EmitResult<()> {
        let parens = self.needs_parens(object, PREC_CALL)
            || matches!(object.kind, ExprKind::OptChain(_))
            || is_bare_integer(object);
        self.emit_expr_parens(object, parens)
    }

    fn emit_member_prop(&mut self, prop: &MemberProp, optional: bool) -> EmitResult<()> {
        match prop {
            MemberProp::Ident(id) => {
                self.write(if optional { "?." } else { "." });
                self.word(&id.name);
            }
            MemberProp::PrivateName(id) => {
                self.write(if optional { "?.#" } else { ".#" });
                self.write(&id.name);
            }
            MemberProp::Computed(key) => {
                self.write(if optional { "?.[" } else { "[" });
                let no_in = std::mem::replace(&mut self.no_in, false);
                let result = self.emit_expr(key, PREC_SEQUENCE);
                self.no_in = no_in;
                result?;
                self.write("]");
            }
        }
        Ok(())
    }

    fn emit_callee(&mut self, callee: &Expr) -> EmitResult<()> {
        let parens =
            self.needs_parens(callee, PREC_CALL) || matches!(callee.kind, ExprKind::OptChain(_));
        self.emit_expr_parens(callee, parens)
    }

    fn emit_args(&mut self, args: &[ExprOrSpread]) -> EmitResult<()> {
        let no_in = std::mem::replace(&mut self.no_in, false);
        self.write("(");
        let mut result = Ok(());
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            result = self.emit_arg(arg);
            if result.is_err() {
                break;
            }
        }
        self.write(")");
        self.no_in = no_in;
        result
    }

    fn emit_arg(&mut self, arg: &ExprOrSpread) -> EmitResult<()> {
        if arg.spread {
            self.write("...");
        }
        self.emit_expr(&arg.expr, PREC_ASSIGN)
    }

    fn emit_template(&mut self, template: &Template) -> EmitResult<()> {
        self.write("`");
        for (i, quasi) in template.quasis.iter().enumerate() {
            self.write(&quasi.raw);
            if let Some(expr) = template.exprs.get(i) {
                self.write("${");
                self.emit_expr(expr, PREC_SEQUENCE)?;
                self.write("}");
            }
        }
        self.write("`");
        Ok(())
    }

    fn emit_arrow(&mut self, arrow: &ArrowFunction) -> EmitResult<()> {
        if arrow.is_async {
            self.word("async");
            self.space();
        }
        self.emit_params(&arrow.params)?;
        self.space();
        self.write("=>");
        self.space();
        match &arrow.body {
            ArrowBody::Block(block) => self.emit_block(block),
            ArrowBody::Expr(body) => {
                self.arrow_body_start = Some(self.out.len());
                self.emit_expr(body, PREC_ASSIGN)
            }
        }
    }

    fn emit_object(&mut self, props: &[Prop]) -> EmitResult<()> {
        if props.is_empty() {
            self.write("{}");
            return Ok(());
        }
        let multiline = props.iter().any(has_body);
        self.write("{");
        if multiline {
            self.indent();
        }
        for (i, prop) in props.iter().enumerate() {
            if multiline {
                if i > 0 {
                    self.write(",");
                }
                self.newline();
            } else if i > 0 {
                self.comma();
            } else {
                self.space();
            }
            self.mark(prop.span, None);
            match &prop.kind {
                PropKind::KeyValue { key, value } => {
                    self.emit_prop_key(key)?;
                    self.write(":");
                    self.space();
                    self.emit_expr(value, PREC_ASSIGN)?;
                }
                PropKind::Shorthand(id) => self.word(&id.name),
                PropKind::Method {
                    key,
                    function,
                    kind,
                } => self.emit_method(key, function, *kind, false)?,
                PropKind::Spread(expr) => {
                    self.write("...");
                    self.emit_expr(expr, PREC_ASSIGN)?;
                }
            }
        }
        if multiline {
            self.dedent();
            self.newline();
        } else {
            self.space();
        }
        self.write("}");
        Ok(())
    }

    pub(crate) fn emit_prop_key(&mut self, key: &PropKey) -> EmitResult<()> {
        match key {
            PropKey::Ident(id) => self.word(&id.name),
            PropKey::Str(lit) => match &lit.raw {
                Some(raw) => self.write(raw),
                None => self.write(&quote_str(&lit.value)),
            },
            PropKey::Num { value, raw } => match raw {
                Some(raw) => self.word(raw),
                None => self.word(&format_number(*value)),
            },
            PropKey::Computed(expr) => {
                self.write("[");
                self.emit_expr(expr, PREC_ASSIGN)?;
                self.write("]");
            }
            PropKey::PrivateName(id) => {
                self.write("#");
                self.write(&id.name);
            }
        }
        Ok(())
    }

    pub(crate) fn emit_pattern(&mut self, pattern: &Pattern) -> EmitResult<()> {
        match &pattern.kind {
            PatternKind::Ident(name) => {
                self.mark(pattern.span, Some(name));
                self.word(name);
            }
            PatternKind::Array(elems) => {
                self.write("[");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    if let Some(elem) = elem {
                        self.emit_pattern(elem)?;
                    }
                }
                if matches!(elems.last(), Some(None)) {
                    self.write(",");
                }
                self.write("]");
            }
            PatternKind::Object(props) => {
                if props.is_empty() {
                    self.write("{}");
                    return Ok(());
                }
                self.write("{");
                self.space();
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    match &prop.kind {
                        ObjectPatPropKind::KeyValue { key, value } => {
                            self.emit_prop_key(key)?;
                            self.write(":");
                            self.space();
                            self.emit_pattern(value)?;
                        }
                        ObjectPatPropKind::Shorthand { name, default } => {
                            self.word(&name.name);
                            if let Some(default) = default {
                                self.space();
                                self.op("=");
                                self.space();
                                self.emit_expr(default, PREC_ASSIGN)?;
                            }
                        }
                        ObjectPatPropKind::Rest(rest) => {
                            self.write("...");
                            self.emit_pattern(rest)?;
                        }
                    }
                }
                self.space();
                self.write("}");
            }
            PatternKind::Assign { left, right } => {
                self.emit_pattern(left)?;
                self.space();
                self.op("=");
                self.space();
                self.emit_expr(right, PREC_ASSIGN)?;
            }
            PatternKind::Rest(inner) => {
                self.write("...");
                self.emit_pattern(inner)?;
            }
            PatternKind::Expr(expr) => self.emit_expr(expr, PREC_NEW)?,
        }
        Ok(())
    }
}

/// `??` may not be mixed with `||` or `&&` without parentheses.
fn mixes_nullish(op: BinaryOp, operand: &Expr) -> bool {
    let ExprKind::Binary { op: inner, .. } = &operand.kind else {
        return false;
    };
    let is_and_or = |op: BinaryOp| matches!(op, BinaryOp::LogicalOr | BinaryOp::LogicalAnd);
    (op == BinaryOp::NullishCoalescing && is_and_or(*inner))
        || (is_and_or(op) && *inner == BinaryOp::NullishCoalescing)
}

/// `new (a.b())()`: a call inside a `new` callee must be parenthesized.
fn contains_call(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { .. } | ExprKind::OptChain(_) => true,
        ExprKind::Member { object, .. } => contains_call(object),
        ExprKind::TaggedTemplate { tag, .. } => contains_call(tag),
        _ => false,
    }
}

/// `1.toString()` would lex as a malformed number.
fn is_bare_integer(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Num { value, raw } => {
            let text = match raw {
                Some(raw) => raw.clone(),
                None => format_number(*value),
            };
            text.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

/// Whether an object property holds a function body, directly or in a
/// nested literal, which puts the object on multiple lines.
fn has_body(prop: &Prop) -> bool {
    match &prop.kind {
        PropKind::Method { .. } => true,
        PropKind::KeyValue { value, .. } | PropKind::Spread(value) => spans_lines(value),
        PropKind::Shorthand(_) => false,
    }
}

fn spans_lines(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Function(_) | ExprKind::Class(_) => true,
        ExprKind::Arrow(arrow) => matches!(arrow.body, ArrowBody::Block(_)),
        ExprKind::Object(props) => props.iter().any(has_body),
        ExprKind::Array(elems) => elems.iter().flatten().any(|elem| spans_lines(&elem.expr)),
        _ => false,
    }
}

/// A double-quoted JavaScript string literal for `value`.
pub fn quote_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecmaform_types::Span;

    #[test]
    fn test_quote_str_escapes() {
        assert_eq!(quote_str("a\"b"), r#""a\"b""#);
        assert_eq!(quote_str("line\nbreak"), r#""line\nbreak""#);
        assert_eq!(quote_str("\u{0}"), r#""\x00""#);
        assert_eq!(quote_str("\u{2028}"), r#""\u2028""#);
        assert_eq!(quote_str("é"), "\"é\"");
    }

    #[test]
    fn test_precedence_ordering() {
        let s = Span::default();
        let a = || Expr::ident("a", s);
        let assign = Expr::assign(a(), a(), s);
        let add = Expr::binary(BinaryOp::Add, a(), a(), s);
        let call = Expr::call(a(), vec![], s);
        assert!(precedence(&assign) < precedence(&add));
        assert!(precedence(&add) < precedence(&call));
        assert!(precedence(&call) < precedence(&a()));
    }

    #[test]
    fn test_bare_integer_detection() {
        let s = Span::default();
        assert!(is_bare_integer(&Expr::num(1.0, s)));
        assert!(!is_bare_integer(&Expr::num(1.5, s)));
        assert!(!is_bare_integer(&Expr::ident("a", s)));
    }

    #[test]
    fn test_nullish_mixing() {
        let s = Span::default();
        let or = Expr::binary(BinaryOp::LogicalOr, Expr::ident("a", s), Expr::ident("b", s), s);
        assert!(mixes_nullish(BinaryOp::NullishCoalescing, &or));
        assert!(!mixes_nullish(BinaryOp::Add, &or));
    }
}

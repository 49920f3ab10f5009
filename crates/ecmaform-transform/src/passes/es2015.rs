//! ES2015 syntax lowering to ES5.
//!
//! - template literals become string concatenation, tagged templates a call
//!   with a frozen strings array
//! - arrow functions become function expressions; `this` and `arguments`
//!   are captured as `var _this = this` in the enclosing function
//! - shorthand properties and methods become `key: value` / `key: function`
//! - `let`/`const` become `var`, renamed where a block binding would
//!   collide; loops whose bindings are captured by closures run their body
//!   in a per-iteration function (see [`block_scoping`](super::block_scoping))
//! - binary, octal and legacy octal number literals print as decimal, and
//!   strings with `\u{...}` escapes are requoted from their value
//! - default parameters become an `if (x === void 0) x = ...;` prologue and
//!   rest parameters an `Array.prototype.slice.call(arguments, n)`
//! - array spread becomes `[].concat(...)`, which only matches iteration
//!   for arrays; spreading anything else reports a warning
//!
//! Classes, destructuring, generators, `for-of` and spread arguments are
//! left as written. Arrows and methods that use `super` or `new.target`
//! stay unconverted, as do arrows needing a `this` capture where no
//! function body exists to hold it (class field initializers).

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::{ErrorCode, Span};

use super::block_scoping::lower_block_scoping;
use crate::error::{PassResult, TransformError, TransformWarning};
use crate::pass::Pass;
use crate::temps::{edit_arrow_block, prologue_len, NameGen};

const PASS: &str = "es2015";

pub struct Es2015;

impl Pass for Es2015 {
    fn name(&self) -> &'static str {
        PASS
    }

    fn run(&self, mut program: Program, warnings: &mut Vec<TransformWarning>) -> PassResult<Program> {
        let mut names = NameGen::for_program(&mut program);
        lower_block_scoping(&mut program, &mut names, warnings);
        let mut lowering = Lowering {
            names,
            frames: Vec::new(),
            error: None,
            warnings,
        };
        lowering.visit_program(&mut program);
        match lowering.error {
            Some(err) => Err(err),
            None => Ok(program),
        }
    }
}

/// A `this`/`arguments` boundary: a function body, the program, a static
/// block, or a class field initializer.
struct Frame {
    /// A `var _this = this` can be inserted for this frame.
    captures_this: bool,
    captures_arguments: bool,
    /// Converted arrows currently open inside this frame.
    arrow_depth: usize,
    this_name: Option<String>,
    arguments_name: Option<String>,
}

impl Frame {
    fn new(captures_this: bool, captures_arguments: bool) -> Self {
        Self {
            captures_this,
            captures_arguments,
            arrow_depth: 0,
            this_name: None,
            arguments_name: None,
        }
    }
}

struct Lowering<'w> {
    names: NameGen,
    frames: Vec<Frame>,
    error: Option<TransformError>,
    warnings: &'w mut Vec<TransformWarning>,
}

impl Lowering<'_> {
    fn fail(&mut self, message: &str, span: Span) {
        if self.error.is_none() {
            self.error = Some(TransformError::unexpected(PASS, message, span));
        }
    }

    fn capture_this(&mut self) -> Option<String> {
        let frame = self.frames.last_mut()?;
        if frame.arrow_depth == 0 || !frame.captures_this {
            return None;
        }
        if frame.this_name.is_none() {
            frame.this_name = Some(self.names.unique("_this"));
        }
        frame.this_name.clone()
    }

    fn capture_arguments(&mut self) -> Option<String> {
        let frame = self.frames.last_mut()?;
        if frame.arrow_depth == 0 || !frame.captures_arguments {
            return None;
        }
        if frame.arguments_name.is_none() {
            frame.arguments_name = Some(self.names.unique("_arguments"));
        }
        frame.arguments_name.clone()
    }

    /// Whether an arrow can become a function expression here.
    fn arrow_convertible(&mut self, arrow: &mut ArrowFunction) -> bool {
        let mut scan = LexicalScan::default();
        visit::walk_arrow(&mut scan, arrow);
        if scan.uses_super {
            return false;
        }
        let Some(frame) = self.frames.last() else {
            return false;
        };
        (!scan.uses_this || frame.captures_this)
            && (!scan.uses_arguments || frame.captures_arguments)
    }

    fn arrow_to_function(&mut self, arrow: ArrowFunction) -> Function {
        let body = match arrow.body {
            ArrowBody::Block(block) => block,
            ArrowBody::Expr(expr) => {
                let span = expr.span;
                Block {
                    stmts: vec![Stmt::new(StmtKind::Return(Some(*expr)), span)],
                    span,
                }
            }
        };
        let mut function = Function {
            id: None,
            params: arrow.params,
            body: Some(body),
            is_async: arrow.is_async,
            is_generator: false,
            type_params: Vec::new(),
            return_type: None,
            span: arrow.span,
        };
        lower_params(&mut function);
        function
    }

    fn visit_arrow_expr(&mut self, expr: &mut Expr) {
        let span = expr.span;
        let ExprKind::Arrow(arrow) = &mut expr.kind else {
            return;
        };
        if self.arrow_convertible(arrow) {
            if let Some(frame) = self.frames.last_mut() {
                frame.arrow_depth += 1;
            }
            visit::walk_arrow(self, arrow);
            if let Some(frame) = self.frames.last_mut() {
                frame.arrow_depth -= 1;
            }
            if let ExprKind::Arrow(arrow) = std::mem::take(expr).kind {
                let function = self.arrow_to_function(*arrow);
                *expr = Expr::new(ExprKind::Function(Box::new(function)), span);
            }
        } else {
            // Kept arrows are their own capture frame for nested arrows.
            self.frames.push(Frame::new(true, true));
            visit::walk_arrow(self, arrow);
            let frame = self.frames.pop();
            if let Some(frame) = frame {
                if frame.this_name.is_some() || frame.arguments_name.is_some() {
                    edit_arrow_block(arrow, |block| insert_captures(&mut block.stmts, frame, span));
                }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Visitor
// ══════════════════════════════════════════════════════════════════════════════

impl VisitMut for Lowering<'_> {
    fn visit_program(&mut self, program: &mut Program) {
        // Top-level `arguments` is not a binding an arrow can capture.
        self.frames.push(Frame::new(true, false));
        visit::walk_program(self, program);
        if let Some(frame) = self.frames.pop() {
            insert_captures(&mut program.body, frame, program.span);
        }
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if stmt.is_typescript_only() {
            self.fail("TypeScript declaration", stmt.span);
            return;
        }
        visit::walk_stmt(self, stmt);
    }

    fn visit_prop_key(&mut self, key: &mut PropKey) {
        match key {
            PropKey::Num { raw, .. } | PropKey::Str(StrLit { raw, .. }) => {
                if raw.as_deref().is_some_and(needs_requote) {
                    *raw = None;
                }
            }
            _ => visit::walk_prop_key(self, key),
        }
    }

    fn visit_function(&mut self, function: &mut Function) {
        self.frames.push(Frame::new(true, true));
        visit::walk_function(self, function);
        lower_params(function);
        if let Some(frame) = self.frames.pop() {
            if let Some(body) = &mut function.body {
                insert_captures(&mut body.stmts, frame, function.span);
            }
        }
    }

    fn visit_class(&mut self, class: &mut Class) {
        if let Some(super_class) = &mut class.super_class {
            self.visit_expr(super_class);
        }
        for member in &mut class.members {
            match &mut member.kind {
                ClassMemberKind::Method { key, function, .. } => {
                    self.visit_prop_key(key);
                    self.visit_function(function);
                }
                ClassMemberKind::Property { key, value, .. } => {
                    self.visit_prop_key(key);
                    if let Some(value) = value {
                        self.frames.push(Frame::new(false, false));
                        self.visit_expr(value);
                        self.frames.pop();
                    }
                }
                ClassMemberKind::StaticBlock(block) => {
                    self.frames.push(Frame::new(true, false));
                    visit::walk_block(self, block);
                    if let Some(frame) = self.frames.pop() {
                        insert_captures(&mut block.stmts, frame, member.span);
                    }
                }
            }
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        let span = expr.span;
        match &expr.kind {
            ExprKind::This => {
                if let Some(name) = self.capture_this() {
                    *expr = Expr::ident(name, span);
                }
                return;
            }
            ExprKind::Ident(name) if name == "arguments" => {
                if let Some(name) = self.capture_arguments() {
                    *expr = Expr::ident(name, span);
                }
                return;
            }
            ExprKind::Arrow(_) => {
                self.visit_arrow_expr(expr);
                return;
            }
            ExprKind::TsAs { .. } | ExprKind::TsSatisfies { .. } | ExprKind::TsNonNull(_) => {
                self.fail("TypeScript expression", span);
                return;
            }
            ExprKind::Invalid => {
                self.fail("invalid expression", span);
                return;
            }
            ExprKind::Num { raw: Some(raw), .. } | ExprKind::Str { raw: Some(raw), .. }
                if needs_requote(raw) =>
            {
                if let ExprKind::Num { raw, .. } | ExprKind::Str { raw, .. } = &mut expr.kind {
                    *raw = None;
                }
                return;
            }
            _ => {}
        }

        visit::walk_expr(self, expr);

        match &mut expr.kind {
            ExprKind::Object(props) => lower_object_props(props),
            ExprKind::Array(elems) if elems.iter().flatten().any(|e| e.spread) => {
                for elem in elems.iter().flatten().filter(|e| e.spread) {
                    if !matches!(elem.expr.kind, ExprKind::Array(_)) {
                        self.warnings.push(TransformWarning::new(
                            PASS,
                            ErrorCode::SPREAD_ASSUMES_ARRAY,
                            "spread lowered to `concat` assumes an array; other iterables are not expanded",
                            elem.expr.span,
                        ));
                    }
                }
                if let ExprKind::Array(elems) = std::mem::take(expr).kind {
                    *expr = lower_array_spread(elems, span);
                }
            }
            ExprKind::Template(_) => {
                if let ExprKind::Template(template) = std::mem::take(expr).kind {
                    *expr = template_to_concat(template, span);
                }
            }
            ExprKind::TaggedTemplate { .. } => {
                if let ExprKind::TaggedTemplate { tag, template } = std::mem::take(expr).kind {
                    *expr = tagged_template_call(*tag, template, span);
                }
            }
            _ => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Uses of `this`, `arguments` and `super` that belong to the enclosing
/// function: nested arrows are looked through, nested functions are not.
#[derive(Default)]
struct LexicalScan {
    uses_this: bool,
    uses_arguments: bool,
    uses_super: bool,
}

impl VisitMut for LexicalScan {
    fn visit_expr(&mut self, expr: &mut Expr) {
        match &expr.kind {
            ExprKind::This => self.uses_this = true,
            ExprKind::Super => self.uses_super = true,
            ExprKind::Ident(name) if name == "arguments" => self.uses_arguments = true,
            ExprKind::MetaProp { meta, .. } if meta == "new" => self.uses_super = true,
            _ => {}
        }
        visit::walk_expr(self, expr);
    }

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, class: &mut Class) {
        if let Some(super_class) = &mut class.super_class {
            self.visit_expr(super_class);
        }
    }
}

fn uses_super(function: &mut Function) -> bool {
    let mut scan = LexicalScan::default();
    visit::walk_function(&mut scan, function);
    scan.uses_super
}

/// `var _this = this, _arguments = arguments;` after the directive prologue.
fn insert_captures(stmts: &mut Vec<Stmt>, frame: Frame, span: Span) {
    let mut decls = Vec::new();
    if let Some(name) = frame.this_name {
        decls.push(VarDeclarator {
            name: Pattern::ident(name, span),
            type_ann: None,
            definite: false,
            init: Some(Expr::new(ExprKind::This, span)),
            span,
        });
    }
    if let Some(name) = frame.arguments_name {
        decls.push(VarDeclarator {
            name: Pattern::ident(name, span),
            type_ann: None,
            definite: false,
            init: Some(Expr::ident("arguments", span)),
            span,
        });
    }
    if decls.is_empty() {
        return;
    }
    let at = prologue_len(stmts);
    stmts.insert(
        at,
        Stmt::new(
            StmtKind::Var(VarDecl {
                kind: VarKind::Var,
                decls,
                span,
            }),
            span,
        ),
    );
}

/// Move identifier defaults and a trailing identifier rest parameter into
/// the body.
fn lower_params(function: &mut Function) {
    let Some(body) = &mut function.body else {
        return;
    };
    let mut prologue = Vec::new();
    for param in &mut function.params {
        let PatternKind::Assign { left, right } = &mut param.pat.kind else {
            continue;
        };
        let Some(name) = left.as_ident().map(str::to_string) else {
            continue;
        };
        let span = param.span;
        let left_span = left.span;
        let default = std::mem::take(&mut **right);
        param.pat = Pattern::ident(name.clone(), left_span);
        // if (x === void 0) x = default;
        prologue.push(Stmt::new(
            StmtKind::If {
                test: Expr::binary(
                    BinaryOp::EqEqEq,
                    Expr::ident(name.clone(), span),
                    Expr::undefined(span),
                    span,
                ),
                cons: Box::new(Stmt::expr(Expr::assign(
                    Expr::ident(name, span),
                    default,
                    span,
                ))),
                alt: None,
            },
            span,
        ));
    }

    let rest_name = function.params.last().and_then(|param| match &param.pat.kind {
        PatternKind::Rest(inner) => inner.as_ident().map(|name| (name.to_string(), param.span)),
        _ => None,
    });
    if let Some((name, span)) = rest_name {
        function.params.pop();
        let index = function.params.len();
        // var rest = Array.prototype.slice.call(arguments, index);
        let slice = Expr::member(
            Expr::member(Expr::ident("Array", span), "prototype", span),
            "slice",
            span,
        );
        let call = Expr::call(
            Expr::member(slice, "call", span),
            vec![Expr::ident("arguments", span), Expr::num(index as f64, span)],
            span,
        );
        prologue.push(Stmt::new(
            StmtKind::Var(VarDecl {
                kind: VarKind::Var,
                decls: vec![VarDeclarator {
                    name: Pattern::ident(name, span),
                    type_ann: None,
                    definite: false,
                    init: Some(call),
                    span,
                }],
                span,
            }),
            span,
        ));
    }

    let at = prologue_len(&body.stmts);
    body.stmts.splice(at..at, prologue);
}

fn lower_object_props(props: &mut [Prop]) {
    for prop in props.iter_mut() {
        let span = prop.span;
        match &mut prop.kind {
            PropKind::Shorthand(ident) => {
                let key = PropKey::Ident(ident.clone());
                let value = Expr::ident(ident.name.clone(), ident.span);
                prop.kind = PropKind::KeyValue { key, value };
            }
            PropKind::Method {
                function,
                kind: MethodKind::Method,
                ..
            } => {
                if uses_super(function) {
                    continue;
                }
                let placeholder = PropKind::Spread(Expr::default());
                if let PropKind::Method { key, function, .. } =
                    std::mem::replace(&mut prop.kind, placeholder)
                {
                    prop.kind = PropKind::KeyValue {
                        key,
                        value: Expr::new(ExprKind::Function(function), span),
                    };
                }
            }
            _ => {}
        }
    }
}

/// Literal text ES5 cannot read: `0b`/`0o` and legacy octal numbers, and
/// strings with `\u{...}` escapes.
fn needs_requote(raw: &str) -> bool {
    match raw.as_bytes() {
        [b'0', b'b' | b'B' | b'o' | b'O' | b'0'..=b'9', ..] => true,
        _ => raw.contains("\\u{"),
    }
}

/// `[a, ...b, c]` => `[a].concat(b, [c])`; a leading spread uses `[]`.
fn lower_array_spread(elems: Vec<Option<ExprOrSpread>>, span: Span) -> Expr {
    let mut receiver: Option<Expr> = None;
    let mut args: Vec<Expr> = Vec::new();
    let mut group: Vec<Option<ExprOrSpread>> = Vec::new();
    let flush = |group: &mut Vec<Option<ExprOrSpread>>,
                     receiver: &mut Option<Expr>,
                     args: &mut Vec<Expr>| {
        if group.is_empty() {
            return;
        }
        let array = Expr::new(ExprKind::Array(std::mem::take(group)), span);
        if receiver.is_none() && args.is_empty() {
            *receiver = Some(array);
        } else {
            args.push(array);
        }
    };
    for elem in elems {
        match elem {
            Some(ExprOrSpread { spread: true, expr }) => {
                flush(&mut group, &mut receiver, &mut args);
                args.push(expr);
            }
            other => group.push(other),
        }
    }
    flush(&mut group, &mut receiver, &mut args);
    let receiver = receiver.unwrap_or_else(|| Expr::new(ExprKind::Array(Vec::new()), span));
    Expr::call(Expr::member(receiver, "concat", span), args, span)
}

/// `` `a${b}c` `` => `"a" + b + "c"`. The leading string is kept even when
/// empty so the result is always a string.
fn template_to_concat(template: Template, span: Span) -> Expr {
    let mut parts: Vec<Expr> = Vec::with_capacity(template.quasis.len() + template.exprs.len());
    let mut exprs = template.exprs.into_iter();
    for (i, quasi) in template.quasis.into_iter().enumerate() {
        let cooked = quasi.cooked.unwrap_or_default();
        if i == 0 || !cooked.is_empty() {
            parts.push(Expr::str(cooked, quasi.span));
        }
        if let Some(expr) = exprs.next() {
            parts.push(expr);
        }
    }
    let mut parts = parts.into_iter();
    let first = parts.next().unwrap_or_else(|| Expr::str("", span));
    parts.fold(first, |acc, part| Expr::binary(BinaryOp::Add, acc, part, span))
}

/// `` tag`a${x}` `` => `tag(Object.freeze(Object.defineProperties(["a", ""],
/// { raw: { value: Object.freeze(["a", ""]) } })), x)`
fn tagged_template_call(tag: Expr, template: Template, span: Span) -> Expr {
    let freeze = |array: Expr| {
        Expr::call(
            Expr::member(Expr::ident("Object", span), "freeze", span),
            vec![array],
            span,
        )
    };
    let cooked = template
        .quasis
        .iter()
        .map(|q| {
            Some(ExprOrSpread::expr(match &q.cooked {
                Some(value) => Expr::str(value.clone(), q.span),
                None => Expr::undefined(q.span),
            }))
        })
        .collect();
    let raw = template
        .quasis
        .iter()
        .map(|q| Some(ExprOrSpread::expr(Expr::str(q.raw.clone(), q.span))))
        .collect();
    let raw_descriptor = Expr::new(
        ExprKind::Object(vec![Prop {
            kind: PropKind::KeyValue {
                key: PropKey::Ident(Ident::new("raw", span)),
                value: Expr::new(
                    ExprKind::Object(vec![Prop {
                        kind: PropKind::KeyValue {
                            key: PropKey::Ident(Ident::new("value", span)),
                            value: freeze(Expr::new(ExprKind::Array(raw), span)),
                        },
                        span,
                    }]),
                    span,
                ),
            },
            span,
        }]),
        span,
    );
    let strings = freeze(Expr::call(
        Expr::member(Expr::ident("Object", span), "defineProperties", span),
        vec![Expr::new(ExprKind::Array(cooked), span), raw_descriptor],
        span,
    ));
    let mut args = vec![strings];
    args.extend(template.exprs);
    Expr::call(tag, args, span)
}

//! AST node types for JavaScript and the supported TypeScript subset.
//!
//! Every node carries a [`Span`]. Children are owned exclusively (`Box`/`Vec`),
//! so the tree has no sharing and no cycles. Nodes synthesized by transforms
//! reuse the span of the node they replace, which keeps each child's span
//! inside its parent's.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// Whether the source was parsed as a script or an ES module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Script,
    Module,
}

/// A complete program: the root of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub kind: ProgramKind,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A string literal outside expression position (module specifiers).
#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    pub value: String,
    /// Source text including quotes, when the literal came from source.
    pub raw: Option<String>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// An expression statement spanning its expression.
    pub fn expr(expr: Expr) -> Self {
        let span = expr.span;
        Self::new(StmtKind::Expr(Box::new(expr)), span)
    }

    /// Returns `true` for a `"use strict"`-style directive string statement.
    pub fn is_directive(&self) -> bool {
        matches!(&self.kind, StmtKind::Expr(e) if matches!(e.kind, ExprKind::Str { .. }))
    }

    /// Returns `true` for nodes that only exist in TypeScript.
    pub fn is_typescript_only(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::TsInterface(_)
                | StmtKind::TsTypeAlias(_)
                | StmtKind::TsEnum(_)
                | StmtKind::TsDeclare(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Box<Expr>),
    Var(VarDecl),
    Function(Box<Function>),
    Class(Box<Class>),
    Block(Block),
    Empty,
    If {
        test: Expr,
        cons: Box<Stmt>,
        alt: Option<Box<Stmt>>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
        is_await: bool,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },
    Return(Option<Expr>),
    Break(Option<Ident>),
    Continue(Option<Ident>),
    Throw(Expr),
    Try {
        block: Block,
        handler: Option<CatchClause>,
        finalizer: Option<Block>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        label: Ident,
        body: Box<Stmt>,
    },
    Debugger,
    Import(ImportDecl),
    Export(ExportDecl),
    // ── TypeScript ──
    TsInterface(TsInterfaceDecl),
    TsTypeAlias(TsTypeAliasDecl),
    TsEnum(TsEnumDecl),
    /// `declare ...` ambient declaration.
    TsDeclare(Box<Stmt>),
}

/// `{ statements... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Let => "let",
            Self::Const => "const",
        }
    }
}

/// `var|let|const a = 1, b`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub decls: Vec<VarDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub name: Pattern,
    pub type_ann: Option<TsType>,
    /// TypeScript definite assignment `let x!: T`.
    pub definite: bool,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var(VarDecl),
    Expr(Expr),
}

/// Left side of `for-in` / `for-of`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForHead {
    Var(VarDecl),
    Pattern(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ── Modules ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: StrLit,
    /// TypeScript `import type`.
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import x from "m"`
    Default(Ident),
    /// `import * as ns from "m"`
    Namespace(Ident),
    /// `import { imported as local } from "m"`
    Named {
        imported: Option<Ident>,
        local: Ident,
        type_only: bool,
    },
}

impl ImportSpecifier {
    pub fn local(&self) -> &Ident {
        match self {
            Self::Default(local) | Self::Namespace(local) | Self::Named { local, .. } => local,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// `export var|function|class|interface ...`
    Decl(Box<Stmt>),
    /// `export default ...`
    Default(DefaultExport),
    /// `export { a, b as c } [from "m"]`
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<StrLit>,
        type_only: bool,
    },
    /// `export * [as ns] from "m"`
    All {
        exported: Option<Ident>,
        source: StrLit,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultExport {
    Expr(Box<Expr>),
    Function(Box<Function>),
    Class(Box<Class>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Ident,
    pub exported: Option<Ident>,
    pub type_only: bool,
    pub span: Span,
}

impl ExportSpecifier {
    /// The name visible to importers.
    pub fn exported_name(&self) -> &str {
        self.exported.as_ref().unwrap_or(&self.local).name.as_str()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions & Classes
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<Ident>,
    pub params: Vec<Param>,
    /// `None` for TypeScript overload signatures and ambient declarations.
    pub body: Option<Block>,
    pub is_async: bool,
    pub is_generator: bool,
    pub type_params: Vec<TsTypeParam>,
    pub return_type: Option<TsType>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Defaults are `PatternKind::Assign`, rest parameters `PatternKind::Rest`.
    pub pat: Pattern,
    pub type_ann: Option<TsType>,
    /// TypeScript optional parameter `x?`.
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Param>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub type_params: Vec<TsTypeParam>,
    pub return_type: Option<TsType>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Block(Block),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<Ident>,
    pub super_class: Option<Box<Expr>>,
    pub members: Vec<ClassMember>,
    pub type_params: Vec<TsTypeParam>,
    pub implements: Vec<TsType>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMemberKind {
    Method {
        key: PropKey,
        function: Box<Function>,
        kind: MethodKind,
        is_static: bool,
        accessibility: Option<Accessibility>,
    },
    Property {
        key: PropKey,
        value: Option<Expr>,
        is_static: bool,
        type_ann: Option<TsType>,
        accessibility: Option<Accessibility>,
        readonly: bool,
        optional: bool,
        /// TypeScript `declare` field, removed with the types.
        declare: bool,
    },
    StaticBlock(Block),
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Default for Expr {
    /// A placeholder used while a node is temporarily moved out of the tree.
    fn default() -> Self {
        Self::new(ExprKind::Invalid, Span::default())
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    /// A synthesized number literal (no raw text).
    pub fn num(value: f64, span: Span) -> Self {
        Self::new(ExprKind::Num { value, raw: None }, span)
    }

    /// A synthesized string literal (no raw text).
    pub fn str(value: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::Str {
                value: value.into(),
                raw: None,
            },
            span,
        )
    }

    /// `void 0`
    pub fn undefined(span: Span) -> Self {
        Self::new(
            ExprKind::Unary {
                op: UnaryOp::Void,
                arg: Box::new(Self::num(0.0, span)),
            },
            span,
        )
    }

    /// `object.name`
    pub fn member(object: Expr, name: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::Member {
                object: Box::new(object),
                prop: MemberProp::Ident(Ident::new(name, span)),
                optional: false,
            },
            span,
        )
    }

    /// `callee(args...)`
    pub fn call(callee: Expr, args: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args: args.into_iter().map(ExprOrSpread::expr).collect(),
                optional: false,
                type_args: Vec::new(),
            },
            span,
        )
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// `target = value`
    pub fn assign(target: Expr, value: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Assign {
                op: AssignOp::Assign,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Returns `true` for `this` and plain identifiers: re-reading them has no
    /// side effects, so lowering can duplicate them instead of using a temp.
    pub fn is_simple_reference(&self) -> bool {
        matches!(self.kind, ExprKind::Ident(_) | ExprKind::This)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(String),
    This,
    Super,
    Null,
    Bool(bool),
    Num {
        value: f64,
        raw: Option<String>,
    },
    /// Raw digits including the `n` suffix.
    BigInt(String),
    Str {
        value: String,
        raw: Option<String>,
    },
    Regex {
        pattern: String,
        flags: String,
    },
    Template(Template),
    TaggedTemplate {
        tag: Box<Expr>,
        template: Template,
    },
    /// Elements; `None` is a hole.
    Array(Vec<Option<ExprOrSpread>>),
    Object(Vec<Prop>),
    Function(Box<Function>),
    Arrow(Box<ArrowFunction>),
    Class(Box<Class>),
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Destructuring assignment targets are array/object literals.
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        prop: MemberProp,
        /// This link is written `?.`.
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<ExprOrSpread>,
        /// This link is written `?.()`.
        optional: bool,
        type_args: Vec<TsType>,
    },
    /// `new callee(args)`; `args` is `None` for `new X` without parentheses.
    New {
        callee: Box<Expr>,
        args: Option<Vec<ExprOrSpread>>,
        type_args: Vec<TsType>,
    },
    Conditional {
        test: Box<Expr>,
        cons: Box<Expr>,
        alt: Box<Expr>,
    },
    Sequence(Vec<Expr>),
    /// Marks the extent of an optional chain: `a?.b.c` short-circuits up to
    /// here, so `(a?.b).c` and `a?.b.c` differ.
    OptChain(Box<Expr>),
    Yield {
        arg: Option<Box<Expr>>,
        delegate: bool,
    },
    Await(Box<Expr>),
    /// `new.target`, `import.meta`
    MetaProp {
        meta: String,
        prop: String,
    },
    // ── TypeScript ──
    TsAs {
        expr: Box<Expr>,
        ty: TsType,
    },
    TsSatisfies {
        expr: Box<Expr>,
        ty: TsType,
    },
    TsNonNull(Box<Expr>),
    /// Placeholder left behind by `std::mem::take`; never produced by the
    /// parser and rejected by the emitter.
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprOrSpread {
    pub spread: bool,
    pub expr: Expr,
}

impl ExprOrSpread {
    pub fn expr(expr: Expr) -> Self {
        Self {
            spread: false,
            expr,
        }
    }

    pub fn spread(expr: Expr) -> Self {
        Self { spread: true, expr }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Always one more quasi than expressions.
    pub quasis: Vec<TemplateElement>,
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateElement {
    /// `None` when the raw text contains an invalid escape (tagged templates only).
    pub cooked: Option<String>,
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Ident(Ident),
    PrivateName(Ident),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub kind: PropKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKind {
    KeyValue {
        key: PropKey,
        value: Expr,
    },
    /// `{ a }`
    Shorthand(Ident),
    Method {
        key: PropKey,
        function: Box<Function>,
        kind: MethodKind,
    },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Ident(Ident),
    Str(StrLit),
    Num { value: f64, raw: Option<String> },
    Computed(Box<Expr>),
    PrivateName(Ident),
}

impl PropKey {
    /// Static name of the key, if it has one.
    pub fn static_name(&self) -> Option<String> {
        match self {
            Self::Ident(id) => Some(id.name.clone()),
            Self::Str(s) => Some(s.value.clone()),
            Self::Num { value, .. } => Some(format_number(*value)),
            Self::Computed(_) | Self::PrivateName(_) => None,
        }
    }
}

/// Format a number the way `String(n)` does for the finite values the
/// engine synthesizes.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e21 {
        return format!("{}", value as i128);
    }
    format!("{value}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minus => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::BitNot => "~",
            Self::TypeOf => "typeof",
            Self::Void => "void",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LShift,
    RShift,
    ZeroFillRShift,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    BitOr,
    BitXor,
    BitAnd,
    In,
    InstanceOf,
    LogicalOr,
    LogicalAnd,
    NullishCoalescing,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::EqEqEq => "===",
            Self::NotEqEq => "!==",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::ZeroFillRShift => ">>>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Exp => "**",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
            Self::In => "in",
            Self::InstanceOf => "instanceof",
            Self::LogicalOr => "||",
            Self::LogicalAnd => "&&",
            Self::NullishCoalescing => "??",
        }
    }

    /// Binding power, higher binds tighter. Shared by the parser's
    /// precedence climbing and the emitter's parenthesization.
    pub fn precedence(self) -> u8 {
        match self {
            Self::NullishCoalescing => 3,
            Self::LogicalOr => 4,
            Self::LogicalAnd => 5,
            Self::BitOr => 6,
            Self::BitXor => 7,
            Self::BitAnd => 8,
            Self::EqEq | Self::NotEq | Self::EqEqEq | Self::NotEqEq => 9,
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq | Self::In | Self::InstanceOf => 10,
            Self::LShift | Self::RShift | Self::ZeroFillRShift => 11,
            Self::Add | Self::Sub => 12,
            Self::Mul | Self::Div | Self::Mod => 13,
            Self::Exp => 14,
        }
    }

    pub fn is_right_associative(self) -> bool {
        self == Self::Exp
    }

    pub fn is_logical(self) -> bool {
        matches!(
            self,
            Self::LogicalOr | Self::LogicalAnd | Self::NullishCoalescing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    LShiftAssign,
    RShiftAssign,
    ZeroFillRShiftAssign,
    BitOrAssign,
    BitXorAssign,
    BitAndAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::ModAssign => "%=",
            Self::ExpAssign => "**=",
            Self::LShiftAssign => "<<=",
            Self::RShiftAssign => ">>=",
            Self::ZeroFillRShiftAssign => ">>>=",
            Self::BitOrAssign => "|=",
            Self::BitXorAssign => "^=",
            Self::BitAndAssign => "&=",
            Self::AndAssign => "&&=",
            Self::OrAssign => "||=",
            Self::NullishAssign => "??=",
        }
    }

    /// The logical operator behind `&&=`, `||=` and `??=`.
    pub fn logical_op(self) -> Option<BinaryOp> {
        match self {
            Self::AndAssign => Some(BinaryOp::LogicalAnd),
            Self::OrAssign => Some(BinaryOp::LogicalOr),
            Self::NullishAssign => Some(BinaryOp::NullishCoalescing),
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Patterns
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

impl Pattern {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(PatternKind::Ident(name.into()), span)
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            PatternKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Every name this pattern binds, in source order.
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names(&self, out: &mut Vec<String>) {
        match &self.kind {
            PatternKind::Ident(name) => out.push(name.clone()),
            PatternKind::Array(elems) => {
                for elem in elems.iter().flatten() {
                    elem.collect_bound_names(out);
                }
            }
            PatternKind::Object(props) => {
                for prop in props {
                    match &prop.kind {
                        ObjectPatPropKind::KeyValue { value, .. } => {
                            value.collect_bound_names(out)
                        }
                        ObjectPatPropKind::Shorthand { name, .. } => out.push(name.name.clone()),
                        ObjectPatPropKind::Rest(rest) => rest.collect_bound_names(out),
                    }
                }
            }
            PatternKind::Assign { left, .. } => left.collect_bound_names(out),
            PatternKind::Rest(inner) => inner.collect_bound_names(out),
            PatternKind::Expr(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    Ident(String),
    Array(Vec<Option<Pattern>>),
    Object(Vec<ObjectPatProp>),
    /// `pattern = default`
    Assign {
        left: Box<Pattern>,
        right: Box<Expr>,
    },
    /// `...pattern`
    Rest(Box<Pattern>),
    /// A member expression target (`for (o.p of xs)`).
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatProp {
    pub kind: ObjectPatPropKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectPatPropKind {
    KeyValue { key: PropKey, value: Pattern },
    Shorthand { name: Ident, default: Option<Expr> },
    Rest(Pattern),
}

// ══════════════════════════════════════════════════════════════════════════════
// TypeScript
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct TsType {
    pub kind: TsTypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsTypeKind {
    /// `any`, `number`, `void`, `this`, ...
    Keyword(String),
    /// `Foo.Bar<T>`
    Ref { name: String, type_args: Vec<TsType> },
    Array(Box<TsType>),
    Tuple(Vec<TsType>),
    Union(Vec<TsType>),
    Intersection(Vec<TsType>),
    /// Literal type, raw source text: `"a"`, `42`, `true`, `-1`.
    Lit(String),
    Function {
        type_params: Vec<TsTypeParam>,
        params: Vec<Param>,
        ret: Box<TsType>,
        is_constructor: bool,
    },
    TypeLit(Vec<TsTypeMember>),
    Paren(Box<TsType>),
    /// `typeof x.y`
    TypeQuery(String),
    /// `keyof T`, `readonly T[]`, `unique symbol`
    Operator { op: String, ty: Box<TsType> },
    /// `T[K]`
    Indexed { object: Box<TsType>, index: Box<TsType> },
    /// `C extends E ? T : F`
    Conditional {
        check: Box<TsType>,
        extends: Box<TsType>,
        true_ty: Box<TsType>,
        false_ty: Box<TsType>,
    },
    /// `{ [K in C]: T }`
    Mapped {
        param: Ident,
        constraint: Box<TsType>,
        ty: Option<Box<TsType>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeParam {
    pub name: Ident,
    pub constraint: Option<TsType>,
    pub default: Option<TsType>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeMember {
    pub kind: TsTypeMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsTypeMemberKind {
    Property {
        key: PropKey,
        optional: bool,
        readonly: bool,
        ty: Option<TsType>,
    },
    Method {
        key: PropKey,
        optional: bool,
        type_params: Vec<TsTypeParam>,
        params: Vec<Param>,
        ret: Option<TsType>,
    },
    Index {
        param: Ident,
        param_ty: TsType,
        ty: TsType,
        readonly: bool,
    },
    Call {
        type_params: Vec<TsTypeParam>,
        params: Vec<Param>,
        ret: Option<TsType>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsInterfaceDecl {
    pub id: Ident,
    pub type_params: Vec<TsTypeParam>,
    pub extends: Vec<TsType>,
    pub body: Vec<TsTypeMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeAliasDecl {
    pub id: Ident,
    pub type_params: Vec<TsTypeParam>,
    pub ty: TsType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsEnumDecl {
    pub id: Ident,
    pub members: Vec<TsEnumMember>,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsEnumMember {
    pub name: PropKey,
    pub init: Option<Expr>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_binary_precedence_order() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Exp.precedence() > BinaryOp::Mul.precedence());
        assert!(BinaryOp::LogicalAnd.precedence() > BinaryOp::LogicalOr.precedence());
        assert!(BinaryOp::LogicalOr.precedence() > BinaryOp::NullishCoalescing.precedence());
        assert!(BinaryOp::Exp.is_right_associative());
        assert!(!BinaryOp::Sub.is_right_associative());
    }

    #[test]
    fn test_pattern_bound_names() {
        let span = Span::default();
        let pat = Pattern::new(
            PatternKind::Array(vec![
                Some(Pattern::ident("a", span)),
                None,
                Some(Pattern::new(
                    PatternKind::Object(vec![ObjectPatProp {
                        kind: ObjectPatPropKind::Shorthand {
                            name: Ident::new("b", span),
                            default: None,
                        },
                        span,
                    }]),
                    span,
                )),
                Some(Pattern::new(
                    PatternKind::Rest(Box::new(Pattern::ident("rest", span))),
                    span,
                )),
            ]),
            span,
        );
        assert_eq!(pat.bound_names(), vec!["a", "b", "rest"]);
    }

    #[test]
    fn test_directive_detection() {
        let span = Span::default();
        assert!(Stmt::expr(Expr::str("use strict", span)).is_directive());
        assert!(!Stmt::expr(Expr::ident("x", span)).is_directive());
    }

    #[test]
    fn test_prop_key_static_name() {
        let span = Span::default();
        assert_eq!(
            PropKey::Ident(Ident::new("a", span)).static_name().as_deref(),
            Some("a")
        );
        assert_eq!(
            PropKey::Num { value: 1.0, raw: None }.static_name().as_deref(),
            Some("1")
        );
        assert_eq!(
            PropKey::Computed(Box::new(Expr::ident("k", span))).static_name(),
            None
        );
    }
}

//! `let`/`const` lowered to `var`.
//!
//! Runs at the start of `es2015`, one function scope at a time with nested
//! functions first:
//!
//! 1. A `let`/`const` declared in a nested block scope (a block, a loop
//!    head, a `switch`, a `try`/`catch`/`finally` body) is renamed when its
//!    name also occurs elsewhere in the function: as a `var` the two would
//!    merge.
//! 2. A loop whose block-scoped bindings are captured by a closure gets its
//!    body wrapped in a function called once per iteration,
//!    `(function(i) { ... })(i);`, so each iteration keeps its own copy.
//!    A body that cannot move into a function (it breaks out of the loop,
//!    returns, yields, awaits, uses `arguments` or `super`, declares a
//!    `var`, or writes a `for` head binding) keeps `let`/`const` for that
//!    loop, and a warning is reported.
//! 3. Every other `let`/`const` becomes `var`. A `let` without an
//!    initializer inside a loop gets `= void 0`, so each iteration starts
//!    from `undefined` again.

use std::collections::HashMap;

use ecmaform_types::ast::*;
use ecmaform_types::visit::{self, VisitMut};
use ecmaform_types::{ErrorCode, Span};

use crate::error::TransformWarning;
use crate::temps::NameGen;

const PASS: &str = "es2015";

/// Lower every `let`/`const` in `program`.
pub(crate) fn lower_block_scoping(
    program: &mut Program,
    names: &mut NameGen,
    warnings: &mut Vec<TransformWarning>,
) {
    Scopes { names, warnings }.visit_program(program);
}

fn is_loop(kind: &StmtKind) -> bool {
    matches!(
        kind,
        StmtKind::For { .. }
            | StmtKind::ForIn { .. }
            | StmtKind::ForOf { .. }
            | StmtKind::While { .. }
            | StmtKind::DoWhile { .. }
    )
}

/// Names bound by a `let`/`const` declaration; empty for `var`.
fn lexical_decl_names(decl: &VarDecl) -> Vec<String> {
    if decl.kind == VarKind::Var {
        return Vec::new();
    }
    decl.decls.iter().flat_map(|d| d.name.bound_names()).collect()
}

/// Names declared by `let`/`const` directly in `stmts`.
fn lexical_names(stmts: &[Stmt]) -> Vec<String> {
    stmts
        .iter()
        .flat_map(|stmt| match &stmt.kind {
            StmtKind::Var(decl) => lexical_decl_names(decl),
            _ => Vec::new(),
        })
        .collect()
}

/// Whether `stmts` declare `name` in their own block scope.
fn declares(stmts: &[Stmt], name: &str) -> bool {
    stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::Var(decl) => lexical_decl_names(decl).iter().any(|n| n == name),
        StmtKind::Function(function) => function.id.as_ref().is_some_and(|id| id.name == name),
        StmtKind::Class(class) => class.id.as_ref().is_some_and(|id| id.name == name),
        _ => false,
    })
}

/// Whether a function with these parameters and body binds `name` itself.
fn binds_in_function(params: &[Param], body: Option<&mut Vec<Stmt>>, name: &str) -> bool {
    if params
        .iter()
        .any(|p| p.pat.bound_names().iter().any(|n| n == name))
    {
        return true;
    }
    let Some(body) = body else {
        return false;
    };
    if declares(body, name) {
        return true;
    }
    let mut vars = DeclaresVar { name, found: false };
    vars.visit_stmts(body);
    vars.found
}

// ══════════════════════════════════════════════════════════════════════════════
// Driver
// ══════════════════════════════════════════════════════════════════════════════

struct Scopes<'a> {
    names: &'a mut NameGen,
    warnings: &'a mut Vec<TransformWarning>,
}

impl Scopes<'_> {
    /// Lower one function scope. Its nested functions are already done.
    fn lower(&mut self, params: &mut [Param], stmts: &mut Vec<Stmt>) {
        let mut survey = Survey::default();
        visit::walk_params(&mut survey, params);
        survey.visit_stmts(stmts);
        let renames = survey.decide(self.names);
        let renamed = renames.iter().map(Vec::len).sum::<usize>();
        if renamed > 0 {
            ApplyRenames { renames, next: 0 }.visit_stmts(stmts);
        }

        let mut loops = LoopSurvey::default();
        loops.visit_stmts(stmts);
        for (span, reason) in &loops.kept {
            self.warnings.push(TransformWarning::new(
                PASS,
                ErrorCode::BLOCK_SCOPE_KEPT,
                format!(
                    "closures capture per-iteration loop bindings, but the loop body uses `{reason}`; let/const kept"
                ),
                *span,
            ));
        }

        Convert {
            plans: &loops.plans,
            next: 0,
            in_loop: 0,
        }
        .visit_stmts(stmts);

        let wrapped = loops
            .plans
            .iter()
            .filter(|p| matches!(p, LoopPlan::Wrap { .. }))
            .count();
        if wrapped > 0 {
            Wrap {
                plans: loops.plans,
                next: 0,
            }
            .visit_stmts(stmts);
        }
        if renamed + wrapped + loops.kept.len() > 0 {
            tracing::trace!(renamed, wrapped, kept = loops.kept.len(), "block scoping");
        }
    }
}

impl VisitMut for Scopes<'_> {
    fn visit_program(&mut self, program: &mut Program) {
        visit::walk_program(self, program);
        self.lower(&mut [], &mut program.body);
    }

    fn visit_function(&mut self, function: &mut Function) {
        visit::walk_function(self, function);
        if let Some(body) = &mut function.body {
            self.lower(&mut function.params, &mut body.stmts);
        }
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        visit::walk_arrow(self, arrow);
        if let ArrowBody::Block(body) = &mut arrow.body {
            self.lower(&mut arrow.params, &mut body.stmts);
        }
    }

    fn visit_class(&mut self, class: &mut Class) {
        visit::walk_class(self, class);
        for member in &mut class.members {
            if let ClassMemberKind::StaticBlock(block) = &mut member.kind {
                self.lower(&mut [], &mut block.stmts);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Block scopes
// ══════════════════════════════════════════════════════════════════════════════

/// A node that opens a block scope inside a function.
enum Site<'a> {
    /// A block statement or a loop (whose head bindings belong to it).
    Stmt(&'a mut Stmt),
    /// A `try`, `catch` or `finally` body.
    Block(&'a mut Block),
    /// The cases of a `switch`; the discriminant lies outside.
    Cases(&'a mut Vec<SwitchCase>),
}

impl Site<'_> {
    fn lexical_names(&self) -> Vec<String> {
        match self {
            Site::Block(block) => lexical_names(&block.stmts),
            Site::Cases(cases) => cases.iter().flat_map(|c| lexical_names(&c.body)).collect(),
            Site::Stmt(stmt) => match &stmt.kind {
                StmtKind::Block(block) => lexical_names(&block.stmts),
                StmtKind::For {
                    init: Some(ForInit::Var(decl)),
                    ..
                }
                | StmtKind::ForIn {
                    left: ForHead::Var(decl),
                    ..
                }
                | StmtKind::ForOf {
                    left: ForHead::Var(decl),
                    ..
                } => lexical_decl_names(decl),
                _ => Vec::new(),
            },
        }
    }

    fn walk<V: VisitMut + ?Sized>(&mut self, v: &mut V) {
        match self {
            Site::Stmt(stmt) => visit::walk_stmt(v, stmt),
            Site::Block(block) => visit::walk_block(v, block),
            Site::Cases(cases) => {
                for case in cases.iter_mut() {
                    if let Some(test) = &mut case.test {
                        v.visit_expr(test);
                    }
                    v.visit_stmts(&mut case.body);
                }
            }
        }
    }
}

trait SiteVisitor: VisitMut {
    fn site(&mut self, site: Site<'_>);
}

/// [`visit::walk_stmt`], handing every block scope to
/// [`SiteVisitor::site`] instead of walking it.
fn walk_sites<V: SiteVisitor>(v: &mut V, stmt: &mut Stmt) {
    if matches!(stmt.kind, StmtKind::Block(_)) || is_loop(&stmt.kind) {
        v.site(Site::Stmt(stmt));
        return;
    }
    match &mut stmt.kind {
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            v.visit_expr(discriminant);
            v.site(Site::Cases(cases));
        }
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            v.site(Site::Block(block));
            if let Some(handler) = handler {
                if let Some(param) = &mut handler.param {
                    v.visit_pattern(param);
                }
                v.site(Site::Block(&mut handler.body));
            }
            if let Some(finalizer) = finalizer {
                v.site(Site::Block(finalizer));
            }
        }
        _ => visit::walk_stmt(v, stmt),
    }
}

// ── Survey ───────────────────────────────────────────────────────────────────

/// Counts name occurrences in one function scope, nested functions
/// included, and per block scope for the names that block declares.
#[derive(Default)]
struct Survey {
    totals: HashMap<String, usize>,
    sites: Vec<SiteInfo>,
    /// Enclosing block scopes, innermost last.
    open: Vec<usize>,
    /// Functions and classes entered below the scope root.
    nested: usize,
}

struct SiteInfo {
    parent: Option<usize>,
    names: Vec<String>,
    /// Occurrences of `names` inside the site.
    inside: HashMap<String, usize>,
}

impl Survey {
    fn record(&mut self, name: &str) {
        match self.totals.get_mut(name) {
            Some(count) => *count += 1,
            None => {
                self.totals.insert(name.to_string(), 1);
            }
        }
        for &index in &self.open {
            if let Some(count) = self.sites[index].inside.get_mut(name) {
                *count += 1;
            }
        }
    }

    /// Choose a fresh name for every block binding whose name also occurs
    /// outside its block. Inner and later blocks are decided first, so the
    /// outermost, earliest declaration keeps its name.
    fn decide(mut self, names: &mut NameGen) -> Vec<Vec<(String, String)>> {
        let mut renames = vec![Vec::new(); self.sites.len()];
        for index in (0..self.sites.len()).rev() {
            for name in self.sites[index].names.clone() {
                let inside = self.sites[index].inside.get(&name).copied().unwrap_or(0);
                let total = self.totals.get(&name).copied().unwrap_or(0);
                if total <= inside {
                    continue;
                }
                renames[index].push((name.clone(), names.unique(&name)));
                if let Some(count) = self.totals.get_mut(&name) {
                    *count -= inside;
                }
                let mut parent = self.sites[index].parent;
                while let Some(up) = parent {
                    if let Some(count) = self.sites[up].inside.get_mut(&name) {
                        *count = count.saturating_sub(inside);
                    }
                    parent = self.sites[up].parent;
                }
            }
        }
        renames
    }
}

impl SiteVisitor for Survey {
    fn site(&mut self, mut site: Site<'_>) {
        let names = site.lexical_names();
        let index = self.sites.len();
        self.sites.push(SiteInfo {
            parent: self.open.last().copied(),
            inside: names.iter().map(|n| (n.clone(), 0)).collect(),
            names,
        });
        self.open.push(index);
        site.walk(self);
        self.open.pop();
    }
}

impl VisitMut for Survey {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if self.nested == 0 {
            walk_sites(self, stmt);
        } else {
            visit::walk_stmt(self, stmt);
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        if let ExprKind::Ident(name) = &expr.kind {
            self.record(name);
        }
        visit::walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pat: &mut Pattern) {
        if let PatternKind::Ident(name) = &pat.kind {
            self.record(name);
        }
        visit::walk_pattern(self, pat);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        self.record(&ident.name);
    }

    fn visit_function(&mut self, function: &mut Function) {
        self.nested += 1;
        visit::walk_function(self, function);
        self.nested -= 1;
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        self.nested += 1;
        visit::walk_arrow(self, arrow);
        self.nested -= 1;
    }

    fn visit_class(&mut self, class: &mut Class) {
        self.nested += 1;
        visit::walk_class(self, class);
        self.nested -= 1;
    }
}

// ── Renaming ─────────────────────────────────────────────────────────────────

/// Visits the block scopes in [`Survey`] order and renames their bindings.
struct ApplyRenames {
    renames: Vec<Vec<(String, String)>>,
    next: usize,
}

impl SiteVisitor for ApplyRenames {
    fn site(&mut self, mut site: Site<'_>) {
        let index = self.next;
        self.next += 1;
        let renames = self.renames.get_mut(index).map(std::mem::take).unwrap_or_default();
        for (from, to) in &renames {
            site.walk(&mut Rename { from, to });
        }
        site.walk(self);
    }
}

impl VisitMut for ApplyRenames {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_sites(self, stmt);
    }

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_arrow(&mut self, _arrow: &mut ArrowFunction) {}

    fn visit_class(&mut self, _class: &mut Class) {}
}

/// Renames the references to one block binding, leaving alone the nested
/// scopes that declare the same name.
struct Rename<'n> {
    from: &'n str,
    to: &'n str,
}

impl VisitMut for Rename<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Block(block) if declares(&block.stmts, self.from) => {}
            StmtKind::For {
                init: Some(ForInit::Var(decl)),
                ..
            }
            | StmtKind::ForIn {
                left: ForHead::Var(decl),
                ..
            }
            | StmtKind::ForOf {
                left: ForHead::Var(decl),
                ..
            } if lexical_decl_names(decl).iter().any(|n| n == self.from) => {}
            StmtKind::Switch {
                discriminant,
                cases,
            } if cases.iter().any(|c| declares(&c.body, self.from)) => {
                self.visit_expr(discriminant);
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                if !declares(&block.stmts, self.from) {
                    visit::walk_block(self, block);
                }
                if let Some(handler) = handler {
                    let param_binds = handler
                        .param
                        .as_ref()
                        .is_some_and(|p| p.bound_names().iter().any(|n| n == self.from));
                    if !param_binds && !declares(&handler.body.stmts, self.from) {
                        if let Some(param) = &mut handler.param {
                            self.visit_pattern(param);
                        }
                        visit::walk_block(self, &mut handler.body);
                    }
                }
                if let Some(finalizer) = finalizer {
                    if !declares(&finalizer.stmts, self.from) {
                        visit::walk_block(self, finalizer);
                    }
                }
            }
            _ => visit::walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Ident(name) if name.as_str() == self.from => {
                *name = self.to.to_string();
                return;
            }
            ExprKind::Object(props) => {
                for prop in props.iter_mut() {
                    if let PropKind::Shorthand(ident) = &prop.kind {
                        if ident.name == self.from {
                            let key = PropKey::Ident(ident.clone());
                            let value = Expr::ident(self.to, ident.span);
                            prop.kind = PropKind::KeyValue { key, value };
                        }
                    }
                }
            }
            _ => {}
        }
        visit::walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pat: &mut Pattern) {
        match &mut pat.kind {
            PatternKind::Ident(name) if name.as_str() == self.from => {
                *name = self.to.to_string();
                return;
            }
            PatternKind::Object(props) => {
                for prop in props.iter_mut() {
                    let ObjectPatPropKind::Shorthand { name, default } = &mut prop.kind else {
                        continue;
                    };
                    if name.name != self.from {
                        continue;
                    }
                    let key = PropKey::Ident(name.clone());
                    let target = Pattern::ident(self.to, name.span);
                    let value = match default.take() {
                        Some(default) => Pattern::new(
                            PatternKind::Assign {
                                left: Box::new(target),
                                right: Box::new(default),
                            },
                            prop.span,
                        ),
                        None => target,
                    };
                    prop.kind = ObjectPatPropKind::KeyValue { key, value };
                }
            }
            _ => {}
        }
        visit::walk_pattern(self, pat);
    }

    fn visit_function(&mut self, function: &mut Function) {
        let named = function.id.as_ref().is_some_and(|id| id.name == self.from);
        let body = function.body.as_mut().map(|b| &mut b.stmts);
        if named || binds_in_function(&function.params, body, self.from) {
            return;
        }
        visit::walk_function(self, function);
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        let body = match &mut arrow.body {
            ArrowBody::Block(block) => Some(&mut block.stmts),
            ArrowBody::Expr(_) => None,
        };
        if binds_in_function(&arrow.params, body, self.from) {
            return;
        }
        visit::walk_arrow(self, arrow);
    }

    fn visit_class(&mut self, class: &mut Class) {
        if class.id.as_ref().is_some_and(|id| id.name == self.from) {
            return;
        }
        visit::walk_class(self, class);
    }
}

/// Finds a `var` or function declaration of `name` in a function body.
struct DeclaresVar<'n> {
    name: &'n str,
    found: bool,
}

impl VisitMut for DeclaresVar<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if let StmtKind::Function(function) = &stmt.kind {
            if function.id.as_ref().is_some_and(|id| id.name == self.name) {
                self.found = true;
            }
        }
        visit::walk_stmt(self, stmt);
    }

    fn visit_var_decl(&mut self, decl: &mut VarDecl) {
        if decl.kind == VarKind::Var
            && decl
                .decls
                .iter()
                .any(|d| d.name.bound_names().iter().any(|n| n == self.name))
        {
            self.found = true;
        }
    }

    fn visit_expr(&mut self, _expr: &mut Expr) {}

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, _class: &mut Class) {}
}

// ══════════════════════════════════════════════════════════════════════════════
// Loops
// ══════════════════════════════════════════════════════════════════════════════

/// What happens to one loop. Loops are numbered in the order a statement
/// walk of the scope reaches them.
enum LoopPlan {
    /// No block-scoped binding of the loop is captured by a closure.
    Leave,
    /// Run the body in a function called once per iteration.
    Wrap {
        /// Head bindings passed in as arguments.
        params: Vec<String>,
        /// The body uses `this`: call with `.call(this, ...)`.
        call_this: bool,
        /// The body has `continue`s for this loop, which become `return`.
        has_continue: bool,
        labels: Vec<String>,
    },
    /// Keep `let`/`const`.
    Keep,
}

#[derive(Default)]
struct LoopSurvey {
    plans: Vec<LoopPlan>,
    /// Labels attached to the statement being visited.
    labels: Vec<String>,
    kept: Vec<(Span, &'static str)>,
}

impl VisitMut for LoopSurvey {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if let StmtKind::Labeled { label, body } = &mut stmt.kind {
            self.labels.push(label.name.clone());
            self.visit_stmt(body);
            return;
        }
        let labels = std::mem::take(&mut self.labels);
        if !is_loop(&stmt.kind) {
            visit::walk_stmt(self, stmt);
            return;
        }
        let index = self.plans.len();
        self.plans.push(LoopPlan::Leave);
        visit::walk_stmt(self, stmt);
        let (plan, kept) = plan_loop(stmt, labels);
        if let Some(reason) = kept {
            self.kept.push((stmt.span, reason));
        }
        self.plans[index] = plan;
    }

    fn visit_expr(&mut self, _expr: &mut Expr) {}

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, _class: &mut Class) {}
}

fn plan_loop(stmt: &mut Stmt, labels: Vec<String>) -> (LoopPlan, Option<&'static str>) {
    let (head, body, c_style) = match &mut stmt.kind {
        StmtKind::For { init, body, .. } => {
            let head = match init {
                Some(ForInit::Var(decl)) => lexical_decl_names(decl),
                _ => Vec::new(),
            };
            (head, body, true)
        }
        StmtKind::ForIn { left, body, .. } | StmtKind::ForOf { left, body, .. } => {
            let head = match left {
                ForHead::Var(decl) => lexical_decl_names(decl),
                ForHead::Pattern(_) => Vec::new(),
            };
            (head, body, false)
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => (Vec::new(), body, false),
        _ => return (LoopPlan::Leave, None),
    };

    let mut scoped = BodyLexicals { names: head.clone() };
    scoped.visit_stmt(body);
    if scoped.names.is_empty() {
        return (LoopPlan::Leave, None);
    }
    let mut captures = Captures {
        names: &scoped.names,
        closures: 0,
        found: false,
    };
    captures.visit_stmt(body);
    if !captures.found {
        return (LoopPlan::Leave, None);
    }

    let mut scan = BodyScan::new(&labels);
    scan.visit_stmt(body);
    if let Some(reason) = scan.blocker {
        return (LoopPlan::Keep, Some(reason));
    }
    let (call_this, has_continue) = (scan.uses_this, scan.has_continue);
    if c_style {
        let mut writes = WritesTo {
            names: &head,
            found: false,
        };
        writes.visit_stmt(body);
        if writes.found {
            return (LoopPlan::Keep, Some("assignment to a loop variable"));
        }
    }
    let plan = LoopPlan::Wrap {
        params: head,
        call_this,
        has_continue,
        labels,
    };
    (plan, None)
}

/// `let`/`const` names declared anywhere in a loop body outside nested
/// functions.
struct BodyLexicals {
    names: Vec<String>,
}

impl VisitMut for BodyLexicals {
    fn visit_var_decl(&mut self, decl: &mut VarDecl) {
        self.names.extend(lexical_decl_names(decl));
    }

    fn visit_expr(&mut self, _expr: &mut Expr) {}

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, _class: &mut Class) {}
}

/// Whether a closure in the body mentions one of `names`.
struct Captures<'a> {
    names: &'a [String],
    closures: usize,
    found: bool,
}

impl Captures<'_> {
    fn check(&mut self, name: &str) {
        if self.closures > 0 && self.names.iter().any(|n| n == name) {
            self.found = true;
        }
    }
}

impl VisitMut for Captures<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if let ExprKind::Ident(name) = &expr.kind {
            self.check(name);
        }
        visit::walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pat: &mut Pattern) {
        if let PatternKind::Ident(name) = &pat.kind {
            self.check(name);
        }
        visit::walk_pattern(self, pat);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        self.check(&ident.name);
    }

    fn visit_function(&mut self, function: &mut Function) {
        self.closures += 1;
        visit::walk_function(self, function);
        self.closures -= 1;
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        self.closures += 1;
        visit::walk_arrow(self, arrow);
        self.closures -= 1;
    }

    fn visit_class(&mut self, class: &mut Class) {
        self.closures += 1;
        visit::walk_class(self, class);
        self.closures -= 1;
    }
}

/// Finds what keeps a loop body from moving into a function.
struct BodyScan<'a> {
    /// Labels of the loop itself.
    labels: &'a [String],
    inner_labels: Vec<String>,
    loops: usize,
    breakables: usize,
    arrows: usize,
    blocker: Option<&'static str>,
    uses_this: bool,
    has_continue: bool,
}

impl<'a> BodyScan<'a> {
    fn new(labels: &'a [String]) -> Self {
        Self {
            labels,
            inner_labels: Vec::new(),
            loops: 0,
            breakables: 0,
            arrows: 0,
            blocker: None,
            uses_this: false,
            has_continue: false,
        }
    }

    fn block(&mut self, reason: &'static str) {
        if self.blocker.is_none() {
            self.blocker = Some(reason);
        }
    }
}

impl VisitMut for BodyScan<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if self.arrows == 0 {
            match &stmt.kind {
                StmtKind::Break(label) => {
                    let inner = match label {
                        None => self.breakables > 0,
                        Some(label) => self.inner_labels.contains(&label.name),
                    };
                    if !inner {
                        self.block("break");
                    }
                }
                StmtKind::Continue(None) if self.loops == 0 => self.has_continue = true,
                StmtKind::Continue(Some(label)) if !self.inner_labels.contains(&label.name) => {
                    if self.labels.contains(&label.name) {
                        self.has_continue = true;
                    } else {
                        self.block("continue");
                    }
                }
                StmtKind::Return(_) => self.block("return"),
                StmtKind::ForOf { is_await: true, .. } => self.block("await"),
                _ => {}
            }
        }

        if let StmtKind::Labeled { label, .. } = &stmt.kind {
            self.inner_labels.push(label.name.clone());
            visit::walk_stmt(self, stmt);
            self.inner_labels.pop();
            return;
        }
        let is_loop = is_loop(&stmt.kind);
        let breakable = is_loop || matches!(stmt.kind, StmtKind::Switch { .. });
        self.loops += usize::from(is_loop);
        self.breakables += usize::from(breakable);
        visit::walk_stmt(self, stmt);
        self.loops -= usize::from(is_loop);
        self.breakables -= usize::from(breakable);
    }

    fn visit_var_decl(&mut self, decl: &mut VarDecl) {
        if self.arrows == 0 && decl.kind == VarKind::Var {
            self.block("var");
        }
        visit::walk_var_decl(self, decl);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        match &expr.kind {
            ExprKind::This => self.uses_this = true,
            ExprKind::Ident(name) if name == "arguments" => self.block("arguments"),
            ExprKind::Super => self.block("super"),
            ExprKind::MetaProp { meta, .. } if meta == "new" => self.block("new.target"),
            ExprKind::Yield { .. } if self.arrows == 0 => self.block("yield"),
            ExprKind::Await(_) if self.arrows == 0 => self.block("await"),
            _ => {}
        }
        visit::walk_expr(self, expr);
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        self.arrows += 1;
        visit::walk_arrow(self, arrow);
        self.arrows -= 1;
    }

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, class: &mut Class) {
        if let Some(super_class) = &mut class.super_class {
            self.visit_expr(super_class);
        }
    }
}

/// Whether the body assigns one of `names`, closures included.
struct WritesTo<'a> {
    names: &'a [String],
    found: bool,
}

impl WritesTo<'_> {
    fn check(&mut self, written: &[String]) {
        if written.iter().any(|w| self.names.contains(w)) {
            self.found = true;
        }
    }
}

impl VisitMut for WritesTo<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if let StmtKind::ForIn {
            left: ForHead::Pattern(pat),
            ..
        }
        | StmtKind::ForOf {
            left: ForHead::Pattern(pat),
            ..
        } = &stmt.kind
        {
            let written = pat.bound_names();
            self.check(&written);
        }
        visit::walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        let mut written = Vec::new();
        match &expr.kind {
            ExprKind::Assign { target, .. } => assigned_names(target, &mut written),
            ExprKind::Update { arg, .. } => assigned_names(arg, &mut written),
            _ => {}
        }
        self.check(&written);
        visit::walk_expr(self, expr);
    }
}

/// Identifiers written by an assignment target, destructuring included.
fn assigned_names(target: &Expr, out: &mut Vec<String>) {
    match &target.kind {
        ExprKind::Ident(name) => out.push(name.clone()),
        ExprKind::Array(elems) => {
            for elem in elems.iter().flatten() {
                assigned_names(&elem.expr, out);
            }
        }
        ExprKind::Object(props) => {
            for prop in props {
                match &prop.kind {
                    PropKind::KeyValue { value, .. } => assigned_names(value, out),
                    PropKind::Shorthand(ident) => out.push(ident.name.clone()),
                    PropKind::Spread(inner) => assigned_names(inner, out),
                    PropKind::Method { .. } => {}
                }
            }
        }
        ExprKind::Assign { target, .. } => assigned_names(target, out),
        _ => {}
    }
}

/// Number of loops in `stmt`, itself included, outside nested functions.
fn count_loops(stmt: &mut Stmt) -> usize {
    struct Count(usize);

    impl VisitMut for Count {
        fn visit_stmt(&mut self, stmt: &mut Stmt) {
            if is_loop(&stmt.kind) {
                self.0 += 1;
            }
            visit::walk_stmt(self, stmt);
        }

        fn visit_expr(&mut self, _expr: &mut Expr) {}

        fn visit_function(&mut self, _function: &mut Function) {}

        fn visit_class(&mut self, _class: &mut Class) {}
    }

    let mut count = Count(0);
    count.visit_stmt(stmt);
    count.0
}

// ── Conversion ───────────────────────────────────────────────────────────────

/// Turns `let`/`const` into `var`, except in loops that keep them.
struct Convert<'p> {
    plans: &'p [LoopPlan],
    next: usize,
    in_loop: usize,
}

impl VisitMut for Convert<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if !is_loop(&stmt.kind) {
            visit::walk_stmt(self, stmt);
            return;
        }
        let index = self.next;
        self.next += 1;
        if matches!(self.plans.get(index), Some(LoopPlan::Keep)) {
            self.next += count_loops(stmt) - 1;
            return;
        }
        match &mut stmt.kind {
            StmtKind::For { init, body, .. } => {
                if let Some(ForInit::Var(decl)) = init {
                    self.visit_var_decl(decl);
                }
                self.visit_loop_body(body);
            }
            StmtKind::ForIn { left, body, .. } | StmtKind::ForOf { left, body, .. } => {
                // A head binding is assigned on every iteration.
                if let ForHead::Var(decl) = left {
                    decl.kind = VarKind::Var;
                }
                self.visit_loop_body(body);
            }
            StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
                self.visit_loop_body(body);
            }
            _ => {}
        }
    }

    fn visit_var_decl(&mut self, decl: &mut VarDecl) {
        if decl.kind == VarKind::Var {
            return;
        }
        let reset = decl.kind == VarKind::Let && self.in_loop > 0;
        decl.kind = VarKind::Var;
        if !reset {
            return;
        }
        for declarator in &mut decl.decls {
            if declarator.init.is_none() && declarator.name.as_ident().is_some() {
                declarator.init = Some(Expr::undefined(declarator.span));
            }
        }
    }

    fn visit_expr(&mut self, _expr: &mut Expr) {}

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, _class: &mut Class) {}
}

impl Convert<'_> {
    fn visit_loop_body(&mut self, body: &mut Stmt) {
        self.in_loop += 1;
        self.visit_stmt(body);
        self.in_loop -= 1;
    }
}

// ── Wrapping ─────────────────────────────────────────────────────────────────

/// Moves captured loop bodies into per-iteration functions, inner loops
/// first.
struct Wrap {
    plans: Vec<LoopPlan>,
    next: usize,
}

impl VisitMut for Wrap {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if !is_loop(&stmt.kind) {
            visit::walk_stmt(self, stmt);
            return;
        }
        let index = self.next;
        self.next += 1;
        visit::walk_stmt(self, stmt);
        let plan = self
            .plans
            .get_mut(index)
            .map(|plan| std::mem::replace(plan, LoopPlan::Leave));
        let Some(LoopPlan::Wrap {
            params,
            call_this,
            has_continue,
            labels,
        }) = plan
        else {
            return;
        };
        let body = match &mut stmt.kind {
            StmtKind::For { body, .. }
            | StmtKind::ForIn { body, .. }
            | StmtKind::ForOf { body, .. }
            | StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. } => body,
            _ => return,
        };
        wrap_body(body, &params, call_this, has_continue.then_some(labels.as_slice()));
    }

    fn visit_expr(&mut self, _expr: &mut Expr) {}

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, _class: &mut Class) {}
}

/// `body` => `{ (function(params) { body })(params); }`. With
/// `continue_labels`, the loop's `continue`s become `return`s.
fn wrap_body(body: &mut Stmt, params: &[String], call_this: bool, continue_labels: Option<&[String]>) {
    let span = body.span;
    let stmts = match std::mem::replace(&mut body.kind, StmtKind::Empty) {
        StmtKind::Block(block) => block.stmts,
        kind => vec![Stmt::new(kind, span)],
    };
    let mut block = Block { stmts, span };
    if let Some(labels) = continue_labels {
        let mut exits = ContinueToReturn { labels, loops: 0 };
        visit::walk_block(&mut exits, &mut block);
    }
    let function = Function {
        id: None,
        params: params
            .iter()
            .map(|name| Param {
                pat: Pattern::ident(name.clone(), span),
                type_ann: None,
                optional: false,
                span,
            })
            .collect(),
        body: Some(block),
        is_async: false,
        is_generator: false,
        type_params: Vec::new(),
        return_type: None,
        span,
    };
    let callee = Expr::new(ExprKind::Function(Box::new(function)), span);
    let mut args: Vec<Expr> = params.iter().map(|name| Expr::ident(name.clone(), span)).collect();
    let call = if call_this {
        args.insert(0, Expr::new(ExprKind::This, span));
        Expr::call(Expr::member(callee, "call", span), args, span)
    } else {
        Expr::call(callee, args, span)
    };
    *body = Stmt::new(
        StmtKind::Block(Block {
            stmts: vec![Stmt::expr(call)],
            span,
        }),
        span,
    );
}

/// Rewrites the `continue`s that target the wrapped loop.
struct ContinueToReturn<'a> {
    labels: &'a [String],
    loops: usize,
}

impl VisitMut for ContinueToReturn<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        let exits = match &stmt.kind {
            StmtKind::Continue(None) => self.loops == 0,
            StmtKind::Continue(Some(label)) => self.labels.contains(&label.name),
            _ => false,
        };
        if exits {
            stmt.kind = StmtKind::Return(None);
            return;
        }
        let is_loop = is_loop(&stmt.kind);
        self.loops += usize::from(is_loop);
        visit::walk_stmt(self, stmt);
        self.loops -= usize::from(is_loop);
    }

    fn visit_expr(&mut self, _expr: &mut Expr) {}

    fn visit_function(&mut self, _function: &mut Function) {}

    fn visit_class(&mut self, _class: &mut Class) {}
}

//! Mutable AST traversal.
//!
//! Implementors override the `visit_*` hooks they care about and call the
//! matching `walk_*` function to recurse into children. Default hooks just
//! walk, so an empty implementation visits every node once, in source order.

use crate::ast::*;

pub trait VisitMut {
    fn visit_program(&mut self, program: &mut Program) {
        walk_program(self, program);
    }

    /// A statement list: program body, block, switch case or function body.
    fn visit_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        walk_stmts(self, stmts);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, pat: &mut Pattern) {
        walk_pattern(self, pat);
    }

    fn visit_function(&mut self, function: &mut Function) {
        walk_function(self, function);
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) {
        walk_arrow(self, arrow);
    }

    fn visit_class(&mut self, class: &mut Class) {
        walk_class(self, class);
    }

    fn visit_prop_key(&mut self, key: &mut PropKey) {
        walk_prop_key(self, key);
    }

    fn visit_var_decl(&mut self, decl: &mut VarDecl) {
        walk_var_decl(self, decl);
    }

    fn visit_ident(&mut self, _ident: &mut Ident) {}
}

pub fn walk_program<V: VisitMut + ?Sized>(v: &mut V, program: &mut Program) {
    v.visit_stmts(&mut program.body);
}

pub fn walk_stmts<V: VisitMut + ?Sized>(v: &mut V, stmts: &mut Vec<Stmt>) {
    for stmt in stmts.iter_mut() {
        v.visit_stmt(stmt);
    }
}

pub fn walk_block<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    v.visit_stmts(&mut block.stmts);
}

pub fn walk_stmt<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Expr(expr) => v.visit_expr(expr),
        StmtKind::Var(decl) => v.visit_var_decl(decl),
        StmtKind::Function(function) => v.visit_function(function),
        StmtKind::Class(class) => v.visit_class(class),
        StmtKind::Block(block) => walk_block(v, block),
        StmtKind::Empty | StmtKind::Debugger => {}
        StmtKind::If { test, cons, alt } => {
            v.visit_expr(test);
            v.visit_stmt(cons);
            if let Some(alt) = alt {
                v.visit_stmt(alt);
            }
        }
        StmtKind::For {
            init,
            test,
            update,
            body,
        } => {
            match init {
                Some(ForInit::Var(decl)) => v.visit_var_decl(decl),
                Some(ForInit::Expr(expr)) => v.visit_expr(expr),
                None => {}
            }
            if let Some(test) = test {
                v.visit_expr(test);
            }
            if let Some(update) = update {
                v.visit_expr(update);
            }
            v.visit_stmt(body);
        }
        StmtKind::ForIn { left, right, body } | StmtKind::ForOf { left, right, body, .. } => {
            match left {
                ForHead::Var(decl) => v.visit_var_decl(decl),
                ForHead::Pattern(pat) => v.visit_pattern(pat),
            }
            v.visit_expr(right);
            v.visit_stmt(body);
        }
        StmtKind::While { test, body } => {
            v.visit_expr(test);
            v.visit_stmt(body);
        }
        StmtKind::DoWhile { body, test } => {
            v.visit_stmt(body);
            v.visit_expr(test);
        }
        StmtKind::Return(arg) => {
            if let Some(arg) = arg {
                v.visit_expr(arg);
            }
        }
        StmtKind::Break(label) | StmtKind::Continue(label) => {
            if let Some(label) = label {
                v.visit_ident(label);
            }
        }
        StmtKind::Throw(arg) => v.visit_expr(arg),
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            walk_block(v, block);
            if let Some(handler) = handler {
                if let Some(param) = &mut handler.param {
                    v.visit_pattern(param);
                }
                walk_block(v, &mut handler.body);
            }
            if let Some(finalizer) = finalizer {
                walk_block(v, finalizer);
            }
        }
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            v.visit_expr(discriminant);
            for case in cases {
                if let Some(test) = &mut case.test {
                    v.visit_expr(test);
                }
                v.visit_stmts(&mut case.body);
            }
        }
        StmtKind::Labeled { label, body } => {
            v.visit_ident(label);
            v.visit_stmt(body);
        }
        StmtKind::Import(import) => {
            for spec in &mut import.specifiers {
                match spec {
                    ImportSpecifier::Default(local) | ImportSpecifier::Namespace(local) => {
                        v.visit_ident(local)
                    }
                    ImportSpecifier::Named {
                        imported, local, ..
                    } => {
                        if let Some(imported) = imported {
                            v.visit_ident(imported);
                        }
                        v.visit_ident(local);
                    }
                }
            }
        }
        StmtKind::Export(export) => match export {
            ExportDecl::Decl(decl) => v.visit_stmt(decl),
            ExportDecl::Default(DefaultExport::Expr(expr)) => v.visit_expr(expr),
            ExportDecl::Default(DefaultExport::Function(function)) => v.visit_function(function),
            ExportDecl::Default(DefaultExport::Class(class)) => v.visit_class(class),
            ExportDecl::Named { specifiers, .. } => {
                for spec in specifiers {
                    v.visit_ident(&mut spec.local);
                    if let Some(exported) = &mut spec.exported {
                        v.visit_ident(exported);
                    }
                }
            }
            ExportDecl::All { exported, .. } => {
                if let Some(exported) = exported {
                    v.visit_ident(exported);
                }
            }
        },
        StmtKind::TsEnum(decl) => {
            v.visit_ident(&mut decl.id);
            for member in &mut decl.members {
                if let Some(init) = &mut member.init {
                    v.visit_expr(init);
                }
            }
        }
        StmtKind::TsDeclare(_) | StmtKind::TsInterface(_) | StmtKind::TsTypeAlias(_) => {}
    }
}

pub fn walk_var_decl<V: VisitMut + ?Sized>(v: &mut V, decl: &mut VarDecl) {
    for declarator in &mut decl.decls {
        v.visit_pattern(&mut declarator.name);
        if let Some(init) = &mut declarator.init {
            v.visit_expr(init);
        }
    }
}

pub fn walk_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Ident(_)
        | ExprKind::This
        | ExprKind::Super
        | ExprKind::Null
        | ExprKind::Bool(_)
        | ExprKind::Num { .. }
        | ExprKind::BigInt(_)
        | ExprKind::Str { .. }
        | ExprKind::Regex { .. }
        | ExprKind::MetaProp { .. }
        | ExprKind::Invalid => {}
        ExprKind::Template(template) => {
            for e in &mut template.exprs {
                v.visit_expr(e);
            }
        }
        ExprKind::TaggedTemplate { tag, template } => {
            v.visit_expr(tag);
            for e in &mut template.exprs {
                v.visit_expr(e);
            }
        }
        ExprKind::Array(elems) => {
            for elem in elems.iter_mut().flatten() {
                v.visit_expr(&mut elem.expr);
            }
        }
        ExprKind::Object(props) => {
            for prop in props {
                match &mut prop.kind {
                    PropKind::KeyValue { key, value } => {
                        v.visit_prop_key(key);
                        v.visit_expr(value);
                    }
                    PropKind::Shorthand(ident) => v.visit_ident(ident),
                    PropKind::Method { key, function, .. } => {
                        v.visit_prop_key(key);
                        v.visit_function(function);
                    }
                    PropKind::Spread(e) => v.visit_expr(e),
                }
            }
        }
        ExprKind::Function(function) => v.visit_function(function),
        ExprKind::Arrow(arrow) => v.visit_arrow(arrow),
        ExprKind::Class(class) => v.visit_class(class),
        ExprKind::Unary { arg, .. } | ExprKind::Update { arg, .. } => v.visit_expr(arg),
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Assign { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Member { object, prop, .. } => {
            v.visit_expr(object);
            if let MemberProp::Computed(e) = prop {
                v.visit_expr(e);
            }
        }
        ExprKind::Call { callee, args, .. } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(&mut arg.expr);
            }
        }
        ExprKind::New { callee, args, .. } => {
            v.visit_expr(callee);
            for arg in args.iter_mut().flatten() {
                v.visit_expr(&mut arg.expr);
            }
        }
        ExprKind::Conditional { test, cons, alt } => {
            v.visit_expr(test);
            v.visit_expr(cons);
            v.visit_expr(alt);
        }
        ExprKind::Sequence(exprs) => {
            for e in exprs {
                v.visit_expr(e);
            }
        }
        ExprKind::OptChain(inner) | ExprKind::Await(inner) | ExprKind::TsNonNull(inner) => {
            v.visit_expr(inner)
        }
        ExprKind::Yield { arg, .. } => {
            if let Some(arg) = arg {
                v.visit_expr(arg);
            }
        }
        ExprKind::TsAs { expr, .. } | ExprKind::TsSatisfies { expr, .. } => v.visit_expr(expr),
    }
}

pub fn walk_pattern<V: VisitMut + ?Sized>(v: &mut V, pat: &mut Pattern) {
    match &mut pat.kind {
        PatternKind::Ident(_) => {}
        PatternKind::Array(elems) => {
            for elem in elems.iter_mut().flatten() {
                v.visit_pattern(elem);
            }
        }
        PatternKind::Object(props) => {
            for prop in props {
                match &mut prop.kind {
                    ObjectPatPropKind::KeyValue { key, value } => {
                        v.visit_prop_key(key);
                        v.visit_pattern(value);
                    }
                    ObjectPatPropKind::Shorthand { name, default } => {
                        v.visit_ident(name);
                        if let Some(default) = default {
                            v.visit_expr(default);
                        }
                    }
                    ObjectPatPropKind::Rest(rest) => v.visit_pattern(rest),
                }
            }
        }
        PatternKind::Assign { left, right } => {
            v.visit_pattern(left);
            v.visit_expr(right);
        }
        PatternKind::Rest(inner) => v.visit_pattern(inner),
        PatternKind::Expr(expr) => v.visit_expr(expr),
    }
}

pub fn walk_params<V: VisitMut + ?Sized>(v: &mut V, params: &mut [Param]) {
    for param in params {
        v.visit_pattern(&mut param.pat);
    }
}

pub fn walk_function<V: VisitMut + ?Sized>(v: &mut V, function: &mut Function) {
    if let Some(id) = &mut function.id {
        v.visit_ident(id);
    }
    walk_params(v, &mut function.params);
    if let Some(body) = &mut function.body {
        walk_block(v, body);
    }
}

pub fn walk_arrow<V: VisitMut + ?Sized>(v: &mut V, arrow: &mut ArrowFunction) {
    walk_params(v, &mut arrow.params);
    match &mut arrow.body {
        ArrowBody::Block(block) => walk_block(v, block),
        ArrowBody::Expr(expr) => v.visit_expr(expr),
    }
}

pub fn walk_class<V: VisitMut + ?Sized>(v: &mut V, class: &mut Class) {
    if let Some(id) = &mut class.id {
        v.visit_ident(id);
    }
    if let Some(super_class) = &mut class.super_class {
        v.visit_expr(super_class);
    }
    for member in &mut class.members {
        match &mut member.kind {
            ClassMemberKind::Method { key, function, .. } => {
                v.visit_prop_key(key);
                v.visit_function(function);
            }
            ClassMemberKind::Property { key, value, .. } => {
                v.visit_prop_key(key);
                if let Some(value) = value {
                    v.visit_expr(value);
                }
            }
            ClassMemberKind::StaticBlock(block) => walk_block(v, block),
        }
    }
}

pub fn walk_prop_key<V: VisitMut + ?Sized>(v: &mut V, key: &mut PropKey) {
    if let PropKey::Computed(expr) = key {
        v.visit_expr(expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    struct IdentCounter(usize);

    impl VisitMut for IdentCounter {
        fn visit_expr(&mut self, expr: &mut Expr) {
            if expr.as_ident().is_some() {
                self.0 += 1;
            }
            walk_expr(self, expr);
        }
    }

    struct Renamer;

    impl VisitMut for Renamer {
        fn visit_expr(&mut self, expr: &mut Expr) {
            walk_expr(self, expr);
            if let ExprKind::Ident(name) = &mut expr.kind {
                name.push('_');
            }
        }
    }

    fn sample() -> Program {
        let span = Span::default();
        let call = Expr::call(
            Expr::member(Expr::ident("console", span), "log", span),
            vec![Expr::binary(
                BinaryOp::Add,
                Expr::ident("a", span),
                Expr::ident("b", span),
                span,
            )],
            span,
        );
        Program {
            kind: ProgramKind::Script,
            body: vec![Stmt::new(
                StmtKind::If {
                    test: Expr::ident("ok", span),
                    cons: Box::new(Stmt::expr(call)),
                    alt: None,
                },
                span,
            )],
            span,
        }
    }

    #[test]
    fn test_visits_every_expression() {
        let mut program = sample();
        let mut counter = IdentCounter(0);
        counter.visit_program(&mut program);
        assert_eq!(counter.0, 4);
    }

    #[test]
    fn test_mutation_reaches_nested_nodes() {
        let mut program = sample();
        Renamer.visit_program(&mut program);
        let StmtKind::If { test, .. } = &program.body[0].kind else {
            panic!("expected if");
        };
        assert_eq!(test.as_ident(), Some("ok_"));
    }
}

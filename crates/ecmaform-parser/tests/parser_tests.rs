//! Parser tests.
//!
//! Covers: statements, automatic semicolon insertion, expressions
//! (precedence, optional chains, arrows, templates, destructuring), classes,
//! modules, the TypeScript subset, diagnostics and recovery, spans, the
//! nesting limit, and determinism.

use ecmaform_lexer::Dialect;
use ecmaform_parser::{parse_source, ParseResult};
use ecmaform_types::ast::*;
use ecmaform_types::{ErrorCode, SourceFile, Syntax};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse_with(source: &str, dialect: Dialect, syntax: Syntax) -> ParseResult {
    let sf = SourceFile::new("test.js", source);
    parse_source(&sf, dialect, syntax)
}

fn parse(source: &str) -> ParseResult {
    parse_with(source, Dialect::Module, Syntax::Ecmascript)
}

fn assert_clean(result: &ParseResult) {
    if result.errors.has_errors() {
        for e in result.errors.iter() {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
}

/// Parse a module and return its body, panicking on errors.
fn parse_ok(source: &str) -> Vec<Stmt> {
    let result = parse(source);
    assert_clean(&result);
    result.program.body
}

fn parse_ts_ok(source: &str) -> Vec<Stmt> {
    let result = parse_with(source, Dialect::Module, Syntax::Typescript);
    assert_clean(&result);
    result.program.body
}

/// The expression of a single expression statement.
fn expr_of(source: &str) -> Expr {
    let mut body = parse_ok(source);
    assert_eq!(body.len(), 1, "expected one statement");
    match body.remove(0).kind {
        StmtKind::Expr(expr) => *expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    parse(source).errors.iter().map(|d| d.code).collect()
}

fn ts_error_codes(source: &str) -> Vec<ErrorCode> {
    parse_with(source, Dialect::Module, Syntax::Typescript)
        .errors
        .iter()
        .map(|d| d.code)
        .collect()
}

fn init_of(stmt: &Stmt) -> &Expr {
    match &stmt.kind {
        StmtKind::Var(decl) => decl.decls[0].init.as_ref().expect("initializer"),
        other => panic!("expected variable declaration, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_program() {
    let result = parse("");
    assert_clean(&result);
    assert!(result.program.body.is_empty());
    assert_eq!(result.program.kind, ProgramKind::Module);
}

#[test]
fn test_variable_declarations() {
    let body = parse_ok("var a = 1, b; let c = 2; const d = 3;");
    assert_eq!(body.len(), 3);
    match &body[0].kind {
        StmtKind::Var(decl) => {
            assert_eq!(decl.kind, VarKind::Var);
            assert_eq!(decl.decls.len(), 2);
            assert!(decl.decls[1].init.is_none());
        }
        other => panic!("expected var, got {other:?}"),
    }
    assert!(matches!(&body[1].kind, StmtKind::Var(d) if d.kind == VarKind::Let));
    assert!(matches!(&body[2].kind, StmtKind::Var(d) if d.kind == VarKind::Const));
}

#[test]
fn test_let_as_identifier() {
    let result = parse_with("let = 5;", Dialect::Script, Syntax::Ecmascript);
    assert_clean(&result);
    assert!(matches!(result.program.body[0].kind, StmtKind::Expr(_)));
}

#[test]
fn test_control_flow() {
    let body = parse_ok(
        "if (a) b(); else { c(); }\n\
         while (x) x--;\n\
         do { y++; } while (y < 10);\n\
         for (let i = 0; i < 3; i++) {}\n\
         for (;;) break;\n\
         switch (k) { case 1: one(); break; default: other(); }\n\
         try { risky(); } catch (e) { handle(e); } finally { done(); }\n\
         try { risky(); } catch { }",
    );
    assert_eq!(body.len(), 8);
    assert!(matches!(body[0].kind, StmtKind::If { alt: Some(_), .. }));
    assert!(matches!(body[1].kind, StmtKind::While { .. }));
    assert!(matches!(body[2].kind, StmtKind::DoWhile { .. }));
    assert!(matches!(body[3].kind, StmtKind::For { init: Some(ForInit::Var(_)), .. }));
    assert!(matches!(
        body[4].kind,
        StmtKind::For {
            init: None,
            test: None,
            update: None,
            ..
        }
    ));
    match &body[5].kind {
        StmtKind::Switch { cases, .. } => {
            assert_eq!(cases.len(), 2);
            assert!(cases[1].test.is_none());
            assert_eq!(cases[0].body.len(), 2);
        }
        other => panic!("expected switch, got {other:?}"),
    }
    assert!(matches!(
        body[6].kind,
        StmtKind::Try {
            handler: Some(_),
            finalizer: Some(_),
            ..
        }
    ));
    match &body[7].kind {
        StmtKind::Try {
            handler: Some(handler),
            ..
        } => assert!(handler.param.is_none()),
        other => panic!("expected try, got {other:?}"),
    }
}

#[test]
fn test_for_of_with_destructuring() {
    let body = parse_ok("for (const [k, v] of map) {}");
    match &body[0].kind {
        StmtKind::ForOf {
            left: ForHead::Var(decl),
            is_await,
            ..
        } => {
            assert!(!is_await);
            assert_eq!(decl.decls[0].name.bound_names(), vec!["k", "v"]);
        }
        other => panic!("expected for-of, got {other:?}"),
    }
}

#[test]
fn test_for_in_with_member_target() {
    let body = parse_ok("for (x.y in o);");
    match &body[0].kind {
        StmtKind::ForIn {
            left: ForHead::Pattern(pat),
            ..
        } => assert!(matches!(pat.kind, PatternKind::Expr(_))),
        other => panic!("expected for-in, got {other:?}"),
    }
}

#[test]
fn test_for_in_initializer_is_not_in_operator() {
    let body = parse_ok("for (var k in obj) {}");
    assert!(matches!(
        body[0].kind,
        StmtKind::ForIn {
            left: ForHead::Var(_),
            ..
        }
    ));
}

#[test]
fn test_for_await() {
    let body = parse_ok("async function f() { for await (const x of xs) {} }");
    match &body[0].kind {
        StmtKind::Function(f) => {
            let stmts = &f.body.as_ref().expect("body").stmts;
            assert!(matches!(stmts[0].kind, StmtKind::ForOf { is_await: true, .. }));
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn test_labeled_break() {
    let body = parse_ok("outer: for (;;) { break outer; }");
    match &body[0].kind {
        StmtKind::Labeled { label, body } => {
            assert_eq!(label.name, "outer");
            assert!(matches!(body.kind, StmtKind::For { .. }));
        }
        other => panic!("expected labeled statement, got {other:?}"),
    }
}

#[test]
fn test_directive_prologue() {
    let body = parse_ok("'use strict';\nfoo();");
    assert!(body[0].is_directive());
    assert!(!body[1].is_directive());
}

// ─────────────────────────────────────────────────────────────────────
// Automatic semicolon insertion
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_asi_between_lines() {
    let body = parse_ok("let a = 1\nlet b = 2\nfoo()");
    assert_eq!(body.len(), 3);
}

#[test]
fn test_asi_restricted_return() {
    let body = parse_ok("function f() {\n  return\n  1\n}");
    match &body[0].kind {
        StmtKind::Function(f) => {
            let stmts = &f.body.as_ref().expect("body").stmts;
            assert_eq!(stmts.len(), 2);
            assert!(matches!(stmts[0].kind, StmtKind::Return(None)));
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn test_asi_restricted_postfix() {
    let body = parse_ok("a\n++b");
    assert_eq!(body.len(), 2);
    match &body[1].kind {
        StmtKind::Expr(expr) => {
            assert!(matches!(expr.kind, ExprKind::Update { prefix: true, .. }))
        }
        other => panic!("expected expression, got {other:?}"),
    }
}

#[test]
fn test_asi_before_closing_brace() {
    let body = parse_ok("function f() { return 1 }");
    assert_eq!(body.len(), 1);
}

#[test]
fn test_missing_semicolon_on_same_line() {
    assert_eq!(error_codes("let a = 1 let b = 2;"), vec![ErrorCode::UNEXPECTED_TOKEN]);
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_binary_precedence() {
    let expr = expr_of("1 + 2 * 3;");
    match expr.kind {
        ExprKind::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. })),
        other => panic!("expected addition, got {other:?}"),
    }
}

#[test]
fn test_exponent_is_right_associative() {
    let expr = expr_of("a ** b ** c;");
    match expr.kind {
        ExprKind::Binary {
            op: BinaryOp::Exp,
            left,
            right,
        } => {
            assert!(matches!(left.kind, ExprKind::Ident(_)));
            assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Exp, .. }));
        }
        other => panic!("expected exponent, got {other:?}"),
    }
}

#[test]
fn test_unary_before_exponent_is_rejected() {
    assert_eq!(error_codes("-2 ** 2;"), vec![ErrorCode::UNEXPECTED_TOKEN]);
    assert!(error_codes("(-2) ** 2; 2 ** -1;").is_empty());
}

#[test]
fn test_nullish_mixing_requires_parens() {
    assert_eq!(error_codes("a ?? b || c;"), vec![ErrorCode::UNEXPECTED_TOKEN]);
    assert_eq!(error_codes("a && b ?? c;"), vec![ErrorCode::UNEXPECTED_TOKEN]);
    assert!(error_codes("(a ?? b) || c; a ?? (b && c);").is_empty());
}

#[test]
fn test_conditional_and_assignment() {
    let expr = expr_of("x = a ? b : c;");
    match expr.kind {
        ExprKind::Assign {
            op: AssignOp::Assign,
            value,
            ..
        } => assert!(matches!(value.kind, ExprKind::Conditional { .. })),
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn test_logical_assignment_operators() {
    for (source, op) in [
        ("a &&= b;", AssignOp::AndAssign),
        ("a ||= b;", AssignOp::OrAssign),
        ("a ??= b;", AssignOp::NullishAssign),
    ] {
        assert!(
            matches!(expr_of(source).kind, ExprKind::Assign { op: o, .. } if o == op),
            "{source}"
        );
    }
}

#[test]
fn test_sequence_expression() {
    assert!(matches!(expr_of("a, b, c;").kind, ExprKind::Sequence(ref v) if v.len() == 3));
}

#[test]
fn test_optional_chain() {
    let expr = expr_of("a?.b.c();");
    let ExprKind::OptChain(inner) = expr.kind else {
        panic!("expected optional chain");
    };
    let ExprKind::Call { callee, optional, .. } = inner.kind else {
        panic!("expected call");
    };
    assert!(!optional);
    let ExprKind::Member {
        object,
        optional: false,
        ..
    } = callee.kind
    else {
        panic!("expected member");
    };
    assert!(matches!(object.kind, ExprKind::Member { optional: true, .. }));
}

#[test]
fn test_optional_call_and_index() {
    assert!(matches!(expr_of("f?.(x);").kind, ExprKind::OptChain(_)));
    assert!(matches!(expr_of("o?.[k];").kind, ExprKind::OptChain(_)));
}

#[test]
fn test_new_expressions() {
    match expr_of("new Foo;").kind {
        ExprKind::New { args, .. } => assert!(args.is_none()),
        other => panic!("expected new, got {other:?}"),
    }
    match expr_of("new Foo.Bar(1);").kind {
        ExprKind::New { callee, args, .. } => {
            assert!(matches!(callee.kind, ExprKind::Member { .. }));
            assert_eq!(args.map(|a| a.len()), Some(1));
        }
        other => panic!("expected new, got {other:?}"),
    }
    let body = parse_ok("function F() { return new.target; }");
    match &body[0].kind {
        StmtKind::Function(f) => {
            let stmts = &f.body.as_ref().expect("body").stmts;
            assert!(matches!(
                &stmts[0].kind,
                StmtKind::Return(Some(e)) if matches!(&e.kind, ExprKind::MetaProp { meta, .. } if meta == "new")
            ));
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn test_arrow_functions() {
    match expr_of("x => x * 2;").kind {
        ExprKind::Arrow(arrow) => {
            assert_eq!(arrow.params.len(), 1);
            assert!(!arrow.is_async);
            assert!(matches!(arrow.body, ArrowBody::Expr(_)));
        }
        other => panic!("expected arrow, got {other:?}"),
    }
    match expr_of("async (a, b = 1, ...rest) => { await a; };").kind {
        ExprKind::Arrow(arrow) => {
            assert_eq!(arrow.params.len(), 3);
            assert!(arrow.is_async);
            assert!(matches!(arrow.params[1].pat.kind, PatternKind::Assign { .. }));
            assert!(matches!(arrow.params[2].pat.kind, PatternKind::Rest(_)));
            assert!(matches!(arrow.body, ArrowBody::Block(_)));
        }
        other => panic!("expected arrow, got {other:?}"),
    }
    match expr_of("async x => x;").kind {
        ExprKind::Arrow(arrow) => assert!(arrow.is_async),
        other => panic!("expected arrow, got {other:?}"),
    }
    match expr_of("({ a, b }) => a + b;").kind {
        ExprKind::Arrow(arrow) => {
            assert!(matches!(arrow.params[0].pat.kind, PatternKind::Object(_)))
        }
        other => panic!("expected arrow, got {other:?}"),
    }
}

#[test]
fn test_async_call_is_not_arrow() {
    assert!(matches!(expr_of("async(a, b);").kind, ExprKind::Call { .. }));
}

#[test]
fn test_template_literals() {
    match expr_of("`a${b}c${d}e`;").kind {
        ExprKind::Template(t) => {
            assert_eq!(t.quasis.len(), 3);
            assert_eq!(t.exprs.len(), 2);
            assert_eq!(t.quasis[1].cooked.as_deref(), Some("c"));
        }
        other => panic!("expected template, got {other:?}"),
    }
    assert!(matches!(expr_of("tag`x`;").kind, ExprKind::TaggedTemplate { .. }));
}

#[test]
fn test_invalid_escape_allowed_only_in_tagged_template() {
    assert!(error_codes("tag`\\unicode`;").is_empty());
    assert_eq!(error_codes("`\\unicode`;"), vec![ErrorCode::INVALID_ESCAPE]);
}

#[test]
fn test_object_literal() {
    let expr = expr_of("({ a, b: 1, [c]: 2, ...d, m() {}, get g() { return 1 }, 'q': 3, 4: 5 });");
    match expr.kind {
        ExprKind::Object(props) => {
            assert_eq!(props.len(), 8);
            assert!(matches!(props[0].kind, PropKind::Shorthand(_)));
            assert!(matches!(props[2].kind, PropKind::KeyValue { key: PropKey::Computed(_), .. }));
            assert!(matches!(props[3].kind, PropKind::Spread(_)));
            assert!(matches!(props[4].kind, PropKind::Method { kind: MethodKind::Method, .. }));
            assert!(matches!(props[5].kind, PropKind::Method { kind: MethodKind::Getter, .. }));
        }
        other => panic!("expected object, got {other:?}"),
    }
}

#[test]
fn test_array_literal_with_holes_and_spread() {
    match expr_of("[1, , ...xs];").kind {
        ExprKind::Array(elems) => {
            assert_eq!(elems.len(), 3);
            assert!(elems[1].is_none());
            assert!(elems[2].as_ref().is_some_and(|e| e.spread));
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn test_destructuring_assignment() {
    assert!(matches!(expr_of("[a, b] = [b, a];").kind, ExprKind::Assign { .. }));
    assert!(matches!(expr_of("({ a = 1, b: { c } } = obj);").kind, ExprKind::Assign { .. }));
}

#[test]
fn test_regex_literal() {
    match expr_of("/ab+c/g.test(s);").kind {
        ExprKind::Call { callee, .. } => match callee.kind {
            ExprKind::Member { object, .. } => {
                assert!(matches!(object.kind, ExprKind::Regex { ref flags, .. } if flags == "g"))
            }
            other => panic!("expected member, got {other:?}"),
        },
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn test_dynamic_import_and_import_meta() {
    assert!(matches!(expr_of("import('./m');").kind, ExprKind::Call { .. }));
    assert!(matches!(expr_of("import.meta.url;").kind, ExprKind::Member { .. }));
}

#[test]
fn test_raw_literals_preserved() {
    match expr_of("0x1F;").kind {
        ExprKind::Num { value, raw } => {
            assert_eq!(value, 31.0);
            assert_eq!(raw.as_deref(), Some("0x1F"));
        }
        other => panic!("expected number, got {other:?}"),
    }
    match expr_of("'it\\'s';").kind {
        ExprKind::Str { value, raw } => {
            assert_eq!(value, "it's");
            assert_eq!(raw.as_deref(), Some("'it\\'s'"));
        }
        other => panic!("expected string, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Functions & classes
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_generator_function() {
    let body = parse_ok("function* g() { yield 1; yield* other(); yield; }");
    match &body[0].kind {
        StmtKind::Function(f) => {
            assert!(f.is_generator);
            let stmts = &f.body.as_ref().expect("body").stmts;
            assert_eq!(stmts.len(), 3);
            let delegates: Vec<bool> = stmts
                .iter()
                .map(|s| match &s.kind {
                    StmtKind::Expr(e) => matches!(e.kind, ExprKind::Yield { delegate: true, .. }),
                    _ => false,
                })
                .collect();
            assert_eq!(delegates, vec![false, true, false]);
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn test_class_members() {
    let body = parse_ok(
        "class A extends B {\n\
           static #count = 0;\n\
           static { init(); }\n\
           get x() { return 1; }\n\
           constructor() { super(); }\n\
           async *items() {}\n\
         }",
    );
    match &body[0].kind {
        StmtKind::Class(class) => {
            assert!(class.super_class.is_some());
            assert_eq!(class.members.len(), 5);
            assert!(matches!(
                class.members[0].kind,
                ClassMemberKind::Property {
                    key: PropKey::PrivateName(_),
                    is_static: true,
                    ..
                }
            ));
            assert!(matches!(class.members[1].kind, ClassMemberKind::StaticBlock(_)));
            assert!(matches!(
                class.members[2].kind,
                ClassMemberKind::Method {
                    kind: MethodKind::Getter,
                    ..
                }
            ));
            assert!(matches!(
                class.members[3].kind,
                ClassMemberKind::Method {
                    kind: MethodKind::Constructor,
                    ..
                }
            ));
            match &class.members[4].kind {
                ClassMemberKind::Method { function, .. } => {
                    assert!(function.is_async);
                    assert!(function.is_generator);
                }
                other => panic!("expected method, got {other:?}"),
            }
        }
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn test_class_expression_and_anonymous_default() {
    let body = parse_ok("const C = class {};\nexport default class {}");
    assert!(matches!(init_of(&body[0]).kind, ExprKind::Class(_)));
    assert!(matches!(
        body[1].kind,
        StmtKind::Export(ExportDecl::Default(DefaultExport::Class(_)))
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_import_forms() {
    let body = parse_ok(
        "import a, { b as c, d } from \"m\";\n\
         import * as ns from './ns';\n\
         import './side-effect';",
    );
    match &body[0].kind {
        StmtKind::Import(decl) => {
            assert_eq!(decl.specifiers.len(), 3);
            assert_eq!(decl.source.value, "m");
            let locals: Vec<&str> = decl.specifiers.iter().map(|s| s.local().name.as_str()).collect();
            assert_eq!(locals, vec!["a", "c", "d"]);
        }
        other => panic!("expected import, got {other:?}"),
    }
    assert!(matches!(
        &body[1].kind,
        StmtKind::Import(decl) if matches!(decl.specifiers[0], ImportSpecifier::Namespace(_))
    ));
    assert!(matches!(&body[2].kind, StmtKind::Import(decl) if decl.specifiers.is_empty()));
}

#[test]
fn test_export_forms() {
    let body = parse_ok(
        "export const x = 1;\n\
         export function f() {}\n\
         export { x as y, f };\n\
         export * from 'a';\n\
         export * as ns from 'b';\n\
         export { default as z } from 'c';\n\
         export default x + 1;",
    );
    assert_eq!(body.len(), 7);
    assert!(matches!(body[0].kind, StmtKind::Export(ExportDecl::Decl(_))));
    match &body[2].kind {
        StmtKind::Export(ExportDecl::Named {
            specifiers,
            source: None,
            ..
        }) => {
            assert_eq!(specifiers[0].exported_name(), "y");
            assert_eq!(specifiers[1].exported_name(), "f");
        }
        other => panic!("expected named export, got {other:?}"),
    }
    assert!(matches!(body[3].kind, StmtKind::Export(ExportDecl::All { exported: None, .. })));
    assert!(matches!(
        body[4].kind,
        StmtKind::Export(ExportDecl::All {
            exported: Some(_),
            ..
        })
    ));
    assert!(matches!(
        body[5].kind,
        StmtKind::Export(ExportDecl::Named { source: Some(_), .. })
    ));
    assert!(matches!(
        body[6].kind,
        StmtKind::Export(ExportDecl::Default(DefaultExport::Expr(_)))
    ));
}

#[test]
fn test_module_syntax_in_script_reported() {
    let result = parse_with("import x from 'y';\nx();", Dialect::Script, Syntax::Ecmascript);
    let codes: Vec<ErrorCode> = result.errors.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::MODULE_SYNTAX_IN_SCRIPT]);
    assert_eq!(result.program.body.len(), 2);
    assert_eq!(result.program.kind, ProgramKind::Script);
}

// ─────────────────────────────────────────────────────────────────────
// TypeScript
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ts_declarations() {
    let body = parse_ts_ok(
        "interface A<T> extends B { x: number; y?: string; m(a: T): void; [k: string]: any }\n\
         type U = string | number;\n\
         enum Color { Red, Green = 5, \"Blue\" }\n\
         const enum Flags { A = 1 << 0 }\n\
         declare const VERSION: string;\n\
         declare module 'x' { export const y: number; }",
    );
    assert_eq!(body.len(), 6);
    match &body[0].kind {
        StmtKind::TsInterface(decl) => {
            assert_eq!(decl.body.len(), 4);
            assert_eq!(decl.extends.len(), 1);
        }
        other => panic!("expected interface, got {other:?}"),
    }
    assert!(matches!(
        &body[1].kind,
        StmtKind::TsTypeAlias(decl) if matches!(decl.ty.kind, TsTypeKind::Union(_))
    ));
    assert!(matches!(&body[2].kind, StmtKind::TsEnum(decl) if decl.members.len() == 3 && !decl.is_const));
    assert!(matches!(&body[3].kind, StmtKind::TsEnum(decl) if decl.is_const));
    assert!(matches!(body[4].kind, StmtKind::TsDeclare(_)));
    assert!(matches!(body[5].kind, StmtKind::TsDeclare(_)));
    assert!(body.iter().all(Stmt::is_typescript_only));
}

#[test]
fn test_ts_annotations_on_functions() {
    let body = parse_ts_ok(
        "function f(this: Window, a: number, b?: string): void {}\n\
         function g(x: number): number;\n\
         function g(x: any) { return x; }",
    );
    match &body[0].kind {
        StmtKind::Function(f) => {
            assert_eq!(f.params.len(), 3);
            assert!(f.params[2].optional);
            assert!(f.return_type.is_some());
        }
        other => panic!("expected function, got {other:?}"),
    }
    assert!(matches!(&body[1].kind, StmtKind::Function(f) if f.body.is_none()));
    assert!(matches!(&body[2].kind, StmtKind::Function(f) if f.body.is_some()));
}

#[test]
fn test_ts_expressions() {
    let body = parse_ts_ok(
        "let x = y as unknown as string;\n\
         let n = v!.length;\n\
         let r = f<string>(x);\n\
         let c = a < b && c > d;\n\
         let s = cfg satisfies Config;\n\
         let g = <T,>(x: T): T => x;",
    );
    assert!(matches!(init_of(&body[0]).kind, ExprKind::TsAs { .. }));
    match &init_of(&body[1]).kind {
        ExprKind::Member { object, .. } => assert!(matches!(object.kind, ExprKind::TsNonNull(_))),
        other => panic!("expected member, got {other:?}"),
    }
    assert!(matches!(&init_of(&body[2]).kind, ExprKind::Call { type_args, .. } if type_args.len() == 1));
    assert!(matches!(
        init_of(&body[3]).kind,
        ExprKind::Binary {
            op: BinaryOp::LogicalAnd,
            ..
        }
    ));
    assert!(matches!(init_of(&body[4]).kind, ExprKind::TsSatisfies { .. }));
    match &init_of(&body[5]).kind {
        ExprKind::Arrow(arrow) => {
            assert_eq!(arrow.type_params.len(), 1);
            assert!(arrow.return_type.is_some());
        }
        other => panic!("expected arrow, got {other:?}"),
    }
}

#[test]
fn test_ts_class_features() {
    let body = parse_ts_ok(
        "abstract class C<T> extends Base<T> implements I, J {\n\
           private x: number = 1;\n\
           readonly y?: string;\n\
           declare z: boolean;\n\
           abstract run(): void;\n\
           constructor() { super(); }\n\
         }",
    );
    match &body[0].kind {
        StmtKind::Class(class) => {
            assert_eq!(class.implements.len(), 2);
            assert_eq!(class.type_params.len(), 1);
            assert_eq!(class.members.len(), 5);
            assert!(matches!(
                class.members[0].kind,
                ClassMemberKind::Property {
                    accessibility: Some(Accessibility::Private),
                    ..
                }
            ));
            assert!(matches!(
                class.members[2].kind,
                ClassMemberKind::Property { declare: true, .. }
            ));
            assert!(matches!(
                &class.members[3].kind,
                ClassMemberKind::Method { function, .. } if function.body.is_none()
            ));
        }
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn test_ts_complex_types() {
    parse_ts_ok(
        "type A = { [K in keyof T]?: T[K] };\n\
         type B<T> = T extends string ? 'yes' : 'no';\n\
         type C = [first: string, second?: number, ...rest: boolean[]];\n\
         type D = (a: number) => void;\n\
         type E = new () => Foo;\n\
         type F = Array<Map<string, Set<number>>>;\n\
         function isStr(x: unknown): x is string { return typeof x === 'string'; }",
    );
}

#[test]
fn test_ts_type_only_imports_and_exports() {
    let body = parse_ts_ok(
        "import type { A } from './a';\n\
         import { type B, C } from './b';\n\
         export type { D } from './d';",
    );
    assert!(matches!(&body[0].kind, StmtKind::Import(decl) if decl.type_only));
    match &body[1].kind {
        StmtKind::Import(decl) => {
            assert!(!decl.type_only);
            assert!(matches!(decl.specifiers[0], ImportSpecifier::Named { type_only: true, .. }));
            assert!(matches!(decl.specifiers[1], ImportSpecifier::Named { type_only: false, .. }));
        }
        other => panic!("expected import, got {other:?}"),
    }
    assert!(matches!(
        body[2].kind,
        StmtKind::Export(ExportDecl::Named { type_only: true, .. })
    ));
}

#[test]
fn test_ts_unsupported_constructs() {
    assert_eq!(ts_error_codes("namespace N { }"), vec![ErrorCode::UNSUPPORTED_SYNTAX]);
    assert!(ts_error_codes("class P { constructor(private x: number) {} }")
        .contains(&ErrorCode::UNSUPPORTED_SYNTAX));
    assert!(ts_error_codes("import fs = require('fs');").contains(&ErrorCode::UNSUPPORTED_SYNTAX));
}

#[test]
fn test_types_rejected_without_typescript() {
    assert!(!error_codes("let x: number = 1;").is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Diagnostics & recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_recovery_continues_after_bad_statement() {
    let result = parse("var a = ;\nvar b = 1;");
    assert_eq!(result.errors.total_errors, 1);
    assert_eq!(result.program.body.len(), 1);
}

#[test]
fn test_one_diagnostic_per_malformed_statement() {
    let result = parse("var a = ;\nvar b = ;\nvar c = 3;\nlet d = );");
    assert_eq!(result.errors.total_errors, 3);
    assert_eq!(result.program.body.len(), 1);
    let lines: Vec<u32> = result.errors.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![1, 2, 4]);
}

#[test]
fn test_invalid_assignment_targets() {
    assert_eq!(error_codes("1 = 2;"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("a?.b = 1;"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("f() += 1;"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("[a] += 1;"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("++f();"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
}

#[test]
fn test_missing_initializer() {
    let result = parse("const x;\nlet [a] ;");
    let codes: Vec<ErrorCode> = result.errors.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::MISSING_INITIALIZER, ErrorCode::MISSING_INITIALIZER]);
    assert_eq!(result.program.body.len(), 2);
}

#[test]
fn test_with_statement_unsupported() {
    assert_eq!(error_codes("with (o) { x; }"), vec![ErrorCode::UNSUPPORTED_SYNTAX]);
}

#[test]
fn test_lexer_and_parser_errors_merged_in_order() {
    let result = parse("var a = ;\nlet s = \"open\nvar c = 1;");
    let codes: Vec<ErrorCode> = result.errors.iter().map(|d| d.code).collect();
    assert_eq!(codes.first(), Some(&ErrorCode::UNEXPECTED_TOKEN));
    assert!(codes.contains(&ErrorCode::UNTERMINATED_STRING));
    let starts: Vec<u32> = result.errors.iter().map(|d| d.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[test]
fn test_diagnostic_positions() {
    let result = parse("let ok = 1;\n  let bad = );");
    let d = &result.errors.items[0];
    assert_eq!(d.line, 2);
    assert_eq!(d.column, 13);
    assert_eq!(d.source_line, "  let bad = );");
    assert_eq!(d.file, "test.js");
}

#[test]
fn test_diagnostics_capped_but_counted() {
    let source = "var x = ;\n".repeat(150);
    let result = parse(&source);
    assert_eq!(result.errors.len(), 100);
    assert_eq!(result.errors.total_errors, 150);
}

#[test]
fn test_stray_closing_brace() {
    let result = parse("a();\n}\nb();");
    assert_eq!(result.errors.total_errors, 1);
    assert_eq!(result.program.body.len(), 2);
}

// ─────────────────────────────────────────────────────────────────────
// Spans
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_statement_spans() {
    let body = parse_ok("var x = 1;\nfoo(bar);");
    assert_eq!((body[0].span.start, body[0].span.end), (0, 10));
    assert_eq!((body[1].span.start, body[1].span.end), (11, 20));
    let init = init_of(&body[0]);
    assert_eq!((init.span.start, init.span.end), (8, 9));
}

#[test]
fn test_child_spans_nest_within_parents() {
    fn check(expr: &Expr, parent: ecmaform_types::Span) {
        assert!(parent.contains(expr.span), "{:?} not within {:?}", expr.span, parent);
        match &expr.kind {
            ExprKind::Binary { left, right, .. } => {
                check(left, expr.span);
                check(right, expr.span);
            }
            ExprKind::Call { callee, args, .. } => {
                check(callee, expr.span);
                for arg in args {
                    check(&arg.expr, expr.span);
                }
            }
            ExprKind::Member { object, .. } => check(object, expr.span),
            _ => {}
        }
    }
    let body = parse_ok("let v = a.b(c + d * e, (f));");
    let init = init_of(&body[0]);
    check(init, body[0].span);
}

#[test]
fn test_program_span_covers_source() {
    let source = "  foo();  \n";
    let result = parse(source);
    assert_eq!(result.program.span.start, 0);
    assert_eq!(result.program.span.end as usize, source.len());
}

// ─────────────────────────────────────────────────────────────────────
// Nesting limit
// ─────────────────────────────────────────────────────────────────────

fn on_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(f)
        .expect("spawn")
        .join()
        .expect("join")
}

#[test]
fn test_moderate_nesting_is_accepted() {
    on_big_stack(|| {
        let source = format!("x = {}1{};", "[".repeat(40), "]".repeat(40));
        let result = parse(&source);
        assert_clean(&result);
    });
}

#[test]
fn test_nesting_limit_reported_once() {
    on_big_stack(|| {
        let source = format!("x = {}1{};", "[".repeat(300), "]".repeat(300));
        let result = parse(&source);
        let codes: Vec<ErrorCode> = result.errors.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![ErrorCode::NESTING_LIMIT_EXCEEDED]);
    });
}

#[test]
fn test_deep_blocks_hit_limit() {
    on_big_stack(|| {
        let source = format!("{}{}", "{".repeat(400), "}".repeat(400));
        let result = parse(&source);
        assert!(result
            .errors
            .iter()
            .any(|d| d.code == ErrorCode::NESTING_LIMIT_EXCEEDED));
    });
}

fn has_nesting_error(source: &str) -> bool {
    parse(source)
        .errors
        .iter()
        .any(|d| d.code == ErrorCode::NESTING_LIMIT_EXCEEDED)
}

#[test]
fn test_long_binary_chain_hits_limit() {
    let source = format!("x = 1{};", " + 1".repeat(100_000));
    assert!(has_nesting_error(&source));
}

#[test]
fn test_long_call_chain_hits_limit() {
    let source = format!("f{};", "()".repeat(100_000));
    assert!(has_nesting_error(&source));
}

#[test]
fn test_long_member_chain_hits_limit() {
    let source = format!("a{};", ".b".repeat(100_000));
    assert!(has_nesting_error(&source));
}

#[test]
fn test_long_right_assoc_chain_hits_limit() {
    on_big_stack(|| {
        let source = format!("x = 2{};", " ** 2".repeat(10_000));
        assert!(has_nesting_error(&source));
    });
}

#[test]
fn test_long_prefix_chain_hits_limit() {
    on_big_stack(|| {
        let source = format!("x = {}1;", "!".repeat(10_000));
        assert!(has_nesting_error(&source));
    });
}

#[test]
fn test_template_substitutions_count_toward_limit() {
    let many = format!("x = `{}`;", "${a}".repeat(10_000));
    assert!(has_nesting_error(&many));
    let few = format!("x = `{}`;", "${a}".repeat(100));
    assert_clean(&parse(&few));
}

#[test]
fn test_short_chains_are_accepted() {
    assert_clean(&parse(&format!("x = 1{};", " + 1".repeat(200))));
    assert_clean(&parse(&format!("a{};", ".b".repeat(200))));
    assert_clean(&parse(&format!("f{};", "()".repeat(200))));
}

#[test]
fn test_one_level_per_parenthesis() {
    on_big_stack(|| {
        assert_clean(&parse(&format!("x = {}1{};", "(".repeat(250), ")".repeat(250))));
        let deeper = format!("x = {}1{};", "(".repeat(260), ")".repeat(260));
        assert!(has_nesting_error(&deeper));
    });
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = "import { a } from 'a';\n\
                  export const f = async (x, { y = 1 } = {}) => a?.[x] ?? `${y}`;\n\
                  class K extends a { #p = 1; get p() { return this.#p; } }\n\
                  var bad = ;";
    let reference = parse(source);
    let reference_ast = format!("{:?}", reference.program);
    let reference_errors = format!("{:?}", reference.errors);
    for i in 0..100 {
        let result = parse(source);
        assert_eq!(
            format!("{:?}", result.program),
            reference_ast,
            "Determinism failure at iteration {i}"
        );
        assert_eq!(
            format!("{:?}", result.errors),
            reference_errors,
            "Determinism failure at iteration {i}"
        );
    }
}

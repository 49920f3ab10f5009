//! Emitter tests.
//!
//! Covers: pretty round-trips of canonical source, precedence-driven
//! parentheses for synthesized trees, statement-start ambiguities, compact
//! mode, source maps, TypeScript rejection, and determinism.

use ecmaform_codegen::source_map::decode_mappings;
use ecmaform_codegen::{emit, to_source, EmitError, SourceMap};
use ecmaform_lexer::Dialect;
use ecmaform_parser::parse_source;
use ecmaform_types::ast::*;
use ecmaform_types::{ErrorCode, MinifyOptions, SourceFile, Span, Syntax, TransformConfig};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str, syntax: Syntax) -> (Program, SourceFile) {
    let sf = SourceFile::new("test.js", source);
    let result = parse_source(&sf, Dialect::Module, syntax);
    for e in result.errors.iter() {
        eprintln!("  ERROR: {} ({})", e.message, e.code);
    }
    assert!(!result.errors.has_errors(), "unexpected parse errors (see above)");
    (result.program, sf)
}

fn print(source: &str) -> String {
    let (program, sf) = parse(source, Syntax::Ecmascript);
    to_source(&program, &sf).expect("emit failed")
}

fn print_compact(source: &str) -> String {
    let (program, sf) = parse(source, Syntax::Ecmascript);
    let config = TransformConfig::builder()
        .minify(MinifyOptions {
            compress: false,
            whitespace: true,
        })
        .build();
    emit(&program, &config, &sf).expect("emit failed").code
}

/// Canonical source prints back unchanged.
fn assert_roundtrip(source: &str) {
    assert_eq!(print(source), source);
}

fn print_synthesized(stmts: Vec<Stmt>) -> String {
    let sf = SourceFile::new("synthetic.js", "");
    let program = Program {
        kind: ProgramKind::Module,
        body: stmts,
        span: Span::default(),
    };
    to_source(&program, &sf).expect("emit failed")
}

fn id(name: &str) -> Expr {
    Expr::ident(name, Span::default())
}

// ─────────────────────────────────────────────────────────────────────
// Pretty round-trips
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_hello_world() {
    assert_roundtrip("console.log(\"hello world\");");
}

#[test]
fn test_no_trailing_newline() {
    assert_eq!(print("a();\n\n\nb();\n"), "a();\nb();");
}

#[test]
fn test_raw_literals_preserved() {
    assert_roundtrip("var x = 0x10, y = 'single', z = 1e3, w = 10n;");
    assert_roundtrip("/ab+c/gi.test(s);");
}

#[test]
fn test_functions_and_params() {
    assert_roundtrip("function f(a, b = 1, ...rest) {\n    return a + b;\n}");
    assert_roundtrip("async function* g() {\n    yield* other();\n    await x;\n}");
    assert_roundtrip("var f = function(name) {\n    return name;\n};");
}

#[test]
fn test_control_flow() {
    assert_roundtrip("if (x) {\n    a();\n} else if (y) {\n    b();\n} else {\n    c();\n}");
    assert_roundtrip("for (var i = 0; i < n; i++) {}");
    assert_roundtrip("for (;;) break;");
    assert_roundtrip("for (const x of xs) f(x);");
    assert_roundtrip("for (var k in o) {\n    g(k);\n}");
    assert_roundtrip("while (a) a--;");
    assert_roundtrip("do {\n    a();\n} while (b);");
    assert_roundtrip("outer: for (;;) {\n    continue outer;\n}");
}

#[test]
fn test_switch_and_try() {
    assert_roundtrip(
        "switch (x) {\n    case 1:\n        a();\n        break;\n    default:\n        b();\n}",
    );
    assert_roundtrip("try {\n    a();\n} catch (e) {\n    b(e);\n} finally {\n    c();\n}");
    assert_roundtrip("try {} catch {}");
}

#[test]
fn test_classes() {
    assert_roundtrip(
        "class A extends B {\n    constructor() {\n        super();\n    }\n    static x = 1;\n    #p;\n    get y() {\n        return this.#p;\n    }\n    static {\n        init();\n    }\n}",
    );
}

#[test]
fn test_objects_and_arrays() {
    assert_roundtrip("var o = { a: 1, b, [c]: 2, ...d };");
    assert_roundtrip("var o = {\n    m() {\n        return 1;\n    },\n    f: function() {}\n};");
    assert_roundtrip("var a = [1, , 3, ...rest];");
    assert_roundtrip("var { a, b: [c], ...d } = o;");
}

#[test]
fn test_nested_object_layout() {
    assert_roundtrip("var o = { a: { b: 1 }, c: [{ d: 2 }] };");
    assert_roundtrip("var o = {\n    a: {\n        b() {}\n    },\n    c: 1\n};");
    assert_eq!(
        print("var o = { a: [{ f() { return 1; } }], b: 2 };"),
        "var o = {\n    a: [{\n        f() {\n            return 1;\n        }\n    }],\n    b: 2\n};"
    );
}

#[test]
fn test_modules() {
    assert_roundtrip("import a, { b as c, d } from \"m\";");
    assert_roundtrip("import * as ns from \"m\";");
    assert_roundtrip("import \"side-effect\";");
    assert_roundtrip("export { a as b, c };");
    assert_roundtrip("export * from \"m\";");
    assert_roundtrip("export * as ns from \"m\";");
    assert_roundtrip("export default function f() {}");
    assert_roundtrip("export const x = 1;");
}

#[test]
fn test_expressions() {
    assert_roundtrip("x = a ? b : c;");
    assert_roundtrip("x = (1, 2);");
    assert_roundtrip("a?.b.c?.[d]?.(e);");
    assert_roundtrip("`a${b}c`;");
    assert_roundtrip("tag`x${y}`;");
    assert_roundtrip("typeof x === \"undefined\";");
    assert_roundtrip("new Foo(a, b);");
    assert_roundtrip("new Foo;");
    assert_roundtrip("var f = async (a) => await a;");
    assert_roundtrip("import.meta.url;");
}

// ─────────────────────────────────────────────────────────────────────
// Parentheses
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_required_parens_survive() {
    assert_roundtrip("(a + b) * c;");
    assert_roundtrip("a - (b - c);");
    assert_roundtrip("(-a) ** 2;");
    assert_roundtrip("a ** b ** c;");
    assert_roundtrip("(a ** b) ** c;");
    assert_roundtrip("a ?? (b || c);");
    assert_roundtrip("(a && b) ?? c;");
    assert_roundtrip("new (foo())();");
    assert_roundtrip("(new Foo).bar;");
    assert_roundtrip("(1).toString();");
    assert_roundtrip("(a, b) ? c : d;");
}

#[test]
fn test_redundant_parens_dropped() {
    assert_eq!(print("(a * b) + c;"), "a * b + c;");
    assert_eq!(print("x = (y);"), "x = y;");
    assert_eq!(print("((a)).b;"), "a.b;");
}

#[test]
fn test_statement_start_ambiguity() {
    assert_roundtrip("(function() {})();");
    assert_roundtrip("(function(E) {\n    E[\"A\"] = 0;\n})(E || (E = {}));");
    assert_roundtrip("(class {});");
    assert_roundtrip("({}).toString();");
    assert_roundtrip("({ a } = b);");
    assert_roundtrip("var f = () => ({});");
    assert_roundtrip("export default (function() {});");
}

#[test]
fn test_synthesized_trees_get_parens() {
    let s = Span::default();
    let sum = Expr::binary(BinaryOp::Add, id("a"), id("b"), s);
    let product = Expr::binary(BinaryOp::Mul, sum, id("c"), s);
    let assign = Expr::assign(id("b"), id("c"), s);
    let or = Expr::binary(BinaryOp::LogicalOr, id("a"), assign, s);
    let conditional = Expr::new(
        ExprKind::Conditional {
            test: Box::new(id("t")),
            cons: Box::new(Expr::undefined(s)),
            alt: Box::new(id("x")),
        },
        s,
    );
    let negated = Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Minus,
            arg: Box::new(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Minus,
                    arg: Box::new(id("y")),
                },
                s,
            )),
        },
        s,
    );
    let out = print_synthesized(vec![
        Stmt::expr(product),
        Stmt::expr(or),
        Stmt::expr(Expr::binary(BinaryOp::Add, conditional, id("z"), s)),
        Stmt::expr(negated),
        Stmt::expr(Expr::str("it's \"q\"", s)),
    ]);
    assert_eq!(
        out,
        "(a + b) * c;\na || (b = c);\n(t ? void 0 : x) + z;\n- -y;\n\"it's \\\"q\\\"\";"
    );
}

#[test]
fn test_dangling_else_is_braced() {
    let s = Span::default();
    let inner = Stmt::new(
        StmtKind::If {
            test: id("b"),
            cons: Box::new(Stmt::expr(Expr::call(id("x"), vec![], s))),
            alt: None,
        },
        s,
    );
    let outer = Stmt::new(
        StmtKind::If {
            test: id("a"),
            cons: Box::new(inner),
            alt: Some(Box::new(Stmt::expr(Expr::call(id("y"), vec![], s)))),
        },
        s,
    );
    assert_eq!(
        print_synthesized(vec![outer]),
        "if (a) {\n    if (b) x();\n} else y();"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Compact mode
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_compact_output() {
    assert_eq!(
        print_compact("function f(a, b) {\n    return a - -b;\n}"),
        "function f(a,b){return a- -b;}"
    );
    assert_eq!(print_compact("var x = { a: 1 };\nf(x);"), "var x={a:1};f(x);");
    assert_eq!(print_compact("if (a) b(); else c();"), "if(a)b();else c();");
    assert_eq!(print_compact("typeof x === \"y\";"), "typeof x===\"y\";");
    assert_eq!(print_compact("a + +b;"), "a+ +b;");
    assert_eq!(print_compact("x instanceof Y;"), "x instanceof Y;");
}

// ─────────────────────────────────────────────────────────────────────
// Source maps
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_source_map_points_at_statements() {
    let (program, sf) = parse("a;\n  b;", Syntax::Ecmascript);
    let config = TransformConfig::builder()
        .filename("test.js")
        .source_maps(true)
        .build();
    let output = emit(&program, &config, &sf).expect("emit failed");
    assert_eq!(output.code, "a;\nb;");
    let map = SourceMap::from_json(&output.map.expect("map requested")).expect("valid map");
    assert_eq!(map.version, 3);
    assert_eq!(map.sources, vec!["test.js"]);
    assert_eq!(map.sources_content, vec!["a;\n  b;"]);
    let mappings = decode_mappings(&map.mappings).expect("valid mappings");
    let second = mappings
        .iter()
        .find(|m| m.generated_line == 1)
        .expect("segment on second line");
    assert_eq!((second.source_line, second.source_column), (1, 2));
    assert_eq!(map.names, vec!["a", "b"]);
}

#[test]
fn test_no_map_unless_requested() {
    let (program, sf) = parse("a;", Syntax::Ecmascript);
    let output = emit(&program, &TransformConfig::identity(), &sf).expect("emit failed");
    assert!(output.map.is_none());
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_typescript_nodes_are_rejected() {
    let (program, sf) = parse("let x = y as T;", Syntax::Typescript);
    let err = to_source(&program, &sf).expect_err("TS expression must not print");
    assert!(matches!(err, EmitError::UnexpectedNode { .. }));
    assert_eq!(err.code(), ErrorCode::UNEXPECTED_NODE);
    let diagnostic = err.to_diagnostic(&sf);
    assert_eq!(diagnostic.line, 1);

    let (program, sf) = parse("interface A {}", Syntax::Typescript);
    assert!(to_source(&program, &sf).is_err());
}

#[test]
fn test_invalid_placeholder_is_rejected() {
    let err = {
        let sf = SourceFile::new("t.js", "");
        let program = Program {
            kind: ProgramKind::Script,
            body: vec![Stmt::expr(Expr::default())],
            span: Span::default(),
        };
        to_source(&program, &sf).expect_err("placeholder must not print")
    };
    assert_eq!(err.code(), ErrorCode::UNEXPECTED_NODE);
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = "class A {\n    m() {\n        return a?.b ?? [1, 2].map((x) => x * 2);\n    }\n}\nexport default A;";
    let (program, sf) = parse(source, Syntax::Ecmascript);
    let config = TransformConfig::builder().source_maps(true).build();
    let first = emit(&program, &config, &sf).expect("emit failed");
    for i in 0..100 {
        let again = emit(&program, &config, &sf).expect("emit failed");
        assert_eq!(first, again, "Determinism failure at iteration {i}");
    }
}

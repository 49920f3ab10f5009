//! Engine facade tests.
//!
//! Covers: the sync and async entry points, config fallback, diagnostics
//! accumulation, the byte-level input boundary, source maps, the target
//! triple, the self-test hook and determinism.

use ecmaform::{
    get_target_triple, test_file, transform, transform_sync, transform_sync_bytes, Engine,
    ErrorCategory, ErrorCode, Severity, TransformResult,
};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn module(source: &str, config: &str) -> TransformResult {
    transform_sync(source, true, config.as_bytes())
}

fn code(result: &TransformResult) -> &str {
    result.code.as_deref().unwrap_or_else(|| {
        panic!("expected code, got diagnostics: {:?}", result.diagnostics.items)
    })
}

// ─────────────────────────────────────────────────────────────────────
// Basics
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_hello_world() {
    let result = module("console.log(\"hello world\");", "{}");
    assert_eq!(code(&result), "console.log(\"hello world\");");
    assert!(result.diagnostics.is_empty());
    assert!(result.map.is_none());
}

#[test]
fn test_empty_config_equals_default() {
    let source = "const f = (a) => a ?? `x${a}`;\nexport { f };";
    let empty = module(source, "");
    let braces = module(source, "{}");
    assert_eq!(empty, braces);
    assert_eq!(
        code(&braces),
        "var f = function(a) {\n    return a !== null && a !== void 0 ? a : \"x\" + a;\n};\nexport { f };"
    );
}

#[test]
fn test_script_rejects_module_syntax() {
    let result = transform_sync("import a from \"a\";", false, b"{}");
    assert!(result.code.is_none());
    assert_eq!(result.diagnostics.items[0].code, ErrorCode::MODULE_SYNTAX_IN_SCRIPT);
}

#[test]
fn test_esnext_target_keeps_modern_syntax() {
    let result = module("const f = (a) => a?.b ?? 1;", r#"{"jsc":{"target":"esnext"}}"#);
    assert_eq!(code(&result), "const f = (a) => a?.b ?? 1;");
}

// ─────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_malformed_config_warns_and_uses_defaults() {
    let result = module("let a = 1;", "{not json");
    assert_eq!(code(&result), "var a = 1;");
    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics.items[0];
    assert_eq!(d.category, ErrorCategory::Config);
    assert_eq!(d.severity, Severity::Warning);
    assert_eq!(d.code, ErrorCode::MALFORMED_CONFIG);
}

#[test]
fn test_unknown_keys_ignored() {
    let result = module("a();", r#"{"env":{"targets":"defaults"},"isModule":true}"#);
    assert_eq!(code(&result), "a();");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_typescript_commonjs_minify() {
    let config = r#"{
        "jsc": { "parser": { "syntax": "typescript" }, "target": "es2015" },
        "module": { "type": "commonjs" },
        "minify": true
    }"#;
    let result = module("type T = number;\nexport default 1 + 2 * 3;", config);
    assert_eq!(
        code(&result),
        "\"use strict\";Object.defineProperty(exports,\"__esModule\",{value:true});exports.default=7;"
    );
}

#[test]
fn test_source_map_uses_filename() {
    let result = module("a;\nb;", r#"{"filename":"src/app.js","sourceMaps":true,"jsc":{"target":"esnext"}}"#);
    let map: serde_json::Value = serde_json::from_str(result.map.as_deref().unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "src/app.js");
    assert_eq!(map["sources"][0], "src/app.js");
    assert_eq!(map["sourcesContent"][0], "a;\nb;");
}

// ─────────────────────────────────────────────────────────────────────
// Diagnostics
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_one_malformed_statement_gives_one_diagnostic() {
    let result = module("var a = 1;\nvar b = ;\nvar c = 3;\nvar d = 4;", "{}");
    assert!(result.code.is_none());
    assert_eq!(result.diagnostics.total, 1);
    let d = &result.diagnostics.items[0];
    assert_eq!(d.category, ErrorCategory::Parse);
    assert_eq!((d.line, d.file.as_str()), (2, "input.js"));
}

#[test]
fn test_diagnostics_use_configured_filename() {
    let result = module("a(;", r#"{"filename":"lib/x.js"}"#);
    assert_eq!(result.diagnostics.items[0].file, "lib/x.js");
}

#[test]
fn test_invalid_utf8_rejected() {
    let result = transform_sync_bytes(b"var s = \"\xff\";", true, b"{}");
    assert!(result.code.is_none());
    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics.items[0];
    assert_eq!(d.code, ErrorCode::INVALID_ENCODING);
    assert_eq!(d.category, ErrorCategory::IoBoundary);
}

#[test]
fn test_bytes_entry_matches_str_entry() {
    let source = "let x = 2 ** 3;";
    let from_bytes = transform_sync_bytes(source.as_bytes(), true, b"{}");
    let from_str = module(source, "{}");
    assert_eq!(from_bytes, from_str);
}

#[test]
fn test_result_json() {
    let result = module("a(;", "{}");
    let parsed: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
    assert!(parsed["code"].is_null());
    assert!(parsed["diagnostics"]["items"].is_array());
    assert!(parsed["diagnostics"]["total_errors"].as_u64().unwrap() > 0);
}

#[test]
fn test_long_chains_report_nesting_limit() {
    for source in [
        format!("x = 1{};", " + 1".repeat(100_000)),
        format!("f{};", "()".repeat(100_000)),
        format!("a{};", ".b".repeat(100_000)),
    ] {
        let result = module(&source, "{}");
        assert!(result.code.is_none());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::NESTING_LIMIT_EXCEEDED));
    }
}

#[test]
fn test_deep_nesting_below_limit_transforms() {
    let source = format!("x = {}1{};", "[".repeat(200), "]".repeat(200));
    let result = module(&source, r#"{"minify":true}"#);
    assert_eq!(
        code(&result),
        format!("x={}1{};", "[".repeat(200), "]".repeat(200))
    );
}

// ─────────────────────────────────────────────────────────────────────
// ES5 lowering
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_block_bindings_keep_their_scope() {
    let result = module("let x = 1;\n{\n    let x = 2;\n    g(x);\n}\nf(x);", "{}");
    assert_eq!(code(&result), "var x = 1;\n{\n    var x1 = 2;\n    g(x1);\n}\nf(x);");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_kept_loop_bindings_reported_as_warning() {
    let source = "for (let i = 0; i < n; i++) {\n    if (x) {\n        break;\n    }\n    fns.push(() => i);\n}";
    let result = module(source, "{}");
    assert!(code(&result).starts_with("for (let i = 0;"));
    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics.items[0];
    assert_eq!(d.code, ErrorCode::BLOCK_SCOPE_KEPT);
    assert_eq!(d.severity, Severity::Warning);
    assert_eq!(d.category, ErrorCategory::Transform);
    assert_eq!(d.line, 1);
    assert!(!result.diagnostics.has_errors());
}

#[test]
fn test_bigint_exponent_reported_as_warning() {
    let result = module("x = 2n ** 64n;", "{}");
    assert_eq!(code(&result), "x = 2n ** 64n;");
    assert_eq!(result.diagnostics.items[0].code, ErrorCode::BIGINT_EXPONENT_KEPT);
    assert_eq!(result.diagnostics.items[0].severity, Severity::Warning);
}

#[test]
fn test_es5_literals() {
    let result = module("x = [0o17, 0b101, 1_000, \"\\u{41}\"];", "{}");
    assert_eq!(code(&result), "x = [15, 5, 1000, \"A\"];");
    assert!(result.diagnostics.is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Source hash
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_source_hash() {
    let a = module("a();", "{}");
    let b = module("a();", r#"{"minify":true}"#);
    let c = module("b();", "{}");
    assert_eq!(a.source_hash.len(), 64);
    assert!(a.source_hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(a.source_hash, b.source_hash);
    assert_ne!(a.source_hash, c.source_hash);
}

// ─────────────────────────────────────────────────────────────────────
// Async
// ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_async_matches_sync() {
    let source = "const f = () => this?.x;\nexport default f;";
    let config = r#"{"module":{"type":"commonjs"}}"#;
    let sync = module(source, config);
    let asynced = transform(source, true, config).await.unwrap();
    assert_eq!(sync, asynced);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_many_concurrent_jobs() {
    let handles: Vec<_> = (0..32)
        .map(|i| transform(format!("var v{i} = {i} ** 2;"), true, Vec::new()))
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(code(&result), format!("var v{i} = Math.pow({i}, 2);"));
    }
}

#[test]
fn test_blocking_wait_on_dedicated_engine() {
    let engine = Engine::with_threads(2).unwrap();
    assert_eq!(engine.threads(), 2);
    let result = engine.transform("let a = 1;", true, "{}").wait().unwrap();
    assert_eq!(code(&result), "var a = 1;");
}

#[test]
fn test_async_reports_errors_as_diagnostics() {
    let result = transform("var = ;", true, "{}").wait().unwrap();
    assert!(result.code.is_none());
    assert!(result.diagnostics.has_errors());
}

// ─────────────────────────────────────────────────────────────────────
// Host hooks
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_target_triple_shape() {
    let triple = get_target_triple();
    let parts: Vec<&str> = triple.split('-').collect();
    assert!((3..=4).contains(&parts.len()), "unexpected triple {triple}");
    assert!(parts.iter().all(|p| !p.is_empty()), "unexpected triple {triple}");
}

#[test]
fn test_self_test_passes() {
    assert!(test_file());
}

#[test]
fn test_version() {
    assert_eq!(ecmaform::version(), env!("CARGO_PKG_VERSION"));
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = "import x from \"./x\";\nexport const g = (...a) => [...a, x?.[0] ?? 1];";
    let config = r#"{"module":{"type":"commonjs"},"sourceMaps":true}"#;
    let first = module(source, config);
    for i in 0..100 {
        let again = module(source, config);
        assert_eq!(first, again, "Determinism failure at iteration {i}");
    }
}

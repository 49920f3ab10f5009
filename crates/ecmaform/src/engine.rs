//! The pipeline driver and its async front end.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::OnceLock;
use std::task::{Context, Poll};

use ecmaform_codegen::{emit, EmitOutput};
use ecmaform_lexer::Dialect;
use ecmaform_parser::parse_source;
use ecmaform_transform::transform_program;
use ecmaform_types::{Diagnostics, SourceFile, TransformConfig, DEFAULT_FILENAME};
use tokio::sync::oneshot;

use crate::error::EngineError;
use crate::result::{source_hash, TransformResult};

/// Stack size for every thread that runs the pipeline. Parsing, the passes
/// and emission recurse once per nesting level, up to the parser's
/// `MAX_NESTING_DEPTH`.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ══════════════════════════════════════════════════════════════════════════════
// Synchronous entry points
// ══════════════════════════════════════════════════════════════════════════════

/// Transform `source` on the calling thread.
///
/// `config_bytes` is the JSON config payload; an empty payload means
/// defaults. A malformed payload produces a warning and the defaults are
/// used. Never panics.
pub fn transform_sync(source: &str, is_module: bool, config_bytes: &[u8]) -> TransformResult {
    transform_on(source, is_module, config_bytes, Stack::Dedicated)
}

/// Where the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stack {
    /// The calling thread, which already has [`WORKER_STACK_SIZE`].
    Current,
    /// A scoped helper thread with [`WORKER_STACK_SIZE`]; the caller's own
    /// stack may be as small as a test harness thread's.
    Dedicated,
}

fn transform_on(source: &str, is_module: bool, config_bytes: &[u8], stack: Stack) -> TransformResult {
    let hash = source_hash(source.as_bytes());
    let mut diagnostics = Diagnostics::new();
    let config = decode_config(config_bytes, &mut diagnostics);
    run(source, is_module, &config, diagnostics, hash, stack)
}

/// Like [`transform_sync`], for raw input bytes. Invalid UTF-8 is reported
/// as an E500 diagnostic; a leading byte order mark is dropped.
pub fn transform_sync_bytes(source: &[u8], is_module: bool, config_bytes: &[u8]) -> TransformResult {
    let hash = source_hash(source);
    let mut diagnostics = Diagnostics::new();
    let config = decode_config(config_bytes, &mut diagnostics);
    let text = source.strip_prefix(UTF8_BOM).unwrap_or(source);
    match std::str::from_utf8(text) {
        Ok(text) => run(text, is_module, &config, diagnostics, hash, Stack::Dedicated),
        Err(e) => {
            tracing::debug!(error = %e, "rejecting non-UTF-8 input");
            diagnostics.push(EngineError::InvalidEncoding(e.to_string()).to_diagnostic(config.filename()));
            TransformResult::new(None, diagnostics, hash)
        }
    }
}

fn decode_config(config_bytes: &[u8], diagnostics: &mut Diagnostics) -> TransformConfig {
    match TransformConfig::decode(config_bytes) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "config rejected, using defaults");
            diagnostics.push(ecmaform_types::Diagnostic::global(
                DEFAULT_FILENAME,
                err.code(),
                err.to_string(),
            ));
            TransformConfig::default()
        }
    }
}

fn run(
    source: &str,
    is_module: bool,
    config: &TransformConfig,
    mut diagnostics: Diagnostics,
    hash: String,
    stack: Stack,
) -> TransformResult {
    tracing::debug!(bytes = source.len(), is_module, file = config.filename(), ?stack, "transform start");

    let outcome = match stack {
        Stack::Current => guarded(source, is_module, config),
        Stack::Dedicated => on_worker_stack(|| guarded(source, is_module, config)),
    };
    let (output, found) = match outcome {
        Ok(done) => done,
        Err(err) => {
            tracing::warn!(error = %err, "transform aborted");
            let mut found = Diagnostics::new();
            found.push(err.to_diagnostic(config.filename()));
            (None, found)
        }
    };
    diagnostics.extend(found);

    let result = TransformResult::new(output, diagnostics, hash);
    tracing::debug!(
        out_bytes = result.code.as_ref().map_or(0, String::len),
        diagnostics = result.diagnostics.total,
        "transform done"
    );
    result
}

/// [`pipeline`] with panics turned into [`EngineError::Panicked`].
fn guarded(
    source: &str,
    is_module: bool,
    config: &TransformConfig,
) -> Result<(Option<EmitOutput>, Diagnostics), EngineError> {
    panic::catch_unwind(AssertUnwindSafe(|| pipeline(source, is_module, config)))
        .map_err(|payload| EngineError::Panicked(panic_message(payload.as_ref())))
}

/// Run `f` to completion on a scoped thread with [`WORKER_STACK_SIZE`].
fn on_worker_stack<T: Send>(
    f: impl FnOnce() -> Result<T, EngineError> + Send,
) -> Result<T, EngineError> {
    std::thread::scope(|scope| {
        let worker = std::thread::Builder::new()
            .name("ecmaform-sync".into())
            .stack_size(WORKER_STACK_SIZE)
            .spawn_scoped(scope, f)
            .map_err(|e| EngineError::PoolStartup(e.to_string()))?;
        worker
            .join()
            .map_err(|payload| EngineError::Panicked(panic_message(payload.as_ref())))?
    })
}

/// Parse, transform and emit. Stops at the first stage that reports an
/// error.
fn pipeline(source: &str, is_module: bool, config: &TransformConfig) -> (Option<EmitOutput>, Diagnostics) {
    let source_file = SourceFile::new(config.filename(), source);
    let dialect = if is_module { Dialect::Module } else { Dialect::Script };

    let parsed = parse_source(&source_file, dialect, config.syntax());
    let mut diagnostics = parsed.errors;
    if diagnostics.has_errors() {
        return (None, diagnostics);
    }

    let transformed = match transform_program(parsed.program, config) {
        Ok(transformed) => transformed,
        Err(err) => {
            diagnostics.push(err.to_diagnostic(&source_file));
            return (None, diagnostics);
        }
    };
    for warning in &transformed.warnings {
        diagnostics.push(warning.to_diagnostic(&source_file));
    }

    match emit(&transformed.program, config, &source_file) {
        Ok(output) => (Some(output), diagnostics),
        Err(err) => {
            diagnostics.push(err.to_diagnostic(&source_file));
            (None, diagnostics)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Worker pool
// ══════════════════════════════════════════════════════════════════════════════

/// A dedicated pool of transform workers.
///
/// Jobs run the same pipeline as [`transform_sync`]. Completion order across
/// jobs is unspecified and a started job cannot be cancelled.
pub struct Engine {
    pool: rayon::ThreadPool,
}

impl Engine {
    /// A pool sized to the available parallelism.
    pub fn new() -> Result<Self, EngineError> {
        Self::build(rayon::ThreadPoolBuilder::new())
    }

    pub fn with_threads(threads: usize) -> Result<Self, EngineError> {
        Self::build(rayon::ThreadPoolBuilder::new().num_threads(threads))
    }

    fn build(builder: rayon::ThreadPoolBuilder) -> Result<Self, EngineError> {
        let pool = builder
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("ecmaform-worker-{i}"))
            .build()
            .map_err(|e| EngineError::PoolStartup(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Submit a transformation to the pool.
    pub fn transform(
        &self,
        source: impl Into<String>,
        is_module: bool,
        config_bytes: impl Into<Vec<u8>>,
    ) -> TransformHandle {
        let source = source.into();
        let config_bytes = config_bytes.into();
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            let result = transform_on(&source, is_module, &config_bytes, Stack::Current);
            // The caller may have dropped the handle.
            let _ = tx.send(result);
        });
        TransformHandle {
            state: HandleState::Pending(rx),
        }
    }
}

static DEFAULT_ENGINE: OnceLock<Result<Engine, EngineError>> = OnceLock::new();

/// Submit a transformation to the shared default [`Engine`], created on
/// first use.
pub fn transform(
    source: impl Into<String>,
    is_module: bool,
    config_bytes: impl Into<Vec<u8>>,
) -> TransformHandle {
    match DEFAULT_ENGINE.get_or_init(Engine::new) {
        Ok(engine) => engine.transform(source, is_module, config_bytes),
        Err(err) => TransformHandle {
            state: HandleState::Failed(Some(err.clone())),
        },
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Handle
// ══════════════════════════════════════════════════════════════════════════════

/// A pending transformation.
///
/// Await it from async code or call [`wait`](Self::wait) from a plain
/// thread. If the worker goes away without answering, the handle resolves
/// to [`EngineError::WorkerLost`].
#[must_use = "a transform handle does nothing unless awaited or waited on"]
pub struct TransformHandle {
    state: HandleState,
}

enum HandleState {
    Pending(oneshot::Receiver<TransformResult>),
    Failed(Option<EngineError>),
}

impl TransformHandle {
    /// Block the current thread until the result arrives.
    ///
    /// Must not be called from inside an async runtime; await the handle
    /// there instead.
    pub fn wait(self) -> Result<TransformResult, EngineError> {
        match self.state {
            HandleState::Pending(rx) => rx.blocking_recv().map_err(|_| EngineError::WorkerLost),
            HandleState::Failed(err) => Err(err.unwrap_or(EngineError::WorkerLost)),
        }
    }
}

impl Future for TransformHandle {
    type Output = Result<TransformResult, EngineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            HandleState::Pending(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.map_err(|_| EngineError::WorkerLost)),
            HandleState::Failed(err) => Poll::Ready(Err(err.take().unwrap_or(EngineError::WorkerLost))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_str_and_string() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_dropped_sender_is_worker_lost() {
        let (tx, rx) = oneshot::channel::<TransformResult>();
        drop(tx);
        let handle = TransformHandle {
            state: HandleState::Pending(rx),
        };
        assert_eq!(handle.wait(), Err(EngineError::WorkerLost));
    }

    #[test]
    fn test_bom_is_stripped() {
        let result = transform_sync_bytes(b"\xEF\xBB\xBFa();", true, b"");
        assert_eq!(result.code.as_deref(), Some("a();"));
    }

    #[test]
    fn test_worker_stack_reports_panics() {
        let outcome: Result<(), EngineError> = on_worker_stack(|| panic!("deep"));
        assert_eq!(outcome, Err(EngineError::Panicked("deep".into())));
    }

    #[test]
    fn test_worker_stack_fits_deep_recursion() {
        fn depth(n: u32) -> u32 {
            let pad = std::hint::black_box([0u8; 1024]);
            if n == 0 {
                u32::from(pad[0])
            } else {
                depth(n - 1) + 1
            }
        }
        // Several MiB of frames: more than a test thread gets.
        assert_eq!(on_worker_stack(|| Ok(depth(6 * 1024))), Ok(6 * 1024));
    }

    #[test]
    fn test_pipeline_stops_at_parse_errors() {
        let (output, diagnostics) = pipeline("var = ;", true, &TransformConfig::default());
        assert!(output.is_none());
        assert!(diagnostics.has_errors());
    }
}

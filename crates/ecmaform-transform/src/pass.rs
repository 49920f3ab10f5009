//! The `Pass` trait and the ordered pipeline.

use std::time::Instant;

use ecmaform_types::ast::Program;
use ecmaform_types::{EsVersion, ModuleKind, TransformConfig};

use crate::error::{PassResult, TransformWarning};
use crate::passes::{
    CommonJs, Compress, Es2015, Es2016, Es2020, Es2021, StripTypes,
};

/// One tree-to-tree rewrite.
///
/// Passes are pure: the output depends only on the input tree. Running a
/// pass on its own output returns that output unchanged.
pub trait Pass: Send + Sync {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Rewrite `program`. Constructs the pass keeps as written, or lowers
    /// with a caveat, are reported through `warnings`.
    fn run(&self, program: Program, warnings: &mut Vec<TransformWarning>) -> PassResult<Program>;
}

/// A transformed program and the warnings its passes reported.
#[derive(Debug)]
pub struct Transformed {
    pub program: Program,
    pub warnings: Vec<TransformWarning>,
}

/// The passes enabled by one configuration, in their fixed order.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    /// Select passes for `config`. Newer syntax is lowered before older
    /// syntax, module conversion follows syntax lowering, compression runs
    /// last.
    pub fn from_config(config: &TransformConfig) -> Self {
        let target = config.target();
        let mut passes: Vec<Box<dyn Pass>> = Vec::new();
        if config.is_typescript() {
            passes.push(Box::new(StripTypes));
        }
        if target < EsVersion::Es2021 {
            passes.push(Box::new(Es2021));
        }
        if target < EsVersion::Es2020 {
            passes.push(Box::new(Es2020));
        }
        if target < EsVersion::Es2016 {
            passes.push(Box::new(Es2016));
        }
        if target < EsVersion::Es2015 {
            passes.push(Box::new(Es2015));
        }
        if config.module() == ModuleKind::CommonJs {
            passes.push(Box::new(CommonJs));
        }
        if config.minify().compress {
            passes.push(Box::new(Compress));
        }
        Self { passes }
    }

    /// A pipeline running exactly `passes`, in order.
    pub fn with_passes(passes: Vec<Box<dyn Pass>>) -> Self {
        Self { passes }
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass in order. The first error aborts the pipeline.
    pub fn run(&self, mut program: Program) -> PassResult<Transformed> {
        let mut warnings = Vec::new();
        for pass in &self.passes {
            let started = Instant::now();
            let before = warnings.len();
            program = pass.run(program, &mut warnings)?;
            tracing::trace!(
                pass = pass.name(),
                elapsed_us = started.elapsed().as_micros() as u64,
                statements = program.body.len(),
                warnings = warnings.len() - before,
                "pass complete"
            );
        }
        Ok(Transformed { program, warnings })
    }
}

/// Run the pipeline selected by `config` over `program`.
pub fn transform_program(program: Program, config: &TransformConfig) -> PassResult<Transformed> {
    Pipeline::from_config(config).run(program)
}

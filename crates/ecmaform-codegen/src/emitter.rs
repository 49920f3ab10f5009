//! The printer state shared by statement and expression emission.

use ecmaform_types::ast::Program;
use ecmaform_types::{SourceFile, Span, TransformConfig};

use crate::error::{EmitError, EmitResult};
use crate::source_map::SourceMapBuilder;

/// Output of [`emit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOutput {
    pub code: String,
    /// Serialized v3 source map, when `sourceMaps` is enabled.
    pub map: Option<String>,
}

/// Print `program` according to `config`.
pub fn emit(program: &Program, config: &TransformConfig, source_file: &SourceFile) -> EmitResult<EmitOutput> {
    let mut emitter = Emitter::new(source_file, config.minify().whitespace, config.source_maps());
    emitter.emit_program(program)?;
    let Emitter { out, map, .. } = emitter;
    let map = match map {
        Some(builder) => {
            let map = builder.build(config.filename(), &source_file.name, &source_file.source);
            Some(map.to_json().map_err(|e| EmitError::SourceMap(e.to_string()))?)
        }
        None => None,
    };
    Ok(EmitOutput { code: out, map })
}

/// Print `program` in pretty mode without a source map.
pub fn to_source(program: &Program, source_file: &SourceFile) -> EmitResult<String> {
    let mut emitter = Emitter::new(source_file, false, false);
    emitter.emit_program(program)?;
    Ok(emitter.out)
}

pub(crate) struct Emitter<'a> {
    pub(crate) out: String,
    source_file: &'a SourceFile,
    pub(crate) compact: bool,
    indent: usize,
    map: Option<SourceMapBuilder>,
    gen_line: u32,
    gen_column: u32,
    /// Output offset where the current expression statement begins. A
    /// function, class or object literal printed here needs parentheses.
    pub(crate) stmt_start: Option<usize>,
    /// Output offset of a concise arrow body, where an object literal needs
    /// parentheses.
    pub(crate) arrow_body_start: Option<usize>,
    /// Set while printing a `for (init; ...)` head, where `in` must be
    /// parenthesized.
    pub(crate) no_in: bool,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(source_file: &'a SourceFile, compact: bool, source_maps: bool) -> Self {
        Self {
            out: String::with_capacity(source_file.source.len()),
            source_file,
            compact,
            indent: 0,
            map: source_maps.then(SourceMapBuilder::new),
            gen_line: 0,
            gen_column: 0,
            stmt_start: None,
            arrow_body_start: None,
            no_in: false,
        }
    }

    // ── Output primitives ────────────────────────────────────────────────

    /// Append text verbatim, tracking the generated position.
    pub(crate) fn write(&mut self, text: &str) {
        if text.is_ascii() && !text.contains('\n') {
            self.gen_column += text.len() as u32;
        } else {
            for c in text.chars() {
                if c == '\n' {
                    self.gen_line += 1;
                    self.gen_column = 0;
                } else {
                    self.gen_column += c.len_utf16() as u32;
                }
            }
        }
        self.out.push_str(text);
    }

    /// Append an identifier, keyword or number, separating it from a
    /// preceding word character.
    pub(crate) fn word(&mut self, text: &str) {
        let starts_word = text.chars().next().is_some_and(is_word_char);
        if starts_word && self.out.chars().next_back().is_some_and(is_word_char) {
            self.write(" ");
        }
        self.write(text);
    }

    /// Append an operator. `+ +x`, `- -x` and `/ /re/` keep their space so
    /// they do not merge into another token.
    pub(crate) fn op(&mut self, text: &str) {
        if let (Some(first), Some(last)) = (text.chars().next(), self.out.chars().next_back()) {
            if matches!(first, '+' | '-' | '/') && first == last {
                self.write(" ");
            }
        }
        self.write(text);
    }

    /// Optional whitespace.
    pub(crate) fn space(&mut self) {
        if !self.compact {
            self.write(" ");
        }
    }

    /// Line break followed by indentation, pretty mode only.
    pub(crate) fn newline(&mut self) {
        if self.compact {
            return;
        }
        self.write("\n");
        for _ in 0..self.indent {
            self.write("    ");
        }
    }

    pub(crate) fn indent(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// `, ` in pretty mode, `,` in compact mode.
    pub(crate) fn comma(&mut self) {
        self.write(",");
        self.space();
    }

    /// Record a source map segment for a node starting at `span`.
    pub(crate) fn mark(&mut self, span: Span, name: Option<&str>) {
        if let Some(map) = self.map.as_mut() {
            let source = self.source_file.position(span.start);
            map.add(self.gen_line, self.gen_column, source, name);
        }
    }

    pub(crate) fn at_stmt_start(&self) -> bool {
        self.stmt_start == Some(self.out.len())
    }

    pub(crate) fn at_arrow_body_start(&self) -> bool {
        self.arrow_body_start == Some(self.out.len())
    }

    // ── Program ──────────────────────────────────────────────────────────

    pub(crate) fn emit_program(&mut self, program: &Program) -> EmitResult<()> {
        for (i, stmt) in program.body.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\\' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_separation() {
        let sf = SourceFile::new("t.js", "");
        let mut e = Emitter::new(&sf, true, false);
        e.word("return");
        e.word("x");
        e.write(";");
        e.word("typeof");
        e.write("(");
        assert_eq!(e.out, "return x;typeof(");
    }

    #[test]
    fn test_operator_separation() {
        let sf = SourceFile::new("t.js", "");
        let mut e = Emitter::new(&sf, true, false);
        e.word("a");
        e.op("-");
        e.op("-");
        e.word("b");
        e.op("+");
        e.op("++");
        assert_eq!(e.out, "a- -b+ ++");
    }

    #[test]
    fn test_generated_position_counts_utf16() {
        let sf = SourceFile::new("t.js", "");
        let mut e = Emitter::new(&sf, false, false);
        e.write("\"😀\"\nab");
        assert_eq!((e.gen_line, e.gen_column), (1, 2));
        e.write("\"😀\"");
        assert_eq!(e.gen_column, 6);
    }
}

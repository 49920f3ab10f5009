//! The value every entry point returns.

use ecmaform_codegen::EmitOutput;
use ecmaform_types::Diagnostics;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Outcome of one transformation.
///
/// `code` is present only when no error-severity diagnostic was produced.
/// Warnings (config fallbacks) do not suppress it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    pub code: Option<String>,
    /// v3 source map JSON, when `sourceMaps` was enabled.
    pub map: Option<String>,
    pub diagnostics: Diagnostics,
    /// Lowercase hex SHA-256 of the input bytes.
    pub source_hash: String,
}

impl TransformResult {
    pub(crate) fn new(output: Option<EmitOutput>, diagnostics: Diagnostics, source_hash: String) -> Self {
        let (code, map) = match output {
            Some(out) if !diagnostics.has_errors() => (Some(out.code), out.map),
            _ => (None, None),
        };
        Self {
            code,
            map,
            diagnostics,
            source_hash,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_some()
    }

    /// Serialize to JSON for hosts that cross a string boundary.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"code":null,"map":null,"diagnostics":{{"items":[],"total":1,"total_errors":1}},"source_hash":"{}","error":"serialization error: {}"}}"#,
                self.source_hash,
                e.to_string().replace('"', "'")
            )
        })
    }
}

pub(crate) fn source_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

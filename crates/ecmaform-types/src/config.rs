//! Transform configuration.
//!
//! The config payload is a JSON byte buffer decoded once at the top of a
//! facade call into an immutable [`TransformConfig`]. Unknown keys are
//! ignored. Recognized keys:
//!
//! ```json
//! {
//!   "filename": "input.ts",
//!   "sourceMaps": true,
//!   "minify": false,
//!   "jsc": {
//!     "parser": { "syntax": "typescript" },
//!     "target": "es2015",
//!     "minify": { "compress": true, "whitespace": false }
//!   },
//!   "module": { "type": "commonjs" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ErrorCode;

/// File name used when the payload does not name one.
pub const DEFAULT_FILENAME: &str = "input.js";

/// ECMAScript language version targeted by the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EsVersion {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
    EsNext,
}

/// Source syntax accepted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Ecmascript,
    Typescript,
}

/// Module format of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Keep `import`/`export` as written.
    #[serde(rename = "es6")]
    Es6,
    /// Rewrite to `require`/`exports`.
    #[serde(rename = "commonjs")]
    CommonJs,
}

/// Minification switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinifyOptions {
    /// Constant folding and dead-code elimination.
    pub compress: bool,
    /// Compact emission with no optional whitespace.
    pub whitespace: bool,
}

impl MinifyOptions {
    pub fn any(&self) -> bool {
        self.compress || self.whitespace
    }
}

/// Errors decoding the config payload. The facade records these as warnings
/// and falls back to [`TransformConfig::default`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The payload is not valid JSON (or not UTF-8).
    #[error("malformed config payload: {0}")]
    Malformed(String),

    /// The payload is JSON but a recognized key has an unusable value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Malformed(_) => ErrorCode::MALFORMED_CONFIG,
            Self::InvalidValue(_) => ErrorCode::INVALID_CONFIG_VALUE,
        }
    }
}

/// An immutable configuration snapshot.
///
/// Fields are private; build one with [`TransformConfig::decode`],
/// [`TransformConfig::default`], [`TransformConfig::identity`] or
/// [`TransformConfig::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformConfig {
    filename: String,
    target: EsVersion,
    syntax: Syntax,
    module: ModuleKind,
    minify: MinifyOptions,
    source_maps: bool,
}

impl Default for TransformConfig {
    /// The documented defaults: ES5 target, ECMAScript syntax, ES modules
    /// kept, no minification, no source map.
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            target: EsVersion::Es5,
            syntax: Syntax::Ecmascript,
            module: ModuleKind::Es6,
            minify: MinifyOptions::default(),
            source_maps: false,
        }
    }
}

impl TransformConfig {
    /// A config under which every pass is disabled: the pipeline returns
    /// its input unchanged and the emitter pretty-prints it.
    pub fn identity() -> Self {
        Self {
            target: EsVersion::EsNext,
            ..Self::default()
        }
    }

    pub fn builder() -> TransformConfigBuilder {
        TransformConfigBuilder {
            config: Self::default(),
        }
    }

    /// Decode a JSON payload. An empty (or all-whitespace) payload yields the
    /// defaults.
    pub fn decode(payload: &[u8]) -> Result<Self, ConfigError> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_json::from_slice(payload).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => ConfigError::InvalidValue(e.to_string()),
            _ => ConfigError::Malformed(e.to_string()),
        })?;
        raw.into_config()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn target(&self) -> EsVersion {
        self.target
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn module(&self) -> ModuleKind {
        self.module
    }

    pub fn minify(&self) -> MinifyOptions {
        self.minify
    }

    pub fn source_maps(&self) -> bool {
        self.source_maps
    }

    pub fn is_typescript(&self) -> bool {
        self.syntax == Syntax::Typescript
    }
}

/// Builder for [`TransformConfig`]; the built value is immutable.
#[derive(Debug, Clone)]
pub struct TransformConfigBuilder {
    config: TransformConfig,
}

impl TransformConfigBuilder {
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.config.filename = filename.into();
        self
    }

    pub fn target(mut self, target: EsVersion) -> Self {
        self.config.target = target;
        self
    }

    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.config.syntax = syntax;
        self
    }

    pub fn module(mut self, module: ModuleKind) -> Self {
        self.config.module = module;
        self
    }

    pub fn minify(mut self, minify: MinifyOptions) -> Self {
        self.config.minify = minify;
        self
    }

    pub fn source_maps(mut self, enabled: bool) -> Self {
        self.config.source_maps = enabled;
        self
    }

    pub fn build(self) -> TransformConfig {
        self.config
    }
}

// ── Wire format ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawConfig {
    filename: Option<String>,
    source_maps: Option<bool>,
    minify: Option<bool>,
    jsc: RawJsc,
    module: RawModule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawJsc {
    parser: RawParser,
    target: Option<EsVersion>,
    minify: Option<RawMinify>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawParser {
    syntax: Option<Syntax>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMinify {
    compress: bool,
    whitespace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawModule {
    #[serde(rename = "type")]
    kind: Option<ModuleKind>,
}

impl RawConfig {
    fn into_config(self) -> Result<TransformConfig, ConfigError> {
        let defaults = TransformConfig::default();
        let filename = match self.filename {
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigError::InvalidValue(
                    "filename must not be empty".to_string(),
                ))
            }
            Some(name) => name,
            None => defaults.filename,
        };
        let mut minify = self
            .jsc
            .minify
            .map(|m| MinifyOptions {
                compress: m.compress,
                whitespace: m.whitespace,
            })
            .unwrap_or_default();
        if self.minify == Some(true) {
            minify = MinifyOptions {
                compress: true,
                whitespace: true,
            };
        }
        let syntax = match self.jsc.parser.syntax {
            Some(syntax) => syntax,
            None if filename.ends_with(".ts") || filename.ends_with(".mts") => Syntax::Typescript,
            None => defaults.syntax,
        };
        Ok(TransformConfig {
            filename,
            target: self.jsc.target.unwrap_or(defaults.target),
            syntax,
            module: self.module.kind.unwrap_or(defaults.module),
            minify,
            source_maps: self.source_maps.unwrap_or(defaults.source_maps),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(TransformConfig::decode(b"{}").unwrap(), TransformConfig::default());
    }

    #[test]
    fn test_empty_payload_is_default() {
        assert_eq!(TransformConfig::decode(b"").unwrap(), TransformConfig::default());
        assert_eq!(TransformConfig::decode(b"  \n").unwrap(), TransformConfig::default());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let cfg = TransformConfig::decode(
            br#"{"swcrc": false, "jsc": {"externalHelpers": true, "target": "es2017"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.target(), EsVersion::Es2017);
        assert_eq!(cfg.syntax(), Syntax::Ecmascript);
    }

    #[test]
    fn test_full_payload() {
        let cfg = TransformConfig::decode(
            br#"{
                "filename": "app.ts",
                "sourceMaps": true,
                "jsc": {
                    "parser": {"syntax": "typescript"},
                    "target": "es2020",
                    "minify": {"compress": true}
                },
                "module": {"type": "commonjs"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.filename(), "app.ts");
        assert!(cfg.source_maps());
        assert!(cfg.is_typescript());
        assert_eq!(cfg.target(), EsVersion::Es2020);
        assert_eq!(cfg.module(), ModuleKind::CommonJs);
        assert!(cfg.minify().compress);
        assert!(!cfg.minify().whitespace);
    }

    #[test]
    fn test_top_level_minify_enables_everything() {
        let cfg = TransformConfig::decode(br#"{"minify": true}"#).unwrap();
        assert!(cfg.minify().compress);
        assert!(cfg.minify().whitespace);
    }

    #[test]
    fn test_typescript_inferred_from_filename() {
        let cfg = TransformConfig::decode(br#"{"filename": "lib/util.ts"}"#).unwrap();
        assert_eq!(cfg.syntax(), Syntax::Typescript);
    }

    #[test]
    fn test_malformed_json() {
        let err = TransformConfig::decode(b"{\"jsc\": ").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
        assert_eq!(err.code(), ErrorCode::MALFORMED_CONFIG);
    }

    #[test]
    fn test_invalid_value() {
        let err = TransformConfig::decode(br#"{"jsc": {"target": "es3"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert_eq!(err.code(), ErrorCode::INVALID_CONFIG_VALUE);
    }

    #[test]
    fn test_empty_filename_rejected() {
        let err = TransformConfig::decode(br#"{"filename": "  "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_target_ordering() {
        assert!(EsVersion::Es5 < EsVersion::Es2015);
        assert!(EsVersion::Es2020 < EsVersion::Es2021);
        assert!(EsVersion::Es2022 < EsVersion::EsNext);
    }

    #[test]
    fn test_builder_and_identity() {
        let cfg = TransformConfig::builder()
            .target(EsVersion::Es2015)
            .module(ModuleKind::CommonJs)
            .source_maps(true)
            .build();
        assert_eq!(cfg.target(), EsVersion::Es2015);
        assert_eq!(cfg.module(), ModuleKind::CommonJs);
        assert!(cfg.source_maps());
        assert_eq!(TransformConfig::identity().target(), EsVersion::EsNext);
        assert!(!TransformConfig::identity().minify().any());
    }
}

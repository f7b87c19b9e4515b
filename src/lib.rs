//! # Page Generator
//!
//! Turns the page builder's flattened component tree into App Router
//! source files.
//!
//! ## Generation Invariants
//!
//! 1. **Validate first**: a page with any structural violation produces no
//!    files. Every violation is reported at once, each with a stable code.
//!
//! 2. **Deterministic output**: the same request and options always produce
//!    byte-identical files. Imports, classes and attributes come out in a
//!    fixed order.
//!
//! 3. **One directive per module**: `"use client"` is decided per emitted
//!    module, never per element. A single interactive node makes its
//!    module a client module.
//!
//! 4. **Borrowed input**: the component tree is never mutated. Every call
//!    builds its own resolvers and translators.
//!
//! 5. **Safe fallbacks**: unknown component types render as a `<div>` and
//!    are reported as warnings, not errors.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod format;
mod generator;
mod imports;
mod integrity;
mod jsx_emitter;
mod options;
mod page;
mod placement;
mod primitives;
mod styles;
mod templates;
mod tree;
mod type_infer;
mod validate;

#[cfg(test)]
mod page_tests;

pub use format::{FormatError, IdentityFormatter, OxcFormatter, SourceFormatter};
pub use generator::{
    CodeGenerator, ComponentAnalysis, FormActionConfig, GenerationResult, ProjectConfig, ServerActionConfig,
    StyleConversion, Suggestion, SuggestionKind,
};
pub use imports::{ImportConflict, ImportKind, ImportResolver, ImportStatement, ImportTier};
pub use integrity::{check_module, IntegrityIssue};
pub use jsx_emitter::JsxEmitter;
pub use options::GenerationOptions;
pub use page::{FileKind, GeneratedCode, PageOutput, PageStatistics, PageStrategy};
pub use placement::{Placement, PlacementReport};
pub use styles::StyleTranslator;
pub use templates::{ActionField, FieldType, ParamKind};
pub use tree::ComponentTree;
pub use type_infer::{infer_types, ComponentTypeDecl};
pub use validate::*;

// ═══════════════════════════════════════════════════════════════════════════════
// JSON ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

fn generator_from_json(options_json: Option<&str>) -> Result<CodeGenerator, GenerateError> {
    let options = match options_json {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)?,
        _ => GenerationOptions::default(),
    };
    Ok(CodeGenerator::new(options))
}

/// Generate one page from a JSON `PageConfig`. Returns the JSON
/// `GenerationResult`.
pub fn generate_page_json(config_json: &str, options_json: Option<&str>) -> Result<String, GenerateError> {
    let config: PageConfig = serde_json::from_str(config_json)?;
    let result = generator_from_json(options_json)?.generate_page(&config)?;
    Ok(serde_json::to_string(&result)?)
}

/// Generate a whole project from a JSON `ProjectConfig`.
pub fn generate_project_json(project_json: &str, options_json: Option<&str>) -> Result<String, GenerateError> {
    let project: ProjectConfig = serde_json::from_str(project_json)?;
    let result = generator_from_json(options_json)?.generate_project(&project)?;
    Ok(serde_json::to_string(&result)?)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
fn napi_options(options: Option<serde_json::Value>) -> napi::Result<GenerationOptions> {
    match options {
        Some(value) => serde_json::from_value(value).map_err(|e| napi::Error::from_reason(e.to_string())),
        None => Ok(GenerationOptions::default()),
    }
}

#[cfg(feature = "napi")]
#[napi]
pub fn generate_page_native(
    config: serde_json::Value,
    options: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let config: PageConfig = serde_json::from_value(config).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let result = CodeGenerator::new(napi_options(options)?)
        .generate_page(&config)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(result).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn generate_project_native(
    project: serde_json::Value,
    options: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let project: ProjectConfig =
        serde_json::from_value(project).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let result = CodeGenerator::new(napi_options(options)?)
        .generate_project(&project)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(result).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn convert_styles_native(styles: serde_json::Value) -> napi::Result<serde_json::Value> {
    let styles: indexmap::IndexMap<String, StyleValue> =
        serde_json::from_value(styles).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let conversion = CodeGenerator::default().convert_styles_to_utility_classes(&styles);
    serde_json::to_value(conversion).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn validate_page_native(config: serde_json::Value) -> napi::Result<serde_json::Value> {
    let config: PageConfig = serde_json::from_value(config).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(collect_page_violations(&config)).map_err(|e| napi::Error::from_reason(e.to_string()))
}

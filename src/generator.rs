//! Generation façade.
//!
//! The public entry point. Every call builds fresh resolvers and
//! translators; the only state kept between calls is the options and the
//! formatter.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::format::{OxcFormatter, SourceFormatter};
use crate::jsx_emitter::JsxEmitter;
use crate::options::{GenerationOptions, ACTIONS_DIR, APP_DIR, COMPONENTS_DIR, GLOBALS_CSS_FILE, TYPES_FILE};
use crate::page::{FileKind, GeneratedCode, PageGenerator, PageOutput, PageStatistics};
use crate::placement::{self, Placement};
use crate::primitives;
use crate::styles::StyleTranslator;
use crate::templates::{self, ActionField, FunctionDecl, Module, ParamKind};
use crate::tree::ComponentTree;
use crate::type_infer;
use crate::validate::{
    ComponentInstance, GenerateError, MetadataDescriptor, PageConfig, StyleValue, Violation, ERR_ACTION_PARAM,
};

/// Tree deeper than this gets a nesting suggestion.
const DEEP_NESTING_THRESHOLD: usize = 10;
/// Tree larger than this gets a size suggestion.
const LARGE_TREE_THRESHOLD: usize = 100;
/// Residual inline properties per node before we suggest extracting a class.
const INLINE_STYLE_THRESHOLD: usize = 5;

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST / RESULT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub files: Vec<GeneratedCode>,
    pub stats: PageStatistics,
    pub suggestions: Vec<Suggestion>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    MissingAlt,
    MissingHref,
    DeepNesting,
    LargeTree,
    PreferSplit,
    UnknownType,
    HeavyInlineStyles,
    HiddenComponent,
}

/// Advisory only; nothing is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
}

impl Suggestion {
    fn new(kind: SuggestionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            component_id: None,
        }
    }

    fn on(mut self, id: &str) -> Self {
        self.component_id = Some(id.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAnalysis {
    pub total: usize,
    pub roots: usize,
    pub max_depth: usize,
    pub client: usize,
    pub server: usize,
    pub hidden: usize,
    pub locked: usize,
    pub by_type: BTreeMap<String, usize>,
    /// Types outside the primitive table.
    pub unknown_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConversion {
    pub class_name: String,
    pub custom_styles: IndexMap<String, StyleValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerActionConfig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ActionField>,
    #[serde(default)]
    pub body: String,
    /// Validate arguments with a generated schema.
    #[serde(default)]
    pub validate: bool,
    #[serde(default)]
    pub revalidate_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormActionConfig {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<ActionField>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub revalidate_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub pages: Vec<PageConfig>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAÇADE
// ═══════════════════════════════════════════════════════════════════════════════

pub struct CodeGenerator {
    options: GenerationOptions,
    formatter: Box<dyn SourceFormatter>,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(GenerationOptions::default())
    }
}

impl CodeGenerator {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            options,
            formatter: Box::new(OxcFormatter),
        }
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl SourceFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    fn pages(&self) -> PageGenerator<'_> {
        PageGenerator::new(&self.options, self.formatter.as_ref())
    }

    fn result(&self, config: &PageConfig, output: PageOutput) -> GenerationResult {
        let mut suggestions = self.suggest_optimizations(&config.components);
        if output.placement == Placement::Server && output.files.iter().any(|f| f.path.contains(crate::page::ISLANDS_STEM)) {
            suggestions.retain(|s| s.kind != SuggestionKind::PreferSplit);
        }
        GenerationResult {
            files: output.files,
            stats: output.stats,
            suggestions,
            warnings: output.warnings,
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Pages
    // ───────────────────────────────────────────────────────────────────────

    pub fn generate_page(&self, config: &PageConfig) -> Result<GenerationResult, GenerateError> {
        let output = self.pages().generate_page(config)?;
        Ok(self.result(config, output))
    }

    pub fn generate_dynamic_route(
        &self,
        config: &PageConfig,
        params: &IndexMap<String, ParamKind>,
    ) -> Result<GenerationResult, GenerateError> {
        let output = self.pages().generate_dynamic_route(config, params)?;
        Ok(self.result(config, output))
    }

    pub fn split_client_server_components(&self, config: &PageConfig) -> Result<GenerationResult, GenerateError> {
        let output = self.pages().split_client_server_components(config)?;
        Ok(self.result(config, output))
    }

    /// Generate pages in parallel. Output follows input order; the first
    /// failing page aborts the batch.
    pub fn generate_pages(&self, configs: &[PageConfig]) -> Result<GenerationResult, GenerateError> {
        let results: Vec<GenerationResult> = configs
            .par_iter()
            .map(|config| {
                self.generate_page(config).map_err(|source| GenerateError::Page {
                    path: config.path.clone(),
                    source: Box::new(source),
                })
            })
            .collect::<Result<_, _>>()?;

        let mut batch = GenerationResult {
            files: vec![],
            stats: PageStatistics::default(),
            suggestions: vec![],
            warnings: vec![],
        };
        for (config, result) in configs.iter().zip(results) {
            batch.files.extend(result.files);
            batch.stats.merge(&result.stats);
            batch.suggestions.extend(result.suggestions);
            batch
                .warnings
                .extend(result.warnings.into_iter().map(|w| format!("{}: {}", config.path, w)));
        }
        tracing::debug!(pages = configs.len(), files = batch.files.len(), "generated page batch");
        Ok(batch)
    }

    /// Pages plus root layout, stylesheet and inferred prop types.
    pub fn generate_project(&self, project: &ProjectConfig) -> Result<GenerationResult, GenerateError> {
        let mut result = self.generate_pages(&project.pages)?;
        let mut warnings = Vec::new();
        let pages = self.pages();

        let layout_path = format!("{}/layout.{}", APP_DIR, self.options.component_extension());
        result.files.push(pages.finish(
            FileKind::Layout,
            layout_path,
            templates::root_layout(&project.name, &project.description, self.options.use_type_script),
            &mut warnings,
        ));
        result.files.push(GeneratedCode::new(
            FileKind::Stylesheet,
            GLOBALS_CSS_FILE,
            templates::globals_css(self.options.use_tailwind),
        ));
        if self.options.use_type_script {
            let decls = type_infer::infer_types(project.pages.iter().flat_map(|p| p.components.iter()));
            result.files.push(pages.finish(
                FileKind::TypeDeclaration,
                TYPES_FILE.to_string(),
                type_infer::render_types_file(&decls),
                &mut warnings,
            ));
        }
        result.warnings.extend(warnings);
        Ok(result)
    }

    // ───────────────────────────────────────────────────────────────────────
    // Components, actions, metadata
    // ───────────────────────────────────────────────────────────────────────

    /// Standalone component rendering the subtrees under `ids`. Placement is
    /// decided for these subtrees alone.
    pub fn generate_component(
        &self,
        components: &[ComponentInstance],
        ids: &[&str],
        name: &str,
    ) -> Result<GeneratedCode, GenerateError> {
        if !templates::is_identifier(name) || !name.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Err(GenerateError::InvalidComponentName(name.to_string()));
        }
        if ids.is_empty() {
            return Err(GenerateError::Validation(crate::validate::validate_components(&[])));
        }
        let tree = ComponentTree::new(components);
        if let Some(missing) = ids.iter().find(|id| !tree.contains(id)) {
            return Err(GenerateError::UnknownComponent(missing.to_string()));
        }

        let report = placement::classify(&tree, ids, self.options.use_server_components);
        let mut emitter = JsxEmitter::new(&tree, &self.options);
        emitter.analyze_imports(ids);
        let body = emitter.generate_root(ids, 2);
        let mut function = FunctionDecl::new(name, body);
        function.setup = emitter.handler_stubs();
        let source = Module {
            directive: report.page.directive(),
            imports: emitter.imports().lines(),
            blocks: vec![function.render()],
        }
        .render();

        let path = format!("{}/{}.{}", COMPONENTS_DIR, name, self.options.component_extension());
        let mut warnings = Vec::new();
        let file = self.pages().finish(FileKind::Component, path, source, &mut warnings);
        for warning in warnings {
            tracing::warn!(component = name, "{}", warning);
        }
        Ok(file)
    }

    fn check_action(&self, name: &str, params: &[ActionField]) -> Result<(), GenerateError> {
        if !templates::is_identifier(name) {
            return Err(GenerateError::InvalidActionName(name.to_string()));
        }
        let violations: Vec<Violation> = params
            .iter()
            .filter(|p| !templates::is_identifier(&p.name))
            .map(|p| {
                Violation::new(
                    ERR_ACTION_PARAM,
                    format!("Parameter \"{}\" of action \"{}\" is not an identifier.", p.name, name),
                )
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(GenerateError::Validation(violations))
        }
    }

    fn action_file(&self, name: &str, source: String) -> GeneratedCode {
        let path = format!("{}/{}.{}", ACTIONS_DIR, name, self.options.script_extension());
        let mut warnings = Vec::new();
        let file = self.pages().finish(FileKind::Action, path, source, &mut warnings);
        for warning in warnings {
            tracing::warn!(action = name, "{}", warning);
        }
        file
    }

    pub fn generate_server_action(&self, action: &ServerActionConfig) -> Result<GeneratedCode, GenerateError> {
        self.check_action(&action.name, &action.params)?;
        let source = templates::server_action(
            &action.name,
            &action.params,
            &action.body,
            action.validate,
            action.revalidate_path.as_deref(),
            self.options.use_type_script,
        );
        Ok(self.action_file(&action.name, source))
    }

    pub fn generate_form_action(&self, action: &FormActionConfig) -> Result<GeneratedCode, GenerateError> {
        self.check_action(&action.name, &[])?;
        let source = templates::form_action(
            &action.name,
            &action.fields,
            &action.body,
            action.revalidate_path.as_deref(),
            self.options.use_type_script,
        );
        Ok(self.action_file(&action.name, source))
    }

    /// The metadata block for a page: a `metadata` constant, or a
    /// `generateMetadata()` function when `dynamic`.
    pub fn generate_metadata(&self, config: &PageConfig, dynamic: bool) -> String {
        let fallback = MetadataDescriptor::default();
        let metadata = config.metadata.as_ref().unwrap_or(&fallback);
        if dynamic {
            templates::dynamic_metadata(metadata, config, self.options.use_type_script)
        } else {
            templates::static_metadata(metadata, config, self.options.use_type_script)
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Introspection
    // ───────────────────────────────────────────────────────────────────────

    pub fn get_statistics(&self, config: &PageConfig) -> PageStatistics {
        self.pages().statistics(config)
    }

    pub fn analyze_components(&self, components: &[ComponentInstance]) -> ComponentAnalysis {
        let tree = ComponentTree::new(components);
        let report = placement::classify(&tree, tree.roots(), self.options.use_server_components);
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut unknown_types = Vec::new();
        for node in components {
            *by_type.entry(node.component_type.clone()).or_default() += 1;
            if primitives::lookup(&node.component_type).is_none() && !unknown_types.contains(&node.component_type) {
                unknown_types.push(node.component_type.clone());
            }
        }
        ComponentAnalysis {
            total: components.len(),
            roots: tree.roots().len(),
            max_depth: tree.max_depth(),
            client: report.client_count(),
            server: report.server_count(),
            hidden: components.iter().filter(|c| c.hidden).count(),
            locked: components.iter().filter(|c| c.locked).count(),
            by_type,
            unknown_types,
        }
    }

    pub fn convert_styles_to_utility_classes(&self, styles: &IndexMap<String, StyleValue>) -> StyleConversion {
        let mut translator = StyleTranslator::new();
        translator.add_styles(styles);
        StyleConversion {
            class_name: translator.class_name(),
            custom_styles: translator.custom_styles().clone(),
        }
    }

    pub fn suggest_optimizations(&self, components: &[ComponentInstance]) -> Vec<Suggestion> {
        let analysis = self.analyze_components(components);
        let mut suggestions = Vec::new();

        for node in components {
            match node.component_type.as_str() {
                "Image" => {
                    let has_alt = node
                        .properties
                        .get("alt")
                        .and_then(|v| v.as_str())
                        .is_some_and(|alt| !alt.trim().is_empty());
                    if !has_alt {
                        suggestions.push(
                            Suggestion::new(
                                SuggestionKind::MissingAlt,
                                format!("Image `{}` has no alt text.", node.id),
                            )
                            .on(&node.id),
                        );
                    }
                }
                "Link" if !node.properties.contains_key("href") => {
                    suggestions.push(
                        Suggestion::new(
                            SuggestionKind::MissingHref,
                            format!("Link `{}` has no href and will point to \"#\".", node.id),
                        )
                        .on(&node.id),
                    );
                }
                _ => {}
            }
            if self.options.use_tailwind {
                let mut translator = StyleTranslator::new();
                translator.add_styles(&node.styles);
                if translator.custom_styles().len() > INLINE_STYLE_THRESHOLD {
                    suggestions.push(
                        Suggestion::new(
                            SuggestionKind::HeavyInlineStyles,
                            format!(
                                "`{}` keeps {} inline styles; consider a shared class.",
                                node.id,
                                translator.custom_styles().len()
                            ),
                        )
                        .on(&node.id),
                    );
                }
            }
            if node.hidden {
                suggestions.push(
                    Suggestion::new(
                        SuggestionKind::HiddenComponent,
                        format!("`{}` is hidden in the editor but still rendered.", node.id),
                    )
                    .on(&node.id),
                );
            }
        }

        if analysis.max_depth > DEEP_NESTING_THRESHOLD {
            suggestions.push(Suggestion::new(
                SuggestionKind::DeepNesting,
                format!(
                    "Tree is {} levels deep; consider extracting components.",
                    analysis.max_depth
                ),
            ));
        }
        if analysis.total > LARGE_TREE_THRESHOLD {
            suggestions.push(Suggestion::new(
                SuggestionKind::LargeTree,
                format!("Page has {} components; consider splitting it.", analysis.total),
            ));
        }
        if analysis.client > 0 && analysis.server > analysis.client {
            suggestions.push(Suggestion::new(
                SuggestionKind::PreferSplit,
                format!(
                    "{} of {} components are interactive; split mode keeps the rest on the server.",
                    analysis.client, analysis.total
                ),
            ));
        }
        for component_type in &analysis.unknown_types {
            suggestions.push(Suggestion::new(
                SuggestionKind::UnknownType,
                format!("`{}` is not a known component type and renders as a <div>.", component_type),
            ));
        }
        suggestions
    }
}

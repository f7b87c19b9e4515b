//! Page orchestration.
//!
//! One `PageConfig` goes through: validate, classify, emit, resolve imports,
//! select a template strategy, format, then scaffold loading/error files.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};

use crate::format::{format_or_keep, SourceFormatter};
use crate::imports::{ImportResolver, NEXT_MODULE};
use crate::integrity;
use crate::jsx_emitter::{JsxEmitter, INDENT};
use crate::options::{GenerationOptions, APP_DIR};
use crate::placement::{self, Placement, PlacementReport};
use crate::templates::{self, FunctionDecl, ParamKind, PageTemplateInput, RouteParam};
use crate::tree::ComponentTree;
use crate::validate::{validate_page, GenerateError, PageConfig, Violation, ERR_ROUTE_PARAM};

pub const CLIENT_COMPANION_STEM: &str = "page-client";
pub const ISLANDS_STEM: &str = "client-islands";

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Page,
    Component,
    Action,
    TypeDeclaration,
    Layout,
    Scaffold,
    Stylesheet,
}

/// One emitted file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCode {
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub path: String,
    pub content: String,
    pub language: String,
    /// Hex sha256 of `content`.
    pub fingerprint: String,
}

impl GeneratedCode {
    pub fn new(kind: FileKind, path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        Self {
            kind,
            language: language_for(&path).to_string(),
            fingerprint: fingerprint(&content),
            path,
            content,
        }
    }
}

pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn language_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("ts" | "tsx") => "typescript",
        Some("js" | "jsx") => "javascript",
        Some("css") => "css",
        _ => "text",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStatistics {
    pub total: usize,
    pub client: usize,
    pub server: usize,
    /// Instance count per component type.
    pub components: BTreeMap<String, usize>,
}

impl PageStatistics {
    pub fn merge(&mut self, other: &PageStatistics) {
        self.total += other.total;
        self.client += other.client;
        self.server += other.server;
        for (component_type, count) in &other.components {
            *self.components.entry(component_type.clone()).or_default() += count;
        }
    }
}

/// Result of generating one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutput {
    pub files: Vec<GeneratedCode>,
    pub placement: Placement,
    pub stats: PageStatistics,
    pub warnings: Vec<String>,
    /// Component types that rendered through the fallback primitive.
    pub fallback_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageStrategy {
    Plain,
    Metadata,
    DataFetching,
}

impl PageStrategy {
    /// Data fetching wins over metadata, metadata over plain.
    pub fn select(config: &PageConfig) -> Self {
        if config.data_fetching.is_some() {
            PageStrategy::DataFetching
        } else if config.metadata.is_some() {
            PageStrategy::Metadata
        } else {
            PageStrategy::Plain
        }
    }
}

/// `"/"` -> `app`, `"/about/team"` -> `app/about/team`.
pub fn page_directory(route: &str) -> String {
    let segments: Vec<&str> = route
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        APP_DIR.to_string()
    } else {
        format!("{}/{}", APP_DIR, segments.join("/"))
    }
}

pub fn statistics(tree: &ComponentTree<'_>, report: &PlacementReport) -> PageStatistics {
    let mut components: BTreeMap<String, usize> = BTreeMap::new();
    for node in tree.iter() {
        *components.entry(node.component_type.clone()).or_default() += 1;
    }
    PageStatistics {
        total: tree.len(),
        client: report.client_count(),
        server: report.server_count(),
        components,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Emitted markup for a set of roots.
struct EmittedBody {
    body: String,
    imports: ImportResolver,
    handler_stubs: Vec<String>,
    fallbacks: Vec<String>,
    void_parents: Vec<String>,
}

pub struct PageGenerator<'a> {
    options: &'a GenerationOptions,
    formatter: &'a dyn SourceFormatter,
}

impl<'a> PageGenerator<'a> {
    pub fn new(options: &'a GenerationOptions, formatter: &'a dyn SourceFormatter) -> Self {
        Self { options, formatter }
    }

    pub fn validate(&self, config: &PageConfig) -> Result<(), GenerateError> {
        validate_page(config)
    }

    pub fn statistics(&self, config: &PageConfig) -> PageStatistics {
        let tree = ComponentTree::new(&config.components);
        let report = placement::classify(&tree, tree.roots(), self.options.use_server_components);
        statistics(&tree, &report)
    }

    fn component_path(&self, directory: &str, stem: &str) -> String {
        format!("{}/{}.{}", directory, stem, self.options.component_extension())
    }

    fn emit(&self, tree: &ComponentTree<'_>, roots: &[&str], substitutions: &[(String, String)]) -> EmittedBody {
        let mut emitter = JsxEmitter::new(tree, self.options);
        for (id, component) in substitutions {
            emitter.substitute(id, component);
        }
        emitter.analyze_imports(roots);
        let body = emitter.generate_root(roots, 2);
        EmittedBody {
            body,
            handler_stubs: emitter.handler_stubs(),
            fallbacks: emitter.fallback_types().map(str::to_string).collect(),
            void_parents: emitter.void_parents().map(str::to_string).collect(),
            imports: emitter.into_imports(),
        }
    }

    /// Format, check and wrap one file.
    pub(crate) fn finish(&self, kind: FileKind, path: String, content: String, warnings: &mut Vec<String>) -> GeneratedCode {
        let content = if self.options.prettier {
            let (content, err) = format_or_keep(self.formatter, content, &path);
            if let Some(err) = err {
                warnings.push(format!("formatting skipped: {}", err));
            }
            content
        } else {
            content
        };
        if self.options.check_consistency {
            for issue in integrity::check_module(&content, &path) {
                warnings.push(format!("{}: {}", path, issue));
            }
        }
        GeneratedCode::new(kind, path, content)
    }

    fn scaffolds(&self, directory: &str, warnings: &mut Vec<String>) -> Vec<GeneratedCode> {
        vec![
            self.finish(
                FileKind::Scaffold,
                self.component_path(directory, "loading"),
                templates::loading_file(self.options.use_tailwind),
                warnings,
            ),
            self.finish(
                FileKind::Scaffold,
                self.component_path(directory, "error"),
                templates::error_file(self.options.use_type_script),
                warnings,
            ),
        ]
    }

    fn add_metadata_type(&self, imports: &mut ImportResolver, config: &PageConfig) {
        if self.options.use_type_script && config.metadata.is_some() {
            imports.add_type(["Metadata"], NEXT_MODULE);
        }
    }

    /// Render the page module for a strategy. Client bodies under a server
    /// strategy move into a `page-client` companion.
    fn render_page(
        &self,
        config: &PageConfig,
        directory: &str,
        page_placement: Placement,
        emitted: EmittedBody,
        warnings: &mut Vec<String>,
    ) -> Vec<GeneratedCode> {
        let component_name = templates::page_component_name(&config.title);
        let strategy = PageStrategy::select(config);
        tracing::debug!(path = %config.path, ?strategy, placement = ?page_placement, "rendering page");

        let mut files = Vec::new();
        let mut input = PageTemplateInput {
            config,
            component_name: component_name.clone(),
            body: emitted.body,
            imports: vec![],
            handler_stubs: emitted.handler_stubs,
            placement: page_placement,
            typescript: self.options.use_type_script,
        };
        let mut imports = emitted.imports;
        for conflict in imports.conflicts() {
            warnings.push(format!(
                "import of {} replaced `{}` with `{}`",
                conflict.module_specifier, conflict.previous, conflict.replacement
            ));
        }

        if strategy != PageStrategy::Plain && page_placement.is_client() {
            let companion = format!("{}Client", component_name);
            let data_prop = config.data_fetching.as_ref().map(templates::data_variable);
            let companion_source = templates::client_companion(
                &companion,
                imports.lines(),
                std::mem::take(&mut input.handler_stubs),
                std::mem::take(&mut input.body),
                data_prop,
                self.options.use_type_script,
            );
            files.push(self.finish(
                FileKind::Component,
                self.component_path(directory, CLIENT_COMPANION_STEM),
                companion_source,
                warnings,
            ));

            imports = ImportResolver::new();
            imports.add_default(&companion, &format!("./{}", CLIENT_COMPANION_STEM));
            input.body = match data_prop {
                Some(prop) => format!("{INDENT}{INDENT}<{companion} {prop}={{{prop}}} />"),
                None => format!("{INDENT}{INDENT}<{companion} />"),
            };
            input.placement = Placement::Server;
        }

        let source = match strategy {
            PageStrategy::Plain => {
                input.imports = imports.lines();
                templates::plain_page(&input)
            }
            PageStrategy::Metadata => {
                self.add_metadata_type(&mut imports, config);
                input.imports = imports.lines();
                match &config.metadata {
                    Some(metadata) => templates::metadata_page(&input, metadata),
                    None => templates::plain_page(&input),
                }
            }
            PageStrategy::DataFetching => {
                self.add_metadata_type(&mut imports, config);
                input.imports = imports.lines();
                match &config.data_fetching {
                    Some(fetching) => templates::data_fetching_page(&input, fetching),
                    None => templates::plain_page(&input),
                }
            }
        };
        files.insert(
            0,
            self.finish(FileKind::Page, self.component_path(directory, "page"), source, warnings),
        );
        files
    }

    fn fallback_warnings(fallbacks: &[String], warnings: &mut Vec<String>) {
        for component_type in fallbacks {
            warnings.push(format!(
                "unknown component type `{}` rendered as a generic container",
                component_type
            ));
        }
    }

    fn void_child_warnings(ids: &[String], warnings: &mut Vec<String>) {
        for id in ids {
            warnings.push(format!("`{}` is a void element; its children were not rendered", id));
        }
    }

    pub fn generate_page(&self, config: &PageConfig) -> Result<PageOutput, GenerateError> {
        self.validate(config)?;
        let tree = ComponentTree::new(&config.components);
        let roots: Vec<&str> = tree.roots().to_vec();
        let report = placement::classify(&tree, &roots, self.options.use_server_components);
        let directory = page_directory(&config.path);
        let mut warnings = Vec::new();

        let emitted = self.emit(&tree, &roots, &[]);
        let fallback_types = emitted.fallbacks.clone();
        Self::fallback_warnings(&fallback_types, &mut warnings);
        Self::void_child_warnings(&emitted.void_parents, &mut warnings);

        let mut files = self.render_page(config, &directory, report.page, emitted, &mut warnings);
        files.extend(self.scaffolds(&directory, &mut warnings));

        tracing::debug!(path = %config.path, files = files.len(), "generated page");
        Ok(PageOutput {
            files,
            placement: report.page,
            stats: statistics(&tree, &report),
            warnings,
            fallback_types,
        })
    }

    /// Page under parameterised route segments appended to the config path.
    pub fn generate_dynamic_route(
        &self,
        config: &PageConfig,
        params: &IndexMap<String, ParamKind>,
    ) -> Result<PageOutput, GenerateError> {
        let mut violations = match self.validate(config) {
            Ok(()) => vec![],
            Err(GenerateError::Validation(violations)) => violations,
            Err(other) => return Err(other),
        };
        let mut route_params = Vec::with_capacity(params.len());
        for (name, kind) in params {
            if !templates::is_identifier(name) {
                violations.push(
                    Violation::new(ERR_ROUTE_PARAM, format!("Route parameter \"{}\" is not an identifier.", name))
                        .hint("Use letters, digits, `_` or `$`, not starting with a digit."),
                );
                continue;
            }
            route_params.push(RouteParam::new(name.clone(), *kind));
        }
        if params.is_empty() {
            violations.push(Violation::new(ERR_ROUTE_PARAM, "A dynamic route needs at least one parameter."));
        }
        if !violations.is_empty() {
            return Err(GenerateError::Validation(violations));
        }

        let existing: HashSet<String> = config
            .path
            .split('/')
            .map(|segment| segment.trim_matches(|c| c == '[' || c == ']' || c == '.').to_string())
            .collect();
        let mut route = config.path.trim_end_matches('/').to_string();
        for param in &route_params {
            if !existing.contains(&param.name) {
                route.push('/');
                route.push_str(&param.segment());
            }
        }
        let directory = page_directory(&route);

        let tree = ComponentTree::new(&config.components);
        let roots: Vec<&str> = tree.roots().to_vec();
        let report = placement::classify(&tree, &roots, self.options.use_server_components);
        let mut warnings = Vec::new();
        if config.metadata.is_some() || config.data_fetching.is_some() {
            warnings.push("dynamic routes ignore metadata and dataFetching descriptors".to_string());
        }

        let mut emitted = self.emit(&tree, &roots, &[]);
        let fallback_types = emitted.fallbacks.clone();
        Self::fallback_warnings(&fallback_types, &mut warnings);
        Self::void_child_warnings(&emitted.void_parents, &mut warnings);
        if report.page.is_client() {
            emitted.imports.add_navigation(["useParams"]);
        }
        let input = PageTemplateInput {
            config,
            component_name: templates::page_component_name(&config.title),
            body: emitted.body,
            imports: emitted.imports.lines(),
            handler_stubs: emitted.handler_stubs,
            placement: report.page,
            typescript: self.options.use_type_script,
        };
        let source = templates::dynamic_page(&input, &route_params);

        let mut files = vec![self.finish(
            FileKind::Page,
            self.component_path(&directory, "page"),
            source,
            &mut warnings,
        )];
        files.extend(self.scaffolds(&directory, &mut warnings));

        Ok(PageOutput {
            files,
            placement: report.page,
            stats: statistics(&tree, &report),
            warnings,
            fallback_types,
        })
    }

    /// Server page plus one client module holding every client subtree.
    pub fn split_client_server_components(&self, config: &PageConfig) -> Result<PageOutput, GenerateError> {
        self.validate(config)?;
        let tree = ComponentTree::new(&config.components);
        let roots: Vec<&str> = tree.roots().to_vec();
        let report = placement::classify(&tree, &roots, true);
        let partition = placement::partition(&tree, &report);
        let directory = page_directory(&config.path);
        let mut warnings = Vec::new();
        let mut files = Vec::new();

        let names: Vec<(String, String)> = partition
            .island_roots
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), format!("ClientIsland{}", i + 1)))
            .collect();
        tracing::debug!(path = %config.path, islands = names.len(), "splitting client islands");

        let mut fallback_types: Vec<String> = Vec::new();
        let mut void_parents: Vec<String> = Vec::new();
        if !names.is_empty() {
            let island_roots: Vec<&str> = partition.island_roots.iter().map(String::as_str).collect();
            let mut emitter = JsxEmitter::new(&tree, self.options);
            emitter.analyze_imports(&island_roots);
            let mut islands = Vec::with_capacity(names.len());
            for (id, name) in &names {
                let Some(node) = tree.get(id) else {
                    continue;
                };
                let (body, stubs) = emitter.generate_scoped(node, 2);
                let mut island = FunctionDecl::new(name.clone(), body);
                island.setup = stubs;
                islands.push(island);
            }
            fallback_types.extend(emitter.fallback_types().map(str::to_string));
            void_parents.extend(emitter.void_parents().map(str::to_string));
            let source = templates::islands_module(emitter.into_imports().lines(), islands);
            files.push(self.finish(
                FileKind::Component,
                self.component_path(&directory, ISLANDS_STEM),
                source,
                &mut warnings,
            ));
        }

        let mut emitted = self.emit(&tree, &roots, &names);
        if !names.is_empty() {
            emitted
                .imports
                .add_named(names.iter().map(|(_, name)| name), &format!("./{}", ISLANDS_STEM));
        }
        for component_type in std::mem::take(&mut emitted.fallbacks) {
            if !fallback_types.contains(&component_type) {
                fallback_types.push(component_type);
            }
        }
        for id in std::mem::take(&mut emitted.void_parents) {
            if !void_parents.contains(&id) {
                void_parents.push(id);
            }
        }
        Self::fallback_warnings(&fallback_types, &mut warnings);
        Self::void_child_warnings(&void_parents, &mut warnings);

        let mut page_files = self.render_page(config, &directory, Placement::Server, emitted, &mut warnings);
        page_files.extend(files);
        page_files.extend(self.scaffolds(&directory, &mut warnings));

        Ok(PageOutput {
            files: page_files,
            placement: Placement::Server,
            stats: statistics(&tree, &report),
            warnings,
            fallback_types,
        })
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// INVARIANT CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_MISSING_PATH: &str = "PG-ERR-PATH-001";
pub const ERR_MISSING_TITLE: &str = "PG-ERR-TITLE-001";
pub const ERR_NO_COMPONENTS: &str = "PG-ERR-EMPTY-001";
pub const ERR_DANGLING_CHILD: &str = "PG-ERR-DANGLING-001";
pub const ERR_DUPLICATE_ID: &str = "PG-ERR-DUPLICATE-001";
pub const ERR_EMPTY_ID: &str = "PG-ERR-ID-001";
pub const ERR_NO_ROOT: &str = "PG-ERR-ROOT-001";
pub const ERR_ROOT_AS_CHILD: &str = "PG-ERR-ROOT-002";
pub const ERR_PARENT_MISMATCH: &str = "PG-ERR-PARENT-001";
pub const ERR_UNKNOWN_PARENT: &str = "PG-ERR-PARENT-002";
pub const ERR_ORPHANED_CHILD: &str = "PG-ERR-PARENT-003";
pub const ERR_SHARED_CHILD: &str = "PG-ERR-OWNER-001";
pub const ERR_UNREACHABLE: &str = "PG-ERR-CYCLE-001";
pub const ERR_DATA_SOURCE: &str = "PG-ERR-DATA-001";
pub const ERR_ROUTE_PARAM: &str = "PG-ERR-ROUTE-001";
pub const ERR_ACTION_PARAM: &str = "PG-ERR-ACTION-001";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_MISSING_PATH => "Every generated page is mounted at a route path.",
        ERR_MISSING_TITLE => "Every generated page carries a title.",
        ERR_NO_COMPONENTS => "A page renders at least one component.",
        ERR_DANGLING_CHILD => "Every child id resolves within the same component set.",
        ERR_DUPLICATE_ID => "Component ids are unique within a generation run.",
        ERR_EMPTY_ID => "Component ids are non-empty.",
        ERR_NO_ROOT => "Every page has at least one root component (parentId = null).",
        ERR_ROOT_AS_CHILD => "Root components are never owned by another component.",
        ERR_PARENT_MISMATCH | ERR_ORPHANED_CHILD => {
            "Child id lists and parentId pointers describe the same tree."
        }
        ERR_UNKNOWN_PARENT => "Every parentId resolves within the same component set.",
        ERR_SHARED_CHILD => "A component is owned by exactly one parent.",
        ERR_UNREACHABLE => "The component graph is acyclic and connected to a root.",
        ERR_DATA_SOURCE => "Data-fetching pages name the resource they fetch.",
        ERR_ROUTE_PARAM => "Route parameters are valid identifiers, used once per route.",
        ERR_ACTION_PARAM => "Action parameters are valid identifiers.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// One violated structural invariant of a page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message}")]
pub struct Violation {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    /// The component the violation was found on, if any.
    pub component_id: Option<String>,
    /// A second id involved (the missing child, the claimed parent, ...).
    pub related_id: Option<String>,
    pub hints: Vec<String>,
}

impl Violation {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Violation {
            code: code.to_string(),
            message: message.into(),
            guarantee: get_guarantee(code).to_string(),
            component_id: None,
            related_id: None,
            hints: vec![],
        }
    }

    pub fn on(mut self, component_id: &str) -> Self {
        self.component_id = Some(component_id.to_string());
        self
    }

    pub fn related(mut self, related_id: &str) -> Self {
        self.related_id = Some(related_id.to_string());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("page validation failed with {} violation(s): {}", .0.len(), summarize(.0))]
    Validation(Vec<Violation>),

    #[error("invalid generator input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    #[error("unknown component id: {0}")]
    UnknownComponent(String),

    #[error("invalid action name: {0:?}")]
    InvalidActionName(String),

    #[error("invalid component name: {0:?}")]
    InvalidComponentName(String),

    #[error("failed to generate page {path}: {source}")]
    Page {
        path: String,
        #[source]
        source: Box<GenerateError>,
    },
}

impl GenerateError {
    /// The violations carried by a validation failure (unwrapping batch context).
    pub fn violations(&self) -> &[Violation] {
        match self {
            GenerateError::Validation(v) => v,
            GenerateError::Page { source, .. } => source.violations(),
            _ => &[],
        }
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

// ═══════════════════════════════════════════════════════════════════════════════
// IR TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// A CSS-like style value as the editor stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Number(n) => f.write_str(&format_number(*n)),
            StyleValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Text(value.to_string())
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        StyleValue::Number(value)
    }
}

/// Render a number the way a JS engine would print it (no trailing `.0`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A node of the page-builder component tree.
///
/// Frozen for the duration of a generation run; the generator only ever
/// borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub child_ids: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub styles: IndexMap<String, StyleValue>,
    /// Editor geometry, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
}

/// Property keys holding a node's textual content, in lookup order.
pub const TEXT_PROPERTY_KEYS: &[&str] = &["text", "label", "children"];

impl ComponentInstance {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            parent_id: None,
            child_ids: vec![],
            properties: IndexMap::new(),
            styles: IndexMap::new(),
            position: None,
            size: None,
            locked: false,
            hidden: false,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_children<I, S>(mut self, child_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_ids = child_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property(mut self, name: &str, value: serde_json::Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn with_style(mut self, name: &str, value: impl Into<StyleValue>) -> Self {
        self.styles.insert(name.to_string(), value.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The first non-null textual content property (`text`, `label`, `children`).
    pub fn text_content(&self) -> Option<(&str, &serde_json::Value)> {
        TEXT_PROPERTY_KEYS.iter().find_map(|key| {
            self.properties
                .get_key_value(*key)
                .filter(|(_, v)| matches!(v, serde_json::Value::String(_) | serde_json::Value::Number(_)))
                .map(|(k, v)| (k.as_str(), v))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub og_type: Option<String>,
}

/// SEO descriptor rendered into the page's `metadata` export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDescriptor {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub open_graph: Option<OpenGraph>,
    pub robots: Option<String>,
    pub canonical: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStrategy {
    ForceCache,
    NoStore,
}

impl CacheStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStrategy::ForceCache => "force-cache",
            CacheStrategy::NoStore => "no-store",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFetching {
    /// URL or endpoint handed to `fetch`.
    pub source: String,
    /// Revalidation interval in seconds.
    #[serde(default)]
    pub revalidate: Option<u64>,
    /// Local name bound to the fetched payload. Defaults to `data`.
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub cache: Option<CacheStrategy>,
}

/// One page's generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub path: String,
    #[serde(default)]
    pub metadata: Option<MetadataDescriptor>,
    #[serde(default)]
    pub data_fetching: Option<DataFetching>,
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
}

impl PageConfig {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            path: path.into(),
            metadata: None,
            data_fetching: None,
            components: vec![],
        }
    }

    pub fn root_ids(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|c| c.is_root())
            .map(|c| c.id.as_str())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION FUNCTIONS (collect everything, never stop at the first)
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a page request. Fails with every violation found.
pub fn validate_page(config: &PageConfig) -> Result<(), GenerateError> {
    let violations = collect_page_violations(config);
    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(
            path = %config.path,
            count = violations.len(),
            "page validation failed"
        );
        Err(GenerateError::Validation(violations))
    }
}

pub fn collect_page_violations(config: &PageConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    if config.path.trim().is_empty() {
        violations.push(
            Violation::new(ERR_MISSING_PATH, "Page path is required.")
                .hint("Use \"/\" for the home page."),
        );
    }
    if config.title.trim().is_empty() {
        violations.push(Violation::new(ERR_MISSING_TITLE, "Page title is required."));
    }
    if let Some(fetching) = &config.data_fetching {
        if fetching.source.trim().is_empty() {
            violations.push(Violation::new(
                ERR_DATA_SOURCE,
                "Data fetching requires a non-empty source.",
            ));
        }
    }

    violations.extend(validate_components(&config.components));
    violations
}

/// Structural validation of a flattened component tree.
pub fn validate_components(components: &[ComponentInstance]) -> Vec<Violation> {
    let mut violations = Vec::new();

    if components.is_empty() {
        violations.push(
            Violation::new(ERR_NO_COMPONENTS, "At least one component is required.")
                .hint("Add a root component (parentId = null) to the page."),
        );
        return violations;
    }

    let mut by_id: HashMap<&str, &ComponentInstance> = HashMap::new();
    for component in components {
        if component.id.trim().is_empty() {
            violations.push(Violation::new(
                ERR_EMPTY_ID,
                format!("A component of type \"{}\" has an empty id.", component.component_type),
            ));
            continue;
        }
        if by_id.insert(component.id.as_str(), component).is_some() {
            violations.push(
                Violation::new(
                    ERR_DUPLICATE_ID,
                    format!("Component id \"{}\" is used more than once.", component.id),
                )
                .on(&component.id),
            );
        }
    }

    let roots: Vec<&ComponentInstance> = components.iter().filter(|c| c.is_root()).collect();
    if roots.is_empty() {
        violations.push(Violation::new(
            ERR_NO_ROOT,
            "No root component found (every component has a parentId).",
        ));
    }

    // Ownership as declared by childIds
    let mut owner: HashMap<&str, &str> = HashMap::new();
    for component in components {
        for child_id in &component.child_ids {
            let Some(child) = by_id.get(child_id.as_str()) else {
                violations.push(
                    Violation::new(
                        ERR_DANGLING_CHILD,
                        format!(
                            "Component \"{}\" lists child \"{}\" which does not exist.",
                            component.id, child_id
                        ),
                    )
                    .on(&component.id)
                    .related(child_id),
                );
                continue;
            };

            if let Some(previous) = owner.get(child_id.as_str()) {
                violations.push(
                    Violation::new(
                        ERR_SHARED_CHILD,
                        format!(
                            "Component \"{}\" is listed as a child of both \"{}\" and \"{}\".",
                            child_id, previous, component.id
                        ),
                    )
                    .on(child_id)
                    .related(&component.id),
                );
                continue;
            }
            owner.insert(child_id.as_str(), component.id.as_str());

            match &child.parent_id {
                None => violations.push(
                    Violation::new(
                        ERR_ROOT_AS_CHILD,
                        format!(
                            "Root component \"{}\" is listed as a child of \"{}\".",
                            child_id, component.id
                        ),
                    )
                    .on(child_id)
                    .related(&component.id),
                ),
                Some(parent_id) if parent_id != &component.id => violations.push(
                    Violation::new(
                        ERR_PARENT_MISMATCH,
                        format!(
                            "Component \"{}\" is listed by \"{}\" but its parentId is \"{}\".",
                            child_id, component.id, parent_id
                        ),
                    )
                    .on(child_id)
                    .related(&component.id),
                ),
                Some(_) => {}
            }
        }
    }

    // parentId pointers that nobody backs with a childIds entry
    for component in components {
        let Some(parent_id) = &component.parent_id else {
            continue;
        };
        if !by_id.contains_key(parent_id.as_str()) {
            violations.push(
                Violation::new(
                    ERR_UNKNOWN_PARENT,
                    format!(
                        "Component \"{}\" has parentId \"{}\" which does not exist.",
                        component.id, parent_id
                    ),
                )
                .on(&component.id)
                .related(parent_id),
            );
        } else if !owner.contains_key(component.id.as_str()) {
            violations.push(
                Violation::new(
                    ERR_ORPHANED_CHILD,
                    format!(
                        "Component \"{}\" points at parent \"{}\" which does not list it.",
                        component.id, parent_id
                    ),
                )
                .on(&component.id)
                .related(parent_id),
            );
        }
    }

    // Everything claimed by a parent must be reachable from a root.
    let mut reached: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = roots.iter().map(|r| r.id.as_str()).collect();
    while let Some(id) = stack.pop() {
        if !reached.insert(id) {
            continue;
        }
        if let Some(node) = by_id.get(id) {
            for child_id in node.child_ids.iter().rev() {
                if by_id.contains_key(child_id.as_str()) && !reached.contains(child_id.as_str()) {
                    stack.push(child_id.as_str());
                }
            }
        }
    }
    for component in components {
        let id = component.id.as_str();
        if id.trim().is_empty() || reached.contains(id) {
            continue;
        }
        // Already reported as an orphan or as pointing at an unknown parent.
        if !owner.contains_key(id) {
            continue;
        }
        violations.push(
            Violation::new(
                ERR_UNREACHABLE,
                format!(
                    "Component \"{}\" is not reachable from any root (cycle in childIds).",
                    id
                ),
            )
            .on(id),
        );
    }

    violations
}

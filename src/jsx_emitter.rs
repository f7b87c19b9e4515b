//! View emitter: renders component subtrees to JSX text.
//!
//! Attribute emission order is fixed:
//!
//! 1. identity (`data-component-id`)
//! 2. `className` (utility tokens, then any user `className`)
//! 3. `style={{ ... }}` for residual styles
//! 4. implicit primitive attributes, then declared properties
//! 5. event handlers

use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::imports::ImportResolver;
use crate::options::GenerationOptions;
use crate::placement::{self, HandlerBinding};
use crate::primitives::{self, Primitive};
use crate::styles::{camel_case_property, StyleTranslator};
use crate::templates::is_identifier;
use crate::tree::ComponentTree;
use crate::validate::{format_number, ComponentInstance, StyleValue, TEXT_PROPERTY_KEYS};

pub const INDENT: &str = "  ";
pub const ID_ATTRIBUTE: &str = "data-component-id";
/// A lone attribute longer than this still goes on its own line.
const SHORT_ATTRIBUTE_LIMIT: usize = 60;

lazy_static! {
    static ref ATTRIBUTE_NAME_RE: Regex =
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$-]*(:[A-Za-z_$][A-Za-z0-9_$-]*)?$").unwrap();
    static ref JS_IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

pub struct JsxEmitter<'a> {
    tree: &'a ComponentTree<'a>,
    options: &'a GenerationOptions,
    imports: ImportResolver,
    handler_refs: IndexSet<String>,
    fallbacks: IndexSet<String>,
    void_parents: IndexSet<String>,
    substitutions: IndexMap<String, String>,
    active: HashSet<String>,
}

impl<'a> JsxEmitter<'a> {
    pub fn new(tree: &'a ComponentTree<'a>, options: &'a GenerationOptions) -> Self {
        Self {
            tree,
            options,
            imports: ImportResolver::new(),
            handler_refs: IndexSet::new(),
            fallbacks: IndexSet::new(),
            void_parents: IndexSet::new(),
            substitutions: IndexMap::new(),
            active: HashSet::new(),
        }
    }

    /// Seed the emitter with an existing resolver (e.g. a cloned base set).
    #[must_use]
    pub fn with_imports(mut self, imports: ImportResolver) -> Self {
        self.imports = imports;
        self
    }

    /// Render `<component />` in place of the subtree rooted at `id`.
    pub fn substitute(&mut self, id: &str, component: &str) {
        self.substitutions.insert(id.to_string(), component.to_string());
    }

    pub fn imports(&self) -> &ImportResolver {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut ImportResolver {
        &mut self.imports
    }

    pub fn into_imports(self) -> ImportResolver {
        self.imports
    }

    /// Function names referenced by handlers, in first-seen order.
    pub fn handler_refs(&self) -> impl Iterator<Item = &str> {
        self.handler_refs.iter().map(String::as_str)
    }

    /// Placeholder declarations for every referenced handler function.
    /// Names already bound by an import get no stub; a local would shadow it.
    pub fn handler_stubs(&self) -> Vec<String> {
        let bound = self.imports.bindings();
        self.handler_refs
            .iter()
            .filter(|name| {
                let shadowed = bound.contains(name.as_str());
                if shadowed {
                    tracing::warn!(handler = %name, "handler shares a name with an import, no stub emitted");
                }
                !shadowed
            })
            .map(|name| format!("const {} = () => {{}};", name))
            .collect()
    }

    /// Render one node and return the handler stubs its own subtree needs,
    /// independent of anything rendered before.
    pub fn generate_scoped(&mut self, node: &ComponentInstance, depth: usize) -> (String, Vec<String>) {
        let outer = std::mem::take(&mut self.handler_refs);
        let body = self.generate_component(node, depth);
        let stubs = self.handler_stubs();
        let inner = std::mem::replace(&mut self.handler_refs, outer);
        self.handler_refs.extend(inner);
        (body, stubs)
    }

    /// Component types that degraded to the fallback primitive.
    pub fn fallback_types(&self) -> impl Iterator<Item = &str> {
        self.fallbacks.iter().map(String::as_str)
    }

    /// Ids of void elements whose children were not rendered.
    pub fn void_parents(&self) -> impl Iterator<Item = &str> {
        self.void_parents.iter().map(String::as_str)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // IMPORT ANALYSIS
    // ═══════════════════════════════════════════════════════════════════════

    /// Register the imports the subtrees need without emitting anything.
    /// Substituted subtrees are skipped entirely.
    pub fn analyze_imports(&mut self, root_ids: &[&str]) {
        let tree = self.tree;
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = root_ids.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) || self.substitutions.contains_key(id) {
                continue;
            }
            let Some(node) = tree.get(id) else {
                continue;
            };
            if let Some(import) = primitives::resolve(&node.component_type).0.import {
                import.register(&mut self.imports);
            }
            for value in node.properties.values() {
                for (hook, module) in placement::detect_hooks(value) {
                    self.imports.add_named([hook], module);
                }
            }
            stack.extend(node.child_ids.iter().rev().map(String::as_str));
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // MARKUP
    // ═══════════════════════════════════════════════════════════════════════

    /// Render each root and join them, one per line group.
    pub fn generate_component_tree(&mut self, root_ids: &[&str], depth: usize) -> String {
        root_ids
            .iter()
            .filter_map(|id| self.tree.get(id))
            .map(|node| self.generate_component(node, depth))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Like [`generate_component_tree`](Self::generate_component_tree) but
    /// wraps multiple roots in a fragment so the result is one expression.
    pub fn generate_root(&mut self, root_ids: &[&str], depth: usize) -> String {
        if root_ids.len() == 1 {
            return self.generate_component_tree(root_ids, depth);
        }
        let indent = INDENT.repeat(depth);
        let inner = self.generate_component_tree(root_ids, depth + 1);
        format!("{indent}<>\n{inner}\n{indent}</>")
    }

    /// Render one node with its owned subtree.
    pub fn generate_component(&mut self, node: &ComponentInstance, depth: usize) -> String {
        let indent = INDENT.repeat(depth);

        if let Some(component) = self.substitutions.get(&node.id) {
            return format!("{indent}<{component} />");
        }
        if !self.active.insert(node.id.clone()) {
            tracing::warn!(id = %node.id, "component reached twice while rendering, skipped");
            return String::new();
        }

        let (primitive, known) = primitives::resolve(&node.component_type);
        if !known {
            tracing::warn!(
                id = %node.id,
                component_type = %node.component_type,
                fallback = primitive.tag,
                "unknown component type"
            );
            self.fallbacks.insert(node.component_type.clone());
        }
        if let Some(import) = primitive.import {
            import.register(&mut self.imports);
        }

        let attributes = self.attributes(node, primitive);
        let (open, multiline) = open_tag(primitive.tag, &attributes, &indent);
        let children = self.tree.children(&node.id);
        if primitive.void && !children.is_empty() {
            tracing::warn!(
                id = %node.id,
                tag = primitive.tag,
                children = children.len(),
                "void element cannot hold children, children dropped"
            );
            self.void_parents.insert(node.id.clone());
        }
        let text = if primitive.void {
            None
        } else {
            node.text_content().map(|(_, value)| render_text(value))
        };

        let rendered = if primitive.void || (children.is_empty() && text.is_none()) {
            if multiline {
                format!("{open}\n{indent}/>")
            } else {
                format!("{open} />")
            }
        } else if children.is_empty() {
            let text = text.unwrap_or_default();
            if multiline {
                format!("{open}\n{indent}>\n{indent}{INDENT}{text}\n{indent}</{tag}>", tag = primitive.tag)
            } else {
                format!("{open}>{text}</{tag}>", tag = primitive.tag)
            }
        } else {
            let mut lines = Vec::with_capacity(children.len() + 3);
            lines.push(if multiline {
                format!("{open}\n{indent}>")
            } else {
                format!("{open}>")
            });
            if let Some(text) = text {
                lines.push(format!("{indent}{INDENT}{text}"));
            }
            for child in children {
                let rendered = self.generate_component(child, depth + 1);
                if !rendered.is_empty() {
                    lines.push(rendered);
                }
            }
            lines.push(format!("{indent}</{}>", primitive.tag));
            lines.join("\n")
        };

        self.active.remove(&node.id);
        rendered
    }

    fn attributes(&mut self, node: &ComponentInstance, primitive: &Primitive) -> Vec<String> {
        let mut attributes = Vec::new();

        if self.options.emit_component_ids {
            attributes.push(format!("{}={}", ID_ATTRIBUTE, attribute_value(&node.id)));
        }

        // styles
        let mut translator = StyleTranslator::new();
        let mut inline: IndexMap<String, StyleValue> = IndexMap::new();
        if self.options.use_tailwind {
            translator.add_styles(&node.styles);
            inline.extend(translator.custom_styles().clone());
        } else {
            for (property, value) in &node.styles {
                inline.insert(camel_case_property(property), value.clone());
            }
        }
        if let Some(serde_json::Value::Object(style)) = node.properties.get("style") {
            for (property, value) in style {
                let value = match value {
                    serde_json::Value::Number(n) => n.as_f64().map(StyleValue::Number),
                    serde_json::Value::String(s) => Some(StyleValue::Text(s.clone())),
                    _ => None,
                };
                if let Some(value) = value {
                    inline.insert(camel_case_property(property), value);
                }
            }
        }

        let mut class_tokens: IndexSet<String> = translator.classes().map(str::to_string).collect();
        for key in ["className", "class"] {
            if let Some(serde_json::Value::String(extra)) = node.properties.get(key) {
                class_tokens.extend(extra.split_whitespace().map(str::to_string));
            }
        }
        if !class_tokens.is_empty() {
            let joined = class_tokens.into_iter().collect::<Vec<_>>().join(" ");
            attributes.push(format!("className={}", attribute_value(&joined)));
        }
        if !inline.is_empty() {
            attributes.push(format!("style={{{}}}", style_object(&inline)));
        }

        // implicit primitive attributes
        for (name, value) in primitive.implicit_attributes {
            if !node.properties.contains_key(*name) {
                attributes.push(format!("{}={}", name, attribute_value(value)));
            }
        }

        // declared properties
        let mut handlers = Vec::new();
        for (key, value) in &node.properties {
            if placement::is_handler_key(key) {
                if let Some(binding) = HandlerBinding::parse(value) {
                    handlers.push((key.as_str(), binding));
                }
                continue;
            }
            if matches!(key.as_str(), "className" | "class" | "style") {
                continue;
            }
            if TEXT_PROPERTY_KEYS.contains(&key.as_str()) && (!primitive.void || key == "children") {
                continue;
            }
            let name = match key.as_str() {
                "for" => "htmlFor",
                other => other,
            };
            if !ATTRIBUTE_NAME_RE.is_match(name) {
                tracing::warn!(id = %node.id, property = %key, "property name is not a valid attribute, skipped");
                continue;
            }
            if let Some(attribute) = property_attribute(name, value) {
                attributes.push(attribute);
            }
        }

        // handlers last
        for (key, binding) in handlers {
            match binding {
                HandlerBinding::Inline(statement) => {
                    let statement = if statement.ends_with(';') || statement.ends_with('}') {
                        statement
                    } else {
                        format!("{};", statement)
                    };
                    attributes.push(format!("{}={{() => {{ {} }}}}", key, statement));
                }
                HandlerBinding::Function(name) => {
                    if is_identifier(&name) {
                        self.handler_refs.insert(name.clone());
                    }
                    attributes.push(format!("{}={{{}}}", key, name));
                }
            }
        }

        attributes
    }
}

/// Opening tag without its terminator, and whether it spans several lines.
fn open_tag(tag: &str, attributes: &[String], indent: &str) -> (String, bool) {
    match attributes {
        [] => (format!("{indent}<{tag}"), false),
        [only] if only.len() <= SHORT_ATTRIBUTE_LIMIT && !only.contains('\n') => {
            (format!("{indent}<{tag} {only}"), false)
        }
        _ => {
            let mut out = format!("{indent}<{tag}");
            for attribute in attributes {
                out.push('\n');
                out.push_str(indent);
                out.push_str(INDENT);
                out.push_str(attribute);
            }
            (out, true)
        }
    }
}

/// `"text"` when it can be a plain JSX string, `{"..."}` otherwise.
pub fn attribute_value(value: &str) -> String {
    if value.contains('"') || value.contains('\n') {
        format!("{{{}}}", json_string(value))
    } else {
        format!("\"{}\"", value)
    }
}

fn property_attribute(name: &str, value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => None,
        serde_json::Value::Bool(true) => Some(name.to_string()),
        serde_json::Value::String(s) => Some(format!("{}={}", name, attribute_value(s))),
        other => Some(format!("{}={{{}}}", name, other)),
    }
}

fn render_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => {
            if s.contains(['{', '}', '<', '>', '\n']) || s.trim() != s {
                format!("{{{}}}", json_string(s))
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

/// `{ key: value, ... }` for a style attribute.
pub fn style_object(styles: &IndexMap<String, StyleValue>) -> String {
    let entries: Vec<String> = styles
        .iter()
        .map(|(property, value)| {
            let key = if JS_IDENT_RE.is_match(property) {
                property.clone()
            } else {
                json_string(property)
            };
            let value = match value {
                StyleValue::Number(n) => format_number(*n),
                StyleValue::Text(s) => json_string(s),
            };
            format!("{}: {}", key, value)
        })
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "\\\"")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(components: &[ComponentInstance], options: &GenerationOptions) -> (String, ImportResolver) {
        let tree = ComponentTree::new(components);
        let mut emitter = JsxEmitter::new(&tree, options);
        emitter.analyze_imports(tree.roots());
        let out = emitter.generate_component_tree(tree.roots(), 0);
        (out, emitter.into_imports())
    }

    fn plain() -> GenerationOptions {
        GenerationOptions::new().with_component_ids(false)
    }

    #[test]
    fn test_childless_node_self_closes() {
        let components = vec![ComponentInstance::new("a", "Container")];
        let (out, _) = render(&components, &plain());
        assert_eq!(out, "<div />");
    }

    #[test]
    fn test_text_content_renders_inline() {
        let components = vec![ComponentInstance::new("t", "Text").with_property("text", json!("Hello"))];
        let (out, _) = render(&components, &plain());
        assert_eq!(out, "<p>Hello</p>");
    }

    #[test]
    fn test_text_with_braces_is_an_expression() {
        let components = vec![ComponentInstance::new("t", "Text").with_property("text", json!("a {b}"))];
        let (out, _) = render(&components, &plain());
        assert_eq!(out, "<p>{\"a {b}\"}</p>");
    }

    #[test]
    fn test_single_short_attribute_stays_inline() {
        let components = vec![ComponentInstance::new("a", "Container").with_style("display", "flex")];
        let (out, _) = render(&components, &plain());
        assert_eq!(out, "<div className=\"flex\" />");
    }

    #[test]
    fn test_attribute_order_and_multiline_layout() {
        let components = vec![ComponentInstance::new("b", "Button")
            .with_property("onClick", json!("handleClick"))
            .with_property("disabled", json!(true))
            .with_property("text", json!("Go"))
            .with_style("padding", "8px")
            .with_style("boxShadow", "0 0 1px red")];
        let (out, _) = render(&components, &GenerationOptions::new());
        assert_eq!(
            out,
            [
                "<button",
                "  data-component-id=\"b\"",
                "  className=\"p-2\"",
                "  style={{ boxShadow: \"0 0 1px red\" }}",
                "  type=\"button\"",
                "  disabled",
                "  onClick={handleClick}",
                ">",
                "  Go",
                "</button>",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_property_value_forms() {
        let components = vec![ComponentInstance::new("i", "Input")
            .with_property("placeholder", json!("Say \"hi\""))
            .with_property("maxLength", json!(20))
            .with_property("readOnly", json!(false))
            .with_property("data", json!({ "a": 1 }))
            .with_property("for", json!("x"))];
        let (out, _) = render(&components, &plain());
        assert!(out.contains("placeholder={\"Say \\\"hi\\\"\"}"));
        assert!(out.contains("maxLength={20}"));
        assert!(!out.contains("readOnly"));
        assert!(out.contains("data={{\"a\":1}}"));
        assert!(out.contains("htmlFor=\"x\""));
        assert!(out.trim_end().ends_with("/>"));
    }

    #[test]
    fn test_inline_handler_is_wrapped() {
        let components = vec![ComponentInstance::new("c", "Container")
            .with_property("onClick", json!("alert('hi')"))];
        let (out, _) = render(&components, &plain());
        assert_eq!(out, "<div onClick={() => { alert('hi'); }} />");
    }

    #[test]
    fn test_function_handlers_produce_stubs() {
        let components = vec![ComponentInstance::new("c", "Container")
            .with_property("onClick", json!({ "function": "openMenu" }))];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        let out = emitter.generate_component_tree(tree.roots(), 0);
        assert_eq!(out, "<div onClick={openMenu} />");
        assert_eq!(emitter.handler_stubs(), vec!["const openMenu = () => {};"]);
    }

    #[test]
    fn test_nested_children_are_indented() {
        let components = vec![
            ComponentInstance::new("root", "Container").with_children(["t"]),
            ComponentInstance::new("t", "Text")
                .with_parent("root")
                .with_property("text", json!("Hi")),
        ];
        let (out, _) = render(&components, &plain());
        assert_eq!(out, "<div>\n  <p>Hi</p>\n</div>");
    }

    #[test]
    fn test_link_and_image_register_imports() {
        let components = vec![
            ComponentInstance::new("root", "Container").with_children(["l", "i"]),
            ComponentInstance::new("l", "Link").with_parent("root"),
            ComponentInstance::new("i", "Image")
                .with_parent("root")
                .with_property("src", json!("/a.png")),
        ];
        let (out, imports) = render(&components, &plain());
        assert!(out.contains("<Link href=\"#\" />"));
        assert!(out.contains("<Image\n    alt=\"\"\n    src=\"/a.png\"\n  />"));
        assert!(imports.contains("next/link"));
        assert!(imports.contains("next/image"));
    }

    #[test]
    fn test_hook_usage_registers_imports() {
        let components = vec![ComponentInstance::new("c", "Container")
            .with_property("data-init", json!("const [x] = useState(0)"))];
        let (_, imports) = render(&components, &plain());
        assert!(imports.has_named("react", "useState"));
    }

    #[test]
    fn test_unknown_type_falls_back() {
        let components = vec![ComponentInstance::new("x", "Carousel")];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        assert_eq!(emitter.generate_component_tree(tree.roots(), 0), "<div />");
        assert_eq!(emitter.fallback_types().collect::<Vec<_>>(), vec!["Carousel"]);
    }

    #[test]
    fn test_inline_styles_without_utility_classes() {
        let components = vec![ComponentInstance::new("a", "Container")
            .with_style("display", "flex")
            .with_style("padding", 16.0)];
        let options = plain().with_tailwind(false);
        let (out, _) = render(&components, &options);
        assert_eq!(out, "<div style={{ display: \"flex\", padding: 16 }} />");
    }

    #[test]
    fn test_substitution_replaces_subtree() {
        let components = vec![
            ComponentInstance::new("root", "Container").with_children(["island"]),
            ComponentInstance::new("island", "Button").with_parent("root"),
        ];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        emitter.substitute("island", "ClientIsland1");
        let out = emitter.generate_component_tree(tree.roots(), 0);
        assert_eq!(out, "<div>\n  <ClientIsland1 />\n</div>");
    }

    #[test]
    fn test_analysis_skips_substituted_subtrees() {
        let components = vec![
            ComponentInstance::new("root", "Container").with_children(["island"]),
            ComponentInstance::new("island", "Container")
                .with_parent("root")
                .with_children(["link"]),
            ComponentInstance::new("link", "Link").with_parent("island"),
        ];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        emitter.substitute("island", "ClientIsland1");
        emitter.analyze_imports(tree.roots());
        assert!(emitter.imports().is_empty());
    }

    #[test]
    fn test_multiple_roots_wrap_in_fragment() {
        let components = vec![
            ComponentInstance::new("a", "Header"),
            ComponentInstance::new("b", "Footer"),
        ];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        let out = emitter.generate_root(tree.roots(), 0);
        assert_eq!(out, "<>\n  <header />\n  <footer />\n</>");
    }

    #[test]
    fn test_malformed_attribute_names_are_skipped() {
        let components = vec![ComponentInstance::new("s", "Icon")
            .with_property("data.x", json!("1"))
            .with_property("a:b:c", json!("2"))
            .with_property("xlink:href", json!("#logo"))
            .with_property("aria-label", json!("Logo"))];
        let (out, _) = render(&components, &plain());
        assert!(!out.contains("data.x"));
        assert!(!out.contains("a:b:c"));
        assert!(out.contains("xlink:href=\"#logo\""));
        assert!(out.contains("aria-label=\"Logo\""));
    }

    #[test]
    fn test_handler_named_like_an_import_gets_no_stub() {
        let components = vec![ComponentInstance::new("l", "Link").with_property("onClick", json!("Link"))];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        emitter.analyze_imports(tree.roots());
        let out = emitter.generate_component_tree(tree.roots(), 0);
        assert!(out.contains("onClick={Link}"));
        assert!(emitter.handler_stubs().is_empty());
    }

    #[test]
    fn test_scoped_render_reports_its_own_stubs() {
        let components = vec![
            ComponentInstance::new("a", "Button").with_property("onClick", json!("handleClick")),
            ComponentInstance::new("b", "Button")
                .with_property("onClick", json!("handleClick"))
                .with_property("onBlur", json!("handleBlur")),
        ];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        let first = tree.get("a").unwrap();
        let second = tree.get("b").unwrap();
        let (_, stubs) = emitter.generate_scoped(first, 0);
        assert_eq!(stubs, vec!["const handleClick = () => {};"]);
        let (_, stubs) = emitter.generate_scoped(second, 0);
        assert_eq!(
            stubs,
            vec!["const handleClick = () => {};", "const handleBlur = () => {};"]
        );
        assert_eq!(emitter.handler_refs().collect::<Vec<_>>(), vec!["handleClick", "handleBlur"]);
    }

    #[test]
    fn test_void_element_drops_children() {
        let components = vec![
            ComponentInstance::new("img", "Image")
                .with_property("src", json!("/a.png"))
                .with_children(["caption"]),
            ComponentInstance::new("caption", "Text")
                .with_parent("img")
                .with_property("text", json!("Caption")),
        ];
        let tree = ComponentTree::new(&components);
        let options = plain();
        let mut emitter = JsxEmitter::new(&tree, &options);
        let out = emitter.generate_component_tree(tree.roots(), 0);
        assert!(!out.contains("Caption"));
        assert!(out.trim_end().ends_with("/>"));
        assert_eq!(emitter.void_parents().collect::<Vec<_>>(), vec!["img"]);
    }
}

//! Props declarations inferred from observed property shapes.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::jsx_emitter::INDENT;
use crate::placement::is_handler_key;
use crate::templates::{object_key, pascal_case};
use crate::validate::ComponentInstance;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDecl {
    pub name: String,
    pub ts_type: String,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTypeDecl {
    pub component_type: String,
    pub interface_name: String,
    pub props: Vec<PropDecl>,
}

impl ComponentTypeDecl {
    pub fn render(&self) -> String {
        if self.props.is_empty() {
            return format!("export type {} = Record<string, never>;", self.interface_name);
        }
        let mut lines = vec![format!("export interface {} {{", self.interface_name)];
        for prop in &self.props {
            let key = object_key(&prop.name);
            let optional = if prop.optional { "?" } else { "" };
            lines.push(format!("{INDENT}{}{}: {};", key, optional, prop.ts_type));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}

/// TypeScript type of one JSON value.
pub fn value_type(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(_) => "boolean".to_string(),
        serde_json::Value::Number(_) => "number".to_string(),
        serde_json::Value::String(_) => "string".to_string(),
        serde_json::Value::Array(items) => {
            let types: IndexSet<String> = items.iter().map(value_type).collect();
            match types.len() {
                0 => "unknown[]".to_string(),
                1 => format!("{}[]", types[0]),
                _ => format!("({})[]", union(types)),
            }
        }
        serde_json::Value::Object(map) if map.is_empty() => "Record<string, unknown>".to_string(),
        serde_json::Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let key = object_key(k);
                    format!("{}: {}", key, value_type(v))
                })
                .collect();
            format!("{{ {} }}", fields.join("; "))
        }
    }
}

fn union(types: IndexSet<String>) -> String {
    let mut types: Vec<String> = types.into_iter().collect();
    types.sort();
    types.join(" | ")
}

/// One declaration per component type, sorted by type name.
pub fn infer_types<'a, I>(components: I) -> Vec<ComponentTypeDecl>
where
    I: IntoIterator<Item = &'a ComponentInstance>,
{
    #[derive(Default)]
    struct Observed {
        instances: usize,
        props: IndexMap<String, (usize, IndexSet<String>)>,
    }

    let mut by_type: BTreeMap<String, Observed> = BTreeMap::new();
    for component in components {
        let observed = by_type.entry(component.component_type.clone()).or_default();
        observed.instances += 1;
        for (name, value) in &component.properties {
            let ts_type = if is_handler_key(name) {
                "() => void".to_string()
            } else {
                value_type(value)
            };
            let entry = observed.props.entry(name.clone()).or_default();
            entry.0 += 1;
            entry.1.insert(ts_type);
        }
    }

    by_type
        .into_iter()
        .map(|(component_type, observed)| ComponentTypeDecl {
            interface_name: format!("{}Props", pascal_case(&component_type)),
            props: observed
                .props
                .into_iter()
                .map(|(name, (seen, types))| PropDecl {
                    name,
                    ts_type: union(types),
                    optional: seen < observed.instances,
                })
                .collect(),
            component_type,
        })
        .collect()
}

pub fn render_types_file(decls: &[ComponentTypeDecl]) -> String {
    let mut out = decls
        .iter()
        .map(ComponentTypeDecl::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_types() {
        assert_eq!(value_type(&json!("a")), "string");
        assert_eq!(value_type(&json!([1, 2])), "number[]");
        assert_eq!(value_type(&json!([1, "a"])), "(number | string)[]");
        assert_eq!(value_type(&json!({ "a": true, "b-c": null })), "{ a: boolean; \"b-c\": null }");
        assert_eq!(value_type(&json!({})), "Record<string, unknown>");
    }

    #[test]
    fn test_optional_and_handler_props() {
        let components = vec![
            ComponentInstance::new("a", "Button")
                .with_property("label", json!("Save"))
                .with_property("onClick", json!("save")),
            ComponentInstance::new("b", "Button").with_property("label", json!(3)),
            ComponentInstance::new("c", "Container"),
        ];
        let decls = infer_types(&components);
        assert_eq!(decls.len(), 2);
        assert_eq!(
            decls[0].render(),
            "export interface ButtonProps {\n  label: number | string;\n  onClick?: () => void;\n}"
        );
        assert_eq!(decls[1].render(), "export type ContainerProps = Record<string, never>;");
    }
}

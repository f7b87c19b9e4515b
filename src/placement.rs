//! Client/server placement classification.
//!
//! A node is CLIENT when one of these closed rules fires:
//!
//! 1. it declares an event handler (`on` + uppercase letter, e.g. `onClick`)
//!    bound to an executable value (see [`HandlerBinding`]);
//! 2. its type resolves to an inherently interactive primitive;
//! 3. one of its string properties calls a hook from [`CLIENT_HOOKS`].
//!
//! Everything else is SERVER. A page is CLIENT as soon as one node is.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::imports::{NEXT_NAVIGATION_MODULE, REACT_MODULE};
use crate::primitives;
use crate::templates;
use crate::tree::ComponentTree;
use crate::validate::ComponentInstance;

/// Hooks that pin a node to the client, with the module that exports them.
pub const CLIENT_HOOKS: &[(&str, &str)] = &[
    ("useState", REACT_MODULE),
    ("useEffect", REACT_MODULE),
    ("useLayoutEffect", REACT_MODULE),
    ("useRef", REACT_MODULE),
    ("useMemo", REACT_MODULE),
    ("useCallback", REACT_MODULE),
    ("useContext", REACT_MODULE),
    ("useReducer", REACT_MODULE),
    ("useTransition", REACT_MODULE),
    ("useId", REACT_MODULE),
    ("useRouter", NEXT_NAVIGATION_MODULE),
    ("usePathname", NEXT_NAVIGATION_MODULE),
    ("useSearchParams", NEXT_NAVIGATION_MODULE),
    ("useParams", NEXT_NAVIGATION_MODULE),
];

lazy_static! {
    static ref HANDLER_KEY_RE: Regex = Regex::new(r"^on[A-Z][A-Za-z]*$").unwrap();
    static ref IDENT_PATH_RE: Regex =
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap();
    static ref HOOK_CALL_RE: Regex = {
        let names: Vec<&str> = CLIENT_HOOKS.iter().map(|(name, _)| *name).collect();
        Regex::new(&format!(r"\b({})\s*[(<]", names.join("|"))).unwrap()
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Client,
    Server,
}

impl Placement {
    pub fn is_client(self) -> bool {
        self == Placement::Client
    }

    /// The module directive line, if any.
    pub fn directive(self) -> Option<&'static str> {
        match self {
            Placement::Client => Some("\"use client\";"),
            Placement::Server => None,
        }
    }
}

/// How an event-handler property is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerBinding {
    /// A statement to run, e.g. `alert('hi')`.
    Inline(String),
    /// A reference to a named function, e.g. `handleClick`.
    Function(String),
}

impl HandlerBinding {
    /// `None` when the value is not executable (null, booleans, numbers, "").
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => {
                let s = s.trim();
                if s.is_empty() || matches!(s, "null" | "undefined" | "true" | "false") {
                    None
                } else if is_function_path(s) {
                    Some(HandlerBinding::Function(s.to_string()))
                } else {
                    Some(HandlerBinding::Inline(s.to_string()))
                }
            }
            serde_json::Value::Object(map) => ["function", "ref", "handler"]
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
                .map(str::trim)
                .filter(|name| is_function_path(name))
                .map(|name| HandlerBinding::Function(name.to_string())),
            _ => None,
        }
    }
}

/// `save` or `actions.save`, but not a bare keyword such as `delete`.
fn is_function_path(text: &str) -> bool {
    IDENT_PATH_RE.is_match(text) && (text.contains('.') || !templates::is_reserved_word(text))
}

pub fn is_handler_key(key: &str) -> bool {
    HANDLER_KEY_RE.is_match(key)
}

/// Executable event-handler properties of a node, in declaration order.
pub fn handlers(node: &ComponentInstance) -> Vec<(&str, HandlerBinding)> {
    node.properties
        .iter()
        .filter(|(key, _)| is_handler_key(key))
        .filter_map(|(key, value)| HandlerBinding::parse(value).map(|b| (key.as_str(), b)))
        .collect()
}

/// Hook calls found in the string leaves of a property value.
pub fn detect_hooks(value: &serde_json::Value) -> Vec<(&'static str, &'static str)> {
    let mut found = Vec::new();
    collect_hooks(value, &mut found);
    found
}

fn collect_hooks(value: &serde_json::Value, found: &mut Vec<(&'static str, &'static str)>) {
    match value {
        serde_json::Value::String(s) => {
            for caps in HOOK_CALL_RE.captures_iter(s) {
                if let Some(entry) = CLIENT_HOOKS.iter().find(|(name, _)| *name == &caps[1]) {
                    if !found.contains(entry) {
                        found.push(*entry);
                    }
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_hooks(item, found);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_hooks(item, found);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum PlacementReason {
    EventHandler { property: String },
    InteractivePrimitive { component_type: String },
    HookUsage { hook: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    pub placement: Placement,
    pub reasons: Vec<PlacementReason>,
}

pub fn classify_node(node: &ComponentInstance) -> NodePlacement {
    let mut reasons = Vec::new();

    for (key, _) in handlers(node) {
        reasons.push(PlacementReason::EventHandler {
            property: key.to_string(),
        });
    }
    if primitives::resolve(&node.component_type).0.interactive {
        reasons.push(PlacementReason::InteractivePrimitive {
            component_type: node.component_type.clone(),
        });
    }
    for value in node.properties.values() {
        for (hook, _) in detect_hooks(value) {
            let reason = PlacementReason::HookUsage {
                hook: hook.to_string(),
            };
            if !reasons.contains(&reason) {
                reasons.push(reason);
            }
        }
    }

    NodePlacement {
        placement: if reasons.is_empty() {
            Placement::Server
        } else {
            Placement::Client
        },
        reasons,
    }
}

/// Per-node placement plus the page-granular directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    pub nodes: IndexMap<String, NodePlacement>,
    pub page: Placement,
}

impl PlacementReport {
    pub fn placement_of(&self, id: &str) -> Option<Placement> {
        self.nodes.get(id).map(|n| n.placement)
    }

    pub fn client_ids(&self) -> Vec<&str> {
        self.ids_with(Placement::Client)
    }

    pub fn server_ids(&self) -> Vec<&str> {
        self.ids_with(Placement::Server)
    }

    pub fn client_count(&self) -> usize {
        self.client_ids().len()
    }

    pub fn server_count(&self) -> usize {
        self.server_ids().len()
    }

    fn ids_with(&self, placement: Placement) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.placement == placement)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Classify the subtrees under `root_ids`.
///
/// With `prefer_server == false` the directive is CLIENT regardless of the
/// per-node result.
pub fn classify(tree: &ComponentTree<'_>, root_ids: &[&str], prefer_server: bool) -> PlacementReport {
    let mut nodes = IndexMap::new();
    for node in tree.walk(root_ids) {
        nodes.insert(node.id.clone(), classify_node(node));
    }
    let any_client = nodes.values().any(|n: &NodePlacement| n.placement.is_client());
    let page = if any_client || !prefer_server {
        Placement::Client
    } else {
        Placement::Server
    };
    tracing::debug!(
        nodes = nodes.len(),
        client = nodes.values().filter(|n| n.placement.is_client()).count(),
        page = ?page,
        "classified placement"
    );
    PlacementReport { nodes, page }
}

/// Split of a tree into a server part and client islands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandPartition {
    /// Topmost node of each client subtree, in rendering order.
    pub island_roots: Vec<String>,
    /// Every node rendered on the client (islands and their descendants).
    pub client_ids: Vec<String>,
    pub server_ids: Vec<String>,
}

/// Partition nodes into two disjoint groups. Anything under a CLIENT node
/// runs on the client too, so client groups are whole subtrees.
pub fn partition(tree: &ComponentTree<'_>, report: &PlacementReport) -> IslandPartition {
    let mut out = IslandPartition::default();
    let mut stack: Vec<(&str, bool)> = tree.roots().iter().rev().map(|id| (*id, false)).collect();
    let mut seen = std::collections::HashSet::new();

    while let Some((id, inside_client)) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(node) = tree.get(id) else {
            continue;
        };
        let is_client = report.placement_of(id) == Some(Placement::Client);
        if is_client && !inside_client {
            out.island_roots.push(id.to_string());
        }
        let client_side = inside_client || is_client;
        if client_side {
            out.client_ids.push(id.to_string());
        } else {
            out.server_ids.push(id.to_string());
        }
        for child in node.child_ids.iter().rev() {
            stack.push((child.as_str(), client_side));
        }
    }
    out
}

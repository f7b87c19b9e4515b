//! Import resolution for generated modules.
//!
//! Declarations are accumulated incrementally while the view is emitted and
//! merged per module specifier: named imports union, a second default or
//! namespace binding for the same module replaces the first (and the
//! replacement is recorded as an [`ImportConflict`]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const REACT_MODULE: &str = "react";
pub const NEXT_MODULE: &str = "next";
pub const NEXT_LINK_MODULE: &str = "next/link";
pub const NEXT_IMAGE_MODULE: &str = "next/image";
pub const NEXT_NAVIGATION_MODULE: &str = "next/navigation";
pub const NEXT_CACHE_MODULE: &str = "next/cache";

/// Output priority of an import. Lower tiers are printed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportTier {
    FrameworkCore = 0,
    FrameworkExtension = 1,
    ThirdParty = 2,
    Internal = 3,
    Relative = 4,
}

impl ImportTier {
    pub fn classify(module: &str) -> Self {
        if matches!(module, "react" | "react-dom" | "next") {
            ImportTier::FrameworkCore
        } else if module.starts_with("react/")
            || module.starts_with("react-dom/")
            || module.starts_with("next/")
        {
            ImportTier::FrameworkExtension
        } else if module.starts_with("@/") || module.starts_with("~/") {
            ImportTier::Internal
        } else if module == "."
            || module == ".."
            || module.starts_with("./")
            || module.starts_with("../")
            || module.starts_with('/')
        {
            ImportTier::Relative
        } else {
            ImportTier::ThirdParty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    Default,
    Named,
    Namespace,
    SideEffect,
}

/// A default or namespace binding that replaced an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConflict {
    pub module_specifier: String,
    pub kind: ImportKind,
    pub previous: String,
    pub replacement: String,
}

/// One merged import declaration for a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    pub module_specifier: String,
    pub default_import: Option<String>,
    pub namespace_import: Option<String>,
    pub named_imports: Vec<String>,
    pub type_imports: Vec<String>,
    pub tier: ImportTier,
}

impl ImportStatement {
    /// The dominant form of this statement.
    pub fn kind(&self) -> ImportKind {
        if self.namespace_import.is_some() {
            ImportKind::Namespace
        } else if self.default_import.is_some() {
            ImportKind::Default
        } else if !self.named_imports.is_empty() || !self.type_imports.is_empty() {
            ImportKind::Named
        } else {
            ImportKind::SideEffect
        }
    }

    /// Local names this statement binds.
    pub fn bindings(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.extend(self.default_import.iter().cloned());
        out.extend(self.namespace_import.iter().cloned());
        for name in self.named_imports.iter().chain(&self.type_imports) {
            out.push(local_name(name).to_string());
        }
        out
    }

    /// Source lines for this statement. Usually one; a namespace binding
    /// cannot share a clause with named specifiers, so that pair takes two.
    pub fn render(&self) -> Vec<String> {
        let module = quote(&self.module_specifier);
        let named_clause = self.named_clause();

        match (&self.default_import, &self.namespace_import) {
            (_, Some(namespace)) => {
                let head = match &self.default_import {
                    Some(default) => format!("import {}, * as {} from {};", default, namespace, module),
                    None => format!("import * as {} from {};", namespace, module),
                };
                let mut lines = vec![head];
                if let Some(clause) = named_clause {
                    lines.push(format!("import {} from {};", clause, module));
                }
                lines
            }
            (Some(default), None) => match named_clause {
                Some(clause) => vec![format!("import {}, {} from {};", default, clause, module)],
                None => vec![format!("import {} from {};", default, module)],
            },
            (None, None) => match named_clause {
                Some(clause) if self.named_imports.is_empty() => {
                    vec![format!("import type {} from {};", clause, module)]
                }
                Some(clause) => vec![format!("import {} from {};", clause, module)],
                None => vec![format!("import {};", module)],
            },
        }
    }

    fn named_clause(&self) -> Option<String> {
        if self.named_imports.is_empty() && self.type_imports.is_empty() {
            return None;
        }
        let only_types = self.named_imports.is_empty()
            && self.default_import.is_none()
            && self.namespace_import.is_none();
        let mut specifiers: Vec<String> = self.named_imports.clone();
        for name in &self.type_imports {
            if only_types {
                specifiers.push(name.clone());
            } else {
                specifiers.push(format!("type {}", name));
            }
        }
        Some(format!("{{ {} }}", specifiers.join(", ")))
    }
}

#[derive(Debug, Clone, Default)]
struct ModuleEntry {
    default_import: Option<String>,
    namespace_import: Option<String>,
    named: BTreeSet<String>,
    types: BTreeSet<String>,
}

impl ModuleEntry {
    fn is_empty(&self) -> bool {
        self.default_import.is_none()
            && self.namespace_import.is_none()
            && self.named.is_empty()
            && self.types.is_empty()
    }
}

/// Accumulates and deduplicates import declarations.
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    modules: BTreeMap<String, ModuleEntry>,
    conflicts: Vec<ImportConflict>,
}

impl ImportResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_default(&mut self, name: &str, module: &str) {
        let entry = self.modules.entry(module.to_string()).or_default();
        if let Some(previous) = entry.default_import.replace(name.to_string()) {
            if previous != name {
                record_conflict(&mut self.conflicts, module, ImportKind::Default, previous, name);
            }
        }
    }

    pub fn add_named<I, S>(&mut self, names: I, module: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.modules.entry(module.to_string()).or_default();
        for name in names {
            let name = normalize_specifier(name.as_ref());
            if !name.is_empty() {
                entry.named.insert(name);
            }
        }
    }

    /// Type-only named imports (`import type { ... }`).
    pub fn add_type<I, S>(&mut self, names: I, module: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.modules.entry(module.to_string()).or_default();
        for name in names {
            let name = normalize_specifier(name.as_ref());
            if !name.is_empty() {
                entry.types.insert(name);
            }
        }
    }

    pub fn add_namespace(&mut self, name: &str, module: &str) {
        let entry = self.modules.entry(module.to_string()).or_default();
        if let Some(previous) = entry.namespace_import.replace(name.to_string()) {
            if previous != name {
                record_conflict(&mut self.conflicts, module, ImportKind::Namespace, previous, name);
            }
        }
    }

    pub fn add_side_effect(&mut self, module: &str) {
        self.modules.entry(module.to_string()).or_default();
    }

    /// Framework-core bundle: hooks and helpers from `react`.
    pub fn add_react<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_named(names, REACT_MODULE);
    }

    /// Framework-navigation bundle: `next/navigation` hooks.
    pub fn add_navigation<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_named(names, NEXT_NAVIGATION_MODULE);
    }

    pub fn add_link(&mut self) {
        self.add_default("Link", NEXT_LINK_MODULE);
    }

    pub fn add_image(&mut self) {
        self.add_default("Image", NEXT_IMAGE_MODULE);
    }

    /// Forget everything declared for `module`.
    pub fn remove(&mut self, module: &str) -> bool {
        self.modules.remove(module).is_some()
    }

    pub fn clear(&mut self) {
        self.modules.clear();
        self.conflicts.clear();
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn has_named(&self, module: &str, name: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|entry| entry.named.contains(name))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn conflicts(&self) -> &[ImportConflict] {
        &self.conflicts
    }

    /// Fold another resolver's declarations into this one.
    pub fn merge(&mut self, other: &ImportResolver) {
        for (module, entry) in &other.modules {
            if let Some(default) = &entry.default_import {
                self.add_default(default, module);
            }
            if let Some(namespace) = &entry.namespace_import {
                self.add_namespace(namespace, module);
            }
            self.add_named(&entry.named, module);
            self.add_type(&entry.types, module);
            if entry.is_empty() {
                self.add_side_effect(module);
            }
        }
        self.conflicts.extend(other.conflicts.iter().cloned());
    }

    /// Merged statements ordered by tier, then module specifier.
    pub fn statements(&self) -> Vec<ImportStatement> {
        let mut statements: Vec<ImportStatement> = self
            .modules
            .iter()
            .map(|(module, entry)| ImportStatement {
                module_specifier: module.clone(),
                default_import: entry.default_import.clone(),
                namespace_import: entry.namespace_import.clone(),
                named_imports: entry.named.iter().cloned().collect(),
                type_imports: entry.types.iter().cloned().collect(),
                tier: ImportTier::classify(module),
            })
            .collect();
        statements.sort_by(|a, b| {
            a.tier
                .cmp(&b.tier)
                .then_with(|| a.module_specifier.cmp(&b.module_specifier))
        });
        statements
    }

    pub fn lines(&self) -> Vec<String> {
        self.statements().iter().flat_map(|s| s.render()).collect()
    }

    /// The import block, one statement per line.
    pub fn generate(&self) -> String {
        self.lines().join("\n")
    }

    /// Every local name bound by the current declarations.
    pub fn bindings(&self) -> BTreeSet<String> {
        self.statements()
            .iter()
            .flat_map(|s| s.bindings())
            .collect()
    }
}

fn record_conflict(
    conflicts: &mut Vec<ImportConflict>,
    module: &str,
    kind: ImportKind,
    previous: String,
    replacement: &str,
) {
    tracing::warn!(
        module,
        previous = %previous,
        replacement,
        "import binding replaced for module"
    );
    conflicts.push(ImportConflict {
        module_specifier: module.to_string(),
        kind,
        previous,
        replacement: replacement.to_string(),
    });
}

/// Collapse inner whitespace so `a  as   b` and `a as b` dedupe.
fn normalize_specifier(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `a as b` binds `b`.
fn local_name(specifier: &str) -> &str {
    specifier
        .rsplit_once(" as ")
        .map(|(_, local)| local)
        .unwrap_or(specifier)
        .trim()
}

fn quote(module: &str) -> String {
    serde_json::to_string(module).unwrap_or_else(|_| format!("\"{}\"", module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_named_imports_dedupe() {
        let mut imports = ImportResolver::new();
        imports.add_named(["useState"], "react");
        imports.add_named(["useState"], "react");
        assert_eq!(imports.generate(), "import { useState } from \"react\";");
    }

    #[test]
    fn test_named_imports_union_across_calls() {
        let mut imports = ImportResolver::new();
        imports.add_named(["useState"], "react");
        imports.add_named(["useEffect", "useState"], "react");
        let statements = imports.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].named_imports, vec!["useEffect", "useState"]);
    }

    #[test]
    fn test_tier_ordering() {
        let mut imports = ImportResolver::new();
        imports.add_default("Hero", "./Hero");
        imports.add_default("Button", "@/components/Button");
        imports.add_named(["z"], "zod");
        imports.add_link();
        imports.add_react(["useState"]);
        imports.add_named(["clsx"], "clsx");

        let order: Vec<String> = imports
            .statements()
            .into_iter()
            .map(|s| s.module_specifier)
            .collect();
        assert_eq!(
            order,
            vec!["react", "next/link", "clsx", "zod", "@/components/Button", "./Hero"]
        );
    }

    #[test]
    fn test_default_overwrite_records_conflict() {
        let mut imports = ImportResolver::new();
        imports.add_default("Foo", "./widget");
        imports.add_default("Bar", "./widget");
        assert_eq!(imports.generate(), "import Bar from \"./widget\";");
        assert_eq!(imports.conflicts().len(), 1);
        assert_eq!(imports.conflicts()[0].previous, "Foo");

        // Re-declaring the same binding is not a conflict.
        imports.add_default("Bar", "./widget");
        assert_eq!(imports.conflicts().len(), 1);
    }

    #[test]
    fn test_default_with_named_and_types() {
        let mut imports = ImportResolver::new();
        imports.add_default("React", "react");
        imports.add_named(["useState"], "react");
        imports.add_type(["ReactNode"], "react");
        assert_eq!(
            imports.generate(),
            "import React, { useState, type ReactNode } from \"react\";"
        );
    }

    #[test]
    fn test_type_only_import() {
        let mut imports = ImportResolver::new();
        imports.add_type(["Metadata"], "next");
        assert_eq!(imports.generate(), "import type { Metadata } from \"next\";");
    }

    #[test]
    fn test_namespace_with_named_splits() {
        let mut imports = ImportResolver::new();
        imports.add_namespace("icons", "lucide-react");
        imports.add_named(["Menu"], "lucide-react");
        assert_eq!(
            imports.lines(),
            vec![
                "import * as icons from \"lucide-react\";".to_string(),
                "import { Menu } from \"lucide-react\";".to_string(),
            ]
        );
        assert_eq!(imports.statements().len(), 1);
    }

    #[test]
    fn test_side_effect_and_remove() {
        let mut imports = ImportResolver::new();
        imports.add_side_effect("./globals.css");
        imports.add_react(["useEffect"]);
        assert_eq!(
            imports.generate(),
            "import { useEffect } from \"react\";\nimport \"./globals.css\";"
        );
        assert!(imports.remove("./globals.css"));
        assert!(!imports.remove("./globals.css"));
        imports.clear();
        assert!(imports.is_empty());
    }

    #[test]
    fn test_bindings_and_merge() {
        let mut a = ImportResolver::new();
        a.add_link();
        let mut b = ImportResolver::new();
        b.add_named(["useRouter as router"], NEXT_NAVIGATION_MODULE);
        b.add_side_effect("./styles.css");
        a.merge(&b);
        let bindings = a.bindings();
        assert!(bindings.contains("Link"));
        assert!(bindings.contains("router"));
        assert!(a.contains("./styles.css"));
    }

    proptest! {
        #[test]
        fn prop_repeated_named_imports_render_once(
            names in prop::collection::vec("[a-z][a-zA-Z]{0,8}", 1..6),
            repeats in 1usize..4,
        ) {
            let mut imports = ImportResolver::new();
            for _ in 0..repeats {
                imports.add_named(&names, "some-lib");
            }
            let output = imports.generate();
            prop_assert_eq!(output.lines().count(), 1);
            for name in &names {
                let needle = format!(" {}", name);
                let hits = output.matches(&format!("{},", needle)).count()
                    + output.matches(&format!("{} }}", needle)).count();
                prop_assert_eq!(hits, 1);
            }
        }
    }
}

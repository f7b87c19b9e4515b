//! Post-emission consistency check.
//!
//! Parses an emitted module and reports what would stop it compiling:
//! syntax errors, names bound twice at module scope, and component tags
//! that are neither imported nor declared.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPattern, Declaration, ExportDefaultDeclarationKind, ImportDeclarationSpecifier,
    JSXElementName, JSXMemberExpression, JSXMemberExpressionObject, JSXOpeningElement, Statement,
};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::format::source_type_for;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IntegrityIssue {
    Syntax { message: String },
    DuplicateBinding { name: String },
    MissingImport { name: String },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::Syntax { message } => write!(f, "syntax error: {}", message),
            IntegrityIssue::DuplicateBinding { name } => {
                write!(f, "`{}` is bound more than once at module scope", name)
            }
            IntegrityIssue::MissingImport { name } => {
                write!(f, "<{}> is used but never imported or declared", name)
            }
        }
    }
}

/// JSX tag roots that resolve to identifiers (`<Link>`, `<icons.Menu>`).
#[derive(Default)]
struct TagCollector {
    tags: BTreeSet<String>,
}

impl<'a> Visit<'a> for TagCollector {
    fn visit_jsx_opening_element(&mut self, element: &JSXOpeningElement<'a>) {
        match &element.name {
            JSXElementName::IdentifierReference(id) => {
                self.tags.insert(id.name.to_string());
            }
            JSXElementName::MemberExpression(member) => {
                if let Some(root) = member_root(member) {
                    self.tags.insert(root);
                }
            }
            _ => {}
        }
        oxc_ast_visit::walk::walk_jsx_opening_element(self, element);
    }
}

fn member_root(member: &JSXMemberExpression<'_>) -> Option<String> {
    match &member.object {
        JSXMemberExpressionObject::IdentifierReference(id) => Some(id.name.to_string()),
        JSXMemberExpressionObject::MemberExpression(inner) => member_root(inner),
        _ => None,
    }
}

fn pattern_names(pattern: &BindingPattern<'_>, out: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => out.push(id.name.to_string()),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                pattern_names(&prop.value, out);
            }
            if let Some(rest) = &obj.rest {
                pattern_names(&rest.argument, out);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for pattern in arr.elements.iter().flatten() {
                pattern_names(pattern, out);
            }
            if let Some(rest) = &arr.rest {
                pattern_names(&rest.argument, out);
            }
        }
        _ => {}
    }
}

fn declaration_names(declaration: &Declaration<'_>, out: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(decl) => {
            for declarator in &decl.declarations {
                pattern_names(&declarator.id, out);
            }
        }
        Declaration::FunctionDeclaration(func) => {
            out.extend(func.id.as_ref().map(|id| id.name.to_string()));
        }
        Declaration::ClassDeclaration(class) => {
            out.extend(class.id.as_ref().map(|id| id.name.to_string()));
        }
        _ => {}
    }
}

/// Check one emitted module. Non-script paths yield no issues.
pub fn check_module(source: &str, path: &str) -> Vec<IntegrityIssue> {
    let Some(source_type) = source_type_for(path) else {
        return vec![];
    };
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return ret
            .errors
            .iter()
            .map(|e| IntegrityIssue::Syntax {
                message: e.to_string(),
            })
            .collect();
    }

    let mut bound: Vec<String> = Vec::new();
    for statement in &ret.program.body {
        match statement {
            Statement::ImportDeclaration(decl) => {
                for specifier in decl.specifiers.iter().flatten() {
                    let local = match specifier {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local,
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local,
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local,
                    };
                    bound.push(local.name.to_string());
                }
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(declaration) = &decl.declaration {
                    declaration_names(declaration, &mut bound);
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                if let ExportDefaultDeclarationKind::FunctionDeclaration(func) = &decl.declaration {
                    bound.extend(func.id.as_ref().map(|id| id.name.to_string()));
                }
            }
            other => {
                if let Some(declaration) = other.as_declaration() {
                    declaration_names(declaration, &mut bound);
                }
            }
        }
    }

    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    for name in &bound {
        if !seen.insert(name.as_str()) {
            issues.push(IntegrityIssue::DuplicateBinding { name: name.clone() });
        }
    }

    let mut collector = TagCollector::default();
    collector.visit_program(&ret.program);
    for tag in collector.tags {
        if !seen.contains(tag.as_str()) {
            issues.push(IntegrityIssue::MissingImport { name: tag });
        }
    }

    if !issues.is_empty() {
        tracing::warn!(path, count = issues.len(), "emitted module failed consistency check");
    }
    issues
}

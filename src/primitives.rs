//! Closed component-type table.
//!
//! Each editor component type resolves to exactly one output primitive,
//! which fixes the emitted tag, any framework import it needs, and whether
//! it is inherently interactive (forces client placement).

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::imports::ImportResolver;

/// Framework import a primitive needs in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveImport {
    /// `import Link from "next/link"`
    Link,
    /// `import Image from "next/image"`
    Image,
}

impl PrimitiveImport {
    pub fn register(self, imports: &mut ImportResolver) {
        match self {
            PrimitiveImport::Link => imports.add_link(),
            PrimitiveImport::Image => imports.add_image(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    pub tag: &'static str,
    pub import: Option<PrimitiveImport>,
    /// Needs browser event handling regardless of its properties.
    pub interactive: bool,
    /// Never has children or text (`<input />`, `<hr />`).
    pub void: bool,
    /// Attributes emitted unless the node declares them itself.
    pub implicit_attributes: &'static [(&'static str, &'static str)],
}

impl Primitive {
    const fn element(tag: &'static str) -> Self {
        Self {
            tag,
            import: None,
            interactive: false,
            void: false,
            implicit_attributes: &[],
        }
    }

    const fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    const fn void(mut self) -> Self {
        self.void = true;
        self
    }

    const fn with_import(mut self, import: PrimitiveImport) -> Self {
        self.import = Some(import);
        self
    }

    const fn with_attributes(mut self, attributes: &'static [(&'static str, &'static str)]) -> Self {
        self.implicit_attributes = attributes;
        self
    }
}

/// Used for any type missing from the table.
pub const FALLBACK_PRIMITIVE: Primitive = Primitive::element("div");

lazy_static! {
    static ref PRIMITIVES: HashMap<&'static str, Primitive> = {
        let mut m = HashMap::new();
        // layout
        m.insert("Container", Primitive::element("div"));
        m.insert("Box", Primitive::element("div"));
        m.insert("Flex", Primitive::element("div"));
        m.insert("Grid", Primitive::element("div"));
        m.insert("Row", Primitive::element("div"));
        m.insert("Column", Primitive::element("div"));
        m.insert("Card", Primitive::element("article"));
        m.insert("Section", Primitive::element("section"));
        m.insert("Header", Primitive::element("header"));
        m.insert("Footer", Primitive::element("footer"));
        m.insert("Nav", Primitive::element("nav"));
        m.insert("Main", Primitive::element("main"));
        m.insert("Article", Primitive::element("article"));
        m.insert("Aside", Primitive::element("aside"));
        m.insert("List", Primitive::element("ul"));
        m.insert("OrderedList", Primitive::element("ol"));
        m.insert("ListItem", Primitive::element("li"));
        m.insert("Table", Primitive::element("table"));
        m.insert("Divider", Primitive::element("hr").void());
        // typography
        m.insert("Title", Primitive::element("h1"));
        m.insert("Heading", Primitive::element("h2"));
        m.insert("Subheading", Primitive::element("h3"));
        m.insert("Text", Primitive::element("p"));
        m.insert("Paragraph", Primitive::element("p"));
        m.insert("Span", Primitive::element("span"));
        m.insert("Label", Primitive::element("label"));
        m.insert("Icon", Primitive::element("span"));
        // media
        m.insert(
            "Image",
            Primitive::element("Image")
                .with_import(PrimitiveImport::Image)
                .void()
                .with_attributes(&[("alt", "")]),
        );
        m.insert("Video", Primitive::element("video"));
        // navigation
        m.insert(
            "Link",
            Primitive::element("Link")
                .with_import(PrimitiveImport::Link)
                .with_attributes(&[("href", "#")]),
        );
        // form controls
        m.insert("Form", Primitive::element("form"));
        m.insert(
            "Button",
            Primitive::element("button")
                .interactive()
                .with_attributes(&[("type", "button")]),
        );
        m.insert("Input", Primitive::element("input").interactive().void());
        m.insert("TextInput", Primitive::element("input").interactive().void());
        m.insert("TextArea", Primitive::element("textarea").interactive().void());
        m.insert("Select", Primitive::element("select").interactive());
        m.insert(
            "Checkbox",
            Primitive::element("input")
                .interactive()
                .void()
                .with_attributes(&[("type", "checkbox")]),
        );
        m.insert(
            "Radio",
            Primitive::element("input")
                .interactive()
                .void()
                .with_attributes(&[("type", "radio")]),
        );
        m
    };
}

/// Look up a component type. `None` for types outside the table.
pub fn lookup(component_type: &str) -> Option<&'static Primitive> {
    PRIMITIVES.get(component_type)
}

/// Resolve a component type, degrading unknown types to a `div`.
pub fn resolve(component_type: &str) -> (&'static Primitive, bool) {
    match lookup(component_type) {
        Some(primitive) => (primitive, true),
        None => (&FALLBACK_PRIMITIVE, false),
    }
}

/// Every component type the table knows about, sorted.
pub fn known_types() -> Vec<&'static str> {
    let mut types: Vec<&'static str> = PRIMITIVES.keys().copied().collect();
    types.sort_unstable();
    types
}

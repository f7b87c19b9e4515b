//! Template strategies.
//!
//! Pure functions from already-emitted pieces (import lines, JSX body,
//! handler stubs) to complete module text. Nothing here walks the IR.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::imports::{ImportResolver, NEXT_CACHE_MODULE};
use crate::jsx_emitter::INDENT;
use crate::placement::Placement;
use crate::validate::{DataFetching, MetadataDescriptor, PageConfig};

lazy_static! {
    static ref JS_IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
    static ref WORD_RE: Regex = Regex::new(r"[A-Za-z0-9]+").unwrap();
}

/// Zod is the schema library action templates validate with.
pub const ZOD_MODULE: &str = "zod";

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Export {
    Default,
    Named,
}

/// A component function returning JSX.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub export: Export,
    pub is_async: bool,
    pub params: String,
    /// Statements before the `return`, one entry per statement.
    pub setup: Vec<String>,
    /// JSX expression already indented for two levels.
    pub body: String,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            export: Export::Default,
            is_async: false,
            params: String::new(),
            setup: vec![],
            body: body.into(),
        }
    }

    pub fn render(&self) -> String {
        let export = match self.export {
            Export::Default => "export default ",
            Export::Named => "export ",
        };
        let asyncness = if self.is_async { "async " } else { "" };
        let mut out = format!("{export}{asyncness}function {}({}) {{\n", self.name, self.params);
        if !self.setup.is_empty() {
            for statement in &self.setup {
                out.push_str(&indent_block(statement, 1));
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(&format!("{INDENT}return (\n{}\n{INDENT});\n}}", self.body));
        out
    }
}

/// A whole source file: directive, import block, then top-level blocks.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub directive: Option<&'static str>,
    pub imports: Vec<String>,
    pub blocks: Vec<String>,
}

impl Module {
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(self.directive.map(str::to_string));
        if !self.imports.is_empty() {
            parts.push(self.imports.join("\n"));
        }
        parts.extend(self.blocks.iter().cloned());
        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }
}

/// Everything a page strategy needs, already emitted.
#[derive(Debug, Clone)]
pub struct PageTemplateInput<'a> {
    pub config: &'a PageConfig,
    pub component_name: String,
    pub body: String,
    pub imports: Vec<String>,
    pub handler_stubs: Vec<String>,
    pub placement: Placement,
    pub typescript: bool,
}

impl PageTemplateInput<'_> {
    fn function(&self) -> FunctionDecl {
        let mut function = FunctionDecl::new(self.component_name.clone(), self.body.clone());
        function.setup = self.handler_stubs.clone();
        function
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAGE STRATEGIES
// ═══════════════════════════════════════════════════════════════════════════════

pub fn plain_page(input: &PageTemplateInput<'_>) -> String {
    Module {
        directive: input.placement.directive(),
        imports: input.imports.clone(),
        blocks: vec![input.function().render()],
    }
    .render()
}

/// Server page with a `metadata` export. Callers move client bodies to a
/// companion first; this module never carries a client directive.
pub fn metadata_page(input: &PageTemplateInput<'_>, metadata: &MetadataDescriptor) -> String {
    Module {
        directive: None,
        imports: input.imports.clone(),
        blocks: vec![
            static_metadata(metadata, input.config, input.typescript),
            input.function().render(),
        ],
    }
    .render()
}

/// Server page that fetches its data before rendering.
pub fn data_fetching_page(input: &PageTemplateInput<'_>, fetching: &DataFetching) -> String {
    let variable = data_variable(fetching);
    let mut blocks = Vec::new();
    if let Some(metadata) = &input.config.metadata {
        blocks.push(static_metadata(metadata, input.config, input.typescript));
    }
    blocks.push(fetch_function(fetching, input.typescript));

    let mut function = input.function();
    function.is_async = true;
    function.setup.insert(0, format!("const {} = await getData();", variable));
    blocks.push(function.render());

    Module {
        directive: None,
        imports: input.imports.clone(),
        blocks,
    }
    .render()
}

fn fetch_function(fetching: &DataFetching, typescript: bool) -> String {
    let mut options = Vec::new();
    if let Some(cache) = fetching.cache {
        options.push(format!("cache: \"{}\"", cache.as_str()));
    }
    if let Some(seconds) = fetching.revalidate {
        options.push(format!("next: {{ revalidate: {} }}", seconds));
    }
    let options = if options.is_empty() {
        String::new()
    } else {
        format!(", {{ {} }}", options.join(", "))
    };
    let return_type = if typescript { ": Promise<unknown>" } else { "" };
    [
        format!("async function getData(){} {{", return_type),
        format!("{INDENT}const res = await fetch({}{});", js_string(&fetching.source), options),
        format!("{INDENT}if (!res.ok) {{"),
        format!("{INDENT}{INDENT}throw new Error(\"Failed to fetch data\");"),
        format!("{INDENT}}}"),
        format!("{INDENT}return res.json();"),
        "}".to_string(),
    ]
    .join("\n")
}

pub fn data_variable(fetching: &DataFetching) -> &str {
    fetching
        .variable
        .as_deref()
        .filter(|v| is_identifier(v))
        .unwrap_or("data")
}

/// Client module holding a page body lifted out of a server page.
pub fn client_companion(
    name: &str,
    imports: Vec<String>,
    handler_stubs: Vec<String>,
    body: String,
    data_prop: Option<&str>,
    typescript: bool,
) -> String {
    let mut function = FunctionDecl::new(name, body);
    function.setup = handler_stubs;
    if let Some(prop) = data_prop {
        function.params = if typescript {
            format!("{{ {prop} }}: {{ {prop}: unknown }}")
        } else {
            format!("{{ {prop} }}")
        };
    }
    Module {
        directive: Placement::Client.directive(),
        imports,
        blocks: vec![function.render()],
    }
    .render()
}

/// One client module with a named export per island.
pub fn islands_module(imports: Vec<String>, islands: Vec<FunctionDecl>) -> String {
    Module {
        directive: Placement::Client.directive(),
        imports,
        blocks: islands
            .into_iter()
            .map(|mut island| {
                island.export = Export::Named;
                island.render()
            })
            .collect(),
    }
    .render()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DYNAMIC ROUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    String,
    Number,
    CatchAll,
    OptionalCatchAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParam {
    pub name: String,
    pub kind: ParamKind,
}

impl RouteParam {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Directory segment: `[id]`, `[...slug]`, `[[...slug]]`.
    pub fn segment(&self) -> String {
        match self.kind {
            ParamKind::String | ParamKind::Number => format!("[{}]", self.name),
            ParamKind::CatchAll => format!("[...{}]", self.name),
            ParamKind::OptionalCatchAll => format!("[[...{}]]", self.name),
        }
    }

    fn field_type(&self) -> String {
        match self.kind {
            ParamKind::String | ParamKind::Number => format!("{}: string", self.name),
            ParamKind::CatchAll => format!("{}: string[]", self.name),
            ParamKind::OptionalCatchAll => format!("{}?: string[]", self.name),
        }
    }

    fn raw_name(&self) -> String {
        match self.kind {
            ParamKind::Number => format!("{}Param", self.name),
            _ => self.name.clone(),
        }
    }
}

fn params_type(params: &[RouteParam]) -> String {
    let fields: Vec<String> = params.iter().map(RouteParam::field_type).collect();
    format!("{{ {} }}", fields.join("; "))
}

/// Page under a parameterised route segment.
///
/// The server variant awaits `params` and exports `generateStaticParams`;
/// the client variant reads them with `useParams`.
pub fn dynamic_page(input: &PageTemplateInput<'_>, params: &[RouteParam]) -> String {
    let mut function = input.function();
    let mut conversions = Vec::new();
    for param in params.iter().filter(|p| p.kind == ParamKind::Number) {
        conversions.push(format!("const {} = Number({});", param.name, param.raw_name()));
    }

    let mut blocks = Vec::new();
    let directive;
    if input.placement.is_client() {
        directive = Placement::Client.directive();
        let hook = if input.typescript {
            format!("useParams<{}>()", params_type(params))
        } else {
            "useParams()".to_string()
        };
        let mut setup = vec![format!("const params = {};", hook)];
        for param in params {
            setup.push(format!("const {} = params.{};", param.raw_name(), param.name));
        }
        setup.extend(conversions);
        setup.append(&mut function.setup);
        function.setup = setup;
    } else {
        directive = None;
        if input.typescript {
            blocks.push(format!(
                "type PageProps = {{\n{INDENT}params: Promise<{}>;\n}};",
                params_type(params)
            ));
        }
        blocks.push(format!(
            "export async function generateStaticParams() {{\n{INDENT}return [];\n}}"
        ));
        let destructured: Vec<String> = params
            .iter()
            .map(|p| match p.kind {
                ParamKind::Number => format!("{}: {}", p.name, p.raw_name()),
                _ => p.name.clone(),
            })
            .collect();
        let mut setup = vec![format!("const {{ {} }} = await params;", destructured.join(", "))];
        setup.extend(conversions);
        setup.append(&mut function.setup);
        function.setup = setup;
        function.is_async = true;
        function.params = if input.typescript {
            "{ params }: PageProps".to_string()
        } else {
            "{ params }".to_string()
        };
    }
    blocks.push(function.render());

    Module {
        directive,
        imports: input.imports.clone(),
        blocks,
    }
    .render()
}

// ═══════════════════════════════════════════════════════════════════════════════
// METADATA
// ═══════════════════════════════════════════════════════════════════════════════

/// The metadata object, falling back to the page title/description.
pub fn metadata_object(metadata: &MetadataDescriptor, title: &str, description: &str) -> Value {
    let mut object = Map::new();
    let title = metadata.title.as_deref().unwrap_or(title);
    object.insert("title".into(), json!(title));
    let description = metadata.description.as_deref().unwrap_or(description);
    if !description.is_empty() {
        object.insert("description".into(), json!(description));
    }
    if !metadata.keywords.is_empty() {
        object.insert("keywords".into(), json!(metadata.keywords));
    }
    if let Some(og) = &metadata.open_graph {
        let mut graph = Map::new();
        for (key, value) in [
            ("title", &og.title),
            ("description", &og.description),
            ("url", &og.url),
            ("type", &og.og_type),
        ] {
            if let Some(value) = value {
                graph.insert(key.into(), json!(value));
            }
        }
        if let Some(image) = &og.image {
            graph.insert("images".into(), json!([image]));
        }
        object.insert("openGraph".into(), Value::Object(graph));
    }
    if let Some(robots) = &metadata.robots {
        object.insert("robots".into(), json!(robots));
    }
    if let Some(canonical) = &metadata.canonical {
        object.insert("alternates".into(), json!({ "canonical": canonical }));
    }
    Value::Object(object)
}

pub fn static_metadata(metadata: &MetadataDescriptor, config: &PageConfig, typescript: bool) -> String {
    let object = metadata_object(metadata, &config.title, &config.description);
    let annotation = if typescript { ": Metadata" } else { "" };
    format!("export const metadata{} = {};", annotation, js_literal(&object, 0))
}

/// Per-request variant: `generateMetadata()` resolving the same object.
pub fn dynamic_metadata(metadata: &MetadataDescriptor, config: &PageConfig, typescript: bool) -> String {
    let object = metadata_object(metadata, &config.title, &config.description);
    let annotation = if typescript { ": Promise<Metadata>" } else { "" };
    format!(
        "export async function generateMetadata(){} {{\n{INDENT}return {};\n}}",
        annotation,
        js_literal(&object, 1)
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAFFOLDS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn loading_file(tailwind: bool) -> String {
    let container = if tailwind {
        "className=\"flex min-h-[50vh] items-center justify-center\""
    } else {
        "style={{ display: \"flex\", minHeight: \"50vh\", alignItems: \"center\", justifyContent: \"center\" }}"
    };
    let body = format!(
        "{i}{i}<div\n{i}{i}{i}{container}\n{i}{i}{i}role=\"status\"\n{i}{i}{i}aria-live=\"polite\"\n{i}{i}>\n{i}{i}{i}<p>Loading...</p>\n{i}{i}</div>",
        i = INDENT
    );
    Module {
        blocks: vec![FunctionDecl::new("Loading", body).render()],
        ..Module::default()
    }
    .render()
}

pub fn error_file(typescript: bool) -> String {
    let mut imports = ImportResolver::new();
    imports.add_react(["useEffect"]);
    let mut function = FunctionDecl::new(
        "PageError",
        format!(
            "{i}{i}<div role=\"alert\">\n{i}{i}{i}<h2>Something went wrong</h2>\n{i}{i}{i}<button type=\"button\" onClick={{() => reset()}}>\n{i}{i}{i}{i}Try again\n{i}{i}{i}</button>\n{i}{i}</div>",
            i = INDENT
        ),
    );
    function.params = if typescript {
        format!("{{\n{INDENT}error,\n{INDENT}reset,\n}}: {{\n{INDENT}error: Error & {{ digest?: string }};\n{INDENT}reset: () => void;\n}}")
    } else {
        "{ error, reset }".to_string()
    };
    function.setup = vec![format!("useEffect(() => {{\n{INDENT}console.error(error);\n}}, [error]);")];
    Module {
        directive: Placement::Client.directive(),
        imports: imports.lines(),
        blocks: vec![function.render()],
    }
    .render()
}

pub fn root_layout(title: &str, description: &str, typescript: bool) -> String {
    let mut imports = ImportResolver::new();
    if typescript {
        imports.add_type(["Metadata"], "next");
        imports.add_type(["ReactNode"], "react");
    }
    imports.add_side_effect("./globals.css");
    let metadata = MetadataDescriptor {
        title: Some(title.to_string()),
        description: Some(description.to_string()).filter(|d| !d.is_empty()),
        ..MetadataDescriptor::default()
    };
    let annotation = if typescript { ": Metadata" } else { "" };
    let metadata_block = format!(
        "export const metadata{} = {};",
        annotation,
        js_literal(&metadata_object(&metadata, title, description), 0)
    );
    let mut function = FunctionDecl::new(
        "RootLayout",
        format!(
            "{i}{i}<html lang=\"en\">\n{i}{i}{i}<body>{{children}}</body>\n{i}{i}</html>",
            i = INDENT
        ),
    );
    function.params = if typescript {
        "{ children }: { children: ReactNode }".to_string()
    } else {
        "{ children }".to_string()
    };
    Module {
        directive: None,
        imports: imports.lines(),
        blocks: vec![metadata_block, function.render()],
    }
    .render()
}

pub fn globals_css(tailwind: bool) -> String {
    if tailwind {
        "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n".to_string()
    } else {
        "*,\n*::before,\n*::after {\n  box-sizing: border-box;\n}\n\nbody {\n  margin: 0;\n}\n".to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Email,
    Unknown,
}

impl FieldType {
    fn ts_type(self) -> &'static str {
        match self {
            FieldType::String | FieldType::Email => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Unknown => "unknown",
        }
    }

    fn zod(self, coerce: bool) -> &'static str {
        match (self, coerce) {
            (FieldType::String, _) => "z.string()",
            (FieldType::Email, _) => "z.string().email()",
            (FieldType::Number, false) => "z.number()",
            (FieldType::Number, true) => "z.coerce.number()",
            (FieldType::Boolean, false) => "z.boolean()",
            (FieldType::Boolean, true) => "z.coerce.boolean()",
            (FieldType::Unknown, _) => "z.unknown()",
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub required: bool,
}

impl ActionField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }
}

fn schema_block(action: &str, fields: &[ActionField], coerce: bool) -> String {
    let mut lines = vec![format!("const {}Schema = z.object({{", action)];
    for field in fields {
        let mut rule = field.field_type.zod(coerce).to_string();
        if !field.required {
            rule.push_str(if coerce { ".nullish()" } else { ".optional()" });
        }
        lines.push(format!("{INDENT}{}: {},", object_key(&field.name), rule));
    }
    lines.push("});".to_string());
    lines.join("\n")
}

fn action_imports(validate: bool, revalidate: bool) -> Vec<String> {
    let mut imports = ImportResolver::new();
    if revalidate {
        imports.add_named(["revalidatePath"], NEXT_CACHE_MODULE);
    }
    if validate {
        imports.add_named(["z"], ZOD_MODULE);
    }
    imports.lines()
}

/// `"use server"` module exporting one async action.
pub fn server_action(
    name: &str,
    params: &[ActionField],
    body: &str,
    validate: bool,
    revalidate_path: Option<&str>,
    typescript: bool,
) -> String {
    let validate = validate && !params.is_empty();
    let mut blocks = Vec::new();
    if validate {
        blocks.push(schema_block(name, params, false));
    }

    let signature: Vec<String> = params
        .iter()
        .map(|p| {
            if typescript {
                let optional = if p.required { "" } else { "?" };
                format!("{}{}: {}", p.name, optional, p.field_type.ts_type())
            } else {
                p.name.clone()
            }
        })
        .collect();

    let mut statements = Vec::new();
    if validate {
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        statements.push(format!("const input = {}Schema.parse({{ {} }});", name, names.join(", ")));
    }
    let body = body.trim();
    if !body.is_empty() {
        statements.push(body.to_string());
    }
    if let Some(path) = revalidate_path {
        statements.push(format!("revalidatePath({});", js_string(path)));
    }
    if body.is_empty() {
        statements.push(if validate {
            "return { success: true, data: input };".to_string()
        } else {
            "return { success: true };".to_string()
        });
    }

    blocks.push(format!(
        "export async function {}({}) {{\n{}\n}}",
        name,
        signature.join(", "),
        indent_block(&statements.join("\n"), 1)
    ));

    Module {
        directive: Some("\"use server\";"),
        imports: action_imports(validate, revalidate_path.is_some()),
        blocks,
    }
    .render()
}

/// `"use server"` module exporting an action that takes `FormData`.
pub fn form_action(
    name: &str,
    fields: &[ActionField],
    body: &str,
    revalidate_path: Option<&str>,
    typescript: bool,
) -> String {
    let validate = !fields.is_empty();
    let mut blocks = Vec::new();
    let mut statements = Vec::new();

    if validate {
        blocks.push(schema_block(name, fields, true));
        let mut parse = vec![format!("const parsed = {}Schema.safeParse({{", name)];
        for field in fields {
            parse.push(format!(
                "{INDENT}{}: formData.get({}),",
                object_key(&field.name),
                js_string(&field.name)
            ));
        }
        parse.push("});".to_string());
        statements.push(parse.join("\n"));
        statements.push(format!(
            "if (!parsed.success) {{\n{INDENT}return {{ success: false, errors: parsed.error.flatten().fieldErrors }};\n}}"
        ));
        statements.push("const data = parsed.data;".to_string());
    } else {
        statements.push("const data = Object.fromEntries(formData);".to_string());
    }
    let body = body.trim();
    if !body.is_empty() {
        statements.push(body.to_string());
    }
    if let Some(path) = revalidate_path {
        statements.push(format!("revalidatePath({});", js_string(path)));
    }
    statements.push("return { success: true, errors: {}, data };".to_string());

    let param = if typescript { "formData: FormData" } else { "formData" };
    blocks.push(format!(
        "export async function {}({}) {{\n{}\n}}",
        name,
        param,
        indent_block(&statements.join("\n"), 1)
    ));

    Module {
        directive: Some("\"use server\";"),
        imports: action_imports(validate, revalidate_path.is_some()),
        blocks,
    }
    .render()
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// `"my landing page"` -> `MyLandingPage`.
pub fn pascal_case(text: &str) -> String {
    WORD_RE
        .find_iter(text)
        .map(|word| {
            let mut chars = word.as_str().chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Component name for a page title: `About us` -> `AboutUsPage`.
pub fn page_component_name(title: &str) -> String {
    let base = pascal_case(title);
    if base.is_empty() {
        return "GeneratedPage".to_string();
    }
    let base = if base.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Page{}", base)
    } else {
        base
    };
    if base.ends_with("Page") {
        base
    } else {
        format!("{}Page", base)
    }
}

/// Words that cannot name a binding in module code.
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// A name usable as a binding: identifier syntax and not a reserved word.
pub fn is_identifier(name: &str) -> bool {
    JS_IDENT_RE.is_match(name) && !is_reserved_word(name)
}

pub(crate) fn object_key(key: &str) -> String {
    if JS_IDENT_RE.is_match(key) {
        key.to_string()
    } else {
        js_string(key)
    }
}

pub fn js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// JSON value as a JS literal with bare identifier keys.
pub fn js_literal(value: &Value, depth: usize) -> String {
    let pad = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);
    match value {
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{inner}{}: {},", object_key(k), js_literal(v, depth + 1)))
                .collect();
            format!("{{\n{}\n{pad}}}", entries.join("\n"))
        }
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => {
            let items: Vec<String> = items.iter().map(|v| js_literal(v, depth)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Array(items) => {
            let entries: Vec<String> = items
                .iter()
                .map(|v| format!("{inner}{},", js_literal(v, depth + 1)))
                .collect();
            format!("[\n{}\n{pad}]", entries.join("\n"))
        }
        other => other.to_string(),
    }
}

fn indent_block(text: &str, depth: usize) -> String {
    let pad = INDENT.repeat(depth);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(config: &PageConfig, placement: Placement) -> PageTemplateInput<'_> {
        PageTemplateInput {
            config,
            component_name: page_component_name(&config.title),
            body: "    <div />".to_string(),
            imports: vec![],
            handler_stubs: vec![],
            placement,
            typescript: true,
        }
    }

    #[test]
    fn test_page_component_name() {
        assert_eq!(page_component_name("about us"), "AboutUsPage");
        assert_eq!(page_component_name("Landing Page"), "LandingPage");
        assert_eq!(page_component_name("404 not found"), "Page404NotFoundPage");
        assert_eq!(page_component_name("!!"), "GeneratedPage");
    }

    #[test]
    fn test_plain_page_shape() {
        let config = PageConfig::new("Home", "/");
        let out = plain_page(&input(&config, Placement::Server));
        assert_eq!(
            out,
            "export default function HomePage() {\n  return (\n    <div />\n  );\n}\n"
        );
        let out = plain_page(&input(&config, Placement::Client));
        assert!(out.starts_with("\"use client\";\n\nexport default function HomePage()"));
    }

    #[test]
    fn test_metadata_page_exports_metadata() {
        let mut config = PageConfig::new("Home", "/");
        config.description = "Welcome".into();
        let metadata = MetadataDescriptor {
            keywords: vec!["a".into(), "b".into()],
            canonical: Some("https://example.com".into()),
            ..MetadataDescriptor::default()
        };
        let out = metadata_page(&input(&config, Placement::Server), &metadata);
        assert!(out.contains(
            "export const metadata: Metadata = {\n  title: \"Home\",\n  description: \"Welcome\",\n  keywords: [\"a\", \"b\"],\n  alternates: {\n    canonical: \"https://example.com\",\n  },\n};"
        ));
        assert!(!out.contains("use client"));
    }

    #[test]
    fn test_data_fetching_page() {
        let config = PageConfig::new("Posts", "/posts");
        let fetching = DataFetching {
            source: "https://api.example.com/posts".into(),
            revalidate: Some(60),
            variable: Some("posts".into()),
            cache: None,
        };
        let out = data_fetching_page(&input(&config, Placement::Server), &fetching);
        assert!(out.contains("async function getData(): Promise<unknown> {"));
        assert!(out.contains(
            "const res = await fetch(\"https://api.example.com/posts\", { next: { revalidate: 60 } });"
        ));
        assert!(out.contains("export default async function PostsPage() {\n  const posts = await getData();"));
    }

    #[test]
    fn test_dynamic_page_variants() {
        let config = PageConfig::new("Product", "/products");
        let params = vec![
            RouteParam::new("id", ParamKind::Number),
            RouteParam::new("rest", ParamKind::OptionalCatchAll),
        ];
        let server = dynamic_page(&input(&config, Placement::Server), &params);
        assert!(server.contains("params: Promise<{ id: string; rest?: string[] }>;"));
        assert!(server.contains("export async function generateStaticParams()"));
        assert!(server.contains("const { id: idParam, rest } = await params;"));
        assert!(server.contains("const id = Number(idParam);"));

        let client = dynamic_page(&input(&config, Placement::Client), &params);
        assert!(client.starts_with("\"use client\";"));
        assert!(client.contains("const params = useParams<{ id: string; rest?: string[] }>();"));
        assert!(!client.contains("generateStaticParams"));
    }

    #[test]
    fn test_route_segments() {
        assert_eq!(RouteParam::new("id", ParamKind::String).segment(), "[id]");
        assert_eq!(RouteParam::new("slug", ParamKind::CatchAll).segment(), "[...slug]");
        assert_eq!(
            RouteParam::new("slug", ParamKind::OptionalCatchAll).segment(),
            "[[...slug]]"
        );
    }

    #[test]
    fn test_server_action_with_schema() {
        let out = server_action(
            "createPost",
            &[
                ActionField::new("title", FieldType::String),
                ActionField::new("views", FieldType::Number),
            ],
            "",
            true,
            Some("/posts"),
            true,
        );
        assert!(out.starts_with(
            "\"use server\";\n\nimport { revalidatePath } from \"next/cache\";\nimport { z } from \"zod\";"
        ));
        assert!(out.contains("const createPostSchema = z.object({\n  title: z.string(),\n  views: z.number(),\n});"));
        assert!(out.contains("export async function createPost(title: string, views: number) {"));
        assert!(out.contains("revalidatePath(\"/posts\");"));
    }

    #[test]
    fn test_form_action_safe_parses() {
        let mut email = ActionField::new("email", FieldType::Email);
        email.required = false;
        let out = form_action("subscribe", &[email], "", None, false);
        assert!(out.contains("email: z.string().email().nullish(),"));
        assert!(out.contains("export async function subscribe(formData) {"));
        assert!(out.contains("const parsed = subscribeSchema.safeParse({\n    email: formData.get(\"email\"),\n  });"));
        assert!(out.contains("return { success: false, errors: parsed.error.flatten().fieldErrors };"));
        assert!(!out.contains("revalidatePath"));
    }

    #[test]
    fn test_error_and_loading_scaffolds() {
        let error = error_file(true);
        assert!(error.starts_with("\"use client\";\n\nimport { useEffect } from \"react\";"));
        assert!(error.contains("export default function PageError({"));
        assert!(error.contains("reset: () => void;"));
        let loading = loading_file(true);
        assert!(loading.contains("export default function Loading()"));
        assert!(loading.contains("<p>Loading...</p>"));
    }

    #[test]
    fn test_root_layout_imports() {
        let out = root_layout("Site", "", true);
        assert!(out.starts_with(
            "import type { Metadata } from \"next\";\nimport type { ReactNode } from \"react\";\nimport \"./globals.css\";"
        ));
        assert!(out.contains("{ children }: { children: ReactNode }"));

        let out = root_layout("Site", "", false);
        assert!(out.starts_with("import \"./globals.css\";\n\nexport const metadata = {"));
        assert!(out.contains("export default function RootLayout({ children }) {"));
    }

    #[test]
    fn test_reserved_words_are_not_bindings() {
        assert!(is_identifier("save"));
        assert!(is_identifier("$state"));
        assert!(!is_identifier("delete"));
        assert!(!is_identifier("class"));
        assert_eq!(object_key("class"), "class");

        let fetching = DataFetching {
            source: "/api/items".into(),
            revalidate: None,
            variable: Some("class".into()),
            cache: None,
        };
        assert_eq!(data_variable(&fetching), "data");
    }
}

//! Page orchestration tests.
//!
//! Cover the path from one `PageConfig` to its emitted files: validation
//! gating, placement, template strategy, companion extraction, client
//! islands and dynamic routes.

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use crate::format::IdentityFormatter;
    use crate::options::GenerationOptions;
    use crate::page::{page_directory, FileKind, GeneratedCode, PageGenerator, PageOutput};
    use crate::placement::Placement;
    use crate::templates::ParamKind;
    use crate::validate::{
        CacheStrategy, ComponentInstance, DataFetching, GenerateError, MetadataDescriptor, PageConfig,
        ERR_DANGLING_CHILD, ERR_MISSING_TITLE, ERR_NO_COMPONENTS, ERR_ROUTE_PARAM,
    };

    fn options() -> GenerationOptions {
        GenerationOptions::new()
            .with_prettier(false)
            .with_component_ids(false)
    }

    fn page(title: &str, path: &str, components: Vec<ComponentInstance>) -> PageConfig {
        let mut config = PageConfig::new(title, path);
        config.components = components;
        config
    }

    fn button_page() -> PageConfig {
        page(
            "Home",
            "/",
            vec![
                ComponentInstance::new("root", "Container").with_children(["btn"]),
                ComponentInstance::new("btn", "Button")
                    .with_parent("root")
                    .with_property("text", json!("Click"))
                    .with_property("onClick", json!("handleClick")),
            ],
        )
    }

    fn static_page() -> PageConfig {
        page(
            "About us",
            "/about",
            vec![
                ComponentInstance::new("root", "Section").with_children(["title"]),
                ComponentInstance::new("title", "Title")
                    .with_parent("root")
                    .with_property("text", json!("About")),
            ],
        )
    }

    fn generate(config: &PageConfig, options: &GenerationOptions) -> Result<PageOutput, GenerateError> {
        PageGenerator::new(options, &IdentityFormatter).generate_page(config)
    }

    fn file<'a>(output: &'a PageOutput, path: &str) -> &'a GeneratedCode {
        output
            .files
            .iter()
            .find(|f| f.path == path)
            .unwrap_or_else(|| panic!("no file {} in {:?}", path, output.files.iter().map(|f| &f.path).collect::<Vec<_>>()))
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // VALIDATION GATE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_empty_page_is_rejected_without_files() {
        let config = page("Empty", "/empty", vec![]);
        let err = generate(&config, &options()).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, ERR_NO_COMPONENTS);
        assert_eq!(violations[0].message, "At least one component is required.");
    }

    #[test]
    fn test_all_violations_are_reported_together() {
        let config = page(
            "",
            "/broken",
            vec![ComponentInstance::new("root", "Container").with_children(["ghost"])],
        );
        let err = generate(&config, &options()).unwrap_err();
        let codes: Vec<&str> = err.violations().iter().map(|v| v.code.as_str()).collect();
        assert!(codes.contains(&ERR_MISSING_TITLE));
        assert!(codes.contains(&ERR_DANGLING_CHILD));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // PLACEMENT AND EMISSION
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_interactive_page_is_a_client_module() {
        let output = generate(&button_page(), &options()).unwrap();
        assert_eq!(output.placement, Placement::Client);

        let page = file(&output, "app/page.tsx");
        assert_eq!(page.kind, FileKind::Page);
        assert_eq!(page.language, "typescript");
        assert!(page.content.starts_with("\"use client\";\n\n"));
        assert!(page.content.contains("export default function HomePage() {"));
        assert!(page.content.contains("const handleClick = () => {};"));
        assert!(page.content.contains("<div>\n"));
        assert!(page.content.contains("onClick={handleClick}"));
        assert!(page.content.contains("Click"));
    }

    #[test]
    fn test_static_page_stays_on_the_server() {
        let output = generate(&static_page(), &options()).unwrap();
        assert_eq!(output.placement, Placement::Server);

        let page = file(&output, "app/about/page.tsx");
        assert!(!page.content.contains("use client"));
        assert!(page.content.contains("export default function AboutUsPage() {"));
        assert!(page.content.contains("<section>\n"));
        assert!(page.content.contains("<h1>About</h1>"));
    }

    #[test]
    fn test_server_components_disabled_forces_client() {
        let opts = options().with_server_components(false);
        let output = generate(&static_page(), &opts).unwrap();
        assert_eq!(output.placement, Placement::Client);
        assert!(file(&output, "app/about/page.tsx").content.starts_with("\"use client\";"));
    }

    #[test]
    fn test_styles_become_utility_classes() {
        let config = page(
            "Styled",
            "/styled",
            vec![ComponentInstance::new("root", "Container")
                .with_style("display", "flex")
                .with_style("justifyContent", "center")
                .with_style("padding", "16px")],
        );
        let output = generate(&config, &options()).unwrap();
        let page = file(&output, "app/styled/page.tsx");
        assert!(page.content.contains("className=\"flex justify-center p-4\""));
        assert!(!page.content.contains("style="));
    }

    #[test]
    fn test_scaffolds_follow_the_page() {
        let output = generate(&static_page(), &options()).unwrap();
        let paths: Vec<&str> = output.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["app/about/page.tsx", "app/about/loading.tsx", "app/about/error.tsx"]
        );
        assert!(output.files[1..].iter().all(|f| f.kind == FileKind::Scaffold));
        assert!(file(&output, "app/about/error.tsx").content.starts_with("\"use client\";"));
    }

    #[test]
    fn test_javascript_extensions() {
        let opts = options().with_type_script(false);
        let output = generate(&static_page(), &opts).unwrap();
        let page = file(&output, "app/about/page.jsx");
        assert_eq!(page.language, "javascript");
    }

    #[test]
    fn test_generated_modules_pass_consistency_check() {
        let config = page(
            "Links",
            "/links",
            vec![
                ComponentInstance::new("root", "Nav").with_children(["home", "logo"]),
                ComponentInstance::new("home", "Link")
                    .with_parent("root")
                    .with_property("href", json!("/"))
                    .with_property("text", json!("Home")),
                ComponentInstance::new("logo", "Image")
                    .with_parent("root")
                    .with_property("src", json!("/logo.png"))
                    .with_property("alt", json!("Logo")),
            ],
        );
        let output = generate(&config, &options()).unwrap();
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        let page = file(&output, "app/links/page.tsx");
        assert!(page.content.contains("import Image from \"next/image\";"));
        assert!(page.content.contains("import Link from \"next/link\";"));
    }

    #[test]
    fn test_unknown_types_are_warnings() {
        let config = page("Odd", "/odd", vec![ComponentInstance::new("x", "Carousel")]);
        let output = generate(&config, &options()).unwrap();
        assert_eq!(output.fallback_types, vec!["Carousel".to_string()]);
        assert!(output.warnings.iter().any(|w| w.contains("Carousel")));
        assert!(file(&output, "app/odd/page.tsx").content.contains("<div />"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let opts = GenerationOptions::new();
        let generator = PageGenerator::new(&opts, &IdentityFormatter);
        let first = generator.generate_page(&button_page()).unwrap();
        let second = generator.generate_page(&button_page()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.files[0].fingerprint, second.files[0].fingerprint);
    }

    #[test]
    fn test_statistics_count_placement() {
        let output = generate(&button_page(), &options()).unwrap();
        assert_eq!(output.stats.total, 2);
        assert_eq!(output.stats.client, 1);
        assert_eq!(output.stats.server, 1);
        assert_eq!(output.stats.components.get("Button"), Some(&1));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // STRATEGIES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_metadata_strategy() {
        let mut config = static_page();
        config.metadata = Some(MetadataDescriptor {
            description: Some("Who we are".into()),
            ..MetadataDescriptor::default()
        });
        let output = generate(&config, &options()).unwrap();
        let page = file(&output, "app/about/page.tsx");
        assert!(page.content.contains("import type { Metadata } from \"next\";"));
        assert!(page.content.contains("export const metadata: Metadata = {"));
        assert!(page.content.contains("  title: \"About us\","));
        assert!(page.content.contains("  description: \"Who we are\","));
    }

    #[test]
    fn test_data_fetching_strategy() {
        let mut config = static_page();
        config.data_fetching = Some(DataFetching {
            source: "https://api.example.com/team".into(),
            revalidate: Some(60),
            variable: Some("team".into()),
            cache: Some(CacheStrategy::ForceCache),
        });
        let output = generate(&config, &options()).unwrap();
        let page = file(&output, "app/about/page.tsx");
        assert!(page.content.contains("async function getData(): Promise<unknown> {"));
        assert!(page
            .content
            .contains("fetch(\"https://api.example.com/team\", { cache: \"force-cache\", next: { revalidate: 60 } })"));
        assert!(page.content.contains("export default async function AboutUsPage() {"));
        assert!(page.content.contains("const team = await getData();"));
    }

    #[test]
    fn test_client_body_moves_to_companion() {
        let mut config = button_page();
        config.metadata = Some(MetadataDescriptor::default());
        let output = generate(&config, &options()).unwrap();

        let page = file(&output, "app/page.tsx");
        assert!(!page.content.contains("use client"));
        assert!(page.content.contains("import HomePageClient from \"./page-client\";"));
        assert!(page.content.contains("<HomePageClient />"));
        assert!(page.content.contains("export const metadata: Metadata"));

        let companion = file(&output, "app/page-client.tsx");
        assert_eq!(companion.kind, FileKind::Component);
        assert!(companion.content.starts_with("\"use client\";"));
        assert!(companion.content.contains("export default function HomePageClient() {"));
        assert!(companion.content.contains("const handleClick = () => {};"));
        assert!(companion.content.contains("onClick={handleClick}"));
    }

    #[test]
    fn test_companion_receives_fetched_data() {
        let mut config = button_page();
        config.data_fetching = Some(DataFetching {
            source: "/api/items".into(),
            revalidate: None,
            variable: None,
            cache: None,
        });
        let output = generate(&config, &options()).unwrap();
        let page = file(&output, "app/page.tsx");
        assert!(page.content.contains("const data = await getData();"));
        assert!(page.content.contains("<HomePageClient data={data} />"));
        let companion = file(&output, "app/page-client.tsx");
        assert!(companion
            .content
            .contains("export default function HomePageClient({ data }: { data: unknown }) {"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CLIENT ISLANDS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_split_moves_interactive_subtrees_to_islands() {
        let config = page(
            "Shop",
            "/shop",
            vec![
                ComponentInstance::new("root", "Main").with_children(["heading", "buy"]),
                ComponentInstance::new("heading", "Heading")
                    .with_parent("root")
                    .with_property("text", json!("Products")),
                ComponentInstance::new("buy", "Button")
                    .with_parent("root")
                    .with_property("text", json!("Buy"))
                    .with_property("onClick", json!("purchase")),
            ],
        );
        let opts = options();
        let output = PageGenerator::new(&opts, &IdentityFormatter)
            .split_client_server_components(&config)
            .unwrap();
        assert_eq!(output.placement, Placement::Server);

        let page = file(&output, "app/shop/page.tsx");
        assert!(!page.content.contains("use client"));
        assert!(page.content.contains("import { ClientIsland1 } from \"./client-islands\";"));
        assert!(page.content.contains("<ClientIsland1 />"));
        assert!(page.content.contains("<h2>Products</h2>"));
        assert!(!page.content.contains("purchase"));

        let islands = file(&output, "app/shop/client-islands.tsx");
        assert!(islands.content.starts_with("\"use client\";"));
        assert!(islands.content.contains("export function ClientIsland1() {"));
        assert!(islands.content.contains("const purchase = () => {};"));
        assert!(islands.content.contains("onClick={purchase}"));
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    }

    #[test]
    fn test_split_without_interactivity_emits_no_islands() {
        let opts = options();
        let output = PageGenerator::new(&opts, &IdentityFormatter)
            .split_client_server_components(&static_page())
            .unwrap();
        assert!(output.files.iter().all(|f| !f.path.contains("client-islands")));
    }

    #[test]
    fn test_islands_sharing_a_handler_each_declare_it() {
        let config = page(
            "Shop",
            "/shop",
            vec![
                ComponentInstance::new("root", "Main").with_children(["a", "mid", "b"]),
                ComponentInstance::new("a", "Button")
                    .with_parent("root")
                    .with_property("onClick", json!("handleClick")),
                ComponentInstance::new("mid", "Text")
                    .with_parent("root")
                    .with_property("text", json!("or")),
                ComponentInstance::new("b", "Button")
                    .with_parent("root")
                    .with_property("onClick", json!("handleClick")),
            ],
        );
        let opts = options();
        let output = PageGenerator::new(&opts, &IdentityFormatter)
            .split_client_server_components(&config)
            .unwrap();
        let islands = &file(&output, "app/shop/client-islands.tsx").content;
        let (first, second) = islands
            .split_once("export function ClientIsland2")
            .expect("second island");
        assert!(first.contains("export function ClientIsland1"));
        assert!(first.contains("const handleClick = () => {};"));
        assert!(second.contains("const handleClick = () => {};"));
    }

    #[test]
    fn test_void_element_children_are_reported() {
        let config = page(
            "Gallery",
            "/gallery",
            vec![
                ComponentInstance::new("hero", "Image")
                    .with_property("src", json!("/hero.png"))
                    .with_children(["caption"]),
                ComponentInstance::new("caption", "Text")
                    .with_parent("hero")
                    .with_property("text", json!("Sunrise")),
            ],
        );
        let output = generate(&config, &options()).unwrap();
        let page = file(&output, "app/gallery/page.tsx");
        assert!(!page.content.contains("Sunrise"));
        assert!(output
            .warnings
            .contains(&"`hero` is a void element; its children were not rendered".to_string()));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DYNAMIC ROUTES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_dynamic_route_server_variant() {
        let config = page(
            "Post",
            "/blog",
            vec![ComponentInstance::new("root", "Article")],
        );
        let mut params = IndexMap::new();
        params.insert("id".to_string(), ParamKind::Number);
        let opts = options();
        let output = PageGenerator::new(&opts, &IdentityFormatter)
            .generate_dynamic_route(&config, &params)
            .unwrap();

        let page = file(&output, "app/blog/[id]/page.tsx");
        assert!(page.content.contains("type PageProps = {\n  params: Promise<{ id: string }>;\n};"));
        assert!(page.content.contains("export async function generateStaticParams() {"));
        assert!(page.content.contains("export default async function PostPage({ params }: PageProps) {"));
        assert!(page.content.contains("const { id: idParam } = await params;"));
        assert!(page.content.contains("const id = Number(idParam);"));
    }

    #[test]
    fn test_dynamic_route_client_variant() {
        let mut params = IndexMap::new();
        params.insert("slug".to_string(), ParamKind::CatchAll);
        let opts = options();
        let output = PageGenerator::new(&opts, &IdentityFormatter)
            .generate_dynamic_route(&button_page(), &params)
            .unwrap();

        let page = file(&output, "app/[...slug]/page.tsx");
        assert!(page.content.starts_with("\"use client\";"));
        assert!(page.content.contains("import { useParams } from \"next/navigation\";"));
        assert!(page.content.contains("const params = useParams<{ slug: string[] }>();"));
        assert!(page.content.contains("const slug = params.slug;"));
    }

    #[test]
    fn test_dynamic_route_keeps_existing_segment() {
        let config = page("Post", "/blog/[id]", vec![ComponentInstance::new("root", "Article")]);
        let mut params = IndexMap::new();
        params.insert("id".to_string(), ParamKind::String);
        let opts = options();
        let output = PageGenerator::new(&opts, &IdentityFormatter)
            .generate_dynamic_route(&config, &params)
            .unwrap();
        assert_eq!(output.files[0].path, "app/blog/[id]/page.tsx");
    }

    #[test]
    fn test_dynamic_route_rejects_bad_params() {
        let mut params = IndexMap::new();
        params.insert("post-id".to_string(), ParamKind::String);
        let opts = options();
        let err = PageGenerator::new(&opts, &IdentityFormatter)
            .generate_dynamic_route(&static_page(), &params)
            .unwrap_err();
        assert_eq!(err.violations()[0].code, ERR_ROUTE_PARAM);

        let err = PageGenerator::new(&opts, &IdentityFormatter)
            .generate_dynamic_route(&static_page(), &IndexMap::new())
            .unwrap_err();
        assert_eq!(err.violations()[0].code, ERR_ROUTE_PARAM);
    }

    #[test]
    fn test_page_directories() {
        assert_eq!(page_directory("/"), "app");
        assert_eq!(page_directory(""), "app");
        assert_eq!(page_directory("/about/team/"), "app/about/team");
        assert_eq!(page_directory("blog//[id]"), "app/blog/[id]");
    }
}

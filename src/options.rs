//! Options for page and component generation.

use serde::{Deserialize, Serialize};

/// Directory that holds the route tree.
pub const APP_DIR: &str = "app";
/// Directory that holds standalone components.
pub const COMPONENTS_DIR: &str = "components";
/// Directory that holds server and form actions.
pub const ACTIONS_DIR: &str = "app/actions";
/// Aggregated component prop declarations.
pub const TYPES_FILE: &str = "types/components.ts";
/// Stylesheet imported by the root layout when utility classes are enabled.
pub const GLOBALS_CSS_FILE: &str = "app/globals.css";

/// Recognised generation options.
///
/// Every field has a default, so a partial JSON object deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Emit type annotations and `.tsx`/`.ts` files.
    pub use_type_script: bool,
    /// Pages without interactive nodes render on the server. When `false`
    /// every page and component is marked as a client module.
    pub use_server_components: bool,
    /// Translate styles into utility classes instead of inline styles.
    pub use_tailwind: bool,
    /// Run the formatting pass over emitted modules.
    pub prettier: bool,
    /// Reserved.
    pub eslint: bool,
    /// Emit a `data-component-id` attribute on every element.
    pub emit_component_ids: bool,
    /// Parse emitted modules and report missing or duplicate imports.
    pub check_consistency: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            use_type_script: true,
            use_server_components: true,
            use_tailwind: true,
            prettier: true,
            eslint: false,
            emit_component_ids: true,
            check_consistency: true,
        }
    }
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type_script(mut self, enabled: bool) -> Self {
        self.use_type_script = enabled;
        self
    }

    #[must_use]
    pub fn with_server_components(mut self, enabled: bool) -> Self {
        self.use_server_components = enabled;
        self
    }

    #[must_use]
    pub fn with_tailwind(mut self, enabled: bool) -> Self {
        self.use_tailwind = enabled;
        self
    }

    #[must_use]
    pub fn with_prettier(mut self, enabled: bool) -> Self {
        self.prettier = enabled;
        self
    }

    #[must_use]
    pub fn with_eslint(mut self, enabled: bool) -> Self {
        self.eslint = enabled;
        self
    }

    #[must_use]
    pub fn with_component_ids(mut self, enabled: bool) -> Self {
        self.emit_component_ids = enabled;
        self
    }

    #[must_use]
    pub fn with_consistency_check(mut self, enabled: bool) -> Self {
        self.check_consistency = enabled;
        self
    }

    /// Extension for modules containing markup.
    pub fn component_extension(&self) -> &'static str {
        if self.use_type_script {
            "tsx"
        } else {
            "jsx"
        }
    }

    /// Extension for plain script modules (actions).
    pub fn script_extension(&self) -> &'static str {
        if self.use_type_script {
            "ts"
        } else {
            "js"
        }
    }

    pub fn language(&self) -> &'static str {
        if self.use_type_script {
            "typescript"
        } else {
            "javascript"
        }
    }
}

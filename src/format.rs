//! Source formatting pass.
//!
//! The formatter is a collaborator: failures never abort generation, the
//! caller keeps the unformatted text and records a warning.

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("{path}: {message}")]
    Syntax { path: String, message: String },

    #[error("{0}: no formatter for this file type")]
    Unsupported(String),
}

pub trait SourceFormatter: Send + Sync {
    fn format(&self, source: &str, path: &str) -> Result<String, FormatError>;
}

/// Parser settings for a generated file, or `None` for non-script files.
pub fn source_type_for(path: &str) -> Option<SourceType> {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext)?;
    let (typescript, jsx) = match extension {
        "tsx" => (true, true),
        "ts" => (true, false),
        "jsx" | "js" => (false, true),
        _ => return None,
    };
    Some(
        SourceType::default()
            .with_module(true)
            .with_typescript(typescript)
            .with_jsx(jsx),
    )
}

/// Re-prints modules through the oxc code generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcFormatter;

impl SourceFormatter for OxcFormatter {
    fn format(&self, source: &str, path: &str) -> Result<String, FormatError> {
        let source_type =
            source_type_for(path).ok_or_else(|| FormatError::Unsupported(path.to_string()))?;
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, source_type).parse();
        if !ret.errors.is_empty() {
            let message = ret
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(FormatError::Syntax {
                path: path.to_string(),
                message,
            });
        }
        Ok(Codegen::new().build(&ret.program).code)
    }
}

/// Leaves text untouched. Used when formatting is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFormatter;

impl SourceFormatter for IdentityFormatter {
    fn format(&self, source: &str, _path: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Format `source`, keeping the original text on failure.
///
/// Returns the text to emit and the failure, if any.
pub fn format_or_keep(
    formatter: &dyn SourceFormatter,
    source: String,
    path: &str,
) -> (String, Option<FormatError>) {
    if source_type_for(path).is_none() {
        return (source, None);
    }
    match formatter.format(&source, path) {
        Ok(formatted) => (formatted, None),
        Err(err) => {
            tracing::warn!(path, error = %err, "formatting failed, keeping unformatted output");
            (source, Some(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl SourceFormatter for Failing {
        fn format(&self, _source: &str, path: &str) -> Result<String, FormatError> {
            Err(FormatError::Syntax {
                path: path.to_string(),
                message: "boom".into(),
            })
        }
    }

    #[test]
    fn test_source_type_for_extensions() {
        assert!(source_type_for("app/page.tsx").is_some());
        assert!(source_type_for("app/actions/save.js").is_some());
        assert!(source_type_for("app/globals.css").is_none());
        assert!(source_type_for("README").is_none());
    }

    #[test]
    fn test_oxc_formatter_reprints_valid_module() {
        let source = "export default function A(){return <div className=\"x\"/>}";
        let formatted = OxcFormatter.format(source, "a.tsx").unwrap();
        assert!(formatted.contains("export default function A()"));
        assert!(formatted.contains("className=\"x\""));
    }

    #[test]
    fn test_oxc_formatter_rejects_invalid_module() {
        let err = OxcFormatter.format("export default function (", "a.tsx").unwrap_err();
        assert!(matches!(err, FormatError::Syntax { .. }));
    }

    #[test]
    fn test_failure_keeps_unformatted_text() {
        let (text, err) = format_or_keep(&Failing, "const a = 1;".into(), "a.ts");
        assert_eq!(text, "const a = 1;");
        assert!(err.is_some());

        let (text, err) = format_or_keep(&Failing, "body {}".into(), "globals.css");
        assert_eq!(text, "body {}");
        assert!(err.is_none());
    }
}

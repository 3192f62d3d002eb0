//! Output formatters applied to rendered files before they are written.
//!
//! Three formatters are built in: `trailing-whitespace`, `final-newline` and
//! `json`. Any other name is treated as an external program that reads the
//! content on stdin and prints the formatted result.

mod builtin;
mod external;

use std::path::Path;
use std::sync::Arc;

use clay_core::{
    application::ports::{Formatter, FormatterProvider},
    domain::FormatterSpec,
    error::ClayResult,
};

pub use builtin::{FinalNewline, JsonFormatter, TrailingWhitespace};
pub use external::CommandFormatter;

/// Resolves formatter specs to the built-ins or to an external command.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormatters;

impl BuiltinFormatters {
    pub fn new() -> Self {
        Self
    }
}

impl FormatterProvider for BuiltinFormatters {
    fn resolve(&self, spec: &FormatterSpec) -> ClayResult<Arc<dyn Formatter>> {
        let formatter: Arc<dyn Formatter> = match spec.name() {
            TrailingWhitespace::NAME => Arc::new(TrailingWhitespace),
            FinalNewline::NAME => Arc::new(FinalNewline),
            JsonFormatter::NAME => Arc::new(JsonFormatter),
            program => Arc::new(CommandFormatter::from_options(program, spec.options())?),
        };
        Ok(formatter)
    }
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_builtins_by_name() {
        let provider = BuiltinFormatters::new();
        for name in ["trailing-whitespace", "final-newline", "json"] {
            let formatter = provider
                .resolve(&FormatterSpec::Named(name.into()))
                .unwrap();
            assert_eq!(formatter.name(), name);
        }
    }

    #[test]
    fn unknown_names_become_command_formatters() {
        let spec = FormatterSpec::Package {
            package: "prettier".into(),
            options: json!({"extensions": ["ts"], "args": ["--stdin-filepath", "x.ts"]}),
        };
        let formatter = BuiltinFormatters::new().resolve(&spec).unwrap();
        assert_eq!(formatter.name(), "prettier");
        assert!(formatter.applies_to(Path::new("src/a.ts")));
        assert!(!formatter.applies_to(Path::new("src/a.rs")));
    }
}

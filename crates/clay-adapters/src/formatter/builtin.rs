use std::path::Path;

use clay_core::{
    application::{ApplicationError, ports::Formatter},
    error::ClayResult,
};

use super::extension_of;

/// Strips trailing spaces and tabs from every line.
#[derive(Debug, Clone, Copy)]
pub struct TrailingWhitespace;

impl TrailingWhitespace {
    pub const NAME: &'static str = "trailing-whitespace";
}

impl Formatter for TrailingWhitespace {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn applies_to(&self, _path: &Path) -> bool {
        true
    }

    fn format(&self, _path: &Path, content: &str) -> ClayResult<String> {
        let mut out = String::with_capacity(content.len());
        for line in content.split_inclusive('\n') {
            let (body, ending) = match line.strip_suffix("\r\n") {
                Some(body) => (body, "\r\n"),
                None => match line.strip_suffix('\n') {
                    Some(body) => (body, "\n"),
                    None => (line, ""),
                },
            };
            out.push_str(body.trim_end_matches([' ', '\t']));
            out.push_str(ending);
        }
        Ok(out)
    }
}

/// Ensures the content ends with exactly one newline.
#[derive(Debug, Clone, Copy)]
pub struct FinalNewline;

impl FinalNewline {
    pub const NAME: &'static str = "final-newline";
}

impl Formatter for FinalNewline {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn applies_to(&self, _path: &Path) -> bool {
        true
    }

    fn format(&self, _path: &Path, content: &str) -> ClayResult<String> {
        if content.is_empty() {
            return Ok(String::new());
        }
        let mut out = content.trim_end_matches(['\n', '\r']).to_string();
        out.push('\n');
        Ok(out)
    }
}

/// Re-indents `.json` files with two spaces, keeping key order.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub const NAME: &'static str = "json";
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn applies_to(&self, path: &Path) -> bool {
        extension_of(path) == Some("json")
    }

    fn format(&self, path: &Path, content: &str) -> ClayResult<String> {
        let failed = |reason: String| ApplicationError::FormattingFailed {
            formatter: Self::NAME.into(),
            path: path.to_path_buf(),
            reason,
        };
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| failed(e.to_string()))?;
        let mut out = serde_json::to_string_pretty(&value).map_err(|e| failed(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_whitespace_keeps_line_endings() {
        let out = TrailingWhitespace
            .format(Path::new("a.ts"), "a  \r\nb\t\nc ")
            .unwrap();
        assert_eq!(out, "a\r\nb\nc");
    }

    #[test]
    fn final_newline_collapses_blank_tail() {
        let f = FinalNewline;
        assert_eq!(f.format(Path::new("a"), "x\n\n\n").unwrap(), "x\n");
        assert_eq!(f.format(Path::new("a"), "x").unwrap(), "x\n");
        assert_eq!(f.format(Path::new("a"), "").unwrap(), "");
    }

    #[test]
    fn json_reindents_and_keeps_key_order() {
        let out = JsonFormatter
            .format(Path::new("a.json"), r#"{"b":1,"a":[true]}"#)
            .unwrap();
        assert_eq!(out, "{\n  \"b\": 1,\n  \"a\": [\n    true\n  ]\n}\n");
        assert!(!JsonFormatter.applies_to(Path::new("a.ts")));
    }

    #[test]
    fn json_rejects_invalid_input() {
        let err = JsonFormatter.format(Path::new("a.json"), "{").unwrap_err();
        assert!(err.to_string().contains("Formatter 'json' failed"));
    }
}

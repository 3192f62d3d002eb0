use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use serde_json::Value;
use tracing::debug;

use clay_core::{
    application::{ApplicationError, ports::Formatter},
    error::{ClayError, ClayResult},
};

use super::extension_of;

/// Pipes content through an external program: stdin in, stdout out.
///
/// Options:
/// - `extensions`: file extensions (without the dot) the formatter applies to;
///   every file when absent.
/// - `args`: arguments passed to the program.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
    extensions: Option<Vec<String>>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            extensions: None,
        }
    }

    pub fn from_options(program: &str, options: Option<&Value>) -> ClayResult<Self> {
        let mut formatter = Self::new(program);
        let Some(options) = options else {
            return Ok(formatter);
        };
        if let Some(args) = options.get("args") {
            formatter.args = string_list(program, "args", args)?;
        }
        if let Some(extensions) = options.get("extensions") {
            formatter.extensions = Some(
                string_list(program, "extensions", extensions)?
                    .into_iter()
                    .map(|e| e.trim_start_matches('.').to_string())
                    .collect(),
            );
        }
        Ok(formatter)
    }

    fn failed(&self, path: &Path, reason: impl Into<String>) -> ClayError {
        ApplicationError::FormattingFailed {
            formatter: self.program.clone(),
            path: path.to_path_buf(),
            reason: reason.into(),
        }
        .into()
    }
}

fn string_list(program: &str, key: &str, value: &Value) -> ClayResult<Vec<String>> {
    let items = value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| ClayError::Configuration {
            message: format!("formatter '{}': options.{} must be an array of strings", program, key),
        })?;
    Ok(items)
}

impl Formatter for CommandFormatter {
    fn name(&self) -> &str {
        &self.program
    }

    fn applies_to(&self, path: &Path) -> bool {
        match &self.extensions {
            None => true,
            Some(extensions) => extension_of(path)
                .is_some_and(|ext| extensions.iter().any(|e| e == ext)),
        }
    }

    fn format(&self, path: &Path, content: &str) -> ClayResult<String> {
        debug!(formatter = %self.program, path = %path.display(), "formatting");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failed(path, e.to_string()))?;

        // Written from its own thread: an inline write deadlocks once the stdout pipe fills.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failed(path, "stdin unavailable"))?;
        let input = content.to_string();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| self.failed(path, e.to_string()))?;
        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.failed(path, e.to_string())),
            Err(_) => return Err(self.failed(path, "stdin writer panicked")),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(path, format!("exited with {}: {}", output.status, stderr.trim())));
        }
        String::from_utf8(output.stdout).map_err(|e| self.failed(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extensions_accept_a_leading_dot() {
        let f = CommandFormatter::from_options("fmt", Some(&json!({"extensions": [".md"]}))).unwrap();
        assert!(f.applies_to(Path::new("README.md")));
        assert!(!f.applies_to(Path::new("README")));
    }

    #[test]
    fn malformed_options_are_configuration_errors() {
        let err = CommandFormatter::from_options("fmt", Some(&json!({"args": "--fix"}))).unwrap_err();
        assert!(matches!(err, ClayError::Configuration { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn pipes_content_through_the_program() {
        let f = CommandFormatter::from_options("tr", Some(&json!({"args": ["a-z", "A-Z"]}))).unwrap();
        assert_eq!(f.format(Path::new("x.txt"), "hello\n").unwrap(), "HELLO\n");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_formatting_failure() {
        let err = CommandFormatter::new("false")
            .format(Path::new("x.txt"), "")
            .unwrap_err();
        assert!(matches!(
            err,
            ClayError::Application(ApplicationError::FormattingFailed { .. })
        ));
    }

    #[test]
    fn missing_program_is_a_formatting_failure() {
        let err = CommandFormatter::new("clay-no-such-formatter")
            .format(Path::new("x.txt"), "x")
            .unwrap_err();
        assert!(err.to_string().contains("clay-no-such-formatter"));
    }
}

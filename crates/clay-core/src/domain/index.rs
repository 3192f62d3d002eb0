//! Persisted shape of the `.clay` generation index.
//!
//! ```json
//! {
//!   "models": [
//!     {
//!       "path": "models/shop.json",
//!       "output": ".",
//!       "generated_files": {
//!         "src/order.ts": { "md5": "9f86d0…", "date": "2026-01-01T00:00:00Z" }
//!       },
//!       "last_generated": "2026-01-01T00:00:00Z"
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Everything generated for one `(model path, output)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub path: String,
    pub output: String,
    #[serde(default)]
    pub generated_files: BTreeMap<String, GeneratedFile>,
    #[serde(default)]
    pub last_generated: Option<DateTime<Utc>>,
}

impl ModelEntry {
    pub fn new(path: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            output: output.into(),
            generated_files: BTreeMap::new(),
            last_generated: None,
        }
    }

    pub fn matches(&self, path: &str, output: &str) -> bool {
        self.path == path && self.output == output
    }

    /// Hash recorded for `file`, if any.
    pub fn hash_of(&self, file: &str) -> Option<&str> {
        self.generated_files.get(file).map(|f| f.md5.as_str())
    }

    pub fn record(&mut self, file: impl Into<String>, hash: impl Into<String>) {
        self.generated_files.insert(
            file.into(),
            GeneratedFile {
                md5: hash.into(),
                date: Utc::now(),
            },
        );
    }
}

/// Hash and write time of one generated file.
///
/// The field keeps its historical `md5` name; the value is a SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub md5: String,
    pub date: DateTime<Utc>,
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn conflict_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?ms)^<<<<<<<[^\n]*\n.*?^=======[ \t]*\r?\n(.*?)^>>>>>>>[^\n]*(?:\n|\z)")
            .unwrap_or_else(|e| unreachable!("conflict pattern is valid: {e}"))
    })
}

/// Keep only the incoming side of every unresolved merge block.
///
/// Returns the repaired text and the number of blocks rewritten.
pub fn repair_merge_conflicts(raw: &str) -> (String, usize) {
    let re = conflict_block();
    let count = re.find_iter(raw).count();
    if count == 0 {
        return (raw.to_string(), 0);
    }
    (re.replace_all(raw, "${1}").into_owned(), count)
}

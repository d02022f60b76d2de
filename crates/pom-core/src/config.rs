//! Editing configuration.
//!
//! Deserialized from the JSON settings block supplied by the host, e.g.:
//!
//! ```json
//! {
//!   "format": { "indentSize": 4, "useTabs": false, "detectIndentation": true },
//!   "maxFileSize": 50000000,
//!   "undoLimit": 100
//! }
//! ```
//!
//! Every field is optional and falls back to its default.

use crate::error::Result;
use serde::Deserialize;

/// Hard limit on loaded pom.xml size in bytes (50MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50_000_000;

/// Size above which loading a pom.xml logs a warning (10MB).
pub const DEFAULT_LARGE_FILE_WARNING: u64 = 10_000_000;

pub const DEFAULT_UNDO_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditConfig {
    pub format: FormatConfig,
    pub max_file_size: u64,
    pub large_file_warning: u64,
    pub undo_limit: usize,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            format: FormatConfig::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            large_file_warning: DEFAULT_LARGE_FILE_WARNING,
            undo_limit: DEFAULT_UNDO_LIMIT,
        }
    }
}

impl EditConfig {
    /// Reads configuration from a JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Reads configuration from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatConfig {
    pub indent_size: usize,
    pub use_tabs: bool,
    /// Reuse the indentation found in the document instead of the
    /// configured one.
    pub detect_indentation: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_size: 2,
            use_tabs: false,
            detect_indentation: true,
        }
    }
}

impl FormatConfig {
    /// One level of indentation as configured.
    pub fn indent_unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.indent_size)
        }
    }
}

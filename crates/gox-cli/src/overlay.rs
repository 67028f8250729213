//! The `go build -overlay` file format.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Replacement file contents for `go build -overlay=FILE`.
///
/// Keys are the paths `go` sees, values the files it reads instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(rename = "Replace")]
    pub replace: IndexMap<String, String>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: impl Into<String>, replacement: impl Into<String>) {
        self.replace.insert(target.into(), replacement.into());
    }

    pub fn len(&self) -> usize {
        self.replace.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

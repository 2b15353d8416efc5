//! Store configuration.

use serde::{Deserialize, Serialize};

/// How sibling names are compared for uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    /// "Reports" and "reports" collide.
    #[default]
    Insensitive,
    /// "Reports" and "reports" may coexist.
    Sensitive,
}

impl NameCase {
    /// Key used when comparing two sibling names.
    pub fn key(self, name: &str) -> String {
        match self {
            NameCase::Insensitive => name.to_lowercase(),
            NameCase::Sensitive => name.to_string(),
        }
    }
}

/// Tunables shared by every call site of the name and size rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum name length, in characters, after trimming.
    pub max_name_length: usize,
    /// Case policy for sibling-name uniqueness.
    pub name_case: NameCase,
    /// Upper bound on a file's recorded size in bytes.
    pub max_file_size: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_name_length: 255,
            name_case: NameCase::default(),
            max_file_size: None,
        }
    }
}

impl StoreConfig {
    pub fn with_name_case(mut self, name_case: NameCase) -> Self {
        self.name_case = name_case;
        self
    }

    pub fn with_max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }

    pub fn with_max_file_size(mut self, max: u64) -> Self {
        self.max_file_size = Some(max);
        self
    }

    /// Load defaults overlaid with `DOCSHELF__*` environment variables,
    /// e.g. `DOCSHELF__NAME_CASE=sensitive`.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("DOCSHELF")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

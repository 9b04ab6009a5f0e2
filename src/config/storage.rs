//! Storage configuration types.

use serde::Deserialize;

/// Default database file.
pub const DEFAULT_DATABASE_PATH: &str = "data/dvdrental.db";

/// Default pool size for file databases.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path, or `:memory:`.
    pub path: String,
    /// Maximum pooled connections (file databases only).
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let storage = StorageConfig::default();
        assert_eq!(storage.path, "data/dvdrental.db");
        assert_eq!(storage.max_connections, 4);
    }
}

//! Configuration loading for the `restlayer` server.
//!
//! ```toml
//! mount_path = "/api"
//! log_filter = "restlayer=info,tower_http=info"
//!
//! [server]
//! bind_address = "0.0.0.0:8080"
//!
//! [store]
//! kind = "mongodb"
//! dsn = "mongodb://localhost:27017"
//! database = "app"
//!
//! [[collections]]
//! name = "users"
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashSet, fs, path::Path, sync::Arc};

use restlayer_core::{
    dispatcher::CollectionDispatcher,
    error::RestResult,
    matcher::MountPath,
    model::ModelBuilder,
};
use restlayer_http::ServerConfig;
use restlayer_memory::InMemoryModel;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Path prefix under which collections are served.
    pub mount_path: String,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Backing store shared by every collection.
    pub store: StoreConfig,
    /// Collections registered at startup.
    pub collections: Vec<CollectionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            mount_path: "/api".to_string(),
            log_filter: "restlayer=info,tower_http=info".to_string(),
            store: StoreConfig::default(),
            collections: Vec::new(),
        }
    }
}

/// Store selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local records, lost on restart.
    #[default]
    Memory,
    /// A MongoDB database; each collection maps to the MongoDB collection of the same name.
    Mongodb { dsn: String, database: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CollectionConfig {
    pub name: String,
    /// Records loaded into an in-memory collection at startup.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seed: Vec<Value>,
}

impl AppConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;

        Ok(config)
    }

    /// Checks the cross-field rules serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        if self.collections.is_empty() {
            errors.push("at least one collection must be configured".to_string());
        }

        for collection in &self.collections {
            let name = collection.name.as_str();

            if name.is_empty() {
                errors.push("collection names must not be empty".to_string());
            } else if name.contains('/') {
                errors.push(format!("collection name {name:?} must not contain '/'"));
            } else if !seen.insert(name) {
                errors.push(format!("collection {name:?} is configured twice"));
            }

            if collection.seed.iter().any(|record| !record.is_object()) {
                errors.push(format!("seed records of {name:?} must be objects"));
            }
            if !collection.seed.is_empty() && self.store != StoreConfig::Memory {
                errors.push(format!("collection {name:?}: seed records need the memory store"));
            }
        }

        if let StoreConfig::Mongodb { dsn, database } = &self.store {
            if dsn.is_empty() {
                errors.push("store.dsn must not be empty".to_string());
            }
            if database.is_empty() {
                errors.push("store.database must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Creates the dispatcher and registers a model for every configured collection.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Initialization`](restlayer_core::error::RestError::Initialization)
    /// when the store cannot be set up.
    pub async fn build_dispatcher(&self) -> RestResult<Arc<CollectionDispatcher>> {
        let dispatcher = CollectionDispatcher::new(MountPath::new(&self.mount_path));

        match &self.store {
            StoreConfig::Memory => {
                for collection in &self.collections {
                    let model = InMemoryModel::builder()
                        .seed(collection.seed.iter().cloned())
                        .build()
                        .await?;
                    dispatcher.add(collection.name.as_str(), model).await;
                }
            }
            StoreConfig::Mongodb { dsn, database } => {
                self.register_mongodb(&dispatcher, dsn, database).await?;
            }
        }

        Ok(Arc::new(dispatcher))
    }

    #[cfg(feature = "mongodb")]
    async fn register_mongodb(
        &self,
        dispatcher: &CollectionDispatcher,
        dsn: &str,
        database: &str,
    ) -> RestResult<()> {
        let client = restlayer_mongodb::connect(dsn).await?;

        for collection in &self.collections {
            let model = restlayer_mongodb::MongoModel::new(&client, database, &collection.name);
            dispatcher.add(collection.name.as_str(), model).await;
        }

        Ok(())
    }

    #[cfg(not(feature = "mongodb"))]
    async fn register_mongodb(
        &self,
        _dispatcher: &CollectionDispatcher,
        _dsn: &str,
        _database: &str,
    ) -> RestResult<()> {
        Err(restlayer_core::error::RestError::Initialization(
            "the mongodb store requires the `mongodb` feature".to_string(),
        ))
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;

    AppConfig::from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [[collections]]
            name = "users"
            "#,
        )
        .unwrap();

        assert_eq!(config.mount_path, "/api");
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.collections[0].name, "users");
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml_str(
            r#"
            mount_path = "/v1"

            [server]
            bind_address = "0.0.0.0:9000"
            request_timeout_secs = 5

            [store]
            kind = "mongodb"
            dsn = "mongodb://localhost:27017"
            database = "app"

            [[collections]]
            name = "users"

            [[collections]]
            name = "posts"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(
            config.store,
            StoreConfig::Mongodb {
                dsn: "mongodb://localhost:27017".into(),
                database: "app".into(),
            }
        );
        assert_eq!(config.collections.len(), 2);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let err = AppConfig::from_toml_str(
            r#"
            [store]
            kind = "mongodb"
            dsn = ""
            database = "app"

            [[collections]]
            name = "users"

            [[collections]]
            name = "users"
            "#,
        )
        .unwrap_err();

        let errors = match err {
            ConfigError::Validation(errors) => errors,
            other => panic!("expected a validation error, got {other}"),
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("configured twice")));
        assert!(errors.iter().any(|e| e.contains("store.dsn")));
    }

    #[test]
    fn test_empty_collections_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str(""),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("mount_path = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_build_memory_dispatcher() {
        let mut config = AppConfig::default();
        config.collections.push(CollectionConfig {
            name: "users".into(),
            seed: vec![json!({"_id": "1", "name": "Alice"})],
        });
        config.collections.push(CollectionConfig {
            name: "posts".into(),
            seed: Vec::new(),
        });
        config.validate().unwrap();

        let dispatcher = config.build_dispatcher().await.unwrap();

        assert_eq!(dispatcher.collections().await, ["posts", "users"]);
        assert_eq!(dispatcher.mount().to_string(), "/api");
    }
}

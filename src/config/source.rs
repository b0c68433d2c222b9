//! Configuration sources.
//!
//! A source only supplies the raw parameter mapping; type and presence
//! checks happen when the mapping is turned into a desired state.

use crate::error::ConfigError;
use log::debug;
use serde_json::{Map, Value};
use std::future::Future;
use std::path::PathBuf;

/// Supplies the raw parameter mapping for one reconciliation pass.
pub trait ConfigurationSource: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Map<String, Value>, ConfigError>> + Send;
}

/// A fixed parameter mapping held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    params: Map<String, Value>,
}

impl StaticSource {
    pub fn new(params: Map<String, Value>) -> Self {
        Self { params }
    }

    /// Build from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(params) => Ok(Self { params }),
            other => Err(ConfigError::Source {
                message: format!("expected a JSON object, got {}", json_type(&other)),
            }),
        }
    }
}

impl ConfigurationSource for StaticSource {
    async fn load(&self) -> Result<Map<String, Value>, ConfigError> {
        Ok(self.params.clone())
    }
}

/// Parameters read from a JSON file on every load.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigurationSource for JsonFileSource {
    async fn load(&self) -> Result<Map<String, Value>, ConfigError> {
        debug!("Loading parameters from {}", self.path.display());
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| ConfigError::Source {
                    message: format!("failed to read {}: {}", self.path.display(), e),
                })?;
        let value: Value = serde_json::from_str(&contents).map_err(|e| ConfigError::Source {
            message: format!("failed to parse {}: {}", self.path.display(), e),
        })?;
        StaticSource::from_value(value).map(|source| source.params)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn static_source_returns_its_mapping() {
        let source = StaticSource::from_value(json!({"password": "foo"})).unwrap();
        let params = source.load().await.unwrap();
        assert_eq!(params.get("password"), Some(&json!("foo")));
    }

    #[test]
    fn static_source_requires_an_object() {
        let err = StaticSource::from_value(json!(["password"])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Source {
                message: "expected a JSON object, got an array".to_string()
            }
        );
    }

    #[tokio::test]
    async fn file_source_reads_and_reports_errors() {
        let path = std::env::temp_dir().join(format!("params-{}.json", uuid::Uuid::new_v4()));
        let source = JsonFileSource::new(&path);
        assert!(matches!(
            source.load().await,
            Err(ConfigError::Source { .. })
        ));

        tokio::fs::write(&path, r#"{"password": "ironic_password", "tenant": "foobar"}"#)
            .await
            .unwrap();
        let params = source.load().await.unwrap();
        assert_eq!(params.get("tenant"), Some(&json!("foobar")));

        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(matches!(
            source.load().await,
            Err(ConfigError::Source { .. })
        ));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}

use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Resolve a configuration value for key `key`, checking in order:
///
/// 1. `pipeline_metadata[key]`, if present and deserializable as `T`
/// 2. `settings_value`, if `Some`
/// 3. `default`
///
/// This lets a pipeline's `config_metadata` override the process-wide
/// [`crate::Settings`] baseline without a restart, while still falling
/// back to an immutable, environment-derived default.
pub fn resolve<T: DeserializeOwned>(
    key: &str,
    pipeline_metadata: &HashMap<String, serde_json::Value>,
    settings_value: Option<T>,
    default: T,
) -> T {
    if let Some(value) = pipeline_metadata.get(key) {
        if let Ok(parsed) = serde_json::from_value(value.clone()) {
            return parsed;
        }
    }
    settings_value.unwrap_or(default)
}

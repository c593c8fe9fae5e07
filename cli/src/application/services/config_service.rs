//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::JdigConfig;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<JdigConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &JdigConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist one setting. The file is untouched when validation
/// fails.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<JdigConfig> {
    let mut config = load_config(store)?;
    config.set(key, value)?;
    save_config(store, &config)?;
    tracing::debug!(key, "configuration updated");
    Ok(config)
}

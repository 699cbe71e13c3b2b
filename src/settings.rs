use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::ConsoleError;

/// Console preferences remembered between launches.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PersistentSettings {
    pub backend_url: Option<String>,
    pub default_engine: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings(path: &Path) -> PersistentSettings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings at {:?}: {}", path, e);
            PersistentSettings::default()
        }),
        Err(_) => PersistentSettings::default(),
    }
}

pub fn save_settings(path: &Path, settings: &PersistentSettings) -> Result<(), ConsoleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ConsoleError::InvalidRequest(format!("Failed to serialize settings: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

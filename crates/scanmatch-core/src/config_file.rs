use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::barcode::Symbology;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: Option<StorageConfig>,
    pub scanner: Option<ScannerSection>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage bucket holding the documents (e.g. "myapp.appspot.com").
    pub bucket: Option<String>,
    /// Object-key prefix to list under. Default: "pdfs/".
    pub prefix: Option<String>,
    pub list_retries: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerSection {
    /// Symbol families to decode. Absent means all supported families.
    pub symbologies: Option<Vec<Symbology>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: Option<bool>,
}

/// Platform config directory path: `<config_dir>/scanmatch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scanmatch").join("config.toml"))
}

/// Load config by cascading CWD `.scanmatch.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".scanmatch.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        storage: Some(StorageConfig {
            bucket: overlay
                .storage
                .as_ref()
                .and_then(|s| s.bucket.clone())
                .or_else(|| base.storage.as_ref().and_then(|s| s.bucket.clone())),
            prefix: overlay
                .storage
                .as_ref()
                .and_then(|s| s.prefix.clone())
                .or_else(|| base.storage.as_ref().and_then(|s| s.prefix.clone())),
            list_retries: overlay
                .storage
                .as_ref()
                .and_then(|s| s.list_retries)
                .or_else(|| base.storage.as_ref().and_then(|s| s.list_retries)),
            request_timeout_secs: overlay
                .storage
                .as_ref()
                .and_then(|s| s.request_timeout_secs)
                .or_else(|| base.storage.as_ref().and_then(|s| s.request_timeout_secs)),
        }),
        scanner: Some(ScannerSection {
            symbologies: overlay
                .scanner
                .as_ref()
                .and_then(|s| s.symbologies.clone())
                .or_else(|| base.scanner.as_ref().and_then(|s| s.symbologies.clone())),
        }),
        display: Some(DisplayConfig {
            color: overlay
                .display
                .as_ref()
                .and_then(|d| d.color)
                .or_else(|| base.display.as_ref().and_then(|d| d.color)),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Save a config to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &ConfigFile, path: &std::path::Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(())
}

use crate::output::MapMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration, loaded from `cssweld.toml`. Every field is
/// optional; command-line flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeldConfig {
    /// Glob patterns of entry files.
    pub patterns: Option<Vec<String>>,
    /// Output CSS file.
    pub out: Option<PathBuf>,
    /// Compositions JSON file.
    pub json: Option<PathBuf>,
    /// Source map mode: "off", "separate", or "inline".
    pub map: Option<String>,
    /// Working directory for resolution and relative reporting.
    pub dir: Option<PathBuf>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("cssweld.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<WeldConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: WeldConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn parse_map_mode(value: &str) -> anyhow::Result<MapMode> {
    match value {
        "off" => Ok(MapMode::Off),
        "separate" => Ok(MapMode::Separate),
        "inline" => Ok(MapMode::Inline),
        other => anyhow::bail!("unknown map mode {:?} (expected off, separate, or inline)", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: WeldConfig = toml::from_str(
            r#"
            patterns = ["css/**/*.css"]
            out = "dist/bundle.css"
            json = "dist/exports.json"
            map = "inline"
            dir = "."
            "#,
        )
        .unwrap();

        assert_eq!(config.patterns.unwrap(), vec!["css/**/*.css".to_string()]);
        assert_eq!(config.out.unwrap(), PathBuf::from("dist/bundle.css"));
        assert_eq!(config.map.as_deref(), Some("inline"));
    }

    #[test]
    fn empty_config_is_valid() {
        let config: WeldConfig = toml::from_str("").unwrap();
        assert!(config.out.is_none());
        assert!(config.patterns.is_none());
    }

    #[test]
    fn map_mode_values() {
        assert_eq!(parse_map_mode("off").unwrap(), MapMode::Off);
        assert_eq!(parse_map_mode("separate").unwrap(), MapMode::Separate);
        assert_eq!(parse_map_mode("inline").unwrap(), MapMode::Inline);
        assert!(parse_map_mode("bogus").is_err());
    }

    #[test]
    fn missing_file_loads_as_none() {
        let loaded = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap();
        assert!(loaded.is_none());
    }
}

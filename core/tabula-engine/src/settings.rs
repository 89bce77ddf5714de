//! Engine settings, read from a `tabula.toml` file when one is given and
//! applied to every table built with them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to do when two configured plugins declare the same feature.
///
/// Resolution is always first-configured-wins; this only controls how
/// loudly the overlap is reported when the plugin list is validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureAmbiguity {
    /// Accept silently.
    Allow,
    #[default]
    /// Log a warning naming every provider.
    Warn,
    /// Reject the plugin list.
    Deny,
}

/// Settings shared by all tables built from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub feature_ambiguity: FeatureAmbiguity,
    /// Directory for JSON preference files of tables that name a
    /// preferences key without supplying their own adapter.
    #[serde(default)]
    pub preferences_dir: Option<PathBuf>,
}

impl EngineSettings {
    /// Loads settings from `path` if it exists.
    /// Falls back to defaults with a warning on read or parse errors.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => {
                    info!("Loaded engine settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!(
                        "Failed to parse settings file {:?}: {}. Falling back to defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parses the `[engine]` section of a settings document.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        Ok(toml::from_str::<SettingsFile>(contents)?.engine)
    }
}

/// Raw TOML structure matching the settings file format.
#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default)]
    engine: EngineSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_warn_on_ambiguity() {
        let settings = EngineSettings::default();
        assert_eq!(settings.feature_ambiguity, FeatureAmbiguity::Warn);
        assert!(settings.preferences_dir.is_none());
    }

    #[test]
    fn parse_engine_section() {
        let toml_str = r#"
[engine]
feature_ambiguity = "deny"
preferences_dir = "/var/lib/tabula/prefs"
"#;
        let settings = EngineSettings::parse(toml_str).unwrap();
        assert_eq!(settings.feature_ambiguity, FeatureAmbiguity::Deny);
        assert_eq!(
            settings.preferences_dir.as_deref(),
            Some(Path::new("/var/lib/tabula/prefs"))
        );
    }

    #[test]
    fn missing_section_is_default() {
        assert_eq!(EngineSettings::parse("").unwrap(), EngineSettings::default());
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EngineSettings::load_from(dir.path().join("nope.toml"));
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn load_from_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabula.toml");
        std::fs::write(&path, "[engine]\nfeature_ambiguity = 7\n").unwrap();
        assert_eq!(EngineSettings::load_from(&path), EngineSettings::default());
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabula.toml");
        std::fs::write(&path, "[engine]\nfeature_ambiguity = \"allow\"\n").unwrap();
        assert_eq!(
            EngineSettings::load_from(&path).feature_ambiguity,
            FeatureAmbiguity::Allow
        );
    }
}

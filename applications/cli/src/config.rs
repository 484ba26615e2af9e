//! Layered settings: defaults, TOML file, `MUSICMAN_` environment
use anyhow::{Context, Result};
use musicman_library::TranscodeSettings;
use musicman_metadata::ContainerFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "music-man.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub transcode: TranscodeSettings,

    #[serde(default)]
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibrarySettings {
    /// Formats scanned when `--ext` is not given
    #[serde(default = "default_extensions")]
    pub extensions: Vec<ContainerFormat>,

    /// Formats probed in the reference library when `--match-ext` is not given
    #[serde(default = "default_extensions")]
    pub match_extensions: Vec<ContainerFormat>,

    #[serde(default)]
    pub follow_links: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            match_extensions: default_extensions(),
            follow_links: false,
        }
    }
}

fn default_extensions() -> Vec<ContainerFormat> {
    ContainerFormat::ALL.to_vec()
}

impl Settings {
    /// Load settings from `path` (required to exist) or from
    /// `music-man.toml` when present, then from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                debug!("Loading settings from {:?}", path);
                builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    debug!("Loading settings from {:?}", default_path);
                    builder = builder.add_source(config::File::from(default_path));
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                }
            }
        }

        // MUSICMAN_TRANSCODE__MP3_QUALITY=2, MUSICMAN_LIBRARY__EXTENSIONS=flac,mp3
        builder = builder.add_source(
            config::Environment::with_prefix("MUSICMAN")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("library.extensions")
                .with_list_parse_key("library.match_extensions")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.library.extensions.is_empty() {
            anyhow::bail!("library.extensions must name at least one format");
        }
        if self.library.match_extensions.is_empty() {
            anyhow::bail!("library.match_extensions must name at least one format");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.transcode.mp3_quality, 1);
        assert_eq!(settings.transcode.ogg_quality, 6);
        assert_eq!(settings.library.extensions.len(), 3);
        assert!(!settings.library.follow_links);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("music-man.toml");
        fs::write(
            &path,
            r#"
[transcode]
lame_path = "/opt/lame/bin/lame"
mp3_quality = 3

[library]
extensions = ["flac"]
follow_links = true
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.transcode.lame_path, PathBuf::from("/opt/lame/bin/lame"));
        assert_eq!(settings.transcode.mp3_quality, 3);
        assert_eq!(settings.transcode.ogg_quality, 6);
        assert_eq!(settings.transcode.flac_path, PathBuf::from("flac"));
        assert_eq!(settings.library.extensions, vec![ContainerFormat::Flac]);
        assert_eq!(settings.library.match_extensions.len(), 3);
        assert!(settings.library.follow_links);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Settings::load(Some(&temp_dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_empty_extension_list_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("music-man.toml");
        fs::write(&path, "[library]\nextensions = []\n").unwrap();

        assert!(Settings::load(Some(&path)).is_err());
    }
}

//! Persistent export settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::util::{Error, Result};

/// Image container written for each exported texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFormat {
    Tga,
    Png,
}

impl TextureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tga => "tga",
            Self::Png => "png",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Tga => image::ImageFormat::Tga,
            Self::Png => image::ImageFormat::Png,
        }
    }

    /// Parse a comma separated list: "tga,png", "none" or "".
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        let mut formats = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let format = match part.to_ascii_lowercase().as_str() {
                "tga" => Self::Tga,
                "png" => Self::Png,
                "none" => continue,
                other => {
                    return Err(Error::InvalidSettings(format!("unknown texture format '{}'", other)))
                }
            };
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }
}

/// Export settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    // What to acquire
    pub export_properties: bool,
    /// Only honoured together with `export_properties`.
    pub export_inventory: bool,
    /// Empty disables texture export.
    pub texture_formats: Vec<TextureFormat>,
    /// When false the modify/copy/transfer check is skipped (avatars are still excluded).
    pub follow_permissions: bool,

    // Scheduling
    pub max_pending_queries: u32,
    pub query_timeout_secs: u64,
    pub retry_batch: u32,
    /// Re-sends before a request is abandoned; 0 retries forever.
    pub max_retries: u32,
    pub linksets_per_tick: u32,

    // Output
    pub write_snapshot: bool,
    pub compress_snapshot: bool,
    pub generator: String,
    pub platform: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            export_properties: true,
            export_inventory: true,
            texture_formats: vec![TextureFormat::Tga],
            follow_permissions: true,
            max_pending_queries: 200,
            query_timeout_secs: 10,
            retry_batch: 50,
            max_retries: 40,
            linksets_per_tick: 1,
            write_snapshot: false,
            compress_snapshot: false,
            generator: default_generator(),
            platform: "Second Life".to_string(),
        }
    }
}

fn default_generator() -> String {
    format!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("PRIMEXPORT_BUILD_DATE")
    )
}

impl ExportSettings {
    /// Get settings file path
    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("primexport");
            std::fs::create_dir_all(&p).ok();
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the user config directory, falling back to defaults.
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|s| serde_json::from_str::<Self>(&s).ok())
            .unwrap_or_default()
            .validate()
    }

    /// Save settings to the user config directory.
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = std::fs::write(path, json);
            }
        }
    }

    /// Load from an explicit file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        Ok(settings.validate())
    }

    /// Write to an explicit file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Clamp values that would stall or flood a job.
    pub fn validate(mut self) -> Self {
        // One node may need a property and an inventory query.
        self.max_pending_queries = self.max_pending_queries.max(2);
        self.retry_batch = self.retry_batch.max(1);
        self.linksets_per_tick = self.linksets_per_tick.max(1);
        self.query_timeout_secs = self.query_timeout_secs.max(1);
        self
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Inventory requests ride on property requests.
    #[inline]
    pub fn wants_inventory(&self) -> bool {
        self.export_properties && self.export_inventory
    }

    #[inline]
    pub fn wants_textures(&self) -> bool {
        !self.texture_formats.is_empty()
    }

    /// Extension used for `image_file` references in the document.
    pub fn image_extension(&self) -> &'static str {
        self.texture_formats.first().map_or("tga", |f| f.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_list() {
        assert_eq!(TextureFormat::parse_list("tga, PNG,tga").unwrap(), vec![TextureFormat::Tga, TextureFormat::Png]);
        assert!(TextureFormat::parse_list("none").unwrap().is_empty());
        assert!(TextureFormat::parse_list("j2c").is_err());
    }

    #[test]
    fn test_validated_clamps() {
        let s = ExportSettings {
            max_pending_queries: 0,
            retry_batch: 0,
            linksets_per_tick: 0,
            query_timeout_secs: 0,
            ..Default::default()
        }
        .validate();
        assert_eq!(s.max_pending_queries, 2);
        assert_eq!(s.retry_batch, 1);
        assert_eq!(s.linksets_per_tick, 1);
        assert_eq!(s.query_timeout_secs, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s: ExportSettings = serde_json::from_str(r#"{ "export_inventory": false, "texture_formats": ["png"] }"#).unwrap();
        assert!(s.export_properties);
        assert!(!s.wants_inventory());
        assert_eq!(s.image_extension(), "png");
        assert_eq!(s.max_pending_queries, 200);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = ExportSettings { write_snapshot: true, retry_batch: 7, ..Default::default() };
        s.to_file(&path).unwrap();
        assert_eq!(ExportSettings::from_file(&path).unwrap(), s);
    }
}

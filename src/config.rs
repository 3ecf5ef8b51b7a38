use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use image::Rgba;
use serde::de::Deserializer;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::avatar::{AvatarStyle, Background, FontSpec, Frame};
use crate::error::{Error, Result};
use crate::normalize::Normalizer;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "contactbook";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File the configuration was read from, `None` when running on defaults.
    pub config_path: Option<PathBuf>,
    /// vdir directory or single `.vcf` file to read contacts from.
    pub source: Option<PathBuf>,
    /// Create `source` as an empty vdir when it does not exist yet.
    pub create_source: bool,
    pub phone_region: Option<String>,
    pub avatar: AvatarConfig,
}

impl Config {
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.avatar.style(), self.phone_region.clone())
    }
}

// =============================================================================
// Avatar Configuration
// =============================================================================

/// Look of the initials avatar generated for contacts without a photo
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarConfig {
    /// Side of the square avatar in logical units
    pub side: u32,
    pub font_size: f32,
    pub bold: bool,
    /// Pixels per logical unit
    pub scale: u32,
    pub text_color: RgbColor,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            side: 100,
            font_size: 30.0,
            bold: true,
            scale: 1,
            text_color: RgbColor::new(255, 255, 255),
        }
    }
}

impl AvatarConfig {
    pub fn validate(&self) -> Result<()> {
        if self.side == 0 {
            return Err(Error::Config("avatar.side must be greater than zero".into()));
        }
        if self.scale == 0 {
            return Err(Error::Config("avatar.scale must be greater than zero".into()));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(Error::Config("avatar.font_size must be a positive number".into()));
        }
        // Both are multiplied by `scale`, so the glyph fits the frame either way.
        if self.font_size > self.side as f32 {
            return Err(Error::Config(format!(
                "avatar.font_size ({}) must not exceed avatar.side ({})",
                self.font_size, self.side
            )));
        }
        Ok(())
    }

    pub fn style(&self) -> AvatarStyle {
        let font = if self.bold {
            FontSpec::bold(self.font_size)
        } else {
            FontSpec::regular(self.font_size)
        };
        AvatarStyle {
            font,
            text_color: self.text_color.to_rgba(),
            background: Background::Random,
            frame: Frame::square(self.side),
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// =============================================================================
// File Deserialization
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    source: Option<PathBuf>,
    create_source: bool,
    phone_region: Option<String>,
    avatar: AvatarFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct AvatarFile {
    side: u32,
    font_size: f32,
    bold: bool,
    scale: u32,
    text_color: RgbColor,
}

impl Default for AvatarFile {
    fn default() -> Self {
        let defaults = AvatarConfig::default();
        Self {
            side: defaults.side,
            font_size: defaults.font_size,
            bold: defaults.bold,
            scale: defaults.scale,
            text_color: defaults.text_color,
        }
    }
}

impl From<AvatarFile> for AvatarConfig {
    fn from(file: AvatarFile) -> Self {
        Self {
            side: file.side,
            font_size: file.font_size,
            bold: file.bold,
            scale: file.scale,
            text_color: file.text_color,
        }
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new()
        .ok_or_else(|| Error::Config("unable to determine base directories".into()))?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration.
///
/// An explicitly given path must exist. Without one, the per-user config
/// file is used when present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "configuration file not found at {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                debug!("no configuration at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)?;
    let mut config = parse_str(&raw)?;
    config.config_path = Some(path);
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse_str(raw: &str) -> Result<Config> {
    let value: toml::Value =
        toml::from_str(raw).map_err(|err| Error::Config(format!("invalid TOML: {err}")))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .map_err(|err| Error::Config(format!("failed to deserialize config: {err}")))?;

    let phone_region = cfg_file
        .phone_region
        .as_ref()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_ascii_uppercase());

    let avatar: AvatarConfig = cfg_file.avatar.into();
    avatar.validate()?;

    Ok(Config {
        config_path: None,
        source: cfg_file.source.as_deref().map(expand_tilde),
        create_source: cfg_file.create_source,
        phone_region,
        avatar,
    })
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["source", "create_source", "phone_region", "avatar"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            warn!("unknown configuration key `{}`", key);
        }
    }

    if let Some(avatar) = table.get("avatar").and_then(toml::Value::as_table) {
        let known = HashSet::from(["side", "font_size", "bold", "scale", "text_color"]);
        for key in avatar.keys() {
            if !known.contains(key.as_str()) {
                warn!("unknown configuration key `avatar.{}`", key);
            }
        }
    }
}

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_SAMPLES_PER_PIXEL: u32 = 10;
pub const DEFAULT_SAMPLES_PER_PASS: u32 = 1;
pub const DEFAULT_MAX_DEPTH: u32 = 50;

/// Render settings file.
///
/// ```toml
/// version = 1
/// time_limit = "2m"
///
/// [image]
/// resolution = "1080p"
///
/// [sampling]
/// samples_per_pixel = 100
/// samples_per_pass = 4
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    pub version: u32,
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_limit: Option<Duration>,
    #[serde(default)]
    pub image: ImageSettings,
    #[serde(default)]
    pub sampling: SamplingSettings,
    #[serde(default)]
    pub scene: SceneSettings,
    #[serde(default)]
    pub gpu: GpuSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            time_limit: None,
            image: ImageSettings::default(),
            sampling: SamplingSettings::default(),
            scene: SceneSettings::default(),
            gpu: GpuSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

/// Either an explicit `width`/`height` pair or a 16:9 `resolution` preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SamplingSettings {
    #[serde(default = "default_samples_per_pixel")]
    pub samples_per_pixel: u32,
    #[serde(default = "default_samples_per_pass")]
    pub samples_per_pass: u32,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            samples_per_pixel: DEFAULT_SAMPLES_PER_PIXEL,
            samples_per_pass: DEFAULT_SAMPLES_PER_PASS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SceneSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    #[default]
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorySetting {
    #[default]
    Balanced,
    Performance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GpuSettings {
    #[serde(default)]
    pub power: PowerSetting,
    #[serde(default)]
    pub memory: MemorySetting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// 16:9 preset named by its height, e.g. `1080p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    height: u32,
}

impl Resolution {
    pub const PRESET_HEIGHTS: [u32; 5] = [2160, 1440, 1080, 720, 360];

    pub const DEFAULT: Resolution = Resolution { height: 1080 };

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.height * 16 / 9
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let digits = normalized.strip_suffix('p').unwrap_or(&normalized);
        let height: u32 = digits
            .parse()
            .map_err(|_| format!("invalid resolution '{raw}'; expected e.g. 1080p"))?;
        if !Self::PRESET_HEIGHTS.contains(&height) {
            return Err(format!(
                "unsupported resolution '{raw}'; choose one of 2160p, 1440p, 1080p, 720p, 360p"
            ));
        }
        Ok(Self { height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height)
    }
}

fn default_samples_per_pixel() -> u32 {
    DEFAULT_SAMPLES_PER_PIXEL
}

fn default_samples_per_pass() -> u32 {
    DEFAULT_SAMPLES_PER_PASS
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }
        None => serializer.serialize_none(),
    }
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl RenderConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: RenderConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Image size in pixels. Explicit dimensions win over the preset.
    pub fn image_size(&self) -> (u32, u32) {
        match (self.image.width, self.image.height) {
            (Some(width), Some(height)) => (width, height),
            _ => self.image.resolution.unwrap_or_default().size(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        let image = &self.image;
        match (image.width, image.height) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "image width and height must be given together".into(),
                ));
            }
            (Some(width), Some(height)) => {
                if width == 0 || height == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "image size must be positive, got {width}x{height}"
                    )));
                }
                if image.resolution.is_some() {
                    return Err(ConfigError::Invalid(
                        "image resolution cannot be combined with width/height".into(),
                    ));
                }
            }
            (None, None) => {}
        }

        let sampling = &self.sampling;
        for (name, value) in [
            ("samples_per_pixel", sampling.samples_per_pixel),
            ("samples_per_pass", sampling.samples_per_pass),
            ("max_depth", sampling.max_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "sampling.{name} must be greater than zero"
                )));
            }
        }

        if let Some(limit) = self.time_limit {
            if limit.is_zero() {
                return Err(ConfigError::Invalid(
                    "time_limit must be greater than zero".into(),
                ));
            }
        }

        if let Some(path) = &self.output.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("output.path must not be empty".into()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CONFIG: &str = r#"
version = 1
time_limit = "90s"

[image]
width = 800
height = 450

[sampling]
samples_per_pixel = 100
samples_per_pass = 4
max_depth = 12

[scene]
seed = 42

[gpu]
power = "low"
memory = "performance"

[output]
path = "render.png"
"#;

    #[test]
    fn parses_full_document() {
        let config = RenderConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.image_size(), (800, 450));
        assert_eq!(config.sampling.samples_per_pixel, 100);
        assert_eq!(config.sampling.samples_per_pass, 4);
        assert_eq!(config.sampling.max_depth, 12);
        assert_eq!(config.scene.seed, Some(42));
        assert_eq!(config.gpu.power, PowerSetting::Low);
        assert_eq!(config.gpu.memory, MemorySetting::Performance);
        assert_eq!(config.output.path, Some(PathBuf::from("render.png")));
        assert_eq!(config.time_limit, Some(Duration::from_secs(90)));
    }

    #[test]
    fn minimal_document_uses_defaults() {
        let config = RenderConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.image_size(), (1920, 1080));
        assert_eq!(config.sampling.samples_per_pixel, 10);
        assert_eq!(config.sampling.samples_per_pass, 1);
        assert_eq!(config.sampling.max_depth, 50);
        assert_eq!(config.gpu.power, PowerSetting::High);
        assert!(config.time_limit.is_none());
    }

    #[test]
    fn resolution_presets_are_sixteen_by_nine() {
        let sizes: Vec<(u32, u32)> = ["2160p", "1440p", "1080p", "720p", "360"]
            .iter()
            .map(|raw| raw.parse::<Resolution>().unwrap().size())
            .collect();
        assert_eq!(
            sizes,
            vec![(3840, 2160), (2560, 1440), (1920, 1080), (1280, 720), (640, 360)]
        );
        assert!("999p".parse::<Resolution>().is_err());
        assert!("tall".parse::<Resolution>().is_err());

        let config = RenderConfig::from_toml_str(
            r#"
version = 1
[image]
resolution = "720p"
"#,
        )
        .unwrap();
        assert_eq!(config.image_size(), (1280, 720));
    }

    #[test]
    fn numeric_time_limit_is_seconds() {
        let config = RenderConfig::from_toml_str("version = 1\ntime_limit = 5").unwrap();
        assert_eq!(config.time_limit, Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_zero_counts() {
        let err = RenderConfig::from_toml_str(
            r#"
version = 1
[sampling]
samples_per_pass = 0
"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid(ref message) if message.contains("samples_per_pass"))
        );
    }

    #[test]
    fn rejects_half_specified_or_conflicting_image_size() {
        let half = RenderConfig::from_toml_str("version = 1\n[image]\nwidth = 10\n");
        assert!(matches!(half, Err(ConfigError::Invalid(_))));

        let both = RenderConfig::from_toml_str(
            "version = 1\n[image]\nwidth = 10\nheight = 10\nresolution = \"720p\"\n",
        );
        assert!(matches!(both, Err(ConfigError::Invalid(_))));

        let zero = RenderConfig::from_toml_str("version = 1\n[image]\nwidth = 0\nheight = 10\n");
        assert!(matches!(zero, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_version_and_bad_values() {
        assert!(matches!(
            RenderConfig::from_toml_str("version = 2"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("version = 1\n[gpu]\npower = \"turbo\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("version = 1\n[image]\nresolution = \"480p\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn serialised_config_parses_back() {
        let config = RenderConfig::from_toml_str(CONFIG).unwrap();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("time_limit = \"1m 30s\""));
        assert_eq!(RenderConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = RenderConfig::load(file.path()).unwrap();
        assert_eq!(config.scene.seed, Some(42));

        let missing = RenderConfig::load(Path::new("/nonexistent/tracer/config.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}

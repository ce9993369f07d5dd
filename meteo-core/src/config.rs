use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Geocoding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    /// Nominatim rejects requests without an identifying user agent.
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("meteo-bot/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self { base_url: "https://api.open-meteo.com".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 15 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Where chart images are rendered and which font labels them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Parent directory for temporary chart files; the OS temp dir when unset.
    pub dir: Option<PathBuf>,
    /// TrueType font used for titles and axis labels.
    pub font_path: Option<PathBuf>,
}

impl ChartConfig {
    pub fn dir_or_temp(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(env::temp_dir)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [geocoding]
/// base_url = "https://nominatim.openstreetmap.org"
///
/// [http]
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geocoding: GeocodingConfig,
    pub weather: WeatherConfig,
    pub http: HttpConfig,
    pub chart: ChartConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::from_toml_file(&path)
    }

    pub fn from_toml_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo-bot", "meteo-bot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Bot token from the environment. Call `dotenvy::dotenv()` first to honour `.env`.
    pub fn telegram_token() -> Result<String> {
        env::var(TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No Telegram token configured.\n\
                     Hint: export {TOKEN_ENV}=<token> or put it in a .env file."
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_services() {
        let cfg = Config::default();

        assert!(cfg.geocoding.base_url.contains("nominatim"));
        assert!(cfg.weather.base_url.contains("open-meteo"));
        assert!(cfg.geocoding.user_agent.starts_with("meteo-bot/"));
        assert_eq!(cfg.http.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [weather]
            base_url = "http://localhost:9000"

            [chart]
            dir = "/var/tmp/charts"
            "#,
        )
        .expect("partial config must parse");

        assert_eq!(cfg.weather.base_url, "http://localhost:9000");
        assert_eq!(cfg.chart.dir_or_temp(), PathBuf::from("/var/tmp/charts"));
        assert!(cfg.chart.font_path.is_none());
        assert!(cfg.geocoding.base_url.contains("nominatim"));
        assert_eq!(cfg.http.timeout_secs, 15);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let http = HttpConfig { timeout_secs: 0 };
        assert_eq!(http.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut cfg = Config::default();
        cfg.http.timeout_secs = 3;

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&text).expect("parse");

        assert_eq!(parsed.http.timeout_secs, 3);
        assert_eq!(parsed.weather.base_url, cfg.weather.base_url);
    }
}

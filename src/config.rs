use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;

#[derive(Deserialize, Clone)]
pub struct Station {
    pub location: String,
    pub point_code: String,
    pub monitor_name: String,
    pub region: String,
    pub prefecture_no: String,
    pub prefecture: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct Sources {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct Proxy {
    pub enabled: bool,
    pub api_url: String,
    pub api_key_env: String,
}

#[derive(Deserialize, Clone)]
pub struct Files {
    pub data_dir: String,
    pub snapshot_file: String,
    pub page_file: String,
}

#[derive(Deserialize, Clone)]
pub struct Dashboard {
    pub refresh_minutes: u64,
    pub retry_seconds: u64,
}

#[derive(Deserialize, Clone)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub station: Station,
    pub sources: Sources,
    pub proxy: Proxy,
    pub files: Files,
    pub dashboard: Dashboard,
    pub general: General,
}

impl Files {
    /// Returns the full path of a file placed in the data directory
    ///
    /// # Arguments
    ///
    /// * 'name' - file name
    pub fn data_path(&self, name: &str) -> String {
        format!("{}{}", self.data_dir, name)
    }
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {

    let toml = fs::read_to_string(config_path)?;
    let mut config: Config = toml::from_str(&toml)?;

    if config.station.point_code.is_empty() {
        return Err(ConfigError::from("station point code must not be empty"));
    }
    if !config.files.data_dir.is_empty() && !config.files.data_dir.ends_with('/') {
        config.files.data_dir.push('/');
    }
    if config.dashboard.refresh_minutes == 0 {
        return Err(ConfigError::from("dashboard refresh interval must be at least one minute"));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
[station]
location = "甲府"
point_code = "61286"
monitor_name = "Kofu"
region = "07"
prefecture_no = "61"
prefecture = "yamanashi"

[sources]
base_url = "https://www.wbgt.env.go.jp"
timeout_secs = 30

[proxy]
enabled = false
api_url = "https://app.scrapingbee.com/api/v1/"
api_key_env = "SCRAPING_BEE_API_KEY"

[files]
data_dir = "data"
snapshot_file = "latest_data.json"
page_file = "index.html"

[dashboard]
refresh_minutes = 30
retry_seconds = 60

[general]
log_path = "log/"
log_level = "Info"
log_to_stdout = true
"#;

    #[test]
    fn loads_and_normalizes_data_dir() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.station.point_code, "61286");
        assert_eq!(config.station.prefecture.as_deref(), Some("yamanashi"));
        assert_eq!(config.files.data_dir, "data/");
        assert_eq!(config.files.data_path("actual.csv"), "data/actual.csv");
        assert_eq!(config.general.log_level, LevelFilter::Info);
    }

    #[test]
    fn rejects_zero_refresh_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.replace("refresh_minutes = 30", "refresh_minutes = 0").as_bytes()).unwrap();

        assert!(load_config(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        assert!(matches!(load_config("/nonexistent/wbgt.toml"), Err(ConfigError(_))));
    }
}

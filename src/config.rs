use std::{net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

fn default_web_base() -> String {
    "/".to_string()
}

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub prometheus_bind: Option<SocketAddr>,
    pub web_bind: SocketAddr,
    #[serde(default = "default_web_base")]
    pub web_base: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    pub gallery: GalleryConfig,
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

fn default_account_id() -> String {
    env_or_empty("ACCOUNT_ID")
}

fn default_access_key_id() -> String {
    env_or_empty("ACCESS_KEY_ID")
}

fn default_secret_access_key() -> String {
    env_or_empty("SECRET_ACCESS_KEY")
}

fn default_bucket_name() -> String {
    env_or_empty("BUCKET_NAME")
}

fn default_region() -> String {
    "auto".to_string()
}

// credentials fall back to the environment so they can stay out of the yaml
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    #[serde(default = "default_account_id")]
    pub account_id: String,
    #[serde(default = "default_access_key_id")]
    pub access_key_id: String,
    #[serde(default = "default_secret_access_key", skip_serializing)]
    pub secret_access_key: String,
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,
    /// Overrides the R2 endpoint derived from `account_id` (MinIO, AWS, ...).
    pub endpoint: Option<Url>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_id: default_account_id(),
            access_key_id: default_access_key_id(),
            secret_access_key: default_secret_access_key(),
            bucket_name: default_bucket_name(),
            endpoint: None,
            region: default_region(),
            force_path_style: false,
        }
    }
}

impl StorageConfig {
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.to_string(),
            None => format!("https://{}.r2.cloudflarestorage.com", self.account_id),
        }
    }
}

/// Presigned requests cannot outlive seven days.
pub const MAX_SIGNED_URL_MINUTES: u64 = 7 * 24 * 60;

fn default_signed_url_minutes() -> u64 {
    15
}

fn default_max_quantity() -> usize {
    100
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct UploadConfig {
    #[serde(default = "default_signed_url_minutes")]
    pub signed_url_minutes: u64,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: usize,
}

impl UploadConfig {
    pub fn signed_url_lifetime(&self) -> Duration {
        Duration::from_secs(self.signed_url_minutes.min(MAX_SIGNED_URL_MINUTES) * 60)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            signed_url_minutes: default_signed_url_minutes(),
            max_quantity: default_max_quantity(),
        }
    }
}

fn default_columns() -> usize {
    3
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GalleryConfig {
    pub content_dir: PathBuf,
    #[serde(default = "default_columns")]
    pub columns: usize,
}

lazy_static::lazy_static! {
    static ref CONFIG_PATH: PathBuf = {
        let var = std::env::var("PHOTO_EVENTS_CONFIG").unwrap_or_default();
        if var.is_empty() {
            "./config.yaml".parse().unwrap()
        } else {
            var.parse().expect("invalid config path")
        }
    };
    pub static ref CONFIG: Config = {
        serde_yaml::from_str(&std::fs::read_to_string(&*CONFIG_PATH).expect("failed to read config file")).expect("failed to parse config file")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
web_bind: 127.0.0.1:8080
storage:
  account_id: abc123
  access_key_id: key
  secret_access_key: secret
  bucket_name: photos
gallery:
  content_dir: ./content/events
"#,
        )
        .unwrap();
        assert_eq!(config.web_base, "/");
        assert_eq!(config.upload.signed_url_minutes, 15);
        assert_eq!(config.upload.max_quantity, 100);
        assert_eq!(config.gallery.columns, 3);
        assert_eq!(config.storage.region, "auto");
        assert_eq!(
            config.storage.endpoint(),
            "https://abc123.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn signed_url_lifetime_is_capped() {
        let upload: UploadConfig = serde_yaml::from_str("signed_url_minutes: 30\n").unwrap();
        assert_eq!(upload.signed_url_lifetime(), Duration::from_secs(30 * 60));
        assert_eq!(upload.max_quantity, 100);

        let upload = UploadConfig {
            signed_url_minutes: u64::MAX,
            max_quantity: 1,
        };
        assert_eq!(upload.signed_url_lifetime(), Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn explicit_endpoint_wins() {
        let storage: StorageConfig = serde_yaml::from_str(
            r#"
account_id: abc123
access_key_id: key
secret_access_key: secret
bucket_name: photos
endpoint: http://127.0.0.1:9000/
force_path_style: true
"#,
        )
        .unwrap();
        assert_eq!(storage.endpoint(), "http://127.0.0.1:9000/");
        assert!(storage.force_path_style);
    }
}

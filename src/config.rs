use crate::error::ConfigurationError;
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("classhub".to_string())
}

fn default_client_host() -> String {
    env::var("CLIENT_HOST").unwrap_or("http://localhost".to_string())
}

fn default_client_port() -> u16 {
    env::var("CLIENT_PORT")
        .ok()
        .and_then(|it| it.parse().ok())
        .unwrap_or(3000)
}

fn default_invite_token_ttl_hours() -> i64 {
    env::var("INVITE_TOKEN_TTL_HOURS")
        .ok()
        .and_then(|it| it.parse().ok())
        .unwrap_or(24)
}

fn default_mail_host() -> String {
    env::var("MAIL_HOST").unwrap_or("localhost".to_string())
}

fn default_mail_port() -> u16 {
    env::var("MAIL_PORT")
        .ok()
        .and_then(|it| it.parse().ok())
        .unwrap_or(587)
}

fn default_mail_username() -> Option<String> {
    env::var("MAIL_USERNAME").ok()
}

fn default_mail_password() -> Option<String> {
    env::var("MAIL_PASSWORD").ok()
}

fn default_mail_from() -> String {
    env::var("MAIL_FROM").unwrap_or("ClassHub <no-reply@classhub.local>".to_string())
}

fn default_mail_use_tls() -> bool {
    env::var("MAIL_USE_TLS")
        .ok()
        .and_then(|it| it.parse().ok())
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    /// Host and port of the web client; invite links point at it.
    #[serde(default = "default_client_host")]
    pub client_host: String,
    #[serde(default = "default_client_port")]
    pub client_port: u16,

    #[serde(default = "default_invite_token_ttl_hours")]
    pub invite_token_ttl_hours: i64,

    #[serde(default = "default_mail_host")]
    pub mail_host: String,
    #[serde(default = "default_mail_port")]
    pub mail_port: u16,
    #[serde(default = "default_mail_username")]
    pub mail_username: Option<String>,
    #[serde(default = "default_mail_password")]
    pub mail_password: Option<String>,
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
    #[serde(default = "default_mail_use_tls")]
    pub mail_use_tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            client_host: default_client_host(),
            client_port: default_client_port(),
            invite_token_ttl_hours: default_invite_token_ttl_hours(),
            mail_host: default_mail_host(),
            mail_port: default_mail_port(),
            mail_username: default_mail_username(),
            mail_password: default_mail_password(),
            mail_from: default_mail_from(),
            mail_use_tls: default_mail_use_tls(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

fn find_first_subpath<P: AsRef<Path>, F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    subpaths: &[P],
    search: F,
) -> Option<PathBuf> {
    subpaths
        .iter()
        .map(|it| root.as_ref().join(it))
        .find(|it: &PathBuf| search(&it))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(config_file)?;
        let config = serde_yaml::from_reader(BufReader::new(file))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::security::PasswordGate;

pub const CONFIG_FILE: &str = "pdf-scraper.toml";
pub const ENV_PREFIX: &str = "PDF_SCRAPER_";

pub const DEFAULT_COLUMNS: &[&str] = &[
    "Phase",
    "Course",
    "College_Name",
    "College_Code",
    "Type",
    "SM",
    "EZ",
    "MU",
    "LA",
    "BH",
    "DV",
    "VK",
    "BX",
    "KN",
    "KU",
    "SC",
    "ST",
    "EW",
];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    pub password: Option<String>,
    /// Hex SHA-256 of the password; takes precedence over `password`.
    pub password_sha256: Option<String>,
    #[validate(length(min = 1))]
    pub cookie_name: String,
    #[validate(range(min = 60))]
    pub session_max_age_secs: i64,
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password: None,
            password_sha256: None,
            cookie_name: "auth-token".to_string(),
            session_max_age_secs: 60 * 60 * 24 * 7,
            secure_cookie: false,
        }
    }
}

impl AuthConfig {
    pub fn password_gate(&self) -> Result<PasswordGate> {
        match &self.password_sha256 {
            Some(digest) if !digest.trim().is_empty() => PasswordGate::from_hex_digest(digest),
            _ => Ok(PasswordGate::from_password(self.password.as_deref())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtractionConfig {
    /// Columns the model is asked to produce, in order.
    #[validate(length(min = 1))]
    pub columns: Vec<String>,
    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub auth: AuthConfig,
    #[validate(nested)]
    pub llm: LLMConfig,
    #[validate(nested)]
    pub extraction: ExtractionConfig,
    pub scripts_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            llm: LLMConfig::default(),
            extraction: ExtractionConfig::default(),
            scripts_dir: PathBuf::from("public/scripts"),
        }
    }
}

impl AppConfig {
    /// Defaults, then legacy variables, then the TOML file, then `PDF_SCRAPER_*`.
    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Env::raw().only(&["APP_PASSWORD"]).map(|_| "auth.password".into()))
            .merge(Env::raw().only(&["GOOGLE_API_KEY"]).map(|_| "llm.api_key".into()))
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "llm.api_key".into()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment(Path::new(CONFIG_FILE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.columns.len(), 18);
        assert_eq!(config.auth.cookie_name, "auth-token");
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                scripts_dir = "assets/scripts"

                [server]
                port = 8080

                [extraction]
                columns = ["Name", "Score"]
                "#,
            )?;
            jail.set_env("PDF_SCRAPER_SERVER__PORT", "9090");
            jail.set_env("PDF_SCRAPER_LLM__MODEL", "gemini-test");
            jail.set_env("APP_PASSWORD", "legacy-secret");

            let config = AppConfig::from_figment(AppConfig::figment(Path::new(CONFIG_FILE)))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 9090);
            assert_eq!(config.llm.model, "gemini-test");
            assert_eq!(config.extraction.columns, vec!["Name", "Score"]);
            assert_eq!(config.scripts_dir, PathBuf::from("assets/scripts"));
            assert_eq!(config.auth.password.as_deref(), Some("legacy-secret"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[extraction]\ncolumns = []\n")?;

            let result = AppConfig::from_figment(AppConfig::figment(Path::new(CONFIG_FILE)));
            assert!(result.is_err());
            Ok(())
        });
    }

    #[test]
    fn test_password_digest_takes_precedence() {
        let auth = AuthConfig {
            password: Some("plain".to_string()),
            password_sha256: Some(
                "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7".to_string(),
            ),
            ..AuthConfig::default()
        };

        let gate = auth.password_gate().unwrap();
        assert!(gate.verify("plain").is_err());
        assert!(gate.verify("hunter2").is_ok());
    }
}

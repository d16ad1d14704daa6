use crate::auth::AuthManager;
use crate::storage::DurabilityMode;
use crate::storage::objects::DEFAULT_MAX_UPLOAD_BYTES;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;

/// How the admin password is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminPassword {
    Hash(String),
    Plain(String),
    Missing,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub durability: DurabilityMode,
    pub uploads_dir: PathBuf,
    pub public_url: String,
    pub admin_user: String,
    pub admin_password: AdminPassword,
    pub session_ttl_minutes: i64,
    pub track_stats: bool,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key} must be a boolean (true/false)")),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; missing keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("CVFOLIO_HOST", "0.0.0.0");

        let port = var("CVFOLIO_PORT", "8080")
            .parse::<u16>()
            .context("CVFOLIO_PORT must be a valid u16")?;

        let data_dir = PathBuf::from(var("CVFOLIO_DATA_DIR", "./data"));

        let durability = var("CVFOLIO_DURABILITY", "sync")
            .parse::<DurabilityMode>()
            .map_err(|e| anyhow!("CVFOLIO_DURABILITY: {e}"))?;

        let uploads_dir = lookup("CVFOLIO_UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("uploads"));

        let public_url = var("CVFOLIO_PUBLIC_URL", &format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let admin_user = var("CVFOLIO_ADMIN_USER", "admin");

        let admin_password = match (
            lookup("CVFOLIO_ADMIN_PASSWORD_HASH").filter(|v| !v.trim().is_empty()),
            lookup("CVFOLIO_ADMIN_PASSWORD").filter(|v| !v.is_empty()),
        ) {
            (Some(hash), _) => AdminPassword::Hash(hash.trim().to_string()),
            (None, Some(plain)) => AdminPassword::Plain(plain),
            (None, None) => AdminPassword::Missing,
        };

        let session_ttl_minutes = var("CVFOLIO_SESSION_TTL_MINUTES", "120")
            .parse::<i64>()
            .context("CVFOLIO_SESSION_TTL_MINUTES must be a whole number of minutes")?;
        if session_ttl_minutes <= 0 {
            return Err(anyhow!("CVFOLIO_SESSION_TTL_MINUTES must be positive"));
        }

        let track_stats = parse_bool("CVFOLIO_TRACK_STATS", &var("CVFOLIO_TRACK_STATS", "true"))?;

        let max_upload_bytes = var("CVFOLIO_MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse::<usize>()
            .context("CVFOLIO_MAX_UPLOAD_BYTES must be a valid byte count")?;

        let cors_origin = lookup("CVFOLIO_CORS_ORIGIN").filter(|v| !v.trim().is_empty());

        Ok(Self {
            host,
            port,
            data_dir,
            durability,
            uploads_dir,
            public_url,
            admin_user,
            admin_password,
            session_ttl_minutes,
            track_stats,
            max_upload_bytes,
            cors_origin,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public base URL uploaded files are served from.
    pub fn uploads_url(&self) -> String {
        format!("{}/uploads", self.public_url)
    }

    /// The bcrypt hash the admin password is checked against.
    pub fn admin_password_hash(&self) -> Result<String> {
        match &self.admin_password {
            AdminPassword::Hash(hash) => Ok(hash.clone()),
            AdminPassword::Plain(plain) => {
                AuthManager::hash_password(plain).context("failed to hash CVFOLIO_ADMIN_PASSWORD")
            }
            AdminPassword::Missing => Err(anyhow!(
                "CVFOLIO_ADMIN_PASSWORD_HASH or CVFOLIO_ADMIN_PASSWORD must be set"
            )),
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }
}

use std::path::PathBuf;

use chrono_tz::Tz;
use log::{info, warn};

use crate::error::ImportError;
use crate::import::ImportOptions;
use crate::taxonomy::Taxonomy;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEZONE: &str = "America/Vancouver";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Settings read from the environment at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub admin_password: String,
    pub timezone: Tz,
    /// JSON taxonomy table replacing the built-in one
    pub taxonomy_path: Option<PathBuf>,
    /// Feed used when an ICS import request names no URL
    pub feed_url: Option<String>,
}

impl AppConfig {
    /// Reads `PORT`, `ADMIN_PASSWORD`, `SCHEDULE_TIMEZONE`,
    /// `TOUR_TAXONOMY_PATH` and `ICS_FEED_URL`
    pub fn from_env() -> Result<Self, ImportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ImportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = get("PORT").and_then(|p| p.parse::<u16>().ok()).unwrap_or(DEFAULT_PORT);

        let admin_password = get("ADMIN_PASSWORD").unwrap_or_else(|| {
            warn!("ADMIN_PASSWORD not set, using the default password");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });

        let timezone_name = get("SCHEDULE_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|_| ImportError::Timezone(timezone_name.clone()))?;

        Ok(AppConfig {
            port,
            admin_password,
            timezone,
            taxonomy_path: get("TOUR_TAXONOMY_PATH").map(PathBuf::from),
            feed_url: get("ICS_FEED_URL"),
        })
    }

    /// Loads the configured taxonomy table, or the built-in one
    pub fn load_taxonomy(&self) -> Result<Taxonomy, ImportError> {
        match &self.taxonomy_path {
            Some(path) => {
                info!("Loading tour taxonomy from {}", path.display());
                Taxonomy::from_path(path)
            }
            None => Taxonomy::builtin(),
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::default().with_timezone(self.timezone)
    }
}

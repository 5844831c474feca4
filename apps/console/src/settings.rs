//! Settings for the console front end: defaults, then `dashboard.toml`,
//! then environment overrides. CLI flags win over all of these.

use std::collections::HashMap;

use client_core::DEFAULT_POLL_PERIOD;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub poll_period_secs: u64,
    pub created_by: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            poll_period_secs: DEFAULT_POLL_PERIOD.as_secs(),
            created_by: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = std::fs::read_to_string("dashboard.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("poll_period_secs") {
                if let Ok(parsed) = v.parse() {
                    settings.poll_period_secs = parsed;
                }
            }
            if let Some(v) = file_cfg.get("created_by") {
                settings.created_by = Some(v.clone());
            }
        }
    }

    if let Ok(v) = std::env::var("KPI_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("KPI_POLL_PERIOD_SECS") {
        if let Ok(parsed) = v.parse() {
            settings.poll_period_secs = parsed;
        }
    }
    if let Ok(v) = std::env::var("KPI_CREATED_BY") {
        settings.created_by = Some(v);
    }

    settings
}

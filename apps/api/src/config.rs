use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the CareerPilot REST API (resumes, jobs, matching, applications).
    pub api_url: String,
    /// Where the user is sent to upload a resume.
    pub dashboard_url: String,
    pub resume_id: i64,
    pub settle_delay: Duration,
    /// Extra skill tokens appended to the built-in vocabulary.
    pub extra_skills: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            api_url: env_or("CAREERPILOT_API_URL", "http://localhost:8000"),
            dashboard_url: env_or("DASHBOARD_URL", "http://localhost:3000"),
            resume_id: env_or("CANDIDATE_RESUME_ID", "1")
                .parse::<i64>()
                .context("CANDIDATE_RESUME_ID must be an integer")?,
            settle_delay: Duration::from_millis(
                env_or("SETTLE_DELAY_MS", "5000")
                    .parse::<u64>()
                    .context("SETTLE_DELAY_MS must be a whole number of milliseconds")?,
            ),
            extra_skills: parse_list(&env_or("SKILL_VOCABULARY_EXTRA", "")),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

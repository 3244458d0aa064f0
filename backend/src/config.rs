use std::{fmt::Display, str::FromStr};
use tracing::{info, warn};
use crate::notify::DEFAULT_EVENT_BUFFER;

/// Service settings, read from the deployment's secret store.
#[derive(Debug, Clone)]
pub struct Config {
    admin_token: Option<String>,
    voting_enabled: bool,
    cast_rate_limit: u32,
    cast_rate_window_minutes: i64,
    allowed_origin: String,
    event_buffer: usize,
    trusted_ip_header: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_token: None,
            voting_enabled: false,
            cast_rate_limit: 5,
            cast_rate_window_minutes: 1,
            allowed_origin: "http://localhost".into(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            trusted_ip_header: None,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

impl Config {
    pub fn from_secrets(secrets: &shuttle_runtime::SecretStore) -> Self {
        Self::from_lookup(|key| secrets.get(key))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let admin_token = lookup("ADMIN_TOKEN").filter(|t| !t.trim().is_empty());
        if admin_token.is_none() {
            warn!("ADMIN_TOKEN not set - admin routes will reject every request");
        }

        Self {
            admin_token,
            voting_enabled: parse_or(&lookup, "VOTING_ENABLED", defaults.voting_enabled),
            cast_rate_limit: parse_or(&lookup, "CAST_RATE_LIMIT", defaults.cast_rate_limit),
            cast_rate_window_minutes: parse_or(&lookup, "CAST_RATE_WINDOW_MINUTES", defaults.cast_rate_window_minutes),
            allowed_origin: lookup("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            event_buffer: parse_or(&lookup, "EVENT_BUFFER", defaults.event_buffer),
            trusted_ip_header: lookup("TRUSTED_IP_HEADER")
                .map(|header| header.trim().to_string())
                .filter(|header| !header.is_empty()),
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    pub fn with_cast_rate_limit(mut self, attempts: u32, window_minutes: i64) -> Self {
        self.cast_rate_limit = attempts;
        self.cast_rate_window_minutes = window_minutes;
        self
    }

    pub fn with_trusted_ip_header(mut self, header: impl Into<String>) -> Self {
        self.trusted_ip_header = Some(header.into());
        self
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// Initial value of the voting switch on a fresh database.
    pub fn voting_enabled(&self) -> bool {
        self.voting_enabled
    }

    pub fn cast_rate_limit(&self) -> u32 {
        self.cast_rate_limit
    }

    pub fn cast_rate_window_minutes(&self) -> i64 {
        self.cast_rate_window_minutes
    }

    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }

    /// Header a reverse proxy sets to the client address. Without one, clients
    /// are identified by the socket peer only.
    pub fn trusted_ip_header(&self) -> Option<&str> {
        self.trusted_ip_header.as_deref()
    }
}

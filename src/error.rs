use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(pyconjp_cron::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(pyconjp_cron::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(pyconjp_cron::google_calendar))]
    GoogleCalendar(String),

    #[error("Google Sheets API error: {0}")]
    #[diagnostic(code(pyconjp_cron::google_sheets))]
    GoogleSheets(String),

    #[error("Google OAuth token error: {0}")]
    #[diagnostic(code(pyconjp_cron::token), help("Place a valid token file at GOOGLE_TOKEN_FILE"))]
    Token(String),

    #[error("connpass API error: {0}")]
    #[diagnostic(code(pyconjp_cron::connpass))]
    Connpass(String),

    #[error("{channel} channel error: {message}")]
    #[diagnostic(code(pyconjp_cron::channel))]
    Channel {
        channel: &'static str,
        message: String,
    },

    #[error("Slack API error: {0}")]
    #[diagnostic(code(pyconjp_cron::slack))]
    Slack(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(pyconjp_cron::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(pyconjp_cron::io))]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(pyconjp_cron::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(pyconjp_cron::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(pyconjp_cron::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create Google Sheets errors
pub fn google_sheets_error(message: &str) -> Error {
    Error::GoogleSheets(message.to_string())
}

/// Helper to create token errors
pub fn token_error(message: &str) -> Error {
    Error::Token(message.to_string())
}

/// Helper to create connpass errors
pub fn connpass_error(message: &str) -> Error {
    Error::Connpass(message.to_string())
}

/// Helper to create errors for a notification channel
pub fn channel_error(channel: &'static str, message: &str) -> Error {
    Error::Channel {
        channel,
        message: message.to_string(),
    }
}

/// Helper to create Slack errors
pub fn slack_error(message: &str) -> Error {
    Error::Slack(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

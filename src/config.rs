use crate::error::{config_error, env_error, BotResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::str::FromStr;

/// Default timezone for schedules and calendar entries
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

/// Default range of the notification sheet
pub const DEFAULT_SHEET_RANGE: &str = "messages!A4:H";

/// connpass series polled when none are configured (pyconjp, pyconjp-staff)
pub const DEFAULT_CONNPASS_SERIES: &str = "137,1671";

/// Event titles that never go to the calendar
pub const DEFAULT_EXCLUDED_TITLES: &str = "懇親会,spicy-food部,Meat";

/// Main configuration structure for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google API client ID
    pub google_client_id: String,
    /// Google API client secret
    pub google_client_secret: String,
    /// File holding the authorized user token
    pub google_token_file: String,
    /// Calendar that receives connpass events
    pub google_calendar_id: String,
    /// Spreadsheet with the SNS notification schedule
    pub schedule_sheet_id: String,
    /// A1 range of the schedule rows
    pub schedule_sheet_range: String,
    /// connpass series to mirror into the calendar
    pub connpass_series_ids: Vec<u64>,
    /// Title substrings that exclude an event from the calendar
    pub excluded_titles: Vec<String>,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
    /// Timezone for scheduling
    pub timezone: String,
    /// Locale whose weekday names are used in schedule rows
    pub weekday_locale: String,
    /// Width of the notification firing window, also the tick period
    pub notify_interval_minutes: u32,
    /// Seconds between calendar sync passes
    pub sync_interval_secs: u64,
    /// Suffix appended to every SNS message
    pub sns_hashtag: String,
    /// Twitter user-context bearer token
    pub twitter_bearer_token: Option<String>,
    /// Facebook page that receives posts
    pub fb_page_id: Option<String>,
    /// Facebook page access token
    pub fb_page_access_token: Option<String>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;
        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").map_err(|_| env_error("GOOGLE_CALENDAR_ID"))?;
        let schedule_sheet_id =
            env::var("SCHEDULE_SHEET_ID").map_err(|_| env_error("SCHEDULE_SHEET_ID"))?;

        let google_token_file =
            env::var("GOOGLE_TOKEN_FILE").unwrap_or_else(|_| String::from("token.json"));
        let schedule_sheet_range = env::var("SCHEDULE_SHEET_RANGE")
            .unwrap_or_else(|_| String::from(DEFAULT_SHEET_RANGE));

        let connpass_series_ids = parse_list(
            &env::var("CONNPASS_SERIES_IDS")
                .unwrap_or_else(|_| String::from(DEFAULT_CONNPASS_SERIES)),
        )
        .into_iter()
        .map(|id| {
            id.parse::<u64>()
                .map_err(|_| config_error(&format!("Invalid connpass series id: {}", id)))
        })
        .collect::<BotResult<Vec<_>>>()?;

        let excluded_titles = parse_list(
            &env::var("EXCLUDED_TITLES").unwrap_or_else(|_| String::from(DEFAULT_EXCLUDED_TITLES)),
        );

        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from(DEFAULT_TIMEZONE));
        let weekday_locale = env::var("WEEKDAY_LOCALE").unwrap_or_else(|_| String::from("ja"));

        // Parse numeric values
        let notify_interval_minutes = parse_number("NOTIFY_INTERVAL_MINUTES", 5)?;
        let sync_interval_secs = parse_number("SYNC_INTERVAL_SECS", 3600)?;

        let sns_hashtag = env::var("SNS_HASHTAG").unwrap_or_else(|_| String::from("#pyconjp"));

        // Channel credentials are optional, a channel without them is skipped
        let twitter_bearer_token = env::var("TWITTER_BEARER_TOKEN").ok();
        let fb_page_id = env::var("FB_PAGE_ID").ok();
        let fb_page_access_token = env::var("FB_PAGE_ACCESS_TOKEN").ok();

        // Initialize default components
        let mut components = HashMap::new();
        components.insert("sns_notify".to_string(), true);
        components.insert("calendar_sync".to_string(), true);

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
            for (key, value) in file_components {
                components.insert(key, value);
            }
        }

        let config = Config {
            google_client_id,
            google_client_secret,
            google_token_file,
            google_calendar_id,
            schedule_sheet_id,
            schedule_sheet_range,
            connpass_series_ids,
            excluded_titles,
            components,
            timezone,
            weekday_locale,
            notify_interval_minutes,
            sync_interval_secs,
            sns_hashtag,
            twitter_bearer_token,
            fb_page_id,
            fb_page_access_token,
        };

        // Fail early on a timezone typo rather than on the first tick
        config.tz()?;
        if config.notify_interval_minutes == 0 {
            return Err(config_error("NOTIFY_INTERVAL_MINUTES must be positive"));
        }

        Ok(config)
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }

    /// Parsed scheduling timezone
    pub fn tz(&self) -> BotResult<Tz> {
        Tz::from_str(&self.timezone)
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }
}

/// Split a comma separated setting, dropping blanks
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: FromStr>(var: &str, default: T) -> BotResult<T> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} format", var))),
        Err(_) => Ok(default),
    }
}

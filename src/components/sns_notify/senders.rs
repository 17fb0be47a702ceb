use super::models::Channel;
use crate::config::Config;
use crate::error::{channel_error, BotResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";
const GRAPH_API_URL: &str = "https://graph.facebook.com";

/// Posts one message to one social channel
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn channel(&self) -> Channel;

    /// Post `message` (the hashtag suffix is added here) with an optional link
    async fn send(&self, message: &str, link: Option<&str>) -> BotResult<()>;
}

/// Append the hashtag suffix
pub fn with_hashtag(message: &str, hashtag: &str) -> String {
    let message = message.trim_end();
    if hashtag.is_empty() {
        return message.to_string();
    }
    format!("{} {}", message, hashtag)
}

/// Tweet text: message, then link, then hashtag
pub fn compose_tweet(message: &str, link: Option<&str>, hashtag: &str) -> String {
    match link {
        Some(link) => with_hashtag(&format!("{} {}", message.trim_end(), link), hashtag),
        None => with_hashtag(message, hashtag),
    }
}

async fn check_response(channel: Channel, response: reqwest::Response) -> BotResult<()> {
    if response.status().is_success() {
        return Ok(());
    }

    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(channel_error(
        channel.name(),
        &format!("HTTP {} - {}", status, error_body),
    ))
}

/// Twitter API v2 sender using a user-context bearer token
pub struct TwitterSender {
    bearer_token: String,
    hashtag: String,
    client: Client,
}

impl TwitterSender {
    pub fn new(bearer_token: impl Into<String>, hashtag: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            hashtag: hashtag.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ChannelSender for TwitterSender {
    fn channel(&self) -> Channel {
        Channel::Twitter
    }

    async fn send(&self, message: &str, link: Option<&str>) -> BotResult<()> {
        let text = compose_tweet(message, link, &self.hashtag);

        let response = self
            .client
            .post(TWEETS_URL)
            .bearer_auth(&self.bearer_token)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| channel_error("twitter", &format!("Failed to post tweet: {}", e)))?;

        check_response(Channel::Twitter, response).await?;
        info!("Posted to twitter: {}", text);
        Ok(())
    }
}

/// Facebook page feed sender
pub struct FacebookSender {
    page_id: String,
    page_access_token: String,
    hashtag: String,
    client: Client,
}

impl FacebookSender {
    pub fn new(
        page_id: impl Into<String>,
        page_access_token: impl Into<String>,
        hashtag: impl Into<String>,
    ) -> Self {
        Self {
            page_id: page_id.into(),
            page_access_token: page_access_token.into(),
            hashtag: hashtag.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ChannelSender for FacebookSender {
    fn channel(&self) -> Channel {
        Channel::Facebook
    }

    async fn send(&self, message: &str, link: Option<&str>) -> BotResult<()> {
        let message = with_hashtag(message, &self.hashtag);

        let mut params = vec![
            ("message", message.as_str()),
            ("access_token", self.page_access_token.as_str()),
        ];
        if let Some(link) = link {
            params.push(("link", link));
        }

        let response = self
            .client
            .post(format!("{}/{}/feed", GRAPH_API_URL, self.page_id))
            .form(&params)
            .send()
            .await
            .map_err(|e| channel_error("facebook", &format!("Failed to post to page: {}", e)))?;

        check_response(Channel::Facebook, response).await?;
        info!("Posted to facebook: {}", message);
        Ok(())
    }
}

/// The configured sender for each channel; a channel may be unconfigured
#[derive(Clone, Default)]
pub struct ChannelSenders {
    pub twitter: Option<Arc<dyn ChannelSender>>,
    pub facebook: Option<Arc<dyn ChannelSender>>,
}

impl ChannelSenders {
    /// Build senders for every channel that has credentials
    pub fn from_config(config: &Config) -> Self {
        let twitter = match &config.twitter_bearer_token {
            Some(token) => {
                Some(Arc::new(TwitterSender::new(token, &config.sns_hashtag)) as Arc<dyn ChannelSender>)
            }
            None => {
                warn!("TWITTER_BEARER_TOKEN not set, twitter notifications are disabled");
                None
            }
        };

        let facebook = match (&config.fb_page_id, &config.fb_page_access_token) {
            (Some(page_id), Some(token)) => Some(Arc::new(FacebookSender::new(
                page_id,
                token,
                &config.sns_hashtag,
            )) as Arc<dyn ChannelSender>),
            _ => {
                warn!("FB_PAGE_ID or FB_PAGE_ACCESS_TOKEN not set, facebook notifications are disabled");
                None
            }
        };

        Self { twitter, facebook }
    }

    pub fn get(&self, channel: Channel) -> Option<&Arc<dyn ChannelSender>> {
        match channel {
            Channel::Twitter => self.twitter.as_ref(),
            Channel::Facebook => self.facebook.as_ref(),
        }
    }
}

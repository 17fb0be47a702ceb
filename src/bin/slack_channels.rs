use dotenvy::dotenv;
use pyconjp_cron::error::{env_error, slack_error, Error};
use reqwest::Client;
use serde::Deserialize;
use std::env;

const CONVERSATIONS_LIST: &str = "https://slack.com/api/conversations.list";

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct SlackChannel {
    name: String,
    #[serde(default)]
    num_members: u32,
    topic: Option<TextValue>,
    purpose: Option<TextValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct ConversationsList {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    channels: Vec<SlackChannel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

fn text(value: &Option<TextValue>) -> &str {
    value.as_ref().map(|v| v.value.as_str()).unwrap_or("")
}

/// Print the name, member count, topic and purpose of every open channel
#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenv().ok();
    let token = env::var("SLACK_TOKEN").map_err(|_| env_error("SLACK_TOKEN"))?;
    let client = Client::new();

    let mut cursor = String::new();
    loop {
        let mut query = vec![("exclude_archived", "true"), ("limit", "200")];
        if !cursor.is_empty() {
            query.push(("cursor", cursor.as_str()));
        }

        let list: ConversationsList = client
            .get(CONVERSATIONS_LIST)
            .bearer_auth(&token)
            .query(&query)
            .send()
            .await
            .map_err(Error::from)?
            .json()
            .await
            .map_err(Error::from)?;

        if !list.ok {
            return Err(slack_error(list.error.as_deref().unwrap_or("unknown error")).into());
        }

        for channel in &list.channels {
            println!(
                "{}\t{}\t{}\t{}",
                channel.name,
                channel.num_members,
                text(&channel.topic),
                text(&channel.purpose)
            );
        }

        cursor = list
            .response_metadata
            .map(|m| m.next_cursor)
            .unwrap_or_default();
        if cursor.is_empty() {
            break;
        }
    }

    Ok(())
}

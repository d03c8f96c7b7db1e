//! Telegram Bot API [`Notifier`].

use std::time::Duration;

use brief_pipeline::collab::{CollaboratorError, Notifier};
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::config::TelegramConfig;

const API_BASE: &str = "https://api.telegram.org";

struct Credentials {
  bot_token: String,
  chat_id:   String,
}

/// Sends HTML messages to one chat. Without credentials every message is
/// dropped.
pub struct TelegramNotifier {
  client:        Client,
  credentials:   Option<Credentials>,
  dashboard_url: Option<String>,
}

impl TelegramNotifier {
  pub fn new(config: &TelegramConfig) -> anyhow::Result<Self> {
    let credentials = match (&config.bot_token, &config.chat_id) {
      _ if !config.enabled => None,
      (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
        Some(Credentials { bot_token: bot_token.clone(), chat_id: chat_id.clone() })
      }
      _ => {
        warn!("telegram bot token or chat id missing; notifications disabled");
        None
      }
    };

    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, credentials, dashboard_url: config.dashboard_url.clone() })
  }

  pub fn is_enabled(&self) -> bool { self.credentials.is_some() }

  fn compose(&self, message: &str) -> String {
    match &self.dashboard_url {
      Some(url) => format!("{message}\n🔗 <a href='{url}'>Open the dashboard</a>"),
      None => message.to_owned(),
    }
  }
}

impl Notifier for TelegramNotifier {
  async fn notify(&self, message: &str) -> Result<(), CollaboratorError> {
    let Some(creds) = &self.credentials else {
      return Ok(());
    };

    let resp = self
      .client
      .post(format!("{API_BASE}/bot{}/sendMessage", creds.bot_token))
      .json(&json!({
        "chat_id": creds.chat_id,
        "text": self.compose(message),
        "parse_mode": "HTML",
        "disable_web_page_preview": true,
      }))
      .send()
      .await
      .map_err(CollaboratorError::transport)?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body = resp.text().await.unwrap_or_default();
      return Err(CollaboratorError::Rejected(format!("telegram → {status}: {body}")));
    }

    info!("telegram notification sent");
    Ok(())
  }
}

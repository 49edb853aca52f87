//! Telegram Bot API client.
//!
//! Provides long polling, replies and file downloads. The bot token is part
//! of every request URL, so URLs are never logged.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use super::error::TelegramError;
use super::types::{ApiResponse, File, GetUpdates, SendMessage, Update, User};

/// Public Bot API base URL.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Extra time on top of the long-poll timeout before the HTTP call gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Timeout for every call other than `getUpdates`.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a client against the public Bot API.
    #[must_use]
    pub fn new(token: SecretString) -> Self {
        Self::with_base_url(token, TELEGRAM_API_BASE)
    }

    /// Create a client against a different Bot API server.
    #[must_use]
    pub fn with_base_url(token: SecretString, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.base_url,
            self.token.expose_secret()
        )
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TelegramError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            // without_url keeps the token out of the error text
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let result: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Response(e.without_url().to_string()))?;

        if !result.ok {
            error!(method, error = ?result.description, "Telegram API error");
            return Err(TelegramError::Api(
                result
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        result
            .result
            .ok_or_else(|| TelegramError::Response(format!("{method} returned no result")))
    }

    /// Identity of the bot itself.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Long-poll for updates with `update_id >= offset`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram returns an error.
    #[instrument(skip(self))]
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &body, timeout + POLL_GRACE).await?;
        debug!(count = updates.len(), "Received updates");
        Ok(updates)
    }

    /// Send a plain-text message to a chat.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram returns an error.
    #[instrument(skip(self, text))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id,
            text,
            reply_to_message_id,
            disable_web_page_preview: true,
        };
        let _: serde_json::Value = self.call("sendMessage", &body, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    /// Resolve a file id to a downloadable file path.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Telegram returns an error.
    #[instrument(skip(self))]
    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call(
            "getFile",
            &serde_json::json!({ "file_id": file_id }),
            REQUEST_TIMEOUT,
        )
        .await
    }

    /// Download the contents of a file returned by [`get_file`](Self::get_file).
    ///
    /// # Errors
    ///
    /// Returns error if the file has no path or the download fails.
    #[instrument(skip(self, file), fields(file_id = %file.file_id))]
    pub async fn download_file(&self, file: &File) -> Result<Vec<u8>, TelegramError> {
        let path = file
            .file_path
            .as_deref()
            .ok_or_else(|| TelegramError::MissingFilePath(file.file_id.clone()))?;

        let url = format!(
            "{}/file/bot{}/{path}",
            self.base_url,
            self.token.expose_secret()
        );

        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TelegramError::Response(e.without_url().to_string()))?;

        debug!(size = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = TelegramClient::new(SecretString::from("123:very-secret"));
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_method_url() {
        let client =
            TelegramClient::with_base_url(SecretString::from("123:abc"), "http://localhost:9000/");
        assert_eq!(
            client.method_url("getMe"),
            "http://localhost:9000/bot123:abc/getMe"
        );
    }
}

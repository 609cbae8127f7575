//! Telegram Bot API client
//!
//! A thin `reqwest` wrapper over the three Bot API methods the bot needs:
//! `sendMessage`, `setWebhook` and `deleteWebhook`.

use crate::telegram::types::{
    ApiResponse, ChatId, ParseMode, SendMessageRequest, SetWebhookRequest,
};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Maximum length of a single Telegram message, in UTF-16 code units
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Outbound side of the chat platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send `text` to a chat. Text longer than one message is split.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()>;
}

/// Bot API client authenticated by the bot token
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// Create a client for the given bot token
    ///
    /// # Arguments
    ///
    /// * `token` - Bot token issued by BotFather
    /// * `api_base` - Bot API root, e.g. `https://api.telegram.org`
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), token, api_base)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<Option<serde_json::Value>> {
        // reqwest errors embed the URL, which contains the token
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Telegram(format!("{} request failed: {}", method, e.without_url())))?;

        let status = response.status();
        let api: ApiResponse = response.json().await.map_err(|e| {
            AppError::Telegram(format!(
                "{} returned an unreadable response (HTTP {}): {}",
                method,
                status,
                e.without_url()
            ))
        })?;

        if !api.ok {
            return Err(AppError::Telegram(format!(
                "{} failed ({}): {}",
                method,
                api.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                api.description.unwrap_or_else(|| "no description".to_string())
            )));
        }

        Ok(api.result)
    }

    /// Register `url` as the webhook, optionally with a secret token that
    /// Telegram echoes in `X-Telegram-Bot-Api-Secret-Token`.
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        let request = SetWebhookRequest {
            url,
            secret_token,
            allowed_updates: vec!["message", "channel_post"],
        };
        self.call("setWebhook", &request).await?;
        tracing::info!(url, "Webhook registered");
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        self.call("deleteWebhook", &serde_json::json!({})).await?;
        tracing::info!("Webhook removed");
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let request = SendMessageRequest {
                chat_id,
                text: &chunk,
                parse_mode,
            };
            self.call("sendMessage", &request).await?;
        }
        tracing::debug!(chat_id = %chat_id, "Reply sent");
        Ok(())
    }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Split `text` into pieces of at most `limit` UTF-16 code units.
///
/// Breaks fall on line boundaries where possible. A single line longer than
/// `limit` is cut between HTML atoms (whole `&...;` entities, whole `<...>`
/// tags or single characters); tags open at a cut are closed at the end of
/// the chunk and reopened at the start of the next.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if utf16_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = utf16_len(line);

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        // (name, opening tag) of every tag open at this point of the line
        let mut open: Vec<(&str, &str)> = Vec::new();
        for atom in html_atoms(line) {
            let atom_len = utf16_len(atom);
            let mut after = open.clone();
            track_tag(&mut after, atom);

            if current_len + atom_len + closing_len(&after) > limit && !current.is_empty() {
                for (name, _) in open.iter().rev() {
                    current.push_str(&format!("</{}>", name));
                }
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
                for (_, tag) in &open {
                    current.push_str(tag);
                    current_len += utf16_len(tag);
                }
            }

            current.push_str(atom);
            current_len += atom_len;
            open = after;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn html_atoms(line: &str) -> Vec<&str> {
    let mut atoms = Vec::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        let end = match ch {
            '&' => rest[1..]
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '#')
                .filter(|&i| i > 0 && rest[1 + i..].starts_with(';'))
                .map(|i| i + 2),
            '<' => rest.find('>').map(|i| i + 1),
            _ => None,
        }
        .unwrap_or(ch.len_utf8());

        atoms.push(&rest[..end]);
        rest = &rest[end..];
    }

    atoms
}

fn track_tag<'a>(open: &mut Vec<(&'a str, &'a str)>, atom: &'a str) {
    if !atom.starts_with('<') || atom.len() < 3 || atom.ends_with("/>") {
        return;
    }

    if let Some(closing) = atom.strip_prefix("</") {
        let name = closing.trim_end_matches('>').trim();
        if let Some(pos) = open.iter().rposition(|(open_name, _)| *open_name == name) {
            open.truncate(pos);
        }
        return;
    }

    let name = atom[1..]
        .split(|c: char| c.is_whitespace() || c == '>')
        .next()
        .unwrap_or("");
    if !name.is_empty() {
        open.push((name, atom));
    }
}

fn closing_len(open: &[(&str, &str)]) -> usize {
    open.iter().map(|(name, _)| name.len() + 3).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{search, SearchQuery};
    use crate::types::LocationNote;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_split_short_message_is_untouched() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc\n";
        let chunks = split_message(text, 10);

        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc\n".to_string()]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_long_line() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_counts_utf16_units() {
        // Each emoji is two UTF-16 code units
        let text = "🏠".repeat(6);
        let chunks = split_message(&text, 4);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| utf16_len(c) <= 4));
    }

    fn assert_well_formed(chunk: &str) {
        let mut rest = chunk;
        while let Some(pos) = rest.find('&') {
            rest = &rest[pos..];
            assert!(
                ["&amp;", "&lt;", "&gt;", "&quot;"]
                    .iter()
                    .any(|entity| rest.starts_with(entity)),
                "broken entity in chunk: {:?}",
                rest.chars().take(8).collect::<String>()
            );
            rest = &rest[1..];
        }
        assert_eq!(
            chunk.matches("<b>").count(),
            chunk.matches("</b>").count(),
            "unbalanced <b> in chunk"
        );
    }

    #[test]
    fn test_split_keeps_entities_whole() {
        let note = LocationNote {
            name: "Pho24".to_string(),
            kind: "Pho".to_string(),
            note: "&".repeat(1000),
            ..Default::default()
        };
        let notes = vec![note];
        let query = SearchQuery::parse("pho").expect("valid query");
        let reply = search(&query, &notes).render();

        let chunks = split_message(&reply, MAX_MESSAGE_LEN);

        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), reply);
        for chunk in &chunks {
            assert!(utf16_len(chunk) <= MAX_MESSAGE_LEN);
            assert_well_formed(chunk);
        }
    }

    #[test]
    fn test_split_reopens_bold_across_chunks() {
        let text = format!("Name: <b>{}</b>\nnext", "n".repeat(30));
        let chunks = split_message(&text, 20);

        assert!(chunks.len() > 2);
        for chunk in &chunks {
            assert!(utf16_len(chunk) <= 20, "chunk too long: {:?}", chunk);
            assert_well_formed(chunk);
        }
        assert!(chunks[1].starts_with("<b>"));
        assert_eq!(chunks.concat().replace("</b><b>", ""), text);
    }

    #[test]
    fn test_split_leaves_bare_ampersand_alone() {
        let text = format!("{} & more", "x".repeat(12));
        let chunks = split_message(&text, 10);

        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| utf16_len(c) <= 10));
    }

    #[tokio::test]
    async fn test_send_message_posts_to_bot_api() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/botTEST:TOKEN/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": 42,
                "text": "<b>hi</b>",
                "parse_mode": "HTML"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": true, "result": {"message_id": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new("TEST:TOKEN", server.uri());
        client
            .send_message(ChatId(42), "<b>hi</b>", Some(ParseMode::Html))
            .await
            .expect("send should succeed");
    }

    #[tokio::test]
    async fn test_send_message_surfaces_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/botTEST:TOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let client = TelegramClient::new("TEST:TOKEN", server.uri());
        let err = client
            .send_message(ChatId(1), "hi", None)
            .await
            .unwrap_err();

        match err {
            AppError::Telegram(msg) => {
                assert!(msg.contains("chat not found"));
                assert!(!msg.contains("TEST:TOKEN"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_webhook_sends_secret() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/botTEST:TOKEN/setWebhook"))
            .and(body_json(serde_json::json!({
                "url": "https://example.com/api/webhook",
                "secret_token": "s3cret",
                "allowed_updates": ["message", "channel_post"]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": true, "result": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new("TEST:TOKEN", format!("{}/", server.uri()));
        client
            .set_webhook("https://example.com/api/webhook", Some("s3cret"))
            .await
            .expect("setWebhook should succeed");
    }
}

// src/bot/telegram.rs

//! Telegram Bot API adapter for the transport and membership ports.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::bot::event::{ChatId, Event, EventKind, MessageId, PrincipalId};
use crate::bot::gate::{MemberStatus, MembershipDirectory};
use crate::bot::transport::{Button, Keyboard, Transport};
use crate::bot::{Bot, Handler};
use crate::errors::{MembershipError, TransportError};

pub const API_BASE_URL: &str = "https://api.telegram.org";

/// Long-poll window for `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: PrincipalId,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

impl Update {
    /// A button press whose message is gone (too old, or sent inline). It cannot be
    /// routed, but the client keeps spinning until the query is answered.
    pub fn orphan_callback_id(&self) -> Option<&str> {
        self.callback_query
            .as_ref()
            .filter(|query| query.message.is_none())
            .map(|query| query.id.as_str())
    }

    /// The event this update carries, if it is one the bot reacts to.
    pub fn into_event(self) -> Option<Event> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            return Some(Event {
                principal: query.from.id,
                chat: message.chat.id,
                kind: EventKind::Button {
                    callback_id: query.id,
                    data: query.data.unwrap_or_default(),
                    message: Some(message.message_id),
                },
            });
        }
        let message = self.message?;
        let principal = message.from?.id;
        let text = message.text?;
        Some(Event::from_message(principal, message.chat.id, &text))
    }
}

fn keyboard_markup(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match button {
                    Button::Callback { label, data } => json!({ "text": label, "callback_data": data }),
                    Button::Url { label, url } => json!({ "text": label, "url": url }),
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

// --- Client ---

pub struct TelegramApi {
    client: Client,
    endpoint: String,
}

impl TelegramApi {
    pub fn new(client: Client, token: &str) -> Self {
        Self::with_base_url(client, API_BASE_URL, token)
    }

    pub fn with_base_url(client: Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
        let body: ApiResponse<T> = response.json().await?;
        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TransportError::Api(
                body.description.unwrap_or_else(|| "no description".to_string()),
            )),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T, TransportError> {
        debug!(method, "Calling chat API.");
        let response = self.client.post(self.url(method)).json(payload).send().await?;
        Self::decode(response).await
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let payload = json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "callback_query"],
        });
        let response = self
            .client
            .post(self.url("getUpdates"))
            .json(&payload)
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl Transport for TelegramApi {
    async fn send_text(&self, chat: ChatId, text: &str, keyboard: Option<&Keyboard>) -> Result<MessageId, TransportError> {
        let mut payload = json!({ "chat_id": chat, "text": text });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = keyboard_markup(keyboard);
        }
        let message: Message = self.call("sendMessage", &payload).await?;
        Ok(message.message_id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let mut payload = json!({ "chat_id": chat, "message_id": message, "text": text });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = keyboard_markup(keyboard);
        }
        // Returns the edited message, or `true` for inline messages.
        let _: Value = self.call("editMessageText", &payload).await?;
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        let _: bool = self
            .call("deleteMessage", &json!({ "chat_id": chat, "message_id": message }))
            .await?;
        Ok(())
    }

    async fn send_file(&self, chat: ChatId, path: &Path, file_name: &str, caption: &str) -> Result<(), TransportError> {
        let bytes = tokio::fs::read(path).await?;
        let form = Form::new()
            .text("chat_id", chat.to_string())
            .text("caption", caption.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self.client.post(self.url("sendDocument")).multipart(form).send().await?;
        let _: Message = Self::decode(response).await?;
        Ok(())
    }

    async fn answer_button(&self, callback_id: &str) -> Result<(), TransportError> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipDirectory for TelegramApi {
    async fn status(&self, group: i64, principal: PrincipalId) -> Result<MemberStatus, MembershipError> {
        let payload = json!({ "chat_id": group, "user_id": principal });
        let response = self.client.post(self.url("getChatMember")).json(&payload).send().await?;
        let body: ApiResponse<ChatMember> = response.json().await?;
        let member = match (body.ok, body.result) {
            (true, Some(member)) => member,
            _ => {
                return Err(MembershipError::Api(
                    body.description.unwrap_or_else(|| "no description".to_string()),
                ));
            }
        };
        Ok(match member.status.as_str() {
            "member" | "administrator" | "creator" => MemberStatus::Member,
            _ => MemberStatus::NonMember,
        })
    }
}

/// Polls for updates forever, handling each event on its own task.
///
/// Events from different users run concurrently; ordering within one user is
/// left to the session's busy guard.
pub async fn run_polling<H>(api: Arc<TelegramApi>, bot: Arc<Bot<H>>)
where
    H: Handler + 'static,
{
    info!("Polling for updates.");
    let mut offset = 0;
    loop {
        let updates = match api.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = %e, "Fetching updates failed.");
                tokio::time::sleep(POLL_ERROR_PAUSE).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let orphan = update.orphan_callback_id().map(str::to_string);
            let Some(event) = update.into_event() else {
                if let Some(callback_id) = orphan {
                    debug!(callback_id = %callback_id, "Answering button press without a message.");
                    if let Err(e) = api.answer_button(&callback_id).await {
                        warn!(error = %e, "Could not acknowledge button.");
                    }
                } else {
                    debug!("Skipping update without a usable event.");
                }
                continue;
            };
            let bot = Arc::clone(&bot);
            tokio::spawn(async move {
                bot.handle(event).await;
            });
        }
    }
}

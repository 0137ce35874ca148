// src/bot/event.rs

/// Identifies the user behind an event. Sessions are keyed by it.
pub type PrincipalId = i64;

/// Identifies the chat replies go to.
pub type ChatId = i64;

/// Identifies a message already sent by the bot, so it can be edited or deleted.
pub type MessageId = i64;

/// One inbound event from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub principal: PrincipalId,
    pub chat: ChatId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/name arg1 arg2 ...`
    Command { name: String, args: Vec<String> },
    /// An inline button was pressed.
    Button {
        callback_id: String,
        data: String,
        message: Option<MessageId>,
    },
    /// Anything typed that is not a command.
    Text(String),
}

impl Event {
    /// Classifies a raw message text as a command or free text.
    ///
    /// `/scan@SomeBot example.com` is the `scan` command with one argument.
    pub fn from_message(principal: PrincipalId, chat: ChatId, text: &str) -> Self {
        let kind = match text.strip_prefix('/') {
            Some(rest) if !rest.is_empty() && !rest.starts_with(char::is_whitespace) => {
                let mut parts = rest.split_whitespace();
                let name = parts
                    .next()
                    .unwrap_or_default()
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                EventKind::Command {
                    name,
                    args: parts.map(str::to_string).collect(),
                }
            }
            _ => EventKind::Text(text.to_string()),
        };
        Self { principal, chat, kind }
    }
}

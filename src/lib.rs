//! tweetcontext: a chat bot that answers Twitter links with the posts they quote or reply to.

pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod messaging;
pub mod posts;
pub mod resolver;

pub use dispatcher::ContextBot;
pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// A chat message the bot has seen or sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Platform message id.
    pub id: String,
    /// Platform channel id the message lives in.
    pub conversation_id: String,
    pub author_id: String,
    pub content: String,
}

/// How a reply attaches to the message it answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyOptions {
    /// Ping the author of the source message.
    pub mention_author: bool,
    /// Fail the send when the source message was deleted in the meantime.
    pub fail_if_not_exists: bool,
}

/// Outbound reply to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    pub text: String,
    pub options: ReplyOptions,
}

impl OutboundReply {
    /// A reply with mentions suppressed that survives deletion of its source.
    pub fn quiet(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: ReplyOptions::default(),
        }
    }
}

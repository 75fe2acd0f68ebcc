//! Messaging traits: the chat platform as seen by the bot.

use crate::config::Limit;
use crate::error::Result;
use crate::{ChatMessage, OutboundReply};

use futures::Stream;
use std::future::Future;
use std::pin::Pin;

/// Inbound event stream type.
pub type InboundStream<C> = Pin<Box<dyn Stream<Item = InboundEvent<C>> + Send>>;

/// Something the platform delivered to the bot.
pub enum InboundEvent<C> {
    /// A new message not authored by the bot.
    Message(ChatMessage),
    /// An invocation of the context slash command.
    Command { request: ContextRequest, responder: C },
}

/// Arguments of the context slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRequest {
    pub url: String,
    /// Requested depth, if the invoker gave one.
    pub depth: Option<Limit>,
}

/// Static trait for messaging adapters.
pub trait Messaging: Send + Sync + 'static {
    /// Handle used to answer one slash-command invocation.
    type Responder: CommandResponder;

    /// Unique name for this adapter.
    fn name(&self) -> &str;

    /// Connect and return the inbound event stream.
    fn start(&self) -> impl Future<Output = Result<InboundStream<Self::Responder>>> + Send;

    /// Send a threaded reply to `source` and return the message that was sent.
    fn reply(
        &self,
        source: &ChatMessage,
        reply: OutboundReply,
    ) -> impl Future<Output = Result<ChatMessage>> + Send;

    /// Graceful shutdown.
    fn shutdown(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

/// Answers a single slash-command invocation.
pub trait CommandResponder: Send + Sync + 'static {
    /// Acknowledge the invocation so the platform shows it as pending.
    fn defer(&self) -> impl Future<Output = Result<()>> + Send;

    /// Post a follow-up message and return it.
    fn follow_up(&self, reply: OutboundReply) -> impl Future<Output = Result<ChatMessage>> + Send;

    /// Post an error notice with a best-effort description.
    fn send_error(&self, description: &str) -> impl Future<Output = Result<()>> + Send;
}

//! ContextBot: extracts post links from messages, resolves their context and
//! replies with it, following its own replies down to a bounded depth.

use crate::cache::ContextCache;
use crate::config::{Config, Limit};
use crate::error::Result;
use crate::extract::extract_post_ids;
use crate::messaging::{CommandResponder, ContextRequest, InboundEvent, Messaging};
use crate::posts::{PostContext, PostGraph};
use crate::resolver::ContextResolver;
use crate::{ChatMessage, OutboundReply};

use futures::future::{BoxFuture, join_all};
use futures::{FutureExt as _, StreamExt as _};
use std::sync::Arc;

const INVALID_URL: &str = "Did not get a Twitter URL.";
const NO_CONTEXT: &str = "No additional context found for that Tweet.";

/// The bot instance: configuration, messaging adapter and context resolver.
pub struct ContextBot<M: Messaging, P: PostGraph> {
    config: Config,
    messaging: Arc<M>,
    resolver: ContextResolver<P>,
}

impl<M: Messaging, P: PostGraph> ContextBot<M, P> {
    pub fn new(config: Config, messaging: Arc<M>, graph: Arc<P>) -> Self {
        let cache = ContextCache::new(&config.cache);
        Self {
            resolver: ContextResolver::new(graph, cache),
            config,
            messaging,
        }
    }

    /// Start the messaging adapter and handle inbound events until the stream
    /// ends. Each event is handled on its own task.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let mut events = self.messaging.start().await?;
        tracing::info!(adapter = self.messaging.name(), "listening for post links");

        while let Some(event) = events.next().await {
            let bot = self.clone();
            tokio::spawn(async move {
                bot.handle_event(event).await;
            });
        }

        tracing::info!(adapter = self.messaging.name(), "inbound stream ended");
        Ok(())
    }

    pub async fn handle_event(&self, event: InboundEvent<M::Responder>) {
        match event {
            InboundEvent::Message(message) => self.handle_message(message, 0).await,
            InboundEvent::Command { request, responder } => {
                self.handle_command(&responder, request).await
            }
        }
    }

    /// Answer every post link in `message` and recurse into the replies.
    /// Failures are logged and never returned.
    pub fn handle_message(&self, message: ChatMessage, depth: u32) -> BoxFuture<'_, ()> {
        self.handle_within(message, depth, self.config.max_depth)
    }

    fn handle_within(&self, message: ChatMessage, depth: u32, limit: Limit) -> BoxFuture<'_, ()> {
        async move {
            if !limit.allows(depth) {
                tracing::trace!(message_id = %message.id, depth, "max depth reached");
                return;
            }

            let post_ids = extract_post_ids(&message.content, self.config.max_urls_per_message);
            if post_ids.is_empty() {
                return;
            }

            join_all(
                post_ids
                    .iter()
                    .map(|post_id| self.answer_post(&message, post_id, depth, limit)),
            )
            .await;
        }
        .boxed()
    }

    async fn answer_post(&self, message: &ChatMessage, post_id: &str, depth: u32, limit: Limit) {
        tracing::info!(post_id, depth, message_id = %message.id, "handling post");

        let context = match self.resolver.resolve(post_id).await {
            Ok(context) => context,
            Err(error) => {
                tracing::warn!(post_id, depth, %error, "failed to resolve post context");
                return;
            }
        };

        let sends = self
            .context_replies(&context)
            .into_iter()
            .map(|reply| self.messaging.reply(message, reply));
        let results = join_all(sends).await;

        let mut branches = Vec::new();
        for result in results {
            match result {
                Ok(sent) => branches.push(self.handle_within(sent, depth + 1, limit)),
                Err(error) => {
                    tracing::error!(post_id, depth, %error, "failed to send context reply")
                }
            }
        }
        join_all(branches).await;
    }

    /// Handle one slash-command invocation. Failures are reported to the
    /// invoker where possible and logged.
    pub async fn handle_command<R: CommandResponder>(&self, responder: &R, request: ContextRequest) {
        if let Err(error) = self.answer_command(responder, request).await {
            tracing::error!(%error, "failed to answer context command");
        }
    }

    async fn answer_command<R: CommandResponder>(
        &self,
        responder: &R,
        request: ContextRequest,
    ) -> Result<()> {
        responder.defer().await?;

        let Some(post_id) = extract_post_ids(&request.url, Limit::Max(1)).pop() else {
            return responder.send_error(INVALID_URL).await;
        };
        let limit = self.command_depth(request.depth);
        tracing::info!(%post_id, %limit, "handling context command");

        let context = match self.resolver.resolve(&post_id).await {
            Ok(context) => context,
            Err(error) => {
                tracing::warn!(%post_id, %error, "failed to resolve post context");
                return responder.send_error(&error.to_string()).await;
            }
        };

        let replies = self.context_replies(&context);
        if replies.is_empty() {
            responder.follow_up(OutboundReply::quiet(NO_CONTEXT)).await?;
            return Ok(());
        }

        let results = join_all(replies.into_iter().map(|reply| responder.follow_up(reply))).await;

        let mut branches = Vec::new();
        for result in results {
            match result {
                Ok(sent) => branches.push(self.handle_within(sent, 1, limit)),
                Err(error) => {
                    tracing::error!(%post_id, %error, "failed to send context follow-up")
                }
            }
        }
        join_all(branches).await;

        Ok(())
    }

    /// Depth for a command: the requested (or default) depth, never deeper
    /// than the configured maximum.
    fn command_depth(&self, requested: Option<Limit>) -> Limit {
        requested
            .or(self.config.default_depth)
            .map_or(self.config.max_depth, |depth| depth.min(self.config.max_depth))
    }

    /// Replies for a resolved context: quotes first, then replies.
    fn context_replies(&self, context: &PostContext) -> Vec<OutboundReply> {
        let quotes = context
            .quotes
            .iter()
            .map(|quote| OutboundReply::quiet(format!("Found quoted Tweet: {}", quote.url())));

        let replies = context
            .replies
            .iter()
            .filter(|_| self.config.include_replies)
            .map(|reply| OutboundReply::quiet(format!("Found Tweet reply: {}", reply.url())));

        quotes.chain(replies).collect()
    }
}

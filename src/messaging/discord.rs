//! Discord messaging adapter using serenity.

use crate::config::Limit;
use crate::messaging::traits::{
    CommandResponder, ContextRequest, InboundEvent, InboundStream, Messaging,
};
use crate::{ChatMessage, OutboundReply};

use anyhow::Context as _;
use serenity::all::{
    ChannelId, Command, CommandDataOption, CommandInteraction, CommandOptionType, Context,
    CreateAllowedMentions, CreateCommand, CreateCommandOption, CreateEmbed,
    CreateInteractionResponseFollowup, CreateMessage, EventHandler, GatewayIntents, Http,
    Interaction, Message, MessageId, MessageReference, Ready, ShardManager,
};

use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Name of the slash command.
pub const COMMAND_NAME: &str = "twittercontext";
const OPTION_URL: &str = "url";
const OPTION_DEPTH: &str = "depth";

/// Discord adapter state.
pub struct DiscordAdapter {
    token: String,
    http: Arc<Http>,
    shard_manager: Arc<RwLock<Option<Arc<ShardManager>>>>,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            http: Arc::new(Http::new(&token)),
            token,
            shard_manager: Arc::new(RwLock::new(None)),
        }
    }
}

impl Messaging for DiscordAdapter {
    type Responder = DiscordResponder;

    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> crate::Result<InboundStream<DiscordResponder>> {
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let mut client = serenity::Client::builder(&self.token, intents)
            .event_handler(Handler { inbound_tx })
            .await
            .context("failed to build discord client")?;

        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            if let Err(error) = client.start().await {
                tracing::error!(%error, "discord gateway connection failed");
            }
        });
        *self.shard_manager.write().await = Some(shard_manager);

        let stream = tokio_stream::wrappers::ReceiverStream::new(inbound_rx);
        Ok(Box::pin(stream))
    }

    async fn reply(&self, source: &ChatMessage, reply: OutboundReply) -> crate::Result<ChatMessage> {
        let channel_id = ChannelId::new(parse_snowflake(&source.conversation_id)?);
        let message_id = MessageId::new(parse_snowflake(&source.id)?);

        let mut reference = MessageReference::from((channel_id, message_id));
        reference.fail_if_not_exists = Some(reply.options.fail_if_not_exists);

        let builder = CreateMessage::new()
            .content(reply.text)
            .reference_message(reference)
            .allowed_mentions(
                CreateAllowedMentions::new().replied_user(reply.options.mention_author),
            );

        let sent = channel_id
            .send_message(&self.http, builder)
            .await
            .context("failed to send discord reply")?;

        Ok(chat_message(&sent))
    }

    async fn shutdown(&self) -> crate::Result<()> {
        if let Some(shard_manager) = self.shard_manager.write().await.take() {
            shard_manager.shutdown_all().await;
        }
        tracing::info!("discord adapter shut down");
        Ok(())
    }
}

/// Answers one `/twittercontext` invocation.
pub struct DiscordResponder {
    http: Arc<Http>,
    command: CommandInteraction,
}

impl CommandResponder for DiscordResponder {
    async fn defer(&self) -> crate::Result<()> {
        self.command
            .defer(&self.http)
            .await
            .context("failed to defer discord interaction")?;
        Ok(())
    }

    async fn follow_up(&self, reply: OutboundReply) -> crate::Result<ChatMessage> {
        let builder = CreateInteractionResponseFollowup::new()
            .content(reply.text)
            .allowed_mentions(
                CreateAllowedMentions::new().replied_user(reply.options.mention_author),
            );
        let sent = self
            .command
            .create_followup(&self.http, builder)
            .await
            .context("failed to send discord follow-up")?;
        Ok(chat_message(&sent))
    }

    async fn send_error(&self, description: &str) -> crate::Result<()> {
        let embed = CreateEmbed::new()
            .title("Error")
            .description(description)
            .colour(0xFF0000_u32);
        self.command
            .create_followup(&self.http, CreateInteractionResponseFollowup::new().embed(embed))
            .await
            .context("failed to send discord error embed")?;
        Ok(())
    }
}

struct Handler {
    inbound_tx: mpsc::Sender<InboundEvent<DiscordResponder>>,
}

#[async_trait::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, "discord connected");

        if let Err(error) = Command::set_global_commands(&ctx.http, vec![context_command()]).await {
            tracing::error!(%error, "failed to register discord slash command");
        }
    }

    async fn message(&self, ctx: Context, message: Message) {
        // Skip our own messages
        if message.author.id == ctx.cache.current_user().id {
            return;
        }

        if let Err(error) = self.inbound_tx.send(InboundEvent::Message(chat_message(&message))).await {
            tracing::warn!(%error, "failed to forward discord message (receiver dropped)");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        if command.data.name != COMMAND_NAME {
            return;
        }

        let parsed = parse_context_request(&command.data.options);
        let responder = DiscordResponder {
            http: ctx.http.clone(),
            command,
        };
        let request = match parsed {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(%error, "malformed context command");
                if let Err(error) = reject_command(&responder, &error.to_string()).await {
                    tracing::error!(%error, "failed to answer malformed context command");
                }
                return;
            }
        };
        tracing::debug!(?request, user = %responder.command.user.name, "received context command");

        let event = InboundEvent::Command { request, responder };
        if self.inbound_tx.send(event).await.is_err() {
            tracing::warn!("failed to forward discord command (receiver dropped)");
        }
    }
}

async fn reject_command(responder: &DiscordResponder, description: &str) -> crate::Result<()> {
    responder.defer().await?;
    responder.send_error(description).await
}

fn context_command() -> CreateCommand {
    CreateCommand::new(COMMAND_NAME)
        .description("Posts additional context for your Tweet URL (such as quotes, replies).")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, OPTION_URL, "The URL of the Tweet.")
                .required(true),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                OPTION_DEPTH,
                "The max depth to post. Note that there might be a max to prevent spamming.",
            )
            .required(false)
            .min_int_value(1),
        )
}

fn parse_context_request(options: &[CommandDataOption]) -> anyhow::Result<ContextRequest> {
    let url = options
        .iter()
        .find(|option| option.name == OPTION_URL)
        .and_then(|option| option.value.as_str())
        .context("missing url option")?
        .to_string();

    let depth = options
        .iter()
        .find(|option| option.name == OPTION_DEPTH)
        .and_then(|option| option.value.as_i64())
        .map(|depth| {
            // past any representable max, so the configured limit decides
            if depth > i64::from(u32::MAX) {
                Ok(Limit::Unlimited)
            } else {
                Limit::from_count(OPTION_DEPTH, depth)
            }
        })
        .transpose()?;

    Ok(ContextRequest { url, depth })
}

fn chat_message(message: &Message) -> ChatMessage {
    ChatMessage {
        id: message.id.get().to_string(),
        conversation_id: message.channel_id.get().to_string(),
        author_id: message.author.id.get().to_string(),
        content: message.content.clone(),
    }
}

fn parse_snowflake(raw: &str) -> anyhow::Result<u64> {
    raw.parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .with_context(|| format!("invalid discord id: {raw}"))
}

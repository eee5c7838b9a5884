//! Chat session abstraction used by the pipeline and the event loop.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::pipeline::types::InboundMessage;

/// Something that happened in a room the bot can see.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A room message from any sender, the bot included.
    Message(InboundMessage),
    /// The bot itself was invited to `room`.
    Invite { room: String },
}

/// Stream of events from a started session.
pub type EventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// Outbound operations on a chat session.
///
/// The pipeline treats every call as best-effort except for the final
/// notice or reply, whose failure is logged by the caller.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Session name for logs.
    fn name(&self) -> &str;

    /// Start receiving events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Post an unthreaded notice to `room`.
    async fn send_notice(&self, room: &str, text: &str) -> Result<(), ChannelError>;

    /// Post `text` as a reply threaded to `in_reply_to`.
    async fn send_reply(&self, room: &str, in_reply_to: &str, text: &str)
    -> Result<(), ChannelError>;

    /// Send a read receipt for `event_id`.
    async fn mark_read(&self, room: &str, event_id: &str) -> Result<(), ChannelError>;

    /// Turn the typing indicator on (for at most `ttl`) or off.
    async fn set_typing(&self, room: &str, typing: bool, ttl: Duration)
    -> Result<(), ChannelError>;

    /// Join `room` after an invite.
    async fn join_room(&self, room: &str) -> Result<(), ChannelError>;
}

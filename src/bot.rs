//! Event loop — joins rooms on invite and runs one pipeline task per message.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinSet;

use crate::channels::{ChatEvent, ChatSession};
use crate::error::ChannelError;
use crate::pipeline::MessageProcessor;

pub struct Bot {
    session: Arc<dyn ChatSession>,
    processor: Arc<MessageProcessor>,
}

impl Bot {
    pub fn new(session: Arc<dyn ChatSession>, processor: Arc<MessageProcessor>) -> Self {
        Self { session, processor }
    }

    /// Run until Ctrl+C or until the session's event stream ends.
    pub async fn run(self) -> Result<(), ChannelError> {
        self.run_until(async {
            wait_for_signal(tokio::signal::ctrl_c()).await;
        })
        .await
    }

    /// Run until `shutdown` completes or the event stream ends.
    ///
    /// Messages already being processed are allowed to finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ChannelError>
    where
        F: Future<Output = ()>,
    {
        let mut events = self.session.start().await?;
        let mut in_flight = JoinSet::new();
        tokio::pin!(shutdown);

        tracing::info!(session = self.session.name(), "Translation bot ready and listening");

        loop {
            let event = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Message task failed");
                    }
                    continue;
                }
                event = events.next() => match event {
                    Some(event) => event,
                    None => {
                        tracing::info!("Event stream ended, shutting down...");
                        break;
                    }
                },
            };

            match event {
                ChatEvent::Invite { room } => {
                    tracing::info!(room = %room, "Received invite");
                    if let Err(e) = self.session.join_room(&room).await {
                        tracing::warn!(room = %room, error = %e, "Failed to join room");
                    }
                }
                ChatEvent::Message(message) => {
                    let processor = Arc::clone(&self.processor);
                    in_flight.spawn(async move {
                        processor.process(&message).await;
                    });
                }
            }
        }

        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Message task failed");
            }
        }

        tracing::info!("Translation bot stopped");
        Ok(())
    }
}

/// Wait for the shutdown signal. Returns `false` when listening failed
/// instead of a signal arriving.
async fn wait_for_signal<F>(signal: F) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Ctrl+C received, shutting down...");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C, shutting down...");
            false
        }
    }
}

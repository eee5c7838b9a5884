//! Message processor — runs one inbound message through the pipeline.
//!
//! Flow per message:
//! 1. Gate: own messages, non-text content, empty bodies
//! 2. Admin commands (`!add` / `!remove`), never translated
//! 3. Keyword filter on the raw body → suppression notice
//! 4. Normalize → translate → parse, bracketed by read receipt and typing
//! 5. Threaded reply, or a generic failure notice
//!
//! Errors never escape `process()`: every failure ends in a notice and a
//! log line, and the next message is unaffected.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::channels::ChatSession;
use crate::error::{ChannelError, PipelineError};
use crate::pipeline::commands::AdminCommand;
use crate::pipeline::filter::KeywordFilter;
use crate::pipeline::normalize::normalize;
use crate::pipeline::parser::ResponseParser;
use crate::pipeline::translate::{TARGET_LANGUAGE, Translator};
use crate::pipeline::types::{
    ContentKind, Disposition, InboundMessage, ParsedTranslation, PipelineOutcome, SkipReason,
};
use crate::store::KeywordStore;

/// Default typing-indicator lifetime.
pub const DEFAULT_TYPING_TTL: Duration = Duration::from_secs(5);

/// User-facing notice texts. `blocked` must contain `{keyword}`.
#[derive(Debug, Clone)]
pub struct Notices {
    pub blocked: String,
    pub failure: String,
    pub text_only: String,
}

impl Notices {
    pub fn blocked(&self, keyword: &str) -> String {
        self.blocked.replace("{keyword}", keyword)
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            blocked: "ההודעה שלך נחסמה מכיוון שהיא מכילה את הביטוי: {keyword}".to_string(),
            failure: "שגיאה במהלך התרגום".to_string(),
            text_only: "ניתן לתרגם רק הודעות טקסט".to_string(),
        }
    }
}

/// Identity and presentation settings for the processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// The bot's own user id. Messages from it are ignored.
    pub bot_user_id: String,
    /// Sender allowed to run admin commands. `None` disables them.
    pub admin_user_id: Option<String>,
    pub notices: Notices,
    pub typing_ttl: Duration,
}

impl ProcessorConfig {
    pub fn new(bot_user_id: impl Into<String>) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            admin_user_id: None,
            notices: Notices::default(),
            typing_ttl: DEFAULT_TYPING_TTL,
        }
    }

    pub fn with_admin(mut self, admin_user_id: impl Into<String>) -> Self {
        self.admin_user_id = Some(admin_user_id.into());
        self
    }

    fn is_admin(&self, sender: &str) -> bool {
        self.admin_user_id.as_deref() == Some(sender)
    }
}

/// The pipeline controller. All collaborators are injected.
pub struct MessageProcessor {
    session: Arc<dyn ChatSession>,
    store: Arc<dyn KeywordStore>,
    translator: Translator,
    parser: ResponseParser,
    filter: KeywordFilter,
    config: ProcessorConfig,
}

impl MessageProcessor {
    pub fn new(
        session: Arc<dyn ChatSession>,
        store: Arc<dyn KeywordStore>,
        translator: Translator,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            session,
            store,
            translator,
            parser: ResponseParser::new(TARGET_LANGUAGE),
            filter: KeywordFilter::new(),
            config,
        }
    }

    /// Process a single inbound message to completion.
    pub async fn process(&self, message: &InboundMessage) -> Disposition {
        if message.sender == self.config.bot_user_id {
            debug!(id = %message.id, "Ignoring own message");
            return Disposition::Skipped(SkipReason::OwnMessage);
        }

        info!(
            id = %message.id,
            room = %message.room,
            sender = %message.sender,
            "Processing inbound message"
        );

        if message.kind != ContentKind::Text {
            info!(id = %message.id, error = %PipelineError::UnsupportedContent, "Rejecting message");
            self.notify(&message.room, &self.config.notices.text_only).await;
            return Disposition::Unsupported;
        }

        if message.body.trim().is_empty() {
            debug!(id = %message.id, "Ignoring empty message");
            return Disposition::Skipped(SkipReason::EmptyBody);
        }

        if self.config.is_admin(&message.sender)
            && let Some(command) = AdminCommand::parse(&message.body)
        {
            let notice = command.execute(self.store.as_ref(), &self.filter).await;
            self.notify(&message.room, &notice).await;
            return Disposition::Command { notice };
        }

        let outcome = self.run(message).await;
        info!(id = %message.id, outcome = outcome.label(), "Message processed");
        Disposition::Processed(outcome)
    }

    async fn run(&self, message: &InboundMessage) -> PipelineOutcome {
        let keywords = match self.store.list().await {
            Ok(keywords) => keywords,
            Err(e) => return self.fail(message, PipelineError::from(e)).await,
        };

        if let Some(keyword) = self.filter.should_suppress(&message.body, &keywords) {
            info!(id = %message.id, keyword = %keyword, "Message suppressed by filter");
            self.notify(&message.room, &self.config.notices.blocked(&keyword))
                .await;
            return PipelineOutcome::Suppressed {
                matched_keyword: keyword,
            };
        }

        best_effort(
            "mark_read",
            self.session.mark_read(&message.room, &message.id).await,
        );
        best_effort(
            "typing_on",
            self.session
                .set_typing(&message.room, true, self.config.typing_ttl)
                .await,
        );

        let result = self.translate(&message.body).await;

        best_effort(
            "typing_off",
            self.session
                .set_typing(&message.room, false, Duration::ZERO)
                .await,
        );

        match result {
            Ok(parsed) => {
                info!(
                    id = %message.id,
                    format = ?parsed.format,
                    chars = parsed.text.chars().count(),
                    "Delivering translation"
                );
                if let Err(e) = self
                    .session
                    .send_reply(&message.room, &message.id, &parsed.text)
                    .await
                {
                    error!(id = %message.id, error = %e, "Failed to send translation");
                }
                PipelineOutcome::Translated { text: parsed.text }
            }
            Err(e) => self.fail(message, e).await,
        }
    }

    /// Normalize → translate → parse.
    async fn translate(&self, body: &str) -> Result<ParsedTranslation, PipelineError> {
        let text = normalize(body);
        debug!(
            before = body.chars().count(),
            after = text.chars().count(),
            "Normalized message"
        );
        let reply = self.translator.translate(&text).await?;
        self.parser.parse(&reply)
    }

    async fn fail(&self, message: &InboundMessage, err: PipelineError) -> PipelineOutcome {
        error!(id = %message.id, kind = err.label(), error = %err, "Translation failed");
        self.notify(&message.room, &self.config.notices.failure).await;
        PipelineOutcome::Failed {
            reason: err.label().to_string(),
        }
    }

    async fn notify(&self, room: &str, text: &str) {
        if let Err(e) = self.session.send_notice(room, text).await {
            error!(room = %room, error = %e, "Failed to send notice");
        }
    }
}

fn best_effort(action: &str, result: Result<(), ChannelError>) {
    if let Err(e) = result {
        warn!(action, error = %e, "Chat side effect failed");
    }
}

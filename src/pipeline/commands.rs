//! Admin command channel — `!add` / `!remove` filter keywords.
//!
//! Only the configured admin's text messages are parsed. Anything that is
//! not a command goes on through the normal pipeline.

use tracing::{error, info, warn};

use crate::pipeline::filter::KeywordFilter;
use crate::store::KeywordStore;

const ADD: &str = "!add";
const REMOVE: &str = "!remove";

/// A parsed admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Add { pattern: String },
    Remove { pattern: String },
    /// A known command with no pattern.
    MissingPattern { command: &'static str },
}

impl AdminCommand {
    /// Parse `body`, or `None` when it is not a command.
    pub fn parse(body: &str) -> Option<Self> {
        parse_with(body, ADD, |pattern| Self::Add { pattern })
            .or_else(|| parse_with(body, REMOVE, |pattern| Self::Remove { pattern }))
    }

    /// Apply the command to `store` and return the notice for the admin.
    pub async fn execute(&self, store: &dyn KeywordStore, filter: &KeywordFilter) -> String {
        match self {
            Self::Add { pattern } => match store.upsert(pattern).await {
                Ok(()) => {
                    info!(keyword = %pattern, "Filter keyword added");
                    match filter.compile(pattern) {
                        Ok(_) => format!("Added filter keyword: {pattern}"),
                        Err(e) => {
                            warn!(keyword = %pattern, error = %e, "Added keyword is not a valid pattern");
                            format!(
                                "Added filter keyword: {pattern} (warning: not a valid pattern, it will never match)"
                            )
                        }
                    }
                }
                Err(e) => {
                    error!(keyword = %pattern, error = %e, "Failed to add filter keyword");
                    format!("Failed to add filter keyword: {pattern}")
                }
            },
            Self::Remove { pattern } => match store.delete(pattern).await {
                Ok(removed) => {
                    info!(keyword = %pattern, removed, "Filter keyword removed");
                    format!("Removed filter keyword: {pattern}")
                }
                Err(e) => {
                    error!(keyword = %pattern, error = %e, "Failed to remove filter keyword");
                    format!("Failed to remove filter keyword: {pattern}")
                }
            },
            Self::MissingPattern { command } => format!("Usage: {command} <pattern>"),
        }
    }
}

/// `<command> <pattern>`; the command must be followed by whitespace or end the body.
fn parse_with(
    body: &str,
    command: &'static str,
    build: impl FnOnce(String) -> AdminCommand,
) -> Option<AdminCommand> {
    let rest = body.trim_start().strip_prefix(command)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let pattern = rest.trim();
    if pattern.is_empty() {
        return Some(AdminCommand::MissingPattern { command });
    }
    Some(build(pattern.to_string()))
}

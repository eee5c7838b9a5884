//! Matrix channel — long-polls `/sync` on the client-server API.
//!
//! Only the handful of endpoints the bot needs are implemented: sync,
//! room messages (notices and threaded replies), read receipts, typing
//! notifications and joins.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::channels::{ChatEvent, ChatSession, EventStream};
use crate::error::ChannelError;
use crate::pipeline::types::{ContentKind, InboundMessage};
use crate::store::SyncStateStore;

const NAME: &str = "matrix";

/// Server-side long-poll timeout for `/sync`.
const SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause before retrying a failed sync.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Timeout for non-sync requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a Matrix homeserver.
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub access_token: SecretString,
    /// Fully qualified user id of the bot, e.g. `@translator:example.org`.
    pub user_id: String,
}

pub struct MatrixChannel {
    homeserver: String,
    access_token: SecretString,
    user_id: String,
    client: reqwest::Client,
    sync_store: Option<Arc<dyn SyncStateStore>>,
}

impl MatrixChannel {
    pub fn new(config: MatrixConfig) -> Self {
        Self {
            homeserver: config.homeserver.trim_end_matches('/').to_string(),
            access_token: config.access_token,
            user_id: config.user_id,
            client: reqwest::Client::new(),
            sync_store: None,
        }
    }

    /// Persist the sync position in `store` and resume from it on start.
    pub fn with_sync_store(mut self, store: Arc<dyn SyncStateStore>) -> Self {
        self.sync_store = Some(store);
        self
    }

    async fn stored_sync_token(&self) -> Option<String> {
        let store = self.sync_store.as_ref()?;
        match store.load_sync_token(&self.user_id).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load sync position, starting fresh");
                None
            }
        }
    }

    /// `{homeserver}/_matrix/client/v3/{segments...}` with each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Result<Url, ChannelError> {
        build_api_url(&self.homeserver, segments)
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        body: serde_json::Value,
    ) -> Result<(), ChannelError> {
        let url = self.api_url(segments)?;
        let resp = self
            .client
            .request(method, url)
            .bearer_auth(self.access_token.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: NAME.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: NAME.into(),
                reason: format!("{} returned {status}: {body}", segments.join("/")),
            });
        }
        Ok(())
    }

    async fn send_message(&self, room: &str, content: serde_json::Value) -> Result<(), ChannelError> {
        let txn_id = Uuid::new_v4().to_string();
        self.call(
            Method::PUT,
            &["rooms", room, "send", "m.room.message", &txn_id],
            content,
        )
        .await
    }
}

fn build_api_url(homeserver: &str, segments: &[&str]) -> Result<Url, ChannelError> {
    let mut url = Url::parse(homeserver)
        .map_err(|e| ChannelError::InvalidMessage(format!("bad homeserver URL '{homeserver}': {e}")))?;
    url.path_segments_mut()
        .map_err(|()| {
            ChannelError::InvalidMessage(format!("homeserver URL '{homeserver}' cannot be a base"))
        })?
        .pop_if_empty()
        .extend(["_matrix", "client", "v3"])
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl ChatSession for MatrixChannel {
    fn name(&self) -> &str {
        NAME
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let sync_url = self
            .api_url(&["sync"])
            .map_err(|e| ChannelError::StartupFailed {
                name: NAME.into(),
                reason: e.to_string(),
            })?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.access_token.expose_secret()))
            .map_err(|e| ChannelError::StartupFailed {
                name: NAME.into(),
                reason: format!("access token is not a valid header value: {e}"),
            })?;
        auth.set_sensitive(true);

        let mut since = self.stored_sync_token().await;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let client = self.client.clone();
        let user_id = self.user_id.clone();
        let sync_store = self.sync_store.clone();

        tokio::spawn(async move {
            let timeout_ms = SYNC_TIMEOUT.as_millis().to_string();

            tracing::info!(
                user_id = %user_id,
                resuming = since.is_some(),
                "Matrix channel syncing..."
            );

            loop {
                let mut request = client
                    .get(sync_url.clone())
                    .header(AUTHORIZATION, auth.clone())
                    .timeout(SYNC_TIMEOUT + REQUEST_TIMEOUT);
                request = match since.as_deref() {
                    Some(since) => {
                        request.query(&[("since", since), ("timeout", timeout_ms.as_str())])
                    }
                    None => request.query(&[("timeout", "0")]),
                };

                let resp = match request.send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Matrix sync error: {e}");
                        tokio::time::sleep(RETRY_DELAY).await;
                        continue;
                    }
                };

                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    tracing::warn!(status = %status, body = %body, "Matrix sync rejected");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }

                let sync: SyncResponse = match resp.json().await {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!("Matrix sync parse error: {e}");
                        tokio::time::sleep(RETRY_DELAY).await;
                        continue;
                    }
                };

                // Without a stored position the first sync only establishes
                // one; old timeline events are not replayed. Pending invites
                // are still honoured.
                let initial = since.is_none();
                if let Some(store) = &sync_store
                    && since.as_deref() != Some(sync.next_batch.as_str())
                    && let Err(e) = store.save_sync_token(&user_id, &sync.next_batch).await
                {
                    tracing::warn!(error = %e, "Failed to persist sync position");
                }
                since = Some(sync.next_batch.clone());

                for event in sync.into_events(initial) {
                    if tx.send(event).is_err() {
                        tracing::info!("Matrix listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send_notice(&self, room: &str, text: &str) -> Result<(), ChannelError> {
        self.send_message(room, notice_content(text)).await
    }

    async fn send_reply(
        &self,
        room: &str,
        in_reply_to: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        self.send_message(room, reply_content(in_reply_to, text))
            .await
    }

    async fn mark_read(&self, room: &str, event_id: &str) -> Result<(), ChannelError> {
        self.call(
            Method::POST,
            &["rooms", room, "receipt", "m.read", event_id],
            json!({}),
        )
        .await
    }

    async fn set_typing(
        &self,
        room: &str,
        typing: bool,
        ttl: Duration,
    ) -> Result<(), ChannelError> {
        self.call(
            Method::PUT,
            &["rooms", room, "typing", &self.user_id],
            typing_content(typing, ttl),
        )
        .await
    }

    async fn join_room(&self, room: &str) -> Result<(), ChannelError> {
        self.call(Method::POST, &["rooms", room, "join"], json!({}))
            .await?;
        tracing::info!(room = %room, "Joined room");
        Ok(())
    }
}

// ── Event content ───────────────────────────────────────────────────

fn notice_content(text: &str) -> serde_json::Value {
    json!({
        "msgtype": "m.notice",
        "body": text,
    })
}

fn reply_content(in_reply_to: &str, text: &str) -> serde_json::Value {
    json!({
        "msgtype": "m.text",
        "body": text,
        "m.relates_to": {
            "m.in_reply_to": { "event_id": in_reply_to }
        }
    })
}

fn typing_content(typing: bool, ttl: Duration) -> serde_json::Value {
    if typing {
        json!({ "typing": true, "timeout": ttl.as_millis() as u64 })
    } else {
        json!({ "typing": false })
    }
}

// ── Sync response ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SyncResponse {
    next_batch: String,
    #[serde(default)]
    rooms: SyncRooms,
}

#[derive(Debug, Default, Deserialize)]
struct SyncRooms {
    #[serde(default)]
    join: BTreeMap<String, JoinedRoom>,
    #[serde(default)]
    invite: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct JoinedRoom {
    #[serde(default)]
    timeline: Timeline,
}

#[derive(Debug, Default, Deserialize)]
struct Timeline {
    #[serde(default)]
    events: Vec<RoomEvent>,
}

#[derive(Debug, Deserialize)]
struct RoomEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    event_id: String,
    #[serde(default)]
    sender: String,
    #[serde(default)]
    content: serde_json::Value,
}

impl SyncResponse {
    /// Flatten into chat events. Timeline events are dropped when `initial`.
    fn into_events(self, initial: bool) -> Vec<ChatEvent> {
        let mut events: Vec<ChatEvent> = self
            .rooms
            .invite
            .into_keys()
            .map(|room| ChatEvent::Invite { room })
            .collect();

        if initial {
            return events;
        }

        for (room, joined) in self.rooms.join {
            for event in joined.timeline.events {
                if let Some(message) = event.into_message(&room) {
                    events.push(ChatEvent::Message(message));
                }
            }
        }
        events
    }
}

impl RoomEvent {
    fn into_message(self, room: &str) -> Option<InboundMessage> {
        if self.kind != "m.room.message" || self.event_id.is_empty() {
            return None;
        }
        // Redacted messages have empty content.
        let msgtype = self.content.get("msgtype")?.as_str()?;
        let kind = if msgtype == "m.text" {
            ContentKind::Text
        } else {
            ContentKind::NonText
        };
        let body = self
            .content
            .get("body")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        Some(InboundMessage::text(self.event_id, room, self.sender, body).with_kind(kind))
    }
}

// src/watch/protocol.rs

//! Client side of the change-subscription protocol.
//!
//! The service speaks newline-delimited JSON. We write one request:
//!
//! ```json
//! ["subscribe", "/abs/project", "%1700000000000-42", {"fields": ["name"]}]
//! ```
//!
//! and then read, in order:
//! 1. an acknowledgement `{"version": "...", "subscribe": "<id>"}`;
//! 2. an initial snapshot `{"root": "...", "subscription": "<id>", "files": [...]}`;
//! 3. any number of change notifications with the same shape as the snapshot.
//!
//! [`SubscriptionClient`] is a synchronous state machine over those lines; the
//! process plumbing lives in [`crate::watch::monitor`].

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Handshake violations and unreadable messages. All of them are fatal for
/// the subscription.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("Unexpected initial watchman response: {0}")]
    UnexpectedAcknowledgement(String),

    #[error("Mismatched dirs: {expected} {actual}")]
    RootMismatch { expected: String, actual: String },

    #[error("Mismatched subscription id: {expected} {actual}")]
    SubscriptionMismatch { expected: String, actual: String },

    #[error("Expected initial list of files")]
    MissingInitialFiles,
}

/// Any message the service may send. Every field is optional; which ones are
/// required depends on the client state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchMessage {
    pub version: Option<String>,
    pub subscribe: Option<String>,
    pub root: Option<PathBuf>,
    pub subscription: Option<String>,
    pub files: Option<Vec<String>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    AwaitingHandshakeAck,
    AwaitingInitialSnapshot,
    Streaming,
}

/// One change notification, with paths resolved against its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub root_dir: PathBuf,
    pub subscription_id: String,
    pub changed_paths: Vec<PathBuf>,
}

/// What a single protocol line meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    Acknowledged { version: String },
    Initialized { files: usize },
    Changes(ChangeBatch),
    /// A streaming message that carries no file list (state notices, logs).
    Ignored,
}

#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    root: PathBuf,
    subscription: String,
    state: SubscriptionState,
}

impl SubscriptionClient {
    pub fn new(root: impl Into<PathBuf>, subscription: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            subscription: subscription.into(),
            state: SubscriptionState::AwaitingHandshakeAck,
        }
    }

    /// A client for `root` with a fresh subscription id.
    pub fn with_generated_id(root: impl Into<PathBuf>) -> Self {
        Self::new(root, generate_subscription_id())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subscription(&self) -> &str {
        &self.subscription
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// The subscribe request, as one JSON line without the trailing newline.
    pub fn subscribe_request(&self) -> String {
        json!([
            "subscribe",
            self.root.to_string_lossy(),
            self.subscription,
            { "fields": ["name"] }
        ])
        .to_string()
    }

    /// Feed one line read from the service.
    pub fn handle_line(&mut self, line: &str) -> Result<ProtocolEvent, ProtocolError> {
        let message: WatchMessage =
            serde_json::from_str(line).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        match self.state {
            SubscriptionState::AwaitingHandshakeAck => self.handle_ack(message, line),
            SubscriptionState::AwaitingInitialSnapshot => self.handle_snapshot(message),
            SubscriptionState::Streaming => Ok(self.handle_change(message)),
        }
    }

    fn handle_ack(&mut self, message: WatchMessage, line: &str) -> Result<ProtocolEvent, ProtocolError> {
        match (message.version, message.subscribe) {
            (Some(version), Some(id)) if id == self.subscription => {
                self.state = SubscriptionState::AwaitingInitialSnapshot;
                debug!(subscription = %self.subscription, %version, "subscription acknowledged");
                Ok(ProtocolEvent::Acknowledged { version })
            }
            _ => Err(ProtocolError::UnexpectedAcknowledgement(
                message.error.unwrap_or_else(|| line.to_string()),
            )),
        }
    }

    fn handle_snapshot(&mut self, message: WatchMessage) -> Result<ProtocolEvent, ProtocolError> {
        let root = message.root.unwrap_or_default();
        if root != self.root {
            return Err(ProtocolError::RootMismatch {
                expected: self.root.to_string_lossy().into_owned(),
                actual: root.to_string_lossy().into_owned(),
            });
        }

        let subscription = message.subscription.unwrap_or_default();
        if subscription != self.subscription {
            return Err(ProtocolError::SubscriptionMismatch {
                expected: self.subscription.clone(),
                actual: subscription,
            });
        }

        let files = message.files.ok_or(ProtocolError::MissingInitialFiles)?;
        self.state = SubscriptionState::Streaming;
        debug!(subscription = %self.subscription, files = files.len(), "initial snapshot received");
        Ok(ProtocolEvent::Initialized { files: files.len() })
    }

    fn handle_change(&self, message: WatchMessage) -> ProtocolEvent {
        let (Some(root), Some(files)) = (message.root, message.files) else {
            debug!("streaming message without a file list; ignoring");
            return ProtocolEvent::Ignored;
        };

        let subscription_id = message.subscription.unwrap_or_default();
        if subscription_id != self.subscription {
            debug!(%subscription_id, "notification for another subscription; ignoring");
            return ProtocolEvent::Ignored;
        }

        let changed_paths = files.iter().map(|f| root.join(f)).collect();
        ProtocolEvent::Changes(ChangeBatch {
            root_dir: root,
            subscription_id,
            changed_paths,
        })
    }
}

/// Subscription id unique per run: current time in milliseconds plus a random
/// component, so concurrent watchers on the same root never collide.
pub fn generate_subscription_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("%{}-{}", millis, rand::random::<u64>())
}

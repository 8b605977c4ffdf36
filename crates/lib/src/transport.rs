//! Transport contract: connection lifecycle events, inbound messages, and
//! the send operation the relay controller drives.
//!
//! The protocol stack itself (pairing, encryption, session storage) is an
//! external collaborator behind `TransportFactory` / `TransportClient`.
//! Connection updates and message batches arrive as one explicit event
//! stream consumed by the controller task.

use crate::session::{CredentialState, SessionStore};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Candidate text sources of one protocol message, in extraction priority
/// order (see `extract`). All absent means the event carries no usable text.
#[derive(Debug, Clone, Default)]
pub struct MessageContent {
    pub conversation: Option<String>,
    pub extended_text: Option<String>,
    pub image_caption: Option<String>,
    pub video_caption: Option<String>,
}

/// One inbound message event. Ephemeral: produced per transport event,
/// dropped after handling.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Opaque transport address of the chat the message arrived in; replies
    /// go back here (e.g. a direct or group JID).
    pub chat: String,
    /// Author of the message. Equal to `chat` in a direct chat; in a group
    /// chat this is the member who wrote it, and quoting must name it.
    pub sender: String,
    /// Transport message id, referenced when quoting the original in a reply.
    pub id: String,
    /// True when the message originated from this bot's own account.
    pub from_self: bool,
    pub content: MessageContent,
}

/// Whether a batch is a live notification or a historical catch-up replay.
/// Replays are discarded so old messages are not answered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Live,
    Replay,
}

#[derive(Debug, Clone)]
pub struct MessageBatch {
    pub kind: BatchKind,
    pub messages: Vec<InboundMessage>,
}

/// Why a connection closed. LoggedOut is terminal and needs manual
/// re-pairing; everything else is recoverable by reconnecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    LoggedOut,
    Other(String),
}

impl DisconnectReason {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DisconnectReason::LoggedOut)
    }
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::LoggedOut => write!(f, "logged out"),
            DisconnectReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Events emitted by a connected transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Connection reached the open state.
    Connected,
    /// A pairing QR code is available for scanning.
    PairingQr(String),
    /// Credentials changed; the controller forwards this to the session store.
    CredentialsUpdated(CredentialState),
    /// A batch of inbound messages, live or replayed.
    Batch(MessageBatch),
    /// Connection closed. Last event of a connection.
    Disconnected(DisconnectReason),
}

/// Handle for sending replies over an open connection. Must support
/// concurrent sends without external locking.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Send a text message, optionally quoting the original inbound message.
    async fn send_text(
        &self,
        recipient: &str,
        text: &str,
        quoted: Option<&InboundMessage>,
    ) -> Result<(), String>;

    /// Release everything the connection holds (background tasks, session
    /// database handles). Called by the supervisor once the event stream has
    /// ended, before any reconnect. Default: nothing to release.
    async fn close(&self) {}
}

/// One established connection: the send handle plus its event stream.
pub struct TransportConnection {
    pub client: Arc<dyn TransportClient>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Connects to the messaging transport. `connect` runs the full startup
/// sequence (reload credentials, connect) and is re-invoked by the
/// supervisor after every recoverable disconnect.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(&self, store: Arc<dyn SessionStore>) -> Result<TransportConnection, String>;
}

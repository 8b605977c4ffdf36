//! WhatsApp transport: adapts the `whatsapp-channel` connector to the
//! transport contract.
//!
//! Credential state lives in the connector's own SQLite store under the
//! session directory, so no `CredentialsUpdated` events are emitted here;
//! the session store passed to `connect` is left untouched. Connector
//! messages arrive one at a time and are always live — history syncs are
//! dropped by the connector itself — so each becomes a single-message live
//! batch.

use crate::extract::extract_text;
use crate::session::SessionStore;
use crate::transport::{
    BatchKind, DisconnectReason, InboundMessage, MessageBatch, MessageContent, TransportClient,
    TransportConnection, TransportEvent, TransportFactory,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use whatsapp_channel::{ConnectorEvent, QuoteRef, WhatsAppConnector, WhatsAppHandle};

/// Factory for WhatsApp Web connections rooted at a session directory.
pub struct WhatsAppTransport {
    session_dir: PathBuf,
}

impl WhatsAppTransport {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
        }
    }
}

#[async_trait]
impl TransportFactory for WhatsAppTransport {
    async fn connect(&self, _store: Arc<dyn SessionStore>) -> Result<TransportConnection, String> {
        let (handle, mut connector_events) = WhatsAppConnector::connect(&self.session_dir).await?;
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            while let Some(event) = connector_events.recv().await {
                let mapped = match event {
                    ConnectorEvent::Qr(code) => TransportEvent::PairingQr(code),
                    ConnectorEvent::PairSuccess => {
                        log::info!("WhatsApp pairing successful");
                        continue;
                    }
                    ConnectorEvent::Connected => TransportEvent::Connected,
                    ConnectorEvent::Message(msg) => TransportEvent::Batch(MessageBatch {
                        kind: BatchKind::Live,
                        messages: vec![InboundMessage {
                            chat: msg.chat,
                            sender: msg.sender,
                            id: msg.id,
                            from_self: msg.from_me,
                            content: MessageContent {
                                conversation: msg.conversation,
                                extended_text: msg.extended_text,
                                image_caption: msg.image_caption,
                                video_caption: msg.video_caption,
                            },
                        }],
                    }),
                    ConnectorEvent::LoggedOut => {
                        TransportEvent::Disconnected(DisconnectReason::LoggedOut)
                    }
                    ConnectorEvent::Disconnected(reason) => {
                        TransportEvent::Disconnected(DisconnectReason::Other(reason))
                    }
                };
                let closing = matches!(mapped, TransportEvent::Disconnected(_));
                if tx.send(mapped).await.is_err() || closing {
                    break;
                }
            }
        });
        Ok(TransportConnection {
            client: Arc::new(WhatsAppSender { handle }),
            events: rx,
        })
    }
}

struct WhatsAppSender {
    handle: WhatsAppHandle,
}

#[async_trait]
impl TransportClient for WhatsAppSender {
    async fn send_text(
        &self,
        recipient: &str,
        text: &str,
        quoted: Option<&InboundMessage>,
    ) -> Result<(), String> {
        let quote = quoted.map(|m| QuoteRef {
            message_id: m.id.clone(),
            // The quote names the author, not the chat it arrived in.
            participant: m.sender.clone(),
            text: extract_text(&m.content).map(String::from),
        });
        self.handle.send_text(recipient, text, quote).await
    }

    async fn close(&self) {
        self.handle.shutdown().await;
    }
}

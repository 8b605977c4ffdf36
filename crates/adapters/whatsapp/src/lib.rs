//! WhatsApp Web connector over the `whatsapp-rust` protocol stack.
//!
//! Uses the WhatsApp Web multi-device protocol (Noise handshake + Signal
//! encryption). Pairing is done by scanning a QR code, like WhatsApp Web;
//! the session is persisted to `{session_dir}/whatsapp.db` and reused
//! across restarts. Events are forwarded over an mpsc channel; sending goes
//! through a client handle that is live while the connection is open.

mod qr;

pub use qr::render_qr_terminal;

use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use wacore::types::events::Event;
use wacore_binary::jid::Jid;
use whatsapp_rust::bot::Bot;
use whatsapp_rust::client::Client;
use whatsapp_rust::store::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

/// One inbound WhatsApp message, reduced to the fields the relay cares
/// about: addressing, self-origin, and the candidate text sources.
#[derive(Debug, Clone)]
pub struct WhatsAppMessage {
    /// Transport message id.
    pub id: String,
    /// Chat JID the message arrived in (replies go back here).
    pub chat: String,
    /// JID of the author. Equals `chat` in a direct chat; in a group it is
    /// the member who sent the message.
    pub sender: String,
    /// True when the message was sent from this account.
    pub from_me: bool,
    pub conversation: Option<String>,
    pub extended_text: Option<String>,
    pub image_caption: Option<String>,
    pub video_caption: Option<String>,
}

/// Reference to an original message for quoted replies.
#[derive(Debug, Clone)]
pub struct QuoteRef {
    pub message_id: String,
    pub participant: String,
    /// Text of the quoted message, when it had any.
    pub text: Option<String>,
}

/// Events forwarded from the running bot.
#[derive(Debug, Clone)]
pub enum ConnectorEvent {
    /// A pairing QR code was generated (also rendered to the terminal).
    Qr(String),
    PairSuccess,
    Connected,
    Message(WhatsAppMessage),
    Disconnected(String),
    LoggedOut,
}

/// Send handle bound to the running connection. The inner client slot is
/// populated on connect and cleared on disconnect.
#[derive(Clone)]
pub struct WhatsAppHandle {
    client: Arc<Mutex<Option<Arc<Client>>>>,
    run_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl WhatsAppHandle {
    /// Stop the running bot and release its session store. The handle can
    /// no longer send after this; a fresh `connect` is required.
    pub async fn shutdown(&self) {
        *self.client.lock().await = None;
        if let Some(run) = self.run_handle.lock().await.take() {
            run.abort();
        }
    }

    /// Send a text message to a JID string (phone@s.whatsapp.net or group@g.us),
    /// optionally quoting an earlier message.
    pub async fn send_text(
        &self,
        jid_str: &str,
        text: &str,
        quoted: Option<QuoteRef>,
    ) -> Result<(), String> {
        let client = self
            .client
            .lock()
            .await
            .clone()
            .ok_or_else(|| "whatsapp client not connected".to_string())?;
        let jid: Jid = jid_str
            .parse()
            .map_err(|e| format!("invalid whatsapp JID '{jid_str}': {e}"))?;

        let message = match quoted {
            Some(q) => waproto::whatsapp::Message {
                extended_text_message: Some(Box::new(
                    waproto::whatsapp::message::ExtendedTextMessage {
                        text: Some(text.to_string()),
                        context_info: Some(waproto::whatsapp::ContextInfo {
                            stanza_id: Some(q.message_id),
                            participant: Some(q.participant),
                            quoted_message: q.text.map(|t| {
                                Box::new(waproto::whatsapp::Message {
                                    conversation: Some(t),
                                    ..Default::default()
                                })
                            }),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                )),
                ..Default::default()
            },
            None => waproto::whatsapp::Message {
                conversation: Some(text.to_string()),
                ..Default::default()
            },
        };

        client
            .send_message(jid, message)
            .await
            .map(|_| ())
            .map_err(|e| format!("whatsapp send failed: {e}"))
    }
}

/// Builds and runs the WhatsApp bot in the background.
pub struct WhatsAppConnector;

impl WhatsAppConnector {
    /// Build the bot, start it, and return the send handle plus the event
    /// stream. The session database lives under `session_dir`; on first run
    /// a QR event fires, otherwise the saved session reconnects silently.
    pub async fn connect(
        session_dir: &Path,
    ) -> Result<(WhatsAppHandle, mpsc::Receiver<ConnectorEvent>), String> {
        std::fs::create_dir_all(session_dir)
            .map_err(|e| format!("creating session directory: {e}"))?;
        let db_path = session_dir.join("whatsapp.db");

        let backend = Arc::new(
            SqliteStore::new(db_path.to_string_lossy().as_ref())
                .await
                .map_err(|e| format!("whatsapp store init failed: {e}"))?,
        );

        let (tx, rx) = mpsc::channel(64);
        let client_slot: Arc<Mutex<Option<Arc<Client>>>> = Arc::new(Mutex::new(None));
        let client_for_event = client_slot.clone();

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .on_event(move |event, client| {
                let tx = tx.clone();
                let client_slot = client_for_event.clone();
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            match qr::render_qr_terminal(&code) {
                                Ok(rendered) => println!("{rendered}"),
                                Err(e) => log::warn!("QR render failed: {e}"),
                            }
                            let _ = tx.send(ConnectorEvent::Qr(code)).await;
                        }
                        Event::PairSuccess(_) => {
                            let _ = tx.send(ConnectorEvent::PairSuccess).await;
                        }
                        Event::Connected(_) => {
                            *client_slot.lock().await = Some(client);
                            let _ = tx.send(ConnectorEvent::Connected).await;
                        }
                        Event::Message(msg, info) => {
                            let _ = tx
                                .send(ConnectorEvent::Message(convert_message(*msg, info)))
                                .await;
                        }
                        Event::Disconnected(_) => {
                            *client_slot.lock().await = None;
                            let _ = tx
                                .send(ConnectorEvent::Disconnected(
                                    "connection closed".to_string(),
                                ))
                                .await;
                        }
                        Event::LoggedOut(_) => {
                            *client_slot.lock().await = None;
                            let _ = tx.send(ConnectorEvent::LoggedOut).await;
                        }
                        _ => {}
                    }
                }
            })
            .build()
            .await
            .map_err(|e| format!("whatsapp bot build failed: {e}"))?;

        *client_slot.lock().await = Some(bot.client());

        let run_handle = bot
            .run()
            .await
            .map_err(|e| format!("whatsapp bot run failed: {e}"))?;

        Ok((
            WhatsAppHandle {
                client: client_slot,
                run_handle: Arc::new(Mutex::new(Some(run_handle))),
            },
            rx,
        ))
    }
}

/// Reduce a protocol message to the relay's shape. Nested wrappers
/// (device-sent, ephemeral, view-once) are unwrapped first.
fn convert_message(
    msg: waproto::whatsapp::Message,
    info: wacore::types::message::MessageInfo,
) -> WhatsAppMessage {
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(&msg);

    WhatsAppMessage {
        id: info.id.clone(),
        chat: info.source.chat.to_string(),
        sender: info.source.sender.to_string(),
        from_me: info.source.is_from_me,
        conversation: inner.conversation.clone(),
        extended_text: inner
            .extended_text_message
            .as_ref()
            .and_then(|e| e.text.clone()),
        image_caption: inner.image_message.as_ref().and_then(|i| i.caption.clone()),
        video_caption: inner.video_message.as_ref().and_then(|v| v.caption.clone()),
    }
}

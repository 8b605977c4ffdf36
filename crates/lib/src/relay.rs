//! Relay controller: supervises the transport connection and answers
//! qualifying inbound messages via the completion backend.
//!
//! One task per qualifying live message; replies may complete out of order
//! relative to arrival, and there is no timeout on the completion call. A
//! recoverable disconnect re-runs the full startup sequence immediately and
//! without bound; a LoggedOut disconnect halts supervision — the session is
//! invalidated and only scanning a new QR code can bring the relay back.

use crate::extract::{derive_prompt, extract_text};
use crate::llm::{ChatMessage, CompletionBackend};
use crate::session::SessionStore;
use crate::transport::{
    BatchKind, DisconnectReason, InboundMessage, TransportClient, TransportEvent, TransportFactory,
};
use std::sync::Arc;

/// Fallback apology sent in place of a reply when the completion call fails.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Maaf, terjadi kesalahan saat menghubungi ChatGPT. Coba lagi nanti.";

/// Relay behavior: model to request, prefix gate, and the fallback reply.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub model: String,
    /// Empty means "respond to every qualifying message".
    pub prefix: String,
    pub fallback_reply: String,
}

/// Run the relay under reconnect supervision. Returns Ok(()) once the
/// transport reports LoggedOut; a connect failure is startup-fatal and
/// propagates as an error.
pub async fn run_supervised(
    factory: &dyn TransportFactory,
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn CompletionBackend>,
    settings: RelaySettings,
) -> anyhow::Result<()> {
    let settings = Arc::new(settings);
    loop {
        let reason = run_connection(factory, store.clone(), backend.clone(), settings.clone())
            .await
            .map_err(|e| anyhow::anyhow!("transport connect failed: {}", e))?;
        if reason.is_recoverable() {
            log::warn!("disconnected ({}), reconnecting", reason);
            continue;
        }
        log::error!("logged out; session invalidated, re-pair to continue");
        return Ok(());
    }
}

/// Drive one connection until it closes. In-flight message tasks are
/// abandoned across a restart, not drained.
async fn run_connection(
    factory: &dyn TransportFactory,
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn CompletionBackend>,
    settings: Arc<RelaySettings>,
) -> Result<DisconnectReason, String> {
    let mut conn = factory.connect(store.clone()).await?;
    let mut reason = DisconnectReason::Other("event stream closed".to_string());
    while let Some(event) = conn.events.recv().await {
        match event {
            TransportEvent::Connected => {
                log::info!("transport connected, relaying messages");
            }
            TransportEvent::PairingQr(code) => {
                log::info!("pairing QR code available, scan it with your phone");
                log::debug!("QR data: {}", code);
            }
            TransportEvent::CredentialsUpdated(state) => {
                if let Err(e) = store.save(&state) {
                    log::error!("saving credentials failed: {}", e);
                }
            }
            TransportEvent::Batch(batch) => {
                if batch.kind != BatchKind::Live {
                    log::debug!("dropping {} replayed message(s)", batch.messages.len());
                    continue;
                }
                for msg in batch.messages {
                    let client = conn.client.clone();
                    let backend = backend.clone();
                    let settings = settings.clone();
                    tokio::spawn(async move {
                        handle_inbound(client.as_ref(), backend.as_ref(), &settings, msg).await;
                    });
                }
            }
            TransportEvent::Disconnected(r) => {
                reason = r;
                break;
            }
        }
    }
    // A stale connection left running would compete with its replacement
    // for the session state.
    conn.client.close().await;
    Ok(reason)
}

/// Handle one live inbound message: extract text, gate on the prefix, call
/// the completion backend, reply. Every message that passes the filters gets
/// exactly one outbound send — the real reply or the fallback apology — and
/// the reply always quotes the original.
pub async fn handle_inbound(
    client: &dyn TransportClient,
    backend: &dyn CompletionBackend,
    settings: &RelaySettings,
    msg: InboundMessage,
) {
    if msg.from_self {
        // Replying to our own messages would loop forever.
        return;
    }
    let Some(text) = extract_text(&msg.content) else {
        return;
    };
    let Some(prompt) = derive_prompt(text, &settings.prefix) else {
        return;
    };
    log::info!("{}: {}", msg.sender, prompt);

    let reply = match backend
        .complete(&settings.model, vec![ChatMessage::user(prompt)])
        .await
    {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            log::warn!("completion failed: {}", e);
            settings.fallback_reply.clone()
        }
    };

    if let Err(e) = client.send_text(&msg.chat, &reply, Some(&msg)).await {
        log::warn!("sending reply to {} failed: {}", msg.chat, e);
    }
}

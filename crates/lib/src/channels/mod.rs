//! Transport connectors.
//!
//! The relay controller only sees the `transport` contract; connectors here
//! adapt a concrete protocol stack to it. The WhatsApp connector lives in
//! the `whatsapp-channel` adapter crate and is compiled only with the
//! `whatsapp` feature.

#[cfg(feature = "whatsapp")]
mod whatsapp;

#[cfg(feature = "whatsapp")]
pub use whatsapp::WhatsAppTransport;

//! warelay core library — configuration, completion client, transport
//! contract, and the relay controller shared by the CLI.

pub mod channels;
pub mod config;
pub mod extract;
pub mod init;
pub mod llm;
pub mod relay;
pub mod session;
pub mod transport;

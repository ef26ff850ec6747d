//! overpass/src/lib.rs
//! Transparent passthrough proxy for the game protocol. Relays bytes
//! between each client and the upstream server, sniffs handshake and chat
//! messages in flight, and answers chat slash-commands such as `/list`
//! from proxy state without contacting the server.

pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod listener;
pub mod logging;
pub mod notify;
pub mod protocol;
pub mod registry;
pub mod types;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use listener::Proxy;
pub use registry::SessionRegistry;

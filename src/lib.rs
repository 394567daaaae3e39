pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod http_server;
pub mod metrics;
pub mod session;
pub mod statlog;
pub mod transport;

pub use dns::DNSPacket;
pub use dnssec::{ChainValidator, Validation, ValidationState};

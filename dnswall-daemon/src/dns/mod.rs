pub mod answer;
pub mod error;
pub mod forwarder;
pub mod handler;

pub use forwarder::Forwarder;
pub use handler::DnsHandler;

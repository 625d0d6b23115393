//! DNS-layer error type and its response-code mapping.

use hickory_server::proto::op::{MessageType, OpCode};

/// Failure modes for one DNS request, independent of whatever the registry
/// or forwarder reports (those degrade to "not handled" rather than raising
/// here).
#[derive(Debug)]
pub enum DnsError {
    InvalidOpCode(OpCode),
    InvalidMessageType(MessageType),
    Io(std::io::Error),
}

impl std::fmt::Display for DnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOpCode(opcode) => write!(f, "invalid DNS opcode: {opcode:?}"),
            Self::InvalidMessageType(message_type) => {
                write!(f, "invalid DNS message type: {message_type:?}")
            }
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for DnsError {}

impl From<std::io::Error> for DnsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

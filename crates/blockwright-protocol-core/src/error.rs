use crate::codec::CodecError;
use crate::state::ConnectionState;
use thiserror::Error;

/// Errors that can occur while decoding or routing a packet through the
/// connection state machine. Distinct from `CodecError`, which only covers
/// the byte-level wire format.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("packet id {id:#04x} is not legal in state {state:?}")]
    UnexpectedPacket { state: ConnectionState, id: i32 },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

pub(crate) mod client;
mod reply;
mod request;
mod response;
mod session;
pub(crate) mod unix_socket_server;

pub use reply::BusReply;
pub use request::BusRequest;
pub use response::BusResponse;
pub use session::BusSession;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

/// The unix socket on which `tsnd` listens for local bus requests.
pub const BUS_SOCKET_PATH: &str = "/var/run/tsn.sock";

/// Frames larger than this are rejected rather than buffered.
const MAX_FRAME_BYTES: u64 = 16 * 1024 * 1024;

/// The cookie value used to determine that the session is valid.
pub fn cookie_value() -> u32 {
    0x5453_4e31 // "TSN1"
}

/// Errors raised while encoding or moving bus frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusClientError {
    /// The object could not be serialized.
    #[error("unable to encode bus message")]
    EncodingError,
    /// The payload could not be deserialized.
    #[error("unable to decode bus message")]
    DecodingError,
    /// Writing to the socket failed.
    #[error("unable to write to the bus socket")]
    StreamWriteError,
    /// Reading from the socket failed.
    #[error("unable to read from the bus socket")]
    StreamReadError,
    /// A frame exceeded [`MAX_FRAME_BYTES`].
    #[error("bus frame too large")]
    FrameTooLarge,
}

/// Encodes a `BusSession` with `bincode`, providing a tight binary
/// representation of the request object for socket transmission.
pub fn encode_session(session: &BusSession) -> Result<Vec<u8>, BusClientError> {
    bincode::serialize(session).map_err(|e| {
        error!("Unable to serialize session: {e:?}");
        BusClientError::EncodingError
    })
}

/// Decodes bytes into a `BusSession`.
pub fn decode_session(bytes: &[u8]) -> Result<BusSession, BusClientError> {
    bincode::deserialize(bytes).map_err(|e| {
        error!("Unable to deserialize session: {e:?}");
        BusClientError::DecodingError
    })
}

/// Encodes a `BusReply` object with `bincode`.
pub fn encode_reply(reply: &BusReply) -> Result<Vec<u8>, BusClientError> {
    bincode::serialize(reply).map_err(|e| {
        error!("Unable to serialize reply: {e:?}");
        BusClientError::EncodingError
    })
}

/// Decodes a `BusReply` object with `bincode`.
pub fn decode_reply(bytes: &[u8]) -> Result<BusReply, BusClientError> {
    bincode::deserialize(bytes).map_err(|e| {
        error!("Unable to deserialize reply: {e:?}");
        BusClientError::DecodingError
    })
}

pub(crate) async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), BusClientError> {
    if payload.len() as u64 > MAX_FRAME_BYTES {
        return Err(BusClientError::FrameTooLarge);
    }
    writer
        .write_u64_le(payload.len() as u64)
        .await
        .map_err(|_| BusClientError::StreamWriteError)?;
    writer
        .write_all(payload)
        .await
        .map_err(|_| BusClientError::StreamWriteError)?;
    Ok(())
}

pub(crate) async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, BusClientError> {
    let len = reader
        .read_u64_le()
        .await
        .map_err(|_| BusClientError::StreamReadError)?;
    if len > MAX_FRAME_BYTES {
        return Err(BusClientError::FrameTooLarge);
    }
    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|_| BusClientError::StreamReadError)?;
    Ok(payload)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_roundtrip() {
        let session = BusSession {
            auth_cookie: cookie_value(),
            requests: vec![
                BusRequest::Ping,
                BusRequest::CreateInterface {
                    ifname: "eth1".to_string(),
                    vlan_id: 10,
                },
            ],
        };

        let bytes = encode_session(&session).unwrap();
        let decoded = decode_session(&bytes).unwrap();
        assert_eq!(decoded.auth_cookie, session.auth_cookie);
        assert_eq!(decoded.requests, session.requests);
    }

    #[test]
    fn test_reply_roundtrip() {
        let reply = BusReply {
            auth_cookie: cookie_value(),
            responses: vec![BusResponse::Ack, BusResponse::Fail("nope".to_string())],
        };
        let bytes = encode_reply(&reply).unwrap();
        let decoded = decode_reply(&bytes).unwrap();
        assert_eq!(decoded.auth_cookie, reply.auth_cookie);
        assert_eq!(decoded.responses.len(), reply.responses.len());
    }

    #[tokio::test]
    async fn test_frame_roundtrip() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"hello").await.unwrap();
        let payload = read_frame(&mut buffer.as_slice()).await.unwrap();
        assert_eq!(payload, b"hello");
    }
}

use super::{read_frame, write_frame};
use crate::{
    cookie_value, decode_reply, encode_session, BusRequest, BusResponse, BusSession,
    BUS_SOCKET_PATH,
};
use anyhow::{Error, Result};
use std::path::Path;
use tokio::net::UnixStream;

/// Convenient wrapper for accessing the bus on the default socket.
///
/// ## Arguments
///
/// * `requests` a vector of `BusRequest` requests to make.
///
/// **Returns** Either an error, or a vector of `BusResponse` replies
pub async fn bus_request(requests: Vec<BusRequest>) -> Result<Vec<BusResponse>> {
    bus_request_at(Path::new(BUS_SOCKET_PATH), requests).await
}

/// Same as [`bus_request`], against an explicit socket path (the daemon
/// may have been started with `--bind`).
pub async fn bus_request_at(
    socket_path: &Path,
    requests: Vec<BusRequest>,
) -> Result<Vec<BusResponse>> {
    let stream = UnixStream::connect(socket_path).await;
    if let Err(e) = &stream {
        if e.kind() == std::io::ErrorKind::NotFound {
            return Err(Error::msg(format!(
                "{} not found. Check permissions and that tsnd is running.",
                socket_path.display()
            )));
        }
    }
    let mut stream = stream?;

    let session = BusSession {
        auth_cookie: cookie_value(),
        requests,
    };
    let message = encode_session(&session)?;
    write_frame(&mut stream, &message).await?;

    let payload = read_frame(&mut stream).await?;
    let reply = decode_reply(&payload)?;
    if reply.auth_cookie != cookie_value() {
        return Err(Error::msg("tsnd replied with an unexpected cookie"));
    }

    Ok(reply.responses)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::UnixSocketServer;
    use std::time::Duration;

    #[tokio::test]
    async fn client_round_trips_through_the_server() {
        let path = std::env::temp_dir().join(format!("tsn-bus-test-{}.sock", std::process::id()));
        let server = UnixSocketServer::new(&path).unwrap();
        tokio::spawn(async move {
            let _ = server
                .listen(|requests| requests.iter().map(|_| BusResponse::Ack).collect())
                .await;
        });

        // the listener binds asynchronously; retry until it answers
        for _ in 0..50 {
            match bus_request_at(&path, vec![BusRequest::Ping]).await {
                Ok(responses) => {
                    assert_eq!(responses, vec![BusResponse::Ack]);
                    let _ = std::fs::remove_file(&path);
                    return;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
        panic!("server never answered");
    }
}

use super::{decode_session, encode_reply, read_frame, write_frame};
use crate::{cookie_value, BusReply, BusRequest, BusResponse};
use std::fs::remove_file;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

/// Implements a Tokio-friendly server using Unix Sockets and the bus
/// protocol. Requests are decoded and forwarded to the handler.
pub struct UnixSocketServer {
    socket_path: PathBuf,
}

/// Errors raised by the socket server lifecycle.
#[derive(Debug, Error)]
pub enum UnixSocketServerError {
    /// A stale socket file existed and could not be removed.
    #[error("unable to remove stale socket file")]
    RmSocketFail,
    /// Binding the listener failed.
    #[error("unable to bind the bus socket")]
    BindFail,
    /// Accepting a connection failed.
    #[error("unable to accept bus connections")]
    ListenFail,
}

impl UnixSocketServer {
    /// Creates a new `UnixSocketServer` bound-to-be at `socket_path`.
    /// Will delete any pre-existing socket file.
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Result<Self, UnixSocketServerError> {
        let socket_path = socket_path.as_ref().to_path_buf();
        Self::delete_socket_file(&socket_path)?;
        Ok(Self { socket_path })
    }

    /// We can't guarantee that Drop will be called on a process exit,
    /// so provide a mechanism to explicitly call the cleanup for
    /// signal handling.
    pub fn signal_cleanup<P: AsRef<Path>>(socket_path: P) {
        let _ = Self::delete_socket_file(socket_path.as_ref()); // Ignore result
    }

    fn delete_socket_file(socket_path: &Path) -> Result<(), UnixSocketServerError> {
        if socket_path.exists() {
            remove_file(socket_path).map_err(|e| {
                warn!("Unable to remove {}: {e:?}", socket_path.display());
                UnixSocketServerError::RmSocketFail
            })?;
        }
        Ok(())
    }

    /// Start listening for bus sessions, forwarding each request batch
    /// to `handler`. Only returns when the listener breaks.
    pub async fn listen<F>(&self, handler: F) -> Result<(), UnixSocketServerError>
    where
        F: Fn(&[BusRequest]) -> Vec<BusResponse> + Clone + Send + Sync + 'static,
    {
        let listener = UnixListener::bind(&self.socket_path).map_err(|e| {
            warn!("Unable to bind {}: {e:?}", self.socket_path.display());
            UnixSocketServerError::BindFail
        })?;
        info!("Listening on: {}", self.socket_path.display());
        loop {
            let (mut socket, _) = listener.accept().await.map_err(|e| {
                warn!("Unable to accept connection: {e:?}");
                UnixSocketServerError::ListenFail
            })?;
            let handler = handler.clone();
            tokio::spawn(async move {
                let payload = match read_frame(&mut socket).await {
                    Ok(payload) => payload,
                    Err(e) => {
                        debug!("Unable to read session frame: {e:?}");
                        return;
                    }
                };
                let Ok(session) = decode_session(&payload) else {
                    warn!("Invalid data on local socket");
                    return;
                };
                if session.auth_cookie != cookie_value() {
                    warn!("Rejecting session with invalid cookie");
                    return;
                }
                debug!("Received {} request(s)", session.requests.len());

                let reply = BusReply {
                    auth_cookie: session.auth_cookie,
                    responses: handler(&session.requests),
                };
                let Ok(encoded) = encode_reply(&reply) else {
                    warn!("Unable to encode bus reply");
                    return;
                };
                if let Err(e) = write_frame(&mut socket, &encoded).await {
                    debug!("Unable to write reply: {e:?}");
                }
            });
        }
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        let _ = Self::delete_socket_file(&self.socket_path); // Ignore result
    }
}

//! IPC (Inter-Process Communication) via Unix sockets
//!
//! Carries bridge traffic between the guest runtime and the host process.
//! Uses length-prefixed JSON over Unix domain sockets.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

mod messages;
pub use messages::{BridgeRequest, BridgeResponse, EnvelopeField};

use crate::constants::ipc::{MAX_MESSAGE_SIZE, SOCKET_DIR, SOCKET_NAME};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(SOCKET_DIR).join(SOCKET_NAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(SOCKET_DIR).join(SOCKET_NAME))
}

/// Server listener owned by the host process
pub struct HostListener {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl HostListener {
    /// Create listener and bind to specific socket path
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept the next guest connection
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept IPC connection")?;
        Ok(stream)
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for HostListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
pub async fn write_message<W, T>(stream: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", json.len(), MAX_MESSAGE_SIZE));
    }

    // Length prefix (u32 little-endian)
    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .await
        .context("Failed to write message length")?;

    stream
        .write_all(&json)
        .await
        .context("Failed to write message payload")?;

    stream.flush().await.context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
pub async fn read_message<R, T>(stream: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check before allocating
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .await
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}

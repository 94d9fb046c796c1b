//! Bridge to a host process listening on a Unix socket
//!
//! Every envelope field is read with its own request, so the host answers
//! `success`, `error` and `data` independently of the original invoke.

use futures::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{BridgeError, EnvelopeFields, HostObject, HostObjects};
use crate::ipc::{read_message, write_message, BridgeRequest, BridgeResponse, EnvelopeField};

/// One request/response exchange at a time over a shared stream
#[derive(Clone)]
struct IpcConnection {
    stream: Arc<Mutex<UnixStream>>,
}

impl IpcConnection {
    async fn request(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let mut stream = self.stream.lock().await;
        write_message(&mut *stream, &request)
            .await
            .map_err(BridgeError::transport)?;
        let response = read_message(&mut *stream)
            .await
            .map_err(BridgeError::transport)?;

        match response {
            BridgeResponse::Error(message) => Err(BridgeError::Transport(message)),
            other => Ok(other),
        }
    }
}

fn unexpected(response: BridgeResponse) -> BridgeError {
    BridgeError::Transport(format!("unexpected response: {:?}", response))
}

/// Host registry reached over IPC
pub struct IpcHost {
    conn: IpcConnection,
    objects: Vec<String>,
}

impl IpcHost {
    /// Connect and list the host's registered objects
    pub async fn connect(path: &Path) -> Result<Self, BridgeError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| BridgeError::Transport(format!("{}: {}", path.display(), e)))?;
        let conn = IpcConnection {
            stream: Arc::new(Mutex::new(stream)),
        };

        let objects = match conn.request(BridgeRequest::ListObjects).await? {
            BridgeResponse::Objects(names) => names,
            other => return Err(unexpected(other)),
        };
        info!(socket = %path.display(), objects = ?objects, "Connected to host");

        Ok(Self { conn, objects })
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }
}

impl HostObjects for IpcHost {
    fn host_object(&self, name: &str) -> Option<Arc<dyn HostObject>> {
        if !self.objects.iter().any(|o| o == name) {
            debug!(object = name, "Host object not registered");
            return None;
        }
        Some(Arc::new(IpcObject {
            conn: self.conn.clone(),
            name: name.to_string(),
        }))
    }
}

struct IpcObject {
    conn: IpcConnection,
    name: String,
}

impl HostObject for IpcObject {
    fn call<'a>(
        &'a self,
        method: &'a str,
        args: Vec<String>,
    ) -> BoxFuture<'a, Result<Box<dyn EnvelopeFields>, BridgeError>> {
        Box::pin(async move {
            let request = BridgeRequest::Invoke {
                object: self.name.clone(),
                method: method.to_string(),
                args,
            };
            match self.conn.request(request).await? {
                BridgeResponse::Envelope { handle } => Ok(Box::new(IpcEnvelope {
                    conn: self.conn.clone(),
                    handle,
                }) as Box<dyn EnvelopeFields>),
                other => Err(unexpected(other)),
            }
        })
    }
}

struct IpcEnvelope {
    conn: IpcConnection,
    handle: u64,
}

impl IpcEnvelope {
    async fn read_text(&self, field: EnvelopeField) -> Result<Option<String>, BridgeError> {
        let request = BridgeRequest::ReadField {
            handle: self.handle,
            field,
        };
        match self.conn.request(request).await? {
            BridgeResponse::Text(text) => Ok(text),
            other => Err(unexpected(other)),
        }
    }
}

impl EnvelopeFields for IpcEnvelope {
    fn success(&mut self) -> BoxFuture<'_, Result<bool, BridgeError>> {
        Box::pin(async move {
            let request = BridgeRequest::ReadField {
                handle: self.handle,
                field: EnvelopeField::Success,
            };
            match self.conn.request(request).await? {
                BridgeResponse::Success(success) => Ok(success),
                other => Err(unexpected(other)),
            }
        })
    }

    fn error(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
        Box::pin(self.read_text(EnvelopeField::Error))
    }

    fn data(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
        Box::pin(self.read_text(EnvelopeField::Data))
    }

    fn release(&mut self) -> BoxFuture<'_, Result<(), BridgeError>> {
        Box::pin(async move {
            match self
                .conn
                .request(BridgeRequest::Release {
                    handle: self.handle,
                })
                .await?
            {
                BridgeResponse::Released => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }
}

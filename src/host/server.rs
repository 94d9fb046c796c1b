//! IPC server loop for guest connections

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::UnixStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::HostRuntime;
use crate::bridge::Envelope;
use crate::ipc::{read_message, write_message, BridgeRequest, BridgeResponse, EnvelopeField, HostListener};

/// Envelopes handed out on one guest connection
#[derive(Default)]
struct Connection {
    envelopes: HashMap<u64, Envelope>,
    next_handle: u64,
}

impl Connection {
    fn handle(&mut self, runtime: &HostRuntime, request: BridgeRequest) -> BridgeResponse {
        match request {
            BridgeRequest::ListObjects => BridgeResponse::Objects(runtime.object_names()),

            BridgeRequest::Invoke {
                object,
                method,
                args,
            } => {
                debug!(object = %object, method = %method, "Guest invoked host method");
                let envelope = runtime.invoke(&object, &method, &args);
                self.next_handle += 1;
                self.envelopes.insert(self.next_handle, envelope);
                BridgeResponse::Envelope {
                    handle: self.next_handle,
                }
            }

            BridgeRequest::ReadField { handle, field } => match self.envelopes.get(&handle) {
                Some(envelope) => match field {
                    EnvelopeField::Success => BridgeResponse::Success(envelope.success),
                    EnvelopeField::Error => BridgeResponse::Text(envelope.error.clone()),
                    EnvelopeField::Data => BridgeResponse::Text(envelope.data.clone()),
                },
                None => BridgeResponse::Error(format!("unknown envelope handle {handle}")),
            },

            BridgeRequest::Release { handle } => {
                if self.envelopes.remove(&handle).is_none() {
                    debug!(handle, "Release of unknown envelope handle");
                }
                BridgeResponse::Released
            }
        }
    }
}

/// Accept guests one at a time until shutdown is requested
pub async fn serve(runtime: Arc<HostRuntime>, listener: HostListener) -> Result<()> {
    info!(socket = %listener.path().display(), "Host listening");
    let mut shutdown = runtime.state().shutdown_signal();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let stream = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = shutdown.wait_for(|quit| *quit) => break,
        };

        info!("Guest connected");
        if let Err(e) = serve_connection(&runtime, stream, shutdown.clone()).await {
            warn!(error = ?e, "Guest connection failed");
        }
        info!("Guest disconnected");
    }

    info!("Host shutting down");
    Ok(())
}

/// Serve one guest until it disconnects
///
/// Once shutdown is requested the connection stays open only until the
/// guest has released every envelope it still holds.
async fn serve_connection(
    runtime: &HostRuntime,
    mut stream: UnixStream,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut connection = Connection::default();

    loop {
        let idle = connection.envelopes.is_empty();
        if idle && *shutdown.borrow() {
            info!("Closing guest connection for shutdown");
            return Ok(());
        }

        let request = tokio::select! {
            request = read_message::<_, BridgeRequest>(&mut stream) => request,
            _ = shutdown.wait_for(|quit| *quit), if idle => continue,
        };

        let request = match request {
            Ok(request) => request,
            Err(e) => {
                debug!(error = ?e, "Guest stream closed");
                return Ok(());
            }
        };

        let response = connection.handle(runtime, request);
        write_message(&mut stream, &response).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ipc_host::IpcHost;
    use crate::bridge::BridgeClient;
    use crate::capabilities::{AppApi, SettingsApi};
    use crate::host::tests::headless_runtime;
    use crate::settings::{SettingsPatch, Theme};
    use std::path::PathBuf;
    use std::time::Duration;

    fn scratch_socket(label: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("notepin-sock-{}-{}", std::process::id(), label))
            .join("host.sock")
    }

    #[test]
    fn test_envelope_table_lifecycle() {
        let runtime = headless_runtime("table");
        let mut connection = Connection::default();

        let response = connection.handle(
            &runtime,
            BridgeRequest::Invoke {
                object: "app".to_string(),
                method: "GetVersion".to_string(),
                args: Vec::new(),
            },
        );
        let handle = match response {
            BridgeResponse::Envelope { handle } => handle,
            other => panic!("expected envelope handle, got {other:?}"),
        };

        let read = |connection: &mut Connection, field| {
            connection.handle(&runtime, BridgeRequest::ReadField { handle, field })
        };
        assert_eq!(read(&mut connection, EnvelopeField::Success), BridgeResponse::Success(true));
        assert_eq!(read(&mut connection, EnvelopeField::Error), BridgeResponse::Text(None));
        assert_eq!(
            read(&mut connection, EnvelopeField::Data),
            BridgeResponse::Text(Some(env!("CARGO_PKG_VERSION").to_string()))
        );

        assert_eq!(
            connection.handle(&runtime, BridgeRequest::Release { handle }),
            BridgeResponse::Released
        );
        assert!(matches!(
            read(&mut connection, EnvelopeField::Success),
            BridgeResponse::Error(_)
        ));
    }

    #[tokio::test]
    async fn test_round_trip_over_socket() {
        let runtime = Arc::new(headless_runtime("socket"));
        let socket = scratch_socket("round-trip");
        let listener = HostListener::bind_to(socket.clone()).unwrap();
        let server = tokio::spawn(serve(Arc::clone(&runtime), listener));

        let host = IpcHost::connect(&socket).await.unwrap();
        assert_eq!(host.objects(), ["app", "settings"]);
        let client = BridgeClient::with_host(Arc::new(host));

        let app = AppApi::new(client.clone());
        assert_eq!(app.get_version().await, env!("CARGO_PKG_VERSION"));
        app.toggle_overlay().await.unwrap();
        assert!(runtime.state().overlay_visible());

        let settings = SettingsApi::new(client);
        let patch = SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        assert!(settings.update_settings(&patch).await);
        assert_eq!(settings.get_settings().await.unwrap().theme, Theme::Dark);
        assert_eq!(runtime.state().file().load_or_create().theme, Theme::Dark);

        app.show_message("Settings saved").await.unwrap();

        app.quit_application().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket_fails() {
        let socket = scratch_socket("missing");
        assert!(IpcHost::connect(&socket).await.is_err());
    }
}

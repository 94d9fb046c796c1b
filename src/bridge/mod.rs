//! Guest-side bridge to host capabilities
//!
//! A capability is reachable only when the whole chain resolves: a host
//! connection is configured, the host answers, its object registry is listed,
//! and the named object is registered. When any link is missing the bridge
//! reports the capability as absent and callers switch to their local
//! fallbacks instead of failing.

mod envelope;
mod error;
pub mod ipc_host;
pub mod local;

pub use envelope::{unwrap_envelope, Envelope, EnvelopeFields, Expect, ResolvedEnvelope};
pub use error::BridgeError;

use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// A host object as seen from the guest
pub trait HostObject: Send + Sync {
    /// Start a method call and return a handle to its envelope
    fn call<'a>(
        &'a self,
        method: &'a str,
        args: Vec<String>,
    ) -> BoxFuture<'a, Result<Box<dyn EnvelopeFields>, BridgeError>>;
}

/// The host-object registry exposed to the guest
pub trait HostObjects: Send + Sync {
    fn host_object(&self, name: &str) -> Option<Arc<dyn HostObject>>;
}

/// Entry point for guest code; cheap to clone
#[derive(Clone, Default)]
pub struct BridgeClient {
    host: Option<Arc<dyn HostObjects>>,
}

impl fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeClient")
            .field("host", &self.host.is_some())
            .finish()
    }
}

impl BridgeClient {
    /// Client for an environment without a host
    pub fn absent() -> Self {
        Self { host: None }
    }

    pub fn with_host(host: Arc<dyn HostObjects>) -> Self {
        Self { host: Some(host) }
    }

    /// Resolve a named capability, or `None` when the bridge is absent
    pub fn capability(&self, name: &'static str) -> Option<Capability> {
        let object = self.host.as_ref()?.host_object(name)?;
        Some(Capability { name, object })
    }

    pub fn is_available(&self, name: &'static str) -> bool {
        self.capability(name).is_some()
    }
}

/// A resolved host capability
#[derive(Clone)]
pub struct Capability {
    name: &'static str,
    object: Arc<dyn HostObject>,
}

impl Capability {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Call a method and unwrap its envelope
    ///
    /// The envelope is released on the host once its fields have been read,
    /// whatever the outcome.
    pub async fn invoke(
        &self,
        method: &str,
        args: Vec<String>,
        expect: Expect,
    ) -> Result<Option<String>, BridgeError> {
        debug!(capability = self.name, method, "Invoking host method");
        let mut envelope = self.object.call(method, args).await?;
        let outcome = unwrap_envelope(envelope.as_mut(), expect).await;
        if let Err(e) = envelope.release().await {
            error!(capability = self.name, method, error = %e, "Failed to release envelope");
        }
        outcome
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Host double answering every call with a canned envelope
    #[derive(Default)]
    pub(crate) struct ScriptedHost {
        pub(crate) replies: Mutex<HashMap<(String, String), Envelope>>,
        pub(crate) calls: Arc<Mutex<Vec<(String, String, Vec<String>)>>>,
        pub(crate) released: Arc<Mutex<usize>>,
    }

    impl ScriptedHost {
        pub(crate) fn reply(self, object: &str, method: &str, envelope: Envelope) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert((object.to_string(), method.to_string()), envelope);
            self
        }
    }

    struct ScriptedObject {
        name: String,
        host: Arc<ScriptedHost>,
    }

    struct CountedEnvelope {
        inner: ResolvedEnvelope,
        released: Arc<Mutex<usize>>,
    }

    impl EnvelopeFields for CountedEnvelope {
        fn success(&mut self) -> BoxFuture<'_, Result<bool, BridgeError>> {
            self.inner.success()
        }
        fn error(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
            self.inner.error()
        }
        fn data(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
            self.inner.data()
        }
        fn release(&mut self) -> BoxFuture<'_, Result<(), BridgeError>> {
            *self.released.lock().unwrap() += 1;
            Box::pin(async { Ok(()) })
        }
    }

    impl HostObject for ScriptedObject {
        fn call<'a>(
            &'a self,
            method: &'a str,
            args: Vec<String>,
        ) -> BoxFuture<'a, Result<Box<dyn EnvelopeFields>, BridgeError>> {
            Box::pin(async move {
                self.host
                    .calls
                    .lock()
                    .unwrap()
                    .push((self.name.clone(), method.to_string(), args));
                let envelope = self
                    .host
                    .replies
                    .lock()
                    .unwrap()
                    .get(&(self.name.clone(), method.to_string()))
                    .cloned()
                    .unwrap_or_else(Envelope::ok);
                Ok(Box::new(CountedEnvelope {
                    inner: ResolvedEnvelope(envelope),
                    released: Arc::clone(&self.host.released),
                }) as Box<dyn EnvelopeFields>)
            })
        }
    }

    /// Registry over a shared [`ScriptedHost`] exposing the given object names
    pub(crate) struct ScriptedRegistry {
        pub(crate) host: Arc<ScriptedHost>,
        pub(crate) names: Vec<&'static str>,
    }

    impl HostObjects for ScriptedRegistry {
        fn host_object(&self, name: &str) -> Option<Arc<dyn HostObject>> {
            self.names.contains(&name).then(|| {
                Arc::new(ScriptedObject {
                    name: name.to_string(),
                    host: Arc::clone(&self.host),
                }) as Arc<dyn HostObject>
            })
        }
    }

    pub(crate) fn scripted_client(
        host: ScriptedHost,
        names: Vec<&'static str>,
    ) -> (BridgeClient, Arc<ScriptedHost>) {
        let host = Arc::new(host);
        let registry = ScriptedRegistry {
            host: Arc::clone(&host),
            names,
        };
        (BridgeClient::with_host(Arc::new(registry)), host)
    }

    #[test]
    fn test_absent_bridge_has_no_capabilities() {
        let client = BridgeClient::absent();
        assert!(!client.is_available("app"));
        assert!(client.capability("settings").is_none());
    }

    #[test]
    fn test_unregistered_capability_is_absent() {
        let (client, _) = scripted_client(ScriptedHost::default(), vec!["app"]);
        assert!(client.is_available("app"));
        assert!(!client.is_available("settings"));
    }

    #[tokio::test]
    async fn test_invoke_passes_args_and_releases_envelope() {
        let (client, host) = scripted_client(
            ScriptedHost::default().reply("app", "GetVersion", Envelope::with_data("2.0.1")),
            vec!["app"],
        );
        let app = client.capability("app").unwrap();

        let data = app.invoke("GetVersion", vec![], Expect::Value).await.unwrap();
        assert_eq!(data.as_deref(), Some("2.0.1"));

        app.invoke("ShowMessage", vec!["hi".to_string()], Expect::Nothing)
            .await
            .unwrap();

        let calls = host.calls.lock().unwrap();
        assert_eq!(calls[1], ("app".to_string(), "ShowMessage".to_string(), vec!["hi".to_string()]));
        assert_eq!(*host.released.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invoke_releases_even_on_failure() {
        let (client, host) = scripted_client(
            ScriptedHost::default().reply("app", "QuitApplication", Envelope::failure("busy")),
            vec!["app"],
        );
        let err = client
            .capability("app")
            .unwrap()
            .invoke("QuitApplication", vec![], Expect::Nothing)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "busy");
        assert_eq!(*host.released.lock().unwrap(), 1);
    }
}

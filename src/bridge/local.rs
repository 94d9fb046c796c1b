//! In-process bridge to a host runtime living in the same process

use futures::future::BoxFuture;
use std::sync::Arc;

use super::{BridgeError, EnvelopeFields, HostObject, HostObjects, ResolvedEnvelope};
use crate::host::{HostCapability, HostRuntime};

/// Host registry backed directly by a [`HostRuntime`]
pub struct LocalHost {
    runtime: Arc<HostRuntime>,
}

impl LocalHost {
    pub fn new(runtime: Arc<HostRuntime>) -> Self {
        Self { runtime }
    }
}

impl HostObjects for LocalHost {
    fn host_object(&self, name: &str) -> Option<Arc<dyn HostObject>> {
        let capability = self.runtime.object(name)?;
        Some(Arc::new(LocalObject { capability }))
    }
}

struct LocalObject {
    capability: Arc<dyn HostCapability>,
}

impl HostObject for LocalObject {
    fn call<'a>(
        &'a self,
        method: &'a str,
        args: Vec<String>,
    ) -> BoxFuture<'a, Result<Box<dyn EnvelopeFields>, BridgeError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let envelope = self.capability.call(method, &args);
            Ok(Box::new(ResolvedEnvelope(envelope)) as Box<dyn EnvelopeFields>)
        })
    }
}

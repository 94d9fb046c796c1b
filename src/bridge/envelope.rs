//! Uniform result shape returned by every host method

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::BridgeError;
use crate::constants::messages;

/// Result of one host method call, as produced on the host side
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }
}

/// Guest view of an envelope whose fields resolve independently
///
/// Over a real host boundary each field read is its own round trip, so the
/// host may still be completing the operation when `success` is requested.
pub trait EnvelopeFields: Send {
    fn success(&mut self) -> BoxFuture<'_, Result<bool, BridgeError>>;
    fn error(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>>;
    fn data(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>>;

    /// Let the host forget this envelope
    fn release(&mut self) -> BoxFuture<'_, Result<(), BridgeError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Whether the caller needs a value back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Void call; missing data is fine
    Nothing,
    /// Value-returning call; missing data is a failure
    Value,
}

/// Resolve an envelope into its data or an error
///
/// Reads `success`, then `error`, then `data`, each awaited before the next.
pub async fn unwrap_envelope(
    fields: &mut dyn EnvelopeFields,
    expect: Expect,
) -> Result<Option<String>, BridgeError> {
    let success = fields.success().await?;
    let error = fields.error().await?;
    let data = fields.data().await?;

    if !success {
        return Err(BridgeError::Host(
            error.unwrap_or_else(|| messages::UNKNOWN_ERROR.to_string()),
        ));
    }

    let data = data.filter(|d| !d.is_empty());
    if data.is_none() && expect == Expect::Value {
        return Err(BridgeError::NoData);
    }
    Ok(data)
}

/// Envelope already computed in-process; each field resolves after a yield
#[derive(Debug)]
pub struct ResolvedEnvelope(pub Envelope);

impl EnvelopeFields for ResolvedEnvelope {
    fn success(&mut self) -> BoxFuture<'_, Result<bool, BridgeError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(self.0.success)
        })
    }

    fn error(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(self.0.error.clone())
        })
    }

    fn data(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(self.0.data.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Envelope that records the order its fields were read in
    struct TracedEnvelope {
        inner: Envelope,
        reads: Arc<Mutex<Vec<&'static str>>>,
    }

    impl EnvelopeFields for TracedEnvelope {
        fn success(&mut self) -> BoxFuture<'_, Result<bool, BridgeError>> {
            self.reads.lock().unwrap().push("success");
            Box::pin(async move { Ok(self.inner.success) })
        }

        fn error(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
            self.reads.lock().unwrap().push("error");
            Box::pin(async move { Ok(self.inner.error.clone()) })
        }

        fn data(&mut self) -> BoxFuture<'_, Result<Option<String>, BridgeError>> {
            self.reads.lock().unwrap().push("data");
            Box::pin(async move { Ok(self.inner.data.clone()) })
        }
    }

    async fn unwrap(envelope: Envelope, expect: Expect) -> Result<Option<String>, BridgeError> {
        unwrap_envelope(&mut ResolvedEnvelope(envelope), expect).await
    }

    #[tokio::test]
    async fn test_fields_read_in_order() {
        let reads = Arc::new(Mutex::new(Vec::new()));
        let mut envelope = TracedEnvelope {
            inner: Envelope::with_data("1.2.3"),
            reads: Arc::clone(&reads),
        };

        let data = unwrap_envelope(&mut envelope, Expect::Value).await.unwrap();
        assert_eq!(data.as_deref(), Some("1.2.3"));
        assert_eq!(*reads.lock().unwrap(), vec!["success", "error", "data"]);
    }

    #[tokio::test]
    async fn test_missing_data_on_value_call_is_no_data() {
        let err = unwrap(Envelope::ok(), Expect::Value).await.unwrap_err();
        assert!(matches!(err, BridgeError::NoData));
        assert_eq!(err.to_string(), "No data returned from connector");
    }

    #[tokio::test]
    async fn test_missing_data_on_void_call_is_fine() {
        assert_eq!(unwrap(Envelope::ok(), Expect::Nothing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_carries_host_message() {
        let err = unwrap(Envelope::failure("X"), Expect::Nothing).await.unwrap_err();
        assert_eq!(err.to_string(), "X");
    }

    #[tokio::test]
    async fn test_failure_without_message_uses_generic_text() {
        let envelope = Envelope {
            success: false,
            error: None,
            data: None,
        };
        let err = unwrap(envelope, Expect::Value).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown error occurred");
    }

    #[test]
    fn test_wire_shape_omits_absent_fields() {
        let json = serde_json::to_string(&Envelope::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}

//! IPC message types for guest ↔ host communication

use serde::{Deserialize, Serialize};

/// Envelope field addressed by a [`BridgeRequest::ReadField`]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeField {
    Success,
    Error,
    Data,
}

/// Requests sent from the guest to the host
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BridgeRequest {
    /// List the names of the registered host objects
    ListObjects,

    /// Call a method; the host answers with an envelope handle
    Invoke {
        object: String,
        method: String,
        args: Vec<String>,
    },

    /// Read one field of a previously returned envelope
    ReadField { handle: u64, field: EnvelopeField },

    /// Forget an envelope
    Release { handle: u64 },
}

/// Responses sent from the host to the guest
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BridgeResponse {
    /// Registered host object names (response to ListObjects)
    Objects(Vec<String>),

    /// Handle of the envelope produced by an Invoke
    Envelope { handle: u64 },

    /// Value of the `success` field
    Success(bool),

    /// Value of the `error` or `data` field
    Text(Option<String>),

    /// Acknowledgment of a Release
    Released,

    /// The request itself could not be served
    Error(String),
}

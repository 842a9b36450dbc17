//! The success/message envelope wrapping every result that crosses a
//! transport boundary.
//!
//! A server-side error is translated into a message whose code identifies
//! its place in the error taxonomy before serialization; the client-side
//! deserializer inspects the success flag and re-raises the corresponding
//! typed error. Remote verb calls therefore behave, to the caller,
//! indistinguishably from local ones with respect to error handling.
//!
//! Transport-level failures (connection refused, timeout, malformed frame)
//! are never wrapped: no well-formed response was received, so the connector
//! raises them directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, connector::ConnectorError, provider::ProviderError};

/// Message severity, serialized as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MessageLevel {
    Unspecified = 0,
    Debug = 1,
    Information = 2,
    Warning = 3,
    Exception = 4,
}

/// Taxonomy code: path segment had no corresponding key/index.
pub const CODE_RESOURCE_NOT_FOUND: &str = "404";
/// Taxonomy code: verb/node kind mismatch, malformed address or frame.
pub const CODE_MALFORMED_REQUEST: &str = "400";
/// Taxonomy code: no connector factory for the address's scheme.
pub const CODE_UNSUPPORTED_SCHEME: &str = "501";
/// Taxonomy code: any other server-side failure.
pub const CODE_PROVIDER_FAILURE: &str = "500";

/// One entry of an envelope's ordered message list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Severity, see [`MessageLevel`].
    pub message_type: i32,
    /// Taxonomy code, when the message carries one.
    pub code: Option<String>,
    /// Human-readable text.
    pub text: String,
}

/// The wire envelope around every verb result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_exception: Option<bool>,
}

impl Envelope {
    /// A successful result carrying a payload.
    pub fn ok(entity: Value, entity_type: impl Into<String>) -> Self {
        Envelope {
            success: true,
            entity: Some(entity),
            entity_type: Some(entity_type.into()),
            messages: Vec::new(),
            is_exception: None,
        }
    }

    /// A successful result with no payload (set/create/delete).
    pub fn ok_empty() -> Self {
        Envelope {
            success: true,
            entity: None,
            entity_type: None,
            messages: Vec::new(),
            is_exception: None,
        }
    }

    /// Translates a server-side error into a failure envelope.
    pub fn from_error(error: &Error) -> Self {
        Envelope {
            success: false,
            entity: None,
            entity_type: None,
            messages: vec![Message {
                message_type: MessageLevel::Exception as i32,
                code: Some(code_for(error).to_string()),
                text: error.to_string(),
            }],
            is_exception: Some(true),
        }
    }

    /// Unwraps the envelope on the receiving side: a success yields the
    /// optional payload, a failure re-raises the typed error its code
    /// indicates.
    pub fn into_result(self) -> Result<Option<Value>> {
        if self.success {
            return Ok(self.entity);
        }
        let message = self
            .messages
            .into_iter()
            .find(|m| m.code.is_some())
            .unwrap_or(Message {
                message_type: MessageLevel::Exception as i32,
                code: None,
                text: "remote call failed without diagnostic messages".to_string(),
            });
        Err(error_for(message.code.as_deref(), message.text))
    }
}

/// Maps an error onto its taxonomy code.
pub fn code_for(error: &Error) -> &'static str {
    match error {
        Error::Provider(ProviderError::ResourceNotFound { .. }) => CODE_RESOURCE_NOT_FOUND,
        Error::Provider(ProviderError::MalformedRequest { .. }) => CODE_MALFORMED_REQUEST,
        Error::Address(_) | Error::Wire(_) => CODE_MALFORMED_REQUEST,
        Error::Connector(ConnectorError::UnsupportedScheme { .. }) => CODE_UNSUPPORTED_SCHEME,
        _ => CODE_PROVIDER_FAILURE,
    }
}

/// Reconstructs the typed error a taxonomy code stands for.
///
/// The message text is the remote error's display form; where it matches
/// the local display template the original field is recovered, otherwise
/// the full text is carried through.
fn error_for(code: Option<&str>, text: String) -> Error {
    match code {
        Some(CODE_RESOURCE_NOT_FOUND) => {
            let path = strip_template(&text, "Resource not found at '", "'");
            ProviderError::not_found(path).into()
        }
        Some(CODE_MALFORMED_REQUEST) => {
            let reason = strip_template(&text, "Malformed request: ", "");
            ProviderError::malformed(reason).into()
        }
        Some(CODE_UNSUPPORTED_SCHEME) => {
            let scheme = strip_template(&text, "Unsupported scheme '", "'");
            ConnectorError::UnsupportedScheme { scheme }.into()
        }
        _ => ProviderError::failure(text).into(),
    }
}

fn strip_template(text: &str, prefix: &str, suffix: &str) -> String {
    text.strip_prefix(prefix)
        .and_then(|s| s.strip_suffix(suffix))
        .unwrap_or(text)
        .to_string()
}

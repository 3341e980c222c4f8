//! Driver log records and the DevTools network events inside them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// One record from the driver's log endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub level: String,
    /// For `performance` logs, a JSON document wrapping a DevTools event.
    pub message: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// A decoded DevTools protocol event, e.g. `Network.requestWillBeSent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl NetworkEvent {
    /// `params.request.url`, present on request events.
    pub fn request_url(&self) -> Option<&str> {
        self.params.get("request")?.get("url")?.as_str()
    }

    pub fn is_request(&self) -> bool {
        self.method.contains("Network.requestWillBeSent")
    }
}

#[derive(Deserialize)]
struct Envelope {
    message: NetworkEvent,
}

/// Decode a `performance` log entry into its inner event.
pub fn process_request_entry(entry: &LogEntry) -> Result<NetworkEvent> {
    let envelope: Envelope = serde_json::from_str(&entry.message)?;
    Ok(envelope.message)
}

//! Log record type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::Level;

/// One structured log event. Immutable once constructed.
///
/// The optional attachment serializes as `object`, matching the shape the
/// workers put on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub component: String,
    pub level: Level,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

impl LogRecord {
    pub fn new(
        component: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        object: Option<Value>,
    ) -> Self {
        Self {
            component: component.into(),
            level,
            message: message.into(),
            object,
        }
    }
}

use serde::{Deserialize, Serialize};

/// Conditional-fetch state remembered for one URL.
///
/// Both fields hold the raw header values the server sent. A `None` field
/// means nothing is known yet and no precondition is sent for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ResourceMetadata {
    pub fn new(last_modified: Option<String>, etag: Option<String>) -> Self {
        Self {
            last_modified,
            etag,
        }
    }
}

pub mod bucket_handlers;
pub mod health_handlers;
pub mod object_handlers;

use serde::Serialize;
use utoipa::ToSchema;

/// Body of every plain success response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a prefix-scoped bulk operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkResponse {
    pub message: String,
    pub matched: usize,
}

/// Query values that are present but empty count as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

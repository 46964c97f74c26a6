use bytes::Bytes;

use crate::{JSON_CONTENT_TYPE, MESSAGES_PATH, SUBMIT_VERB};

// ── Status codes ─────────────────────────────────────────────────────────────

pub mod status {
    pub const OK: u16 = 200;
    pub const NOT_FOUND: u16 = 404;
}

// ── Frames ───────────────────────────────────────────────────────────────────

/// One stream of a streaming request. Stream 0 is the primary body; any
/// further streams carry binary attachment payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStream {
    pub content_type: String,
    pub body: Bytes,
}

/// Bridge → agent (and agent → bridge) request frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingRequest {
    pub id: String,
    pub verb: String,
    pub path: String,
    pub streams: Vec<FrameStream>,
}

impl StreamingRequest {
    /// A `submit` request for the fixed messages endpoint with a JSON
    /// primary body.
    #[must_use]
    pub fn submit(id: impl Into<String>, body: Bytes) -> Self {
        Self {
            id: id.into(),
            verb: SUBMIT_VERB.into(),
            path: MESSAGES_PATH.into(),
            streams: vec![FrameStream {
                content_type: JSON_CONTENT_TYPE.into(),
                body,
            }],
        }
    }

    /// Append an auxiliary stream.
    pub fn push_stream(&mut self, content_type: impl Into<String>, body: Bytes) {
        self.streams.push(FrameStream {
            content_type: content_type.into(),
            body,
        });
    }

    /// The primary body stream, if any.
    pub fn primary(&self) -> Option<&FrameStream> {
        self.streams.first()
    }
}

/// Acknowledgement of a request frame. Carries only a status code.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingResponse {
    pub id: String,
    pub status: u16,
}

impl StreamingResponse {
    #[must_use]
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status::OK,
        }
    }

    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status::NOT_FOUND,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == status::OK
    }
}

//! Activity and frame definitions for the bridge protocol.
//!
//! All traffic to the downstream agent is carried as streaming requests
//! (verb `submit`, path `/api/messages`): stream 0 is the JSON-encoded
//! [`Activity`], streams 1..N carry binary attachment payloads. Responses
//! carry only a status code.

pub mod activity;
pub mod codec;
pub mod error;
pub mod frame;
pub mod wire;

// ── Constants ────────────────────────────────────────────────────────────────

/// The only request verb in the bridge protocol.
pub const SUBMIT_VERB: &str = "submit";
/// The fixed messages endpoint carried in every request.
pub const MESSAGES_PATH: &str = "/api/messages";
/// Origin marker stamped on forwarded activities so the downstream agent
/// addresses replies back through the bridge instead of attempting direct
/// delivery.
pub const BRIDGE_SERVICE_URL: &str = "urn:pontis:relay";
/// Content type of the primary (activity) stream.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Hard cap on a single wire frame, header and stream bodies included.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024; // 16 MiB

pub use {
    activity::{Activity, Attachment, ChannelAccount, ConversationAccount},
    error::{Error, Result},
    frame::{FrameStream, StreamingRequest, StreamingResponse, status},
    wire::WireFrame,
};

//! Activity ↔ frame translation.
//!
//! The outbound path serializes the activity as the single primary stream;
//! outbound attachments are reference-based (URL or inline JSON) and travel
//! inside the body. Only the inbound path reconstructs attachments from
//! auxiliary streams, matching how the downstream agent chunks its own
//! outbound attachments.

use bytes::Bytes;

use crate::{
    activity::{Activity, Attachment},
    error::{Error, Result},
    frame::StreamingRequest,
};

/// Encode an activity into a `submit` request.
pub fn encode_activity(id: impl Into<String>, activity: &Activity) -> Result<StreamingRequest> {
    let body = serde_json::to_vec(activity)?;
    Ok(StreamingRequest::submit(id, Bytes::from(body)))
}

/// Decode a request into an activity, reconstructing attachments carried as
/// auxiliary streams.
///
/// Pure: the same request always decodes to an equivalent activity.
pub fn decode_request(request: &StreamingRequest) -> Result<Activity> {
    let primary = request
        .primary()
        .ok_or_else(|| Error::malformed("request has no streams"))?;
    let parsed: Option<Activity> = serde_json::from_slice(&primary.body)
        .map_err(|e| Error::malformed(format!("primary body is not an activity: {e}")))?;
    let Some(mut activity) = parsed else {
        return Err(Error::malformed(
            "attachment streams present but primary body holds no activity",
        ));
    };

    // Streamed attachments append after any already inline, in stream order.
    for stream in &request.streams[1..] {
        activity
            .attachments
            .push(Attachment::from_stream(stream.content_type.clone(), stream.body.clone()));
    }
    Ok(activity)
}

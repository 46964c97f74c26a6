//! Binary wire envelope shared by both transports.
//!
//! Layout: `[u32 BE header length][header JSON][stream 0 bytes][stream 1
//! bytes]...`. The header declares each stream's content type and length;
//! stream bodies follow in declared order. The pipe transport wraps the
//! envelope in an outer length-delimited frame; the WebSocket transport
//! carries one envelope per binary message.

use {
    bytes::{BufMut, Bytes, BytesMut},
    serde::{Deserialize, Serialize},
};

use crate::{
    MAX_FRAME_BYTES,
    error::{Error, Result},
    frame::{FrameStream, StreamingRequest, StreamingResponse},
};

/// Either direction of wire traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    Request(StreamingRequest),
    Response(StreamingResponse),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum WireHeader {
    #[serde(rename = "req")]
    Request {
        id: String,
        verb: String,
        path: String,
        streams: Vec<StreamHeader>,
    },
    #[serde(rename = "res")]
    Response { id: String, status: u16 },
}

#[derive(Debug, Serialize, Deserialize)]
struct StreamHeader {
    #[serde(rename = "contentType")]
    content_type: String,
    length: u64,
}

/// Encode a frame into a wire envelope.
pub fn encode(frame: &WireFrame) -> Result<Bytes> {
    let header = match frame {
        WireFrame::Request(request) => WireHeader::Request {
            id: request.id.clone(),
            verb: request.verb.clone(),
            path: request.path.clone(),
            streams: request
                .streams
                .iter()
                .map(|s| StreamHeader {
                    content_type: s.content_type.clone(),
                    length: s.body.len() as u64,
                })
                .collect(),
        },
        WireFrame::Response(response) => WireHeader::Response {
            id: response.id.clone(),
            status: response.status,
        },
    };
    let header_bytes = serde_json::to_vec(&header)?;

    let body_len: usize = match frame {
        WireFrame::Request(request) => request.streams.iter().map(|s| s.body.len()).sum(),
        WireFrame::Response(_) => 0,
    };
    let total = 4 + header_bytes.len() + body_len;
    if total > MAX_FRAME_BYTES {
        return Err(Error::oversized(total));
    }

    let mut buf = BytesMut::with_capacity(total);
    buf.put_u32(header_bytes.len() as u32);
    buf.put_slice(&header_bytes);
    if let WireFrame::Request(request) = frame {
        for stream in &request.streams {
            buf.put_slice(&stream.body);
        }
    }
    Ok(buf.freeze())
}

/// Decode a wire envelope. Stream bodies are zero-copy slices of `data`.
pub fn decode(data: Bytes) -> Result<WireFrame> {
    if data.len() > MAX_FRAME_BYTES {
        return Err(Error::oversized(data.len()));
    }
    if data.len() < 4 {
        return Err(Error::malformed("envelope shorter than header length"));
    }
    let header_len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let body_start = 4 + header_len;
    if data.len() < body_start {
        return Err(Error::malformed(format!(
            "header length {header_len} exceeds envelope of {} bytes",
            data.len()
        )));
    }
    let header: WireHeader = serde_json::from_slice(&data[4..body_start])
        .map_err(|e| Error::malformed(format!("invalid header: {e}")))?;

    match header {
        WireHeader::Response { id, status } => {
            if data.len() != body_start {
                return Err(Error::malformed("response envelope carries a body"));
            }
            Ok(WireFrame::Response(StreamingResponse { id, status }))
        },
        WireHeader::Request {
            id,
            verb,
            path,
            streams,
        } => {
            let mut offset = body_start;
            let mut decoded = Vec::with_capacity(streams.len());
            for stream in streams {
                let len = usize::try_from(stream.length)
                    .map_err(|_| Error::malformed("stream length does not fit in memory"))?;
                let end = offset
                    .checked_add(len)
                    .filter(|end| *end <= data.len())
                    .ok_or_else(|| Error::malformed("stream body truncated"))?;
                decoded.push(FrameStream {
                    content_type: stream.content_type,
                    body: data.slice(offset..end),
                });
                offset = end;
            }
            if offset != data.len() {
                return Err(Error::malformed(format!(
                    "{} trailing bytes after declared streams",
                    data.len() - offset
                )));
            }
            Ok(WireFrame::Request(StreamingRequest {
                id,
                verb,
                path,
                streams: decoded,
            }))
        },
    }
}

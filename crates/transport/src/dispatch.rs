use std::sync::Arc;

use {
    bytes::Bytes,
    pontis_protocol::wire::{self, WireFrame},
    tokio::sync::mpsc,
    tracing::{debug, warn},
};

use crate::RequestHandler;

/// Depth of the writer queue. `send` suspends once this many frames are
/// waiting on the connection task.
pub(crate) const WRITE_QUEUE_DEPTH: usize = 32;

/// Decode and dispatch one inbound envelope.
///
/// Requests run on their own task so the receive loop keeps draining while
/// a handler suspends on reply delivery; the handler's response is written
/// back when it completes. Responses are acknowledgements of our own sends
/// and are traced and dropped.
pub(crate) fn dispatch_frame(
    data: Bytes,
    handler: &Arc<dyn RequestHandler>,
    write_tx: &mpsc::Sender<Bytes>,
) {
    let frame = match wire::decode(data) {
        Ok(frame) => frame,
        Err(e) => {
            // No request id survives a broken envelope, so there is nothing
            // to answer.
            warn!(error = %e, "dropping undecodable inbound envelope");
            return;
        },
    };
    match frame {
        WireFrame::Request(request) => {
            let handler = Arc::clone(handler);
            let write_tx = write_tx.clone();
            tokio::spawn(async move {
                let response = handler.handle_request(request).await;
                match wire::encode(&WireFrame::Response(response)) {
                    Ok(bytes) => {
                        if write_tx.send(bytes).await.is_err() {
                            debug!("connection closed before response could be written");
                        }
                    },
                    Err(e) => warn!(error = %e, "failed to encode response frame"),
                }
            });
        },
        WireFrame::Response(response) => {
            debug!(id = %response.id, status = response.status, "peer acknowledged frame");
        },
    }
}

//! Unix-pipe client transport.
//!
//! Connects to a co-located process over a Unix domain socket; no
//! authentication is required since the peer shares the host. Envelopes are
//! carried in length-delimited frames. Connect is "open if present" — there
//! is no retry loop, and a dropped connection is permanent.

use std::{path::Path, sync::Arc};

use {
    bytes::Bytes,
    futures::{SinkExt, StreamExt},
    pontis_protocol::{MAX_FRAME_BYTES, wire::{self, WireFrame}},
    tokio::{net::UnixStream, sync::mpsc},
    tokio_util::codec::{Framed, LengthDelimitedCodec},
    tracing::{debug, info, warn},
};

use crate::{
    RequestHandler, Transport,
    dispatch::{WRITE_QUEUE_DEPTH, dispatch_frame},
    error::{Error, Result},
};

use async_trait::async_trait;

#[derive(Debug)]
pub struct PipeTransport {
    write_tx: mpsc::Sender<Bytes>,
}

impl PipeTransport {
    /// Connect to the downstream agent's socket, registering `handler` for
    /// inbound request frames.
    pub async fn connect(path: &Path, handler: Arc<dyn RequestHandler>) -> Result<Self> {
        let stream = UnixStream::connect(path).await?;
        info!(path = %path.display(), "connected to downstream agent pipe");

        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_BYTES)
            .new_codec();
        let framed = Framed::new(stream, codec);

        let (write_tx, write_rx) = mpsc::channel(WRITE_QUEUE_DEPTH);
        let task_tx = write_tx.clone();
        tokio::spawn(async move {
            match run_connection(framed, handler, task_tx, write_rx).await {
                Ok(()) => debug!("pipe connection closed"),
                Err(e) => warn!(error = %e, "pipe connection failed"),
            }
        });

        Ok(Self { write_tx })
    }
}

#[async_trait]
impl Transport for PipeTransport {
    async fn send(&self, frame: WireFrame) -> Result<()> {
        let bytes = wire::encode(&frame)?;
        self.write_tx.send(bytes).await.map_err(|_| Error::Closed)
    }

    fn is_connected(&self) -> bool {
        !self.write_tx.is_closed()
    }
}

async fn run_connection(
    framed: Framed<UnixStream, LengthDelimitedCodec>,
    handler: Arc<dyn RequestHandler>,
    write_tx: mpsc::Sender<Bytes>,
    mut write_rx: mpsc::Receiver<Bytes>,
) -> Result<()> {
    let (mut sink, mut reader) = framed.split();
    loop {
        tokio::select! {
            msg = reader.next() => match msg {
                Some(Ok(data)) => dispatch_frame(data.freeze(), &handler, &write_tx),
                Some(Err(e)) => return Err(e.into()),
                None => {
                    debug!("pipe closed by peer");
                    return Ok(());
                },
            },
            data = write_rx.recv() => match data {
                Some(bytes) => sink.send(bytes).await?,
                None => return Ok(()),
            },
        }
    }
}

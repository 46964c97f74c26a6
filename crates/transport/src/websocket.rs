//! WebSocket client transport.
//!
//! One connection task owns the socket: writes arrive through a bounded
//! channel, inbound binary messages are decoded and dispatched, and pings
//! are answered in place. There is no reconnect — when the socket drops the
//! task exits and every later `send` fails with [`Error::Closed`] for the
//! remaining process lifetime.

use std::sync::Arc;

use {
    bytes::Bytes,
    futures::{SinkExt, StreamExt},
    pontis_protocol::wire::{self, WireFrame},
    secrecy::ExposeSecret,
    tokio::{net::TcpStream, sync::mpsc},
    tokio_tungstenite::{
        MaybeTlsStream, WebSocketStream, connect_async,
        tungstenite::{Message, client::IntoClientRequest, handshake::client::Request},
    },
    tracing::{debug, info, warn},
};

use crate::{
    AuthHeaders, RequestHandler, Transport,
    dispatch::{WRITE_QUEUE_DEPTH, dispatch_frame},
    error::{Error, Result},
};

use async_trait::async_trait;

pub struct WebSocketTransport {
    write_tx: mpsc::Sender<Bytes>,
}

impl WebSocketTransport {
    /// Connect to the downstream agent, registering `handler` for inbound
    /// request frames. Suspends until the WebSocket handshake completes or
    /// fails.
    pub async fn connect(
        url: &str,
        auth: Option<&AuthHeaders>,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<Self> {
        let request = build_request(url, auth)?;
        let (ws, _response) = connect_async(request).await?;
        info!(url, "connected to downstream agent");

        let (write_tx, write_rx) = mpsc::channel(WRITE_QUEUE_DEPTH);
        let task_tx = write_tx.clone();
        tokio::spawn(async move {
            match run_connection(ws, handler, task_tx, write_rx).await {
                Ok(()) => debug!("WebSocket connection closed"),
                Err(e) => warn!(error = %e, "WebSocket connection failed"),
            }
        });

        Ok(Self { write_tx })
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&self, frame: WireFrame) -> Result<()> {
        let bytes = wire::encode(&frame)?;
        self.write_tx.send(bytes).await.map_err(|_| Error::Closed)
    }

    fn is_connected(&self) -> bool {
        !self.write_tx.is_closed()
    }
}

/// Build the handshake request, attaching the `authorization` and
/// `channelid` headers when credentials are supplied.
fn build_request(url: &str, auth: Option<&AuthHeaders>) -> Result<Request> {
    let mut request = url.into_client_request()?;
    if let Some(auth) = auth {
        let mut bearer =
            http::HeaderValue::from_str(&format!("Bearer {}", auth.bearer.expose_secret()))
                .map_err(Error::handshake)?;
        bearer.set_sensitive(true);
        let headers = request.headers_mut();
        headers.insert(http::header::AUTHORIZATION, bearer);
        headers.insert(
            "channelid",
            http::HeaderValue::from_str(&auth.channel_id).map_err(Error::handshake)?,
        );
    }
    Ok(request)
}

async fn run_connection(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    handler: Arc<dyn RequestHandler>,
    write_tx: mpsc::Sender<Bytes>,
    mut write_rx: mpsc::Receiver<Bytes>,
) -> Result<()> {
    let (mut sink, mut reader) = ws.split();
    loop {
        tokio::select! {
            msg = reader.next() => match msg {
                Some(Ok(Message::Binary(data))) => dispatch_frame(data, &handler, &write_tx),
                Some(Ok(Message::Ping(data))) => sink.send(Message::Pong(data)).await?,
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket closed by peer");
                    return Ok(());
                },
                Some(Ok(_)) => {}, // text, pong — not part of the protocol
                Some(Err(e)) => return Err(e.into()),
            },
            data = write_rx.recv() => match data {
                Some(bytes) => sink.send(Message::Binary(bytes)).await?,
                None => {
                    // All senders dropped — the owning side is gone.
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                },
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, secrecy::Secret};

    #[test]
    fn request_carries_auth_headers() {
        let auth = AuthHeaders {
            bearer: Secret::new("tok-123".into()),
            channel_id: "emulator".into(),
        };
        let request = build_request("ws://localhost:3978/api/messages", Some(&auth)).unwrap();
        assert_eq!(
            request.headers().get(http::header::AUTHORIZATION).unwrap(),
            "Bearer tok-123"
        );
        assert_eq!(request.headers().get("channelid").unwrap(), "emulator");
    }

    #[test]
    fn request_without_auth_has_no_authorization() {
        let request = build_request("ws://localhost:3978/api/messages", None).unwrap();
        assert!(request.headers().get(http::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(build_request("not a url", None).is_err());
    }
}

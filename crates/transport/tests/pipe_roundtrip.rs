//! Integration tests for the Unix-pipe transport against a real socket peer.

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    futures::{SinkExt, StreamExt},
    tokio::{net::UnixListener, sync::mpsc},
    tokio_util::codec::{Framed, LengthDelimitedCodec},
};

use {
    pontis_protocol::{
        Activity, StreamingRequest, StreamingResponse, codec, status,
        wire::{self, WireFrame},
    },
    pontis_transport::{Error, PipeTransport, RequestHandler, Transport},
};

struct RecordingHandler {
    seen: mpsc::UnboundedSender<StreamingRequest>,
}

#[async_trait]
impl RequestHandler for RecordingHandler {
    async fn handle_request(&self, request: StreamingRequest) -> StreamingResponse {
        let id = request.id.clone();
        let _ = self.seen.send(request);
        StreamingResponse::ok(id)
    }
}

fn recording_handler() -> (Arc<dyn RequestHandler>, mpsc::UnboundedReceiver<StreamingRequest>) {
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    (Arc::new(RecordingHandler { seen: seen_tx }), seen_rx)
}

#[tokio::test]
async fn frames_flow_in_both_directions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let (handler, mut seen_rx) = recording_handler();

    let peer = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

        // The bridge's outbound request arrives first.
        let data = framed.next().await.unwrap().unwrap().freeze();
        let WireFrame::Request(request) = wire::decode(data).unwrap() else {
            panic!("expected a request frame");
        };
        assert_eq!(request.verb, "submit");
        assert_eq!(request.path, "/api/messages");

        // Push a downstream-originated request and read back its ack.
        let reply =
            codec::encode_activity("peer-1", &Activity::message("conv-1", "agent", "hi")).unwrap();
        framed
            .send(wire::encode(&WireFrame::Request(reply)).unwrap())
            .await
            .unwrap();
        let data = framed.next().await.unwrap().unwrap().freeze();
        let WireFrame::Response(response) = wire::decode(data).unwrap() else {
            panic!("expected a response frame");
        };
        assert_eq!(response.id, "peer-1");
        assert_eq!(response.status, status::OK);
    });

    let transport = PipeTransport::connect(&path, handler).await.unwrap();
    let request =
        codec::encode_activity("req-1", &Activity::message("conv-1", "user-1", "hello")).unwrap();
    transport.send(WireFrame::Request(request)).await.unwrap();

    let inbound = seen_rx.recv().await.unwrap();
    assert_eq!(inbound.id, "peer-1");
    peer.await.unwrap();
}

#[tokio::test]
async fn dropped_connection_is_permanent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let (handler, _seen_rx) = recording_handler();

    let peer = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let transport = PipeTransport::connect(&path, handler).await.unwrap();
    peer.await.unwrap();

    for _ in 0..100 {
        if !transport.is_connected() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!transport.is_connected());

    let request =
        codec::encode_activity("req-1", &Activity::message("conv-1", "user-1", "hello")).unwrap();
    let err = transport.send(WireFrame::Request(request)).await.unwrap_err();
    assert!(matches!(err, Error::Closed));
}

#[tokio::test]
async fn connect_fails_when_socket_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.sock");
    let (handler, _seen_rx) = recording_handler();
    let err = PipeTransport::connect(&path, handler).await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

//! The bridge relay: single point of control for outbound forwarding and
//! inbound routing.

use std::sync::Arc;

use {
    async_trait::async_trait,
    pontis_protocol::{
        Activity, BRIDGE_SERVICE_URL, SUBMIT_VERB, StreamingRequest, StreamingResponse, codec,
        wire::WireFrame,
    },
    pontis_transport::{AuthHeaders, RequestHandler, Transport, WebSocketTransport},
    tracing::{debug, info, warn},
    uuid::Uuid,
};

#[cfg(unix)]
use pontis_transport::PipeTransport;

use crate::{
    auth::TokenProvider,
    config::{BridgeConfig, TransportMode},
    error::Result,
    router::{ConversationRouter, ReplySink},
};

/// Relay between the inbound channel and one downstream agent.
///
/// A relay is either enabled — holding the single transport connection for
/// the process lifetime — or disabled, in which case every operation is a
/// quiet no-op. Disabled is the normal state when no downstream transport
/// is configured; it is never an error.
pub struct BridgeRelay {
    inner: Option<EnabledBridge>,
}

impl std::fmt::Debug for BridgeRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeRelay")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

struct EnabledBridge {
    transport: Arc<dyn Transport>,
    router: Arc<ConversationRouter>,
}

impl BridgeRelay {
    /// A relay with no downstream transport. All operations are no-ops.
    #[must_use]
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Establish the configured transport, registering the relay's inbound
    /// handler. Awaited by the host's startup sequence; the bearer token
    /// for WebSocket mode is acquired here, before the first send.
    ///
    /// A credential failure is fatal for this construction attempt — the
    /// host keeps a disabled relay for the session and must build a new
    /// instance to retry.
    pub async fn connect(config: &BridgeConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let router = Arc::new(ConversationRouter::new(&config.router));
        let handler: Arc<dyn RequestHandler> = Arc::new(InboundHandler {
            router: Arc::clone(&router),
        });

        let transport: Arc<dyn Transport> = match &config.transport {
            TransportMode::Disabled => {
                info!("no downstream transport configured; bridge is disabled");
                return Ok(Self::disabled());
            },
            TransportMode::WebSocket { url } => {
                let bearer = tokens.bearer_token().await?;
                let auth = AuthHeaders {
                    bearer,
                    channel_id: config.channel_id.clone(),
                };
                Arc::new(WebSocketTransport::connect(url, Some(&auth), handler).await?)
            },
            #[cfg(unix)]
            TransportMode::Pipe { path } => {
                Arc::new(PipeTransport::connect(path, handler).await?)
            },
            #[cfg(not(unix))]
            TransportMode::Pipe { .. } => {
                warn!("pipe transport is unsupported on this platform; bridge is disabled");
                return Ok(Self::disabled());
            },
        };

        Ok(Self {
            inner: Some(EnabledBridge { transport, router }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Number of live reply routes. Surfaced for health reporting.
    pub fn route_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |b| b.router.len())
    }

    /// Forward an inbound activity to the downstream agent.
    ///
    /// `reply_sink` is `Some` exactly when the host observed this
    /// conversation for the first time (a member joined); the sink is then
    /// registered as the conversation's reply route unless the joining
    /// member is the bridge's own bot account. Registration is idempotent —
    /// the first registered sink stays.
    ///
    /// Suspends until the transport accepts the write; does not wait for a
    /// downstream reply. On a disabled relay this returns `Ok` immediately
    /// without touching the network.
    pub async fn forward(
        &self,
        mut activity: Activity,
        reply_sink: Option<Arc<dyn ReplySink>>,
    ) -> Result<()> {
        let Some(bridge) = &self.inner else {
            return Ok(());
        };

        if let Some(sink) = reply_sink {
            bridge.register_reply_route(&activity, sink);
        }

        // The downstream agent addresses replies to this marker rather
        // than attempting direct delivery.
        activity.service_url = Some(BRIDGE_SERVICE_URL.into());

        let request = codec::encode_activity(Uuid::new_v4().to_string(), &activity)?;
        bridge.transport.send(WireFrame::Request(request)).await?;
        Ok(())
    }
}

impl EnabledBridge {
    fn register_reply_route(&self, activity: &Activity, sink: Arc<dyn ReplySink>) {
        if activity.is_self_originated() {
            debug!("own bot account joined; no reply route registered");
            return;
        }
        let Some(conversation_id) = activity.conversation_id() else {
            warn!("conversation-start activity without a conversation id");
            return;
        };
        if self.router.register(conversation_id, sink) {
            info!(conversation = conversation_id, "registered reply route");
        }
    }
}

/// Inbound side of the relay, invoked by the transport's receive loop.
struct InboundHandler {
    router: Arc<ConversationRouter>,
}

#[async_trait]
impl RequestHandler for InboundHandler {
    async fn handle_request(&self, request: StreamingRequest) -> StreamingResponse {
        if request.verb != SUBMIT_VERB {
            warn!(verb = %request.verb, "unsupported verb on inbound frame");
            return StreamingResponse::not_found(request.id);
        }

        let activity = match codec::decode_request(&request) {
            Ok(activity) => activity,
            Err(e) => {
                warn!(error = %e, "rejecting malformed inbound frame");
                return StreamingResponse::not_found(request.id);
            },
        };

        match activity.conversation_id().and_then(|id| self.router.lookup(id)) {
            Some(sink) => {
                // Delivery runs to completion before the frame is
                // acknowledged.
                sink.deliver(activity).await;
            },
            None => {
                // No known inbound channel for this conversation; a quiet
                // drop is the normal outcome, not an error.
                debug!(
                    conversation = activity.conversation_id().unwrap_or("<none>"),
                    "no reply route for inbound activity; dropping"
                );
            },
        }
        StreamingResponse::ok(request.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use {
        crate::{error::Error, router::RouterConfig},
        pontis_protocol::ChannelAccount,
        tokio::sync::Mutex,
    };

    struct MockTransport {
        sent: Mutex<Vec<WireFrame>>,
        closed: bool,
    }

    impl MockTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                closed: false,
            })
        }

        fn closed() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                closed: true,
            })
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, frame: WireFrame) -> pontis_transport::Result<()> {
            if self.closed {
                return Err(pontis_transport::Error::Closed);
            }
            self.sent.lock().await.push(frame);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            !self.closed
        }
    }

    struct CapturingSink {
        delivered: Mutex<Vec<Activity>>,
    }

    impl CapturingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                delivered: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReplySink for CapturingSink {
        async fn deliver(&self, activity: Activity) {
            self.delivered.lock().await.push(activity);
        }
    }

    fn relay_with(transport: Arc<MockTransport>) -> BridgeRelay {
        BridgeRelay {
            inner: Some(EnabledBridge {
                transport,
                router: Arc::new(ConversationRouter::new(&RouterConfig::default())),
            }),
        }
    }

    fn join_activity(conversation: &str, member: &str, bot: &str) -> Activity {
        let mut activity = Activity::message(conversation, member, "");
        activity.activity_type = "conversationUpdate".into();
        activity.recipient = Some(ChannelAccount {
            id: bot.into(),
            name: None,
        });
        activity
    }

    #[tokio::test]
    async fn disabled_relay_forwards_as_noop() {
        let relay = BridgeRelay::disabled();
        assert!(!relay.is_enabled());
        let sink = CapturingSink::new();
        relay
            .forward(
                Activity::message("c1", "user-1", "hello"),
                Some(sink as Arc<dyn ReplySink>),
            )
            .await
            .unwrap();
        assert_eq!(relay.route_count(), 0);
    }

    #[tokio::test]
    async fn forward_stamps_origin_marker() {
        let transport = MockTransport::new();
        let relay = relay_with(Arc::clone(&transport));
        relay
            .forward(Activity::message("c1", "user-1", "hello"), None)
            .await
            .unwrap();

        let sent = transport.sent.lock().await;
        let WireFrame::Request(request) = &sent[0] else {
            panic!("expected a request frame");
        };
        assert_eq!(request.verb, SUBMIT_VERB);
        let forwarded = codec::decode_request(request).unwrap();
        assert_eq!(forwarded.service_url.as_deref(), Some(BRIDGE_SERVICE_URL));
        assert_eq!(forwarded.text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn conversation_start_registers_first_sink_only() {
        let relay = relay_with(MockTransport::new());
        let first = CapturingSink::new();
        let second = CapturingSink::new();

        relay
            .forward(
                join_activity("c1", "user-1", "bot-1"),
                Some(Arc::clone(&first) as Arc<dyn ReplySink>),
            )
            .await
            .unwrap();
        relay
            .forward(
                join_activity("c1", "user-2", "bot-1"),
                Some(Arc::clone(&second) as Arc<dyn ReplySink>),
            )
            .await
            .unwrap();
        assert_eq!(relay.route_count(), 1);

        // The first registered sink is the one later invoked.
        let router = &relay.inner.as_ref().unwrap().router;
        let found = router.lookup("c1").unwrap();
        found.deliver(Activity::message("c1", "agent", "hi")).await;
        assert_eq!(first.delivered.lock().await.len(), 1);
        assert!(second.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn own_bot_join_does_not_register() {
        let relay = relay_with(MockTransport::new());
        let sink = CapturingSink::new();
        relay
            .forward(
                join_activity("c1", "bot-1", "bot-1"),
                Some(sink as Arc<dyn ReplySink>),
            )
            .await
            .unwrap();
        assert_eq!(relay.route_count(), 0);
    }

    #[tokio::test]
    async fn closed_transport_fails_forward_and_keeps_routes() {
        let relay = relay_with(MockTransport::closed());
        let sink = CapturingSink::new();
        let err = relay
            .forward(
                join_activity("c1", "user-1", "bot-1"),
                Some(sink as Arc<dyn ReplySink>),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(relay.route_count(), 1);
    }

    #[tokio::test]
    async fn inbound_submit_routes_to_registered_sink() {
        let router = Arc::new(ConversationRouter::new(&RouterConfig::default()));
        let handler = InboundHandler {
            router: Arc::clone(&router),
        };
        let sink = CapturingSink::new();
        router.register("c1", Arc::clone(&sink) as Arc<dyn ReplySink>);

        let request =
            codec::encode_activity("r1", &Activity::message("c1", "agent", "reply")).unwrap();
        let response = handler.handle_request(request).await;
        assert!(response.is_ok());

        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text.as_deref(), Some("reply"));
    }

    #[tokio::test]
    async fn inbound_for_unknown_conversation_is_dropped_quietly() {
        let handler = InboundHandler {
            router: Arc::new(ConversationRouter::new(&RouterConfig::default())),
        };
        let request =
            codec::encode_activity("r1", &Activity::message("c2", "agent", "reply")).unwrap();
        let response = handler.handle_request(request).await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn unsupported_verb_yields_not_found() {
        let handler = InboundHandler {
            router: Arc::new(ConversationRouter::new(&RouterConfig::default())),
        };
        let mut request =
            codec::encode_activity("r1", &Activity::message("c1", "agent", "reply")).unwrap();
        request.verb = "fetch".into();
        let response = handler.handle_request(request).await;
        assert_eq!(response.status, pontis_protocol::status::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_inbound_frame_yields_not_found() {
        let handler = InboundHandler {
            router: Arc::new(ConversationRouter::new(&RouterConfig::default())),
        };
        let mut request =
            StreamingRequest::submit("r1", bytes::Bytes::from_static(b"null"));
        request.push_stream("image/png", bytes::Bytes::from_static(b"png"));
        let response = handler.handle_request(request).await;
        assert_eq!(response.status, pontis_protocol::status::NOT_FOUND);
    }
}

use std::path::{Path, PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::router::RouterConfig;

/// Which downstream transport the bridge uses. Exactly one may be active;
/// `Disabled` means "no bridge configured" and is a valid, quiet state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Disabled,
    WebSocket {
        /// Downstream agent endpoint, e.g. `ws://localhost:3978/api/messages`.
        url: String,
    },
    Pipe {
        /// Downstream agent socket path.
        path: PathBuf,
    },
}

impl TransportMode {
    /// Resolve the legacy two-selector shape. Selecting neither transport
    /// means there is nothing to bridge to; selecting both is ambiguous —
    /// the bridge can only talk to one agent. Either way the bridge quietly
    /// disables itself rather than failing.
    #[must_use]
    pub fn from_settings(websocket_url: Option<&str>, pipe_path: Option<&Path>) -> Self {
        match (websocket_url, pipe_path) {
            (Some(url), None) => Self::WebSocket { url: url.into() },
            (None, Some(path)) => Self::Pipe {
                path: path.to_path_buf(),
            },
            _ => Self::Disabled,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

/// Process-wide bridge configuration. Read once at construction, never
/// mutated afterwards.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Active downstream transport.
    pub transport: TransportMode,

    /// Bot registration client ID.
    pub app_id: String,

    /// Bot registration client secret.
    #[serde(serialize_with = "serialize_secret")]
    pub app_password: Secret<String>,

    /// OAuth tenant segment for token issuance.
    pub oauth_tenant: String,

    /// OAuth scope for the downstream agent's authentication layer.
    pub oauth_scope: String,

    /// Channel-identity tag presented in the `channelid` header at connect
    /// time.
    pub channel_id: String,

    /// Conversation-routing table tuning.
    pub router: RouterConfig,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("transport", &self.transport)
            .field("app_id", &self.app_id)
            .field("app_password", &"[REDACTED]")
            .field("oauth_tenant", &self.oauth_tenant)
            .field("oauth_scope", &self.oauth_scope)
            .field("channel_id", &self.channel_id)
            .field("router", &self.router)
            .finish()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Disabled,
            app_id: String::new(),
            app_password: Secret::new(String::new()),
            oauth_tenant: "botframework.com".into(),
            oauth_scope: "https://api.botframework.com/.default".into(),
            channel_id: "emulator".into(),
            router: RouterConfig::default(),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

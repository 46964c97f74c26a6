//! Bridge relay between an inbound conversational channel and one
//! downstream streaming agent.
//!
//! The host hands every inbound activity to [`BridgeRelay::forward`]; the
//! relay frames it and sends it over the active transport. Activities the
//! downstream agent produces arrive on the transport's receive loop and
//! are routed back to the originating conversation through the
//! [`ReplySink`] registered when that conversation was first observed.

pub mod auth;
pub mod config;
pub mod error;
pub mod relay;
pub mod router;

pub use {
    auth::{ClientCredentials, TokenProvider},
    config::{BridgeConfig, TransportMode},
    error::{Error, Result},
    relay::BridgeRelay,
    router::{ConversationRouter, ReplySink, RouterConfig},
};

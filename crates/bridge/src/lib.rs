//! User ↔ support-topic relay core.
//!
//! Bridges many end-users to one support team inside a single forum-style
//! chat: each user gets a dedicated topic, their messages are forwarded into
//! it, and replies posted in the topic are copied back to the user. The chat
//! platform itself sits behind the [`ChatApi`] seam.

pub mod api;
pub mod classify;
pub mod engine;
pub mod error;
pub mod provision;

pub use {
    api::ChatApi,
    classify::{InboundMessage, Verdict, classify},
    engine::{RelayEngine, RelayOptions},
    error::{CapabilityError, Error, Result},
    provision::TopicProvisioner,
};

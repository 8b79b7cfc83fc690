//! Herald Discord infrastructure adapter.
//!
//! Implements [`pipeline::MessageSink`] with [`DiscordClient`], which posts
//! messages through Discord's `POST /channels/{channel.id}/messages` endpoint
//! using a bot token.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, the embed wire format, Discord's size
//! limits and status-code mapping live here. The [`pipeline`] crate sees only
//! [`pipeline::MessageSink`] and [`pipeline::MessageSinkError`].

mod client;
mod embed;

pub use client::{ClientBuildError, DiscordClient, DiscordClientConfig};

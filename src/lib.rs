//! The Rust SDK for Enhencer, an audience-building service for e-commerce.
//!
//! # Overview
//!
//! The SDK revolves around a [`Client`] that reports shopping interactions (listing views,
//! product views, basket additions and purchases) for the current visitor. Each visitor is
//! identified by a visitor id that is generated once per installation and persisted through a
//! [`SettingsStore`].
//!
//! After every interaction the client re-scores the visitor. The collection service answers with
//! the audiences the visitor currently belongs to, and each of them is passed to the configured
//! [`AudienceLogger`].
//!
//! ```no_run
//! # use enhencer::{ClientConfig, FileSettingsStore};
//! let client = ClientConfig::from_token("account-token")
//!     .settings_store(FileSettingsStore::open("enhencer.json").unwrap())
//!     .audience_logger(|name: &str, value: f64| {
//!         println!("{} {}", name, value);
//!     })
//!     .to_client()
//!     .unwrap();
//!
//! client.product_page("shoes", "p1", 100).unwrap();
//! ```
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum.
//!
//! Failed requests are not errors: they are logged and the action continues with its remaining
//! requests. If the score update fails, audience forwarding is skipped. Tracking actions report
//! only two things to the caller: the visitor id could not be read or persisted
//! ([`Error::Persistence`], for every settings-store failure including I/O errors), or the
//! score-update response could not be turned into audiences ([`Error::Parse`]). In the latter
//! case the event requests have already been sent. Building a client can additionally fail with
//! [`Error::InvalidBaseUrl`] or [`Error::Network`].
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages. Consider integrating a `log`-compatible logger implementation for better visibility
//! into SDK operations.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod audience;
mod client;
mod config;
mod error;
pub mod events;
mod settings_store;
mod transport;
mod visitor;

pub use audience::{forward_audiences, Audience, AudienceDecision, AudienceLogger};
pub use client::{Client, Endpoints};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use events::{EventPayload, Product};
pub use settings_store::{FileSettingsStore, InMemorySettingsStore, SettingsStore};
pub use transport::{HttpTransport, Method, Transport};
pub use visitor::{generate_visitor_id, VISITOR_ID_KEY};

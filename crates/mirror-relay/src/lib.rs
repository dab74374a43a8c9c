//! monday.com webhook relay for mirrored items.
//!
//! This crate provides:
//! - Webhook payload classification (verification challenge vs. item event)
//! - GraphQL client for the monday.com API (item query, `create_update`)
//! - Fan-out of an activity summary onto every item linked through a mirror column
//! - HTTP server for webhook handling (standalone service)
//!
//! # Flow
//!
//! ```text
//! POST /webhooks/monday
//!   ├─ {"challenge": ...}  -> 200 {"challenge": ...}
//!   └─ {"event": {...}}    -> query item -> build update text
//!                             -> create_update on each mirrored item id
//!                             -> 200 <item query response>
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Most handlers and API methods can fail

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use client::{ItemsApi, MondayClient};
pub use config::Config;
pub use error::{ClientError, RelayError};
pub use handlers::dispatch::dispatch;
pub use handlers::fanout::{build_update_text, mirror_targets, notify, FanOutReport};
pub use models::{ColumnKind, ColumnRecord, ItemSnapshot, WebhookEvent, WebhookPayload};

//! Webhook handlers.
//!
//! - [`dispatch`] classifies the inbound body and answers challenges
//! - [`fanout`] relays item activity onto mirrored items

pub mod dispatch;
pub mod fanout;

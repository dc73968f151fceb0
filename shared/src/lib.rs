//! Shared building blocks for the RSVP services: event/guest models, the
//! response-token codec and processor, the event store, session auth and
//! the invitation mail pipeline.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod mail;
pub mod models;
pub mod response;
pub mod store;
pub mod token;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

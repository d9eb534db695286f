//! Flock API - HTTP client for the outbound messaging provider.
//!
//! The daily notification job talks to the provider only through the
//! [`MessagingProvider`] trait. [`MessagingClient`] is the production
//! implementation: a Twilio-style REST client that posts one form-encoded
//! message per recipient, with exponential backoff retry on transient
//! failures.

pub mod client;
pub mod provider;
pub mod response;

// Re-export key types
pub use client::{MessagingClient, RetryConfig};
pub use provider::{DeliveryReceipt, MessagingProvider};
pub use response::{MessageResource, ProviderError};

//! # quill-assist
//!
//! HTTP client for the external AI assist service.
//!
//! This crate provides:
//! - The [`AssistClient`] reqwest implementation of
//!   [`quill_core::AssistBackend`]
//! - A configurable mock backend for tests (feature `mock`)
//!
//! The assist service is an opaque text-in/text-out collaborator: the
//! client never inspects or post-processes model output beyond JSON field
//! extraction.
//!
//! # Example
//!
//! ```rust,no_run
//! use quill_assist::AssistClient;
//! use quill_core::AssistBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = AssistClient::from_env();
//!     let summary = client.summarize("A long passage of text").await.unwrap();
//!     println!("{summary}");
//! }
//! ```

pub mod client;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{AssistClient, DEFAULT_ASSIST_URL};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockAssistBackend;

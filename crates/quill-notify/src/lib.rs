//! # quill-notify
//!
//! Email notifications for Quillmark.
//!
//! This crate provides:
//! - The [`Mailer`] SMTP client (lettre), with a no-op dev mode when SMTP is
//!   unconfigured
//! - Plain-text [`templates`] rendered from typed structs
//! - The [`dispatcher`] task that consumes the server event bus and sends
//!   fire-and-forget mail
//!
//! Delivery is best-effort: a failed send is logged at WARN and dropped,
//! never retried. Sends never block a request.

pub mod dispatcher;
pub mod mailer;
pub mod templates;

pub use dispatcher::run_dispatcher;
pub use mailer::Mailer;
pub use templates::{NoteCreatedEmail, WelcomeEmail};

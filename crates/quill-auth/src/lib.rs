//! # quill-auth
//!
//! Credential primitives for Quillmark: Argon2id password hashing and
//! HS256 session tokens.
//!
//! Both the API and the gateway verify tokens through [`JwtKeys`]; only the
//! API signs them. The signing secret is shared via `TOKEN_SECRET` and its
//! absence is a fatal configuration error at boot.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{bearer_token, Claims, JwtKeys};

//! Centralized default constants for the Quillmark system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP port for the primary backend.
pub const API_PORT: u16 = 3001;

/// Default HTTP port for the gateway.
pub const GATEWAY_PORT: u16 = 8080;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Default frontend origin, used for CORS and email links.
pub const APP_URL: &str = "http://localhost:3000";

/// Maximum JSON request body size in bytes (1 MB; notes are text).
pub const MAX_BODY_SIZE_BYTES: usize = 1024 * 1024;

/// Maximum PDF upload size in bytes (25 MB), enforced on the assist
/// process-pdf route's multipart body.
pub const MAX_PDF_SIZE_BYTES: usize = 25 * 1024 * 1024;

// =============================================================================
// AUTH
// =============================================================================

/// Default session token lifetime in hours.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Token issuer claim value.
pub const TOKEN_ISSUER: &str = "quillmark";

/// Clock-skew leeway for token expiry validation, in seconds.
pub const TOKEN_LEEWAY_SECS: u64 = 30;

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Maximum accepted email address length (RFC 5321 octet limit).
pub const EMAIL_MAX_LENGTH: usize = 254;

// =============================================================================
// NOTES
// =============================================================================

/// Maximum note title length in characters.
pub const TITLE_MAX_LENGTH: usize = 200;

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LENGTH: usize = 100;

/// Maximum folder name length in characters.
pub const FOLDER_NAME_MAX_LENGTH: usize = 100;

/// Maximum export download filename length (ext4/NTFS compatible).
pub const FILENAME_MAX_LENGTH: usize = 255;

// =============================================================================
// OUTBOUND HTTP
// =============================================================================

/// Default base URL for the assist service.
pub const ASSIST_URL: &str = "http://127.0.0.1:8000";

/// Default upstream base URL for gateway forwards (the primary backend).
pub const GATEWAY_UPSTREAM_URL: &str = "http://localhost:3001";

/// Timeout for gateway forwards to backend services, in seconds.
pub const GATEWAY_TIMEOUT_SECS: u64 = 10;

/// Timeout for assist service calls, in seconds. PDF processing is slow.
pub const ASSIST_TIMEOUT_SECS: u64 = 120;

/// Threshold above which an assist call is logged as slow, in milliseconds.
pub const ASSIST_SLOW_MS: u128 = 30_000;

// =============================================================================
// EMAIL
// =============================================================================

/// Default SMTP submission port (STARTTLS).
pub const SMTP_PORT: u16 = 587;

/// Timeout for SMTP sends, in seconds.
pub const SMTP_TIMEOUT_SECS: u64 = 10;

/// Default From address when `SMTP_FROM` is unset.
pub const SMTP_DEFAULT_FROM: &str = "Quillmark <no-reply@quillmark.app>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_are_distinct() {
        const {
            assert!(API_PORT != GATEWAY_PORT);
        }
    }

    #[test]
    fn body_limits_ordered() {
        const {
            assert!(MAX_BODY_SIZE_BYTES < MAX_PDF_SIZE_BYTES);
        }
    }

    #[test]
    fn auth_limits_sane() {
        const {
            assert!(TOKEN_TTL_HOURS > 0);
            assert!(PASSWORD_MIN_LENGTH >= 6);
            assert!(EMAIL_MAX_LENGTH == 254);
        }
    }

    #[test]
    fn timeouts_ordered() {
        // Assist calls (PDF processing) are allowed far longer than proxy hops.
        const {
            assert!(GATEWAY_TIMEOUT_SECS < ASSIST_TIMEOUT_SECS);
        }
    }

    #[test]
    fn name_limits_fit_in_filename() {
        const {
            assert!(TITLE_MAX_LENGTH < FILENAME_MAX_LENGTH);
            assert!(TAG_NAME_MAX_LENGTH <= TITLE_MAX_LENGTH);
        }
    }
}

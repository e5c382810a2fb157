//! # Facegate
//!
//! `facegate` is an authentication and identity-verification backend. It
//! registers users, authenticates them by password or by facial comparison
//! against a third-party recognition provider, records a login audit trail,
//! and proxies support questions to a chat-completion provider.
//!
//! ## Authentication
//!
//! Two independent paths lead to an authenticated session:
//!
//! - **Password:** bcrypt-hashed credentials verified against the store.
//! - **Face ID:** a freshly captured image compared against the enrolled
//!   reference image by an external provider; the match is accepted only
//!   when the returned confidence is strictly above the threshold.
//!
//! Successful authentication mints a signed, time-limited bearer token and
//! appends exactly one row to the login audit trail. Failed attempts leave
//! no trace in the trail.
//!
//! ## Authorization
//!
//! Protected routes sit behind a request gate that verifies the bearer
//! token and attaches the resolved identity to the request. Token
//! verification fails closed: malformed, forged, and expired tokens are
//! rejected uniformly with `401 Unauthorized`.

pub mod api;
pub mod auth;
pub mod cli;
pub mod face;
pub mod store;
pub mod support;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}

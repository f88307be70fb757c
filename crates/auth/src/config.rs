//! Authentication configuration.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::AuthError;

const SEVEN_DAYS_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted session or invite lifetime (ten years).
pub const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Absolute session lifetime in seconds (default: 7 days). Not refreshed
    /// on activity.
    pub session_lifetime_secs: u64,
    /// Invite validity window in seconds (default: 7 days).
    pub invite_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime_secs: SEVEN_DAYS_SECS,
            invite_lifetime_secs: SEVEN_DAYS_SECS,
        }
    }
}

impl AuthConfig {
    /// Rejects lifetimes outside `1..=MAX_LIFETIME_SECS`.
    pub fn validate(&self) -> Result<(), AuthError> {
        check_lifetime("session", self.session_lifetime_secs)?;
        check_lifetime("invite", self.invite_lifetime_secs)
    }

    /// When a session issued at `from` expires.
    pub fn session_expiry(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
        expiry("session", from, self.session_lifetime_secs)
    }

    /// When an invite created at `from` expires.
    pub fn invite_expiry(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
        expiry("invite", from, self.invite_lifetime_secs)
    }
}

fn check_lifetime(what: &'static str, secs: u64) -> Result<(), AuthError> {
    if secs == 0 || secs > MAX_LIFETIME_SECS {
        return Err(AuthError::LifetimeOutOfRange { what, secs });
    }
    Ok(())
}

fn expiry(
    what: &'static str,
    from: DateTime<Utc>,
    secs: u64,
) -> Result<DateTime<Utc>, AuthError> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| from.checked_add_signed(lifetime))
        .ok_or(AuthError::LifetimeOutOfRange { what, secs })
}

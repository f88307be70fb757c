//! One-time registration invites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who minted an invite. `System` is the bootstrap sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "userId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteCreator {
    System,
    User(Uuid),
}

impl InviteCreator {
    pub fn user_id(self) -> Option<Uuid> {
        match self {
            InviteCreator::System => None,
            InviteCreator::User(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteStatus {
    Pending,
    Used,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteLink {
    pub id: Uuid,
    pub token: String,
    /// Lower-case email the invite is bound to, if any.
    pub email: Option<String>,
    pub created_by: InviteCreator,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl InviteLink {
    /// Used-ness wins over expiry: a redeemed invite stays `Used` forever.
    pub fn status(&self, now: DateTime<Utc>) -> InviteStatus {
        if self.used_at.is_some() {
            InviteStatus::Used
        } else if now > self.expires_at {
            InviteStatus::Expired
        } else {
            InviteStatus::Pending
        }
    }

    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == InviteStatus::Pending
    }
}

#[derive(Debug, Clone)]
pub struct CreateInvite {
    pub token: String,
    pub email: Option<String>,
    pub created_by: InviteCreator,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(expires_in: Duration, used: bool) -> InviteLink {
        let now = Utc::now();
        InviteLink {
            id: Uuid::new_v4(),
            token: "t".into(),
            email: None,
            created_by: InviteCreator::System,
            expires_at: now + expires_in,
            used_at: used.then_some(now),
            used_by: None,
            created_at: now,
        }
    }

    #[test]
    fn used_is_checked_before_expiry() {
        let now = Utc::now();
        assert_eq!(invite(Duration::days(-1), true).status(now), InviteStatus::Used);
        assert_eq!(invite(Duration::days(-1), false).status(now), InviteStatus::Expired);
        assert_eq!(invite(Duration::days(1), false).status(now), InviteStatus::Pending);
    }

    #[test]
    fn creator_wire_format() {
        let json = serde_json::to_value(InviteCreator::System).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "SYSTEM" }));
        let id = Uuid::new_v4();
        let json = serde_json::to_value(InviteCreator::User(id)).unwrap();
        assert_eq!(json["userId"], serde_json::json!(id));
    }
}
